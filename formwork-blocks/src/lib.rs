//! Block collection primitives for Formwork.
//!
//! A block collection is an ordered list of typed sub-records, each edited
//! through its own embedded form. This crate provides:
//! - [`BlockCollection`]: the generic list with per-item drafts
//! - [`Schedules`]: fixed and weekly schedule entries
//! - [`TeaserSelection`]: references to external records, hydrated lazily
//!
//! Identity for every list operation is the item's [`BlockKey`]
//! (`type` plus `id`), never its index.

pub mod collection;
pub mod error;
pub mod key;
pub mod schedule;
pub mod teaser;

pub use collection::{BlockCollection, BlockState};
pub use error::{BlockError, BlockResult};
pub use key::BlockKey;
pub use schedule::{Schedule, ScheduleKind, Schedules, schedule_types};
pub use teaser::{
    Teaser, TeaserItem, TeaserLookup, TeaserProviderConfig, TeaserProviderRegistry,
    TeaserSelection, TeaserStore,
};
