//! Resource and form stores for Formwork.
//!
//! # Architecture
//!
//! - [`ResourceStore`] holds one backend resource's editable state: id,
//!   locale, the raw data tree and loading/saving flags. Observers subscribe
//!   to [`StoreEvent`]s.
//! - [`FormStore`] binds a resource store to a [`Schema`](formwork_schema::Schema)
//!   and adds path access, dirty tracking, validation, tag lookup and the
//!   submit lifecycle. It exclusively owns its resource store.
//! - [`FormInspector`] is the read-only facade handed to field renderers. It
//!   also exposes the save and finish-field hook registries.
//!
//! Network access goes through the [`ResourceApi`] collaborator trait.

mod api;
mod error;
mod form;
mod hooks;
mod inspector;
mod observer;
mod resource;

pub use api::{ApiError, ResourceApi, ResourceRequest, SaveOptions};
pub use error::{StoreError, StoreResult};
pub use form::FormStore;
pub use hooks::{FinishFieldHandler, HandlerId, SaveHandler};
pub use inspector::FormInspector;
pub use observer::{StoreEvent, SubscriptionId};
pub use resource::ResourceStore;
