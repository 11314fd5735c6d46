//! Identifiers generated for block collection entries.

use uuid::Uuid;

/// A fresh id for a block collection entry that arrived without one.
///
/// UUID v7, so ids generated later sort after earlier ones. Combined with
/// the entry's `type` it forms the identity used by list operations.
#[must_use]
pub fn new_block_id() -> String {
    Uuid::now_v7().to_string()
}
