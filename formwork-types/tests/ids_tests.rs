use formwork_types::new_block_id;
use std::collections::HashSet;

// ── Block ids ─────────────────────────────────────────────────────

#[test]
fn block_ids_are_unique() {
    let ids: HashSet<String> = (0..100).map(|_| new_block_id()).collect();
    assert_eq!(ids.len(), 100);
}

#[test]
fn block_ids_are_v7_uuids() {
    let id = uuid::Uuid::parse_str(&new_block_id()).unwrap();
    assert_eq!(id.get_version_num(), 7);
}

#[test]
fn block_ids_are_time_ordered() {
    let a = new_block_id();
    let b = new_block_id();
    assert!(a < b);
}
