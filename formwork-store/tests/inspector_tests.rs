use formwork_schema::{Schema, SchemaEntry, ValidationError};
use formwork_store::{FinishFieldHandler, FormStore, ResourceStore, SaveHandler, SaveOptions};
use formwork_types::{DataPath, Locale};
use pretty_assertions::assert_eq;
use serde_json::{Map, json};
use std::cell::Cell;
use std::rc::Rc;

fn store() -> FormStore {
    let mut options = Map::new();
    options.insert("webspace".into(), json!("example"));
    let resource = ResourceStore::new("pages", Some("7".into()), Some(Locale::new("de").unwrap()), options.clone());
    let schema = Schema::new().with("title", SchemaEntry::new("text_line").required());
    FormStore::new(resource, schema).with_metadata_options(options)
}

// ── Read access ──────────────────────────────────────────────────

#[test]
fn exposes_resource_identity() {
    let store = store();
    let inspector = store.inspector();
    assert_eq!(inspector.resource_key(), "pages");
    assert_eq!(inspector.id(), Some("7"));
    assert_eq!(inspector.locale().map(Locale::as_str), Some("de"));
    assert_eq!(inspector.options()["webspace"], json!("example"));
    assert_eq!(inspector.metadata_options()["webspace"], json!("example"));
    assert!(!inspector.loading());
}

#[test]
fn reflects_current_values_and_errors() {
    let mut store = store();
    store.set("title", json!("")).unwrap();
    store.validate();

    let inspector = store.inspector();
    assert_eq!(inspector.get_value_by_path("/title"), Some(&json!("")));
    assert_eq!(
        inspector.error_for(&DataPath::parse("/title")),
        Some(&ValidationError::required(DataPath::parse("/title")))
    );
    assert!(inspector.error_for(&DataPath::parse("/other")).is_none());
    assert_eq!(inspector.get_schema_entry_by_path("title").unwrap().field_type, "text_line");
    assert!(inspector.is_field_modified("title"));
}

// ── Hook registration ────────────────────────────────────────────

struct Counter(Cell<u32>);

impl SaveHandler for Counter {
    fn on_save(&self, _options: &SaveOptions) -> Result<(), String> {
        self.0.set(self.0.get() + 1);
        Ok(())
    }
}

impl FinishFieldHandler for Counter {
    fn on_finish(&self, _data_path: &DataPath) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn removed_save_handler_no_longer_runs() {
    let store = store();
    let inspector = store.inspector();
    let counter = Rc::new(Counter(Cell::new(0)));
    let id = inspector.register_save_handler(counter.clone());

    assert!(inspector.trigger_save_handler(&SaveOptions::new()).is_empty());
    assert!(inspector.remove_save_handler(id));
    inspector.trigger_save_handler(&SaveOptions::new());

    assert_eq!(counter.0.get(), 1);
    assert!(!inspector.remove_save_handler(id));
}

#[test]
fn trigger_collects_every_failure() {
    let store = store();
    let inspector = store.inspector();
    inspector.add_save_handler(|_| Err("first".into()));
    inspector.add_save_handler(|_| Ok(()));
    inspector.add_save_handler(|_| Err("third".into()));

    assert_eq!(inspector.trigger_save_handler(&SaveOptions::new()), ["first", "third"]);
}

#[test]
fn finish_handlers_can_be_removed() {
    let mut store = store();
    let counter = Rc::new(Counter(Cell::new(0)));
    let id = store.inspector().register_finish_field_handler(counter.clone());

    store.finish_field("title");
    assert!(store.inspector().remove_finish_field_handler(id));
    store.finish_field("title");

    assert_eq!(counter.0.get(), 1);
}
