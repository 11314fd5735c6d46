use formwork_schema::{
    Field, FieldOption, Form, Item, OptionType, SchemaError, Section, TypedForm, ValidationSchema,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn keys(form: &Form) -> Vec<String> {
    form.items.keys().cloned().collect()
}

fn field_type(form: &Form, key: &str) -> String {
    match &form.items[key] {
        Item::Field(field) => field.field_type.clone(),
        Item::Section(_) => "section".to_string(),
    }
}

// ── Form::merge ──────────────────────────────────────────────────

#[test]
fn merge_keeps_base_name_and_title() {
    let base = Form::new("page").title("Page");
    let overlay = Form::new("homepage").title("Homepage");

    let merged = base.merge(&overlay).unwrap();
    assert_eq!(merged.name.as_deref(), Some("page"));
    assert_eq!(merged.title.as_deref(), Some("Page"));
}

#[test]
fn merge_never_takes_title_from_overlay() {
    let mut base = Form::new("page");
    base.title = None;
    let overlay = Form::new("homepage").title("Homepage");

    let merged = base.merge(&overlay).unwrap();
    assert_eq!(merged.title, None);
}

#[test]
fn merge_overlay_replaces_shared_key_in_base_position() {
    let base = Form::new("page")
        .field(Field::new("title", "text_line"))
        .field(Field::new("url", "resource_locator"))
        .field(Field::new("seo", "text_area"));
    let overlay = Form::new("news")
        .field(Field::new("teaser", "teaser_selection"))
        .field(Field::new("url", "text_line"));

    let merged = base.merge(&overlay).unwrap();
    assert_eq!(keys(&merged), ["title", "url", "seo", "teaser"]);
    assert_eq!(field_type(&merged, "url"), "text_line");
}

#[test]
fn merge_is_not_commutative() {
    let a = Form::new("a").field(Field::new("x", "text_line"));
    let b = Form::new("b").field(Field::new("x", "number"));

    assert_eq!(field_type(&a.merge(&b).unwrap(), "x"), "number");
    assert_eq!(field_type(&b.merge(&a).unwrap(), "x"), "text_line");
}

#[test]
fn merge_without_base_schema_fails_fast() {
    let mut base = Form::new("page");
    base.schema = None;
    let err = base.merge(&Form::new("overlay")).unwrap_err();
    assert!(matches!(err, SchemaError::MissingValidationSchema { form: Some(ref name) } if name == "page"));
}

#[test]
fn merge_without_overlay_schema_keeps_base_schema() {
    let mut base = Form::new("page");
    base.schema = Some(ValidationSchema {
        required: vec!["title".into()],
        ..ValidationSchema::default()
    });
    let mut overlay = Form::new("overlay");
    overlay.schema = None;

    let merged = base.merge(&overlay).unwrap();
    assert_eq!(merged.schema.unwrap().required, ["title"]);
}

#[test]
fn validation_schema_merges_recursively() {
    let base: ValidationSchema = serde_json::from_value(json!({
        "required": ["title"],
        "properties": {
            "excerpt": {"required": ["title"], "properties": {"title": {"type": "string"}}}
        }
    }))
    .unwrap();
    let overlay: ValidationSchema = serde_json::from_value(json!({
        "required": ["url", "title"],
        "properties": {
            "excerpt": {"required": ["description"]},
            "seo": {"type": "object"}
        },
        "anyOf": [{"required": ["a"]}]
    }))
    .unwrap();

    let merged = base.merge(&overlay);
    assert_eq!(merged.required, ["title", "url"]);
    assert_eq!(merged.properties["excerpt"].required, ["title", "description"]);
    assert!(merged.properties["excerpt"].properties.contains_key("title"));
    assert!(merged.properties.contains_key("seo"));
    assert_eq!(merged.any_of.len(), 1);
}

// ── TypedForm ────────────────────────────────────────────────────

#[test]
fn typed_form_resolves_variant_over_base() {
    let typed = TypedForm {
        base: Form::new("page").field(Field::new("title", "text_line")),
        types: [(
            "homepage".to_string(),
            Form::new("homepage").field(Field::new("teasers", "teaser_selection")),
        )]
        .into_iter()
        .collect(),
        default_type: Some("homepage".into()),
    };

    let resolved = typed.resolve(None).unwrap();
    assert_eq!(keys(&resolved), ["title", "teasers"]);
    assert!(matches!(typed.resolve(Some("missing")), Err(SchemaError::UnknownType { .. })));
}

// ── Options ──────────────────────────────────────────────────────

#[test]
fn collection_option_children_roundtrip() {
    let option = FieldOption::collection(
        "values",
        vec![
            FieldOption::value("left", json!("Left")),
            FieldOption::value("right", json!("Right")),
        ],
    );
    assert_eq!(option.option_type, OptionType::Collection);
    let children = option.children().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[1].name, "right");
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn form_deserializes_from_backend_json() {
    let form: Form = serde_json::from_value(json!({
        "name": "page",
        "title": "Page",
        "items": {
            "title": {"kind": "field", "name": "title", "type": "text_line", "required": true,
                      "tags": [{"name": "sulu.rlp.part", "priority": 10}]},
            "highlight": {"kind": "section", "name": "highlight", "visibleCondition": "show == true",
                          "items": {"image": {"kind": "field", "name": "image", "type": "single_media_selection"}}}
        },
        "schema": {"required": ["title"]}
    }))
    .unwrap();

    assert_eq!(keys(&form), ["title", "highlight"]);
    let Item::Section(section) = &form.items["highlight"] else {
        panic!("expected a section");
    };
    assert_eq!(section.visible_condition.as_deref(), Some("show == true"));
    assert!(section.items.contains_key("image"));
}

// ── Properties ───────────────────────────────────────────────────

fn key_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", "e", "f", "g"]), 0..6)
        .prop_map(|keys| keys.into_iter().map(String::from).collect())
}

fn form_with(name: &str, keys: &[String], field_type: &str) -> Form {
    keys.iter()
        .fold(Form::new(name), |form, key| form.field(Field::new(key.clone(), field_type)))
}

proptest! {
    #[test]
    fn merge_preserves_every_key_and_base_order(base_keys in key_set(), overlay_keys in key_set()) {
        let base = form_with("base", &base_keys, "base");
        let overlay = form_with("overlay", &overlay_keys, "overlay");
        let merged = base.merge(&overlay).unwrap();

        let merged_keys = keys(&merged);
        for key in base.items.keys().chain(overlay.items.keys()) {
            prop_assert!(merged_keys.contains(key));
        }
        // base keys keep their relative order at the front
        let base_order: Vec<String> = base.items.keys().cloned().collect();
        prop_assert_eq!(&merged_keys[..base_order.len()], &base_order[..]);
        for key in overlay.items.keys() {
            prop_assert_eq!(field_type(&merged, key), "overlay");
        }
    }
}

#[test]
fn section_builder_collects_items() {
    let section = Section::new("meta")
        .label("Meta")
        .item(Item::Field(Field::new("author", "contact_selection")))
        .visible_when("__locale == 'en'");
    assert_eq!(section.items.len(), 1);
    assert_eq!(section.visible_condition.as_deref(), Some("__locale == 'en'"));
}
