use formwork_schema::{
    Field, Form, Item, Schema, SchemaEntry, Section, ValidationErrorKind, SECTION_TYPE,
};
use formwork_types::DataPath;
use pretty_assertions::assert_eq;
use serde_json::json;

fn block_schema() -> Schema {
    let text = Schema::new().with("text", SchemaEntry::new("text_editor").required());
    let image = Schema::new()
        .with("media", SchemaEntry::new("single_media_selection"))
        .with("caption", SchemaEntry::new("text_line"));
    Schema::new()
        .with("title", SchemaEntry::new("text_line").required().tag("sulu.rlp.part", Some(10)))
        .with(
            "meta",
            SchemaEntry::section(
                Schema::new()
                    .with("ext/excerpt/title", SchemaEntry::new("text_line").tag("sulu.rlp.part", Some(20)))
                    .with("author", SchemaEntry::new("contact_selection")),
            ),
        )
        .with(
            "blocks",
            SchemaEntry::new("block")
                .block_type("text", "Text", text)
                .block_type("image", "Image", image),
        )
}

// ── Form::to_schema ──────────────────────────────────────────────

#[test]
fn to_schema_keeps_order_and_converts_sections() {
    let form = Form::new("page")
        .field(Field::new("title", "text_line").label("Title"))
        .section(
            Section::new("settings")
                .item(Item::Field(Field::new("published", "checkbox")))
                .disabled_when("locked"),
        )
        .field(
            Field::new("blocks", "block")
                .with_type("text", Form::new("text").title("Text").field(Field::new("text", "text_editor"))),
        );

    let schema = form.to_schema();
    assert_eq!(schema.keys().cloned().collect::<Vec<_>>(), ["title", "settings", "blocks"]);

    let settings = schema.get("settings").unwrap();
    assert_eq!(settings.field_type, SECTION_TYPE);
    assert_eq!(settings.disabled_condition.as_deref(), Some("locked"));
    assert!(settings.items.as_ref().unwrap().get("published").is_some());

    let blocks = schema.get("blocks").unwrap();
    assert!(blocks.is_block());
    assert_eq!(blocks.default_type.as_deref(), Some("text"));
    assert_eq!(blocks.types["text"].title, "Text");
}

#[test]
fn to_schema_marks_validation_required_fields() {
    let mut form = Form::new("page").field(Field::new("title", "text_line"));
    form.schema.as_mut().unwrap().required.push("title".into());
    assert!(form.to_schema().get("title").unwrap().required);
}

// ── Lookup ───────────────────────────────────────────────────────

#[test]
fn find_field_looks_through_sections() {
    let schema = block_schema();
    assert_eq!(schema.find_field("author").unwrap().field_type, "contact_selection");
    assert!(schema.find_field("meta").is_none());
}

#[test]
fn entry_by_path_handles_slash_names_and_blocks() {
    let schema = block_schema();
    let data = json!({
        "blocks": [{"type": "text", "text": "a"}, {"type": "image", "caption": "b"}]
    });

    let excerpt = schema.entry_by_path(&DataPath::parse("/ext/excerpt/title"), &data).unwrap();
    assert_eq!(excerpt.field_type, "text_line");

    let caption = schema.entry_by_path(&DataPath::parse("/blocks/1/caption"), &data).unwrap();
    assert_eq!(caption.field_type, "text_line");

    let text = schema.entry_by_path(&DataPath::parse("/blocks/0/text"), &data).unwrap();
    assert_eq!(text.field_type, "text_editor");

    assert!(schema.entry_by_path(&DataPath::parse("/blocks/0/caption"), &data).is_none());
    assert!(schema.entry_by_path(&DataPath::parse("/blocks/7/text"), &data).is_none());
    assert!(schema.entry_by_path(&DataPath::parse("/unknown"), &data).is_none());
}

#[test]
fn fields_by_tag_in_declaration_order() {
    let schema = block_schema();
    let tagged = schema.fields_by_tag("sulu.rlp.part");
    let paths: Vec<String> = tagged.iter().map(|field| field.path.to_string()).collect();
    assert_eq!(paths, ["/title", "/ext/excerpt/title"]);
    assert_eq!(tagged[1].priority, Some(20));
    assert!(schema.fields_by_tag("nope").is_empty());
}

#[test]
fn default_values_include_blocks_and_declared_defaults() {
    let schema = Schema::new()
        .with("published", SchemaEntry::new("checkbox").default_value(json!(true)))
        .with("title", SchemaEntry::new("text_line"))
        .with("blocks", SchemaEntry::new("block").block_type("text", "Text", Schema::new()));
    assert_eq!(schema.default_values(), json!({"published": true, "blocks": []}));
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn validate_reports_missing_required_values() {
    let schema = block_schema();
    let errors = schema.validate(&json!({"title": "   "}));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path.to_string(), "/title");
    assert_eq!(errors[0].kind, ValidationErrorKind::Required);
}

#[test]
fn validate_descends_into_block_items() {
    let schema = block_schema();
    let errors = schema.validate(&json!({
        "title": "Hello",
        "blocks": [{"type": "image"}, {"type": "text", "text": ""}, {"type": "video"}]
    }));

    let paths: Vec<String> = errors.iter().map(|e| e.path.to_string()).collect();
    assert_eq!(paths, ["/blocks/1/text", "/blocks/2"]);
    assert!(matches!(
        &errors[1].kind,
        ValidationErrorKind::UnknownBlockType { type_key } if type_key == "video"
    ));
}

#[test]
fn false_and_zero_count_as_values() {
    let schema = Schema::new()
        .with("flag", SchemaEntry::new("checkbox").required())
        .with("count", SchemaEntry::new("number").required());
    assert!(schema.validate(&json!({"flag": false, "count": 0})).is_empty());
}
