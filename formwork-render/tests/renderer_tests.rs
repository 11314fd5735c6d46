mod common;

use common::{form, form_with};
use formwork_blocks::{BlockKey, TeaserProviderConfig, TeaserProviderRegistry};
use formwork_condition::ConditionScope;
use formwork_render::{BLOCK_ITEM, FieldProps, FieldType, FieldTypeRegistry, Form, RenderError, RenderResult, Renderer, View};
use formwork_schema::{FieldOption, Schema, SchemaEntry};
use formwork_store::{FormStore, ResourceStore};
use formwork_types::DataPath;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::rc::Rc;

fn path(p: &str) -> DataPath {
    DataPath::parse(p)
}

fn blocks_schema() -> Schema {
    Schema::new().with("showCaptions", SchemaEntry::new("checkbox")).with(
        "blocks",
        SchemaEntry::new("block")
            .label("Content")
            .block_type(
                "text",
                "Text",
                Schema::new()
                    .with("text", SchemaEntry::new("text_editor").required())
                    .with("caption", SchemaEntry::new("text_line").visible_when("__parent.showCaptions")),
            )
            .block_type("image", "Image", Schema::new().with("media", SchemaEntry::new("single_media_selection"))),
    )
}

// ── Field types ──────────────────────────────────────────────────

#[test]
fn unknown_field_type_is_a_configuration_error() {
    let mut form = form(
        Schema::new().with("x", SchemaEntry::new("not_a_real_type")),
        json!({}),
    );

    match form.render() {
        Err(RenderError::UnknownFieldType { type_key }) => assert_eq!(type_key, "not_a_real_type"),
        other => panic!("expected unknown field type, got {other:?}"),
    }
}

#[test]
fn fields_render_in_declared_order_with_common_props() {
    let schema = Schema::new()
        .with("title", SchemaEntry::new("text_line").label("Title").required())
        .with("published", SchemaEntry::new("toggler"))
        .with("ext/seo/title", SchemaEntry::new("text_line"));
    let mut form = form(schema, json!({"title": "Hello", "ext": {"seo": {"title": "SEO"}}}));

    let rendered = form.render().unwrap();
    let names: Vec<_> = rendered.views.iter().map(|v| v.name.clone().unwrap()).collect();
    assert_eq!(names, ["title", "published", "ext/seo/title"]);

    let title = &rendered.views[0];
    assert_eq!(title.component, "text_line");
    assert_eq!(title.path, Some(path("/title")));
    assert_eq!(title.label.as_deref(), Some("Title"));
    assert_eq!(title.value, Some(json!("Hello")));
    assert!(title.required);

    assert_eq!(rendered.views[1].value, Some(json!(false)));
    assert_eq!(rendered.views[2].value, Some(json!("SEO")));
    assert!(rendered.hidden.is_empty());
}

#[test]
fn select_without_values_option_fails() {
    let mut form = form(Schema::new().with("color", SchemaEntry::new("single_select")), json!({}));

    match form.render() {
        Err(RenderError::MissingOption { field_type, option }) => {
            assert_eq!(field_type, "single_select");
            assert_eq!(option, "values");
        }
        other => panic!("expected missing option, got {other:?}"),
    }
}

#[test]
fn select_lists_its_values() {
    let entry = SchemaEntry::new("single_select").option(FieldOption::collection(
        "values",
        vec![
            FieldOption::value("red", json!("red")),
            FieldOption::value("blue", json!("blue")),
        ],
    ));
    let mut form = form(Schema::new().with("color", entry), json!({"color": "blue"}));

    let rendered = form.render().unwrap();
    let view = &rendered.views[0];
    assert_eq!(view.value, Some(json!("blue")));
    assert_eq!(
        view.props["values"],
        json!([{"value": "red", "title": "red"}, {"value": "blue", "title": "blue"}])
    );
}

struct Stars;

impl FieldType for Stars {
    fn render(&self, props: &FieldProps<'_>) -> RenderResult<View> {
        let max = props.entry.option_value("max").cloned().unwrap_or(json!(5));
        Ok(View::new("stars").with_value(props.value.cloned()).with_prop("max", max))
    }
}

#[test]
fn registered_field_type_is_used() {
    let mut fields = FieldTypeRegistry::with_defaults();
    fields.register("rating", Stars);
    let schema = Schema::new().with("rating", SchemaEntry::new("rating").option(FieldOption::value("max", json!(10))));
    let mut form = form_with(schema, json!({"rating": 3}), Renderer::new(fields));

    let rendered = form.render().unwrap();
    assert_eq!(rendered.views[0].component, "stars");
    assert_eq!(rendered.views[0].value, Some(json!(3)));
    assert_eq!(rendered.views[0].props["max"], json!(10));
}

#[test]
fn registry_lists_built_ins() {
    let fields = FieldTypeRegistry::with_defaults();
    for name in ["text_line", "checkbox", "single_select", "block", "schedules", "teaser_selection"] {
        assert!(fields.contains(name), "missing {name}");
    }
    assert!(fields.get("nope").is_err());
}

// ── Sections and conditions ──────────────────────────────────────

fn sectioned_schema() -> Schema {
    Schema::new().with("mode", SchemaEntry::new("text_line")).with(
        "advanced",
        SchemaEntry::section(Schema::new().with("ext/seo/title", SchemaEntry::new("text_line")))
            .label("Advanced")
            .visible_when("mode == 'advanced'"),
    )
}

#[test]
fn invisible_section_renders_nothing_but_keeps_values() {
    let mut form = form(sectioned_schema(), json!({"mode": "simple", "ext": {"seo": {"title": "Hi"}}}));

    let rendered = form.render().unwrap();
    assert_eq!(rendered.views.len(), 1);
    assert_eq!(rendered.find(&path("/ext/seo/title")), None);
    assert_eq!(rendered.hidden, vec![path("/ext/seo/title")]);
    assert_eq!(form.store().get_value_by_path("/ext/seo/title"), Some(&json!("Hi")));

    form.change("/mode", json!("advanced")).unwrap();
    let rendered = form.render().unwrap();
    assert_eq!(rendered.views.len(), 2);
    let section = &rendered.views[1];
    assert_eq!(section.component, "section");
    assert_eq!(section.label.as_deref(), Some("Advanced"));
    assert_eq!(section.children[0].value, Some(json!("Hi")));
    assert!(rendered.hidden.is_empty());
}

#[test]
fn disabled_section_disables_descendants() {
    let schema = Schema::new()
        .with("locked", SchemaEntry::new("checkbox"))
        .with(
            "meta",
            SchemaEntry::section(
                Schema::new()
                    .with("author", SchemaEntry::new("text_line"))
                    .with("inner", SchemaEntry::section(Schema::new().with("date", SchemaEntry::new("date")))),
            )
            .disabled_when("locked"),
        );
    let mut form = form(schema, json!({"locked": true}));

    let rendered = form.render().unwrap();
    assert!(!rendered.views[0].disabled);
    let disabled: Vec<bool> = rendered.views[1].iter().map(|v| v.disabled).collect();
    assert_eq!(disabled, [true, true, true, true]);

    form.change("/locked", json!(false)).unwrap();
    let rendered = form.render().unwrap();
    assert!(rendered.views[1].iter().all(|v| !v.disabled));
}

#[test]
fn field_conditions_see_the_locale() {
    let schema = Schema::new()
        .with("title", SchemaEntry::new("text_line").disabled_when("__locale == 'en'"))
        .with("germanOnly", SchemaEntry::new("text_line").visible_when("__locale == 'de'"));
    let mut form = form(schema, json!({}));

    let rendered = form.render().unwrap();
    assert_eq!(rendered.views.len(), 1);
    assert!(rendered.views[0].disabled);
    assert_eq!(rendered.hidden, vec![path("/germanOnly")]);
}

#[test]
fn condition_providers_see_resource_options() {
    let mut renderer = Renderer::default();
    renderer.providers_mut().register(|scope: &ConditionScope<'_>| {
        let mut provided = Map::new();
        if let Some(webspace) = scope.options.and_then(|options| options.get("webspace")) {
            provided.insert("__webspace".to_string(), webspace.clone());
        }
        provided
    });
    let schema = Schema::new().with("seo", SchemaEntry::new("text_line").visible_when("__webspace == 'blog'"));
    let mut options = Map::new();
    options.insert("webspace".to_string(), json!("shop"));
    let resource = ResourceStore::new("pages", Some("1".into()), None, options);
    let mut form = Form::new(FormStore::new(resource, schema), renderer);

    let rendered = form.render().unwrap();

    assert!(rendered.views.is_empty());
    assert_eq!(rendered.hidden, vec![path("/seo")]);
}

#[test]
fn malformed_condition_is_fatal() {
    let schema = Schema::new().with("title", SchemaEntry::new("text_line").visible_when("a == "));
    let mut form = form(schema, json!({}));

    assert!(matches!(form.render(), Err(RenderError::Condition(_))));
}

// ── Block fields ─────────────────────────────────────────────────

#[test]
fn block_field_renders_one_item_per_entry() {
    let data = json!({"blocks": [
        {"type": "text", "id": "a", "text": "Hello"},
        {"type": "image", "id": "b"},
    ]});
    let mut form = form(blocks_schema(), data);

    let rendered = form.render().unwrap();
    let blocks = rendered.find(&path("/blocks")).unwrap();
    assert_eq!(blocks.component, "block");
    assert_eq!(blocks.props["types"], json!([{"key": "text", "title": "Text"}, {"key": "image", "title": "Image"}]));

    let keys: Vec<_> = blocks.children.iter().map(|v| v.block_key.clone().unwrap()).collect();
    assert_eq!(keys, ["text;a", "image;b"]);
    assert!(blocks.children.iter().all(|v| v.component == BLOCK_ITEM));

    let text = rendered.find(&path("/blocks/0/text")).unwrap();
    assert_eq!(text.value, Some(json!("Hello")));
    assert!(rendered.find(&path("/blocks/1/media")).is_some());
}

#[test]
fn editing_item_renders_its_draft() {
    let data = json!({"blocks": [{"type": "text", "id": "a", "text": "Hello"}]});
    let mut form = form(blocks_schema(), data);
    let key = BlockKey::new("text", "a");

    form.render().unwrap();
    form.block_edit("/blocks", &key).unwrap();
    form.block_update("/blocks", &key, "text", json!("Draft")).unwrap();

    let rendered = form.render().unwrap();
    let item = rendered.find(&path("/blocks/0")).unwrap();
    assert!(item.editing);
    assert_eq!(rendered.find(&path("/blocks/0/text")).unwrap().value, Some(json!("Draft")));
    assert_eq!(form.store().get_value_by_path("/blocks/0/text"), Some(&json!("Hello")));
}

#[test]
fn unknown_item_type_is_a_configuration_error() {
    let mut form = form(blocks_schema(), json!({"blocks": [{"type": "video", "id": "x"}]}));

    match form.render() {
        Err(RenderError::UnknownBlockType { type_key, path: at }) => {
            assert_eq!(type_key, "video");
            assert_eq!(at, path("/blocks/0"));
        }
        other => panic!("expected unknown block type, got {other:?}"),
    }
}

#[test]
fn item_conditions_see_the_parent() {
    let data = json!({"showCaptions": false, "blocks": [{"type": "text", "id": "a", "text": "Hi"}]});
    let mut form = form(blocks_schema(), data);

    let rendered = form.render().unwrap();
    assert_eq!(rendered.hidden, vec![path("/blocks/0/caption")]);

    form.change("/showCaptions", json!(true)).unwrap();
    let rendered = form.render().unwrap();
    assert!(rendered.find(&path("/blocks/0/caption")).is_some());
}

#[test]
fn schedules_field_renders_its_items() {
    let schema = Schema::new().with("schedules", SchemaEntry::new("schedules"));
    let data = json!({"schedules": [
        {"type": "weekly", "id": "w", "days": ["monday"], "start": "08:00", "end": "12:00"},
    ]});
    let mut form = form(schema, data);

    let rendered = form.render().unwrap();
    let schedules = rendered.find(&path("/schedules")).unwrap();
    assert_eq!(schedules.component, "schedules");
    assert_eq!(schedules.children[0].block_key.as_deref(), Some("weekly;w"));
    let days = rendered.find(&path("/schedules/0/days")).unwrap();
    assert_eq!(days.component, "select");
    assert_eq!(days.value, Some(json!(["monday"])));
}

// ── Teaser selection ─────────────────────────────────────────────

#[test]
fn teaser_selection_lists_items_and_providers() {
    let mut providers = TeaserProviderRegistry::new();
    providers.register(
        "articles",
        TeaserProviderConfig {
            title: "Articles".into(),
            ..TeaserProviderConfig::default()
        },
    );
    let schema = Schema::new().with("teasers", SchemaEntry::new("teaser_selection"));
    let data = json!({"teasers": {"presentAs": "grid", "items": [{"type": "articles", "id": 1, "title": "Own"}]}});
    let mut form = form(schema, data).with_teaser_providers(Rc::new(providers));

    let rendered = form.render().unwrap();
    let view = &rendered.views[0];
    assert_eq!(view.component, "teaser_selection");
    assert_eq!(view.props["providers"], json!([{"key": "articles", "title": "Articles"}]));
    assert_eq!(view.children[0].block_key.as_deref(), Some("articles;1"));
    assert_eq!(view.children[0].props["title"], json!("Own"));
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn hidden_section_never_renders_children(mode in "[a-z]{1,8}", title in ".{0,16}") {
        let mut form = form(sectioned_schema(), json!({"mode": mode, "ext": {"seo": {"title": title}}}));
        let rendered = form.render().unwrap();

        let visible = mode == "advanced";
        prop_assert_eq!(rendered.find(&path("/ext/seo/title")).is_some(), visible);
        prop_assert_eq!(rendered.is_hidden(&path("/ext/seo/title")), !visible);
        prop_assert_eq!(form.store().get_value_by_path("/ext/seo/title"), Some(&Value::String(title)));
    }
}
