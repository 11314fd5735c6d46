use formwork_condition::{
    ConditionDataProviderRegistry, ConditionEvaluator, ConditionScope, LOCALE_KEY, PARENT_KEY,
};
use formwork_types::{DataPath, Locale};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

fn page() -> Value {
    json!({
        "template": "article",
        "blocks": [
            {"type": "text", "text": "a"},
            {"type": "columns", "columns": [{"type": "image", "media": 4}]}
        ]
    })
}

// ── Context building ─────────────────────────────────────────────

#[test]
fn root_context_holds_data_and_locale() {
    let data = page();
    let root = DataPath::root();
    let locale = Locale::new("en").unwrap();
    let scope = ConditionScope::new(&data, &root, Some(&locale));

    let ctx = ConditionDataProviderRegistry::with_defaults().build_context(&scope);

    assert_eq!(ctx["template"], json!("article"));
    assert_eq!(ctx[LOCALE_KEY], json!("en"));
    assert!(ctx.get(PARENT_KEY).is_none());
}

#[test]
fn block_item_context_sees_parent() {
    let data = page();
    let item = DataPath::parse("/blocks/0");
    let scope = ConditionScope::new(&data, &item, None);

    let ctx = ConditionDataProviderRegistry::with_defaults().build_context(&scope);

    assert_eq!(ctx["type"], json!("text"));
    assert_eq!(ctx[LOCALE_KEY], Value::Null);
    assert_eq!(ctx[PARENT_KEY]["template"], json!("article"));
}

#[test]
fn nested_block_items_chain_parents() {
    let data = page();
    let item = DataPath::parse("/blocks/1/columns/0");
    let scope = ConditionScope::new(&data, &item, None);

    assert_eq!(scope.parent_path(), Some(DataPath::parse("/blocks/1")));

    let ctx = ConditionDataProviderRegistry::with_defaults().build_context(&scope);
    let evaluator = ConditionEvaluator::new();
    assert!(evaluator
        .evaluate("__parent.type == 'columns' && __parent.__parent.template == 'article'", &ctx)
        .unwrap());
}

#[test]
fn providers_fold_in_registration_order() {
    let data = json!({"mode": "data"});
    let root = DataPath::root();
    let scope = ConditionScope::new(&data, &root, None);

    let mut registry = ConditionDataProviderRegistry::new();
    registry.register(|_: &ConditionScope<'_>| {
        let mut m = Map::new();
        m.insert("mode".into(), json!("first"));
        m.insert("only_first".into(), json!(true));
        m
    });
    registry.register(|_: &ConditionScope<'_>| {
        let mut m = Map::new();
        m.insert("mode".into(), json!("second"));
        m
    });

    let ctx = registry.build_context(&scope);
    assert_eq!(registry.len(), 2);
    assert_eq!(ctx["mode"], json!("second"));
    assert_eq!(ctx["only_first"], json!(true));
}

#[test]
fn provider_sees_scope() {
    let data = json!({"blocks": [{"type": "a"}]});
    let item = DataPath::parse("/blocks/0");
    let scope = ConditionScope::new(&data, &item, None);

    let mut registry = ConditionDataProviderRegistry::new();
    registry.register(|scope: &ConditionScope<'_>| {
        let mut m = Map::new();
        m.insert("__path".into(), json!(scope.path.to_string()));
        m
    });

    assert_eq!(registry.build_context(&scope)["__path"], json!("/blocks/0"));
}

#[test]
fn provider_sees_form_and_metadata_options() {
    let data = json!({"title": "x"});
    let root = DataPath::root();
    let mut options = Map::new();
    options.insert("webspace".into(), json!("example"));
    let mut metadata_options = Map::new();
    metadata_options.insert("template".into(), json!("article"));

    let mut registry = ConditionDataProviderRegistry::new();
    registry.register(|scope: &ConditionScope<'_>| {
        let mut m = Map::new();
        if let Some(webspace) = scope.options.and_then(|options| options.get("webspace")) {
            m.insert("__webspace".into(), webspace.clone());
        }
        if let Some(template) = scope.metadata_options.and_then(|options| options.get("template")) {
            m.insert("__template".into(), template.clone());
        }
        m
    });

    let bare = registry.build_context(&ConditionScope::new(&data, &root, None));
    assert_eq!(bare.get("__webspace"), None);

    let scope = ConditionScope::new(&data, &root, None).with_options(&options, &metadata_options);
    let context = registry.build_context(&scope);
    assert!(
        ConditionEvaluator::new()
            .evaluate("__webspace == 'example' && __template == 'article'", &context)
            .unwrap()
    );
}

#[test]
fn scope_outside_items_has_no_parent() {
    let data = page();
    let path = DataPath::parse("/blocks");
    let scope = ConditionScope::new(&data, &path, None);
    assert_eq!(scope.parent_path(), None);
    assert!(scope.data().is_none());
}
