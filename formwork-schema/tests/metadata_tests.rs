use async_trait::async_trait;
use formwork_schema::{Field, Form, MetadataLoader, MetadataStore, SchemaError, SchemaResult};
use formwork_types::Locale;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingLoader {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl MetadataLoader for CountingLoader {
    async fn load(&self, resource_key: &str, locale: Option<&Locale>) -> SchemaResult<Form> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if resource_key == "broken" {
            return Err(SchemaError::Loader {
                resource_key: resource_key.to_string(),
                message: "503".into(),
            });
        }
        let label = locale.map(|l| l.to_string()).unwrap_or_default();
        Ok(Form::new(resource_key).field(Field::new("title", "text_line").label(label)))
    }
}

fn store() -> (MetadataStore<CountingLoader>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader = CountingLoader {
        calls: Arc::clone(&calls),
    };
    (MetadataStore::new(loader), calls)
}

#[tokio::test]
async fn form_is_loaded_once_per_key_and_locale() {
    let (mut store, calls) = store();
    let en = Locale::new("en").unwrap();
    let de = Locale::new("de").unwrap();

    store.form("pages", Some(&en)).await.unwrap();
    store.form("pages", Some(&en)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    store.form("pages", Some(&de)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(store.is_cached("pages", Some(&de)));
}

#[tokio::test]
async fn invalidate_drops_all_locales_of_a_key() {
    let (mut store, calls) = store();
    let en = Locale::new("en").unwrap();

    store.form("pages", Some(&en)).await.unwrap();
    store.form("snippets", Some(&en)).await.unwrap();
    store.invalidate("pages");

    assert!(!store.is_cached("pages", Some(&en)));
    assert!(store.is_cached("snippets", Some(&en)));
    store.form("pages", Some(&en)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn schema_converts_cached_form() {
    let (mut store, _) = store();
    let en = Locale::new("en").unwrap();
    let schema = store.schema("pages", Some(&en)).await.unwrap();
    assert_eq!(schema.get("title").unwrap().label.as_deref(), Some("en"));
}

#[tokio::test]
async fn loader_errors_are_not_cached() {
    let (mut store, calls) = store();
    assert!(store.form("broken", None).await.is_err());
    assert!(store.form("broken", None).await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
