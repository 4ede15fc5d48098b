use std::env;
use std::sync::{Mutex, OnceLock};

use aislefinder_cli::commands::{catalog, checkout, migrate, recommend, seed};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("AISLEFINDER_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_openai_without_key() {
    with_env(
        &[
            ("AISLEFINDER_DATABASE_URL", "sqlite::memory:"),
            ("AISLEFINDER_SUGGESTIONS_PROVIDER", "openai"),
        ],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 2, "expected config validation failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "migrate");
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn seed_loads_demo_catalog_and_is_idempotent() {
    let store = TempStore::new();
    with_env(&[("AISLEFINDER_DATABASE_URL", store.url())], || {
        let first = seed::run(None);
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["command"], "seed");
        assert_eq!(first_payload["message"], "demo catalog loaded: 12 products");

        let second = seed::run(None);
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        assert_eq!(first_payload["message"], parse_payload(&second.output)["message"]);
    });
}

#[test]
fn seed_imports_documents_from_file() {
    let store = TempStore::new();
    let documents = store.dir.path().join("catalog.json");
    std::fs::write(&documents, r#"{"Q1": {"name": "Oat Milk", "price": 3.49, "aisle": "A2"}}"#)
        .expect("write documents");

    with_env(&[("AISLEFINDER_DATABASE_URL", store.url())], || {
        let result = seed::run(Some(documents.clone()));
        assert_eq!(result.exit_code, 0, "expected file import success");

        let found = parse_payload(&catalog::search("oat".to_string()).output);
        assert_eq!(found["data"][0]["id"], "Q1");
    });
}

#[test]
fn seed_reports_unreadable_file() {
    let store = TempStore::new();
    let missing = store.dir.path().join("missing.json");

    with_env(&[("AISLEFINDER_DATABASE_URL", store.url())], || {
        let result = seed::run(Some(missing.clone()));
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["error_class"], "seed_input");
    });
}

#[test]
fn search_and_locate_read_the_seeded_catalog() {
    let store = TempStore::new();
    with_env(&[("AISLEFINDER_DATABASE_URL", store.url())], || {
        assert_eq!(seed::run(None).exit_code, 0);

        let search = parse_payload(&catalog::search("  STRAW ".to_string()).output);
        let names = search["data"]
            .as_array()
            .expect("search data")
            .iter()
            .map(|product| product["name"].as_str().unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Strawberry Jam", "Fresh Strawberries"]);

        let located = catalog::locate("P200".to_string());
        assert_eq!(located.exit_code, 0);
        let payload = parse_payload(&located.output);
        assert_eq!(payload["message"], "Corn Flakes: aisle B4, shelf 2");
        assert_eq!(payload["data"]["aisle"], "B4");

        let missing = catalog::locate("P404".to_string());
        assert_eq!(missing.exit_code, 6);
        assert_eq!(parse_payload(&missing.output)["message"], "Product not found.");
    });
}

#[test]
fn verify_distinguishes_match_and_mismatch() {
    let store = TempStore::new();
    with_env(&[("AISLEFINDER_DATABASE_URL", store.url())], || {
        assert_eq!(seed::run(None).exit_code, 0);

        let verified = catalog::verify("P100".to_string(), " P100\n".to_string());
        assert_eq!(verified.exit_code, 0);
        assert_eq!(parse_payload(&verified.output)["message"], "Product Verified! The IDs match.");

        let mismatch = catalog::verify("P100".to_string(), "P101".to_string());
        assert_eq!(mismatch.exit_code, 6);
        let payload = parse_payload(&mismatch.output);
        assert_eq!(payload["error_class"], "verification_mismatch");
        assert!(payload["message"]
            .as_str()
            .unwrap_or_default()
            .ends_with("Scanned `P101` (Salted Butter)."));
    });
}

#[test]
fn checkout_prices_resolved_items_and_reports_dropped_ids() {
    let store = TempStore::new();
    with_env(&[("AISLEFINDER_DATABASE_URL", store.url())], || {
        assert_eq!(seed::run(None).exit_code, 0);

        let result = checkout::run(vec!["P100".into(), "P404".into(), "P200".into()]);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "2 items, total $7.66 (not in catalog: P404)");
        assert_eq!(payload["data"]["subtotal"], "$7.09");
        assert_eq!(payload["data"]["tax"], "$0.57");
        assert_eq!(payload["data"]["dropped"][0], "P404");
        assert_eq!(payload["data"]["items"][1]["name"], "Corn Flakes");
    });
}

#[test]
fn checkout_honors_configured_tax_rate_and_inline_items() {
    let store = TempStore::new();
    with_env(
        &[("AISLEFINDER_DATABASE_URL", store.url()), ("AISLEFINDER_PRICING_TAX_RATE", "0.10")],
        || {
            let result = checkout::run(vec!["X1:Gift Card:10.00".into()]);
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["data"]["items"][0]["source"], "inline");
            assert_eq!(payload["data"]["total"], "$11.00");
        },
    );
}

#[test]
fn checkout_rejects_malformed_items_before_touching_the_store() {
    with_env(&[], || {
        let result = checkout::run(vec!["P1:Milk:cheap".into()]);
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn recommend_without_provider_falls_back_to_featured_sample() {
    let store = TempStore::new();
    with_env(&[("AISLEFINDER_DATABASE_URL", store.url())], || {
        assert_eq!(seed::run(None).exit_code, 0);

        let result = recommend::run("P200".to_string());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "Explore These Popular Products");
        assert_eq!(payload["data"]["kind"], "featured");
        let items = payload["data"]["items"].as_array().expect("featured items");
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|item| item["image_url"].is_string()));

        let unknown = recommend::run("P404".to_string());
        assert_eq!(unknown.exit_code, 6);
    });
}

struct TempStore {
    dir: TempDir,
    url: String,
}

impl TempStore {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("aislefinder.db").display());
        Self { dir, url }
    }

    fn url(&self) -> &str {
        &self.url
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "AISLEFINDER_DATABASE_URL",
        "AISLEFINDER_DATABASE_MAX_CONNECTIONS",
        "AISLEFINDER_DATABASE_TIMEOUT_SECS",
        "AISLEFINDER_SUGGESTIONS_PROVIDER",
        "AISLEFINDER_SUGGESTIONS_API_KEY",
        "AISLEFINDER_SUGGESTIONS_BASE_URL",
        "AISLEFINDER_SUGGESTIONS_MODEL",
        "AISLEFINDER_SUGGESTIONS_TIMEOUT_SECS",
        "AISLEFINDER_SUGGESTIONS_MAX_SUGGESTIONS",
        "AISLEFINDER_SUGGESTIONS_DEBOUNCE_MS",
        "AISLEFINDER_SUGGESTIONS_FALLBACK_SAMPLE_SIZE",
        "AISLEFINDER_SERVER_BIND_ADDRESS",
        "AISLEFINDER_SERVER_PORT",
        "AISLEFINDER_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "AISLEFINDER_SERVER_CART_IDLE_SECS",
        "AISLEFINDER_SERVER_MAX_CART_SESSIONS",
        "AISLEFINDER_PRICING_TAX_RATE",
        "AISLEFINDER_LOGGING_LEVEL",
        "AISLEFINDER_LOGGING_FORMAT",
        "AISLEFINDER_LOG_LEVEL",
        "AISLEFINDER_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
