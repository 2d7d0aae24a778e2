//! End-to-end command runs against a temporary data directory.

use datagate_cli::commands::{self, ListTarget};
use datagate_cli::{CliConfig, CliError, OutputFormat, StoreContext};
use datagate_store::{EscrowStore, NewAccessRequest, NewGrantObligation};
use datagate_types::{RequestKey, TxHash};
use tempfile::TempDir;

fn initialized(temp_dir: &TempDir) -> (CliConfig, std::path::PathBuf) {
    let config_path = temp_dir.path().join("config.toml");
    let mut config = CliConfig::default();
    config.storage.data_dir = temp_dir.path().join("data");
    commands::init(config, &config_path, OutputFormat::Human).unwrap();

    // Read back what init wrote, as a later invocation would.
    let config = CliConfig::load(&config_path).unwrap();
    (config, config_path)
}

#[test]
fn test_inspect_after_init() {
    let temp_dir = TempDir::new().unwrap();
    if std::env::var("DATAGATE_DATA_DIR").is_ok() {
        return;
    }
    let (config, _) = initialized(&temp_dir);
    assert_eq!(config.storage.data_dir, temp_dir.path().join("data"));

    let key = RequestKey::parse("0xa11ce", "0xb0b", "weather-2024").unwrap();
    let store = StoreContext::open(&config).unwrap().store;
    let request = store
        .insert_request(&NewAccessRequest {
            key: key.clone(),
            message: None,
            price: 1_000,
            created_at: 10,
        })
        .unwrap();
    let approved = store.mark_approved(request.id, request.version, 20).unwrap();
    store
        .mark_paid(
            approved.id,
            approved.version,
            &TxHash::parse("0xc0ffee").unwrap(),
            30,
            &NewGrantObligation {
                expires_at: 1_000_030,
                nonce: "n-1".into(),
                created_at: 30,
            },
        )
        .unwrap();

    let listed = commands::list(
        config.clone(),
        OutputFormat::Human,
        ListTarget::Owner("0xa11ce".into()),
        20,
        None,
    )
    .unwrap();
    assert!(listed.contains("weather-2024"));
    assert!(listed.contains("paid"));

    let shown = commands::show(
        config.clone(),
        OutputFormat::Human,
        "0xa11ce",
        "0xb0b",
        "weather-2024",
    )
    .unwrap();
    assert!(shown.contains("Payment tx: 0xc0ffee"));
    assert!(shown.contains("pending after 0 failed attempt(s)"));

    let pending = commands::pending_grants(config, OutputFormat::Json, 10).unwrap();
    let json: serde_json::Value = serde_json::from_str(&pending).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["grants"][0]["nonce"], "n-1");
}

#[test]
fn test_commands_require_init() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = CliConfig::default();
    config.storage.data_dir = temp_dir.path().join("never-created");

    let err = commands::pending_grants(config.clone(), OutputFormat::Human, 10).unwrap_err();
    assert!(matches!(err, CliError::NotInitialized(_)));
    assert_eq!(err.exit_code(), 4);
    assert!(!config.database_path().exists());
}

#[test]
fn test_show_rejects_malformed_address() {
    let temp_dir = TempDir::new().unwrap();
    if std::env::var("DATAGATE_DATA_DIR").is_ok() {
        return;
    }
    let (config, _) = initialized(&temp_dir);

    let err = commands::show(config, OutputFormat::Human, "alice", "0xb0b", "weather-2024")
        .unwrap_err();
    assert!(matches!(err, CliError::InvalidArgument(_)));
}
