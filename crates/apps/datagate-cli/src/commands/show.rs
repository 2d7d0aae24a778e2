//! Show the latest request for a tuple.

use datagate_store::EscrowStore;
use datagate_types::RequestKey;

use crate::config::CliConfig;
use crate::context::StoreContext;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, Render, ShowOutput};

/// Execute the show command.
pub fn show(
    config: CliConfig,
    format: OutputFormat,
    owner: &str,
    requester: &str,
    dataset: &str,
) -> CliResult<String> {
    let key = RequestKey::parse(owner, requester, dataset)?;
    let ctx = StoreContext::open(&config)?;

    let request = ctx
        .store
        .latest_request(&key)?
        .ok_or_else(|| CliError::NotFound(key.to_string()))?;
    let grant = ctx.store.grant_obligation(request.id)?;

    Ok(ShowOutput { request, grant }.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{config_in, seed_paid, seed_request};
    use tempfile::TempDir;

    #[test]
    fn test_show_pending() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        let request = seed_request(&config, "alpha", 1_000);

        let output = show(config, OutputFormat::Human, "0xa11ce", "0xb0b", "alpha").unwrap();
        assert!(output.contains(&format!("Request #{} (pending)", request.id)));
        assert!(output.contains("for research"));
        assert!(!output.contains("Grant:"));
    }

    #[test]
    fn test_show_paid_includes_pending_grant() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        seed_paid(&config, "alpha", "0xfeed");

        let output = show(config, OutputFormat::Json, "0xA11CE", "0xB0B", "alpha").unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["request"]["status"], "paid");
        assert_eq!(json["request"]["payment_tx"], "0xfeed");
        assert_eq!(json["grant"]["attempts"], 0);
        assert!(json["grant"].get("completed_at").is_none());
    }

    #[test]
    fn test_show_rejected_grant() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        let paid = seed_paid(&config, "alpha", "0xfeed");
        StoreContext::open(&config)
            .unwrap()
            .store
            .fail_grant(paid.id, "transaction rejected: dataset delisted", 4_000)
            .unwrap();

        let output = show(config, OutputFormat::Human, "0xa11ce", "0xb0b", "alpha").unwrap();
        assert!(output.contains("rejected by ledger at 4000 after 1 attempt(s)"));
        assert!(output.contains("Last error: transaction rejected: dataset delisted"));
    }

    #[test]
    fn test_show_missing_tuple() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        seed_request(&config, "alpha", 1_000);

        let err = show(config, OutputFormat::Human, "0xa11ce", "0xb0b", "beta").unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
        assert_eq!(err.exit_code(), 2);
    }
}
