//! List access requests for a party.

use datagate_store::{EscrowStore, PageCursor, PageRequest};
use datagate_types::Address;

use crate::config::CliConfig;
use crate::context::StoreContext;
use crate::error::CliResult;
use crate::output::{ListOutput, OutputFormat, Render};

/// Whose requests to list.
#[derive(Debug, Clone)]
pub enum ListTarget {
    /// Requests addressed to this owner.
    Owner(String),
    /// Requests made by this requester.
    Requester(String),
}

/// Execute the list command.
pub fn list(
    config: CliConfig,
    format: OutputFormat,
    target: ListTarget,
    limit: u32,
    cursor: Option<&str>,
) -> CliResult<String> {
    let page = match cursor {
        Some(c) => PageRequest::after(c.parse::<PageCursor>()?, limit),
        None => PageRequest::first(limit),
    };

    let ctx = StoreContext::open(&config)?;
    let result = match target {
        ListTarget::Owner(owner) => ctx.store.list_for_owner(&Address::parse(&owner)?, &page)?,
        ListTarget::Requester(requester) => ctx
            .store
            .list_for_requester(&Address::parse(&requester)?, &page)?,
    };

    Ok(ListOutput::from(result).render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{config_in, seed_request};
    use crate::error::CliError;
    use tempfile::TempDir;

    #[test]
    fn test_list_pages_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        seed_request(&config, "alpha", 1_000);
        seed_request(&config, "beta", 2_000);
        seed_request(&config, "gamma", 3_000);

        let first = list(
            config.clone(),
            OutputFormat::Json,
            ListTarget::Owner("0xa11ce".into()),
            2,
            None,
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(json["requests"][0]["dataset"], "gamma");
        assert_eq!(json["requests"][1]["dataset"], "beta");
        let cursor = json["next_cursor"].as_str().unwrap().to_string();

        let second = list(
            config,
            OutputFormat::Json,
            ListTarget::Owner("0xa11ce".into()),
            2,
            Some(&cursor),
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&second).unwrap();
        assert_eq!(json["requests"].as_array().unwrap().len(), 1);
        assert_eq!(json["requests"][0]["dataset"], "alpha");
        assert!(json.get("next_cursor").is_none());
    }

    #[test]
    fn test_list_requester_human() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        seed_request(&config, "alpha", 1_000);

        let output = list(
            config.clone(),
            OutputFormat::Human,
            ListTarget::Requester("0xb0b".into()),
            20,
            None,
        )
        .unwrap();
        assert!(output.contains("alpha"));
        assert!(output.contains("pending"));

        let other = list(
            config,
            OutputFormat::Human,
            ListTarget::Requester("0xc4a5e".into()),
            20,
            None,
        )
        .unwrap();
        assert!(other.contains("No access requests"));
    }

    #[test]
    fn test_list_rejects_bad_cursor() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        seed_request(&config, "alpha", 1_000);

        let err = list(
            config,
            OutputFormat::Human,
            ListTarget::Owner("0xa11ce".into()),
            20,
            Some("not-a-cursor"),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }
}
