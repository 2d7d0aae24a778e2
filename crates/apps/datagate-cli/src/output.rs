//! Output formatting for CLI.

use datagate_store::{GrantObligation, RequestPage};
use datagate_types::{AccessRequest, Timestamp};
use serde::Serialize;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use 'human' or 'json'.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Trait for renderable output.
pub trait Render: Serialize {
    /// Render as human-readable string.
    fn render_human(&self) -> String;

    /// Render as JSON string.
    fn render_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Render in the specified format.
    fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Human => self.render_human(),
            OutputFormat::Json => self.render_json(),
        }
    }
}

fn optional_ts(ts: Option<Timestamp>) -> String {
    ts.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
}

// =============================================================================
// Output Types
// =============================================================================

/// Output for `init`.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub config_path: String,
    pub database_path: String,
    /// False when an existing config file was kept.
    pub config_written: bool,
}

impl Render for InitOutput {
    fn render_human(&self) -> String {
        let config_line = if self.config_written {
            format!("Configuration saved to: {}", self.config_path)
        } else {
            format!("Configuration kept at: {}", self.config_path)
        };
        format!("{}\nEscrow database ready: {}", config_line, self.database_path)
    }
}

/// Output for `list`.
#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub requests: Vec<AccessRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<RequestPage> for ListOutput {
    fn from(page: RequestPage) -> Self {
        Self {
            requests: page.requests,
            next_cursor: page.next_cursor.map(|c| c.to_string()),
        }
    }
}

impl Render for ListOutput {
    fn render_human(&self) -> String {
        if self.requests.is_empty() {
            return "No access requests found.".to_string();
        }

        let mut lines = vec![format!(
            "{:>6}  {:<8}  {:<20}  {:<20}  {:<24}  {:>12}  {:>14}",
            "ID", "STATUS", "OWNER", "REQUESTER", "DATASET", "PRICE", "CREATED"
        )];
        for r in &self.requests {
            lines.push(format!(
                "{:>6}  {:<8}  {:<20}  {:<20}  {:<24}  {:>12}  {:>14}",
                r.id,
                r.status.as_str(),
                r.owner.as_str(),
                r.requester.as_str(),
                r.dataset.as_str(),
                r.price,
                optional_ts(r.created_at)
            ));
        }
        if let Some(cursor) = &self.next_cursor {
            lines.push(String::new());
            lines.push(format!("More results: --cursor {}", cursor));
        }
        lines.join("\n")
    }
}

/// Output for `show`.
#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub request: AccessRequest,
    /// Grant obligation, present once the request is paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant: Option<GrantObligation>,
}

impl Render for ShowOutput {
    fn render_human(&self) -> String {
        let r = &self.request;
        let mut lines = vec![
            format!("Request #{} ({})", r.id, r.status),
            format!("  Owner:      {}", r.owner),
            format!("  Requester:  {}", r.requester),
            format!("  Dataset:    {}", r.dataset),
            format!("  Price:      {}", r.price),
            format!("  Created:    {}", optional_ts(r.created_at)),
            format!("  Approved:   {}", optional_ts(r.approved_at)),
            format!("  Paid:       {}", optional_ts(r.paid_at)),
        ];
        if let Some(message) = &r.message {
            lines.push(format!("  Message:    {}", message));
        }
        if let Some(tx) = &r.payment_tx {
            lines.push(format!("  Payment tx: {}", tx));
        }
        if let Some(tx) = &r.grant_tx {
            lines.push(format!("  Grant tx:   {}", tx));
        }
        if let Some(grant) = &self.grant {
            if grant.is_completed() {
                lines.push(format!("  Grant:      recorded, expires {}", grant.expires_at));
            } else {
                lines.push(match grant.failed_at {
                    Some(failed_at) => format!(
                        "  Grant:      rejected by ledger at {} after {} attempt(s)",
                        failed_at, grant.attempts
                    ),
                    None => format!(
                        "  Grant:      pending after {} failed attempt(s), next try at {}",
                        grant.attempts, grant.next_attempt_at
                    ),
                });
                if let Some(error) = &grant.last_error {
                    lines.push(format!("  Last error: {}", error));
                }
            }
        }
        lines.join("\n")
    }
}

/// Output for `grants pending`.
#[derive(Debug, Serialize)]
pub struct PendingGrantsOutput {
    pub grants: Vec<GrantObligation>,
    pub total: usize,
}

impl Render for PendingGrantsOutput {
    fn render_human(&self) -> String {
        if self.grants.is_empty() {
            return "No pending grants.".to_string();
        }

        let mut lines = vec![format!("{} pending grant(s):", self.total)];
        for g in &self.grants {
            lines.push(format!(
                "  #{} {} attempts={} next={} expires={}",
                g.request_id, g.key, g.attempts, g.next_attempt_at, g.expires_at
            ));
            if let Some(error) = &g.last_error {
                lines.push(format!("      last error: {}", error));
            }
        }
        lines.join("\n")
    }
}

/// Output for `grants failed`.
#[derive(Debug, Serialize)]
pub struct FailedGrantsOutput {
    pub grants: Vec<GrantObligation>,
    pub total: usize,
}

impl Render for FailedGrantsOutput {
    fn render_human(&self) -> String {
        if self.grants.is_empty() {
            return "No failed grants.".to_string();
        }

        let mut lines = vec![format!("{} failed grant(s):", self.total)];
        for g in &self.grants {
            lines.push(format!(
                "  #{} {} payment={} failed={}",
                g.request_id,
                g.key,
                g.payment_tx,
                optional_ts(g.failed_at)
            ));
            if let Some(error) = &g.last_error {
                lines.push(format!("      reason: {}", error));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Human);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_empty_list() {
        let output = ListOutput {
            requests: vec![],
            next_cursor: None,
        };
        assert!(output.render(OutputFormat::Human).contains("No access requests"));

        let json: serde_json::Value =
            serde_json::from_str(&output.render(OutputFormat::Json)).unwrap();
        assert_eq!(json["requests"], serde_json::json!([]));
        assert!(json.get("next_cursor").is_none());
    }

    #[test]
    fn test_init_output() {
        let output = InitOutput {
            config_path: "/tmp/config.toml".into(),
            database_path: "/tmp/datagate.db".into(),
            config_written: false,
        };
        assert!(output.render_human().contains("kept"));
        assert!(output.render_json().contains("\"config_written\": false"));
    }
}
