//! Inspect grant obligations.

use datagate_store::EscrowStore;

use crate::config::CliConfig;
use crate::context::StoreContext;
use crate::error::CliResult;
use crate::output::{FailedGrantsOutput, OutputFormat, PendingGrantsOutput, Render};

/// Execute `grants pending`.
pub fn pending_grants(config: CliConfig, format: OutputFormat, limit: u32) -> CliResult<String> {
    let ctx = StoreContext::open(&config)?;
    let grants = ctx.store.pending_grants(limit)?;
    let total = grants.len();

    Ok(PendingGrantsOutput { grants, total }.render(format))
}

/// Execute `grants failed`.
pub fn failed_grants(config: CliConfig, format: OutputFormat, limit: u32) -> CliResult<String> {
    let ctx = StoreContext::open(&config)?;
    let grants = ctx.store.failed_grants(limit)?;
    let total = grants.len();

    Ok(FailedGrantsOutput { grants, total }.render(format))
}
