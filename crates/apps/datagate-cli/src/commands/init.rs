//! Initialize configuration and the escrow database.

use std::path::Path;

use tracing::info;

use crate::config::CliConfig;
use crate::context::StoreContext;
use crate::error::CliResult;
use crate::output::{InitOutput, OutputFormat, Render};

/// Execute the init command.
///
/// Writes `config` to `config_path` unless a file is already there, then
/// opens the database so its schema exists.
pub fn init(config: CliConfig, config_path: &Path, format: OutputFormat) -> CliResult<String> {
    let config_written = !config_path.exists();
    if config_written {
        config.save(config_path)?;
        info!(path = %config_path.display(), "Wrote default configuration");
    }

    let ctx = StoreContext::for_init(&config)?;

    let output = InitOutput {
        config_path: config_path.display().to_string(),
        database_path: ctx.database.display().to_string(),
        config_written,
    };
    Ok(output.render(format))
}
