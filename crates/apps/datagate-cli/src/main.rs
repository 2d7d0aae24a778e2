//! Datagate CLI binary entry point.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use datagate_cli::{
    cli::{Cli, Commands, GrantsCommand},
    commands::{self, ListTarget},
    config::{default_config_path, CliConfig},
    error::{CliError, CliResult},
    output::OutputFormat,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            print_error(&e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins unless `--verbose`.
fn init_logging(verbose: bool) {
    let directives = match (verbose, std::env::var("RUST_LOG")) {
        (true, _) => "warn,datagate=debug".to_string(),
        (false, Ok(env)) => env,
        (false, Err(_)) => "warn".to_string(),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::new(directives))
        .init();
}

/// Print a user-friendly error message with error code and recovery hint.
fn print_error(e: &CliError) {
    let code = e.error_code();
    eprintln!("Error [{}]: {}", code, e);
    if let Some(suggestion) = code.suggestion() {
        eprintln!("Hint: {}", suggestion);
    }
}

fn run(cli: Cli) -> CliResult<String> {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = CliConfig::load(&config_path)?;
    let format: OutputFormat = cli.format.into();

    match cli.command {
        Commands::Init => commands::init(config, &config_path, format),

        Commands::List {
            owner,
            requester,
            limit,
            cursor,
        } => {
            let target = match (owner, requester) {
                (Some(owner), _) => ListTarget::Owner(owner),
                (None, Some(requester)) => ListTarget::Requester(requester),
                (None, None) => {
                    return Err(CliError::config("list needs --owner or --requester"))
                }
            };
            commands::list(config, format, target, limit, cursor.as_deref())
        }

        Commands::Show {
            owner,
            requester,
            dataset,
        } => commands::show(config, format, &owner, &requester, &dataset),

        Commands::Grants { command } => match command {
            GrantsCommand::Pending { limit } => commands::pending_grants(config, format, limit),
            GrantsCommand::Failed { limit } => commands::failed_grants(config, format, limit),
        },
    }
}
