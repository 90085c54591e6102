//! sigma-query - Run SQL against the Stripe Sigma API and print the rows.

mod cli;

use cli::{Cli, OutputFormat};
use sigma_query::error::{Result, SigmaError};
use sigma_query::{logging, Config, QueryExecutor, RecordSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load .env before parsing so clap can pick up STRIPE_API_KEY from it.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        let code = if matches!(e, SigmaError::Cancelled) { 130 } else { 1 };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let sql = cli.read_sql().map_err(SigmaError::config)?;
    let format = cli.parse_output_format().map_err(SigmaError::config)?;

    // Load configuration file
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    apply_cli_overrides(&cli, &mut config);

    let client_config = config.to_client_config(cli.api_key.clone())?;
    info!("Using API at {}", client_config.base_url());
    let executor = QueryExecutor::from_config(&client_config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let records = executor.execute_query_with_cancel(&sql, &cancel).await?;
    print_records(&records, format)
}

/// Applies command-line settings on top of the config file.
fn apply_cli_overrides(cli: &Cli, config: &mut Config) {
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.poll.max_attempts = max_attempts;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.poll.interval_ms = interval_ms;
    }
}

fn print_records(records: &RecordSet, format: OutputFormat) -> Result<()> {
    let serialize_error =
        |e: serde_json::Error| SigmaError::protocol(format!("Failed to serialize records: {e}"));

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(records).map_err(serialize_error)?
            );
        }
        OutputFormat::JsonLines => {
            for record in records.ordered() {
                println!("{}", serde_json::to_string(&record).map_err(serialize_error)?);
            }
        }
    }

    Ok(())
}
