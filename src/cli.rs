//! Command-line argument parsing for sigma-query.

use clap::Parser;
use sigma_query::config::{Config, API_KEY_ENV};
use std::io::Read;
use std::path::PathBuf;

/// Output format for decoded records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single pretty-printed JSON array.
    #[default]
    Json,
    /// One JSON object per line.
    JsonLines,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            _ => Err(format!("Invalid output format: {s}. Expected: json or jsonl")),
        }
    }
}

/// Run a SQL query on Stripe Sigma and print the rows as JSON.
#[derive(Parser, Debug)]
#[command(name = "sigma-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL to run
    #[arg(value_name = "SQL", conflicts_with = "file")]
    pub sql: Option<String>,

    /// Read SQL from a file (use "-" for stdin)
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<String>,

    /// API key (sent as the basic-auth username)
    #[arg(long, env = API_KEY_ENV, hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Maximum number of status checks before giving up
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Wait between status checks, in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Output format: json or jsonl
    #[arg(short = 'o', long, value_name = "FORMAT", default_value = "json")]
    pub output: String,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(Config::default_path)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Returns the SQL text from the argument, a file, or stdin.
    pub fn read_sql(&self) -> std::result::Result<String, String> {
        let sql = match (&self.sql, self.file.as_deref()) {
            (Some(sql), _) => sql.clone(),
            (None, Some("-")) => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| format!("Failed to read SQL from stdin: {e}"))?;
                buf
            }
            (None, Some(path)) => std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read SQL file '{path}': {e}"))?,
            (None, None) => return Err("No SQL given. Pass it as an argument or use --file".into()),
        };

        if sql.trim().is_empty() {
            return Err("SQL must not be empty".into());
        }
        Ok(sql)
    }
}
