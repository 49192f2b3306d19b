// tproof CLI - create, fill, and read back a tamper-proof warehouse table

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use tamperproof_cli::exit_codes::{config_exit_code, step_exit_code, EXIT_ERROR, EXIT_SUCCESS};
use tamperproof_cli::logging;
use tamperproof_cli::pipeline::{self, RunOptions, Step};
use tamperproof_config::{merged_source, Config, ALL_KEYS, DEFAULT_ENV_FILE};

#[derive(Parser)]
#[command(name = "tproof")]
#[command(about = "Authenticate, mint a capability token, then create, fill, and query a tamper-proof table")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
Configuration keys (from the env file or the environment):
  API_URL            API base URL (required)
  TAMPERPROOF_URL    query endpoint path under API_URL (required)
  USER_ID            user identifier (required)
  USER_PRIVATE_KEY   base64 ed25519 private key (required)
  USER_PUBLIC_KEY    base64 ed25519 public key (required)
  AUTH_SCHEME        signature scheme (default: ed25519)
  PERSIST_WAIT_SECS  delay between insert and query (default: 10)
  HTTP_TIMEOUT_SECS  per-request timeout (default: 60)

Examples:
  tproof
  tproof analytics --env-file prod.env
  tproof --planet Mars --persist-wait-secs 0 --json | jq .rows")]
struct Cli {
    /// Schema the new table is created in
    #[arg(value_name = "SCHEMA")]
    schema: Option<String>,

    /// Env file with configuration keys (process env wins)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Planet to insert instead of a random one
    #[arg(long)]
    planet: Option<String>,

    /// Seconds to wait between insert and query
    #[arg(long, value_name = "SECS")]
    persist_wait_secs: Option<u64>,

    /// Print a JSON run summary to stdout
    #[arg(long)]
    json: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
    )
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: u8, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), hint: None }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            tracing::error!("{}", message);
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let source = merged_source(&cli.env_file, &ALL_KEYS)
        .map_err(|e| CliError::new(config_exit_code(&e), e.to_string()))?;
    let config = Config::from_source(&source, cli.schema.as_deref()).map_err(|e| {
        CliError::new(config_exit_code(&e), e.to_string())
            .with_hint(format!("looked in {} and the process environment", cli.env_file.display()))
    })?;
    tracing::debug!(?config, "configuration loaded");

    let options = RunOptions {
        planet: cli.planet,
        persist_wait: cli.persist_wait_secs.map(Duration::from_secs),
    };

    let report = pipeline::run(&config, &options).map_err(|e| {
        let code = step_exit_code(&e);
        let err = CliError::new(code, e.to_string());
        match e.step {
            Step::Authenticate => err.with_hint("check USER_ID, USER_PRIVATE_KEY and USER_PUBLIC_KEY"),
            _ => err,
        }
    })?;

    tracing::info!(
        resource_id = %report.resource_id,
        rows = report.row_count(),
        "run complete"
    );

    if cli.json {
        let json = report
            .to_json()
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
        println!("{}", json);
    }

    Ok(())
}
