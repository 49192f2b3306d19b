//! The end-to-end run: authenticate, mint a capability, create, insert, query.
//!
//! Strictly sequential. The first failing step ends the run and is reported
//! with the step it happened in.

use std::fmt;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tamperproof_client::{
    batch_to_json_rows, format_batch, sql, AuthFlow, CapabilityCredential, ClientError, RecordBatch,
    WarehouseClient,
};
use tamperproof_config::Config;

/// `PROOF_ORDER` of the single inserted row.
pub const FIRST_PROOF_ORDER: i64 = 0;

/// Per-invocation overrides on top of the loaded config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Planet to insert; random when unset
    pub planet: Option<String>,
    /// Overrides `Config::persist_wait`
    pub persist_wait: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Authenticate,
    IssueCapability,
    CreateTable,
    InsertRow,
    QueryTable,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Authenticate => "authentication",
            Step::IssueCapability => "capability issuance",
            Step::CreateTable => "table creation",
            Step::InsertRow => "insert",
            Step::QueryTable => "tamper-proof query",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {source}")]
pub struct StepError {
    pub step: Step,
    #[source]
    pub source: ClientError,
}

trait InStep<T> {
    fn in_step(self, step: Step) -> Result<T, StepError>;
}

impl<T> InStep<T> for Result<T, ClientError> {
    fn in_step(self, step: Step) -> Result<T, StepError> {
        self.map_err(|source| StepError { step, source })
    }
}

/// What a successful run did.
#[derive(Debug)]
pub struct RunReport {
    pub resource_id: String,
    pub public_key: String,
    pub planet: String,
    pub batch: RecordBatch,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    resource_id: &'a str,
    public_key: &'a str,
    planet: &'a str,
    row_count: usize,
    rows: Vec<serde_json::Value>,
}

impl RunReport {
    pub fn row_count(&self) -> usize {
        self.batch.num_rows()
    }

    /// Summary for `--json`.
    pub fn to_json(&self) -> Result<serde_json::Value, ClientError> {
        let report = ReportJson {
            resource_id: &self.resource_id,
            public_key: &self.public_key,
            planet: &self.planet,
            row_count: self.row_count(),
            rows: batch_to_json_rows(&self.batch)?,
        };
        serde_json::to_value(report).map_err(|e| ClientError::Parse(e.to_string()))
    }
}

/// Run every step against the configured warehouse.
pub fn run(config: &Config, options: &RunOptions) -> Result<RunReport, StepError> {
    let client = WarehouseClient::from_config(config);

    // 1) Authenticate
    let session = AuthFlow::new(&client, config).run().in_step(Step::Authenticate)?;

    // 2) Capability token for a fresh table
    let credential = CapabilityCredential::issue(&config.schema).in_step(Step::IssueCapability)?;

    // 3) Create the tamper-proof table
    client
        .create_table(&session, &credential)
        .in_step(Step::CreateTable)?;

    // 4) Insert one row, then give the server time to persist it
    let planet = match &options.planet {
        Some(p) => p.clone(),
        None => sql::random_planet(&mut rand::thread_rng()).to_string(),
    };
    client
        .insert_row(&session, &credential, FIRST_PROOF_ORDER, &planet)
        .in_step(Step::InsertRow)?;

    let wait = options.persist_wait.unwrap_or(config.persist_wait);
    if !wait.is_zero() {
        tracing::info!(seconds = wait.as_secs(), "waiting for the row to be persisted");
        thread::sleep(wait);
    }

    // 5) Query it back
    let batch = client
        .query_table(&session, &credential)
        .in_step(Step::QueryTable)?;

    match format_batch(&batch) {
        Ok(table) => tracing::info!("query response data:\n{}", table),
        Err(e) => tracing::warn!(error = %e, rows = batch.num_rows(), "cannot render query response"),
    }

    Ok(RunReport {
        resource_id: credential.resource_id,
        public_key: credential.public_key,
        planet,
        batch,
    })
}
