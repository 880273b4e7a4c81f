//! CLI command implementations
//!
//! `query` and `explain` load the configuration, open the fixture ledger
//! and a session, then answer exactly one plan read from stdin.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::runtime::Runtime;

use crate::config::EngineConfig;
use crate::cursor::ResultCursor;
use crate::executor::{ExecutorError, FILTERABLE_COLUMNS, LEDGER_COLUMNS, LEDGER_TABLE};
use crate::ledger::MemoryLedger;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::plan::{ExplainPlan, LogicalPlan};
use crate::session::Session;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Query { config } => query(&config),
        Command::Explain { config } => explain(&config),
        Command::Schema => schema(),
        Command::Generate {
            channel,
            height,
            entries,
        } => generate(&channel, height, entries),
    }
}

/// Execute one plan and write its rows
pub fn query(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let plan: LogicalPlan = read_request()?;

    let runtime = Runtime::new()?;
    match runtime.block_on(execute_plan(config, &plan)) {
        Ok(data) => write_response(data),
        Err(e) => reject(&e),
    }
}

/// Explain one plan without touching the ledger
pub fn explain(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let plan: LogicalPlan = read_request()?;

    let runtime = Runtime::new()?;
    match runtime.block_on(explain_plan(config, &plan)) {
        Ok(explain) => write_response(serde_json::to_value(explain)?),
        Err(e) => reject(&e),
    }
}

/// Print the fixed ledger table schema
pub fn schema() -> CliResult<()> {
    let columns: Vec<Value> = LEDGER_COLUMNS
        .iter()
        .map(|(name, ty)| {
            json!({
                "name": name,
                "type": ty.as_str(),
                "filterable": FILTERABLE_COLUMNS.contains(name),
            })
        })
        .collect();

    write_response(json!({
        "table": LEDGER_TABLE,
        "columns": columns,
    }))
}

/// Print a synthetic ledger usable as `ledger_path`
pub fn generate(channel: &str, height: u64, entries: usize) -> CliResult<()> {
    let ledger = MemoryLedger::generate(channel, height, entries);
    write_response(serde_json::to_value(ledger.blocks())?)
}

fn load_config(path: &Path) -> CliResult<EngineConfig> {
    let config = EngineConfig::load(path)?;
    Logger::set_min_severity(config.log_severity()?);

    let path_str = path.display().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("channel", config.channel.as_str()),
            ("path", path_str.as_str()),
        ],
    );
    Ok(config)
}

async fn open_session(config: EngineConfig) -> Result<Session, ExecutorError> {
    // Fixture errors surface as ledger fetch failures
    let ledger = match &config.ledger_path {
        Some(path) => MemoryLedger::load(path)?.require_channel(&config.channel)?,
        None => MemoryLedger::default(),
    };
    Session::open(config, Arc::new(ledger)).await
}

async fn execute_plan(config: EngineConfig, plan: &LogicalPlan) -> Result<Value, ExecutorError> {
    let session = open_session(config).await?;
    let result = session.execute(plan).await.map(drain);
    session.close();
    result
}

async fn explain_plan(config: EngineConfig, plan: &LogicalPlan) -> Result<ExplainPlan, ExecutorError> {
    let session = open_session(config).await?;
    let explain = session.explain(plan);
    session.close();
    explain
}

/// Reads every remaining row, then closes the cursor
fn drain(mut cursor: ResultCursor) -> Value {
    let columns = cursor.columns().to_vec();
    let metadata = cursor.metadata().to_vec();
    let mut rows = Vec::with_capacity(cursor.row_count());

    while let Ok(true) = cursor.advance() {
        let row: Vec<Value> = (1..=columns.len())
            .map(|i| {
                cursor
                    .get_value(i)
                    .ok()
                    .flatten()
                    .and_then(|v| serde_json::to_value(v).ok())
                    .unwrap_or(Value::Null)
            })
            .collect();
        rows.push(Value::Array(row));
    }
    cursor.close();

    json!({
        "columns": columns,
        "metadata": metadata,
        "rows": rows,
    })
}

fn reject(err: &ExecutorError) -> CliResult<()> {
    write_error(err.code(), &err.message())?;
    Err(CliError::query_failed(err.to_string()))
}
