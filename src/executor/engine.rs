//! Query engine
//!
//! Entry point for executing a logical plan against the ledger:
//!
//! 1. Build the alias map from the select list
//! 2. Compile the filter into an access path (no ledger access)
//! 3. Fetch blocks with bounded fan-out, racing the cancellation signal
//! 4. Flatten blocks into the ledger frame
//! 5. Run the relational pipeline
//! 6. Wrap the result in a cursor

use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::cursor::ResultCursor;
use crate::frame::Frame;
use crate::ledger::LedgerClient;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, ObservationScope};
use crate::plan::{AliasMap, ExplainPlan, LogicalPlan};

use super::errors::{ExecutorError, ExecutorResult};
use super::flatten::flatten_blocks;
use super::processor::RelationalProcessor;
use super::translator::Translator;

/// Executes logical plans against one ledger
pub struct QueryEngine {
    client: Arc<dyn LedgerClient>,
    config: EngineConfig,
    metrics: Arc<MetricsRegistry>,
}

impl QueryEngine {
    pub fn new(client: Arc<dyn LedgerClient>, config: EngineConfig) -> Self {
        Self {
            client,
            config,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn client(&self) -> &Arc<dyn LedgerClient> {
        &self.client
    }

    /// Describes how `plan` would read the ledger, without reading it
    pub fn explain(&self, plan: &LogicalPlan) -> ExplainPlan {
        let compiled = AliasMap::from_select(&plan.select)
            .and_then(|aliases| Translator::compile(plan, &aliases));

        let explain = match compiled {
            Ok(access) => ExplainPlan::from_access(plan, &access),
            Err(e) => ExplainPlan::from_error(&e),
        };

        let access = explain.access.clone().unwrap_or_default();
        log_event_with_fields(
            Event::ExplainComplete,
            &[
                ("accepted", if explain.accepted { "true" } else { "false" }),
                ("access", access.as_str()),
            ],
        );
        explain
    }

    /// Executes `plan`.
    ///
    /// When `cancel` becomes true the in-flight fetches are dropped and
    /// `ExecutorError::Cancelled` is returned without waiting for them.
    pub async fn execute(
        &self,
        plan: &LogicalPlan,
        mut cancel: watch::Receiver<bool>,
    ) -> ExecutorResult<ResultCursor> {
        let query_id = Uuid::new_v4().to_string();
        let table = plan.from.clone().unwrap_or_default();
        log_event_with_fields(
            Event::QueryReceived,
            &[("query_id", query_id.as_str()), ("table", table.as_str())],
        );

        let result = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => Err(ExecutorError::Cancelled),
            r = self.run(plan, &query_id) => r,
        };

        match result {
            Ok(frame) => {
                let rows = frame.len().to_string();
                self.metrics.increment_queries_executed();
                self.metrics.add_rows_returned(frame.len() as u64);
                log_event_with_fields(
                    Event::QueryExecuted,
                    &[("query_id", query_id.as_str()), ("rows", rows.as_str())],
                );
                Ok(ResultCursor::new(frame))
            }
            Err(e) => {
                let event = match e {
                    ExecutorError::Cancelled | ExecutorError::SessionClosed => {
                        self.metrics.increment_queries_cancelled();
                        Event::QueryCancelled
                    }
                    _ => {
                        self.metrics.increment_queries_rejected();
                        Event::QueryRejected
                    }
                };
                let message = e.message();
                log_event_with_fields(
                    event,
                    &[
                        ("code", e.code()),
                        ("message", message.as_str()),
                        ("query_id", query_id.as_str()),
                    ],
                );
                Err(e)
            }
        }
    }

    async fn run(&self, plan: &LogicalPlan, query_id: &str) -> ExecutorResult<Frame> {
        let aliases = AliasMap::from_select(&plan.select)?;
        let access = Translator::compile(plan, &aliases)?;

        let rendered = access.to_string();
        log_event_with_fields(
            Event::QueryPlanned,
            &[("access", rendered.as_str()), ("query_id", query_id)],
        );

        let translator = Translator::new(Arc::clone(&self.client), self.config.fetch_concurrency);
        // Dropped mid-fetch on cancellation, which logs FETCH_INCOMPLETE
        let scope = ObservationScope::with_fields("FETCH", &[("query_id", query_id)]);
        let blocks = match translator.fetch_blocks(&access).await {
            Ok(blocks) => blocks,
            Err(e) => {
                scope.fail(e.code(), &e.to_string());
                return Err(e.into());
            }
        };
        let fetched = blocks.len().to_string();
        scope.complete_with_fields(&[("blocks", fetched.as_str())]);
        self.metrics.add_blocks_fetched(blocks.len() as u64);

        let frame = flatten_blocks(&blocks, aliases)?;
        Ok(RelationalProcessor::process(&frame, plan)?)
    }
}

/// Resolves once the signal reads true. A dropped sender never cancels.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
