//! Session lifecycle

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::cursor::ResultCursor;
use crate::executor::{ExecutorError, ExecutorResult, QueryEngine};
use crate::ledger::LedgerClient;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::plan::{ExplainPlan, LogicalPlan};

/// Shared view of a session's open/closed state, held by its cursors
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Marks the session closed; returns false if it already was
    fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }
}

/// An open connection to the ledger under one identity.
///
/// All methods take `&self`, so a session can be shared behind an `Arc`
/// and closed while one of its queries is still running.
pub struct Session {
    handle: SessionHandle,
    engine: QueryEngine,
    cancel: watch::Sender<bool>,
}

impl Session {
    /// Enrolls the configured identity and opens a session.
    pub async fn open(config: EngineConfig, client: Arc<dyn LedgerClient>) -> ExecutorResult<Self> {
        client.enroll(&config.identity).await?;

        let handle = SessionHandle::new();
        let id = handle.id().to_string();
        log_event_with_fields(
            Event::SessionOpened,
            &[
                ("channel", config.channel.as_str()),
                ("session_id", id.as_str()),
                ("user", config.identity.user.as_str()),
            ],
        );

        let (cancel, _) = watch::channel(false);
        Ok(Self {
            handle,
            engine: QueryEngine::new(client, config),
            cancel,
        })
    }

    pub fn id(&self) -> Uuid {
        self.handle.id()
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        self.engine.metrics()
    }

    /// Executes `plan`, returning a cursor bound to this session.
    ///
    /// Fails with `SessionClosed` if the session is closed on entry and with
    /// `Cancelled` if it is closed while the query runs.
    pub async fn execute(&self, plan: &LogicalPlan) -> ExecutorResult<ResultCursor> {
        if self.is_closed() {
            return Err(ExecutorError::SessionClosed);
        }
        let cursor = self.engine.execute(plan, self.cancel.subscribe()).await?;
        Ok(cursor.with_session(self.handle.clone()))
    }

    /// Describes how `plan` would run. Never touches the ledger.
    pub fn explain(&self, plan: &LogicalPlan) -> ExecutorResult<ExplainPlan> {
        if self.is_closed() {
            return Err(ExecutorError::SessionClosed);
        }
        Ok(self.engine.explain(plan))
    }

    /// Closes the session. Idempotent and non-blocking.
    ///
    /// Running queries observe the cancellation and return promptly;
    /// cursors already handed out report closed from now on.
    pub fn close(&self) {
        if !self.handle.mark_closed() {
            return;
        }
        self.cancel.send_replace(true);

        let id = self.handle.id().to_string();
        log_event_with_fields(Event::SessionClosed, &[("session_id", id.as_str())]);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
