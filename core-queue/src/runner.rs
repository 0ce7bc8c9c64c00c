//! Job scheduler and runner.
//!
//! Executes one external command per queue item, sequentially or across N
//! workers sharing one atomically-incremented cursor. The item set is fixed
//! when the run starts; items added afterwards belong to the next run.
//!
//! Per item the state machine is `Pending -> Running -> Success | Warning |
//! Error`. Success vs warning is decided by an injected
//! [`ResultClassifier`]; executor failures become `Error` with the failure
//! description stored as the item's result text, and never stop the run.
//!
//! Cancellation is cooperative: the token is checked before every claim, so
//! an in-flight command finishes and every unclaimed item stays `Pending`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bridge_traits::ProcessExecutor;
use core_runtime::events::{CoreEvent, EventBus, RunEvent};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::models::{ItemStatus, QueueItem};
use crate::store::QueueStore;
use crate::template::render_command;

// =============================================================================
// Configuration
// =============================================================================

/// How workers iterate the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// One worker walks the queue in order.
    #[default]
    Sequential,
    /// N workers race over a shared cursor; completion order is unspecified.
    Parallel(usize),
}

impl RunMode {
    fn worker_count(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel(workers) => (*workers).max(1),
        }
    }
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Execution mode for the next run.
    pub mode: RunMode,
    /// Command template rendered per item (see [`crate::template`]).
    pub command_template: String,
    /// Working directory bound to every executed command.
    pub working_dir: PathBuf,
}

impl RunnerConfig {
    pub fn new(command_template: impl Into<String>) -> Self {
        Self {
            mode: RunMode::default(),
            command_template: command_template.into(),
            working_dir: PathBuf::from("."),
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }
}

// =============================================================================
// Result classification
// =============================================================================

/// Outcome of a command that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Warning,
}

impl From<RunOutcome> for ItemStatus {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Success => ItemStatus::Success,
            RunOutcome::Warning => ItemStatus::Warning,
        }
    }
}

/// Splits completed command output into success vs warning.
///
/// The engine has no opinion on what a warning looks like; the embedding
/// application supplies the policy.
pub trait ResultClassifier: Send + Sync {
    fn classify(&self, output: &str) -> RunOutcome;
}

/// Default classifier: every completed command is a success.
pub struct AcceptAllClassifier;

impl ResultClassifier for AcceptAllClassifier {
    fn classify(&self, _output: &str) -> RunOutcome {
        RunOutcome::Success
    }
}

// =============================================================================
// Aggregate counters
// =============================================================================

/// Aggregate terminal-status counters, queryable mid-run.
#[derive(Debug, Default)]
pub struct RunTotals {
    success: AtomicU64,
    warning: AtomicU64,
    error: AtomicU64,
}

impl RunTotals {
    fn reset(&self) {
        self.success.store(0, Ordering::SeqCst);
        self.warning.store(0, Ordering::SeqCst);
        self.error.store(0, Ordering::SeqCst);
    }

    fn record(&self, status: ItemStatus) {
        match status {
            ItemStatus::Success => self.success.fetch_add(1, Ordering::SeqCst),
            ItemStatus::Warning => self.warning.fetch_add(1, Ordering::SeqCst),
            ItemStatus::Error => self.error.fetch_add(1, Ordering::SeqCst),
            ItemStatus::Pending | ItemStatus::Running => 0,
        };
    }

    fn snapshot(&self) -> TotalsSnapshot {
        TotalsSnapshot {
            success: self.success.load(Ordering::SeqCst),
            warning: self.warning.load(Ordering::SeqCst),
            error: self.error.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time copy of the aggregate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TotalsSnapshot {
    pub success: u64,
    pub warning: u64,
    pub error: u64,
}

impl TotalsSnapshot {
    /// Items that reached a terminal status.
    pub fn processed(&self) -> u64 {
        self.success + self.warning + self.error
    }
}

// =============================================================================
// Run summary
// =============================================================================

/// How a call to [`QueueRunner::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every snapshotted item was processed.
    Completed,
    /// The run was cancelled; unclaimed items stayed pending.
    Cancelled,
    /// Another run was already active; nothing happened.
    Rejected,
}

/// Result of one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub status: RunStatus,
    /// Items snapshotted at run start.
    pub total: usize,
    pub totals: TotalsSnapshot,
}

// =============================================================================
// Runner
// =============================================================================

/// Executes the queued items' commands.
pub struct QueueRunner {
    store: Arc<QueueStore>,
    executor: Arc<dyn ProcessExecutor>,
    classifier: Arc<dyn ResultClassifier>,
    config: RunnerConfig,
    events: EventBus,
    running: Arc<AtomicBool>,
    totals: Arc<RunTotals>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl QueueRunner {
    pub fn new(
        store: Arc<QueueStore>,
        executor: Arc<dyn ProcessExecutor>,
        config: RunnerConfig,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            executor,
            classifier: Arc::new(AcceptAllClassifier),
            config,
            events,
            running: Arc::new(AtomicBool::new(false)),
            totals: Arc::new(RunTotals::default()),
            cancel: Mutex::new(None),
        }
    }

    /// Replace the success/warning classification policy.
    pub fn with_classifier(mut self, classifier: Arc<dyn ResultClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Aggregate counters for the current (or last) run.
    pub fn totals(&self) -> TotalsSnapshot {
        self.totals.snapshot()
    }

    /// Whether a run is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the active run, if any, to stop after in-flight items finish.
    pub fn cancel(&self) {
        let guard = self.cancel.lock().expect("runner cancel mutex poisoned");
        if let Some(token) = guard.as_ref() {
            info!("run cancellation requested");
            token.cancel();
        }
    }

    /// Run every currently queued item once.
    ///
    /// The queue is snapshotted at entry; items added during the run are not
    /// part of it. Starting a run while one is active is a rejected no-op.
    #[instrument(skip(self), name = "queue_run")]
    pub async fn run(&self) -> RunSummary {
        let run_id = Uuid::new_v4().to_string();

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(%run_id, "run requested while another run is active; ignored");
            return RunSummary {
                run_id,
                status: RunStatus::Rejected,
                total: 0,
                totals: TotalsSnapshot::default(),
            };
        }

        self.totals.reset();
        let token = CancellationToken::new();
        *self.cancel.lock().expect("runner cancel mutex poisoned") = Some(token.clone());

        let snapshot = Arc::new(self.store.snapshot());
        let workers = self.config.mode.worker_count();
        let cursor = Arc::new(AtomicUsize::new(0));

        info!(%run_id, total = snapshot.len(), workers, "run started");
        let _ = self.events.emit(CoreEvent::Run(RunEvent::Started {
            run_id: run_id.clone(),
            total: snapshot.len(),
            workers,
        }));

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let ctx = WorkerCtx {
                store: Arc::clone(&self.store),
                executor: Arc::clone(&self.executor),
                classifier: Arc::clone(&self.classifier),
                command_template: self.config.command_template.clone(),
                working_dir: self.config.working_dir.clone(),
                events: self.events.clone(),
                totals: Arc::clone(&self.totals),
            };
            let snapshot = Arc::clone(&snapshot);
            let cursor = Arc::clone(&cursor);
            let token = token.clone();
            let run_id = run_id.clone();
            handles.push(tokio::spawn(async move {
                ctx.worker_loop(worker_id, &run_id, &snapshot, &cursor, &token)
                    .await;
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task panicked");
            }
        }

        let cancelled = token.is_cancelled();
        *self.cancel.lock().expect("runner cancel mutex poisoned") = None;
        self.running.store(false, Ordering::SeqCst);

        let totals = self.totals.snapshot();
        info!(
            %run_id,
            success = totals.success,
            warning = totals.warning,
            error = totals.error,
            cancelled,
            "run finished"
        );
        let _ = self.events.emit(CoreEvent::Run(RunEvent::Completed {
            run_id: run_id.clone(),
            success: totals.success,
            warning: totals.warning,
            error: totals.error,
            cancelled,
        }));

        RunSummary {
            run_id,
            status: if cancelled {
                RunStatus::Cancelled
            } else {
                RunStatus::Completed
            },
            total: snapshot.len(),
            totals,
        }
    }
}

/// Everything one worker needs, cloned per spawned task.
struct WorkerCtx {
    store: Arc<QueueStore>,
    executor: Arc<dyn ProcessExecutor>,
    classifier: Arc<dyn ResultClassifier>,
    command_template: String,
    working_dir: PathBuf,
    events: EventBus,
    totals: Arc<RunTotals>,
}

impl WorkerCtx {
    async fn worker_loop(
        &self,
        worker_id: usize,
        run_id: &str,
        snapshot: &[QueueItem],
        cursor: &AtomicUsize,
        token: &CancellationToken,
    ) {
        loop {
            if token.is_cancelled() {
                debug!(worker_id, "cancellation observed before claim");
                break;
            }
            // fetch_add hands each index to exactly one worker.
            let index = cursor.fetch_add(1, Ordering::SeqCst);
            if index >= snapshot.len() {
                break;
            }
            self.process(run_id, &snapshot[index]).await;
        }
    }

    async fn process(&self, run_id: &str, item: &QueueItem) {
        let key = item.key();
        self.store.set_status(&key, ItemStatus::Running);
        let _ = self.events.emit(CoreEvent::Run(RunEvent::ItemStarted {
            run_id: run_id.to_string(),
            key: key.storage_key(),
        }));

        let command = render_command(&self.command_template, item);
        debug!(%key, command, "executing command");

        let (status, result) = match self.executor.run(&command, &self.working_dir).await {
            Ok(output) => {
                let status: ItemStatus = self.classifier.classify(&output).into();
                let trimmed = output.trim();
                let result = (!trimmed.is_empty()).then(|| trimmed.to_string());
                (status, result)
            }
            Err(e) => {
                warn!(%key, error = %e, "command execution failed");
                (ItemStatus::Error, Some(e.to_string()))
            }
        };

        self.store.finish_item(&key, status, result.clone());
        self.totals.record(status);
        let _ = self.events.emit(CoreEvent::Run(RunEvent::ItemFinished {
            run_id: run_id.to_string(),
            key: key.storage_key(),
            status: status.as_str().to_string(),
            result,
        }));
    }
}
