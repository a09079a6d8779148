/*
[INPUT]:  Operator intents (open work, confirm quantity, abandon) + FloorClient
[OUTPUT]: Engine lifecycle transitions and session events for the UI chrome
[POS]:    Execution layer - per-station task orchestration
[UPDATE]: When changing commit guarantees or continuation semantics
[UPDATE]: 2026-07-08 Bound the commit round trip and surface timeouts distinctly
*/

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use floorlink_adapter::{
    CompleteRelocationRequest, ConfirmPickRequest, FloorClient, NextWork, TaskKind, WorkStatus,
};

use crate::capture::CapturedCode;
use crate::engine::{EngineError, ScanOutcome, StepEngine};

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(10);

/// Where follow-up work comes from after a commit: pick tasks continue with
/// the next item of the same order, relocations with the next queued task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkContext {
    PickOrder { order_id: String },
    RelocationQueue,
}

/// Notifications consumed by the UI chrome (status line, badges, completion
/// screen). Step-level outcomes stay inside the engine and never appear here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TaskLoaded {
        task_id: String,
    },
    /// Commit accepted by the server.
    ActionConfirmed {
        task_id: String,
        quantity: u32,
        message: String,
    },
    TaskCompleted {
        task_id: String,
    },
    /// The source reported no further work for the current context.
    NoTasksRemaining {
        message: Option<String>,
    },
    /// The active task is no longer ours; it was discarded and fresh work
    /// requested.
    ConflictReassigned {
        message: String,
    },
    /// Server rejected the action by business rules (200 + success=false).
    CommitRejected {
        message: String,
    },
    /// Transport failure; the operator may re-press to retry.
    CommitFailed {
        message: String,
    },
    /// No response within the commit deadline. Distinguishable from a plain
    /// failure so the operator knows the action may still have landed.
    CommitTimedOut,
    /// Fetching follow-up work failed; the session is idle.
    NextWorkFailed {
        message: String,
    },
}

/// Session-scoped controller owning the active task's engine, the work
/// context, and the commit latch. Constructed once in `main` and handed to
/// the UI; nothing here is ambient.
pub struct TaskSession {
    client: Arc<FloorClient>,
    engine: StepEngine,
    context: Option<WorkContext>,
    confirm_in_flight: bool,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl TaskSession {
    pub fn new(
        client: Arc<FloorClient>,
        engine: StepEngine,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                client,
                engine,
                context: None,
                confirm_in_flight: false,
                events_tx,
            },
            events_rx,
        )
    }

    pub fn engine(&self) -> &StepEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut StepEngine {
        &mut self.engine
    }

    /// True from commit submission until a response (of any kind) arrived.
    /// The confirm control is disabled while this holds.
    pub fn confirm_in_flight(&self) -> bool {
        self.confirm_in_flight
    }

    pub fn context(&self) -> Option<&WorkContext> {
        self.context.as_ref()
    }

    /// Open an order from the backlog and request its first pick item.
    pub async fn open_order(&mut self, order_id: &str) {
        self.context = Some(WorkContext::PickOrder {
            order_id: order_id.to_string(),
        });
        self.fetch_next_work().await;
    }

    /// Enter the relocation queue and request its next task.
    pub async fn open_relocations(&mut self) {
        self.context = Some(WorkContext::RelocationQueue);
        self.fetch_next_work().await;
    }

    /// Forward a captured code to the engine.
    pub fn handle_code(&mut self, captured: &CapturedCode) -> Result<ScanOutcome, EngineError> {
        self.engine.handle_code(captured, Instant::now())
    }

    /// Commit the quantity for the terminal step. Exactly one commit per user
    /// intent: repeats while a round trip is pending are ignored, and invalid
    /// quantities are rejected locally before anything touches the network.
    pub async fn confirm(&mut self, raw_quantity: &str) -> Result<(), EngineError> {
        if self.confirm_in_flight {
            return Ok(());
        }

        let quantity = self.engine.confirm_request(raw_quantity)?;
        let Some(task) = self.engine.task() else {
            self.engine.confirm_failed();
            return Ok(());
        };
        let task_id = task.id.clone();
        let task_kind = task.kind;
        let item_ref = task.item_ref.clone();
        let intent_id = Uuid::new_v4().to_string();

        self.confirm_in_flight = true;
        info!(task_id = %task_id, quantity, intent_id = %intent_id, "committing action");

        let call = async {
            match task_kind {
                TaskKind::Pick => {
                    self.client
                        .confirm_pick(ConfirmPickRequest {
                            task_id: task_id.clone(),
                            item_ref,
                            quantity,
                            intent_id,
                        })
                        .await
                }
                TaskKind::Relocate => {
                    self.client
                        .complete_relocation(CompleteRelocationRequest {
                            task_id: task_id.clone(),
                            quantity,
                            intent_id,
                        })
                        .await
                }
            }
        };

        let outcome = tokio::time::timeout(CONFIRM_TIMEOUT, call).await;
        self.confirm_in_flight = false;

        match outcome {
            Ok(Ok(receipt)) if receipt.success => {
                self.engine.confirm_succeeded();
                self.emit(SessionEvent::ActionConfirmed {
                    task_id: task_id.clone(),
                    quantity,
                    message: receipt.message,
                });
                self.emit(SessionEvent::TaskCompleted {
                    task_id: task_id.clone(),
                });
                self.update_status_background(task_id, WorkStatus::Completed);
                self.engine.acknowledge_completion();
                self.fetch_next_work().await;
            }
            Ok(Ok(receipt)) => {
                // The server is authoritative; the entered quantity stays
                // with the UI for correction.
                self.engine.confirm_failed();
                self.emit(SessionEvent::CommitRejected {
                    message: receipt.message,
                });
            }
            Ok(Err(err)) if err.is_allocation_conflict() => {
                warn!(task_id = %task_id, error = %err, "task assignment lost");
                self.engine.reset();
                self.emit(SessionEvent::ConflictReassigned {
                    message: err.to_string(),
                });
                self.fetch_next_work().await;
            }
            Ok(Err(err)) => {
                warn!(task_id = %task_id, error = %err, "commit failed");
                self.engine.confirm_failed();
                self.emit(SessionEvent::CommitFailed {
                    message: err.to_string(),
                });
            }
            Err(_elapsed) => {
                warn!(task_id = %task_id, "commit timed out");
                self.engine.confirm_failed();
                self.emit(SessionEvent::CommitTimedOut);
            }
        }

        Ok(())
    }

    /// Drop the active task without completing it.
    pub fn abandon(&mut self) {
        if let Some(task) = self.engine.task() {
            self.update_status_background(task.id.clone(), WorkStatus::Aborted);
        }
        self.engine.reset();
        self.context = None;
    }

    async fn fetch_next_work(&mut self) {
        let Some(context) = self.context.clone() else {
            return;
        };

        let response = match &context {
            WorkContext::PickOrder { order_id } => self.client.next_pick_item(order_id).await,
            WorkContext::RelocationQueue => self.client.next_relocation().await,
        };

        match response {
            Ok(envelope) => match envelope.into_work() {
                NextWork::Task(payload) => {
                    let task_id = payload.task_id.clone();
                    match self.engine.start(payload) {
                        Ok(()) => {
                            info!(task_id = %task_id, "task loaded");
                            self.update_status_background(
                                task_id.clone(),
                                WorkStatus::InProgress,
                            );
                            self.emit(SessionEvent::TaskLoaded { task_id });
                        }
                        Err(err) => {
                            warn!(task_id = %task_id, error = %err, "task payload rejected");
                            self.emit(SessionEvent::NextWorkFailed {
                                message: err.to_string(),
                            });
                        }
                    }
                }
                NextWork::Complete { message } => {
                    info!("no tasks remaining for the current context");
                    self.context = None;
                    self.emit(SessionEvent::NoTasksRemaining { message });
                }
            },
            Err(err) => {
                warn!(error = %err, "next work fetch failed");
                self.emit(SessionEvent::NextWorkFailed {
                    message: err.to_string(),
                });
            }
        }
    }

    /// Report a status change without blocking the operator. Failures are
    /// logged and never surfaced.
    fn update_status_background(&self, task_id: String, status: WorkStatus) {
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(err) = client.update_task_status(&task_id, status).await {
                warn!(task_id = %task_id, error = %err, "status update failed");
            }
        });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}
