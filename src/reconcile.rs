//! Optimistic status changes and their reconciliation.
//!
//! A proposal is written to the [`TaskStore`] immediately and the remote
//! update runs on a spawned task. Its outcome comes back over a channel and
//! is applied by whoever owns the store, so the store keeps a single writer.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{BoardApi, TaskStatusEcho};
use crate::board::store::{StoreWrite, TaskStore};
use crate::drag::MoveIntent;
use crate::error::{ApiError, BoardError};
use crate::types::{TaskId, TaskStatus};

#[derive(Debug)]
pub struct PendingMutation {
    pub mutation_id: Uuid,
    pub task_id: TaskId,
    pub previous: Option<TaskStatus>,
    pub proposed: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proposal {
    Issued { mutation_id: Uuid },
    /// The task already has the requested status.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Confirmed {
        task_id: TaskId,
        status: TaskStatus,
        mutation_id: Uuid,
    },
    RolledBack {
        task_id: TaskId,
        restored: Option<TaskStatus>,
        error: BoardError,
    },
}

impl Resolution {
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Confirmed { task_id, .. } | Self::RolledBack { task_id, .. } => *task_id,
        }
    }
}

#[derive(Debug)]
struct Outcome {
    task_id: TaskId,
    mutation_id: Uuid,
    result: Result<TaskStatusEcho, ApiError>,
}

/// Owned by the update task. If the task panics or is aborted before it
/// reports, dropping the guard reports a network failure instead, so the
/// pending entry always resolves.
struct OutcomeGuard {
    tx: UnboundedSender<Outcome>,
    task_id: TaskId,
    mutation_id: Uuid,
    reported: bool,
}

impl OutcomeGuard {
    fn report(mut self, result: Result<TaskStatusEcho, ApiError>) {
        self.reported = true;
        let _ = self.tx.send(Outcome {
            task_id: self.task_id,
            mutation_id: self.mutation_id,
            result,
        });
    }
}

impl Drop for OutcomeGuard {
    fn drop(&mut self) {
        if self.reported {
            return;
        }
        warn!(
            task_id = %self.task_id,
            mutation_id = %self.mutation_id,
            "status update ended without a response"
        );
        let _ = self.tx.send(Outcome {
            task_id: self.task_id,
            mutation_id: self.mutation_id,
            result: Err(ApiError::Network(
                "status update ended without a response".to_string(),
            )),
        });
    }
}

pub struct Reconciler<A> {
    api: Arc<A>,
    pending: HashMap<TaskId, PendingMutation>,
    outcome_tx: UnboundedSender<Outcome>,
    outcome_rx: UnboundedReceiver<Outcome>,
}

impl<A: BoardApi> Reconciler<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            api,
            pending: HashMap::new(),
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn pending(&self, task_id: TaskId) -> Option<&PendingMutation> {
        self.pending.get(&task_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Proposed statuses of every unresolved mutation.
    pub fn overlays(&self) -> impl Iterator<Item = (TaskId, TaskStatus)> + '_ {
        self.pending
            .values()
            .map(|pending| (pending.task_id, pending.proposed))
    }

    /// Must be called from within a tokio runtime.
    pub fn propose_move(
        &mut self,
        store: &mut TaskStore,
        intent: MoveIntent,
    ) -> Result<Proposal, BoardError> {
        let MoveIntent { task_id, target } = intent;

        if let Some(open) = self.pending.get(&task_id) {
            debug!(
                task_id = %task_id,
                mutation_id = %open.mutation_id,
                "move rejected: mutation already in flight"
            );
            return Err(BoardError::MutationInFlight(task_id));
        }

        let previous = store
            .status_of(task_id)
            .ok_or(BoardError::UnknownTask(task_id))?;
        if previous == Some(target) {
            debug!(task_id = %task_id, status = %target, "move is a no-op");
            return Ok(Proposal::Unchanged);
        }

        store.apply(StoreWrite::SetStatus {
            task_id,
            status: Some(target),
        });

        let mutation_id = Uuid::new_v4();
        let api = Arc::clone(&self.api);
        let guard = OutcomeGuard {
            tx: self.outcome_tx.clone(),
            task_id,
            mutation_id,
            reported: false,
        };
        tokio::spawn(async move {
            let result = api.update_task_status(task_id, target).await;
            guard.report(result);
        });

        info!(
            task_id = %task_id,
            mutation_id = %mutation_id,
            from = ?previous,
            to = %target,
            "optimistic move applied"
        );
        self.pending.insert(
            task_id,
            PendingMutation {
                mutation_id,
                task_id,
                previous,
                proposed: target,
            },
        );

        Ok(Proposal::Issued { mutation_id })
    }

    /// Applies every outcome that has already arrived.
    pub fn drain(&mut self, store: &mut TaskStore) -> Vec<Resolution> {
        let mut resolutions = Vec::new();
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if let Some(resolution) = self.resolve(store, outcome) {
                resolutions.push(resolution);
            }
        }
        resolutions
    }

    /// Waits for the next outcome; `None` when nothing is pending.
    pub async fn next_resolution(&mut self, store: &mut TaskStore) -> Option<Resolution> {
        while !self.pending.is_empty() {
            let outcome = self.outcome_rx.recv().await?;
            if let Some(resolution) = self.resolve(store, outcome) {
                return Some(resolution);
            }
        }
        None
    }

    fn resolve(&mut self, store: &mut TaskStore, outcome: Outcome) -> Option<Resolution> {
        let Outcome {
            task_id,
            mutation_id,
            result,
        } = outcome;

        match self.pending.get(&task_id) {
            Some(open) if open.mutation_id == mutation_id => {}
            _ => {
                debug!(task_id = %task_id, mutation_id = %mutation_id, "stale mutation outcome dropped");
                return None;
            }
        }
        let pending = self.pending.remove(&task_id)?;

        let cause = match result {
            Ok(echo) if echo.status == Some(pending.proposed) => {
                info!(task_id = %task_id, mutation_id = %mutation_id, "move confirmed");
                return Some(Resolution::Confirmed {
                    task_id,
                    status: pending.proposed,
                    mutation_id,
                });
            }
            Ok(echo) => ApiError::Rejected(format!(
                "server reported status {}",
                echo.status.map_or("unrecognized", TaskStatus::as_str)
            )),
            Err(err) => err,
        };

        store.apply(StoreWrite::SetStatus {
            task_id,
            status: pending.previous,
        });
        warn!(
            task_id = %task_id,
            mutation_id = %mutation_id,
            error = %cause,
            "move rolled back"
        );
        Some(Resolution::RolledBack {
            task_id,
            restored: pending.previous,
            error: BoardError::RemoteRejected { task_id, cause },
        })
    }
}
