//! Board orchestration for a single project.
//!
//! [`Board`] owns the task cache and wires the drag controller to the
//! reconciler through the drag event channel. Everything runs on the caller's
//! loop: fetches and mutations complete on spawned tasks and are folded back
//! in by [`Board::process`].

pub mod partition;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::api::BoardApi;
use crate::drag::{DragController, DragEvent, MoveIntent};
use crate::error::{ApiError, BoardError};
use crate::reconcile::{Proposal, Reconciler, Resolution};
use crate::types::{ProjectBoard, ProjectId, Task, TaskId, TaskStatus};

use self::partition::{BoardSummary, Columns, partition};
use self::store::{StoreWrite, TaskStore};

/// Outward notifications for the surrounding surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardNotice {
    TaskSelected(TaskId),
    MoveConfirmed { task_id: TaskId, status: TaskStatus },
    MoveFailed { task_id: TaskId, error: BoardError },
    FetchFailed(BoardError),
}

#[derive(Debug)]
struct FetchResult {
    generation: u64,
    result: Result<ProjectBoard, ApiError>,
}

pub struct Board<A: BoardApi> {
    api: Arc<A>,
    project_id: ProjectId,
    store: TaskStore,
    reconciler: Reconciler<A>,
    drag: DragController,
    drag_rx: UnboundedReceiver<DragEvent>,
    fetch_tx: UnboundedSender<FetchResult>,
    fetch_rx: UnboundedReceiver<FetchResult>,
    issued_generation: u64,
    applied_generation: u64,
    /// Confirmed statuses held until a fetch issued at or after the paired
    /// generation lands. Older responses may predate the commit.
    confirmed: HashMap<TaskId, (TaskStatus, u64)>,
    project_name: Option<String>,
    project_description: Option<String>,
    last_error: Option<BoardError>,
}

impl<A: BoardApi> Board<A> {
    pub fn new(api: Arc<A>, project_id: ProjectId, can_edit: bool) -> Self {
        let (drag_tx, drag_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        Self {
            reconciler: Reconciler::new(Arc::clone(&api)),
            api,
            project_id,
            store: TaskStore::new(),
            drag: DragController::new(drag_tx, can_edit),
            drag_rx,
            fetch_tx,
            fetch_rx,
            issued_generation: 0,
            applied_generation: 0,
            confirmed: HashMap::new(),
            project_name: None,
            project_description: None,
            last_error: None,
        }
    }

    pub fn with_activation_distance(mut self, distance: f32) -> Self {
        self.drag = self.drag.with_activation_distance(distance);
        self
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn project_description(&self) -> Option<&str> {
        self.project_description.as_deref()
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.store.get(task_id)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn columns(&self) -> Columns<'_> {
        partition(self.store.tasks())
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary::from_tasks(self.store.tasks())
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn drag_mut(&mut self) -> &mut DragController {
        &mut self.drag
    }

    pub fn is_pending(&self, task_id: TaskId) -> bool {
        self.reconciler.pending(task_id).is_some()
    }

    pub fn last_error(&self) -> Option<&BoardError> {
        self.last_error.as_ref()
    }

    /// True once any fetch has been applied.
    pub fn is_loaded(&self) -> bool {
        self.applied_generation > 0
    }

    /// Starts a background fetch. Also the entry point for sibling flows that
    /// created or deleted tasks.
    pub fn refresh(&mut self) -> u64 {
        self.issued_generation += 1;
        let generation = self.issued_generation;
        let api = Arc::clone(&self.api);
        let project_id = self.project_id;
        let tx = self.fetch_tx.clone();
        debug!(generation, project_id = %project_id, "board fetch started");
        tokio::spawn(async move {
            let result = api.fetch_project_tasks(project_id).await;
            let _ = tx.send(FetchResult { generation, result });
        });
        generation
    }

    /// Fetches and applies the task list in place.
    pub async fn load(&mut self) -> Result<(), BoardError> {
        self.issued_generation += 1;
        let generation = self.issued_generation;
        let result = self.api.fetch_project_tasks(self.project_id).await;
        match self.apply_fetch(generation, result) {
            Some(BoardNotice::FetchFailed(err)) => Err(err),
            _ => Ok(()),
        }
    }

    /// Routes a move through the reconciler. `MutationInFlight` is logged and
    /// returned but never surfaced as a notice.
    pub fn propose_move(&mut self, intent: MoveIntent) -> Result<Proposal, BoardError> {
        let result = self.reconciler.propose_move(&mut self.store, intent);
        match &result {
            Err(BoardError::MutationInFlight(task_id)) => {
                debug!(task_id = %task_id, "drop ignored while previous move is pending");
            }
            Err(err) => warn!(task_id = %intent.task_id, error = %err, "move not proposed"),
            Ok(_) => {}
        }
        result
    }

    /// Waits for the next pending move to settle, without refetching.
    pub async fn next_resolution(&mut self) -> Option<Resolution> {
        self.reconciler.next_resolution(&mut self.store).await
    }

    /// Folds in completed fetches, drag events and mutation outcomes.
    pub fn process(&mut self) -> Vec<BoardNotice> {
        let mut notices = Vec::new();

        while let Ok(fetch) = self.fetch_rx.try_recv() {
            if let Some(notice) = self.apply_fetch(fetch.generation, fetch.result) {
                notices.push(notice);
            }
        }

        while let Ok(event) = self.drag_rx.try_recv() {
            match event {
                DragEvent::Dropped(intent) => {
                    let _ = self.propose_move(intent);
                    self.drag.complete_drop();
                }
                DragEvent::Clicked(task_id) => notices.push(BoardNotice::TaskSelected(task_id)),
                DragEvent::Started { .. } | DragEvent::Moved { .. } | DragEvent::Cancelled { .. } => {}
            }
        }

        let resolutions = self.reconciler.drain(&mut self.store);
        for resolution in resolutions {
            match resolution {
                Resolution::Confirmed {
                    task_id, status, ..
                } => {
                    notices.push(BoardNotice::MoveConfirmed { task_id, status });
                    let generation = self.refresh();
                    self.confirmed.insert(task_id, (status, generation));
                }
                Resolution::RolledBack { task_id, error, .. } => {
                    notices.push(BoardNotice::MoveFailed { task_id, error });
                }
            }
        }

        notices
    }

    fn apply_fetch(
        &mut self,
        generation: u64,
        result: Result<ProjectBoard, ApiError>,
    ) -> Option<BoardNotice> {
        if generation <= self.applied_generation {
            debug!(
                generation,
                applied = self.applied_generation,
                "stale board fetch discarded"
            );
            return None;
        }

        match result {
            Ok(board) => {
                self.applied_generation = generation;
                self.project_name = Some(board.name);
                self.project_description = board.description;
                self.store.apply(StoreWrite::ReplaceAll(board.tasks));
                self.confirmed.retain(|_, (_, floor)| *floor > generation);
                for (&task_id, &(status, floor)) in &self.confirmed {
                    debug!(task_id = %task_id, generation, floor, "fetch predates confirmed move");
                    self.store.apply(StoreWrite::SetStatus {
                        task_id,
                        status: Some(status),
                    });
                }
                for (task_id, status) in self.reconciler.overlays() {
                    self.store.apply(StoreWrite::SetStatus {
                        task_id,
                        status: Some(status),
                    });
                }
                if let Some(task_id) = self.drag.active_task()
                    && !self.store.contains(task_id)
                {
                    info!(task_id = %task_id, "dragged task disappeared, cancelling drag");
                    self.drag.cancel();
                }
                self.last_error = None;
                debug!(generation, tasks = self.store.tasks().len(), "board fetch applied");
                None
            }
            Err(err) => {
                let err = BoardError::from_fetch(err);
                warn!(generation, error = %err, "board fetch failed");
                self.last_error = Some(err.clone());
                Some(BoardNotice::FetchFailed(err))
            }
        }
    }
}
