//! Pointer-driven drag lifecycle for task cards.
//!
//! The controller recognizes gestures and nothing else: it never touches the
//! task cache or the network. Everything it decides is published as a
//! [`DragEvent`] on an unbounded channel owned by the board.

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::geometry::{DragAnchor, Point, Region};
use crate::types::{TaskId, TaskStatus};

/// Pointer travel, in terminal cells, that separates a drag from a click.
pub const DEFAULT_ACTIVATION_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveIntent {
    pub task_id: TaskId,
    pub target: TaskStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    /// Press and release without crossing the activation distance.
    Clicked(TaskId),
    Started {
        task_id: TaskId,
    },
    Moved {
        task_id: TaskId,
        delta: Point,
        over: Option<TaskStatus>,
    },
    Dropped(MoveIntent),
    Cancelled {
        task_id: TaskId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
    Dropping,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub task_id: TaskId,
    pub anchor: DragAnchor,
    pub current: Point,
    pub over: Option<TaskStatus>,
}

impl DragSession {
    pub fn delta(&self) -> Point {
        self.anchor.delta(self.current)
    }

    /// Where the dragged card's origin is drawn right now.
    pub fn card_position(&self) -> Point {
        self.anchor.element_position(self.current)
    }
}

/// Droppable column regions, kept in column declaration order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DropTargets {
    targets: Vec<(TaskStatus, Region)>,
}

impl DropTargets {
    pub fn new(mut targets: Vec<(TaskStatus, Region)>) -> Self {
        targets.sort_by_key(|(status, _)| status.index());
        Self { targets }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn region(&self, status: TaskStatus) -> Option<Region> {
        self.targets
            .iter()
            .find(|(candidate, _)| *candidate == status)
            .map(|(_, region)| *region)
    }

    /// Closest-center rule among the regions that contain the pointer; ties
    /// keep the earlier column.
    pub fn resolve(&self, pointer: Point) -> Option<TaskStatus> {
        let mut best: Option<(TaskStatus, f32)> = None;
        for (status, region) in &self.targets {
            if !region.contains(pointer) {
                continue;
            }
            let distance = region.center().distance(pointer);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((*status, distance)),
            }
        }
        best.map(|(status, _)| status)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    /// Pointer is down on a card but has not travelled far enough yet.
    Pressed {
        task_id: TaskId,
        anchor: DragAnchor,
    },
    Dragging(DragSession),
    /// A move intent was handed off; waiting for the board to take it.
    Dropping(MoveIntent),
}

pub struct DragController {
    phase: Phase,
    can_edit: bool,
    activation_distance: f32,
    targets: DropTargets,
    events: UnboundedSender<DragEvent>,
}

impl DragController {
    pub fn new(events: UnboundedSender<DragEvent>, can_edit: bool) -> Self {
        Self {
            phase: Phase::Idle,
            can_edit,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            targets: DropTargets::default(),
            events,
        }
    }

    pub fn with_activation_distance(mut self, distance: f32) -> Self {
        self.activation_distance = distance.max(0.0);
        self
    }

    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    pub fn set_drop_targets(&mut self, targets: DropTargets) {
        self.targets = targets;
    }

    pub fn drop_targets(&self) -> &DropTargets {
        &self.targets
    }

    pub fn phase(&self) -> DragPhase {
        match self.phase {
            Phase::Idle | Phase::Pressed { .. } => DragPhase::Idle,
            Phase::Dragging(_) => DragPhase::Dragging,
            Phase::Dropping(_) => DragPhase::Dropping,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.phase {
            Phase::Dragging(session) => Some(session),
            _ => None,
        }
    }

    pub fn active_task(&self) -> Option<TaskId> {
        match &self.phase {
            Phase::Pressed { task_id, .. } => Some(*task_id),
            Phase::Dragging(session) => Some(session.task_id),
            Phase::Dropping(intent) => Some(intent.task_id),
            Phase::Idle => None,
        }
    }

    /// Pointer delta since the drag started; `None` unless dragging.
    pub fn delta(&self) -> Option<Point> {
        self.session().map(DragSession::delta)
    }

    pub fn pointer_down(&mut self, task_id: TaskId, pointer: Point, card_origin: Point) {
        if !matches!(self.phase, Phase::Idle) {
            debug!(task_id = %task_id, "pointer down ignored while a gesture is active");
            return;
        }
        self.phase = Phase::Pressed {
            task_id,
            anchor: DragAnchor::new(pointer, card_origin),
        };
    }

    pub fn pointer_move(&mut self, pointer: Point) {
        match &mut self.phase {
            Phase::Pressed { task_id, anchor } => {
                if !self.can_edit || !anchor.exceeds(pointer, self.activation_distance) {
                    return;
                }
                let task_id = *task_id;
                let over = self.targets.resolve(pointer);
                self.phase = Phase::Dragging(DragSession {
                    task_id,
                    anchor: *anchor,
                    current: pointer,
                    over,
                });
                debug!(task_id = %task_id, ?over, "drag started");
                self.emit(DragEvent::Started { task_id });
                self.emit_moved();
            }
            Phase::Dragging(session) => {
                session.current = pointer;
                session.over = self.targets.resolve(pointer);
                self.emit_moved();
            }
            Phase::Idle | Phase::Dropping(_) => {}
        }
    }

    pub fn pointer_up(&mut self, pointer: Point) {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Pressed { task_id, .. } => {
                self.emit(DragEvent::Clicked(task_id));
            }
            Phase::Dragging(session) => match self.targets.resolve(pointer) {
                Some(target) => {
                    let intent = MoveIntent {
                        task_id: session.task_id,
                        target,
                    };
                    debug!(task_id = %intent.task_id, target = %target, "drag dropped on column");
                    self.phase = Phase::Dropping(intent);
                    self.emit(DragEvent::Dropped(intent));
                }
                None => {
                    debug!(task_id = %session.task_id, "drag released outside any column");
                }
            },
            other => self.phase = other,
        }
    }

    /// Called by the board once the dropped intent has been handed off.
    pub fn complete_drop(&mut self) {
        if matches!(self.phase, Phase::Dropping(_)) {
            self.phase = Phase::Idle;
        }
    }

    /// Forces the controller back to idle without emitting a move.
    pub fn cancel(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Dragging(session) => {
                debug!(task_id = %session.task_id, "drag cancelled");
                self.emit(DragEvent::Cancelled {
                    task_id: session.task_id,
                });
            }
            Phase::Dropping(intent) => {
                self.emit(DragEvent::Cancelled {
                    task_id: intent.task_id,
                });
            }
            Phase::Pressed { .. } | Phase::Idle => {}
        }
    }

    fn emit_moved(&self) {
        if let Phase::Dragging(session) = &self.phase {
            self.emit(DragEvent::Moved {
                task_id: session.task_id,
                delta: session.delta(),
                over: session.over,
            });
        }
    }

    fn emit(&self, event: DragEvent) {
        // A closed receiver only happens during teardown.
        let _ = self.events.send(event);
    }
}

impl Drop for DragController {
    fn drop(&mut self) {
        self.cancel();
    }
}
