pub mod input;
pub mod interaction;
pub mod messages;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::debug;

pub use self::interaction::{HitTarget, InteractionLayer, InteractionMap};
pub use self::messages::Message;

use crate::activity::{ActivityFeed, ActivityPoller};
use crate::api::{BoardApi, GraphqlClient};
use crate::board::{Board, BoardNotice};
use crate::geometry::Point;
use crate::notification::{Notifier, Toast, ToastQueue, toast_for_notice};
use crate::panel::PanelController;
use crate::settings::Settings;
use crate::theme::Theme;
use crate::types::{ProjectId, TaskId};

/// Which surface owns the pointer between press and release.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum PointerCapture {
    Task(TaskId),
    Panel,
    PanelButton(HitTarget),
    /// Pressed on something inert; the rest of the gesture goes nowhere.
    Swallowed,
}

pub struct App<A: BoardApi = GraphqlClient> {
    pub(crate) board: Board<A>,
    activity_poller: Option<ActivityPoller>,
    activity: ActivityFeed,
    pub(crate) panel: PanelController,
    /// Where the panel was drawn last frame; reposition gestures start from it.
    pub(crate) panel_origin: Option<Point>,
    pub(crate) interaction_map: InteractionMap,
    pub(crate) capture: Option<PointerCapture>,
    pub(crate) hovered: Option<HitTarget>,
    toasts: ToastQueue,
    notifier: Notifier,
    pub(crate) selected_task: Option<TaskId>,
    /// First visible card per column, clamped when drawn.
    pub(crate) column_scroll: [usize; 3],
    theme: Theme,
    viewport: (u16, u16),
    should_quit: bool,
}

impl<A: BoardApi> App<A> {
    /// Starts the initial fetch and the activity poll loop, so this must run
    /// inside a tokio runtime.
    pub fn new(api: Arc<A>, project_id: ProjectId, settings: &Settings) -> Self {
        let mut board = Board::new(Arc::clone(&api), project_id, settings.can_edit)
            .with_activation_distance(settings.drag_activation_distance);
        board.refresh();
        let activity_poller = ActivityPoller::spawn(api, project_id, settings.poller_config());

        Self {
            board,
            activity_poller: Some(activity_poller),
            activity: ActivityFeed::default(),
            panel: PanelController::new(),
            panel_origin: None,
            interaction_map: InteractionMap::default(),
            capture: None,
            hovered: None,
            toasts: ToastQueue::default(),
            notifier: Notifier::new(settings.backend()),
            selected_task: None,
            column_scroll: [0; 3],
            theme: Theme::from_preset(settings.theme_preset()),
            viewport: (0, 0),
            should_quit: false,
        }
    }

    pub fn update(&mut self, message: Message) -> Result<()> {
        match message {
            Message::Key(key) => self.handle_key(key)?,
            Message::Mouse(mouse) => self.handle_mouse(mouse)?,
            Message::Resize(width, height) => self.viewport = (width, height),
            Message::Tick => {}
            Message::Quit => self.should_quit = true,
            Message::Refresh => {
                let generation = self.board.refresh();
                debug!(generation, "manual board refresh");
            }
            Message::ToggleActivityPanel => {
                self.panel.toggle_visible();
                if self.capture == Some(PointerCapture::Panel) && !self.panel.is_dragging() {
                    self.capture = None;
                }
            }
            Message::ToggleActivityMinimized => self.panel.toggle_minimized(),
            Message::CancelDrag => self.board.drag_mut().cancel(),
            Message::ClearSelection => self.selected_task = None,
        }
        self.pump(Instant::now());
        Ok(())
    }

    /// Folds in background results: board notices, activity snapshots and
    /// toast expiry.
    pub fn pump(&mut self, now: Instant) {
        for notice in self.board.process() {
            if let BoardNotice::TaskSelected(task_id) = notice {
                self.selected_task = Some(task_id);
            }
            if let Some(toast) = toast_for_notice(&notice) {
                self.notifier.notify(&mut self.toasts, toast, now);
            }
        }

        if let Some(poller) = self.activity_poller.as_mut()
            && poller.take_changed()
        {
            self.activity = poller.feed();
        }

        self.toasts.prune(now);
    }

    pub fn board(&self) -> &Board<A> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board<A> {
        &mut self.board
    }

    pub fn activity(&self) -> &ActivityFeed {
        &self.activity
    }

    pub fn panel(&self) -> &PanelController {
        &self.panel
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toasts.current()
    }

    pub fn selected_task(&self) -> Option<TaskId> {
        self.selected_task
    }

    pub fn hovered(&self) -> Option<HitTarget> {
        self.hovered
    }

    pub fn viewport(&self) -> (u16, u16) {
        self.viewport
    }

    pub fn is_read_only(&self) -> bool {
        !self.board.drag().can_edit()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Stops background polling; the board keeps its last snapshot.
    pub fn shutdown(&mut self) {
        if let Some(poller) = self.activity_poller.take() {
            poller.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
    use tuirealm::ratatui::layout::Rect;

    use super::*;
    use crate::api::testing::FakeApi;
    use crate::drag::{DragPhase, DropTargets};
    use crate::geometry::Region;
    use crate::panel::Placement;
    use crate::types::{Task, TaskStatus};

    fn settings() -> Settings {
        Settings {
            drag_activation_distance: 1.0,
            ..Settings::default()
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Message {
        Message::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        })
    }

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    async fn settle(app: &mut App<FakeApi>) {
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            app.pump(Instant::now());
        }
    }

    /// Lays out what a render would register: one card in To Do, three
    /// columns side by side and the panel header overlapping the card.
    fn lay_out(app: &mut App<FakeApi>) {
        app.board_mut().drag_mut().set_drop_targets(DropTargets::new(vec![
            (TaskStatus::Todo, Region::new(0.0, 2.0, 30.0, 20.0)),
            (TaskStatus::InProgress, Region::new(30.0, 2.0, 30.0, 20.0)),
            (TaskStatus::Done, Region::new(60.0, 2.0, 30.0, 20.0)),
        ]));
        app.interaction_map.clear();
        app.interaction_map.register(
            InteractionLayer::Base,
            Rect::new(1, 3, 28, 4),
            HitTarget::TaskCard {
                task_id: TaskId(1),
                origin: (1, 3),
            },
        );
        app.interaction_map.register(
            InteractionLayer::Overlay,
            Rect::new(20, 3, 30, 1),
            HitTarget::PanelHeader,
        );
        app.interaction_map.register(
            InteractionLayer::Overlay,
            Rect::new(45, 3, 3, 1),
            HitTarget::PanelHide,
        );
        app.panel_origin = Some(Point::new(20.0, 3.0));
    }

    async fn loaded_app(api: Arc<FakeApi>) -> App<FakeApi> {
        let mut app = App::new(api, ProjectId(1), &settings());
        settle(&mut app).await;
        lay_out(&mut app);
        app
    }

    #[tokio::test]
    async fn click_on_card_selects_task() {
        let api = Arc::new(FakeApi::new(vec![Task::new(1, "Ship", TaskStatus::Todo)]));
        let mut app = loaded_app(Arc::clone(&api)).await;

        app.update(mouse(MouseEventKind::Down(MouseButton::Left), 5, 4))
            .expect("down");
        app.update(mouse(MouseEventKind::Up(MouseButton::Left), 5, 4))
            .expect("up");

        assert_eq!(app.selected_task(), Some(TaskId(1)));
        assert_eq!(api.update_count(), 0);

        app.update(key(KeyCode::Esc)).expect("esc");
        assert_eq!(app.selected_task(), None);
    }

    #[tokio::test]
    async fn dragging_card_across_columns_moves_it() {
        let api = Arc::new(FakeApi::new(vec![Task::new(1, "Ship", TaskStatus::Todo)]));
        let mut app = loaded_app(Arc::clone(&api)).await;

        app.update(mouse(MouseEventKind::Down(MouseButton::Left), 5, 4))
            .expect("down");
        app.update(mouse(MouseEventKind::Drag(MouseButton::Left), 10, 6))
            .expect("drag");
        assert_eq!(app.board().drag().phase(), DragPhase::Dragging);
        app.update(mouse(MouseEventKind::Drag(MouseButton::Left), 35, 8))
            .expect("drag");
        app.update(mouse(MouseEventKind::Up(MouseButton::Left), 35, 8))
            .expect("up");

        assert_eq!(app.board().drag().phase(), DragPhase::Idle);
        assert_eq!(
            app.board().task(TaskId(1)).and_then(|task| task.status),
            Some(TaskStatus::InProgress)
        );

        settle(&mut app).await;
        assert_eq!(api.update_count(), 1);
        assert_eq!(app.toast().map(|toast| toast.title.as_str()), Some("Task Moved"));
    }

    #[tokio::test]
    async fn panel_drag_over_card_never_reaches_the_board() {
        let api = Arc::new(FakeApi::new(vec![Task::new(1, "Ship", TaskStatus::Todo)]));
        let mut app = loaded_app(Arc::clone(&api)).await;

        app.update(mouse(MouseEventKind::Down(MouseButton::Left), 22, 3))
            .expect("down");
        assert!(app.panel().is_dragging());
        app.update(mouse(MouseEventKind::Drag(MouseButton::Left), 40, 10))
            .expect("drag");
        assert_eq!(app.board().drag().phase(), DragPhase::Idle);
        app.update(mouse(MouseEventKind::Up(MouseButton::Left), 40, 10))
            .expect("up");

        assert_eq!(
            app.panel().state().placement,
            Placement::Offset(Point::new(38.0, 10.0))
        );
        assert_eq!(app.board().drag().phase(), DragPhase::Idle);
        assert_eq!(app.selected_task(), None);
        settle(&mut app).await;
        assert_eq!(api.update_count(), 0);
    }

    #[tokio::test]
    async fn panel_button_fires_only_when_released_on_it() {
        let api = Arc::new(FakeApi::new(Vec::new()));
        let mut app = loaded_app(api).await;

        app.update(mouse(MouseEventKind::Down(MouseButton::Left), 46, 3))
            .expect("down");
        app.update(mouse(MouseEventKind::Up(MouseButton::Left), 10, 10))
            .expect("up");
        assert!(app.panel().state().visible);

        app.update(mouse(MouseEventKind::Down(MouseButton::Left), 46, 3))
            .expect("down");
        app.update(mouse(MouseEventKind::Up(MouseButton::Left), 46, 3))
            .expect("up");
        assert!(!app.panel().state().visible);
    }

    #[tokio::test]
    async fn read_only_board_selects_instead_of_dragging() {
        let api = Arc::new(FakeApi::new(vec![Task::new(1, "Ship", TaskStatus::Todo)]));
        let settings = Settings {
            can_edit: false,
            ..settings()
        };
        let mut app = App::new(Arc::clone(&api), ProjectId(1), &settings);
        settle(&mut app).await;
        lay_out(&mut app);
        assert!(app.is_read_only());

        app.update(mouse(MouseEventKind::Down(MouseButton::Left), 5, 4))
            .expect("down");
        app.update(mouse(MouseEventKind::Drag(MouseButton::Left), 65, 8))
            .expect("drag");
        app.update(mouse(MouseEventKind::Up(MouseButton::Left), 65, 8))
            .expect("up");

        assert_eq!(app.selected_task(), Some(TaskId(1)));
        settle(&mut app).await;
        assert_eq!(api.update_count(), 0);
    }

    #[tokio::test]
    async fn keys_drive_panel_and_quit() {
        let api = Arc::new(FakeApi::new(Vec::new()));
        let mut app = loaded_app(api).await;

        app.update(key(KeyCode::Char('m'))).expect("minimize");
        assert_eq!(app.panel().mode(), crate::panel::PanelMode::Minimized);
        app.update(key(KeyCode::Char('a'))).expect("hide");
        assert_eq!(app.panel().mode(), crate::panel::PanelMode::Hidden);
        app.update(key(KeyCode::Char('a'))).expect("show");
        assert_eq!(app.panel().mode(), crate::panel::PanelMode::Minimized);

        assert!(!app.should_quit());
        app.update(Message::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )))
        .expect("quit");
        assert!(app.should_quit());
    }
}
