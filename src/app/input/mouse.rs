use anyhow::Result;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use tracing::debug;

use crate::api::BoardApi;
use crate::app::{App, HitTarget, PointerCapture};
use crate::geometry::Point;
use crate::types::TaskStatus;

impl<A: BoardApi> App<A> {
    /// Routes a pointer gesture to whichever surface was topmost at press
    /// time. The owner keeps every move and the release, so a panel drag
    /// that passes over a card never starts a task drag.
    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        let pointer = Point::from_cell(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.release_capture();
                let target = self.interaction_map.resolve(mouse.column, mouse.row);
                self.capture = Some(self.capture_for(target, pointer));
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.hovered = self.interaction_map.resolve(mouse.column, mouse.row);
                match self.capture {
                    Some(PointerCapture::Task(_)) => self.board.drag_mut().pointer_move(pointer),
                    Some(PointerCapture::Panel) => {
                        self.panel.pointer_move(pointer);
                    }
                    Some(PointerCapture::PanelButton(_) | PointerCapture::Swallowed) | None => {}
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let released_over = self.interaction_map.resolve(mouse.column, mouse.row);
                match self.capture.take() {
                    Some(PointerCapture::Task(_)) => self.board.drag_mut().pointer_up(pointer),
                    Some(PointerCapture::Panel) => {
                        self.panel.pointer_up(pointer);
                    }
                    Some(PointerCapture::PanelButton(button)) if released_over == Some(button) => {
                        self.press_panel_button(button);
                    }
                    Some(PointerCapture::PanelButton(_) | PointerCapture::Swallowed) | None => {}
                }
            }
            MouseEventKind::Moved => {
                self.hovered = self.interaction_map.resolve(mouse.column, mouse.row);
            }
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                let target = self.interaction_map.resolve(mouse.column, mouse.row);
                if let Some(status) = self.column_under(target) {
                    let offset = &mut self.column_scroll[status.index()];
                    *offset = if mouse.kind == MouseEventKind::ScrollDown {
                        offset.saturating_add(1)
                    } else {
                        offset.saturating_sub(1)
                    };
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn capture_for(&mut self, target: Option<HitTarget>, pointer: Point) -> PointerCapture {
        match target {
            Some(HitTarget::TaskCard { task_id, origin }) => {
                let origin = Point::from_cell(origin.0, origin.1);
                self.board.drag_mut().pointer_down(task_id, pointer, origin);
                PointerCapture::Task(task_id)
            }
            Some(HitTarget::PanelHeader) => {
                let origin = self.panel_origin.unwrap_or(pointer);
                if self.panel.header_pointer_down(pointer, origin) {
                    PointerCapture::Panel
                } else {
                    PointerCapture::Swallowed
                }
            }
            Some(
                button @ (HitTarget::PanelMinimize | HitTarget::PanelHide | HitTarget::PanelShow),
            ) => PointerCapture::PanelButton(button),
            Some(HitTarget::PanelBody) => PointerCapture::Swallowed,
            Some(HitTarget::Column(_)) | None => {
                self.selected_task = None;
                PointerCapture::Swallowed
            }
        }
    }

    /// Overlay targets shadow the board, so wheel events over the panel stay there.
    fn column_under(&self, target: Option<HitTarget>) -> Option<TaskStatus> {
        match target? {
            HitTarget::Column(status) => Some(status),
            HitTarget::TaskCard { task_id, .. } => self.board.task(task_id)?.status,
            _ => None,
        }
    }

    /// Drops a capture whose release never arrived.
    fn release_capture(&mut self) {
        match self.capture.take() {
            Some(PointerCapture::Task(task_id)) => {
                debug!(task_id = %task_id, "pointer released without an up event");
                self.board.drag_mut().cancel();
            }
            Some(PointerCapture::Panel) => self.panel.cancel_drag(),
            Some(PointerCapture::PanelButton(_) | PointerCapture::Swallowed) | None => {}
        }
    }

    fn press_panel_button(&mut self, button: HitTarget) {
        match button {
            HitTarget::PanelMinimize => self.panel.toggle_minimized(),
            HitTarget::PanelHide => self.panel.hide(),
            HitTarget::PanelShow => self.panel.show(),
            _ => {}
        }
    }
}
