//! Floating activity panel: visibility, minimized state and free placement.
//!
//! Repositioning uses the same pointer-delta tracking as a task drag but keeps
//! its own anchor, so the two gestures never share state.

use crate::geometry::{DragAnchor, Point, Region};

/// Gap kept between the anchored panel and the right edge of the screen.
pub const ANCHOR_MARGIN_RIGHT: f32 = 2.0;
/// Rows left free above the anchored panel for the board header.
pub const ANCHOR_MARGIN_TOP: f32 = 3.0;
/// Height of the panel when only its header is shown.
pub const MINIMIZED_HEIGHT: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMode {
    Expanded,
    Minimized,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Pinned near the top-right corner until the first drag.
    Anchored,
    Offset(Point),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    pub visible: bool,
    pub minimized: bool,
    pub placement: Placement,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            visible: true,
            minimized: false,
            placement: Placement::Anchored,
        }
    }
}

impl PanelState {
    pub fn mode(&self) -> PanelMode {
        match (self.visible, self.minimized) {
            (false, _) => PanelMode::Hidden,
            (true, true) => PanelMode::Minimized,
            (true, false) => PanelMode::Expanded,
        }
    }
}

#[derive(Debug, Default)]
pub struct PanelController {
    state: PanelState,
    drag: Option<DragAnchor>,
}

impl PanelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn mode(&self) -> PanelMode {
        self.state.mode()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn toggle_minimized(&mut self) {
        if self.state.visible {
            self.state.minimized = !self.state.minimized;
        }
    }

    pub fn hide(&mut self) {
        self.state.visible = false;
        self.drag = None;
    }

    /// Shows the panel again in whichever size it had when hidden.
    pub fn show(&mut self) {
        self.state.visible = true;
    }

    pub fn toggle_visible(&mut self) {
        if self.state.visible {
            self.hide();
        } else {
            self.show();
        }
    }

    /// Starts a reposition from the header. `origin` is where the panel is
    /// currently drawn. Returns whether the gesture was captured.
    pub fn header_pointer_down(&mut self, pointer: Point, origin: Point) -> bool {
        if !self.state.visible {
            return false;
        }
        self.drag = Some(DragAnchor::new(pointer, origin));
        true
    }

    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        let Some(anchor) = self.drag else {
            return false;
        };
        self.state.placement = Placement::Offset(anchor.element_position(pointer));
        true
    }

    /// Ends a reposition in place, keeping the last applied offset.
    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    pub fn pointer_up(&mut self, pointer: Point) -> bool {
        let moved = self.pointer_move(pointer);
        self.drag = None;
        moved
    }

    /// Top-left corner for a panel of `width` x `height` on `screen`, kept
    /// fully on screen whenever it fits.
    pub fn origin(&self, screen: Region, width: f32, height: f32) -> Point {
        let wanted = match self.state.placement {
            Placement::Anchored => Point::new(
                screen.x + screen.width - width - ANCHOR_MARGIN_RIGHT,
                screen.y + ANCHOR_MARGIN_TOP,
            ),
            Placement::Offset(point) => point,
        };
        Point::new(
            clamp_axis(wanted.x, screen.x, screen.width, width),
            clamp_axis(wanted.y, screen.y, screen.height, height),
        )
    }

    /// The panel's frame for its current mode; `None` while hidden.
    pub fn frame(&self, screen: Region, width: f32, expanded_height: f32) -> Option<Region> {
        let height = match self.mode() {
            PanelMode::Hidden => return None,
            PanelMode::Minimized => MINIMIZED_HEIGHT.min(expanded_height),
            PanelMode::Expanded => expanded_height,
        };
        let origin = self.origin(screen, width, height);
        Some(Region::new(origin.x, origin.y, width, height))
    }
}

fn clamp_axis(value: f32, start: f32, extent: f32, size: f32) -> f32 {
    let max = (start + extent - size).max(start);
    value.clamp(start, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Region = Region::new(0.0, 0.0, 120.0, 40.0);

    #[test]
    fn starts_expanded_and_anchored_top_right() {
        let panel = PanelController::new();
        assert_eq!(panel.mode(), PanelMode::Expanded);
        assert_eq!(panel.state().placement, Placement::Anchored);
        assert_eq!(panel.origin(SCREEN, 40.0, 20.0), Point::new(78.0, 3.0));
    }

    #[test]
    fn minimize_hide_and_show_round_trip() {
        let mut panel = PanelController::new();
        panel.toggle_minimized();
        assert_eq!(panel.mode(), PanelMode::Minimized);

        panel.hide();
        assert_eq!(panel.mode(), PanelMode::Hidden);
        panel.toggle_minimized();
        assert_eq!(panel.mode(), PanelMode::Hidden);

        panel.show();
        assert_eq!(panel.mode(), PanelMode::Minimized);
        panel.toggle_minimized();
        assert_eq!(panel.mode(), PanelMode::Expanded);
    }

    #[test]
    fn header_drag_follows_pointer_delta() {
        let mut panel = PanelController::new();
        let origin = panel.origin(SCREEN, 40.0, 20.0);

        assert!(panel.header_pointer_down(Point::new(90.0, 4.0), origin));
        assert!(panel.pointer_move(Point::new(60.0, 10.0)));
        assert!(panel.pointer_up(Point::new(50.0, 12.0)));

        assert!(!panel.is_dragging());
        assert_eq!(
            panel.state().placement,
            Placement::Offset(Point::new(38.0, 11.0))
        );
        assert!(!panel.pointer_move(Point::new(0.0, 0.0)));
    }

    #[test]
    fn hidden_panel_ignores_header_press_and_hide_ends_drag() {
        let mut panel = PanelController::new();
        assert!(panel.header_pointer_down(Point::new(1.0, 1.0), Point::ORIGIN));
        panel.hide();
        assert!(!panel.is_dragging());
        assert!(!panel.header_pointer_down(Point::new(1.0, 1.0), Point::ORIGIN));
    }

    #[test]
    fn placement_is_clamped_to_screen() {
        let mut panel = PanelController::new();
        panel.header_pointer_down(Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        panel.pointer_up(Point::new(500.0, -30.0));

        assert_eq!(panel.origin(SCREEN, 40.0, 20.0), Point::new(80.0, 0.0));
        let frame = panel.frame(SCREEN, 40.0, 20.0).expect("visible panel");
        assert_eq!(frame.height, 20.0);

        panel.toggle_minimized();
        let frame = panel.frame(SCREEN, 40.0, 20.0).expect("visible panel");
        assert_eq!(frame.height, MINIMIZED_HEIGHT);
        assert_eq!(frame.y, 0.0);
    }
}
