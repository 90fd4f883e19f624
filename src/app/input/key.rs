use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::BoardApi;
use crate::app::{App, Message};
use crate::drag::DragPhase;

impl<A: BoardApi> App<A> {
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let message = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Message::Quit,
            KeyCode::Char('q') => Message::Quit,
            KeyCode::Char('r') => Message::Refresh,
            KeyCode::Char('a') => Message::ToggleActivityPanel,
            KeyCode::Char('m') => Message::ToggleActivityMinimized,
            KeyCode::Esc if self.board.drag().phase() != DragPhase::Idle => Message::CancelDrag,
            KeyCode::Esc => Message::ClearSelection,
            _ => return Ok(()),
        };
        self.update(message)
    }
}
