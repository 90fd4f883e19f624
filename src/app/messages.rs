use crossterm::event::{KeyEvent, MouseEvent};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Message {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    Quit,
    Refresh,
    ToggleActivityPanel,
    ToggleActivityMinimized,
    CancelDrag,
    ClearSelection,
}
