use crossterm::event::KeyEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    Tick,
    Resize { width: u16, height: u16 },
}
