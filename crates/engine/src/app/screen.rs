use crate::input::RawInputFrame;

use super::rendering::Canvas;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenCommand {
    Continue,
    Exit,
}

/// A full-window state driven by the fixed-tick loop. `update` runs once per
/// tick; `render` only reads.
pub trait Screen {
    fn update(&mut self, input: &RawInputFrame) -> ScreenCommand;
    fn render(&self, canvas: &mut Canvas<'_>);
    fn debug_title(&self) -> Option<String> {
        None
    }
    fn shutdown(&mut self) {}
}
