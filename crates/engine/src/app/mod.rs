mod gamepads;
mod loop_runner;
mod rendering;
mod screen;

pub use gamepads::{GamepadPoller, AXIS_ORDER, BUTTON_ORDER};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{Canvas, Renderer};
pub use screen::{Screen, ScreenCommand};
