mod action;
mod binding;
mod controller;
mod device;
mod timing;

pub use action::{ActionStates, LogicalAction, UnknownActionError, ACTION_COUNT};
pub use binding::{
    apply_deadzone, AxisBinding, AxisPolarity, DeviceBinding, DeviceSelector, RawSignal,
    DEFAULT_AXIS_THRESHOLD, DEFAULT_DEADZONE,
};
pub use controller::{Disposition, InputController, InputListener, ListenerId};
pub use device::{PadState, RawInputFrame};
pub use timing::{
    default_repeat_steps, ActionEvent, ActionState, AxisSmoother, EventKind, FilterBank,
    TimingConfigError, TimingWindowConfig, DEFAULT_BUFFER_WINDOW, DEFAULT_REPEAT_WINDOW,
    DEFAULT_SMASH_WINDOW, DEFAULT_SMOOTHING_WINDOW,
};
