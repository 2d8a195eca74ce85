use gilrs::{Axis, Button, EventType, Gilrs};
use tracing::{info, warn};

use crate::input::PadState;

/// Button index `i` in bindings means `BUTTON_ORDER[i]`.
pub const BUTTON_ORDER: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

/// Axis index `i` in bindings means `AXIS_ORDER[i]`. Stick Y axes are flipped so
/// negative is up.
pub const AXIS_ORDER: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::LeftZ,
    Axis::RightZ,
];

/// Non-blocking gilrs reader. Runs without pads if the backend cannot start.
pub struct GamepadPoller {
    gilrs: Option<Gilrs>,
}

impl GamepadPoller {
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => {
                for (id, gamepad) in gilrs.gamepads() {
                    info!(
                        pad = usize::from(id),
                        name = gamepad.name(),
                        "gamepad_detected"
                    );
                }
                Some(gilrs)
            }
            Err(error) => {
                warn!(error = %error, "gamepad_backend_unavailable");
                None
            }
        };
        Self { gilrs }
    }

    pub fn disabled() -> Self {
        Self { gilrs: None }
    }

    /// Drains pending events, then snapshots every known pad in id order.
    pub fn poll(&mut self) -> Vec<PadState> {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return Vec::new();
        };

        while let Some(event) = gilrs.next_event() {
            match event.event {
                EventType::Connected => {
                    let name = gilrs.gamepad(event.id).name().to_string();
                    info!(pad = usize::from(event.id), name = %name, "gamepad_connected");
                }
                EventType::Disconnected => {
                    info!(pad = usize::from(event.id), "gamepad_disconnected");
                }
                _ => {}
            }
        }

        let mut pads: Vec<(usize, PadState)> = gilrs
            .gamepads()
            .map(|(id, gamepad)| {
                let buttons = BUTTON_ORDER
                    .iter()
                    .map(|button| gamepad.is_pressed(*button))
                    .collect();
                let axes = AXIS_ORDER
                    .iter()
                    .map(|axis| {
                        let value = gamepad.value(*axis);
                        if matches!(axis, Axis::LeftStickY | Axis::RightStickY) {
                            -value
                        } else {
                            value
                        }
                    })
                    .collect();
                (
                    usize::from(id),
                    PadState {
                        name: gamepad.name().to_string(),
                        connected: gamepad.is_connected(),
                        buttons,
                        axes,
                    },
                )
            })
            .collect();
        pads.sort_by_key(|(id, _)| *id);
        pads.into_iter().map(|(_, pad)| pad).collect()
    }
}

impl Default for GamepadPoller {
    fn default() -> Self {
        Self::new()
    }
}
