use std::collections::HashMap;

use winit::keyboard::KeyCode;

use super::action::LogicalAction;

pub const DEFAULT_DEADZONE: f32 = 0.2;
pub const DEFAULT_AXIS_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisPolarity {
    Negative,
    Positive,
}

/// A device signal before it has been given a meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawSignal {
    Key(KeyCode),
    PadButton(u32),
    PadAxis { axis: u32, polarity: AxisPolarity },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    Keyboard,
    /// `name: None` matches any pad; `occurrence` picks among pads with the same name.
    Gamepad {
        name: Option<String>,
        occurrence: usize,
    },
    Unassigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisBinding {
    pub axis: u32,
    pub negative: Option<LogicalAction>,
    pub positive: Option<LogicalAction>,
}

/// Per-slot table from raw signals to logical actions. Several signals may
/// share one action.
#[derive(Debug, Clone)]
pub struct DeviceBinding {
    device: DeviceSelector,
    keys: HashMap<KeyCode, LogicalAction>,
    buttons: HashMap<u32, LogicalAction>,
    axes: Vec<AxisBinding>,
    deadzone: f32,
    axis_threshold: f32,
}

impl DeviceBinding {
    pub fn new(device: DeviceSelector) -> Self {
        Self {
            device,
            keys: HashMap::new(),
            buttons: HashMap::new(),
            axes: Vec::new(),
            deadzone: DEFAULT_DEADZONE,
            axis_threshold: DEFAULT_AXIS_THRESHOLD,
        }
    }

    pub fn unassigned() -> Self {
        Self::new(DeviceSelector::Unassigned)
    }

    pub fn with_key(mut self, key: KeyCode, action: LogicalAction) -> Self {
        self.keys.insert(key, action);
        self
    }

    pub fn with_button(mut self, button: u32, action: LogicalAction) -> Self {
        self.buttons.insert(button, action);
        self
    }

    pub fn with_axis(
        mut self,
        axis: u32,
        negative: Option<LogicalAction>,
        positive: Option<LogicalAction>,
    ) -> Self {
        self.axes.retain(|binding| binding.axis != axis);
        self.axes.push(AxisBinding {
            axis,
            negative,
            positive,
        });
        self.axes.sort_by_key(|binding| binding.axis);
        self
    }

    pub fn with_deadzone(mut self, deadzone: f32) -> Self {
        self.deadzone = if deadzone.is_finite() {
            deadzone.clamp(0.0, 0.95)
        } else {
            DEFAULT_DEADZONE
        };
        self
    }

    pub fn with_axis_threshold(mut self, threshold: f32) -> Self {
        self.axis_threshold = if threshold.is_finite() && threshold > 0.0 {
            threshold.min(1.0)
        } else {
            DEFAULT_AXIS_THRESHOLD
        };
        self
    }

    pub fn device(&self) -> &DeviceSelector {
        &self.device
    }

    pub fn axes(&self) -> &[AxisBinding] {
        &self.axes
    }

    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    pub fn axis_threshold(&self) -> f32 {
        self.axis_threshold
    }

    /// Unbound signals resolve to `None` and are ignored upstream.
    pub fn resolve(&self, signal: RawSignal) -> Option<LogicalAction> {
        match signal {
            RawSignal::Key(key) => self.keys.get(&key).copied(),
            RawSignal::PadButton(button) => self.buttons.get(&button).copied(),
            RawSignal::PadAxis { axis, polarity } => self
                .axes
                .iter()
                .find(|binding| binding.axis == axis)
                .and_then(|binding| match polarity {
                    AxisPolarity::Negative => binding.negative,
                    AxisPolarity::Positive => binding.positive,
                }),
        }
    }
}

/// Rescales so the output ramps from zero at the deadzone edge to one at full tilt.
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    let magnitude = value.abs();
    if magnitude <= deadzone {
        return 0.0;
    }
    let span = 1.0 - deadzone;
    if span <= f32::EPSILON {
        return value.signum();
    }
    (value.signum() * (magnitude - deadzone) / span).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_binding() -> DeviceBinding {
        DeviceBinding::new(DeviceSelector::Gamepad {
            name: Some("Pad".to_string()),
            occurrence: 0,
        })
        .with_button(0, LogicalAction::Attack)
        .with_button(1, LogicalAction::Special)
        .with_axis(0, Some(LogicalAction::Left), Some(LogicalAction::Right))
        .with_axis(1, Some(LogicalAction::Up), None)
        .with_key(KeyCode::KeyZ, LogicalAction::Attack)
    }

    #[test]
    fn resolves_each_signal_kind() {
        let binding = sample_binding();
        assert_eq!(
            binding.resolve(RawSignal::PadButton(1)),
            Some(LogicalAction::Special)
        );
        assert_eq!(
            binding.resolve(RawSignal::PadAxis {
                axis: 0,
                polarity: AxisPolarity::Positive
            }),
            Some(LogicalAction::Right)
        );
        assert_eq!(
            binding.resolve(RawSignal::Key(KeyCode::KeyZ)),
            Some(LogicalAction::Attack)
        );
    }

    #[test]
    fn unbound_signals_resolve_to_none() {
        let binding = sample_binding();
        assert_eq!(binding.resolve(RawSignal::PadButton(7)), None);
        assert_eq!(
            binding.resolve(RawSignal::PadAxis {
                axis: 1,
                polarity: AxisPolarity::Positive
            }),
            None
        );
        assert_eq!(binding.resolve(RawSignal::Key(KeyCode::Enter)), None);
    }

    #[test]
    fn rebinding_an_axis_replaces_it() {
        let binding = sample_binding().with_axis(0, None, Some(LogicalAction::Jump));
        assert_eq!(binding.axes().len(), 2);
        assert_eq!(
            binding.resolve(RawSignal::PadAxis {
                axis: 0,
                polarity: AxisPolarity::Negative
            }),
            None
        );
    }

    #[test]
    fn deadzone_rescales_outside_and_zeroes_inside() {
        assert_eq!(apply_deadzone(0.1, 0.2), 0.0);
        assert_eq!(apply_deadzone(-0.2, 0.2), 0.0);
        assert!((apply_deadzone(0.6, 0.2) - 0.5).abs() < 1e-6);
        assert!((apply_deadzone(-1.0, 0.2) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn invalid_tuning_values_fall_back() {
        let binding = DeviceBinding::unassigned()
            .with_deadzone(f32::NAN)
            .with_axis_threshold(-1.0);
        assert_eq!(binding.deadzone(), DEFAULT_DEADZONE);
        assert_eq!(binding.axis_threshold(), DEFAULT_AXIS_THRESHOLD);
    }
}
