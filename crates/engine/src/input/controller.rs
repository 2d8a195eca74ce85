use std::sync::Arc;

use tracing::debug;

use super::action::{ActionStates, LogicalAction};
use super::binding::{apply_deadzone, AxisPolarity, DeviceBinding, DeviceSelector, RawSignal};
use super::device::RawInputFrame;
use super::timing::{ActionEvent, AxisSmoother, FilterBank, TimingWindowConfig};

/// Non-owning handle to whatever receives a controller's events, usually a slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The listener used the event up. A confirm press is dropped from the buffer.
    Consumed,
    /// The event stays available to the controller's owner; a confirm press remains buffered.
    Passed,
}

pub trait InputListener {
    fn on_action(&mut self, event: ActionEvent) -> Disposition;
}

/// Decodes one player's device into timed logical events, one tick at a time.
#[derive(Debug)]
pub struct InputController {
    player: usize,
    binding: DeviceBinding,
    bank: FilterBank,
    smoothers: Vec<AxisSmoother>,
    tick: u64,
    listener: Option<ListenerId>,
    events: Vec<ActionEvent>,
    device_present: bool,
}

impl InputController {
    pub fn new(player: usize, binding: DeviceBinding, timing: Arc<TimingWindowConfig>) -> Self {
        let smoothers = binding
            .axes()
            .iter()
            .map(|_| AxisSmoother::new(timing.smoothing_window()))
            .collect();
        Self {
            player,
            binding,
            bank: FilterBank::new(timing),
            smoothers,
            tick: 0,
            listener: None,
            events: Vec::new(),
            device_present: false,
        }
    }

    pub fn listener(&self) -> Option<ListenerId> {
        self.listener
    }

    /// Points events at a new listener. Buffered and repeat state is flushed so
    /// nothing pressed before the switch reaches it.
    pub fn link(&mut self, listener: ListenerId) {
        self.listener = Some(listener);
        self.bank.flush();
        debug!(player = self.player, listener = listener.0, "controller_linked");
    }

    pub fn flush(&mut self) {
        self.bank.flush();
    }

    /// Reads this player's device out of the frame. Every raw signal is given
    /// its meaning by the binding; a missing device asserts nothing.
    pub fn sample(&mut self, frame: &RawInputFrame) -> ActionStates {
        let mut states = ActionStates::default();
        match self.binding.device() {
            DeviceSelector::Keyboard => {
                self.device_present = true;
                for key in &frame.keys_down {
                    if let Some(action) = self.binding.resolve(RawSignal::Key(*key)) {
                        states.assert(action);
                    }
                }
            }
            DeviceSelector::Gamepad { name, occurrence } => {
                let Some(pad) = frame.find_pad(name.as_deref(), *occurrence) else {
                    if self.device_present {
                        debug!(player = self.player, "controller_device_missing");
                    }
                    self.device_present = false;
                    self.smoothers.iter_mut().for_each(AxisSmoother::reset);
                    return states;
                };
                self.device_present = true;
                for (button, _) in pad.buttons.iter().enumerate().filter(|(_, down)| **down) {
                    let signal = RawSignal::PadButton(button as u32);
                    if let Some(action) = self.binding.resolve(signal) {
                        states.assert(action);
                    }
                }
                let deadzone = self.binding.deadzone();
                let threshold = self.binding.axis_threshold();
                for (bound, smoother) in self.binding.axes().iter().zip(&mut self.smoothers) {
                    let value = smoother.push(apply_deadzone(pad.axis(bound.axis), deadzone));
                    let polarity = if value <= -threshold {
                        AxisPolarity::Negative
                    } else if value >= threshold {
                        AxisPolarity::Positive
                    } else {
                        continue;
                    };
                    let signal = RawSignal::PadAxis {
                        axis: bound.axis,
                        polarity,
                    };
                    if let Some(action) = self.binding.resolve(signal) {
                        states.assert(action);
                    }
                }
            }
            DeviceSelector::Unassigned => {}
        }
        states
    }

    /// Advances one tick and returns that tick's events in priority order.
    pub fn poll(&mut self, frame: &RawInputFrame) -> &[ActionEvent] {
        self.tick += 1;
        let states = self.sample(frame);
        self.events.clear();
        self.bank.step(self.tick, &states, &mut self.events);
        &self.events
    }

    /// Polls and hands every event to `listener`. Confirm presses the listener
    /// consumes stop being buffered.
    pub fn dispatch(&mut self, frame: &RawInputFrame, listener: &mut dyn InputListener) {
        self.poll(frame);
        for index in 0..self.events.len() {
            let event = self.events[index];
            let disposition = listener.on_action(event);
            if disposition == Disposition::Consumed
                && event.kind.is_press()
                && event.action.is_confirmable()
            {
                self.bank.consume(event.action);
            }
        }
    }

    pub fn has_buffered(&self, action: LogicalAction) -> bool {
        self.bank.has_buffered(action, self.tick)
    }

    pub fn take_buffered(&mut self, action: LogicalAction) -> bool {
        self.bank.take_buffered(action, self.tick)
    }

    /// Drops a buffered press without acting on it.
    pub fn discard_buffered(&mut self, action: LogicalAction) {
        self.bank.consume(action);
    }
}

#[cfg(test)]
mod tests {
    use winit::keyboard::KeyCode;

    use super::super::device::PadState;
    use super::super::timing::EventKind;
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<ActionEvent>,
        consume: bool,
    }

    impl InputListener for Recorder {
        fn on_action(&mut self, event: ActionEvent) -> Disposition {
            self.seen.push(event);
            if self.consume {
                Disposition::Consumed
            } else {
                Disposition::Passed
            }
        }
    }

    fn keyboard_controller() -> InputController {
        let binding = DeviceBinding::new(DeviceSelector::Keyboard)
            .with_key(KeyCode::ArrowLeft, LogicalAction::Left)
            .with_key(KeyCode::KeyA, LogicalAction::Left)
            .with_key(KeyCode::KeyZ, LogicalAction::Attack);
        let timing = TimingWindowConfig::new(4, 0, 8, 1).expect("timing");
        InputController::new(0, binding, Arc::new(timing))
    }

    fn keys(pressed: &[KeyCode]) -> RawInputFrame {
        RawInputFrame {
            keys_down: pressed.iter().copied().collect(),
            ..RawInputFrame::default()
        }
    }

    fn pad_frame(name: &str, axis_x: f32, buttons: Vec<bool>) -> RawInputFrame {
        RawInputFrame {
            pads: vec![PadState {
                name: name.to_string(),
                connected: true,
                buttons,
                axes: vec![axis_x, 0.0],
            }],
            ..RawInputFrame::default()
        }
    }

    #[test]
    fn any_bound_key_asserts_the_action() {
        let mut controller = keyboard_controller();
        let events = controller.poll(&keys(&[KeyCode::KeyA])).to_vec();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, LogicalAction::Left);
        assert_eq!(events[0].kind, EventKind::Pressed);
        assert_eq!(events[0].tick, 1);

        // Switching which key holds the action does not re-press it.
        assert!(controller.poll(&keys(&[KeyCode::ArrowLeft])).is_empty());
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut controller = keyboard_controller();
        assert!(controller.poll(&keys(&[KeyCode::KeyQ])).is_empty());
    }

    #[test]
    fn consumed_confirm_press_is_not_buffered() {
        let mut controller = keyboard_controller();
        let mut listener = Recorder {
            consume: true,
            ..Recorder::default()
        };
        controller.dispatch(&keys(&[KeyCode::KeyZ]), &mut listener);
        assert_eq!(listener.seen.len(), 1);
        assert!(!controller.has_buffered(LogicalAction::Attack));
    }

    #[test]
    fn passed_confirm_press_stays_buffered() {
        let mut controller = keyboard_controller();
        let mut listener = Recorder::default();
        controller.dispatch(&keys(&[KeyCode::KeyZ]), &mut listener);
        controller.dispatch(&keys(&[]), &mut listener);
        assert!(controller.take_buffered(LogicalAction::Attack));
        assert!(!controller.take_buffered(LogicalAction::Attack));
    }

    #[test]
    fn discarded_press_cannot_be_claimed() {
        let mut controller = keyboard_controller();
        let mut listener = Recorder::default();
        controller.dispatch(&keys(&[KeyCode::KeyZ]), &mut listener);
        controller.discard_buffered(LogicalAction::Attack);
        assert!(!controller.take_buffered(LogicalAction::Attack));
    }

    #[test]
    fn remapped_key_samples_as_its_new_action() {
        let binding = DeviceBinding::new(DeviceSelector::Keyboard)
            .with_key(KeyCode::KeyZ, LogicalAction::Shield)
            .with_key(KeyCode::Space, LogicalAction::Attack);
        let mut controller = InputController::new(
            0,
            binding.clone(),
            Arc::new(TimingWindowConfig::new(4, 0, 8, 1).expect("timing")),
        );

        let states = controller.sample(&keys(&[KeyCode::KeyZ, KeyCode::Space]));
        for action in [LogicalAction::Shield, LogicalAction::Attack] {
            assert!(states.is_down(action));
        }
        assert_eq!(
            binding.resolve(RawSignal::Key(KeyCode::KeyZ)),
            Some(LogicalAction::Shield)
        );
        assert!(!states.is_down(LogicalAction::Special));
    }

    #[test]
    fn pad_axis_polarity_picks_the_bound_direction() {
        let binding = DeviceBinding::new(DeviceSelector::Gamepad {
            name: None,
            occurrence: 0,
        })
        .with_axis(0, None, Some(LogicalAction::Down))
        .with_button(3, LogicalAction::Start)
        .with_deadzone(0.0);
        let timing = TimingWindowConfig::new(4, 0, 8, 1).expect("timing");
        let mut controller = InputController::new(2, binding, Arc::new(timing));

        let negative = controller.sample(&pad_frame("Any", -1.0, vec![false; 4]));
        assert!(!negative.is_down(LogicalAction::Down));

        let positive = controller.sample(&pad_frame("Any", 1.0, vec![false, false, false, true]));
        assert!(positive.is_down(LogicalAction::Down));
        assert!(positive.is_down(LogicalAction::Start));
    }

    #[test]
    fn relinking_drops_stale_presses() {
        let mut controller = keyboard_controller();
        let mut listener = Recorder::default();
        controller.dispatch(&keys(&[KeyCode::KeyZ]), &mut listener);
        controller.link(ListenerId(2));
        assert_eq!(controller.listener(), Some(ListenerId(2)));
        assert!(!controller.has_buffered(LogicalAction::Attack));

        listener.seen.clear();
        controller.dispatch(&keys(&[KeyCode::KeyZ]), &mut listener);
        controller.dispatch(&keys(&[]), &mut listener);
        assert!(listener.seen.is_empty());
    }

    #[test]
    fn gamepad_axis_crosses_threshold_after_smoothing() {
        let binding = DeviceBinding::new(DeviceSelector::Gamepad {
            name: Some("Pad".to_string()),
            occurrence: 0,
        })
        .with_axis(0, Some(LogicalAction::Left), Some(LogicalAction::Right))
        .with_button(0, LogicalAction::Attack)
        .with_deadzone(0.0);
        let timing = TimingWindowConfig::new(4, 0, 8, 8).expect("timing");
        let mut controller = InputController::new(1, binding, Arc::new(timing));

        let first = controller.poll(&pad_frame("Pad", 1.0, vec![false])).to_vec();
        assert_eq!(first[0].action, LogicalAction::Right);
        for _ in 0..3 {
            controller.poll(&pad_frame("Pad", 1.0, vec![false]));
        }

        // A one-tick flick back is averaged out: mean of [1, 1, 1, 1, -1] is 0.6.
        let flick = controller.poll(&pad_frame("Pad", -1.0, vec![false])).to_vec();
        assert!(flick.is_empty());

        let button = controller.poll(&pad_frame("Pad", 1.0, vec![true])).to_vec();
        assert_eq!(button[0].action, LogicalAction::Attack);
    }

    #[test]
    fn missing_gamepad_asserts_nothing() {
        let binding = DeviceBinding::new(DeviceSelector::Gamepad {
            name: Some("Pad".to_string()),
            occurrence: 0,
        })
        .with_button(0, LogicalAction::Attack);
        let mut controller =
            InputController::new(3, binding, Arc::new(TimingWindowConfig::default()));
        let pressed = controller.poll(&pad_frame("Pad", 0.0, vec![true])).to_vec();
        assert_eq!(pressed[0].kind, EventKind::Pressed);

        let gone = controller.poll(&RawInputFrame::default()).to_vec();
        assert_eq!(gone.len(), 1);
        assert_eq!(gone[0].kind, EventKind::Released);
        assert!(controller.poll(&RawInputFrame::default()).is_empty());
    }
}
