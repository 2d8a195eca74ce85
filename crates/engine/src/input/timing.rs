use std::sync::Arc;

use thiserror::Error;

use super::action::{ActionStates, LogicalAction, ACTION_COUNT};

pub const DEFAULT_SMASH_WINDOW: u32 = 4;
pub const DEFAULT_REPEAT_WINDOW: u32 = 8;
pub const DEFAULT_BUFFER_WINDOW: u32 = 8;
pub const DEFAULT_SMOOTHING_WINDOW: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingConfigError {
    #[error("{window} must be >= 0, got {value}")]
    Negative { window: &'static str, value: i64 },
    #[error("{window} is too large: {value}")]
    TooLarge { window: &'static str, value: i64 },
    #[error("repeat schedule must contain at least one step")]
    EmptyRepeatSteps,
    #[error("repeat step {index} must be >= 1")]
    ZeroRepeatStep { index: usize },
    #[error("repeat step {index} ({step}) is longer than the step before it")]
    IncreasingRepeatSteps { index: usize, step: u32 },
    #[error("first repeat step ({step}) is longer than repeat_window ({window})")]
    FirstStepExceedsWindow { step: u32, window: u32 },
}

/// Tick counts for the four filter windows, plus the ratcheting repeat schedule.
///
/// `repeat_window` is the hold time before the first `Repeated`; each further
/// repeat waits the next entry of `repeat_steps`, staying on the last one.
/// A `repeat_window` of zero disables auto-repeat. A `smash_window` of zero
/// disables smash detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingWindowConfig {
    smash_window: u32,
    repeat_window: u32,
    buffer_window: u32,
    smoothing_window: u32,
    repeat_steps: Vec<u32>,
}

impl Default for TimingWindowConfig {
    fn default() -> Self {
        Self {
            smash_window: DEFAULT_SMASH_WINDOW,
            repeat_window: DEFAULT_REPEAT_WINDOW,
            buffer_window: DEFAULT_BUFFER_WINDOW,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            repeat_steps: default_repeat_steps(DEFAULT_REPEAT_WINDOW),
        }
    }
}

impl TimingWindowConfig {
    pub fn new(
        smash_window: i64,
        repeat_window: i64,
        buffer_window: i64,
        smoothing_window: i64,
    ) -> Result<Self, TimingConfigError> {
        let repeat_window = window_ticks("repeat_window", repeat_window)?;
        Ok(Self {
            smash_window: window_ticks("smash_window", smash_window)?,
            repeat_window,
            buffer_window: window_ticks("buffer_window", buffer_window)?,
            smoothing_window: window_ticks("smoothing_window", smoothing_window)?,
            repeat_steps: default_repeat_steps(repeat_window),
        })
    }

    pub fn with_repeat_steps(mut self, steps: Vec<u32>) -> Result<Self, TimingConfigError> {
        validate_repeat_steps(&steps, self.repeat_window)?;
        self.repeat_steps = steps;
        Ok(self)
    }

    pub fn smash_window(&self) -> u32 {
        self.smash_window
    }

    pub fn repeat_window(&self) -> u32 {
        self.repeat_window
    }

    pub fn buffer_window(&self) -> u32 {
        self.buffer_window
    }

    pub fn smoothing_window(&self) -> u32 {
        self.smoothing_window
    }

    pub fn repeat_steps(&self) -> &[u32] {
        &self.repeat_steps
    }

    pub fn repeat_enabled(&self) -> bool {
        self.repeat_window > 0
    }

    /// Threshold for the repeat at `stage`: stage 0 waits the full window.
    fn repeat_threshold(&self, stage: usize) -> u32 {
        if stage == 0 {
            return self.repeat_window;
        }
        let last = self.repeat_steps.len().saturating_sub(1);
        self.repeat_steps
            .get((stage - 1).min(last))
            .copied()
            .unwrap_or(self.repeat_window)
            .max(1)
    }
}

/// Two-thirds then one-third of the window, the 30/20/10 cadence scaled.
pub fn default_repeat_steps(repeat_window: u32) -> Vec<u32> {
    vec![
        (repeat_window * 2 / 3).max(1),
        (repeat_window / 3).max(1),
    ]
}

fn window_ticks(window: &'static str, value: i64) -> Result<u32, TimingConfigError> {
    if value < 0 {
        return Err(TimingConfigError::Negative { window, value });
    }
    u32::try_from(value).map_err(|_| TimingConfigError::TooLarge { window, value })
}

fn validate_repeat_steps(steps: &[u32], repeat_window: u32) -> Result<(), TimingConfigError> {
    let Some(&first) = steps.first() else {
        return Err(TimingConfigError::EmptyRepeatSteps);
    };
    for (index, step) in steps.iter().copied().enumerate() {
        if step == 0 {
            return Err(TimingConfigError::ZeroRepeatStep { index });
        }
        if index > 0 && step > steps[index - 1] {
            return Err(TimingConfigError::IncreasingRepeatSteps { index, step });
        }
    }
    if repeat_window > 0 && first > repeat_window {
        return Err(TimingConfigError::FirstStepExceedsWindow {
            step: first,
            window: repeat_window,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Pressed,
    SmashPressed,
    Released,
    Repeated,
}

impl EventKind {
    pub const fn is_press(self) -> bool {
        matches!(self, EventKind::Pressed | EventKind::SmashPressed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEvent {
    pub action: LogicalAction,
    pub kind: EventKind,
    pub tick: u64,
}

/// Filter state for one action of one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionState {
    pub asserted: bool,
    /// Ticks since the last press or repeat.
    pub ticks_held: u32,
    pub repeat_threshold: u32,
    repeat_stage: usize,
    pub last_event_tick: Option<u64>,
    pub last_release_tick: Option<u64>,
    buffered_press: Option<u64>,
    held_through_flush: bool,
}

impl ActionState {
    fn neutralize(&mut self) {
        self.ticks_held = 0;
        self.repeat_threshold = 0;
        self.repeat_stage = 0;
        self.buffered_press = None;
        self.held_through_flush = self.asserted;
    }
}

/// All nine action filters of one player, stepped together so that a release and
/// an opposite-direction press on the same tick see each other.
#[derive(Debug, Clone)]
pub struct FilterBank {
    config: Arc<TimingWindowConfig>,
    states: [ActionState; ACTION_COUNT],
}

impl FilterBank {
    pub fn new(config: Arc<TimingWindowConfig>) -> Self {
        Self {
            config,
            states: [ActionState::default(); ACTION_COUNT],
        }
    }

    pub fn config(&self) -> &TimingWindowConfig {
        &self.config
    }

    pub fn state(&self, action: LogicalAction) -> &ActionState {
        &self.states[action.index()]
    }

    /// Advances every filter to `tick` and appends at most one event per action,
    /// in action priority order.
    pub fn step(&mut self, tick: u64, input: &ActionStates, out: &mut Vec<ActionEvent>) {
        let mut pending: [Option<EventKind>; ACTION_COUNT] = [None; ACTION_COUNT];

        for action in LogicalAction::ALL {
            let state = &mut self.states[action.index()];
            if state.asserted && !input.is_down(action) {
                state.asserted = false;
                state.ticks_held = 0;
                state.repeat_stage = 0;
                state.last_release_tick = Some(tick);
                if state.held_through_flush {
                    state.held_through_flush = false;
                } else {
                    pending[action.index()] = Some(EventKind::Released);
                }
            }
        }

        for action in LogicalAction::ALL {
            if !input.is_down(action) {
                continue;
            }
            let smash = self.is_smash(action, tick);
            let config = &*self.config;
            let state = &mut self.states[action.index()];
            if !state.asserted {
                state.asserted = true;
                state.ticks_held = 0;
                state.repeat_stage = 0;
                state.repeat_threshold = config.repeat_threshold(0);
                if action.is_confirmable() {
                    state.buffered_press = Some(tick);
                }
                pending[action.index()] = Some(if smash {
                    EventKind::SmashPressed
                } else {
                    EventKind::Pressed
                });
            } else if !state.held_through_flush && config.repeat_enabled() {
                state.ticks_held = state.ticks_held.saturating_add(1);
                if state.ticks_held >= state.repeat_threshold {
                    state.ticks_held = 0;
                    state.repeat_stage += 1;
                    state.repeat_threshold = config.repeat_threshold(state.repeat_stage);
                    pending[action.index()] = Some(EventKind::Repeated);
                }
            }
        }

        let buffer_window = u64::from(self.config.buffer_window);
        for action in LogicalAction::ALL {
            let state = &mut self.states[action.index()];
            if let Some(pressed_at) = state.buffered_press {
                if tick.saturating_sub(pressed_at) > buffer_window {
                    state.buffered_press = None;
                }
            }
            if let Some(kind) = pending[action.index()] {
                state.last_event_tick = Some(tick);
                out.push(ActionEvent { action, kind, tick });
            }
        }
    }

    fn is_smash(&self, action: LogicalAction, tick: u64) -> bool {
        let window = self.config.smash_window;
        if window == 0 {
            return false;
        }
        let Some(opposite) = action.opposite() else {
            return false;
        };
        let opposite_state = &self.states[opposite.index()];
        if opposite_state.asserted {
            return false;
        }
        opposite_state
            .last_release_tick
            .is_some_and(|released| tick.saturating_sub(released) <= u64::from(window))
    }

    /// Whether a buffered press of `action` is still claimable at `tick`.
    pub fn has_buffered(&self, action: LogicalAction, tick: u64) -> bool {
        self.states[action.index()]
            .buffered_press
            .is_some_and(|pressed_at| {
                tick.saturating_sub(pressed_at) <= u64::from(self.config.buffer_window)
            })
    }

    /// Claims the buffered press of `action`; it can be claimed at most once.
    pub fn take_buffered(&mut self, action: LogicalAction, tick: u64) -> bool {
        let eligible = self.has_buffered(action, tick);
        self.states[action.index()].buffered_press = None;
        eligible
    }

    /// Drops the buffered press after a listener consumed it directly.
    pub fn consume(&mut self, action: LogicalAction) {
        self.states[action.index()].buffered_press = None;
    }

    /// Clears buffers and repeat progress. Actions still held stay silent until
    /// released and pressed again.
    pub fn flush(&mut self) {
        for state in &mut self.states {
            state.neutralize();
        }
    }
}

/// Trailing mean over the last `window` samples of one analog axis.
#[derive(Debug, Clone)]
pub struct AxisSmoother {
    samples: Vec<f32>,
    next: usize,
    filled: usize,
    sum: f32,
}

impl AxisSmoother {
    pub fn new(window: u32) -> Self {
        Self {
            samples: vec![0.0; window.max(1) as usize],
            next: 0,
            filled: 0,
            sum: 0.0,
        }
    }

    pub fn push(&mut self, sample: f32) -> f32 {
        let capacity = self.samples.len();
        if capacity == 1 {
            self.samples[0] = sample;
            self.filled = 1;
            self.sum = sample;
            return sample;
        }
        if self.filled == capacity {
            self.sum -= self.samples[self.next];
        } else {
            self.filled += 1;
        }
        self.samples[self.next] = sample;
        self.sum += sample;
        self.next = (self.next + 1) % capacity;
        self.sum / self.filled as f32
    }

    pub fn reset(&mut self) {
        self.samples.iter_mut().for_each(|sample| *sample = 0.0);
        self.next = 0;
        self.filled = 0;
        self.sum = 0.0;
    }
}
