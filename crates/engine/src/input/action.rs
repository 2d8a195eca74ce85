use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of actions every device is decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalAction {
    Left,
    Right,
    Up,
    Down,
    Attack,
    Special,
    Jump,
    Shield,
    Start,
}

pub const ACTION_COUNT: usize = 9;

impl LogicalAction {
    /// Dispatch priority: directions before buttons.
    pub const ALL: [LogicalAction; ACTION_COUNT] = [
        LogicalAction::Left,
        LogicalAction::Right,
        LogicalAction::Up,
        LogicalAction::Down,
        LogicalAction::Attack,
        LogicalAction::Special,
        LogicalAction::Jump,
        LogicalAction::Shield,
        LogicalAction::Start,
    ];

    pub const fn index(self) -> usize {
        match self {
            LogicalAction::Left => 0,
            LogicalAction::Right => 1,
            LogicalAction::Up => 2,
            LogicalAction::Down => 3,
            LogicalAction::Attack => 4,
            LogicalAction::Special => 5,
            LogicalAction::Jump => 6,
            LogicalAction::Shield => 7,
            LogicalAction::Start => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            LogicalAction::Left => "left",
            LogicalAction::Right => "right",
            LogicalAction::Up => "up",
            LogicalAction::Down => "down",
            LogicalAction::Attack => "attack",
            LogicalAction::Special => "special",
            LogicalAction::Jump => "jump",
            LogicalAction::Shield => "shield",
            LogicalAction::Start => "start",
        }
    }

    pub const fn is_directional(self) -> bool {
        matches!(
            self,
            LogicalAction::Left | LogicalAction::Right | LogicalAction::Up | LogicalAction::Down
        )
    }

    pub const fn opposite(self) -> Option<LogicalAction> {
        match self {
            LogicalAction::Left => Some(LogicalAction::Right),
            LogicalAction::Right => Some(LogicalAction::Left),
            LogicalAction::Up => Some(LogicalAction::Down),
            LogicalAction::Down => Some(LogicalAction::Up),
            _ => None,
        }
    }

    /// Confirm-type presses stay claimable for the buffer window.
    pub const fn is_confirmable(self) -> bool {
        matches!(self, LogicalAction::Attack | LogicalAction::Start)
    }
}

impl fmt::Display for LogicalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action '{0}'")]
pub struct UnknownActionError(pub String);

impl FromStr for LogicalAction {
    type Err = UnknownActionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        LogicalAction::ALL
            .into_iter()
            .find(|action| action.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownActionError(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: LogicalAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn assert(&mut self, action: LogicalAction) {
        self.down[action.index()] = true;
    }

    pub fn is_down(&self, action: LogicalAction) -> bool {
        self.down[action.index()]
    }

    pub fn any_down(&self) -> bool {
        self.down.iter().any(|down| *down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_priority_order() {
        for (position, action) in LogicalAction::ALL.iter().enumerate() {
            assert_eq!(action.index(), position);
        }
    }

    #[test]
    fn directions_come_first_and_pair_up() {
        let directional = LogicalAction::ALL
            .iter()
            .take_while(|action| action.is_directional())
            .count();
        assert_eq!(directional, 4);
        for action in LogicalAction::ALL {
            if let Some(opposite) = action.opposite() {
                assert_eq!(opposite.opposite(), Some(action));
            } else {
                assert!(!action.is_directional());
            }
        }
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Attack".parse::<LogicalAction>(), Ok(LogicalAction::Attack));
        assert_eq!(" left ".parse::<LogicalAction>(), Ok(LogicalAction::Left));
        assert!("taunt".parse::<LogicalAction>().is_err());
    }

    #[test]
    fn action_states_track_each_action_independently() {
        let mut states = ActionStates::default();
        assert!(!states.any_down());
        states.assert(LogicalAction::Jump);
        assert!(states.is_down(LogicalAction::Jump));
        assert!(!states.is_down(LogicalAction::Shield));
        states.set(LogicalAction::Jump, false);
        assert!(!states.any_down());
    }
}
