use brawl_engine::Rgb;
use thiserror::Error;
use tracing::{debug, info};

/// Menu music loops for roughly this long before it is rolled again.
pub const MENU_TRACK_TICKS: u64 = 60 * 90;

pub trait AudioService {
    fn play_sound(&mut self, name: &str);
}

pub trait MusicService {
    fn poll(&mut self);
    fn is_playing(&self) -> bool;
    fn roll(&mut self, track: &str);
}

/// One participant handed to the match, in slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntry {
    pub slot: usize,
    pub fighter_id: String,
    pub color_index: usize,
    pub color: Rgb,
    pub costume: u32,
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("match could not start: {0}")]
    Start(String),
}

pub trait MatchLauncher {
    /// Runs a match to completion. Blocks the selection tick.
    fn run_match(&mut self, entries: &[MatchEntry]) -> Result<(), MatchError>;
}

#[derive(Debug, Default)]
pub struct LoggingAudio;

impl AudioService for LoggingAudio {
    fn play_sound(&mut self, name: &str) {
        debug!(sound = name, "play_sound");
    }
}

/// Stand-in music player: a rolled track "plays" for a fixed number of polls.
#[derive(Debug)]
pub struct TimedMusic {
    track_ticks: u64,
    current: Option<String>,
    remaining: u64,
}

impl TimedMusic {
    pub fn new(track_ticks: u64) -> Self {
        Self {
            track_ticks: track_ticks.max(1),
            current: None,
            remaining: 0,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl Default for TimedMusic {
    fn default() -> Self {
        Self::new(MENU_TRACK_TICKS)
    }
}

impl MusicService for TimedMusic {
    fn poll(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    fn is_playing(&self) -> bool {
        self.remaining > 0
    }

    fn roll(&mut self, track: &str) {
        info!(track, "music_rolled");
        self.current = Some(track.to_string());
        self.remaining = self.track_ticks;
    }
}

#[derive(Debug, Default)]
pub struct LoggingMatchLauncher {
    matches_run: u32,
}

impl LoggingMatchLauncher {
    pub fn matches_run(&self) -> u32 {
        self.matches_run
    }
}

impl MatchLauncher for LoggingMatchLauncher {
    fn run_match(&mut self, entries: &[MatchEntry]) -> Result<(), MatchError> {
        if entries.is_empty() {
            return Err(MatchError::Start("no participants".to_string()));
        }
        self.matches_run += 1;
        for entry in entries {
            info!(
                slot = entry.slot,
                fighter = %entry.fighter_id,
                color = %entry.color,
                costume = entry.costume,
                "match_participant"
            );
        }
        info!(match_number = self.matches_run, "match_finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolled_track_plays_for_its_length() {
        let mut music = TimedMusic::new(3);
        assert!(!music.is_playing());
        music.roll("menu");
        assert_eq!(music.current(), Some("menu"));
        music.poll();
        music.poll();
        assert!(music.is_playing());
        music.poll();
        assert!(!music.is_playing());
    }

    #[test]
    fn empty_match_is_refused() {
        let mut launcher = LoggingMatchLauncher::default();
        assert!(launcher.run_match(&[]).is_err());
        assert_eq!(launcher.matches_run(), 0);
    }
}
