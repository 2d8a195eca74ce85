use std::sync::Arc;

use brawl_engine::{
    Canvas, FighterDescriptor, InputController, ListenerId, LogicalAction, RawInputFrame, Screen,
    ScreenCommand,
};
use thiserror::Error;
use tracing::{info, warn};

use super::super::services::{AudioService, MatchEntry, MatchLauncher, MusicService};
use super::super::settings::{Settings, PLAYER_SLOTS};
use super::panel::{PanelState, PlayerPanel};
use super::render::render_selection;
use super::wheel::{FighterWheel, WheelError};

pub const MENU_TRACK: &str = "menu";
pub const LAUNCH_SOUND: &str = "matchStart";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Selecting,
    Launching,
    Exiting,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Selecting => "selecting",
            Self::Launching => "launching",
            Self::Exiting => "exiting",
        }
    }
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("character select cannot open: {0}")]
    Wheel(#[from] WheelError),
}

pub struct SelectionServices {
    pub audio: Box<dyn AudioService>,
    pub music: Box<dyn MusicService>,
    pub launcher: Box<dyn MatchLauncher>,
}

/// Owns the four panels and their controllers and decides when a match starts.
pub struct SelectionCoordinator {
    phase: Phase,
    panels: Vec<PlayerPanel>,
    controllers: Vec<InputController>,
    services: SelectionServices,
    matches_played: u32,
}

impl SelectionCoordinator {
    pub fn new(
        fighters: Arc<[FighterDescriptor]>,
        settings: &Settings,
        services: SelectionServices,
    ) -> Result<Self, SelectionError> {
        let wheel = FighterWheel::new(fighters)?;
        let panels = (0..PLAYER_SLOTS)
            .map(|slot| PlayerPanel::new(slot, settings.player_colors[slot], wheel.clone()))
            .collect();
        let controllers = settings
            .players
            .iter()
            .enumerate()
            .map(|(slot, controls)| {
                let mut controller = InputController::new(
                    slot,
                    controls.binding.clone(),
                    Arc::clone(&controls.timing),
                );
                controller.link(ListenerId(slot));
                controller
            })
            .collect();
        info!(fighters = wheel.len(), slots = PLAYER_SLOTS, "selection_opened");

        Ok(Self {
            phase: Phase::Selecting,
            panels,
            controllers,
            services,
            matches_played: 0,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn panels(&self) -> &[PlayerPanel] {
        &self.panels
    }

    pub fn panel(&self, slot: usize) -> Option<&PlayerPanel> {
        self.panels.get(slot)
    }

    pub fn controller(&self, slot: usize) -> Option<&InputController> {
        self.controllers.get(slot)
    }

    pub fn matches_played(&self) -> u32 {
        self.matches_played
    }

    pub fn is_ready(&self) -> bool {
        selection_ready(&self.panels)
    }

    /// Runs one fixed tick and returns the phase it ends in.
    pub fn tick(&mut self, frame: &RawInputFrame) -> Phase {
        if self.phase == Phase::Exiting {
            return self.phase;
        }
        if frame.quit_requested {
            info!(phase = self.phase.name(), "selection_quit");
            self.phase = Phase::Exiting;
            return self.phase;
        }

        self.services.music.poll();
        if !self.services.music.is_playing() {
            self.services.music.roll(MENU_TRACK);
        }

        for controller in &mut self.controllers {
            match controller.listener() {
                Some(ListenerId(slot)) if slot < self.panels.len() => {
                    controller.dispatch(frame, &mut self.panels[slot]);
                }
                _ => {
                    controller.poll(frame);
                }
            }
        }

        for panel in &mut self.panels {
            for sound in panel.take_sounds() {
                self.services.audio.play_sound(sound);
            }
            panel.update();
        }

        if self.is_ready() {
            let launcher_slot = self
                .controllers
                .iter_mut()
                .position(|controller| controller.take_buffered(LogicalAction::Attack));
            if let Some(slot) = launcher_slot {
                self.launch(slot);
            }
        } else {
            // Attacks pressed before everyone has picked never carry over.
            for controller in &mut self.controllers {
                controller.discard_buffered(LogicalAction::Attack);
            }
        }

        if frame.cancel_pressed && self.phase == Phase::Selecting {
            info!("selection_cancelled");
            self.phase = Phase::Exiting;
        }
        self.phase
    }

    pub fn match_entries(&self) -> Vec<MatchEntry> {
        self.panels
            .iter()
            .filter_map(PlayerPanel::match_entry)
            .collect()
    }

    fn launch(&mut self, slot: usize) {
        self.phase = Phase::Launching;
        let entries = self.match_entries();
        info!(
            triggered_by = slot,
            participants = entries.len(),
            "match_launching"
        );
        self.services.audio.play_sound(LAUNCH_SOUND);

        match self.services.launcher.run_match(&entries) {
            Ok(()) => {
                self.matches_played += 1;
                for panel in &mut self.panels {
                    panel.reset_after_match();
                }
                for (slot, controller) in self.controllers.iter_mut().enumerate() {
                    controller.link(ListenerId(slot));
                }
                info!(matches_played = self.matches_played, "match_returned");
            }
            Err(err) => {
                warn!(error = %err, "match_start_failed");
                for controller in &mut self.controllers {
                    controller.flush();
                }
            }
        }
        self.phase = Phase::Selecting;
    }
}

/// At least one panel has joined and every joined panel has a fighter.
pub fn selection_ready(panels: &[PlayerPanel]) -> bool {
    let mut active = panels.iter().filter(|panel| panel.is_active()).peekable();
    active.peek().is_some() && active.all(|panel| panel.chosen().is_some())
}

impl Screen for SelectionCoordinator {
    fn update(&mut self, input: &RawInputFrame) -> ScreenCommand {
        match self.tick(input) {
            Phase::Exiting => ScreenCommand::Exit,
            Phase::Selecting | Phase::Launching => ScreenCommand::Continue,
        }
    }

    fn render(&self, canvas: &mut Canvas<'_>) {
        render_selection(&self.panels, canvas);
    }

    fn debug_title(&self) -> Option<String> {
        let joined = self.panels.iter().filter(|panel| panel.is_active()).count();
        let confirmed = self
            .panels
            .iter()
            .filter(|panel| panel.state() == PanelState::Confirmed)
            .count();
        Some(format!(
            "{} | joined {joined} | confirmed {confirmed} | matches {}",
            self.phase.name(),
            self.matches_played
        ))
    }

    fn shutdown(&mut self) {
        info!(matches_played = self.matches_played, "selection_closed");
    }
}

