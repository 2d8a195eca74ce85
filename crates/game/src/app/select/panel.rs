use brawl_engine::{
    ActionEvent, Disposition, EventKind, FighterDescriptor, InputListener, LogicalAction, Rgb,
};
use tracing::debug;

use super::super::services::MatchEntry;
use super::wheel::{FighterWheel, VISIBLE_SLOTS};

pub const ROTATE_SOUND: &str = "selectL";
pub const SNAPSHOT_START_ALPHA: u8 = 240;
pub const SNAPSHOT_MIN_ALPHA: u8 = 128;
pub const SNAPSHOT_FADE_PER_TICK: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    WheelActive,
    Confirmed,
}

/// Wheel as it looked when the player confirmed; fades toward a dimmed backdrop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    pub fighter: usize,
    pub visible: [usize; VISIBLE_SLOTS],
    pub alpha: u8,
}

#[derive(Debug)]
pub struct PlayerPanel {
    slot: usize,
    player_color: Rgb,
    state: PanelState,
    wheel: FighterWheel,
    chosen: Option<usize>,
    color_index: usize,
    costume_index: u32,
    icon_color: Rgb,
    snapshot: Option<PanelSnapshot>,
    pending_sounds: Vec<&'static str>,
}

impl PlayerPanel {
    pub fn new(slot: usize, player_color: Rgb, wheel: FighterWheel) -> Self {
        let mut panel = Self {
            slot,
            player_color,
            state: PanelState::Closed,
            wheel,
            chosen: None,
            color_index: slot,
            costume_index: 0,
            icon_color: Rgb::NEUTRAL,
            snapshot: None,
            pending_sounds: Vec::new(),
        };
        panel.recolor_icon();
        panel
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != PanelState::Closed
    }

    pub fn wheel(&self) -> &FighterWheel {
        &self.wheel
    }

    pub fn chosen(&self) -> Option<&FighterDescriptor> {
        self.chosen.map(|index| &self.wheel.fighters()[index])
    }

    pub fn color_index(&self) -> usize {
        self.color_index
    }

    pub fn costume_index(&self) -> u32 {
        self.costume_index
    }

    pub fn icon_color(&self) -> Rgb {
        self.icon_color
    }

    pub fn snapshot(&self) -> Option<&PanelSnapshot> {
        self.snapshot.as_ref()
    }

    /// Background colour: the player's colour while closed, black once joined.
    pub fn fill(&self) -> Rgb {
        match self.state {
            PanelState::Closed => self.player_color,
            PanelState::WheelActive | PanelState::Confirmed => Rgb::BLACK,
        }
    }

    /// Per-tick animation. Only the confirm snapshot moves.
    pub fn update(&mut self) {
        if let Some(snapshot) = self.snapshot.as_mut() {
            if snapshot.alpha > SNAPSHOT_MIN_ALPHA {
                snapshot.alpha = snapshot
                    .alpha
                    .saturating_sub(SNAPSHOT_FADE_PER_TICK)
                    .max(SNAPSHOT_MIN_ALPHA);
            }
        }
    }

    pub fn take_sounds(&mut self) -> Vec<&'static str> {
        std::mem::take(&mut self.pending_sounds)
    }

    pub fn match_entry(&self) -> Option<MatchEntry> {
        if !self.is_active() {
            return None;
        }
        let fighter = self.chosen()?;
        Some(MatchEntry {
            slot: self.slot,
            fighter_id: fighter.id.clone(),
            color_index: self.color_index,
            color: fighter.palette_color(self.color_index),
            costume: self.costume_index,
        })
    }

    /// Back to browsing after a match. Closed panels stay closed.
    pub fn reset_after_match(&mut self) {
        if self.is_active() {
            self.state = PanelState::WheelActive;
        }
        self.chosen = None;
        self.snapshot = None;
        self.pending_sounds.clear();
        self.recolor_icon();
    }

    fn rotate(&mut self, delta: i32) {
        self.wheel.change_selected(delta);
        self.pending_sounds.push(ROTATE_SOUND);
        self.color_index = self.slot;
        self.recolor_icon();
    }

    fn confirm(&mut self) {
        let fighter = self.wheel.current_index();
        self.chosen = Some(fighter);
        // Costumes belong to the fighter; a fresh pick starts on the first one.
        self.costume_index = 0;
        self.snapshot = Some(PanelSnapshot {
            fighter,
            visible: *self.wheel.visible(),
            alpha: SNAPSHOT_START_ALPHA,
        });
        self.state = PanelState::Confirmed;
        self.recolor_icon();
        debug!(
            slot = self.slot,
            fighter = %self.wheel.current().id,
            "panel_confirmed"
        );
    }

    fn unconfirm(&mut self) {
        self.chosen = None;
        self.snapshot = None;
        self.state = PanelState::WheelActive;
        debug!(slot = self.slot, "panel_unconfirmed");
    }

    fn recolor_icon(&mut self) {
        let color = self.wheel.current().palette_color(self.color_index);
        self.icon_color = if color == self.fill() {
            Rgb::NEUTRAL
        } else {
            color
        };
    }

    fn on_press(&mut self, action: LogicalAction) -> Disposition {
        match (self.state, action) {
            (PanelState::Closed, LogicalAction::Special) => Disposition::Passed,
            (PanelState::Closed, _) => {
                self.state = PanelState::WheelActive;
                self.recolor_icon();
                debug!(slot = self.slot, "panel_opened");
                Disposition::Consumed
            }
            (PanelState::WheelActive, LogicalAction::Left) => {
                self.rotate(-1);
                Disposition::Consumed
            }
            (PanelState::WheelActive, LogicalAction::Right) => {
                self.rotate(1);
                Disposition::Consumed
            }
            // The confirming press stays buffered so it can also launch the match.
            (PanelState::WheelActive, LogicalAction::Attack) => {
                self.confirm();
                Disposition::Passed
            }
            (PanelState::WheelActive, LogicalAction::Special) => {
                self.state = PanelState::Closed;
                self.recolor_icon();
                debug!(slot = self.slot, "panel_closed");
                Disposition::Consumed
            }
            (PanelState::Confirmed, LogicalAction::Jump) => {
                self.color_index += 1;
                self.recolor_icon();
                Disposition::Consumed
            }
            (PanelState::Confirmed, LogicalAction::Shield) => {
                let costumes = self.chosen().map_or(1, |fighter| fighter.costume_count.max(1));
                self.costume_index = (self.costume_index + 1) % costumes;
                Disposition::Consumed
            }
            (PanelState::Confirmed, LogicalAction::Special) => {
                self.unconfirm();
                Disposition::Consumed
            }
            _ => Disposition::Passed,
        }
    }
}

impl InputListener for PlayerPanel {
    fn on_action(&mut self, event: ActionEvent) -> Disposition {
        match event.kind {
            EventKind::Pressed | EventKind::SmashPressed => self.on_press(event.action),
            EventKind::Repeated => match (self.state, event.action) {
                (PanelState::WheelActive, LogicalAction::Left) => {
                    self.rotate(-1);
                    Disposition::Consumed
                }
                (PanelState::WheelActive, LogicalAction::Right) => {
                    self.rotate(1);
                    Disposition::Consumed
                }
                _ => Disposition::Passed,
            },
            EventKind::Released => Disposition::Passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const RED: Rgb = Rgb::new(200, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 200);

    fn panel(slot: usize) -> PlayerPanel {
        let fighters: Arc<[FighterDescriptor]> = vec![
            FighterDescriptor::placeholder("hero", "Hero", vec![RED, Rgb::BLACK, BLUE], 3),
            FighterDescriptor::placeholder("rival", "Rival", vec![BLUE], 2),
            FighterDescriptor::placeholder("brute", "Brute", vec![RED], 1),
        ]
        .into();
        let wheel = FighterWheel::new(fighters).expect("wheel");
        PlayerPanel::new(slot, Rgb::new(255, 40, 40), wheel)
    }

    fn press(panel: &mut PlayerPanel, action: LogicalAction) -> Disposition {
        panel.on_action(ActionEvent {
            action,
            kind: EventKind::Pressed,
            tick: 1,
        })
    }

    #[test]
    fn special_does_not_open_a_closed_panel() {
        let mut panel = panel(0);
        assert_eq!(press(&mut panel, LogicalAction::Special), Disposition::Passed);
        assert_eq!(panel.state(), PanelState::Closed);
    }

    #[test]
    fn any_other_press_opens_without_side_effects() {
        let mut panel = panel(0);
        assert_eq!(press(&mut panel, LogicalAction::Right), Disposition::Consumed);
        assert_eq!(panel.state(), PanelState::WheelActive);
        assert_eq!(panel.wheel().current_index(), 0);
        assert!(panel.take_sounds().is_empty());
    }

    #[test]
    fn rotation_queues_a_cue_and_resets_colour() {
        let mut panel = panel(1);
        press(&mut panel, LogicalAction::Start);
        press(&mut panel, LogicalAction::Attack);
        press(&mut panel, LogicalAction::Jump);
        assert_eq!(panel.color_index(), 2);
        press(&mut panel, LogicalAction::Special);

        panel.on_action(ActionEvent {
            action: LogicalAction::Left,
            kind: EventKind::Repeated,
            tick: 30,
        });
        assert_eq!(panel.wheel().current_index(), 2);
        assert_eq!(panel.color_index(), 1);
        assert_eq!(panel.take_sounds(), vec![ROTATE_SOUND]);
    }

    #[test]
    fn attack_confirms_and_stays_claimable() {
        let mut panel = panel(0);
        press(&mut panel, LogicalAction::Start);
        press(&mut panel, LogicalAction::Right);
        assert_eq!(press(&mut panel, LogicalAction::Attack), Disposition::Passed);
        assert_eq!(panel.state(), PanelState::Confirmed);
        assert_eq!(panel.chosen().map(|fighter| fighter.id.as_str()), Some("rival"));
        let snapshot = panel.snapshot().expect("snapshot");
        assert_eq!(snapshot.fighter, 1);
        assert_eq!(snapshot.alpha, SNAPSHOT_START_ALPHA);
    }

    #[test]
    fn confirmed_panel_ignores_rotation() {
        let mut panel = panel(0);
        press(&mut panel, LogicalAction::Start);
        press(&mut panel, LogicalAction::Attack);
        press(&mut panel, LogicalAction::Right);
        assert_eq!(panel.wheel().current_index(), 0);
        assert_eq!(press(&mut panel, LogicalAction::Attack), Disposition::Passed);
    }

    #[test]
    fn colour_matching_the_fill_falls_back_to_neutral() {
        let mut panel = panel(0);
        press(&mut panel, LogicalAction::Start);
        press(&mut panel, LogicalAction::Attack);
        assert_eq!(panel.icon_color(), RED);
        press(&mut panel, LogicalAction::Jump);
        assert_eq!(panel.icon_color(), Rgb::NEUTRAL);
        press(&mut panel, LogicalAction::Jump);
        assert_eq!(panel.icon_color(), BLUE);
        press(&mut panel, LogicalAction::Jump);
        assert_eq!(panel.icon_color(), RED);
    }

    #[test]
    fn shield_cycles_costumes() {
        let mut panel = panel(0);
        press(&mut panel, LogicalAction::Start);
        press(&mut panel, LogicalAction::Attack);
        for expected in [1, 2, 0] {
            press(&mut panel, LogicalAction::Shield);
            assert_eq!(panel.costume_index(), expected);
        }
    }

    #[test]
    fn confirming_another_fighter_starts_on_its_first_costume() {
        let mut panel = panel(0);
        press(&mut panel, LogicalAction::Start);
        press(&mut panel, LogicalAction::Attack);
        press(&mut panel, LogicalAction::Shield);
        press(&mut panel, LogicalAction::Shield);
        assert_eq!(panel.costume_index(), 2);

        press(&mut panel, LogicalAction::Special);
        press(&mut panel, LogicalAction::Right);
        press(&mut panel, LogicalAction::Right);
        press(&mut panel, LogicalAction::Attack);

        let entry = panel.match_entry().expect("entry");
        let brute = panel.chosen().expect("chosen");
        assert_eq!(entry.fighter_id, "brute");
        assert_eq!(entry.costume, 0);
        assert!(entry.costume < brute.costume_count);
    }

    #[test]
    fn jump_and_shield_do_nothing_while_browsing() {
        let mut panel = panel(0);
        press(&mut panel, LogicalAction::Start);
        press(&mut panel, LogicalAction::Jump);
        press(&mut panel, LogicalAction::Shield);
        assert_eq!(panel.color_index(), 0);
        assert_eq!(panel.costume_index(), 0);
    }

    #[test]
    fn special_backs_out_one_step() {
        let mut panel = panel(0);
        press(&mut panel, LogicalAction::Start);
        press(&mut panel, LogicalAction::Attack);
        press(&mut panel, LogicalAction::Special);
        assert_eq!(panel.state(), PanelState::WheelActive);
        assert!(panel.chosen().is_none());
        assert!(panel.snapshot().is_none());
        press(&mut panel, LogicalAction::Special);
        assert_eq!(panel.state(), PanelState::Closed);
    }

    #[test]
    fn snapshot_fades_to_a_floor() {
        let mut panel = panel(0);
        press(&mut panel, LogicalAction::Start);
        press(&mut panel, LogicalAction::Attack);
        for _ in 0..20 {
            panel.update();
        }
        assert_eq!(panel.snapshot().expect("snapshot").alpha, SNAPSHOT_MIN_ALPHA);
    }

    #[test]
    fn releases_are_ignored() {
        let mut panel = panel(0);
        let disposition = panel.on_action(ActionEvent {
            action: LogicalAction::Attack,
            kind: EventKind::Released,
            tick: 4,
        });
        assert_eq!(disposition, Disposition::Passed);
        assert_eq!(panel.state(), PanelState::Closed);
    }

    #[test]
    fn match_entry_needs_an_active_choice() {
        let mut panel = panel(2);
        assert!(panel.match_entry().is_none());
        press(&mut panel, LogicalAction::Start);
        assert!(panel.match_entry().is_none());
        press(&mut panel, LogicalAction::Attack);
        let entry = panel.match_entry().expect("entry");
        assert_eq!(entry.slot, 2);
        assert_eq!(entry.fighter_id, "hero");
        assert_eq!(entry.color, BLUE);
    }

    #[test]
    fn reset_after_match_keeps_closed_panels_closed() {
        let mut open = panel(0);
        press(&mut open, LogicalAction::Start);
        press(&mut open, LogicalAction::Attack);
        open.reset_after_match();
        assert_eq!(open.state(), PanelState::WheelActive);
        assert!(open.chosen().is_none());

        let mut closed = panel(1);
        closed.reset_after_match();
        assert_eq!(closed.state(), PanelState::Closed);
    }
}
