use std::sync::Arc;

use brawl_engine::FighterDescriptor;
use thiserror::Error;

pub const VISIBLE_SLOTS: usize = 9;
pub const CENTER_SLOT: usize = VISIBLE_SLOTS / 2;
pub const CENTER_ALPHA: u8 = 255;
pub const SIDE_ALPHA: u8 = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WheelError {
    #[error("fighter wheel needs at least one fighter")]
    EmptyRoster,
}

/// Circular view over the shared roster, centred on the current fighter.
#[derive(Debug, Clone)]
pub struct FighterWheel {
    fighters: Arc<[FighterDescriptor]>,
    current_index: usize,
    visible: [usize; VISIBLE_SLOTS],
    alpha: [u8; VISIBLE_SLOTS],
}

impl FighterWheel {
    pub fn new(fighters: Arc<[FighterDescriptor]>) -> Result<Self, WheelError> {
        if fighters.is_empty() {
            return Err(WheelError::EmptyRoster);
        }
        let mut wheel = Self {
            fighters,
            current_index: 0,
            visible: [0; VISIBLE_SLOTS],
            alpha: [SIDE_ALPHA; VISIBLE_SLOTS],
        };
        wheel.refresh();
        Ok(wheel)
    }

    pub fn len(&self) -> usize {
        self.fighters.len()
    }

    pub fn fighters(&self) -> &Arc<[FighterDescriptor]> {
        &self.fighters
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &FighterDescriptor {
        &self.fighters[self.current_index]
    }

    /// Roster indices shown left to right; the middle entry is the current fighter.
    pub fn visible(&self) -> &[usize; VISIBLE_SLOTS] {
        &self.visible
    }

    pub fn alpha(&self) -> &[u8; VISIBLE_SLOTS] {
        &self.alpha
    }

    pub fn change_selected(&mut self, delta: i32) {
        self.current_index = self.wrap(delta as isize);
        self.refresh();
    }

    pub fn fighter_at(&self, offset: isize) -> &FighterDescriptor {
        &self.fighters[self.wrap(offset)]
    }

    fn wrap(&self, offset: isize) -> usize {
        let len = self.fighters.len() as isize;
        (self.current_index as isize + offset).rem_euclid(len) as usize
    }

    fn refresh(&mut self) {
        for (slot, offset) in (-(CENTER_SLOT as isize)..=CENTER_SLOT as isize).enumerate() {
            self.visible[slot] = self.wrap(offset);
            self.alpha[slot] = if slot == CENTER_SLOT {
                CENTER_ALPHA
            } else {
                SIDE_ALPHA
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use brawl_engine::Rgb;

    use super::*;

    fn roster(count: usize) -> Arc<[FighterDescriptor]> {
        (0..count)
            .map(|index| {
                FighterDescriptor::placeholder(
                    &format!("f{index}"),
                    &format!("Fighter {index}"),
                    vec![Rgb::new(200, 0, 0)],
                    1,
                )
            })
            .collect()
    }

    #[test]
    fn empty_roster_is_rejected() {
        assert_eq!(
            FighterWheel::new(roster(0)).err(),
            Some(WheelError::EmptyRoster)
        );
    }

    #[test]
    fn index_stays_in_range_for_any_rotation() {
        for count in 1..6 {
            let mut wheel = FighterWheel::new(roster(count)).expect("wheel");
            for delta in [1, 1, -1, -1, -1, 5, -7, 13, -2] {
                wheel.change_selected(delta);
                assert!(wheel.current_index() < count);
                assert_eq!(wheel.fighter_at(0).id, wheel.current().id);
            }
        }
    }

    #[test]
    fn fighter_at_wraps_negative_offsets() {
        let wheel = FighterWheel::new(roster(3)).expect("wheel");
        assert_eq!(wheel.fighter_at(-1).id, "f2");
        assert_eq!(wheel.fighter_at(-4).id, "f2");
        assert_eq!(wheel.fighter_at(4).id, "f1");
    }

    #[test]
    fn forward_then_back_restores_the_window() {
        let mut wheel = FighterWheel::new(roster(5)).expect("wheel");
        wheel.change_selected(2);
        let before = (wheel.current_index(), *wheel.visible());
        wheel.change_selected(1);
        wheel.change_selected(-1);
        assert_eq!((wheel.current_index(), *wheel.visible()), before);
    }

    #[test]
    fn visible_window_is_centred_on_current() {
        let mut wheel = FighterWheel::new(roster(4)).expect("wheel");
        wheel.change_selected(1);
        assert_eq!(wheel.visible(), &[1, 2, 3, 0, 1, 2, 3, 0, 1]);
        assert_eq!(wheel.alpha()[CENTER_SLOT], CENTER_ALPHA);
        assert_eq!(wheel.alpha()[0], SIDE_ALPHA);
    }

    #[test]
    fn single_fighter_fills_every_slot() {
        let mut wheel = FighterWheel::new(roster(1)).expect("wheel");
        wheel.change_selected(-3);
        assert_eq!(wheel.visible(), &[0; VISIBLE_SLOTS]);
    }
}
