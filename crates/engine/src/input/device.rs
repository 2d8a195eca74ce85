use std::collections::HashSet;

use winit::keyboard::KeyCode;

/// One gamepad's state as seen on a single tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PadState {
    pub name: String,
    pub connected: bool,
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
}

impl PadState {
    pub fn button(&self, index: u32) -> bool {
        self.buttons.get(index as usize).copied().unwrap_or(false)
    }

    pub fn axis(&self, index: u32) -> f32 {
        self.axes.get(index as usize).copied().unwrap_or(0.0)
    }
}

/// Everything the devices reported for one simulation tick.
#[derive(Debug, Clone, Default)]
pub struct RawInputFrame {
    pub keys_down: HashSet<KeyCode>,
    pub pads: Vec<PadState>,
    pub quit_requested: bool,
    pub cancel_pressed: bool,
}

impl RawInputFrame {
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Finds the `occurrence`-th connected pad whose name matches, or any pad when
    /// `name` is `None`. Pads sharing a name are told apart by occurrence.
    pub fn find_pad(&self, name: Option<&str>, occurrence: usize) -> Option<&PadState> {
        self.pads
            .iter()
            .filter(|pad| pad.connected)
            .filter(|pad| name.map_or(true, |wanted| pad.name == wanted))
            .nth(occurrence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(name: &str, connected: bool) -> PadState {
        PadState {
            name: name.to_string(),
            connected,
            buttons: vec![false; 4],
            axes: vec![0.0; 2],
        }
    }

    #[test]
    fn find_pad_skips_disconnected_and_counts_occurrences() {
        let frame = RawInputFrame {
            pads: vec![
                pad("Pro Controller", false),
                pad("Pro Controller", true),
                pad("Arcade Stick", true),
                pad("Pro Controller", true),
            ],
            ..RawInputFrame::default()
        };

        let first = frame.find_pad(Some("Pro Controller"), 0).expect("first");
        assert!(first.connected);
        assert!(std::ptr::eq(first, &frame.pads[1]));
        let second = frame.find_pad(Some("Pro Controller"), 1).expect("second");
        assert!(std::ptr::eq(second, &frame.pads[3]));
        assert!(frame.find_pad(Some("Pro Controller"), 2).is_none());

        let any_second = frame.find_pad(None, 1).expect("any");
        assert_eq!(any_second.name, "Arcade Stick");
    }

    #[test]
    fn out_of_range_indices_read_as_neutral() {
        let state = pad("Pad", true);
        assert!(!state.button(40));
        assert_eq!(state.axis(9), 0.0);
    }
}
