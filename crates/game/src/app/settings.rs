use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use brawl_engine::{
    DeviceBinding, DeviceSelector, KeyCode, LogicalAction, Rgb, TimingWindowConfig,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_ENV_VAR: &str = "BRAWL_SETTINGS";
pub const PLAYER_SLOTS: usize = 4;
const DEFAULT_PROFILE_NAME: &str = "default";

const DEFAULT_PLAYER_COLORS: [Rgb; PLAYER_SLOTS] = [
    Rgb::new(0xd0, 0x30, 0x30),
    Rgb::new(0x30, 0x50, 0xd0),
    Rgb::new(0xe0, 0xc0, 0x20),
    Rgb::new(0x30, 0xa0, 0x40),
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings {path} at {at}: {source}")]
    Parse {
        path: PathBuf,
        at: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Brawl".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerControls {
    pub binding: DeviceBinding,
    pub timing: Arc<TimingWindowConfig>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub window: WindowSettings,
    pub player_colors: [Rgb; PLAYER_SLOTS],
    pub players: [PlayerControls; PLAYER_SLOTS],
}

impl Default for Settings {
    fn default() -> Self {
        resolve_settings(RawSettings::default())
    }
}

/// Reads the settings file. A missing file yields defaults; an unreadable or
/// malformed one is an error the caller may recover from.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "settings_missing_using_defaults");
            return Ok(Settings::default());
        }
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let parsed = parse_settings_json(&raw).map_err(|(at, source)| SettingsError::Parse {
        path: path.to_path_buf(),
        at,
        source,
    })?;
    info!(path = %path.display(), "settings_loaded");
    Ok(resolve_settings(parsed))
}

pub fn settings_path(settings_dir: &Path) -> PathBuf {
    std::env::var_os(SETTINGS_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| settings_dir.join(SETTINGS_FILE_NAME))
}

fn parse_settings_json(raw: &str) -> Result<RawSettings, (String, serde_json::Error)> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, RawSettings>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let at = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        (at, error.into_inner())
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSettings {
    window: RawWindow,
    player_colors: Vec<Rgb>,
    controls: Vec<RawControls>,
    gamepads: BTreeMap<String, RawGamepadProfile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawWindow {
    title: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawDevice {
    #[default]
    Keyboard,
    Gamepad,
    None,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawControls {
    device: RawDevice,
    gamepad: Option<String>,
    occurrence: usize,
    keys: BTreeMap<String, Vec<KeyCode>>,
    smash_window: Option<Value>,
    repeat_window: Option<Value>,
    buffer_window: Option<Value>,
    smoothing_window: Option<Value>,
    repeat_steps: Option<Vec<u32>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGamepadProfile {
    /// Axis index to `[negative, positive]` action names.
    axes: BTreeMap<u32, [Option<String>; 2]>,
    buttons: BTreeMap<u32, String>,
    deadzone: Option<f32>,
    threshold: Option<f32>,
}

fn resolve_settings(raw: RawSettings) -> Settings {
    let defaults = WindowSettings::default();
    let window = WindowSettings {
        title: raw.window.title.unwrap_or(defaults.title),
        width: raw.window.width.filter(|w| *w > 0).unwrap_or(defaults.width),
        height: raw.window.height.filter(|h| *h > 0).unwrap_or(defaults.height),
    };

    let mut player_colors = DEFAULT_PLAYER_COLORS;
    for (slot, color) in raw.player_colors.iter().take(PLAYER_SLOTS).enumerate() {
        player_colors[slot] = *color;
    }

    let players = std::array::from_fn(|slot| match raw.controls.get(slot) {
        Some(controls) => resolve_controls(slot, controls, &raw.gamepads),
        None => resolve_controls(slot, &default_controls(slot), &raw.gamepads),
    });

    Settings {
        window,
        player_colors,
        players,
    }
}

fn resolve_controls(
    slot: usize,
    controls: &RawControls,
    profiles: &BTreeMap<String, RawGamepadProfile>,
) -> PlayerControls {
    let binding = match controls.device {
        RawDevice::Keyboard => {
            let mut binding = DeviceBinding::new(DeviceSelector::Keyboard);
            for (action_name, keys) in &controls.keys {
                let Some(action) = parse_action(slot, action_name) else {
                    continue;
                };
                for key in keys {
                    binding = binding.with_key(*key, action);
                }
            }
            binding
        }
        RawDevice::Gamepad => {
            let selector = DeviceSelector::Gamepad {
                name: controls.gamepad.clone(),
                occurrence: controls.occurrence,
            };
            let profile = controls
                .gamepad
                .as_deref()
                .and_then(|name| profiles.get(name))
                .or_else(|| profiles.get(DEFAULT_PROFILE_NAME));
            match profile {
                Some(profile) => gamepad_binding(slot, selector, profile),
                None => gamepad_binding(slot, selector, &default_gamepad_profile()),
            }
        }
        RawDevice::None => DeviceBinding::unassigned(),
    };

    PlayerControls {
        binding,
        timing: Arc::new(resolve_timing(slot, controls)),
    }
}

fn gamepad_binding(
    slot: usize,
    selector: DeviceSelector,
    profile: &RawGamepadProfile,
) -> DeviceBinding {
    let mut binding = DeviceBinding::new(selector);
    for (axis, [negative, positive]) in &profile.axes {
        let negative = negative.as_deref().and_then(|name| parse_action(slot, name));
        let positive = positive.as_deref().and_then(|name| parse_action(slot, name));
        binding = binding.with_axis(*axis, negative, positive);
    }
    for (button, action_name) in &profile.buttons {
        if let Some(action) = parse_action(slot, action_name) {
            binding = binding.with_button(*button, action);
        }
    }
    if let Some(deadzone) = profile.deadzone {
        binding = binding.with_deadzone(deadzone);
    }
    if let Some(threshold) = profile.threshold {
        binding = binding.with_axis_threshold(threshold);
    }
    binding
}

fn parse_action(slot: usize, name: &str) -> Option<LogicalAction> {
    match name.parse::<LogicalAction>() {
        Ok(action) => Some(action),
        Err(error) => {
            warn!(slot, error = %error, "settings_binding_skipped");
            None
        }
    }
}

fn resolve_timing(slot: usize, controls: &RawControls) -> TimingWindowConfig {
    let defaults = TimingWindowConfig::default();
    let smash = timing_field(
        slot,
        "smash_window",
        controls.smash_window.as_ref(),
        defaults.smash_window(),
    );
    let repeat = timing_field(
        slot,
        "repeat_window",
        controls.repeat_window.as_ref(),
        defaults.repeat_window(),
    );
    let buffer = timing_field(
        slot,
        "buffer_window",
        controls.buffer_window.as_ref(),
        defaults.buffer_window(),
    );
    let smoothing = timing_field(
        slot,
        "smoothing_window",
        controls.smoothing_window.as_ref(),
        defaults.smoothing_window(),
    );

    // Each field was already checked, so construction only fails on overflow.
    let config = match TimingWindowConfig::new(smash, repeat, buffer, smoothing) {
        Ok(config) => config,
        Err(error) => {
            warn!(slot, error = %error, "settings_timing_invalid_using_defaults");
            return defaults;
        }
    };
    let Some(steps) = controls.repeat_steps.clone() else {
        return config;
    };
    match config.clone().with_repeat_steps(steps) {
        Ok(config) => config,
        Err(error) => {
            warn!(slot, error = %error, "settings_repeat_steps_invalid_using_defaults");
            config
        }
    }
}

fn timing_field(slot: usize, field: &'static str, value: Option<&Value>, default: u32) -> i64 {
    let Some(value) = value else {
        return i64::from(default);
    };
    match value.as_i64() {
        Some(ticks) if ticks >= 0 && ticks <= i64::from(u32::MAX) => ticks,
        _ => {
            warn!(
                slot,
                field,
                value = %value,
                fallback = default,
                "settings_timing_field_invalid"
            );
            i64::from(default)
        }
    }
}

fn default_controls(slot: usize) -> RawControls {
    let keys: &[(LogicalAction, KeyCode)] = match slot {
        0 => &[
            (LogicalAction::Left, KeyCode::ArrowLeft),
            (LogicalAction::Right, KeyCode::ArrowRight),
            (LogicalAction::Up, KeyCode::ArrowUp),
            (LogicalAction::Down, KeyCode::ArrowDown),
            (LogicalAction::Attack, KeyCode::KeyZ),
            (LogicalAction::Special, KeyCode::KeyX),
            (LogicalAction::Jump, KeyCode::KeyC),
            (LogicalAction::Shield, KeyCode::KeyV),
            (LogicalAction::Start, KeyCode::Enter),
        ],
        1 => &[
            (LogicalAction::Left, KeyCode::KeyA),
            (LogicalAction::Right, KeyCode::KeyD),
            (LogicalAction::Up, KeyCode::KeyW),
            (LogicalAction::Down, KeyCode::KeyS),
            (LogicalAction::Attack, KeyCode::KeyF),
            (LogicalAction::Special, KeyCode::KeyG),
            (LogicalAction::Jump, KeyCode::KeyH),
            (LogicalAction::Shield, KeyCode::KeyJ),
            (LogicalAction::Start, KeyCode::Space),
        ],
        _ => {
            return RawControls {
                device: RawDevice::Gamepad,
                occurrence: slot - 2,
                ..RawControls::default()
            }
        }
    };
    RawControls {
        device: RawDevice::Keyboard,
        keys: keys
            .iter()
            .map(|(action, key)| (action.name().to_string(), vec![*key]))
            .collect(),
        ..RawControls::default()
    }
}

fn default_gamepad_profile() -> RawGamepadProfile {
    let action = |action: LogicalAction| action.name().to_string();
    RawGamepadProfile {
        axes: BTreeMap::from([
            (0, [Some(action(LogicalAction::Left)), Some(action(LogicalAction::Right))]),
            (1, [Some(action(LogicalAction::Up)), Some(action(LogicalAction::Down))]),
        ]),
        buttons: BTreeMap::from([
            (0, action(LogicalAction::Attack)),
            (1, action(LogicalAction::Special)),
            (3, action(LogicalAction::Jump)),
            (4, action(LogicalAction::Shield)),
            (5, action(LogicalAction::Shield)),
            (9, action(LogicalAction::Start)),
            (12, action(LogicalAction::Up)),
            (13, action(LogicalAction::Down)),
            (14, action(LogicalAction::Left)),
            (15, action(LogicalAction::Right)),
        ]),
        deadzone: None,
        threshold: None,
    }
}
