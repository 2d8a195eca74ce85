mod fighter;
mod roster;

pub use fighter::{ColorParseError, FighterDescriptor, Rgb, Sprite, PLACEHOLDER_ICON_SIZE};
pub use roster::{
    load_fighter, load_roster, FighterErrorCode, FighterLoadError, RosterError, RosterLoad,
    SourceLocation, FIGHTER_FILE_NAME,
};
