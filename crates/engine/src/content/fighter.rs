use std::fmt;
use std::path::{Path, PathBuf};

use image::ImageReader;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid colour '{0}'; expected #rrggbb")]
pub struct ColorParseError(pub String);

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const NEUTRAL: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse(raw: &str) -> Result<Self, ColorParseError> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| ColorParseError(trimmed.to_string()))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError(trimmed.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub const fn rgba(self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Rgb::parse(&raw)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Decoded RGBA8 image.
#[derive(Clone, PartialEq, Eq)]
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

pub const PLACEHOLDER_ICON_SIZE: u32 = 32;

impl Sprite {
    pub fn load(path: &Path) -> Result<Self, String> {
        let reader =
            ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
        let decoded = reader
            .decode()
            .map_err(|error| format!("decode_failed:{error}"))?;
        let image = decoded.to_rgba8();
        Ok(Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        })
    }

    /// Solid square with a one-pixel dark border.
    pub fn placeholder(size: u32, color: Rgb) -> Self {
        let size = size.max(2);
        let mut rgba = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let edge = x == 0 || y == 0 || x == size - 1 || y == size - 1;
                let pixel = if edge {
                    [24, 24, 24, 255]
                } else {
                    color.rgba(255)
                };
                rgba.extend_from_slice(&pixel);
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }
}

/// Immutable description of one selectable fighter.
#[derive(Debug, Clone, PartialEq)]
pub struct FighterDescriptor {
    pub id: String,
    pub name: String,
    pub source_dir: PathBuf,
    pub css_icon: Sprite,
    pub franchise_icon: Sprite,
    pub palette: Vec<Rgb>,
    pub costume_count: u32,
}

impl FighterDescriptor {
    /// Palette entry for a colour index, wrapping around.
    pub fn palette_color(&self, color_index: usize) -> Rgb {
        if self.palette.is_empty() {
            return Rgb::NEUTRAL;
        }
        self.palette[color_index % self.palette.len()]
    }

    /// Builds a descriptor with placeholder art, for tests and tooling.
    pub fn placeholder(id: &str, name: &str, palette: Vec<Rgb>, costume_count: u32) -> Self {
        let base = palette.first().copied().unwrap_or(Rgb::NEUTRAL);
        Self {
            id: id.to_string(),
            name: name.to_string(),
            source_dir: PathBuf::new(),
            css_icon: Sprite::placeholder(PLACEHOLDER_ICON_SIZE, base),
            franchise_icon: Sprite::placeholder(PLACEHOLDER_ICON_SIZE, Rgb::NEUTRAL),
            palette,
            costume_count: costume_count.max(1),
        }
    }
}
