//! Color values for items and annotations.

use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concrete RGBA8 color, serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Self::opaque(
                byte(&hex[0..1])? * 17,
                byte(&hex[1..2])? * 17,
                byte(&hex[2..3])? * 17,
            )),
            6 => Some(Self::opaque(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
            8 => Some(Self::new(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                byte(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s).ok_or(ColorParseError(s))
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// A color as authored on the board.
///
/// Colors picked from the palette are usually theme references (`var(--home)`)
/// so the live board follows the active theme. They must be resolved to
/// [`Rgba`] before anything leaves the editor, see `tactica_render::Theme`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColorRef {
    /// A concrete color.
    Rgba(Rgba),
    /// A named theme variable.
    Theme(String),
}

impl ColorRef {
    pub fn theme(name: impl Into<String>) -> Self {
        Self::Theme(name.into())
    }

    pub fn is_theme(&self) -> bool {
        matches!(self, Self::Theme(_))
    }
}

impl Default for ColorRef {
    fn default() -> Self {
        Self::Rgba(Rgba::BLACK)
    }
}

impl From<Rgba> for ColorRef {
    fn from(color: Rgba) -> Self {
        Self::Rgba(color)
    }
}

impl fmt::Display for ColorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgba(c) => f.write_str(&c.to_hex()),
            Self::Theme(name) => write!(f, "var(--{name})"),
        }
    }
}

/// Error for unparseable color strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color: {0}")]
pub struct ColorParseError(pub String);

impl FromStr for ColorRef {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix("var(--").and_then(|rest| rest.strip_suffix(')')) {
            if name.is_empty() {
                return Err(ColorParseError(s.to_string()));
            }
            return Ok(Self::Theme(name.to_string()));
        }
        Rgba::from_hex(s)
            .map(Self::Rgba)
            .ok_or_else(|| ColorParseError(s.to_string()))
    }
}

impl TryFrom<String> for ColorRef {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColorRef> for String {
    fn from(value: ColorRef) -> Self {
        value.to_string()
    }
}
