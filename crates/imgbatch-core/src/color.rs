//! Background color parsing.
//!
//! Colors arrive as CSS-style hex strings. Only the 6-digit (`#RRGGBB`) and
//! 8-digit (`#RRGGBBAA`) forms are accepted; the digit count alone decides
//! whether the color is "solid" for the background fill rule.

use image::Rgba;
use log::warn;
use serde::{Deserialize, Serialize};

/// A parsed hex color that remembers which textual form it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HexColor {
    rgba: [u8; 4],
    embedded_alpha: bool,
}

impl Default for HexColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl HexColor {
    pub const BLACK: HexColor = HexColor {
        rgba: [0, 0, 0, 255],
        embedded_alpha: false,
    };

    /// Parse `#RRGGBB` or `#RRGGBBAA`; the leading `#` is optional.
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self {
                rgba: [byte(0)?, byte(2)?, byte(4)?, 255],
                embedded_alpha: false,
            }),
            8 => Some(Self {
                rgba: [byte(0)?, byte(2)?, byte(4)?, byte(6)?],
                embedded_alpha: true,
            }),
            _ => None,
        }
    }

    /// True for the 6-digit form, which carries no alpha channel.
    pub fn is_solid(&self) -> bool {
        !self.embedded_alpha
    }

    /// The color as written, including any embedded alpha.
    pub fn rgba(&self) -> Rgba<u8> {
        Rgba(self.rgba)
    }

    /// The RGB part at full opacity.
    pub fn opaque(&self) -> Rgba<u8> {
        let [r, g, b, _] = self.rgba;
        Rgba([r, g, b, 255])
    }
}

impl From<String> for HexColor {
    fn from(value: String) -> Self {
        HexColor::parse(&value).unwrap_or_else(|| {
            warn!("Unrecognized background color '{value}', using #000000");
            HexColor::BLACK
        })
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        let [r, g, b, a] = color.rgba;
        if color.embedded_alpha {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}")
        }
    }
}
