//! Conversion settings.
//!
//! A [`Settings`] value is an immutable snapshot of every user-facing
//! control. The UI layer owns mutation; the core only ever reads a settings
//! value by shared reference, so one conversion (or one whole batch) always
//! sees a single consistent snapshot.
//!
//! Every group deserializes with defaults, so a partial JSON object from the
//! UI is a valid settings value. Field names are camelCase on the wire.

use std::sync::Arc;

use ab_glyph::FontArc;
use serde::{Deserialize, Serialize};

use crate::color::HexColor;
use crate::decode::{DecodedImage, FilterType};

/// Target encoding of the converted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Png,
    /// The one supported format without an alpha channel.
    Jpeg,
    #[default]
    Webp,
}

impl OutputKind {
    pub fn has_alpha(self) -> bool {
        !matches!(self, OutputKind::Jpeg)
    }

    /// File extension, taken from the MIME subtype.
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Png => "png",
            OutputKind::Jpeg => "jpeg",
            OutputKind::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputKind::Png => "image/png",
            OutputKind::Jpeg => "image/jpeg",
            OutputKind::Webp => "image/webp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputSettings {
    pub kind: OutputKind,
    /// Quality factor (0.0 to 1.0); only lossy encoders use it.
    pub quality: f32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            kind: OutputKind::Webp,
            quality: 0.92,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Output is the size of the crop rectangle.
    #[default]
    Original,
    /// Output fits a requested pixel box.
    #[serde(rename = "pixels")]
    FixedPixels,
    /// Output is a percentage of the crop rectangle.
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResizeSettings {
    pub mode: ResizeMode,
    pub width: u32,
    pub height: u32,
    pub keep_aspect: bool,
    /// Scale factor in percent (1 to 1000).
    pub percent: f64,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            mode: ResizeMode::Original,
            width: 0,
            height: 0,
            keep_aspect: true,
            percent: 100.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeometrySettings {
    /// Clockwise rotation in degrees, wrapped modulo 360.
    pub rotation: i32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl GeometrySettings {
    /// Rotation wrapped into `0..360`.
    pub fn wrapped_rotation(&self) -> i32 {
        self.rotation.rem_euclid(360)
    }

    pub fn is_identity(&self) -> bool {
        self.wrapped_rotation() == 0 && !self.flip_horizontal && !self.flip_vertical
    }
}

/// Named aspect ratio for automatic cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectMode {
    /// Keep the source's own aspect ratio.
    #[default]
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectMode {
    /// Width / height for the named ratios, `None` for [`AspectMode::Free`].
    pub fn ratio(self) -> Option<f64> {
        match self {
            AspectMode::Free => None,
            AspectMode::Square => Some(1.0),
            AspectMode::Standard => Some(4.0 / 3.0),
            AspectMode::Widescreen => Some(16.0 / 9.0),
            AspectMode::Portrait => Some(9.0 / 16.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropSettings {
    /// Automatic focal-point cropping for items without a manual crop.
    pub enabled: bool,
    pub aspect: AspectMode,
    /// Explicit width / height ratio; takes precedence over `aspect`.
    pub preset_ratio: Option<f64>,
    /// Fill color for opaque outputs and rotated corners.
    pub background: HexColor,
}

/// Corner or center position for an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    Center,
    #[default]
    BottomRight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextWatermark {
    pub text: String,
    pub opacity: f32,
    /// Font size in pixels.
    pub font_size: f32,
    pub anchor: Anchor,
    pub margin: f32,
    /// Font face used to rasterize the text. Overrides the bundled DejaVu
    /// Sans when set.
    #[serde(skip)]
    pub font: Option<FontArc>,
}

impl Default for TextWatermark {
    fn default() -> Self {
        Self {
            text: String::new(),
            opacity: 0.25,
            font_size: 24.0,
            anchor: Anchor::BottomRight,
            margin: 16.0,
            font: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogoWatermark {
    /// Decoded logo. Shared with whoever loaded it.
    #[serde(skip)]
    pub image: Option<Arc<DecodedImage>>,
    pub opacity: f32,
    /// Logo width as a percentage of the output width.
    pub scale: f32,
    pub anchor: Anchor,
    pub margin: f32,
}

impl Default for LogoWatermark {
    fn default() -> Self {
        Self {
            image: None,
            opacity: 0.5,
            scale: 12.0,
            anchor: Anchor::BottomRight,
            margin: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnhanceSettings {
    pub enabled: bool,
    /// Contrast multiplier (0.1 to 3.0).
    pub contrast: f32,
    /// Exposure offset (-100 to 100).
    pub exposure: f32,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            contrast: 1.08,
            exposure: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SharpenSettings {
    pub enabled: bool,
    pub amount: f32,
}

impl Default for SharpenSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            amount: 0.5,
        }
    }
}

/// Complete settings snapshot for a conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub output: OutputSettings,
    pub resize: ResizeSettings,
    pub geometry: GeometrySettings,
    pub crop: CropSettings,
    pub text: TextWatermark,
    pub logo: LogoWatermark,
    pub enhance: EnhanceSettings,
    pub sharpen: SharpenSettings,
    /// Resampling filter for scaling and rotation.
    pub resample: FilterType,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the pixel filter stage has any work to do.
    pub fn filters_enabled(&self) -> bool {
        self.enhance.enabled || self.sharpen.enabled
    }
}
