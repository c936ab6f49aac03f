//! Per-item conversion errors.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

/// Why one image could not be converted.
///
/// In a batch each failure is recorded against its item and the remaining
/// items still run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source bytes are not a decodable image.
    #[error("Could not decode source image: {0}")]
    DecodeFailure(#[from] DecodeError),

    /// The finished surface could not be serialized.
    #[error("Could not encode output image: {0}")]
    EncodeFailure(#[from] EncodeError),

    /// The manual crop has no area inside the source.
    #[error("Crop {width}x{height} at ({x}, {y}) has no area inside the {source_width}x{source_height} source")]
    InvalidCropRequest {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        source_width: u32,
        source_height: u32,
    },

    /// The output surface would be too large to allocate.
    #[error("Output size {width}x{height} exceeds the supported pixel count")]
    InvalidResizeRequest { width: u32, height: u32 },
}

impl ConvertError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::DecodeFailure(_) => "DecodeFailure",
            ConvertError::EncodeFailure(_) => "EncodeFailure",
            ConvertError::InvalidCropRequest { .. } => "InvalidCropRequest",
            ConvertError::InvalidResizeRequest { .. } => "InvalidResizeRequest",
        }
    }
}
