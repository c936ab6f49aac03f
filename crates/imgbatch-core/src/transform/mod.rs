//! Surface drawing and geometric transforms.
//!
//! # Transform Order
//!
//! When converting an image, transforms are applied in this order:
//! 1. Crop and scale into a target-size surface
//! 2. Rotation and mirroring onto an expanded canvas
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = clockwise
//! - Coordinates are in pixels, origin at the top-left corner
//! - Pixel `(i, j)` covers `[i, i + 1) x [j, j + 1)`

mod affine;
mod crop;
mod rotation;
mod surface;

pub use affine::Affine;
pub use crop::render_crop;
pub use rotation::{compute_rotated_bounds, rotate_flip, rotation_transform};
pub use surface::Surface;
