//! Rotation and mirroring onto an expanded canvas.
//!
//! # Algorithm
//!
//! The rotated canvas is the bounding box of the rotated image. The source
//! surface is drawn through a single affine transform:
//!
//! ```text
//! M = T(rot_w / 2, rot_h / 2) * R(angle) * S(flip_x, flip_y) * T(-w / 2, -h / 2)
//! ```
//!
//! so the image is centered, rotated clockwise about its center and then
//! mirrored in its own (pre-rotation) axes.

use image::{Rgba, RgbaImage};

use super::affine::Affine;
use super::surface::Surface;
use crate::decode::FilterType;
use crate::settings::GeometrySettings;

/// Compute the dimensions of the bounding box for a rotated image.
///
/// `rot_w = round(w * |cos| + h * |sin|)`, `rot_h = round(w * |sin| + h * |cos|)`,
/// never smaller than one pixel.
///
/// # Example
///
/// ```
/// use imgbatch_core::transform::compute_rotated_bounds;
///
/// // 90-degree rotation swaps dimensions
/// assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let angle = angle_degrees.rem_euclid(360.0);

    // Exact quarter turns avoid floating point drift
    if angle.abs() < 0.001 || (angle - 180.0).abs() < 0.001 || (360.0 - angle).abs() < 0.001 {
        return (width.max(1), height.max(1));
    }
    if (angle - 90.0).abs() < 0.001 || (angle - 270.0).abs() < 0.001 {
        return (height.max(1), width.max(1));
    }

    let (sin, cos) = angle.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let (w, h) = (width as f64, height as f64);

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// The transform that places a `width` x `height` surface onto a canvas of
/// `canvas_w` x `canvas_h`, rotated and mirrored per `geometry`.
pub fn rotation_transform(
    width: u32,
    height: u32,
    canvas_w: u32,
    canvas_h: u32,
    geometry: &GeometrySettings,
) -> Affine {
    let flip_x = if geometry.flip_horizontal { -1.0 } else { 1.0 };
    let flip_y = if geometry.flip_vertical { -1.0 } else { 1.0 };

    Affine::translate(canvas_w as f64 / 2.0, canvas_h as f64 / 2.0)
        .multiply(&Affine::rotate_degrees(geometry.wrapped_rotation() as f64))
        .multiply(&Affine::scale(flip_x, flip_y))
        .multiply(&Affine::translate(-(width as f64) / 2.0, -(height as f64) / 2.0))
}

/// Rotate and mirror `source` onto a new canvas sized to fit it.
///
/// The canvas is filled with `background` first (transparent for `None`);
/// corners uncovered by a non-right-angle rotation keep that fill.
pub fn rotate_flip(
    source: &RgbaImage,
    geometry: &GeometrySettings,
    background: Option<Rgba<u8>>,
    filter: FilterType,
) -> Surface {
    let (width, height) = source.dimensions();
    let (canvas_w, canvas_h) = compute_rotated_bounds(width, height, geometry.wrapped_rotation() as f64);

    let mut canvas = Surface::with_background(canvas_w, canvas_h, background);
    let transform = rotation_transform(width, height, canvas_w, canvas_h, geometry);
    canvas.draw_image(source, &transform, filter);
    canvas
}
