//! RGBA drawing surface with source-over compositing.
//!
//! All draw calls take straight (non-premultiplied) RGBA input and blend it
//! over the existing contents. Resampling during transformed draws is done
//! on premultiplied values so transparent neighbours do not bleed color.

use image::{GrayImage, Rgba, RgbaImage};
use log::debug;

use super::affine::Affine;
use crate::decode::FilterType;
use crate::filter::clamp8;

/// A drawable RGBA canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// A fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// A surface pre-filled with `background`, or transparent for `None`.
    pub fn with_background(width: u32, height: u32, background: Option<Rgba<u8>>) -> Self {
        match background {
            Some(color) => Self {
                image: RgbaImage::from_pixel(width, height, color),
            },
            None => Self::new(width, height),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Blend one straight-alpha color over the pixel at `(x, y)`.
    ///
    /// `color` holds 0-255 channel values and a 0.0-1.0 alpha.
    #[inline]
    fn blend_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let sa = color[3].clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x, y);
        if sa >= 1.0 {
            *dst = Rgba([clamp8(color[0]), clamp8(color[1]), clamp8(color[2]), 255]);
            return;
        }

        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let mut out = [0u8; 4];
        for c in 0..3 {
            out[c] = clamp8((color[c] * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a);
        }
        out[3] = clamp8(out_a * 255.0);
        *dst = Rgba(out);
    }

    /// Draw `src` at an integer offset, scaled by `opacity`.
    ///
    /// Parts falling outside the surface are clipped.
    pub fn draw_at(&mut self, src: &RgbaImage, x: i64, y: i64, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        let (dw, dh) = (self.width() as i64, self.height() as i64);

        for (sx, sy, p) in src.enumerate_pixels() {
            let (tx, ty) = (x + sx as i64, y + sy as i64);
            if tx < 0 || ty < 0 || tx >= dw || ty >= dh {
                continue;
            }
            let alpha = p[3] as f32 / 255.0 * opacity;
            self.blend_pixel(
                tx as u32,
                ty as u32,
                [p[0] as f32, p[1] as f32, p[2] as f32, alpha],
            );
        }
    }

    /// Draw `src` through `transform`, which maps source pixel space onto
    /// this surface.
    ///
    /// Every destination pixel whose center maps inside the source is
    /// resampled with `filter` and blended over the current contents.
    pub fn draw_image(&mut self, src: &RgbaImage, transform: &Affine, filter: FilterType) {
        let Some(inverse) = transform.invert() else {
            debug!("skipping draw through a singular transform");
            return;
        };
        let (sw, sh) = (src.width() as f64, src.height() as f64);
        if sw == 0.0 || sh == 0.0 {
            return;
        }

        // Only visit the destination bounding box of the source rectangle
        let corners = [(0.0, 0.0), (sw, 0.0), (0.0, sh), (sw, sh)].map(|(x, y)| transform.apply(x, y));
        let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        let x_start = min_x.floor().max(0.0) as u32;
        let y_start = min_y.floor().max(0.0) as u32;
        let x_end = (max_x.ceil().max(0.0) as u32).min(self.width());
        let y_end = (max_y.ceil().max(0.0) as u32).min(self.height());

        for y in y_start..y_end {
            for x in x_start..x_end {
                let (u, v) = inverse.apply(x as f64 + 0.5, y as f64 + 0.5);
                if u < 0.0 || v < 0.0 || u >= sw || v >= sh {
                    continue;
                }
                let premultiplied = match filter {
                    FilterType::Nearest => sample_nearest(src, u, v),
                    FilterType::Bilinear => sample_bilinear(src, u - 0.5, v - 0.5),
                    FilterType::Lanczos3 => sample_lanczos3(src, u - 0.5, v - 0.5),
                };
                self.blend_pixel(x, y, unpremultiply(premultiplied));
            }
        }
    }

    /// Blend a solid color through a coverage mask whose top-left corner
    /// sits at `(left, top)`.
    ///
    /// Each pixel's alpha is `opacity * coverage / 255`; mask pixels off the
    /// surface are ignored.
    pub fn blend_mask(&mut self, mask: &GrayImage, left: i64, top: i64, color: [u8; 3], opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        let (width, height) = (self.image.width() as i64, self.image.height() as i64);
        let rgb = color.map(|c| c as f32);
        for (x, y, coverage) in mask.enumerate_pixels() {
            if coverage[0] == 0 {
                continue;
            }
            let (dx, dy) = (left + x as i64, top + y as i64);
            if dx < 0 || dy < 0 || dx >= width || dy >= height {
                continue;
            }
            let alpha = opacity * coverage[0] as f32 / 255.0;
            self.blend_pixel(dx as u32, dy as u32, [rgb[0], rgb[1], rgb[2], alpha]);
        }
    }
}

/// Premultiplied pixel as f32, 0-255 scale on every channel.
#[inline]
fn premultiplied(image: &RgbaImage, x: i64, y: i64) -> [f32; 4] {
    let cx = x.clamp(0, image.width() as i64 - 1) as u32;
    let cy = y.clamp(0, image.height() as i64 - 1) as u32;
    let p = image.get_pixel(cx, cy);
    let a = p[3] as f32 / 255.0;
    [p[0] as f32 * a, p[1] as f32 * a, p[2] as f32 * a, p[3] as f32]
}

#[inline]
fn unpremultiply(p: [f32; 4]) -> [f32; 4] {
    let a = p[3].clamp(0.0, 255.0);
    if a <= 0.0 {
        return [0.0, 0.0, 0.0, 0.0];
    }
    let scale = 255.0 / a;
    [
        (p[0] * scale).clamp(0.0, 255.0),
        (p[1] * scale).clamp(0.0, 255.0),
        (p[2] * scale).clamp(0.0, 255.0),
        a / 255.0,
    ]
}

/// `u`, `v` are continuous coordinates (pixel `i` spans `[i, i + 1)`).
fn sample_nearest(image: &RgbaImage, u: f64, v: f64) -> [f32; 4] {
    premultiplied(image, u.floor() as i64, v.floor() as i64)
}

/// `x`, `y` are pixel-center coordinates; edges are clamped.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> [f32; 4] {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = premultiplied(image, x0, y0);
    let p10 = premultiplied(image, x0 + 1, y0);
    let p01 = premultiplied(image, x0, y0 + 1);
    let p11 = premultiplied(image, x0 + 1, y0 + 1);

    let mut out = [0.0f32; 4];
    for i in 0..4 {
        out[i] = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
    }
    out
}

/// Lanczos3 over a 6x6 neighbourhood with clamped edges.
fn sample_lanczos3(image: &RgbaImage, x: f64, y: f64) -> [f32; 4] {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        let py = y0 + ky;
        let wy = lanczos_weight(y - py as f64, 3.0);
        if wy == 0.0 {
            continue;
        }
        for kx in -2..=3 {
            let px = x0 + kx;
            let weight = lanczos_weight(x - px as f64, 3.0) * wy;
            if weight == 0.0 {
                continue;
            }
            let p = premultiplied(image, px, py);
            for i in 0..4 {
                sum[i] += p[i] as f64 * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        return sample_bilinear(image, x, y);
    }
    let a = (sum[3] / weight_sum).clamp(0.0, 255.0);
    let mut out = [0.0f32; 4];
    for i in 0..3 {
        // Ringing can push color above the coverage it belongs to
        out[i] = (sum[i] / weight_sum).clamp(0.0, a) as f32;
    }
    out[3] = a as f32;
    out
}

/// `sinc(x) * sinc(x / a)` for `|x| < a`, zero outside.
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }
    let pi_x = std::f64::consts::PI * x;
    (a * pi_x.sin() * (pi_x / a).sin()) / (pi_x * pi_x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn test_with_background() {
        let s = Surface::with_background(3, 2, Some(Rgba([1, 2, 3, 255])));
        assert!(s.image().pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
        let t = Surface::with_background(3, 2, None);
        assert!(t.image().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_identity_draw_copies_pixels() {
        let src = checker(5, 4);
        for filter in [FilterType::Nearest, FilterType::Bilinear, FilterType::Lanczos3] {
            let mut s = Surface::new(5, 4);
            s.draw_image(&src, &Affine::IDENTITY, filter);
            assert_eq!(s.image(), &src, "filter {filter:?}");
        }
    }

    #[test]
    fn test_translated_draw_is_clipped() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]));
        let mut s = Surface::new(4, 4);
        s.draw_image(&src, &Affine::translate(2.0, 2.0), FilterType::Nearest);
        assert_eq!(s.image().get_pixel(1, 1)[3], 0);
        assert_eq!(s.image().get_pixel(2, 2), &Rgba([9, 9, 9, 255]));
        assert_eq!(s.image().get_pixel(3, 3), &Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_singular_transform_draws_nothing() {
        let src = checker(2, 2);
        let mut s = Surface::new(2, 2);
        s.draw_image(&src, &Affine::scale(0.0, 0.0), FilterType::Bilinear);
        assert!(s.image().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_half_alpha_blend_over_opaque() {
        let mut s = Surface::with_background(1, 1, Some(Rgba([0, 0, 0, 255])));
        let src = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        s.draw_at(&src, 0, 0, 0.5);
        let p = s.image().get_pixel(0, 0);
        assert_eq!(p[3], 255);
        assert!((127..=128).contains(&p[0]));
    }

    #[test]
    fn test_blend_over_transparent_keeps_color() {
        let mut s = Surface::new(1, 1);
        let src = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 128]));
        s.draw_at(&src, 0, 0, 1.0);
        assert_eq!(s.image().get_pixel(0, 0), &Rgba([200, 100, 50, 128]));
    }

    #[test]
    fn test_draw_at_clips_negative_offset() {
        let mut s = Surface::new(3, 3);
        let src = RgbaImage::from_pixel(2, 2, Rgba([7, 7, 7, 255]));
        s.draw_at(&src, -1, -1, 1.0);
        assert_eq!(s.image().get_pixel(0, 0), &Rgba([7, 7, 7, 255]));
        assert_eq!(s.image().get_pixel(1, 1)[3], 0);
    }

    #[test]
    fn test_zero_opacity_is_noop() {
        let mut s = Surface::with_background(2, 2, Some(Rgba([5, 5, 5, 255])));
        let before = s.clone();
        s.draw_at(&checker(2, 2), 0, 0, 0.0);
        assert_eq!(s, before);
    }

    #[test]
    fn test_blend_mask() {
        let mut s = Surface::with_background(2, 1, Some(Rgba([0, 0, 0, 255])));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, image::Luma([255]));
        s.blend_mask(&mask, 0, 0, [255, 255, 255], 1.0);
        assert_eq!(s.image().get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(s.image().get_pixel(1, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_blend_mask_offset_clips() {
        let mut s = Surface::with_background(3, 2, Some(Rgba([0, 0, 0, 255])));
        let mask = GrayImage::from_pixel(2, 2, image::Luma([255]));
        s.blend_mask(&mask, 2, -1, [255, 0, 0], 1.0);
        assert_eq!(s.image().get_pixel(2, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(s.image().get_pixel(2, 1), &Rgba([0, 0, 0, 255]));
        assert_eq!(s.image().get_pixel(1, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_bilinear_does_not_bleed_transparent_color() {
        // Opaque red next to fully transparent green
        let mut src = RgbaImage::new(2, 1);
        src.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([0, 255, 0, 0]));
        let p = unpremultiply(sample_bilinear(&src, 0.5, 0.0));
        assert!((p[0] - 255.0).abs() < 1e-3);
        assert!(p[1].abs() < 1e-3);
        assert!((p[3] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_lanczos_weight() {
        assert_eq!(lanczos_weight(0.0, 3.0), 1.0);
        assert_eq!(lanczos_weight(3.0, 3.0), 0.0);
        assert!(lanczos_weight(1.0, 3.0).abs() < 1e-12);
        assert!(lanczos_weight(0.5, 3.0) > 0.5);
    }
}
