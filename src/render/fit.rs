//! Image fit: places a source image into a target box.
//!
//! `fit_rect` is the pure placement math; `compose_fitted` resizes with
//! Lanczos3 and alpha-composites the result into the base image, clipping to
//! the box so cover-mode overflow becomes a center crop.

use image::{imageops::FilterType, DynamicImage, Rgba, RgbaImage};

use crate::template::{BoundingBox, FitMode};

/// Scaled dimensions and offset of a fitted image, relative to the box
/// origin. Offsets may be negative in cover mode (overflow is clipped).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub w: u32,
    pub h: u32,
    pub dx: i64,
    pub dy: i64,
}

/// Compute the fitted size and centered offset for a source image.
///
/// - `Contain`: uniform downscale to fit entirely inside the box, never
///   upscaling past the source's original size, centered on both axes.
/// - `Cover`: scale by whichever axis constrains coverage (width when the
///   source is wider-aspect than the box, height otherwise), centered; may
///   overflow the box on the other axis.
pub fn fit_rect(src_w: u32, src_h: u32, bounds: BoundingBox, mode: FitMode) -> Placement {
    let (bw, bh) = (bounds.w as f64, bounds.h as f64);
    let (sw, sh) = (src_w as f64, src_h as f64);

    let scale = match mode {
        FitMode::Contain => (bw / sw).min(bh / sh).min(1.0),
        FitMode::Cover => {
            let src_aspect = sw / sh;
            let box_aspect = bw / bh;
            if src_aspect > box_aspect {
                bh / sh
            } else {
                bw / sw
            }
        }
    };

    let w = ((sw * scale).round() as u32).max(1);
    let h = ((sh * scale).round() as u32).max(1);
    Placement {
        w,
        h,
        dx: (bounds.w as i64 - w as i64) / 2,
        dy: (bounds.h as i64 - h as i64) / 2,
    }
}

/// Resize the source per the fit mode and alpha-composite it into `img`,
/// clipped to the box (and to the base image edges).
pub fn compose_fitted(img: &mut RgbaImage, source: &DynamicImage, bounds: BoundingBox, mode: FitMode) {
    let placement = fit_rect(source.width(), source.height(), bounds, mode);
    let resized = source
        .resize_exact(placement.w, placement.h, FilterType::Lanczos3)
        .to_rgba8();

    let (img_w, img_h) = (img.width() as i64, img.height() as i64);
    for sy in 0..placement.h as i64 {
        let y = bounds.y + placement.dy + sy;
        if y < 0 || y >= img_h || y < bounds.y || y >= bounds.y + bounds.h as i64 {
            continue;
        }
        for sx in 0..placement.w as i64 {
            let x = bounds.x + placement.dx + sx;
            if x < 0 || x >= img_w || x < bounds.x || x >= bounds.x + bounds.w as i64 {
                continue;
            }
            let src = resized.get_pixel(sx as u32, sy as u32);
            blend_over(img, x as u32, y as u32, *src);
        }
    }
}

/// Source-over alpha blend of one pixel.
fn blend_over(img: &mut RgbaImage, x: u32, y: u32, src: Rgba<u8>) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    if sa >= 1.0 {
        img.put_pixel(x, y, src);
        return;
    }
    let dst = *img.get_pixel(x, y);
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a.max(f32::EPSILON);
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    img.put_pixel(x, y, Rgba(out));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bx(w: u32, h: u32) -> BoundingBox {
        BoundingBox::new(0, 0, w, h)
    }

    #[test]
    fn test_contain_downscales_and_centers() {
        // 400x200 into 100x100: scale 0.25 → 100x50, centered vertically.
        let p = fit_rect(400, 200, bx(100, 100), FitMode::Contain);
        assert_eq!(p, Placement { w: 100, h: 50, dx: 0, dy: 25 });
    }

    #[test]
    fn test_contain_never_upscales() {
        // 50x50 into 200x200 stays 50x50, centered.
        let p = fit_rect(50, 50, bx(200, 200), FitMode::Contain);
        assert_eq!(p, Placement { w: 50, h: 50, dx: 75, dy: 75 });
    }

    #[test]
    fn test_cover_covers_constraining_axis() {
        // Wider-aspect source into a square box: scale by box height,
        // width overflows and is centered with a negative offset.
        let p = fit_rect(400, 200, bx(100, 100), FitMode::Cover);
        assert_eq!(p, Placement { w: 200, h: 100, dx: -50, dy: 0 });
        assert!(p.w >= 100 && p.h >= 100);
    }

    #[test]
    fn test_cover_taller_aspect_scales_by_width() {
        let p = fit_rect(100, 400, bx(200, 100), FitMode::Cover);
        assert_eq!(p.w, 200);
        assert_eq!(p.h, 800);
        assert_eq!(p.dy, -350);
    }

    #[test]
    fn test_cover_may_upscale() {
        let p = fit_rect(10, 10, bx(100, 50), FitMode::Cover);
        assert_eq!(p, Placement { w: 100, h: 100, dx: 0, dy: -25 });
    }

    #[test]
    fn test_compose_clips_to_box() {
        let mut base = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            20,
            10,
            Rgba([255, 0, 0, 255]),
        ));
        // Cover in a 10x10 box at (10, 10): the red image overflows
        // horizontally but must not paint outside the box.
        let bounds = BoundingBox::new(10, 10, 10, 10);
        compose_fitted(&mut base, &source, bounds, FitMode::Cover);

        assert_eq!(*base.get_pixel(15, 15), Rgba([255, 0, 0, 255]));
        assert_eq!(*base.get_pixel(9, 15), Rgba([0, 0, 0, 255]));
        assert_eq!(*base.get_pixel(20, 15), Rgba([0, 0, 0, 255]));
        assert_eq!(*base.get_pixel(15, 9), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_compose_contain_letterboxes() {
        let mut base = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            40,
            20,
            Rgba([0, 255, 0, 255]),
        ));
        let bounds = BoundingBox::new(0, 0, 20, 20);
        compose_fitted(&mut base, &source, bounds, FitMode::Contain);

        // 40x20 contained in 20x20 → 20x10 centered: rows 0..5 untouched.
        assert_eq!(*base.get_pixel(10, 2), Rgba([0, 0, 0, 255]));
        assert_eq!(*base.get_pixel(10, 10), Rgba([0, 255, 0, 255]));
        assert_eq!(*base.get_pixel(10, 17), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_transparent_source_leaves_base() {
        let mut base = RgbaImage::from_pixel(10, 10, Rgba([9, 9, 9, 255]));
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 0])));
        compose_fitted(&mut base, &source, bx(10, 10), FitMode::Cover);
        assert_eq!(*base.get_pixel(5, 5), Rgba([9, 9, 9, 255]));
    }
}
