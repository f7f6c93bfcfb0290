//! Mask compositing: alpha-blends mask layers onto the base image.
//!
//! All masks are first combined into a single transparent layer sized to the
//! base image (later masks draw over earlier ones), and that combined layer
//! is composited onto the base exactly once. An unreadable mask skips that
//! layer and logs, matching the non-fatal asset policy.

use image::{imageops, imageops::FilterType, DynamicImage, Rgba, RgbaImage};
use tracing::warn;

use crate::assets::AssetResolver;
use crate::template::Mask;

impl Mask {
    /// The underlying image reference, whatever its storage form.
    pub fn source(&self) -> &str {
        match self {
            Mask::Inline { data } => data,
            Mask::Stored { path } => path,
        }
    }
}

/// Resolve every mask to a decoded image. Unreadable masks are dropped with
/// a warning; the caller composites whatever resolved.
pub async fn resolve_masks(masks: &[Mask], resolver: &AssetResolver) -> Vec<DynamicImage> {
    let mut resolved = Vec::with_capacity(masks.len());
    for (i, mask) in masks.iter().enumerate() {
        match resolver.resolve(mask.source()).await {
            Ok(img) => resolved.push(img),
            Err(e) => warn!(index = i, error = %e, "skipping unreadable mask"),
        }
    }
    resolved
}

/// Composite resolved masks onto the base image.
///
/// Each mask is resized to exactly the base dimensions, overlaid in list
/// order onto a transparent working layer, and the combined layer is then
/// alpha-composited onto the base once.
pub fn composite_masks(base: &mut RgbaImage, masks: &[DynamicImage]) {
    if masks.is_empty() {
        return;
    }
    let (w, h) = (base.width(), base.height());
    let mut layer = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
    for mask in masks {
        let sized = mask.resize_exact(w, h, FilterType::Lanczos3).to_rgba8();
        imageops::overlay(&mut layer, &sized, 0, 0);
    }
    imageops::overlay(base, &layer, 0, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_masks_leave_base_untouched() {
        let mut base = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        composite_masks(&mut base, &[]);
        assert_eq!(*base.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_mask_resized_to_base_dimensions() {
        let mut base = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        // 2x2 fully-opaque white mask covers the whole 8x8 base after resize.
        let mask = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            2,
            2,
            Rgba([255, 255, 255, 255]),
        ));
        composite_masks(&mut base, &[mask]);
        assert_eq!(*base.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*base.get_pixel(7, 7), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_later_mask_draws_over_earlier() {
        let mut base = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let red = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])));
        let blue = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255])));
        composite_masks(&mut base, &[red, blue]);
        assert_eq!(*base.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_transparent_mask_regions_show_base() {
        let mut base = RgbaImage::from_pixel(2, 2, Rgba([7, 7, 7, 255]));
        let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 0])));
        composite_masks(&mut base, &[clear]);
        assert_eq!(*base.get_pixel(1, 1), Rgba([7, 7, 7, 255]));
    }

    #[tokio::test]
    async fn test_unreadable_mask_skipped() {
        let resolver = AssetResolver::new("/nonexistent").unwrap();
        let masks = vec![Mask::Stored {
            path: "missing.png".into(),
        }];
        let resolved = resolve_masks(&masks, &resolver).await;
        assert!(resolved.is_empty());
    }
}
