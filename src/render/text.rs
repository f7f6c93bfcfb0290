//! Text layout and rasterization for text variables.
//!
//! Layout is greedy word-wrap over real glyph metrics, behind the
//! [`TextMeasure`] seam so the wrap and alignment math is testable without
//! font assets. Production measurement and drawing use `ab_glyph`, rendering
//! anti-aliased coverage directly into the base RGBA image.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::error::MaquetaError;
use crate::template::{BoundingBox, HAlign, VAlign};

/// Upward nudge applied to the block's start, as a fraction of one line
/// height. Compensates for ascent/descent asymmetry so server output lines
/// up with the interactive editor preview. Empirical; keep in sync with the
/// editor.
pub const BASELINE_NUDGE_RATIO: f32 = 0.18;

/// Width/height oracle for layout. Implemented over ab_glyph in production
/// and by a fixed-advance fake in tests.
pub trait TextMeasure {
    /// Rendered width of a single line.
    fn line_width(&self, text: &str) -> f32;

    /// Uniform line height: the rendered height of `"Ay"`, used for every
    /// line so vertical rhythm stays constant.
    fn line_height(&self) -> f32;
}

/// One laid-out line, positioned relative to the box origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedLine {
    pub text: String,
    pub x: f32,
    /// Top of the line slot (not the baseline).
    pub y: f32,
    pub width: f32,
}

/// Lay out wrapped text inside a box.
///
/// Greedy wrap: words accumulate while the measured line stays within the
/// box width; a single word wider than the box gets its own line with no
/// hyphenation. Empty text produces zero lines.
pub fn layout(
    text: &str,
    bounds: BoundingBox,
    measure: &dyn TextMeasure,
    align: HAlign,
    valign: VAlign,
) -> Vec<PositionedLine> {
    let box_w = bounds.w as f32;
    let box_h = bounds.h as f32;

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if measure.line_width(&candidate) <= box_w || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        return Vec::new();
    }

    let line_height = measure.line_height();
    let total_height = lines.len() as f32 * line_height;

    let mut start_y = match valign {
        VAlign::Top => 0.0,
        VAlign::Middle => (box_h - total_height) / 2.0,
        VAlign::Bottom => box_h - total_height,
    };
    start_y = start_y.max(0.0);
    start_y = (start_y - BASELINE_NUDGE_RATIO * line_height).max(0.0);

    lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let width = measure.line_width(&text);
            let x = match align {
                HAlign::Left => 0.0,
                HAlign::Center => (box_w - width) / 2.0,
                HAlign::Right => box_w - width,
            };
            PositionedLine {
                text,
                x,
                y: start_y + i as f32 * line_height,
                width,
            }
        })
        .collect()
}

/// ab_glyph-backed measurement at a fixed pixel size.
pub struct AbGlyphMeasure<'a> {
    font: &'a FontArc,
    scale: PxScale,
}

impl<'a> AbGlyphMeasure<'a> {
    pub fn new(font: &'a FontArc, size: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(size),
        }
    }
}

impl TextMeasure for AbGlyphMeasure<'_> {
    fn line_width(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        text.chars()
            .map(|ch| scaled.h_advance(self.font.glyph_id(ch)))
            .sum()
    }

    fn line_height(&self) -> f32 {
        // Rendered (ink) height of "Ay": union of the outlined glyph bounds.
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = 0.0f32;
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for ch in "Ay".chars() {
            let id = self.font.glyph_id(ch);
            let glyph = id.with_scale_and_position(self.scale, point(caret, 0.0));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let b = outlined.px_bounds();
                min_y = min_y.min(b.min.y);
                max_y = max_y.max(b.max.y);
            }
            caret += scaled.h_advance(id);
        }
        if min_y <= max_y {
            max_y - min_y
        } else {
            // Font without outlines for "Ay": fall back to vertical metrics.
            scaled.ascent() - scaled.descent()
        }
    }
}

/// Draw laid-out lines into the base image with the given fill color.
///
/// Each line's glyphs are positioned on a baseline one ascent below the line
/// top, matching how the layout heights were measured. Coverage accumulates
/// into the alpha channel of the fill.
pub fn draw_lines(
    img: &mut RgbaImage,
    bounds: BoundingBox,
    lines: &[PositionedLine],
    font: &FontArc,
    size: f32,
    color: [u8; 3],
) {
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let (img_w, img_h) = (img.width() as i64, img.height() as i64);

    for line in lines {
        let baseline = bounds.y as f32 + line.y + ascent;
        let mut caret = bounds.x as f32 + line.x;
        for ch in line.text.chars() {
            let id = font.glyph_id(ch);
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let gb = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i64 + gb.min.x as i64;
                let y = py as i64 + gb.min.y as i64;
                if x < 0 || y < 0 || x >= img_w || y >= img_h {
                    return;
                }
                blend_pixel(img, x as u32, y as u32, color, coverage);
            });
        }
    }
}

/// Source-over blend of `color` at `coverage` onto one pixel.
fn blend_pixel(img: &mut RgbaImage, x: u32, y: u32, color: [u8; 3], coverage: f32) {
    let coverage = coverage.clamp(0.0, 1.0);
    if coverage <= 0.0 {
        return;
    }
    let Rgba(dst) = *img.get_pixel(x, y);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let blended = color[c] as f32 * coverage + dst[c] as f32 * (1.0 - coverage);
        out[c] = blended.round() as u8;
    }
    let alpha = coverage * 255.0 + dst[3] as f32 * (1.0 - coverage);
    out[3] = alpha.round().clamp(0.0, 255.0) as u8;
    img.put_pixel(x, y, Rgba(out));
}

/// Loads and caches TTF/OTF fonts by identifier from the font directory.
///
/// A font identifier maps to `<dir>/<id>.ttf` (or `.otf`). Identifiers are
/// whatever the template author chose; there is no built-in font.
pub struct FontStore {
    font_dir: PathBuf,
    cache: RwLock<HashMap<String, FontArc>>,
}

impl FontStore {
    pub fn new(font_dir: impl Into<PathBuf>) -> Self {
        Self {
            font_dir: font_dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a font by identifier, loading it from disk on first use.
    pub fn get(&self, id: &str) -> Result<FontArc, MaquetaError> {
        if let Some(font) = self.cache.read().expect("font cache poisoned").get(id) {
            return Ok(font.clone());
        }

        let mut candidates = vec![self.font_dir.join(format!("{}.ttf", id))];
        candidates.push(self.font_dir.join(format!("{}.otf", id)));
        candidates.push(self.font_dir.join(id));

        let path = candidates
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| MaquetaError::Layout(format!("font not found: {}", id)))?;

        let bytes = std::fs::read(&path)?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| MaquetaError::Layout(format!("invalid font {}: {}", id, e)))?;
        self.cache
            .write()
            .expect("font cache poisoned")
            .insert(id.to_string(), font.clone());
        Ok(font)
    }
}
