//! Template rendering: composes one output image per data row.
//!
//! Rendering is split in two phases so CPU-bound work can run on a blocking
//! thread while all network fetches happen up front on the async side:
//!
//! 1. [`Renderer::prepare`] resolves the base image, masks, and any image
//!    slot sources for one row (async, fallible per the error taxonomy).
//! 2. [`Renderer::render`] composites the prepared row synchronously.

pub mod fit;
pub mod mask;
pub mod text;

use image::{DynamicImage, RgbaImage};
use tracing::warn;

use crate::assets::AssetResolver;
use crate::error::MaquetaError;
use crate::job::Mapping;
use crate::naming::shorten_company_name;
use crate::rows::RowSet;
use crate::template::{Template, Variable, VariableKind, SHORT_NAME_VARIABLE};
use text::{AbGlyphMeasure, FontStore};

/// Variable id whose resolved value feeds the computed `short_name`
/// fallback.
pub const COMPANY_NAME_VARIABLE: &str = "company_name";

/// JPEG quality for encoded output, chosen for small preview payloads.
pub const JPEG_QUALITY: u8 = 70;

/// One variable's resolved content for a specific row.
#[derive(Debug)]
enum ResolvedSlot {
    Text(String),
    /// `None` when the source was empty or unreadable: slot is skipped.
    Image(Option<DynamicImage>),
}

/// All external inputs for one row, resolved and decoded.
#[derive(Debug)]
pub struct PreparedRow {
    base: DynamicImage,
    masks: Vec<DynamicImage>,
    slots: Vec<ResolvedSlot>,
}

/// Resolve a variable's value against a row: mapped cell (trimmed) if
/// non-empty, else the variable's default, else — for `short_name` only —
/// the shortened company name computed from the `company_name` value.
pub fn resolve_value(
    variable: &Variable,
    template: &Template,
    rows: &RowSet,
    row_idx: usize,
    mapping: &Mapping,
) -> String {
    let direct = mapped_cell(&variable.id, rows, row_idx, mapping);
    if !direct.is_empty() {
        return direct;
    }
    if !variable.default_value.is_empty() {
        return variable.default_value.clone();
    }
    if variable.id == SHORT_NAME_VARIABLE {
        let company = template
            .variables
            .iter()
            .find(|v| v.id == COMPANY_NAME_VARIABLE)
            .map(|v| {
                let cell = mapped_cell(&v.id, rows, row_idx, mapping);
                if cell.is_empty() { v.default_value.clone() } else { cell }
            })
            .unwrap_or_else(|| mapped_cell(COMPANY_NAME_VARIABLE, rows, row_idx, mapping));
        return shorten_company_name(&company);
    }
    String::new()
}

fn mapped_cell(variable_id: &str, rows: &RowSet, row_idx: usize, mapping: &Mapping) -> String {
    mapping
        .get(variable_id)
        .and_then(|column| rows.cell(row_idx, column))
        .map(str::trim)
        .unwrap_or("")
        .to_string()
}

/// Renders templates against prepared row data.
pub struct Renderer {
    fonts: FontStore,
}

impl Renderer {
    pub fn new(fonts: FontStore) -> Self {
        Self { fonts }
    }

    /// Resolve everything the render needs for one row.
    ///
    /// Fails with [`MaquetaError::TemplateAssetMissing`] when the base image
    /// cannot be located; slot assets and masks degrade to skips.
    pub async fn prepare(
        &self,
        template: &Template,
        rows: &RowSet,
        row_idx: usize,
        mapping: &Mapping,
        resolver: &AssetResolver,
    ) -> Result<PreparedRow, MaquetaError> {
        let base = resolver
            .resolve(&template.base_image)
            .await
            .map_err(|e| MaquetaError::TemplateAssetMissing(e.to_string()))?;

        let masks = mask::resolve_masks(&template.masks, resolver).await;

        let mut slots = Vec::with_capacity(template.variables.len());
        for variable in &template.variables {
            let value = resolve_value(variable, template, rows, row_idx, mapping);
            let slot = match variable.kind {
                VariableKind::Text(_) => ResolvedSlot::Text(value),
                VariableKind::Image(_) => {
                    if value.is_empty() {
                        ResolvedSlot::Image(None)
                    } else {
                        match resolver.resolve(&value).await {
                            Ok(img) => ResolvedSlot::Image(Some(img)),
                            Err(e) => {
                                warn!(variable = %variable.id, error = %e, "skipping image slot");
                                ResolvedSlot::Image(None)
                            }
                        }
                    }
                }
            };
            slots.push(slot);
        }

        Ok(PreparedRow { base, masks, slots })
    }

    /// Composite a prepared row into the final image. CPU-bound; call from a
    /// blocking context.
    pub fn render(&self, template: &Template, prepared: PreparedRow) -> Result<RgbaImage, MaquetaError> {
        let mut canvas = prepared.base.to_rgba8();

        mask::composite_masks(&mut canvas, &prepared.masks);

        for (variable, slot) in template.variables.iter().zip(prepared.slots) {
            match (&variable.kind, slot) {
                (VariableKind::Text(style), ResolvedSlot::Text(value)) => {
                    if value.is_empty() {
                        continue;
                    }
                    let font = self.fonts.get(&style.font)?;
                    let measure = AbGlyphMeasure::new(&font, style.size);
                    let lines = text::layout(
                        &value,
                        variable.bounds,
                        &measure,
                        style.align,
                        style.valign,
                    );
                    text::draw_lines(
                        &mut canvas,
                        variable.bounds,
                        &lines,
                        &font,
                        style.size,
                        style.color,
                    );
                }
                (VariableKind::Image(style), ResolvedSlot::Image(Some(source))) => {
                    fit::compose_fitted(&mut canvas, &source, variable.bounds, style.fit);
                }
                (VariableKind::Image(_), ResolvedSlot::Image(None)) => {}
                // prepare() builds slots in variable order; kinds cannot drift.
                _ => {}
            }
        }

        Ok(canvas)
    }
}

/// Flatten to opaque RGB and encode as JPEG for upload/preview.
pub fn encode_jpeg(img: &RgbaImage) -> Result<Vec<u8>, MaquetaError> {
    let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;
    Ok(out)
}
