//! Template data model: positioned variable slots and mask layers.
//!
//! All types derive `Serialize + Deserialize` so the same structs work for
//! Rust construction, JSON API payloads, and storage. Variable order is
//! render order; masks always composite before any variable is drawn.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Variable id that receives the computed company-name fallback when both
/// the mapped cell and the default value are empty.
pub const SHORT_NAME_VARIABLE: &str = "short_name";

/// Axis-aligned box in base-image pixel coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub fn new(x: i64, y: i64, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Horizontal text alignment within a box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical text alignment within a box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Policy for placing a source image into a target box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Fit entirely within the box, never upscaling. May letterbox.
    Contain,
    /// Cover the box on the constraining axis, center-cropping overflow.
    #[default]
    Cover,
}

fn default_font_size() -> f32 {
    48.0
}

/// Styling for a text variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font identifier resolved against the configured font directory.
    #[serde(default)]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub size: f32,
    /// RGB fill color.
    #[serde(default)]
    pub color: [u8; 3],
    #[serde(default)]
    pub align: HAlign,
    #[serde(default)]
    pub valign: VAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: String::new(),
            size: default_font_size(),
            color: [0, 0, 0],
            align: HAlign::Left,
            valign: VAlign::Middle,
        }
    }
}

/// Styling for an image variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageStyle {
    #[serde(default)]
    pub fit: FitMode,
}

/// Type-specific payload of a variable slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariableKind {
    Text(TextStyle),
    Image(ImageStyle),
}

/// A named, positioned slot in a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    /// Human-readable display label for the mapping UI.
    #[serde(default)]
    pub label: String,
    #[serde(rename = "box")]
    pub bounds: BoundingBox,
    #[serde(flatten)]
    pub kind: VariableKind,
    /// Fallback value when the mapped cell is missing or empty.
    /// For image variables this may be a path, URL, or base64 data.
    #[serde(default)]
    pub default_value: String,
}

/// A mask layer: resized to the base image's dimensions, then
/// alpha-composited before variables are drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mask {
    /// Inline base64-encoded image data (with or without a data: prefix).
    Inline { data: String },
    /// Path resolved against the asset directory.
    Stored { path: String },
}

fn default_template_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// An image template: a base image plus ordered variables and masks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    #[serde(default = "default_template_id")]
    pub id: String,
    pub name: String,
    /// Base image reference: path under the asset directory or a URL.
    pub base_image: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub masks: Vec<Mask>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "chrono::Utc::now")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Template {
    /// Validate structural invariants: unique variable ids, positive boxes.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for var in &self.variables {
            if !seen.insert(var.id.as_str()) {
                return Err(format!("duplicate variable id: {}", var.id));
            }
            if var.bounds.w == 0 || var.bounds.h == 0 {
                return Err(format!("variable {} has an empty box", var.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_variable(id: &str) -> Variable {
        Variable {
            id: id.into(),
            label: String::new(),
            bounds: BoundingBox::new(0, 0, 100, 40),
            kind: VariableKind::Text(TextStyle::default()),
            default_value: String::new(),
        }
    }

    #[test]
    fn test_variable_json_shape() {
        let json = serde_json::json!({
            "id": "short_name",
            "type": "text",
            "box": {"x": 406, "y": 179, "w": 600, "h": 110},
            "font": "inter-bold",
            "size": 48.0,
            "color": [0, 0, 0],
            "valign": "middle"
        });
        let var: Variable = serde_json::from_value(json).unwrap();
        assert_eq!(var.id, "short_name");
        match var.kind {
            VariableKind::Text(ref style) => {
                assert_eq!(style.font, "inter-bold");
                assert_eq!(style.valign, VAlign::Middle);
                assert_eq!(style.align, HAlign::Left);
            }
            _ => panic!("expected text variable"),
        }
        assert_eq!(var.bounds.w, 600);
    }

    #[test]
    fn test_image_variable_defaults_to_cover() {
        let json = serde_json::json!({
            "id": "logo",
            "type": "image",
            "box": {"x": 0, "y": 0, "w": 200, "h": 200}
        });
        let var: Variable = serde_json::from_value(json).unwrap();
        match var.kind {
            VariableKind::Image(ref style) => assert_eq!(style.fit, FitMode::Cover),
            _ => panic!("expected image variable"),
        }
    }

    #[test]
    fn test_mask_untagged_forms() {
        let inline: Mask = serde_json::from_value(serde_json::json!({"data": "aGk="})).unwrap();
        assert!(matches!(inline, Mask::Inline { .. }));
        let stored: Mask = serde_json::from_value(serde_json::json!({"path": "masks/glow.png"})).unwrap();
        assert!(matches!(stored, Mask::Stored { .. }));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let template = Template {
            id: "t1".into(),
            name: "demo".into(),
            base_image: "base.jpg".into(),
            variables: vec![text_variable("a"), text_variable("a")],
            masks: vec![],
            owner: None,
            created_at: chrono::Utc::now(),
        };
        assert!(template.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_box() {
        let mut var = text_variable("a");
        var.bounds.w = 0;
        let template = Template {
            id: "t1".into(),
            name: "demo".into(),
            base_image: "base.jpg".into(),
            variables: vec![var],
            masks: vec![],
            owner: None,
            created_at: chrono::Utc::now(),
        };
        assert!(template.validate().is_err());
    }
}
