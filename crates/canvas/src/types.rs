use itemize_config::ReferenceFrame;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::FORMAT_VERSION;

/// A 2-D coordinate, either in canvas pixels or in unit space.
///
/// Fields other than `x` and `y` (pressure, tilt, ...) are kept as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            extra: Map::new(),
        }
    }

    /// Same point moved to `(x, y)`, keeping its extra fields
    pub fn with_xy(&self, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            extra: self.extra.clone(),
        }
    }
}

/// Deserialize a present field as `Some`, so an explicit `null` survives
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// One continuous drawn line.
///
/// Only the point list and the stroke width are ever transformed. Color,
/// draw mode and any field this type does not know about (timestamps,
/// client ids, ...) are carried through unchanged, and absent fields stay
/// absent when the stroke is written back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    /// Ordered points of the line
    pub paths: Vec<Point>,
    /// Line thickness, in pixels or normalized to the reference frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// Opaque color value owned by the renderer, `Some(Null)` for an explicit null
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub stroke_color: Option<Value>,
    /// Draw (true) or erase (false), owned by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_mode: Option<bool>,
    /// Unknown fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Stroke {
    /// Create a stroke with the common rendering attributes set
    pub fn new(
        paths: Vec<Point>,
        stroke_width: f64,
        stroke_color: impl Into<Value>,
        draw_mode: bool,
    ) -> Self {
        Self {
            paths,
            stroke_width: Some(stroke_width),
            stroke_color: Some(stroke_color.into()),
            draw_mode: Some(draw_mode),
            extra: Map::new(),
        }
    }

    /// Copy this stroke with its points and width passed through the given maps.
    ///
    /// Point count and order are preserved.
    pub(crate) fn map_geometry(
        &self,
        point: impl Fn(&Point) -> Point,
        width: impl Fn(f64) -> f64,
    ) -> Self {
        Self {
            paths: self.paths.iter().map(point).collect(),
            stroke_width: self.stroke_width.map(width),
            stroke_color: self.stroke_color.clone(),
            draw_mode: self.draw_mode,
            extra: self.extra.clone(),
        }
    }
}

/// Metadata block that marks a document as normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasMetadata {
    pub version: u32,
    pub normalized: bool,
    pub reference_width: f64,
    pub reference_height: f64,
}

impl Default for CanvasMetadata {
    fn default() -> Self {
        Self::for_frame(&ReferenceFrame::default())
    }
}

impl CanvasMetadata {
    /// Metadata for a document saved against `frame` in the current format
    pub fn for_frame(frame: &ReferenceFrame) -> Self {
        Self {
            version: FORMAT_VERSION,
            normalized: true,
            reference_width: frame.width,
            reference_height: frame.height,
        }
    }

    /// Reference frame the document claims it was saved against
    pub fn reference_frame(&self) -> ReferenceFrame {
        ReferenceFrame::new(self.reference_width, self.reference_height)
    }
}

/// Dimension-independent drawing document, as persisted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedCanvasData {
    #[serde(default)]
    pub paths: Vec<Stroke>,
    pub metadata: CanvasMetadata,
}

/// Pixel size of a canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasDimensions {
    pub width: f64,
    pub height: f64,
}

impl CanvasDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both sides are usable as a capture size (finite and positive)
    pub fn is_known(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}
