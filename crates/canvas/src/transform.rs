//! Conversions between canvas pixel space and unit space
//!
//! Points are normalized against the canvas they were drawn on; stroke widths
//! are expressed as if drawn on the [`ReferenceFrame`], so a stroke keeps a
//! consistent visual thickness on canvases of different sizes.
//!
//! Canvas dimensions are not validated here. Zero or negative sizes divide
//! by zero and yield infinities or NaN.

use itemize_config::ReferenceFrame;

use crate::types::{CanvasDimensions, Point, Stroke};

/// Convert a pixel-space point to unit space
pub fn normalize_point(point: &Point, canvas_width: f64, canvas_height: f64) -> Point {
    point.with_xy(point.x / canvas_width, point.y / canvas_height)
}

/// Convert a unit-space point back to pixel space
pub fn denormalize_point(point: &Point, canvas_width: f64, canvas_height: f64) -> Point {
    point.with_xy(point.x * canvas_width, point.y * canvas_height)
}

/// Express a pixel stroke width relative to the reference frame
pub fn normalize_stroke_width(
    stroke_width: f64,
    canvas_width: f64,
    canvas_height: f64,
    frame: &ReferenceFrame,
) -> f64 {
    let avg = (canvas_width + canvas_height) / 2.0;
    stroke_width / avg * frame.average()
}

/// Convert a reference-frame stroke width to pixels on the given canvas
pub fn denormalize_stroke_width(
    normalized_width: f64,
    canvas_width: f64,
    canvas_height: f64,
    frame: &ReferenceFrame,
) -> f64 {
    let avg = (canvas_width + canvas_height) / 2.0;
    normalized_width / frame.average() * avg
}

/// Normalize every point and stroke width of a pixel-space drawing
pub fn normalize_strokes(
    paths: &[Stroke],
    canvas: CanvasDimensions,
    frame: &ReferenceFrame,
) -> Vec<Stroke> {
    paths
        .iter()
        .map(|stroke| {
            stroke.map_geometry(
                |p| normalize_point(p, canvas.width, canvas.height),
                |w| normalize_stroke_width(w, canvas.width, canvas.height, frame),
            )
        })
        .collect()
}

/// Inverse of [`normalize_strokes`] for the same canvas and frame
pub fn denormalize_strokes(
    paths: &[Stroke],
    canvas: CanvasDimensions,
    frame: &ReferenceFrame,
) -> Vec<Stroke> {
    paths
        .iter()
        .map(|stroke| {
            stroke.map_geometry(
                |p| denormalize_point(p, canvas.width, canvas.height),
                |w| denormalize_stroke_width(w, canvas.width, canvas.height, frame),
            )
        })
        .collect()
}

/// Retarget pixel-space strokes captured at `from` onto a canvas of size `to`.
///
/// Points scale per axis; stroke widths scale by the mean of both axis
/// factors. This is a direct linear rescale, not a trip through unit space.
pub fn rescale_strokes(
    paths: &[Stroke],
    from: CanvasDimensions,
    to: CanvasDimensions,
) -> Vec<Stroke> {
    let scale_x = to.width / from.width;
    let scale_y = to.height / from.height;
    let avg_scale = (scale_x + scale_y) / 2.0;

    paths
        .iter()
        .map(|stroke| {
            stroke.map_geometry(
                |p| p.with_xy(p.x * scale_x, p.y * scale_y),
                |w| w * avg_scale,
            )
        })
        .collect()
}
