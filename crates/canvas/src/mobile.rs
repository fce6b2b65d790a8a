//! Canvas sizing for narrow (mobile) containers

use itemize_config::CanvasConfig;

use crate::types::CanvasDimensions;

/// Size a canvas to fill `container_width` at a fixed width/height ratio
pub fn calculate_mobile_canvas_dimensions(
    container_width: f64,
    aspect_ratio: f64,
) -> CanvasDimensions {
    CanvasDimensions::new(container_width, container_width / aspect_ratio)
}

/// [`calculate_mobile_canvas_dimensions`] with the configured aspect ratio
pub fn mobile_canvas_dimensions(container_width: f64, config: &CanvasConfig) -> CanvasDimensions {
    calculate_mobile_canvas_dimensions(container_width, config.mobile_aspect_ratio)
}
