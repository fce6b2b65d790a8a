//! Shared configuration for Itemize canvases
//!
//! This crate provides the single source of truth for the reference canvas
//! frame used to normalize stroke widths, and for the mobile layout defaults
//! shared by every client that renders whiteboards, notes and lists.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default reference canvas width in pixels
pub const DEFAULT_REFERENCE_WIDTH: f64 = 1920.0;

/// Default reference canvas height in pixels
pub const DEFAULT_REFERENCE_HEIGHT: f64 = 1080.0;

/// Default mobile canvas aspect ratio (width / height, 375x300)
pub const DEFAULT_MOBILE_ASPECT_RATIO: f64 = 375.0 / 300.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse canvas config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid reference frame: {width}x{height}")]
    InvalidReference { width: f64, height: f64 },
    #[error("Invalid aspect ratio: {0}")]
    InvalidAspectRatio(f64),
}

/// Fixed canvas size that anchors stroke-width normalization.
///
/// Point coordinates are normalized against the live canvas, never against
/// this frame. Only stroke thickness is expressed relative to it, so the
/// same frame must be used to save and to load a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    /// Reference width in pixels
    pub width: f64,
    /// Reference height in pixels
    pub height: f64,
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self {
            width: DEFAULT_REFERENCE_WIDTH,
            height: DEFAULT_REFERENCE_HEIGHT,
        }
    }
}

impl ReferenceFrame {
    /// Create a reference frame with the given dimensions
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Average of width and height, the scale stroke widths are anchored to
    pub fn average(&self) -> f64 {
        (self.width + self.height) / 2.0
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Canvas configuration shared by the load/save codec and layout helpers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Frame stroke widths are normalized against
    pub reference: ReferenceFrame,
    /// Width / height ratio used to size canvases on narrow screens
    pub mobile_aspect_ratio: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            reference: ReferenceFrame::default(),
            mobile_aspect_ratio: DEFAULT_MOBILE_ASPECT_RATIO,
        }
    }
}

impl CanvasConfig {
    /// Parse a config from JSON, filling missing fields with defaults.
    ///
    /// The result is validated before it is returned.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the reference frame and aspect ratio are usable divisors
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.reference.is_valid() {
            return Err(ConfigError::InvalidReference {
                width: self.reference.width,
                height: self.reference.height,
            });
        }
        if !self.mobile_aspect_ratio.is_finite() || self.mobile_aspect_ratio <= 0.0 {
            return Err(ConfigError::InvalidAspectRatio(self.mobile_aspect_ratio));
        }
        Ok(())
    }
}
