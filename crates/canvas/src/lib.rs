//! Itemize canvas data - stroke normalization and format migration
//!
//! This crate converts whiteboard drawings between the pixel space of a live
//! canvas and the dimension-independent form that is persisted:
//! - [`types::Stroke`] - A drawn line with passthrough attributes
//! - [`types::NormalizedCanvasData`] - The persisted document format
//! - [`transform`] - Point and stroke-width conversions
//! - [`format`] - Detection of normalized, legacy and serialized documents
//! - [`codec`] - Load/save orchestration with diagnostics
//! - [`mobile`] - Canvas sizing for narrow containers

pub mod codec;
pub mod constants;
pub mod events;
pub mod format;
pub mod mobile;
pub mod transform;
pub mod types;

pub use codec::*;
pub use constants::*;
pub use events::*;
pub use format::*;
pub use mobile::*;
pub use transform::*;
pub use types::*;

pub use itemize_config::{CanvasConfig, ReferenceFrame};
