pub use itemize_config::{DEFAULT_REFERENCE_HEIGHT, DEFAULT_REFERENCE_WIDTH};

/// Version stamped into every saved document.
pub const FORMAT_VERSION: u32 = 1;
