//! A dependency-aware component composition engine for Rust.
//!

pub use mosaic_compose::*;
pub use mosaic_facet::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use mosaic_compose::prelude::*;
    pub use mosaic_facet::prelude::*;
}
