//! blendshape core library
//!
//! This crate provides the small value types shared by the decoder and
//! the exporters: float and integer vectors and the deprecated packed
//! normal encoding.

pub mod types;

pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::types::*;
}
