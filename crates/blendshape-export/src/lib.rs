//! blendshape Export Pipeline
//!
//! Converts decoded morph targets to interchange formats:
//! - JSON (decoded assets and reconstructed LOD payloads)

pub mod json;

pub use json::{JsonError, JsonExportOptions, JsonExporter, JsonResult};
