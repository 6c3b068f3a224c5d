//! blendshape-parsers
//!
//! Decoders for cooked morph target (blend shape) data.
//!
//! # Entry points
//!
//! | Type                  | Input                              | Output               |
//! |-----------------------|------------------------------------|----------------------|
//! | `MorphTargetParser`   | serialized morph target export     | `MorphTargetAsset`   |
//! | `MorphTargetAsset`    | reader positioned inside a package | `MorphTargetAsset`   |
//! | `LodMorphPayload`     | quantized GPU morph buffer         | `LodMorphPayload`    |
//!
//! # Example
//!
//! ```rust,ignore
//! use blendshape_parsers::{MorphTargetParser, Parser, VersionContext};
//!
//! let versions = VersionContext::from_file("versions.yaml".as_ref())?;
//! let parser = MorphTargetParser::new(versions);
//! let asset = parser.parse_file("Smile.bin".as_ref())?;
//!
//! println!("{} LODs, {} deltas", asset.lod_count(), asset.total_vertex_count());
//! ```

pub mod archive;
pub mod logging;
pub mod morph;
pub mod traits;

// Re-export main types
pub use traits::{
    ParseError, ParseOptions, ParsePhase, ParseProgress, ParseResult, Parser, ProgressCallback,
};

pub use archive::{
    AssetReader, FeatureStream, Game, StripDataFlags, VersionContext, VersionContextBuilder,
    VersionThresholds, MORPH_TARGET_OPTION,
};

pub use morph::{
    dequantize, quantize, DeltaRecord, LayoutRule, LayoutTable, LodLayout, LodMorphPayload,
    MorphTargetAsset, MorphTargetParser, NoProperties, ObjectBase, QuantizedBatch,
    QuantizedDelta, QuantizedMorphBuffer, SkipProperties,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
