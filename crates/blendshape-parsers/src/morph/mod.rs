// blendshape-parsers/src/morph/mod.rs
//! Morph target (blend shape) decoder
//!
//! A morph target stores, per LOD, a sparse list of position/tangent offsets
//! applied to a base mesh. Its serialized form changed across engine
//! releases, so every LOD is decoded with the layout its stream versions
//! select.
//!
//! # Format Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Morph Target Export                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Base object data (tagged properties)                       │
//! │  Strip data flags (global u8, class u8)                     │
//! │  LOD count (i32)                                            │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │ LOD payload, one of:                                    ││
//! │  │  legacy:        deltas, base vert count                 ││
//! │  │  section-aware: deltas, base vert count, sections       ││
//! │  │  game-variant:  skip 4, sections, engine flag           ││
//! │  │  mainline:      [stripped], deltas | skip 4,            ││
//! │  │                 base vert count, sections, engine flag  ││
//! │  │ [source filename] (not after game-variant)              ││
//! │  └─────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each delta is `position: f32x3, tangent: f32x3 | packed u32, index: u32`.

mod delta;
mod layout;
mod lod;
mod quantized;
mod target;

pub use delta::DeltaRecord;
pub use layout::{LayoutRule, LayoutTable, LodLayout};
pub use lod::LodMorphPayload;
pub use quantized::{dequantize, quantize, QuantizedBatch, QuantizedDelta, QuantizedMorphBuffer};
pub use target::{MorphTargetAsset, NoProperties, ObjectBase, SkipProperties};

use std::io::{Read, Seek};

use crate::archive::{AssetReader, VersionContext};
use crate::traits::{ParseOptions, ParsePhase, ParseProgress, ParseResult, Parser, ProgressCallback};

/// Decodes a standalone morph target export: the whole stream, from the
/// current position to its end, is the asset.
pub struct MorphTargetParser {
    versions: VersionContext,
}

impl MorphTargetParser {
    /// Create a parser for streams saved with `versions`
    pub fn new(versions: VersionContext) -> Self {
        Self { versions }
    }

    pub fn versions(&self) -> &VersionContext {
        &self.versions
    }
}

impl Default for MorphTargetParser {
    fn default() -> Self {
        Self::new(VersionContext::latest())
    }
}

impl Parser for MorphTargetParser {
    type Output = MorphTargetAsset;

    fn name(&self) -> &str {
        "Morph Target Parser"
    }

    fn parse_with_options<R: Read + Seek>(
        &self,
        reader: R,
        options: &ParseOptions,
        progress: Option<ProgressCallback>,
    ) -> ParseResult<Self::Output> {
        let mut reader = AssetReader::with_options(reader, self.versions.clone(), options.clone());
        let valid_pos = reader.stream_len()?;

        if let Some(ref cb) = progress {
            cb(ParseProgress {
                phase: ParsePhase::ReadingHeader,
                bytes_processed: reader.position()?,
                total_bytes: Some(valid_pos),
                items_processed: 0,
                total_items: None,
            });
        }

        let asset = MorphTargetAsset::decode(&mut reader, valid_pos, &mut NoProperties)
            .map_err(|e| e.with_context("morph target"))?;

        if let Some(ref cb) = progress {
            cb(ParseProgress {
                phase: ParsePhase::Complete,
                bytes_processed: reader.position()?,
                total_bytes: Some(valid_pos),
                items_processed: asset.lod_count() as u64,
                total_items: Some(asset.lod_count() as u64),
            });
        }

        Ok(asset)
    }
}
