//! Morph target asset

use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::layout::LayoutTable;
use super::lod::LodMorphPayload;
use crate::archive::{AssetReader, StripDataFlags, MORPH_TARGET_OPTION};
use crate::traits::ParseResult;

/// Hook for the object data serialized ahead of the morph payload
/// (tagged properties and the like). Runs first on every decode.
pub trait ObjectBase {
    fn deserialize<R: Read + Seek>(
        &mut self,
        reader: &mut AssetReader<R>,
        valid_pos: u64,
    ) -> ParseResult<()>;
}

/// Base for streams that hold nothing but the morph payload
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProperties;

impl ObjectBase for NoProperties {
    fn deserialize<R: Read + Seek>(&mut self, _: &mut AssetReader<R>, _: u64) -> ParseResult<()> {
        Ok(())
    }
}

/// Base that skips a fixed-size property block
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipProperties(pub u64);

impl ObjectBase for SkipProperties {
    fn deserialize<R: Read + Seek>(&mut self, reader: &mut AssetReader<R>, _: u64) -> ParseResult<()> {
        let position = reader.position()?;
        reader.seek(position + self.0)
    }
}

/// Decoded morph target: one payload per LOD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphTargetAsset {
    #[serde(rename = "MorphLODModels")]
    pub lod_models: Vec<LodMorphPayload>,
}

impl Default for MorphTargetAsset {
    fn default() -> Self {
        Self {
            lod_models: vec![LodMorphPayload::default()],
        }
    }
}

impl MorphTargetAsset {
    /// Decode the asset whose serialized data ends at `valid_pos`.
    ///
    /// When the stream was saved without morph target support the reader is
    /// moved to `valid_pos` and the default asset is returned.
    pub fn decode<R: Read + Seek, B: ObjectBase>(
        reader: &mut AssetReader<R>,
        valid_pos: u64,
        base: &mut B,
    ) -> ParseResult<Self> {
        base.deserialize(reader, valid_pos)?;

        let mut asset = Self::default();

        if !reader.versions().has_option(MORPH_TARGET_OPTION) {
            debug!(valid_pos, "Morph target data absent from stream, skipping");
            reader.seek(valid_pos)?;
            return Ok(asset);
        }

        let strip = StripDataFlags::decode(reader)?;
        if strip.is_data_stripped_for_server() {
            debug!("Morph target data stripped for server");
            return Ok(asset);
        }

        let layouts = LayoutTable::compile(&reader.versions().thresholds);
        asset.lod_models = reader.read_array(|r| LodMorphPayload::decode(r, &layouts))?;

        debug!(
            lods = asset.lod_models.len(),
            vertices = asset.total_vertex_count(),
            "Decoded morph target"
        );
        Ok(asset)
    }

    pub fn lod_count(&self) -> usize {
        self.lod_models.len()
    }

    /// Deltas across all LODs
    pub fn total_vertex_count(&self) -> usize {
        self.lod_models.iter().map(|lod| lod.vertices.len()).sum()
    }

    /// No LOD carries deltas
    pub fn is_empty(&self) -> bool {
        self.lod_models.iter().all(|lod| lod.vertices.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::VersionContext;
    use std::io::Cursor;

    #[test]
    fn test_default_has_one_empty_lod() {
        let asset = MorphTargetAsset::default();
        assert_eq!(asset.lod_count(), 1);
        assert_eq!(asset.lod_models[0], LodMorphPayload::default());
        assert!(asset.is_empty());
    }

    #[test]
    fn test_server_stripped_keeps_default() {
        // global flags: server stripped, then garbage that must not be read
        let bytes = vec![0x2, 0x0, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = AssetReader::new(Cursor::new(bytes), VersionContext::latest());

        let asset = MorphTargetAsset::decode(&mut reader, 6, &mut NoProperties).unwrap();
        assert_eq!(asset, MorphTargetAsset::default());
        assert_eq!(reader.position().unwrap(), 2);
    }

    #[test]
    fn test_skip_properties_advances() {
        let mut reader = AssetReader::new(Cursor::new(vec![0u8; 16]), VersionContext::default());
        SkipProperties(12).deserialize(&mut reader, 16).unwrap();
        assert_eq!(reader.position().unwrap(), 12);
    }
}
