//! Per-LOD morph payload

use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::delta::DeltaRecord;
use super::layout::{LayoutTable, LodLayout};
use crate::archive::{AssetReader, FeatureStream};
use crate::traits::ParseResult;

/// Morph deltas and metadata for one level of detail
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LodMorphPayload {
    /// Sparse vertex deltas; empty when stripped from a cooked build
    pub vertices: Vec<DeltaRecord>,
    /// Vertex count of the base mesh this LOD applies to
    pub num_base_mesh_verts: i32,
    /// Mesh sections the morph touches
    pub section_indices: Vec<i32>,
    /// Produced by LOD reduction rather than imported
    #[serde(rename = "bGeneratedByEngine")]
    pub generated_by_engine: bool,
    /// Source file of a custom import. `None` when the stream predates the
    /// field, `Some("")` when the morph came with the LOD geometry.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_filename: Option<String>,
}

impl LodMorphPayload {
    /// Decode one LOD using the layout `layouts` selects for the reader's versions
    pub fn decode<R: Read + Seek>(
        reader: &mut AssetReader<R>,
        layouts: &LayoutTable,
    ) -> ParseResult<Self> {
        let layout = layouts.select(reader.versions())?;
        trace!(%layout, "Decoding morph LOD");

        let legacy_tangent = DeltaRecord::uses_legacy_tangent(reader.versions());
        let mut lod = match layout {
            LodLayout::Legacy => {
                let vertices = reader.read_array(|r| DeltaRecord::decode(r, legacy_tangent))?;
                let num_base_mesh_verts = reader.read_i32()?;
                Self {
                    vertices,
                    num_base_mesh_verts,
                    ..Self::default()
                }
            }
            LodLayout::SectionAware => {
                let vertices = reader.read_array(|r| DeltaRecord::decode(r, legacy_tangent))?;
                let num_base_mesh_verts = reader.read_i32()?;
                let section_indices = reader.read_i32_array()?;
                Self {
                    vertices,
                    num_base_mesh_verts,
                    section_indices,
                    ..Self::default()
                }
            }
            // This layout ends after the engine flag: no base vertex count
            // and no source filename, whatever the stream versions say.
            LodLayout::GameVariant => {
                reader.skip(4)?; // vertex count
                let section_indices = reader.read_i32_array()?;
                let generated_by_engine = reader.read_bool()?;
                return Ok(Self {
                    section_indices,
                    generated_by_engine,
                    ..Self::default()
                });
            }
            LodLayout::Mainline => Self::decode_mainline(reader, legacy_tangent)?,
        };

        let versions = reader.versions();
        if versions.is_at_least(
            FeatureStream::FortniteMain,
            versions.thresholds.morph_target_custom_import,
        )? {
            lod.source_filename = Some(reader.read_string()?);
        }

        Ok(lod)
    }

    fn decode_mainline<R: Read + Seek>(
        reader: &mut AssetReader<R>,
        legacy_tangent: bool,
    ) -> ParseResult<Self> {
        let versions = reader.versions();
        let strippable = versions.is_at_least(
            FeatureStream::Ue5PrivateFrostyStream,
            versions.thresholds.strip_morph_target_source_data_for_cooked_builds,
        )?;
        let stripped = strippable && reader.read_bool()?;

        let vertices = if stripped {
            debug!("Morph source deltas stripped for cooked build");
            reader.skip(4)?; // vertex count
            Vec::new()
        } else {
            reader.read_array(|r| DeltaRecord::decode(r, legacy_tangent))?
        };

        let num_base_mesh_verts = reader.read_i32()?;
        let section_indices = reader.read_i32_array()?;
        let generated_by_engine = reader.read_bool()?;

        Ok(Self {
            vertices,
            num_base_mesh_verts,
            section_indices,
            generated_by_engine,
            source_filename: None,
        })
    }

    /// Base mesh has vertices but no deltas were kept
    pub fn is_stripped(&self) -> bool {
        self.vertices.is_empty() && self.num_base_mesh_verts > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::VersionContext;
    use byteorder::{LittleEndian, WriteBytesExt};
    use std::io::Cursor;

    #[test]
    fn test_is_stripped() {
        let lod = LodMorphPayload {
            num_base_mesh_verts: 10,
            ..LodMorphPayload::default()
        };
        assert!(lod.is_stripped());
        assert!(!LodMorphPayload::default().is_stripped());
    }

    #[test]
    fn test_decode_legacy_layout() {
        let mut bytes = Vec::new();
        bytes.write_i32::<LittleEndian>(1).unwrap();
        DeltaRecord::new([1.0, 0.0, 0.0].into(), [0.0, 0.0, 1.0].into(), 7)
            .encode(&mut bytes)
            .unwrap();
        bytes.write_i32::<LittleEndian>(120).unwrap();

        let versions = VersionContext::builder()
            .object_version(i32::MAX)
            .custom_version(FeatureStream::Editor, 0)
            .custom_version(FeatureStream::FortniteMain, 0)
            .build();
        let mut reader = AssetReader::new(Cursor::new(bytes), versions);
        let lod = LodMorphPayload::decode(&mut reader, &LayoutTable::default()).unwrap();

        assert_eq!(lod.vertices.len(), 1);
        assert_eq!(lod.vertices[0].source_index, 7);
        assert_eq!(lod.num_base_mesh_verts, 120);
        assert!(lod.section_indices.is_empty());
        assert!(!lod.generated_by_engine);
        assert_eq!(lod.source_filename, None);
    }
}
