//! Single vertex delta

use std::io::{Read, Seek, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use blendshape_core::{PackedNormal, Vec3};
use serde::{Deserialize, Serialize};

use crate::archive::{AssetReader, VersionContext};
use crate::traits::ParseResult;

/// Position and tangent offset for one base-mesh vertex.
///
/// `source_index` is not range-checked against the base mesh.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeltaRecord {
    pub position_delta: Vec3,
    pub tangent_z_delta: Vec3,
    #[serde(rename = "SourceIdx")]
    pub source_index: u32,
}

impl DeltaRecord {
    /// Serialized size with float tangents
    pub const SIZE: usize = 28;
    /// Serialized size with a packed-normal tangent
    pub const LEGACY_SIZE: usize = 20;

    pub fn new(position_delta: Vec3, tangent_z_delta: Vec3, source_index: u32) -> Self {
        Self {
            position_delta,
            tangent_z_delta,
            source_index,
        }
    }

    /// Whether streams saved under `versions` store tangents as packed normals
    pub fn uses_legacy_tangent(versions: &VersionContext) -> bool {
        !versions.object_version_at_least(versions.thresholds.tangent_z_delta_format_change)
    }

    pub fn decode<R: Read + Seek>(
        reader: &mut AssetReader<R>,
        legacy_tangent: bool,
    ) -> ParseResult<Self> {
        let position_delta = reader.read_vec3()?;
        let tangent_z_delta = if legacy_tangent {
            Vec3::from(PackedNormal(reader.read_u32()?))
        } else {
            reader.read_vec3()?
        };
        let source_index = reader.read_u32()?;

        Ok(Self::new(position_delta, tangent_z_delta, source_index))
    }

    /// Write the float-tangent form
    pub fn encode<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for v in [self.position_delta, self.tangent_z_delta] {
            writer.write_f32::<LittleEndian>(v.x)?;
            writer.write_f32::<LittleEndian>(v.y)?;
            writer.write_f32::<LittleEndian>(v.z)?;
        }
        writer.write_u32::<LittleEndian>(self.source_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: Vec<u8>) -> AssetReader<Cursor<Vec<u8>>> {
        AssetReader::new(Cursor::new(bytes), VersionContext::default())
    }

    #[test]
    fn test_encode_size() {
        let mut bytes = Vec::new();
        DeltaRecord::default().encode(&mut bytes).unwrap();
        assert_eq!(bytes.len(), DeltaRecord::SIZE);
    }

    #[test]
    fn test_round_trip_float_tangent() {
        let record = DeltaRecord::new(
            Vec3::new(0.25, -1.5, f32::MIN_POSITIVE),
            Vec3::new(-0.0, 3.0e-7, 1.0),
            917,
        );
        let mut bytes = Vec::new();
        record.encode(&mut bytes).unwrap();

        let decoded = DeltaRecord::decode(&mut reader(bytes), false).unwrap();
        assert!(decoded.position_delta.bits_eq(&record.position_delta));
        assert!(decoded.tangent_z_delta.bits_eq(&record.tangent_z_delta));
        assert_eq!(decoded.source_index, 917);
    }

    #[test]
    fn test_decode_legacy_tangent() {
        let mut bytes = Vec::new();
        for v in [1.0f32, 2.0, 3.0] {
            bytes.write_f32::<LittleEndian>(v).unwrap();
        }
        // x = 255, y = 0, z = 0, w ignored
        bytes.write_u32::<LittleEndian>(0xAA00_00FF).unwrap();
        bytes.write_u32::<LittleEndian>(42).unwrap();
        assert_eq!(bytes.len(), DeltaRecord::LEGACY_SIZE);

        let decoded = DeltaRecord::decode(&mut reader(bytes), true).unwrap();
        assert_eq!(decoded.position_delta, Vec3::new(1.0, 2.0, 3.0));
        assert!((decoded.tangent_z_delta.x - 1.0).abs() < 1e-6);
        assert_eq!(decoded.tangent_z_delta.y, -1.0);
        assert_eq!(decoded.tangent_z_delta.z, -1.0);
        assert_eq!(decoded.source_index, 42);
    }

    #[test]
    fn test_legacy_tangent_cutover() {
        let mut versions = VersionContext::default();
        versions.object_version = versions.thresholds.tangent_z_delta_format_change - 1;
        assert!(DeltaRecord::uses_legacy_tangent(&versions));

        versions.object_version += 1;
        assert!(!DeltaRecord::uses_legacy_tangent(&versions));
    }

    #[test]
    fn test_truncated_record() {
        let result = DeltaRecord::decode(&mut reader(vec![0; 16]), false);
        assert!(result.unwrap_err().is_unexpected_eof());
    }
}
