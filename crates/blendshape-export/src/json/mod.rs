//! JSON data export for morph targets
//!
//! Exports decoded morph target assets and single LOD payloads (for example
//! ones rebuilt from a quantized GPU buffer) to JSON.

use blendshape_parsers::{LodMorphPayload, MorphTargetAsset};
use serde_json::json;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// JSON export errors
#[derive(Error, Debug)]
pub enum JsonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type JsonResult<T> = Result<T, JsonError>;

/// JSON export options
#[derive(Debug, Clone)]
pub struct JsonExportOptions {
    /// Use pretty-print formatting
    pub pretty: bool,

    /// Wrap the payload with a summary (LOD count, vertex totals)
    pub include_metadata: bool,
}

impl Default for JsonExportOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            include_metadata: true,
        }
    }
}

/// JSON data exporter
pub struct JsonExporter {
    options: JsonExportOptions,
}

impl JsonExporter {
    /// Create new exporter with default options
    pub fn new() -> Self {
        Self {
            options: JsonExportOptions::default(),
        }
    }

    /// Create exporter with custom options
    pub fn with_options(options: JsonExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &JsonExportOptions {
        &self.options
    }

    /// Export a decoded morph target to a file
    pub fn export_morph_target(
        &self,
        asset: &MorphTargetAsset,
        output_path: impl AsRef<Path>,
    ) -> JsonResult<()> {
        let value = self.morph_target_value(asset)?;
        self.write_json(&value, output_path)
    }

    /// Render a decoded morph target as a JSON string
    pub fn morph_target_to_string(&self, asset: &MorphTargetAsset) -> JsonResult<String> {
        let value = self.morph_target_value(asset)?;
        self.render(&value)
    }

    /// Export one LOD payload to a file
    pub fn export_lod(&self, lod: &LodMorphPayload, output_path: impl AsRef<Path>) -> JsonResult<()> {
        let value = self.lod_value(lod)?;
        self.write_json(&value, output_path)
    }

    /// Render one LOD payload as a JSON string
    pub fn lod_to_string(&self, lod: &LodMorphPayload) -> JsonResult<String> {
        let value = self.lod_value(lod)?;
        self.render(&value)
    }

    fn morph_target_value(&self, asset: &MorphTargetAsset) -> JsonResult<serde_json::Value> {
        let body = serde_json::to_value(asset)?;

        Ok(if self.options.include_metadata {
            let stripped = asset.lod_models.iter().filter(|l| l.is_stripped()).count();
            let per_lod: Vec<usize> = asset.lod_models.iter().map(|l| l.vertices.len()).collect();
            json!({
                "metadata": {
                    "lod_count": asset.lod_count(),
                    "vertex_count": asset.total_vertex_count(),
                    "vertex_count_per_lod": per_lod,
                    "stripped_lod_count": stripped,
                    "exporter_version": blendshape_parsers::VERSION,
                },
                "morph_target": body,
            })
        } else {
            body
        })
    }

    fn lod_value(&self, lod: &LodMorphPayload) -> JsonResult<serde_json::Value> {
        let body = serde_json::to_value(lod)?;

        Ok(if self.options.include_metadata {
            json!({
                "metadata": {
                    "vertex_count": lod.vertices.len(),
                    "num_base_mesh_verts": lod.num_base_mesh_verts,
                    "section_count": lod.section_indices.len(),
                    "stripped": lod.is_stripped(),
                    "exporter_version": blendshape_parsers::VERSION,
                },
                "lod": body,
            })
        } else {
            body
        })
    }

    fn render(&self, value: &serde_json::Value) -> JsonResult<String> {
        Ok(if self.options.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        })
    }

    /// Write JSON to file
    fn write_json(&self, value: &serde_json::Value, output_path: impl AsRef<Path>) -> JsonResult<()> {
        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);

        if self.options.pretty {
            serde_json::to_writer_pretty(&mut writer, value)?;
        } else {
            serde_json::to_writer(&mut writer, value)?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blendshape_parsers::DeltaRecord;

    fn asset() -> MorphTargetAsset {
        MorphTargetAsset {
            lod_models: vec![
                LodMorphPayload {
                    vertices: vec![DeltaRecord::new(
                        [0.5, 0.0, 0.0].into(),
                        [0.0, 0.0, 0.25].into(),
                        3,
                    )],
                    num_base_mesh_verts: 10,
                    section_indices: vec![0],
                    generated_by_engine: false,
                    source_filename: None,
                },
                LodMorphPayload {
                    num_base_mesh_verts: 4,
                    ..LodMorphPayload::default()
                },
            ],
        }
    }

    #[test]
    fn test_metadata_wrapping() {
        let text = JsonExporter::new().morph_target_to_string(&asset()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["metadata"]["lod_count"], 2);
        assert_eq!(value["metadata"]["vertex_count"], 1);
        assert_eq!(value["metadata"]["stripped_lod_count"], 1);
        assert_eq!(value["metadata"]["vertex_count_per_lod"], json!([1, 0]));
        assert_eq!(
            value["morph_target"]["MorphLODModels"][0]["Vertices"][0]["SourceIdx"],
            3
        );
    }

    #[test]
    fn test_bare_compact_output_round_trips() {
        let exporter = JsonExporter::with_options(JsonExportOptions {
            pretty: false,
            include_metadata: false,
        });
        let text = exporter.morph_target_to_string(&asset()).unwrap();

        assert!(!text.contains('\n'));
        let parsed: MorphTargetAsset = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, asset());
    }

    #[test]
    fn test_lod_metadata() {
        let lod = &asset().lod_models[1];
        let text = JsonExporter::new().lod_to_string(lod).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["metadata"]["stripped"], true);
        assert_eq!(value["metadata"]["num_base_mesh_verts"], 4);
        assert_eq!(value["lod"]["NumBaseMeshVerts"], 4);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smile.json");

        JsonExporter::new().export_morph_target(&asset(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["lod_count"], 2);
    }
}
