//! Reconstruction of morph deltas from the quantized GPU morph buffer.
//!
//! The GPU buffer stores each morph target as a run of batches. A batch
//! holds fixed-point deltas relative to a per-batch minimum; two global
//! precisions scale them back to floats:
//!
//! ```text
//! position = (batch.position_min + delta.position) * position_precision
//! tangent  = (batch.tangent_z_min + delta.tangent_z) * tangent_z_precision
//! ```

use blendshape_core::IntVector;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::delta::DeltaRecord;
use super::lod::LodMorphPayload;
use crate::traits::{ParseError, ParseResult};

/// One fixed-point vertex delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuantizedDelta {
    pub position: IntVector,
    pub tangent_z: IntVector,
    pub index: u32,
}

/// Batch of deltas sharing one minimum
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuantizedBatch {
    pub num_elements: u32,
    pub position_min: IntVector,
    pub tangent_z_min: IntVector,
    pub quantized_delta: Vec<QuantizedDelta>,
}

/// Quantized morph data for every morph target of one LOD
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuantizedMorphBuffer {
    pub morph_data: Vec<QuantizedBatch>,
    pub batch_start_offset_per_morph: Vec<u32>,
    pub batches_per_morph: Vec<u32>,
    pub position_precision: f32,
    pub tangent_z_precision: f32,
}

impl QuantizedMorphBuffer {
    /// Number of morph targets described by the buffer
    pub fn morph_count(&self) -> usize {
        self.batch_start_offset_per_morph.len()
    }

    /// Batches belonging to `morph_index`, borrowed from the buffer
    pub fn batches(&self, morph_index: usize) -> ParseResult<&[QuantizedBatch]> {
        let (start, count) = match (
            self.batch_start_offset_per_morph.get(morph_index),
            self.batches_per_morph.get(morph_index),
        ) {
            (Some(&start), Some(&count)) => (start as usize, count as usize),
            _ => {
                return Err(ParseError::InvalidStructure(format!(
                    "morph index {} out of range ({} morphs)",
                    morph_index,
                    self.morph_count()
                )))
            }
        };

        start
            .checked_add(count)
            .and_then(|end| self.morph_data.get(start..end))
            .ok_or_else(|| {
                ParseError::InvalidStructure(format!(
                    "batches {}..{}+{} of morph {} exceed {} batches",
                    start,
                    start,
                    count,
                    morph_index,
                    self.morph_data.len()
                ))
            })
    }

    /// Total delta count of `morph_index`
    pub fn vertex_count(&self, morph_index: usize) -> ParseResult<usize> {
        Ok(self
            .batches(morph_index)?
            .iter()
            .map(|b| b.num_elements as usize)
            .sum())
    }
}

/// Fixed-point value of `value` at `precision`
pub fn quantize(value: f32, precision: f32) -> i32 {
    (value / precision).round() as i32
}

/// Float value of a fixed-point delta relative to `min`
pub fn dequantize(min: i32, quantized: i32, precision: f32) -> f32 {
    min.wrapping_add(quantized) as f32 * precision
}

impl LodMorphPayload {
    /// Rebuild a payload from the quantized batches of `morph_index`.
    ///
    /// Deltas come out in batch order, then in order within each batch.
    /// The buffer carries no section membership, so `section_indices` is
    /// supplied by the caller and stored as given.
    pub fn reconstruct(
        buffer: &QuantizedMorphBuffer,
        morph_index: usize,
        section_indices: Vec<i32>,
    ) -> ParseResult<Self> {
        let batches = buffer.batches(morph_index)?;
        let size: usize = batches.iter().map(|b| b.num_elements as usize).sum();
        let num_base_mesh_verts = i32::try_from(size).map_err(|_| {
            ParseError::InvalidStructure(format!("morph {} has {} deltas", morph_index, size))
        })?;

        let mut vertices = Vec::with_capacity(size);
        for (batch_index, batch) in batches.iter().enumerate() {
            if batch.quantized_delta.len() != batch.num_elements as usize {
                return Err(ParseError::InvalidStructure(format!(
                    "batch {} of morph {} declares {} elements but holds {}",
                    batch_index,
                    morph_index,
                    batch.num_elements,
                    batch.quantized_delta.len()
                )));
            }

            for delta in &batch.quantized_delta {
                let position = batch
                    .position_min
                    .wrapping_add(delta.position)
                    .scaled(buffer.position_precision);
                let tangent = batch
                    .tangent_z_min
                    .wrapping_add(delta.tangent_z)
                    .scaled(buffer.tangent_z_precision);
                vertices.push(DeltaRecord::new(position, tangent, delta.index));
            }
        }

        trace!(morph_index, batches = batches.len(), vertices = size, "Reconstructed quantized morph");

        Ok(Self {
            vertices,
            num_base_mesh_verts,
            section_indices,
            generated_by_engine: false,
            source_filename: None,
        })
    }
}
