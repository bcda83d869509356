use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LatticeError;
use crate::lattice::LatticeVariant;

/// Limits applied while enumerating multi-component groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrouperConfig {
    /// Maximum number of consecutive components combined into one group.
    pub max_range: usize,
    /// Maximum horizontal gap (pixels) between combined components.
    pub max_dist: i64,
    /// Maximum width/height ratio of a combined group.
    pub max_aspect: f32,
    /// Combined groups must be narrower than `max_width` times the median group height.
    pub max_width: f32,
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            max_range: 4,
            max_dist: 2,
            max_aspect: 2.5,
            max_width: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Number of top classifier outputs added per group.
    pub best: usize,
    /// Upper bound on a single hypothesis cost.
    pub max_cost: f32,
    /// Letters shorter than this fraction of the median group height are skipped.
    pub min_height_letters: f32,
    pub space_cost: f32,
    pub no_space_cost: f32,
    /// Dilation applied to the glyph mask before classification.
    pub mask_grow: usize,
    /// Cost per pixel of crop width for skipping a group.
    pub skip_scale: f32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            best: 10,
            max_cost: 10.0,
            min_height_letters: 0.5,
            space_cost: 0.5,
            no_space_cost: 0.0,
            mask_grow: 1,
            skip_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub grouper: GrouperConfig,
    pub recognizer: RecognizerConfig,
    pub lattice: LatticeVariant,
    pub beam_width: usize,
    pub grouper_name: String,
    pub decoder_name: String,
    pub language_model_name: String,
}

impl PipelineConfig {
    pub const DEFAULT_BEAM_WIDTH: usize = 1000;

    pub fn load(path: &Path) -> Result<Self, LatticeError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| LatticeError::io("read pipeline config", e))?;
        serde_json::from_str(&data).map_err(|e| LatticeError::json("parse pipeline config", e))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grouper: GrouperConfig::default(),
            recognizer: RecognizerConfig::default(),
            lattice: LatticeVariant::Plain,
            beam_width: Self::DEFAULT_BEAM_WIDTH,
            grouper_name: "segment".to_string(),
            decoder_name: "beam-search".to_string(),
            language_model_name: "uniform".to_string(),
        }
    }
}
