use ndarray::Array2;
use serde::Serialize;

use crate::error::LatticeError;
use crate::geometry::BBox;
use crate::lattice::SegmentId;

/// Classifier label meaning "not a character"; never enters a lattice.
pub const REJECT_CLASS: &str = "~";

/// Hypothesis that consumes a group without emitting a symbol. Keeps every
/// boundary reachable when a group gets no usable class.
pub const SKIP_CLASS: &str = "<skip>";

/// Space cost stored for groups nobody scored.
pub const UNSET_SPACE_COST: f32 = 999_999.0;

/// Both space costs above this count as unset.
pub(crate) const UNSET_SPACE_THRESHOLD: f32 = 9999.0;

/// Candidate character: consecutive raw components and their union box.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub bbox: BBox,
    /// Sorted, non-empty.
    pub labels: Vec<u32>,
}

impl Group {
    pub fn start(&self) -> u32 {
        self.labels.first().copied().unwrap_or(0)
    }

    pub fn end(&self) -> u32 {
        self.labels.last().copied().unwrap_or(0)
    }

    pub fn segment_id(&self) -> Result<SegmentId, LatticeError> {
        SegmentId::new(self.start(), self.end())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// One or more code points, or a ligature name.
    pub class: String,
    pub cost: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceCost {
    pub yes: f32,
    pub no: f32,
}

impl SpaceCost {
    /// Costs as used in the lattice: an unscored group means "no space" for free.
    pub fn effective(self) -> SpaceCost {
        if self.yes > UNSET_SPACE_THRESHOLD && self.no > UNSET_SPACE_THRESHOLD {
            SpaceCost {
                yes: self.yes,
                no: 0.0,
            }
        } else {
            self
        }
    }
}

impl Default for SpaceCost {
    fn default() -> Self {
        Self {
            yes: UNSET_SPACE_COST,
            no: UNSET_SPACE_COST,
        }
    }
}

/// Best path through lattice ∘ language model, one entry per transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedPath {
    /// Packed segment ids.
    pub inputs: Vec<u32>,
    /// Emitted symbols; 0 is the null symbol.
    pub outputs: Vec<u32>,
    pub costs: Vec<f32>,
}

impl DecodedPath {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn validate(&self) -> Result<(), LatticeError> {
        if self.inputs.len() != self.outputs.len() || self.inputs.len() != self.costs.len() {
            return Err(LatticeError::DecoderContract {
                inputs: self.inputs.len(),
                outputs: self.outputs.len(),
                costs: self.costs.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedToken {
    pub text: String,
    pub cost: f32,
    /// Raw components owned by this token; `SegmentId::NONE` for inserted text.
    pub segments: SegmentId,
}

#[derive(Debug, Clone)]
pub struct AlignmentResult {
    pub output: String,
    pub tokens: Vec<AlignedToken>,
    /// One box per token that owns pixels, in token order.
    pub bboxes: Vec<BBox>,
    /// Token index + 1 per pixel; 0 for background and unowned components.
    pub cseg: Array2<u32>,
    pub cost: f32,
    pub path: DecodedPath,
}

impl AlignmentResult {
    pub fn costs(&self) -> Vec<f32> {
        self.tokens.iter().map(|t| t.cost).collect()
    }

    pub fn segments(&self) -> Vec<SegmentId> {
        self.tokens.iter().map(|t| t.segments).collect()
    }
}

/// One text line: raw connected-component labels and the grayscale line image
/// (dark ink on a light background).
#[derive(Debug, Clone)]
pub struct LineInput {
    pub rseg: Array2<u32>,
    pub image: Array2<u8>,
}
