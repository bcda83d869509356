//! Decoded path to aligned transcription and character segmentation.

pub mod beam_search;
pub mod cseg;
pub mod merge;

use ndarray::Array2;

use crate::error::LatticeError;
use crate::lattice::{Automaton, LigatureTable};
use crate::pipeline::traits::{Decoder, LanguageModel};
use crate::types::{AlignmentResult, DecodedPath};

pub use beam_search::beam_search;
pub use cseg::{char_segmentation, CharSegmentation};
pub use merge::merge_transitions;

/// Decodes `lattice ∘ lm` and maps the best path back onto the raw
/// segmentation `rseg`.
pub fn compute_alignment(
    lattice: &Automaton,
    rseg: &Array2<u32>,
    lm: &dyn LanguageModel,
    decoder: &dyn Decoder,
    beam: usize,
    ligatures: &LigatureTable,
) -> Result<AlignmentResult, LatticeError> {
    let path = decoder.decode(lattice, lm, beam)?;
    align_path(path, rseg, ligatures)
}

/// Alignment of an already decoded path.
pub fn align_path(
    path: DecodedPath,
    rseg: &Array2<u32>,
    ligatures: &LigatureTable,
) -> Result<AlignmentResult, LatticeError> {
    path.validate()?;
    let tokens = merge_transitions(&path, ligatures)?;
    let CharSegmentation { cseg, bboxes } = char_segmentation(rseg, &tokens);
    let output: String = tokens.iter().map(|t| t.text.as_str()).collect();
    let cost: f32 = tokens.iter().map(|t| t.cost).sum();
    tracing::debug!(
        transitions = path.len(),
        tokens = tokens.len(),
        boxes = bboxes.len(),
        cost,
        "alignment: merged decoded path"
    );
    Ok(AlignmentResult {
        output,
        tokens,
        bboxes,
        cseg,
        cost,
        path,
    })
}
