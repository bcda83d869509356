use ndarray::Array2;

use crate::geometry::{max_label, seg_boxes, union_opt, BBox};
use crate::types::AlignedToken;

/// Pixel-level character segmentation derived from aligned tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct CharSegmentation {
    /// Token index + 1 per pixel; 0 for background and unowned components.
    pub cseg: Array2<u32>,
    /// Union of the raw component boxes of every token that owns pixels.
    pub bboxes: Vec<BBox>,
}

/// Maps raw components to the tokens whose segment range covers them.
///
/// Later tokens win when ranges overlap. Tokens with an unassigned range own
/// nothing.
pub fn char_segmentation(rseg: &Array2<u32>, tokens: &[AlignedToken]) -> CharSegmentation {
    // segment ids cannot name labels beyond u16
    let top = (max_label(rseg) as usize).min(u16::MAX as usize);
    let mut rmap = vec![0u32; top + 1];
    for (k, token) in tokens.iter().enumerate() {
        if !token.segments.is_assigned() {
            continue;
        }
        let start = token.segments.start as usize;
        let end = (token.segments.end as usize).min(top);
        for slot in rmap.iter_mut().take(end + 1).skip(start) {
            *slot = k as u32 + 1;
        }
    }

    let cseg = rseg.mapv(|label| rmap.get(label as usize).copied().unwrap_or(0));
    let boxes = seg_boxes(rseg);
    let mut owned: Vec<Option<BBox>> = vec![None; tokens.len()];
    for (label, bbox) in &boxes {
        let Some(&owner) = rmap.get(*label as usize) else {
            continue;
        };
        if owner == 0 {
            continue;
        }
        let slot = &mut owned[owner as usize - 1];
        *slot = Some(union_opt(*slot, bbox));
    }
    let bboxes: Vec<BBox> = owned.into_iter().flatten().collect();

    if bboxes.is_empty() && rseg.iter().any(|&v| v != 0) {
        tracing::warn!(
            tokens = tokens.len(),
            components = top,
            "alignment: no component maps to a token"
        );
        return CharSegmentation {
            cseg: Array2::zeros(rseg.dim()),
            bboxes: Vec::new(),
        };
    }
    CharSegmentation { cseg, bboxes }
}
