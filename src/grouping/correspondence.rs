use std::collections::{HashMap, HashSet};

use ndarray::Array2;

use super::SegmentGrouper;
use crate::error::LatticeError;
use crate::geometry::{max_label, renumber_by_x_center};

/// Label pairs must overlap on more pixels than this to count.
const MIN_OVERLAP_PIXELS: usize = 5;

/// Cross-tabulates a preferred segmentation against the (renumbered) raw one.
pub(super) fn collect(
    segmentation: &Array2<u32>,
    preferred: &Array2<u32>,
) -> Result<Vec<(u32, u32)>, LatticeError> {
    if segmentation.dim() != preferred.dim() {
        return Err(LatticeError::invalid_input(format!(
            "preferred segmentation shape {:?} does not match {:?}",
            preferred.dim(),
            segmentation.dim()
        )));
    }
    let preferred = renumber_by_x_center(preferred);
    for label in [max_label(&preferred), max_label(segmentation)] {
        u16::try_from(label).map_err(|_| LatticeError::SegmentOverflow { label })?;
    }

    let mut counts: HashMap<u32, usize> = HashMap::new();
    for (&p, &s) in preferred.iter().zip(segmentation.iter()) {
        if p == 0 || s == 0 {
            continue;
        }
        *counts.entry((p << 16) | s).or_default() += 1;
    }
    let mut pairs: Vec<(u32, u32)> = counts
        .into_iter()
        .filter(|(_, count)| *count > MIN_OVERLAP_PIXELS)
        .map(|(key, _)| (key >> 16, key & 0xFFFF))
        .collect();
    pairs.sort_unstable();
    Ok(pairs)
}

impl SegmentGrouper {
    /// Whether group `i` spans several preferred segments.
    pub fn is_combined(&self, i: usize) -> bool {
        self.preferred_of(i).is_some_and(|p| p.len() >= 2)
    }

    /// Whether group `i` covers only part of a single preferred segment.
    pub fn is_split(&self, i: usize) -> bool {
        let (Some(pairs), Some(segments)) = (&self.correspondences, self.segments(i)) else {
            return false;
        };
        let Some(preferred) = self.preferred_of(i) else {
            return false;
        };
        if preferred.len() > 1 {
            return false;
        }
        let raw: HashSet<u32> = pairs
            .iter()
            .filter(|(p, _)| preferred.contains(p))
            .map(|(_, s)| *s)
            .collect();
        let own: HashSet<u32> = segments.iter().copied().collect();
        own != raw
    }

    fn preferred_of(&self, i: usize) -> Option<HashSet<u32>> {
        let pairs = self.correspondences.as_ref()?;
        let segments = self.segments(i)?;
        Some(
            pairs
                .iter()
                .filter(|(_, s)| segments.contains(s))
                .map(|(p, _)| *p)
                .collect(),
        )
    }
}
