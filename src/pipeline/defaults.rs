use ndarray::Array2;

use crate::alignment::beam_search;
use crate::config::GrouperConfig;
use crate::error::LatticeError;
use crate::grouping::SegmentGrouper;
use crate::lattice::{Automaton, LatticeVariant, LigatureTable};
use crate::pipeline::traits::{Decoder, Grouper, LanguageModel};
use crate::types::DecodedPath;

pub struct BeamSearchDecoder;

impl Decoder for BeamSearchDecoder {
    fn decode(
        &self,
        lattice: &Automaton,
        lm: &dyn LanguageModel,
        beam: usize,
    ) -> Result<DecodedPath, LatticeError> {
        Ok(beam_search(lattice, lm, beam))
    }
}

impl Grouper for SegmentGrouper {
    fn set_segmentation(&mut self, labels: &Array2<u32>) -> Result<usize, LatticeError> {
        SegmentGrouper::set_segmentation(self, labels, None)
    }

    fn len(&self) -> usize {
        SegmentGrouper::len(self)
    }

    fn bounding_box(&self, i: usize) -> Option<(usize, usize, usize, usize)> {
        SegmentGrouper::bounding_box(self, i)
    }

    fn extract_with_mask(
        &self,
        source: &Array2<f32>,
        i: usize,
        grow: usize,
    ) -> Result<Option<(Array2<f32>, Array2<bool>)>, LatticeError> {
        SegmentGrouper::extract_with_mask(self, source, i, grow, 0.0, None)
    }

    fn set_class(&mut self, i: usize, class: &str, cost: f32) -> Result<(), LatticeError> {
        SegmentGrouper::set_class(self, i, class, cost)
    }

    fn set_space_cost(&mut self, i: usize, yes: f32, no: f32) -> Result<(), LatticeError> {
        SegmentGrouper::set_space_cost(self, i, yes, no)
    }

    fn lattice(
        &self,
        variant: LatticeVariant,
        ligatures: &LigatureTable,
    ) -> Result<Automaton, LatticeError> {
        SegmentGrouper::lattice(self, variant, ligatures)
    }

    fn segmentation(&self) -> Option<&Array2<u32>> {
        SegmentGrouper::segmentation(self)
    }
}

/// Grouper for segmentations that already carry one label per character.
#[derive(Debug, Clone, Default)]
pub struct CharacterGrouper {
    inner: SegmentGrouper,
}

impl CharacterGrouper {
    pub fn new(config: GrouperConfig) -> Self {
        Self {
            inner: SegmentGrouper::new(config),
        }
    }

    pub fn inner(&self) -> &SegmentGrouper {
        &self.inner
    }
}

impl Grouper for CharacterGrouper {
    fn set_segmentation(&mut self, labels: &Array2<u32>) -> Result<usize, LatticeError> {
        self.inner.set_c_segmentation(labels)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn bounding_box(&self, i: usize) -> Option<(usize, usize, usize, usize)> {
        self.inner.bounding_box(i)
    }

    fn extract_with_mask(
        &self,
        source: &Array2<f32>,
        i: usize,
        grow: usize,
    ) -> Result<Option<(Array2<f32>, Array2<bool>)>, LatticeError> {
        self.inner.extract_with_mask(source, i, grow, 0.0, None)
    }

    fn set_class(&mut self, i: usize, class: &str, cost: f32) -> Result<(), LatticeError> {
        self.inner.set_class(i, class, cost)
    }

    fn set_space_cost(&mut self, i: usize, yes: f32, no: f32) -> Result<(), LatticeError> {
        self.inner.set_space_cost(i, yes, no)
    }

    fn lattice(
        &self,
        variant: LatticeVariant,
        ligatures: &LigatureTable,
    ) -> Result<Automaton, LatticeError> {
        self.inner.lattice(variant, ligatures)
    }

    fn segmentation(&self) -> Option<&Array2<u32>> {
        self.inner.segmentation()
    }
}
