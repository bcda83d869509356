use ndarray::Array2;

use crate::error::LatticeError;
use crate::lattice::{Automaton, LatticeVariant, LigatureTable, StateId};
use crate::types::DecodedPath;

/// Scores one extracted glyph image (ink high, background 0).
pub trait Classifier: Send + Sync {
    /// `(class, probability)` pairs in any order.
    fn classify(&self, glyph: &Array2<f32>) -> Result<Vec<(String, f32)>, LatticeError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmArc {
    pub to: StateId,
    pub output: u32,
    pub cost: f32,
}

/// Weighted acceptor over output symbols, consumed one symbol at a time.
pub trait LanguageModel: Send + Sync {
    /// `None` when the model accepts nothing.
    fn start(&self) -> Option<StateId>;

    /// Arcs leaving `state` that consume `symbol`.
    fn arcs(&self, state: StateId, symbol: u32) -> Vec<LmArc>;

    /// Cost of ending in `state`; `None` if it is not final.
    fn final_cost(&self, state: StateId) -> Option<f32>;
}

/// Finds the cheapest path through a lattice composed with a language model.
pub trait Decoder: Send + Sync {
    fn decode(
        &self,
        lattice: &Automaton,
        lm: &dyn LanguageModel,
        beam: usize,
    ) -> Result<DecodedPath, LatticeError>;
}

/// Candidate-group enumeration as used by the line pipeline.
pub trait Grouper: Send {
    fn set_segmentation(&mut self, labels: &Array2<u32>) -> Result<usize, LatticeError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(r0, c0, r1, c1)` of group `i`.
    fn bounding_box(&self, i: usize) -> Option<(usize, usize, usize, usize)>;

    fn extract_with_mask(
        &self,
        source: &Array2<f32>,
        i: usize,
        grow: usize,
    ) -> Result<Option<(Array2<f32>, Array2<bool>)>, LatticeError>;

    fn set_class(&mut self, i: usize, class: &str, cost: f32) -> Result<(), LatticeError>;

    fn set_space_cost(&mut self, i: usize, yes: f32, no: f32) -> Result<(), LatticeError>;

    fn lattice(
        &self,
        variant: LatticeVariant,
        ligatures: &LigatureTable,
    ) -> Result<Automaton, LatticeError>;

    /// Segmentation the groups refer to, after any renumbering.
    fn segmentation(&self) -> Option<&Array2<u32>>;
}
