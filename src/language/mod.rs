//! Language models the decoder can compose with a recognition lattice.

mod ngraph;

pub use ngraph::{NGraphModel, Normalization};

use crate::lattice::{Automaton, StateId};
use crate::pipeline::traits::{LanguageModel, LmArc};

/// Single-state model charging the same cost for every symbol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformLanguageModel {
    pub cost: f32,
}

impl UniformLanguageModel {
    pub fn new(cost: f32) -> Self {
        Self { cost }
    }
}

impl LanguageModel for UniformLanguageModel {
    fn start(&self) -> Option<StateId> {
        Some(0)
    }

    fn arcs(&self, _state: StateId, symbol: u32) -> Vec<LmArc> {
        vec![LmArc {
            to: 0,
            output: symbol,
            cost: self.cost,
        }]
    }

    fn final_cost(&self, _state: StateId) -> Option<f32> {
        Some(0.0)
    }
}

/// An automaton used as an acceptor: arcs consume their `input` symbol.
impl LanguageModel for Automaton {
    fn start(&self) -> Option<StateId> {
        Automaton::start(self)
    }

    fn arcs(&self, state: StateId, symbol: u32) -> Vec<LmArc> {
        self.transitions(state)
            .iter()
            .filter(|t| t.input == symbol)
            .map(|t| LmArc {
                to: t.to,
                output: t.output,
                cost: t.cost,
            })
            .collect()
    }

    fn final_cost(&self, state: StateId) -> Option<f32> {
        self.is_accept(state).then_some(0.0)
    }
}
