mod automaton;
pub mod builder;
mod ligatures;
mod segment_id;

use serde::{Deserialize, Serialize};

pub use automaton::{Automaton, StateId, Transition};
pub use builder::{LatticeBuilder, LatticeInput, MAX_TRANSITION_COST, SPACE_SYMBOL};
pub use ligatures::{LigatureTable, LIGATURE_BASE};
pub use segment_id::SegmentId;

/// How hypothesis costs are attributed when a space may follow a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatticeVariant {
    /// One transition per code point of the class.
    #[default]
    Plain,
    /// One transition per class, resolved through a [`LigatureTable`].
    Ligature,
}
