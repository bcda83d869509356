pub mod alignment;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod grouping;
pub mod language;
pub mod lattice;
pub mod pipeline;
pub mod types;

pub use alignment::compute_alignment;
pub use config::{GrouperConfig, PipelineConfig, RecognizerConfig};
pub use error::LatticeError;
pub use grouping::SegmentGrouper;
pub use lattice::{Automaton, LatticeBuilder, LatticeVariant, LigatureTable, SegmentId};
pub use pipeline::builder::LineOcrBuilder;
pub use pipeline::runtime::LineOcr;
pub use pipeline::traits::{Classifier, Decoder, Grouper, LanguageModel, LmArc};
pub use types::{AlignedToken, AlignmentResult, DecodedPath, LineInput};
