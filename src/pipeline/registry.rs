//! Name to component tables used when a pipeline is assembled from config.

use crate::config::GrouperConfig;
use crate::error::LatticeError;
use crate::grouping::SegmentGrouper;
use crate::language::UniformLanguageModel;
use crate::pipeline::defaults::{BeamSearchDecoder, CharacterGrouper};
use crate::pipeline::traits::{Decoder, Grouper, LanguageModel};

pub type GrouperFactory = fn(&GrouperConfig) -> Box<dyn Grouper>;
pub type DecoderFactory = fn() -> Box<dyn Decoder>;
pub type LanguageModelFactory = fn() -> Box<dyn LanguageModel>;

const GROUPERS: &[(&str, GrouperFactory)] = &[
    ("segment", segment_grouper),
    ("character", character_grouper),
];

const DECODERS: &[(&str, DecoderFactory)] = &[("beam-search", beam_search_decoder)];

const LANGUAGE_MODELS: &[(&str, LanguageModelFactory)] = &[("uniform", uniform_language_model)];

fn segment_grouper(config: &GrouperConfig) -> Box<dyn Grouper> {
    Box::new(SegmentGrouper::new(config.clone()))
}

fn character_grouper(config: &GrouperConfig) -> Box<dyn Grouper> {
    Box::new(CharacterGrouper::new(config.clone()))
}

fn beam_search_decoder() -> Box<dyn Decoder> {
    Box::new(BeamSearchDecoder)
}

fn uniform_language_model() -> Box<dyn LanguageModel> {
    Box::new(UniformLanguageModel::default())
}

fn lookup<T: Copy>(table: &[(&str, T)], kind: &'static str, name: &str) -> Result<T, LatticeError> {
    table
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
        .ok_or_else(|| LatticeError::UnknownComponent {
            kind,
            name: name.to_string(),
        })
}

pub fn grouper(name: &str) -> Result<GrouperFactory, LatticeError> {
    lookup(GROUPERS, "grouper", name)
}

pub fn decoder(name: &str) -> Result<Box<dyn Decoder>, LatticeError> {
    lookup(DECODERS, "decoder", name).map(|make| make())
}

pub fn language_model(name: &str) -> Result<Box<dyn LanguageModel>, LatticeError> {
    lookup(LANGUAGE_MODELS, "language model", name).map(|make| make())
}

pub fn grouper_names() -> impl Iterator<Item = &'static str> {
    GROUPERS.iter().map(|(n, _)| *n)
}

pub fn decoder_names() -> impl Iterator<Item = &'static str> {
    DECODERS.iter().map(|(n, _)| *n)
}

pub fn language_model_names() -> impl Iterator<Item = &'static str> {
    LANGUAGE_MODELS.iter().map(|(n, _)| *n)
}
