use ndarray::Array2;
use rayon::prelude::*;

use crate::alignment::compute_alignment;
use crate::config::PipelineConfig;
use crate::error::LatticeError;
use crate::lattice::LigatureTable;
use crate::pipeline::recognizer::LineRecognizer;
use crate::pipeline::registry::GrouperFactory;
use crate::pipeline::traits::{Decoder, LanguageModel};
use crate::types::{AlignmentResult, DecodedPath, LineInput};

/// Line OCR: candidate lattice, decoding against a language model, alignment.
pub struct LineOcr {
    config: PipelineConfig,
    grouper_factory: GrouperFactory,
    recognizer: LineRecognizer,
    decoder: Box<dyn Decoder>,
    language_model: Box<dyn LanguageModel>,
    ligatures: LigatureTable,
}

pub(crate) struct LineOcrParts {
    pub config: PipelineConfig,
    pub grouper_factory: GrouperFactory,
    pub recognizer: LineRecognizer,
    pub decoder: Box<dyn Decoder>,
    pub language_model: Box<dyn LanguageModel>,
    pub ligatures: LigatureTable,
}

impl LineOcr {
    pub(crate) fn from_parts(parts: LineOcrParts) -> Self {
        Self {
            config: parts.config,
            grouper_factory: parts.grouper_factory,
            recognizer: parts.recognizer,
            decoder: parts.decoder,
            language_model: parts.language_model,
            ligatures: parts.ligatures,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ligatures(&self) -> &LigatureTable {
        &self.ligatures
    }

    pub fn recognize(&self, line: &LineInput) -> Result<AlignmentResult, LatticeError> {
        if line.rseg.iter().all(|&v| v == 0) {
            return Ok(empty_result(line.rseg.dim()));
        }

        // groupers hold per-line state, so every line gets its own
        let mut grouper = (self.grouper_factory)(&self.config.grouper);
        let (lattice, rseg) = self.recognizer.recognize_line(
            grouper.as_mut(),
            line,
            self.config.lattice,
            &self.ligatures,
        )?;
        let result = compute_alignment(
            &lattice,
            &rseg,
            self.language_model.as_ref(),
            self.decoder.as_ref(),
            self.config.beam_width,
            &self.ligatures,
        )?;
        if result.tokens.is_empty() {
            tracing::warn!(
                states = lattice.num_states(),
                "line ocr: decoder found no path through the lattice"
            );
        }
        Ok(result)
    }

    /// Recognizes independent lines in parallel; results keep input order.
    pub fn recognize_page(&self, lines: &[LineInput]) -> Vec<Result<AlignmentResult, LatticeError>> {
        lines.par_iter().map(|line| self.recognize(line)).collect()
    }
}

fn empty_result(dim: (usize, usize)) -> AlignmentResult {
    AlignmentResult {
        output: String::new(),
        tokens: Vec::new(),
        bboxes: Vec::new(),
        cseg: Array2::zeros(dim),
        cost: 0.0,
        path: DecodedPath::default(),
    }
}
