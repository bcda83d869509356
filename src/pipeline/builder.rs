use std::path::Path;

use crate::config::PipelineConfig;
use crate::error::LatticeError;
use crate::lattice::LigatureTable;
use crate::pipeline::recognizer::LineRecognizer;
use crate::pipeline::registry;
use crate::pipeline::runtime::{LineOcr, LineOcrParts};
use crate::pipeline::traits::{Classifier, Decoder, LanguageModel};

pub struct LineOcrBuilder {
    config: PipelineConfig,
    classifier: Option<Box<dyn Classifier>>,
    language_model: Option<Box<dyn LanguageModel>>,
    decoder: Option<Box<dyn Decoder>>,
    ligatures: Option<LigatureTable>,
}

impl LineOcrBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            classifier: None,
            language_model: None,
            decoder: None,
            ligatures: None,
        }
    }

    pub fn from_config_file(path: &Path) -> Result<Self, LatticeError> {
        Ok(Self::new(PipelineConfig::load(path)?))
    }

    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_language_model(mut self, language_model: Box<dyn LanguageModel>) -> Self {
        self.language_model = Some(language_model);
        self
    }

    pub fn with_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn with_ligatures(mut self, ligatures: LigatureTable) -> Self {
        self.ligatures = Some(ligatures);
        self
    }

    pub fn build(self) -> Result<LineOcr, LatticeError> {
        let classifier = self
            .classifier
            .ok_or_else(|| LatticeError::invalid_state("line ocr needs a classifier"))?;
        let grouper_factory = registry::grouper(&self.config.grouper_name)?;
        let decoder = match self.decoder {
            Some(decoder) => decoder,
            None => registry::decoder(&self.config.decoder_name)?,
        };
        let language_model = match self.language_model {
            Some(lm) => lm,
            None => registry::language_model(&self.config.language_model_name)?,
        };
        let beam_width = if self.config.beam_width == 0 {
            PipelineConfig::DEFAULT_BEAM_WIDTH
        } else {
            self.config.beam_width
        };
        let config = PipelineConfig {
            beam_width,
            ..self.config
        };

        tracing::debug!(
            grouper = %config.grouper_name,
            decoder = %config.decoder_name,
            language_model = %config.language_model_name,
            lattice = ?config.lattice,
            beam_width,
            "line ocr: assembled pipeline"
        );

        Ok(LineOcr::from_parts(LineOcrParts {
            recognizer: LineRecognizer::new(config.recognizer.clone(), classifier),
            grouper_factory,
            decoder,
            language_model,
            ligatures: self.ligatures.unwrap_or_default(),
            config,
        }))
    }
}
