use ndarray::Array2;

use crate::config::RecognizerConfig;
use crate::diagnostics::Reporter;
use crate::error::LatticeError;
use crate::geometry::median;
use crate::lattice::{Automaton, LatticeVariant, LigatureTable};
use crate::pipeline::traits::{Classifier, Grouper};
use crate::types::{LineInput, REJECT_CLASS, SKIP_CLASS};

/// Scores every candidate group of a line with a classifier and produces the
/// recognition lattice.
pub struct LineRecognizer {
    config: RecognizerConfig,
    classifier: Box<dyn Classifier>,
    reporter: Reporter,
}

impl LineRecognizer {
    pub fn new(config: RecognizerConfig, classifier: Box<dyn Classifier>) -> Self {
        Self {
            config,
            classifier,
            reporter: Reporter::new(),
        }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Returns the lattice and the segmentation its segment ids refer to.
    pub fn recognize_line(
        &self,
        grouper: &mut dyn Grouper,
        line: &LineInput,
        variant: LatticeVariant,
        ligatures: &LigatureTable,
    ) -> Result<(Automaton, Array2<u32>), LatticeError> {
        if line.rseg.dim() != line.image.dim() {
            return Err(LatticeError::invalid_input(format!(
                "segmentation shape {:?} does not match image shape {:?}",
                line.rseg.dim(),
                line.image.dim()
            )));
        }
        let groups = grouper.set_segmentation(&line.rseg)?;
        self.score_groups(grouper, &line.image)?;
        let lattice = grouper.lattice(variant, ligatures)?;
        let rseg = grouper
            .segmentation()
            .cloned()
            .unwrap_or_else(|| line.rseg.clone());
        tracing::debug!(
            groups,
            states = lattice.num_states(),
            transitions = lattice.num_transitions(),
            "recognizer: line lattice ready"
        );
        Ok((lattice, rseg))
    }

    /// Classifies each group of `grouper` and records the hypotheses.
    pub fn score_groups(
        &self,
        grouper: &mut dyn Grouper,
        image: &Array2<u8>,
    ) -> Result<(), LatticeError> {
        let heights: Vec<f32> = (0..grouper.len())
            .filter_map(|i| grouper.bounding_box(i))
            .map(|(r0, _, r1, _)| (r1 - r0) as f32)
            .collect();
        let Some(median_height) = median(&heights) else {
            return Ok(());
        };
        let min_letter_height = self.config.min_height_letters * median_height;

        let inverted = image.mapv(|v| f32::from(255 - v) / 255.0);
        for i in 0..grouper.len() {
            let Some((r0, _, r1, _)) = grouper.bounding_box(i) else {
                continue;
            };
            let height = (r1 - r0) as f32;
            let Some((glyph, _mask)) =
                grouper.extract_with_mask(&inverted, i, self.config.mask_grow)?
            else {
                continue;
            };
            // skipping keeps every boundary reachable when all classes are filtered out
            grouper.set_class(i, SKIP_CLASS, self.config.skip_scale * glyph.ncols() as f32)?;

            let mut outputs: Vec<(String, f32)> = Vec::new();
            for (class, p) in self.classifier.classify(&glyph)? {
                if p.is_nan() || p <= 0.0 {
                    self.reporter.warn_once(
                        "recognizer.non_positive_probability",
                        "classifier returned a non-positive probability; output skipped",
                    );
                    continue;
                }
                outputs.push((class, (-p.ln()).max(0.0)));
            }
            outputs.sort_by(|a, b| a.1.total_cmp(&b.1));

            for (class, cost) in outputs.into_iter().take(self.config.best) {
                if class == REJECT_CLASS {
                    continue;
                }
                // letters are never small
                let is_letter = class.chars().next().is_some_and(char::is_alphabetic);
                if is_letter && height < min_letter_height {
                    continue;
                }
                grouper.set_class(i, &class, cost.min(self.config.max_cost))?;
                grouper.set_space_cost(i, self.config.space_cost, self.config.no_space_cost)?;
            }
        }
        Ok(())
    }
}
