use ndarray::Array2;

use ocrolattice::alignment::compute_alignment;
use ocrolattice::language::{NGraphModel, Normalization, UniformLanguageModel};
use ocrolattice::pipeline::defaults::BeamSearchDecoder;
use ocrolattice::{
    Classifier, LatticeError, LatticeVariant, LigatureTable, LineInput, LineOcrBuilder,
    PipelineConfig, SegmentGrouper, SegmentId,
};

/// Glyphs of the given widths, 10 px tall, separated by 4 px gaps.
fn line(widths: &[usize]) -> LineInput {
    let total: usize = widths.iter().sum::<usize>() + 4 * widths.len() + 2;
    let mut rseg = Array2::zeros((12, total));
    let mut image = Array2::from_elem((12, total), 255u8);
    let mut x = 1;
    for (k, &w) in widths.iter().enumerate() {
        for y in 1..11 {
            for c in x..x + w {
                rseg[[y, c]] = k as u32 + 1;
                image[[y, c]] = 0;
            }
        }
        x += w + 4;
    }
    LineInput { rseg, image }
}

/// Decides by glyph width (the crop includes a one pixel margin on each side).
struct ByWidth;

impl Classifier for ByWidth {
    fn classify(&self, glyph: &Array2<f32>) -> Result<Vec<(String, f32)>, LatticeError> {
        let cols = glyph.ncols();
        let out: &[(&str, f32)] = if cols <= 5 {
            &[("i", 0.8), ("l", 0.2)]
        } else if cols >= 10 {
            &[("m", 0.9), ("n", 0.1)]
        } else {
            &[("c", 0.5), ("e", 0.5)]
        };
        Ok(out.iter().map(|(c, p)| (c.to_string(), *p)).collect())
    }
}

struct Always(&'static str);

impl Classifier for Always {
    fn classify(&self, _glyph: &Array2<f32>) -> Result<Vec<(String, f32)>, LatticeError> {
        Ok(vec![(self.0.to_string(), 0.9)])
    }
}

#[test]
fn single_zero_cost_group_decodes_to_its_class() {
    let mut rseg = Array2::zeros((4, 4));
    rseg[[1, 1]] = 1;
    rseg[[2, 1]] = 1;
    let mut grouper = SegmentGrouper::default();
    assert_eq!(grouper.set_segmentation(&rseg, None).unwrap(), 1);
    grouper.set_class(0, "A", 0.0).unwrap();
    grouper.set_space_cost(0, 5.0, 0.0).unwrap();
    let table = LigatureTable::default();
    let lattice = grouper.lattice(LatticeVariant::Plain, &table).unwrap();

    let result = compute_alignment(
        &lattice,
        grouper.segmentation().unwrap(),
        &UniformLanguageModel::new(0.0),
        &BeamSearchDecoder,
        100,
        &table,
    )
    .unwrap();
    assert_eq!(result.output, "A");
    assert_eq!(result.cost, 0.0);
    assert_eq!(result.cseg, rseg);
    assert_eq!(result.bboxes.len(), 1);
}

#[test]
fn line_is_recognized_and_segmented() {
    let ocr = LineOcrBuilder::new(PipelineConfig::default())
        .with_classifier(Box::new(ByWidth))
        .build()
        .unwrap();
    let input = line(&[3, 8, 3]);
    let result = ocr.recognize(&input).unwrap();

    assert_eq!(result.output, "imi");
    assert_eq!(result.tokens.len(), 3);
    let expected = -(0.8f32.ln()) * 2.0 - 0.9f32.ln();
    assert!((result.cost - expected).abs() < 1e-4);
    assert_eq!(result.bboxes.len(), 3);
    assert_eq!(result.cseg[[5, 1]], 1);
    assert_eq!(result.cseg[[5, 10]], 2);
    assert_eq!(result.cseg[[5, 21]], 3);
    assert_eq!(result.cseg[[0, 0]], 0);
}

/// Rejects wide glyphs, reads everything else as `i`.
struct RejectWide;

impl Classifier for RejectWide {
    fn classify(&self, glyph: &Array2<f32>) -> Result<Vec<(String, f32)>, LatticeError> {
        let class = if glyph.ncols() >= 10 { "~" } else { "i" };
        Ok(vec![(class.to_string(), 0.8)])
    }
}

#[test]
fn rejected_glyph_does_not_lose_the_line() {
    let ocr = LineOcrBuilder::new(PipelineConfig::default())
        .with_classifier(Box::new(RejectWide))
        .build()
        .unwrap();
    let input = line(&[3, 3, 8, 3, 3]);
    let result = ocr.recognize(&input).unwrap();

    assert_eq!(result.output, "iiii");
    assert_eq!(result.tokens.len(), 4);
    // the skipped glyph folds into the token before it
    assert_eq!(result.tokens[1].segments, SegmentId { start: 2, end: 3 });
    assert_eq!(result.cseg[[5, 17]], 2);
    assert_eq!(result.cseg[[5, 29]], 3);
    // eight columns plus one pixel of mask growth on each side
    let expected = -(0.8f32.ln()) * 4.0 + 10.0;
    assert!((result.cost - expected).abs() < 1e-4);
}

#[test]
fn language_model_resolves_ambiguous_glyphs() {
    let lm = NGraphModel::from_lines(
        ["the then there", "the other one", "then the end"],
        3,
        Normalization::Basic,
        20.0,
    )
    .unwrap();
    let ocr = LineOcrBuilder::new(PipelineConfig::default())
        .with_classifier(Box::new(TheClassifier))
        .with_language_model(Box::new(lm))
        .build()
        .unwrap();
    let result = ocr.recognize(&line(&[3, 8, 5])).unwrap();
    assert_eq!(result.output, "the");
}

/// `t` for narrow glyphs, `h` for wide ones, `c`/`e` undecided otherwise.
struct TheClassifier;

impl Classifier for TheClassifier {
    fn classify(&self, glyph: &Array2<f32>) -> Result<Vec<(String, f32)>, LatticeError> {
        let cols = glyph.ncols();
        let out: Vec<(&str, f32)> = if cols <= 5 {
            vec![("t", 0.9)]
        } else if cols >= 10 {
            vec![("h", 0.9)]
        } else {
            vec![("c", 0.5), ("e", 0.5)]
        };
        Ok(out.into_iter().map(|(c, p)| (c.to_string(), p)).collect())
    }
}

#[test]
fn ligature_variant_keeps_ligatures_whole() {
    let config = PipelineConfig {
        lattice: LatticeVariant::Ligature,
        ..PipelineConfig::default()
    };
    let ocr = LineOcrBuilder::new(config)
        .with_classifier(Box::new(Always("fi")))
        .build()
        .unwrap();
    let result = ocr.recognize(&line(&[6])).unwrap();
    assert_eq!(result.output, "fi");
    assert_eq!(result.tokens.len(), 1);
    assert_eq!(result.path.len(), 1);
}

#[test]
fn unknown_ligature_is_an_error() {
    let config = PipelineConfig {
        lattice: LatticeVariant::Ligature,
        ..PipelineConfig::default()
    };
    let ocr = LineOcrBuilder::new(config)
        .with_classifier(Box::new(Always("qz")))
        .build()
        .unwrap();
    let err = ocr.recognize(&line(&[6])).unwrap_err();
    assert!(matches!(err, LatticeError::UnknownOutputClass { .. }));
}

#[test]
fn page_lines_run_independently() {
    let ocr = LineOcrBuilder::new(PipelineConfig::default())
        .with_classifier(Box::new(ByWidth))
        .build()
        .unwrap();
    let blank = LineInput {
        rseg: Array2::zeros((12, 20)),
        image: Array2::from_elem((12, 20), 255u8),
    };
    let lines = vec![line(&[3, 8, 3]), blank, line(&[8])];
    let results = ocr.recognize_page(&lines);
    assert_eq!(results.len(), 3);
    let outputs: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().output)
        .collect();
    assert_eq!(outputs, vec!["imi", "", "m"]);
}

#[test]
fn character_grouper_from_config() {
    let config = PipelineConfig {
        grouper_name: "character".to_string(),
        ..PipelineConfig::default()
    };
    let ocr = LineOcrBuilder::new(config)
        .with_classifier(Box::new(ByWidth))
        .build()
        .unwrap();
    let result = ocr.recognize(&line(&[8, 3])).unwrap();
    assert_eq!(result.output, "mi");
}
