use ndarray::Array2;

use crate::config::GrouperConfig;
use crate::error::LatticeError;
use crate::geometry::{max_label, median, renumber_by_x_center, seg_boxes, union_opt, BBox};
use crate::lattice::{Automaton, LatticeBuilder, LatticeInput, LatticeVariant, LigatureTable, SegmentId};
use crate::types::{Group, Hypothesis, SpaceCost};

mod correspondence;
mod extract;
mod persist;

/// Enumerates candidate characters of one text line and collects the
/// classifier's hypotheses for them.
///
/// Holds per-line state: call [`set_segmentation`](Self::set_segmentation)
/// (or [`clear_lattice`](Self::clear_lattice)) before scoring another line.
#[derive(Debug, Clone, Default)]
pub struct SegmentGrouper {
    config: GrouperConfig,
    segmentation: Option<Array2<u32>>,
    groups: Vec<Group>,
    hypotheses: Vec<Vec<Hypothesis>>,
    space_costs: Vec<SpaceCost>,
    /// `(preferred, raw)` label pairs sharing more than a few pixels.
    correspondences: Option<Vec<(u32, u32)>>,
}

impl SegmentGrouper {
    pub fn new(config: GrouperConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &GrouperConfig {
        &self.config
    }

    /// Sets a raw segmentation and enumerates candidate groups of up to
    /// `max_range` consecutive components. Returns the number of groups.
    pub fn set_segmentation(
        &mut self,
        labels: &Array2<u32>,
        preferred: Option<&Array2<u32>>,
    ) -> Result<usize, LatticeError> {
        let segmentation = renumber_by_x_center(labels);
        let n = max_label(&segmentation);
        SegmentId::new(n, n)?;

        let correspondences = preferred
            .map(|p| correspondence::collect(&segmentation, p))
            .transpose()?;

        let boxes = seg_boxes(&segmentation);
        let mut groups = Vec::new();
        for i in 1..=n {
            for r in 1..=self.config.max_range {
                let mut bbox: Option<BBox> = None;
                let mut gap = 0i64;
                let mut labels = Vec::with_capacity(r);
                for j in i..(i + r as u32).min(n + 1) {
                    let Some(&b) = boxes.get(&j) else {
                        continue;
                    };
                    if let Some(acc) = bbox {
                        gap = gap.max(acc.gap_to(&b));
                    }
                    bbox = Some(union_opt(bbox, &b));
                    labels.push(j);
                }
                let Some(bbox) = bbox else {
                    continue;
                };
                if r > 1 {
                    if labels.len() != r {
                        continue;
                    }
                    if gap > self.config.max_dist {
                        continue;
                    }
                    if 1.0 / bbox.aspect() > self.config.max_aspect {
                        continue;
                    }
                }
                groups.push(Group { bbox, labels });
            }
        }

        let candidates = groups.len();
        let heights: Vec<f32> = groups.iter().map(|g| g.bbox.height() as f32).collect();
        if let Some(median_height) = median(&heights) {
            let limit = self.config.max_width * median_height;
            groups.retain(|g| g.labels.len() == 1 || (g.bbox.width() as f32) < limit);
        }
        tracing::debug!(
            components = n,
            candidates,
            groups = groups.len(),
            "grouping: enumerated candidate groups"
        );

        self.segmentation = Some(segmentation);
        self.groups = groups;
        self.correspondences = correspondences;
        self.clear_lattice();
        Ok(self.groups.len())
    }

    /// Sets a segmentation that is already one label per character; exactly
    /// one group per label, no renumbering.
    pub fn set_c_segmentation(&mut self, labels: &Array2<u32>) -> Result<usize, LatticeError> {
        let n = max_label(labels);
        SegmentId::new(n, n)?;
        self.groups = seg_boxes(labels)
            .into_iter()
            .map(|(label, bbox)| Group {
                bbox,
                labels: vec![label],
            })
            .collect();
        self.segmentation = Some(labels.clone());
        self.correspondences = None;
        self.clear_lattice();
        Ok(self.groups.len())
    }

    /// Drops all hypotheses and space costs, keeping the groups.
    pub fn clear_lattice(&mut self) {
        let n = self.groups.len();
        self.hypotheses = vec![Vec::new(); n];
        self.space_costs = vec![SpaceCost::default(); n];
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, i: usize) -> Option<&Group> {
        self.groups.get(i)
    }

    pub fn segmentation(&self) -> Option<&Array2<u32>> {
        self.segmentation.as_ref()
    }

    /// Bounding box of group `i` as `(r0, c0, r1, c1)`.
    pub fn bounding_box(&self, i: usize) -> Option<(usize, usize, usize, usize)> {
        self.group(i).map(|g| g.bbox.raster())
    }

    /// First raw component of group `i`.
    pub fn start(&self, i: usize) -> Option<u32> {
        self.group(i).map(Group::start)
    }

    /// Last raw component of group `i`.
    pub fn end(&self, i: usize) -> Option<u32> {
        self.group(i).map(Group::end)
    }

    pub fn segments(&self, i: usize) -> Option<&[u32]> {
        self.group(i).map(|g| g.labels.as_slice())
    }

    pub fn is_group_empty(&self, i: usize) -> bool {
        self.group(i).map_or(true, |g| g.bbox.is_empty())
    }

    pub fn hypotheses(&self, i: usize) -> Option<&[Hypothesis]> {
        self.hypotheses.get(i).map(Vec::as_slice)
    }

    pub fn space_cost(&self, i: usize) -> Option<SpaceCost> {
        self.space_costs.get(i).copied()
    }

    /// Adds a hypothesis for group `i`. Earlier hypotheses are kept.
    pub fn set_class(&mut self, i: usize, class: &str, cost: f32) -> Result<(), LatticeError> {
        self.check_index(i)?;
        check_hypothesis(class, cost)
            .map_err(|msg| LatticeError::invalid_input(format!("group {i}: {msg}")))?;
        self.hypotheses[i].push(Hypothesis {
            class: class.to_string(),
            cost,
        });
        Ok(())
    }

    /// Adds a hypothesis given as a code point.
    pub fn set_class_code(&mut self, i: usize, code: u32, cost: f32) -> Result<(), LatticeError> {
        let c = char::from_u32(code).ok_or_else(|| {
            LatticeError::invalid_input(format!("class out of range: {code} ({code:#x})"))
        })?;
        self.set_class(i, c.encode_utf8(&mut [0; 4]), cost)
    }

    /// Cost of inserting (`yes`) or not inserting (`no`) a space after group `i`.
    pub fn set_space_cost(&mut self, i: usize, yes: f32, no: f32) -> Result<(), LatticeError> {
        self.check_index(i)?;
        self.space_costs[i] = SpaceCost { yes, no };
        Ok(())
    }

    pub fn lattice(
        &self,
        variant: LatticeVariant,
        ligatures: &LigatureTable,
    ) -> Result<Automaton, LatticeError> {
        LatticeBuilder::new(variant, ligatures).build(LatticeInput {
            groups: &self.groups,
            hypotheses: &self.hypotheses,
            space_costs: &self.space_costs,
            max_label: self.segmentation.as_ref().map(max_label),
        })
    }

    fn check_index(&self, i: usize) -> Result<(), LatticeError> {
        if i >= self.groups.len() {
            return Err(LatticeError::invalid_input(format!(
                "group index {i} out of range ({} groups)",
                self.groups.len()
            )));
        }
        Ok(())
    }

    fn require_segmentation(&self) -> Result<&Array2<u32>, LatticeError> {
        self.segmentation
            .as_ref()
            .ok_or_else(|| LatticeError::invalid_state("grouper has no segmentation"))
    }
}

/// Classes are non-empty and free of control characters, costs finite and
/// non-negative.
pub(crate) fn check_hypothesis(class: &str, cost: f32) -> Result<(), String> {
    if class.is_empty() {
        return Err("empty class".to_string());
    }
    if let Some(c) = class.chars().find(|c| c.is_control()) {
        return Err(format!("class {class:?} contains control character {c:?}"));
    }
    if !cost.is_finite() || cost < 0.0 {
        return Err(format!("cost must be finite and non-negative, got {cost}"));
    }
    Ok(())
}
