use crate::error::LatticeError;
use crate::lattice::{Automaton, LatticeVariant, LigatureTable, SegmentId, StateId};
use crate::types::{Group, Hypothesis, SpaceCost, REJECT_CLASS, SKIP_CLASS};

/// Transitions at or above this cost are never materialized.
pub const MAX_TRANSITION_COST: f32 = 1000.0;

pub const SPACE_SYMBOL: u32 = ' ' as u32;

/// Per-group lattice material, indexed in parallel.
#[derive(Debug, Clone, Copy)]
pub struct LatticeInput<'a> {
    pub groups: &'a [Group],
    pub hypotheses: &'a [Vec<Hypothesis>],
    pub space_costs: &'a [SpaceCost],
    /// Largest label of the segmentation the groups came from, when known.
    pub max_label: Option<u32>,
}

impl LatticeInput<'_> {
    fn check(&self) -> Result<(), LatticeError> {
        let n = self.groups.len();
        if self.hypotheses.len() != n || self.space_costs.len() != n {
            return Err(LatticeError::invalid_state(format!(
                "{n} groups but {} hypothesis lists and {} space costs",
                self.hypotheses.len(),
                self.space_costs.len()
            )));
        }
        if let Some((i, group)) = self
            .groups
            .iter()
            .enumerate()
            .find(|(_, g)| g.start() == 0 || g.start() > g.end())
        {
            return Err(LatticeError::invalid_state(format!(
                "group {i} has invalid segment range {}:{}",
                group.start(),
                group.end()
            )));
        }
        Ok(())
    }
}

/// Turns scored groups into a recognition lattice.
///
/// State `b - 1` is segment boundary `b` for `b` in `1..=final`; auxiliary
/// states for multi-symbol classes and space branches follow. Unreachable
/// states are trimmed before the lattice is returned, which compacts ids.
pub struct LatticeBuilder<'a> {
    variant: LatticeVariant,
    ligatures: &'a LigatureTable,
}

impl<'a> LatticeBuilder<'a> {
    pub fn new(variant: LatticeVariant, ligatures: &'a LigatureTable) -> Self {
        Self { variant, ligatures }
    }

    pub fn build(&self, input: LatticeInput<'_>) -> Result<Automaton, LatticeError> {
        input.check()?;
        let mut fst = Automaton::new();

        let Some(final_boundary) = input.groups.iter().map(|g| g.end() + 1).max() else {
            let only = fst.new_state();
            fst.set_start(only);
            fst.set_accept(only);
            tracing::debug!("lattice: no groups, single-state lattice");
            return Ok(fst);
        };
        if let Some(max_label) = input.max_label {
            if final_boundary != max_label + 1 {
                return Err(LatticeError::invalid_state(format!(
                    "groups end at boundary {final_boundary} but segmentation has {max_label} labels"
                )));
            }
        }

        let boundaries: Vec<StateId> = (1..=final_boundary).map(|_| fst.new_state()).collect();
        let boundary = |b: u32| boundaries[(b - 1) as usize];
        fst.set_start(boundary(1));
        fst.set_accept(boundary(final_boundary));

        for (i, group) in input.groups.iter().enumerate() {
            let sid = group.segment_id()?;
            let space = input.space_costs[i].effective();
            let from = boundary(group.start());
            let to = boundary(group.end() + 1);
            for hyp in &input.hypotheses[i] {
                if hyp.class.is_empty() || hyp.class == REJECT_CLASS {
                    continue;
                }
                if hyp.class == SKIP_CLASS {
                    if hyp.cost < MAX_TRANSITION_COST {
                        fst.add_transition(from, to, 0, hyp.cost, sid.pack());
                    }
                    continue;
                }
                match self.variant {
                    LatticeVariant::Plain => add_plain(&mut fst, from, to, hyp, space, sid),
                    LatticeVariant::Ligature => {
                        let symbol = self
                            .ligatures
                            .ord(&hyp.class)
                            .ok_or_else(|| LatticeError::unknown_class(hyp.class.as_str()))?;
                        add_ligature(&mut fst, from, to, symbol, hyp.cost, space, sid);
                    }
                }
            }
        }

        let trimmed = fst.trim_unreachable();
        tracing::debug!(
            variant = ?self.variant,
            groups = input.groups.len(),
            final_boundary,
            states = fst.num_states(),
            transitions = fst.num_transitions(),
            trimmed,
            "lattice: built"
        );
        if let Some(accept) = fst.accept() {
            if !fst.reachable()[accept] {
                tracing::warn!(final_boundary, "lattice: accept state is not reachable");
            }
        }
        Ok(fst)
    }
}

fn add_plain(
    fst: &mut Automaton,
    from: StateId,
    to: StateId,
    hyp: &Hypothesis,
    space: SpaceCost,
    sid: SegmentId,
) {
    let input = sid.pack();
    let symbols: Vec<u32> = hyp.class.chars().map(u32::from).collect();
    let n = symbols.len();
    let mut state = from;
    for (k, &symbol) in symbols.iter().enumerate() {
        let first = k == 0;
        let last = k + 1 == n;
        let next = if last { to } else { fst.new_state() };

        let mut cost = 0.0;
        if first {
            cost += hyp.cost;
        }
        if last {
            cost += space.no;
        }
        if cost < MAX_TRANSITION_COST {
            fst.add_transition(state, next, symbol, cost, input);
        }

        if last && space.yes < MAX_TRANSITION_COST {
            let branch_cost = if first { hyp.cost } else { 0.0 };
            if branch_cost < MAX_TRANSITION_COST {
                let space_state = fst.new_state();
                fst.add_transition(state, space_state, symbol, branch_cost, input);
                fst.add_transition(
                    space_state,
                    next,
                    SPACE_SYMBOL,
                    space.yes,
                    SegmentId::NONE.pack(),
                );
            }
        }
        state = next;
    }
}

fn add_ligature(
    fst: &mut Automaton,
    from: StateId,
    to: StateId,
    symbol: u32,
    cost: f32,
    space: SpaceCost,
    sid: SegmentId,
) {
    let input = sid.pack();
    let direct = cost + space.no;
    if direct < MAX_TRANSITION_COST {
        fst.add_transition(from, to, symbol, direct, input);
    }
    // The whole classification cost sits on the first transition of the space branch.
    if cost + space.yes < MAX_TRANSITION_COST {
        let space_state = fst.new_state();
        fst.add_transition(from, space_state, symbol, cost, input);
        fst.add_transition(
            space_state,
            to,
            SPACE_SYMBOL,
            space.yes,
            SegmentId::NONE.pack(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;

    fn group(labels: &[u32]) -> Group {
        Group {
            bbox: BBox::new(0, 0, 1, 1),
            labels: labels.to_vec(),
        }
    }

    fn hyp(class: &str, cost: f32) -> Hypothesis {
        Hypothesis {
            class: class.to_string(),
            cost,
        }
    }

    fn build(
        variant: LatticeVariant,
        groups: &[Group],
        hypotheses: &[Vec<Hypothesis>],
        space_costs: &[SpaceCost],
    ) -> Result<Automaton, LatticeError> {
        let table = LigatureTable::default();
        LatticeBuilder::new(variant, &table).build(LatticeInput {
            groups,
            hypotheses,
            space_costs,
            max_label: None,
        })
    }

    #[test]
    fn single_character_without_space() {
        let fst = build(
            LatticeVariant::Plain,
            &[group(&[1])],
            &[vec![hyp("A", 0.25)]],
            &[SpaceCost::default()],
        )
        .expect("build");
        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.start(), Some(0));
        assert_eq!(fst.accept(), Some(1));
        let arcs = fst.transitions(0);
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].output, 'A' as u32);
        assert_eq!(arcs[0].to, 1);
        assert!((arcs[0].cost - 0.25).abs() < 1e-6);
        assert_eq!(SegmentId::unpack(arcs[0].input), SegmentId { start: 1, end: 1 });
    }

    #[test]
    fn space_branch_rejoins_end_boundary() {
        let fst = build(
            LatticeVariant::Plain,
            &[group(&[1])],
            &[vec![hyp("A", 1.0)]],
            &[SpaceCost { yes: 0.5, no: 0.25 }],
        )
        .expect("build");
        assert_eq!(fst.num_states(), 3);
        let arcs = fst.transitions(0);
        assert_eq!(arcs.len(), 2);
        assert!((arcs[0].cost - 1.25).abs() < 1e-6);
        let branch = arcs[1];
        assert_eq!(branch.output, 'A' as u32);
        assert!((branch.cost - 1.0).abs() < 1e-6);
        let space = fst.transitions(branch.to);
        assert_eq!(space.len(), 1);
        assert_eq!(space[0].output, SPACE_SYMBOL);
        assert_eq!(space[0].input, 0);
        assert_eq!(space[0].to, 1);
        assert!((space[0].cost - 0.5).abs() < 1e-6);
    }

    #[test]
    fn multi_code_point_class_walks_intermediate_states() {
        let fst = build(
            LatticeVariant::Plain,
            &[group(&[1, 2])],
            &[vec![hyp("fi", 2.0)]],
            &[SpaceCost { yes: 0.5, no: 0.0 }],
        )
        .expect("build");
        // boundaries 1 and 3, one intermediate, one space state; boundary 2 is trimmed
        assert_eq!(fst.num_states(), 4);
        let first = fst.transitions(0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].output, 'f' as u32);
        assert!((first[0].cost - 2.0).abs() < 1e-6);
        let mid = fst.transitions(first[0].to);
        assert_eq!(mid.len(), 2);
        assert!(mid.iter().all(|t| t.output == 'i' as u32));
        assert!(mid.iter().all(|t| t.cost == 0.0));
        assert!(fst.reachable().iter().all(|r| *r));
    }

    #[test]
    fn expensive_transitions_are_dropped() {
        let fst = build(
            LatticeVariant::Plain,
            &[group(&[1]), group(&[2])],
            &[vec![hyp("a", 999.5)], vec![hyp("b", 0.0)]],
            &[SpaceCost { yes: 0.6, no: 0.6 }, SpaceCost { yes: 2000.0, no: 0.0 }],
        )
        .expect("build");
        assert!(fst
            .iter_transitions()
            .all(|(_, t)| t.cost < MAX_TRANSITION_COST));
        // only the space branch of the first group survives
        let spaces = fst
            .iter_transitions()
            .filter(|(_, t)| t.output == SPACE_SYMBOL)
            .count();
        assert_eq!(spaces, 1);
    }

    #[test]
    fn reject_class_is_skipped() {
        let fst = build(
            LatticeVariant::Plain,
            &[group(&[1])],
            &[vec![hyp(REJECT_CLASS, 0.0), hyp("x", 0.0)]],
            &[SpaceCost::default()],
        )
        .expect("build");
        assert_eq!(fst.num_transitions(), 1);
        assert_eq!(fst.transitions(0)[0].output, 'x' as u32);
    }

    #[test]
    fn skip_class_bridges_its_group_silently() {
        for variant in [LatticeVariant::Plain, LatticeVariant::Ligature] {
            let fst = build(
                variant,
                &[group(&[1]), group(&[2])],
                &[
                    vec![hyp("a", 0.1)],
                    vec![hyp(SKIP_CLASS, 7.0), hyp(REJECT_CLASS, 0.0)],
                ],
                &[SpaceCost::default(), SpaceCost { yes: 0.5, no: 0.0 }],
            )
            .expect("build");
            let skips: Vec<_> = fst
                .iter_transitions()
                .filter(|(_, t)| t.output == 0)
                .map(|(_, t)| *t)
                .collect();
            assert_eq!(skips.len(), 1);
            assert!((skips[0].cost - 7.0).abs() < 1e-6);
            assert_eq!(SegmentId::unpack(skips[0].input), SegmentId { start: 2, end: 2 });
            assert_eq!(fst.accept(), Some(skips[0].to));
            assert!(fst.reachable().iter().all(|r| *r));
        }
    }

    #[test]
    fn unreachable_boundaries_are_trimmed() {
        // group 2 covers label 2 only, but nothing reaches boundary 2
        let fst = build(
            LatticeVariant::Plain,
            &[group(&[1, 2]), group(&[2])],
            &[vec![hyp("m", 0.0)], vec![hyp("n", 0.0)]],
            &[SpaceCost::default(), SpaceCost::default()],
        )
        .expect("build");
        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.accept(), Some(1));
        assert!(fst.reachable().iter().all(|r| *r));
    }

    #[test]
    fn ligature_variant_emits_one_symbol() {
        let table = LigatureTable::default();
        let fst = build(
            LatticeVariant::Ligature,
            &[group(&[1, 2])],
            &[vec![hyp("ffi", 1.5)]],
            &[SpaceCost { yes: 0.5, no: 0.25 }],
        )
        .expect("build");
        let arcs = fst.transitions(0);
        assert_eq!(arcs.len(), 2);
        let code = table.ord("ffi").expect("registered");
        assert!(arcs.iter().all(|t| t.output == code));
        assert!((arcs[0].cost - 1.75).abs() < 1e-6);
        assert!((arcs[1].cost - 1.5).abs() < 1e-6);
    }

    #[test]
    fn ligature_variant_rejects_unknown_class() {
        let err = build(
            LatticeVariant::Ligature,
            &[group(&[1])],
            &[vec![hyp("qz", 0.0)]],
            &[SpaceCost::default()],
        )
        .unwrap_err();
        assert!(matches!(err, LatticeError::UnknownOutputClass { class } if class == "qz"));
    }

    #[test]
    fn no_groups_gives_single_state() {
        let fst = build(LatticeVariant::Plain, &[], &[], &[]).expect("build");
        assert_eq!(fst.num_states(), 1);
        assert_eq!(fst.start(), fst.accept());
    }

    #[test]
    fn mismatched_segmentation_is_rejected() {
        let table = LigatureTable::default();
        let groups = [group(&[1])];
        let err = LatticeBuilder::new(LatticeVariant::Plain, &table)
            .build(LatticeInput {
                groups: &groups,
                hypotheses: &[vec![hyp("a", 0.0)]],
                space_costs: &[SpaceCost::default()],
                max_label: Some(3),
            })
            .unwrap_err();
        assert!(matches!(err, LatticeError::InvalidState { .. }));
    }
}
