use std::collections::HashMap;

use crate::lattice::{Automaton, StateId};
use crate::pipeline::traits::LanguageModel;
use crate::types::DecodedPath;

#[derive(Debug, Clone, Copy)]
struct Step {
    input: u32,
    output: u32,
    cost: f32,
    prev: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Hyp {
    lattice: StateId,
    lm: StateId,
    cost: f32,
    /// Last step in the arena; `None` at the start pair.
    tail: Option<usize>,
}

/// Step-synchronous beam search over `lattice ∘ lm`.
///
/// Lattice transitions with output 0 do not advance the language model. Equal
/// `(lattice, lm)` pairs are recombined keeping the cheaper one, and each step
/// keeps the `beam` cheapest pairs. Returns the cheapest accepted path, or an
/// empty path when nothing reaches a final pair.
pub fn beam_search(lattice: &Automaton, lm: &dyn LanguageModel, beam: usize) -> DecodedPath {
    let (Some(start), Some(lm_start)) = (lattice.start(), lm.start()) else {
        return DecodedPath::default();
    };
    let beam = beam.max(1);

    let mut arena: Vec<Step> = Vec::new();
    let mut frontier = vec![Hyp {
        lattice: start,
        lm: lm_start,
        cost: 0.0,
        tail: None,
    }];
    let mut best: Option<(f32, Option<usize>, f32)> = None;
    let max_steps = lattice.num_states() + 1;

    for _ in 0..max_steps {
        for hyp in &frontier {
            if !lattice.is_accept(hyp.lattice) {
                continue;
            }
            if let Some(final_cost) = lm.final_cost(hyp.lm) {
                let total = hyp.cost + final_cost;
                if best.map_or(true, |(b, _, _)| total < b) {
                    best = Some((total, hyp.tail, final_cost));
                }
            }
        }

        let mut next: HashMap<(StateId, StateId), Hyp> = HashMap::new();
        for hyp in &frontier {
            for t in lattice.transitions(hyp.lattice) {
                let moves: Vec<(StateId, u32, f32)> = if t.output == 0 {
                    vec![(hyp.lm, 0, 0.0)]
                } else {
                    lm.arcs(hyp.lm, t.output)
                        .into_iter()
                        .map(|arc| (arc.to, arc.output, arc.cost))
                        .collect()
                };
                for (lm_to, output, lm_cost) in moves {
                    let cost = hyp.cost + t.cost + lm_cost;
                    let key = (t.to, lm_to);
                    if next.get(&key).is_some_and(|h| h.cost <= cost) {
                        continue;
                    }
                    arena.push(Step {
                        input: t.input,
                        output,
                        cost: t.cost + lm_cost,
                        prev: hyp.tail,
                    });
                    next.insert(
                        key,
                        Hyp {
                            lattice: t.to,
                            lm: lm_to,
                            cost,
                            tail: Some(arena.len() - 1),
                        },
                    );
                }
            }
        }
        if next.is_empty() {
            break;
        }

        frontier = next.into_values().collect();
        frontier.sort_by(|a, b| {
            a.cost
                .total_cmp(&b.cost)
                .then(a.lattice.cmp(&b.lattice))
                .then(a.lm.cmp(&b.lm))
        });
        frontier.truncate(beam);
    }

    let Some((total, tail, final_cost)) = best else {
        tracing::debug!(states = lattice.num_states(), "beam search: no accepted path");
        return DecodedPath::default();
    };

    let mut path = DecodedPath::default();
    let mut cursor = tail;
    while let Some(idx) = cursor {
        let step = arena[idx];
        path.inputs.push(step.input);
        path.outputs.push(step.output);
        path.costs.push(step.cost);
        cursor = step.prev;
    }
    path.inputs.reverse();
    path.outputs.reverse();
    path.costs.reverse();
    if let Some(last) = path.costs.last_mut() {
        *last += final_cost;
    }
    tracing::debug!(steps = path.len(), cost = total, "beam search: best path");
    path
}
