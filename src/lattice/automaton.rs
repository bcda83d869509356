use std::collections::VecDeque;

pub type StateId = usize;

/// Weighted transition. In a recognition lattice `input` is a packed
/// [`SegmentId`](super::SegmentId) and `output` the emitted symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub to: StateId,
    pub input: u32,
    pub output: u32,
    pub cost: f32,
}

/// Weighted finite-state transducer with a single start and a single accept state.
#[derive(Debug, Clone, Default)]
pub struct Automaton {
    arcs: Vec<Vec<Transition>>,
    start: Option<StateId>,
    accept: Option<StateId>,
}

impl Automaton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_state(&mut self) -> StateId {
        self.arcs.push(Vec::new());
        self.arcs.len() - 1
    }

    pub fn num_states(&self) -> usize {
        self.arcs.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.arcs.iter().map(Vec::len).sum()
    }

    pub fn set_start(&mut self, state: StateId) {
        self.start = Some(state);
    }

    pub fn set_accept(&mut self, state: StateId) {
        self.accept = Some(state);
    }

    pub fn start(&self) -> Option<StateId> {
        self.start
    }

    pub fn accept(&self) -> Option<StateId> {
        self.accept
    }

    pub fn is_accept(&self, state: StateId) -> bool {
        self.accept == Some(state)
    }

    /// Panics if either state does not exist.
    pub fn add_transition(
        &mut self,
        from: StateId,
        to: StateId,
        output: u32,
        cost: f32,
        input: u32,
    ) {
        assert!(to < self.arcs.len(), "transition target {to} out of range");
        self.arcs[from].push(Transition {
            to,
            input,
            output,
            cost,
        });
    }

    pub fn transitions(&self, state: StateId) -> &[Transition] {
        self.arcs.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All transitions as `(from, transition)`.
    pub fn iter_transitions(&self) -> impl Iterator<Item = (StateId, &Transition)> + '_ {
        self.arcs
            .iter()
            .enumerate()
            .flat_map(|(from, arcs)| arcs.iter().map(move |t| (from, t)))
    }

    /// Reachability from the start state.
    pub fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.arcs.len()];
        let Some(start) = self.start else {
            return seen;
        };
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(state) = queue.pop_front() {
            for t in &self.arcs[state] {
                if !seen[t.to] {
                    seen[t.to] = true;
                    queue.push_back(t.to);
                }
            }
        }
        seen
    }

    /// Removes states unreachable from start, compacting ids in order. The
    /// accept state is always kept. Returns the number of removed states.
    pub fn trim_unreachable(&mut self) -> usize {
        let mut keep = self.reachable();
        if let Some(accept) = self.accept {
            keep[accept] = true;
        }
        let removed = keep.iter().filter(|k| !**k).count();
        if removed == 0 {
            return 0;
        }

        let mut remap = vec![usize::MAX; keep.len()];
        let mut next = 0;
        for (old, &k) in keep.iter().enumerate() {
            if k {
                remap[old] = next;
                next += 1;
            }
        }

        let arcs = std::mem::take(&mut self.arcs);
        self.arcs = arcs
            .into_iter()
            .enumerate()
            .filter(|(old, _)| keep[*old])
            .map(|(_, arcs)| {
                arcs.into_iter()
                    .map(|t| Transition {
                        to: remap[t.to],
                        ..t
                    })
                    .collect()
            })
            .collect();
        self.start = self.start.map(|s| remap[s]);
        self.accept = self.accept.map(|s| remap[s]);
        removed
    }
}
