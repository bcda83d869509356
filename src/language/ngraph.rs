use std::collections::HashMap;
use std::sync::Mutex;

use regex::Regex;

use crate::error::LatticeError;
use crate::lattice::StateId;
use crate::pipeline::traits::{LanguageModel, LmArc};

/// Padding character around every training line.
const PAD: char = '_';
/// Pseudo-symbol carrying the reserved mass for unseen continuations.
const REJECT: char = '~';
/// Lines shorter than this are not counted.
const MIN_LINE_CHARS: usize = 3;

const BASIC_RULES: &[(&str, &str)] = &[
    (r"[\x00-\x1f]", ""),
    (r"\s+", " "),
    (r"~", ""),
    (r"`", "'"),
    ("\u{00b4}", "'"),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{017f}", "s"),
    ("\u{021a}", ","),
    ("\"", "''"),
    ("\u{201c}", "''"),
    ("\u{201d}", "''"),
    ("\u{201e}", ",,"),
    ("\u{201f}", "''"),
];

const COLLAPSE_RULES: &[(&str, &str)] = &[
    (r"[0-9]", "9"),
    (r#"[^-=A-Za-z0-9.,?:()"/' ]"#, "!"),
];

/// Text normalization applied to training lines and to decoded symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Drop control characters and rejects, unify quotes and whitespace.
    #[default]
    Basic,
    /// `Basic`, then fold digits to `9` and other specials to `!`.
    Collapsed,
}

/// Character n-graph model `P(c_i | c_{i-n+1} .. c_{i-1})`.
///
/// States are contexts of the last `n - 1` characters, interned on first use.
/// A context never seen in training charges `backoff` per character.
#[derive(Debug)]
pub struct NGraphModel {
    n: usize,
    backoff: f32,
    rules: Vec<(Regex, &'static str)>,
    /// Negative log posteriors per context.
    posteriors: HashMap<String, HashMap<char, f32>>,
    contexts: Mutex<Interner>,
}

#[derive(Debug, Default)]
struct Interner {
    ids: HashMap<String, StateId>,
    names: Vec<String>,
}

impl Interner {
    fn intern(&mut self, context: &str) -> StateId {
        if let Some(&id) = self.ids.get(context) {
            return id;
        }
        let id = self.names.len();
        self.names.push(context.to_string());
        self.ids.insert(context.to_string(), id);
        id
    }
}

impl NGraphModel {
    pub fn from_lines<I, S>(
        lines: I,
        n: usize,
        normalization: Normalization,
        backoff: f32,
    ) -> Result<Self, LatticeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if n < 2 {
            return Err(LatticeError::invalid_input(format!(
                "n-graph order must be at least 2, got {n}"
            )));
        }
        let rules = compile_rules(normalization)?;

        let mut counts: HashMap<String, HashMap<char, usize>> = HashMap::new();
        let mut total = 0usize;
        for line in lines {
            let line = line.as_ref();
            if line.chars().count() < MIN_LINE_CHARS {
                continue;
            }
            let line = apply_rules(&rules, line);
            let padded: Vec<char> = std::iter::repeat(PAD)
                .take(n - 1)
                .chain(line.chars())
                .chain(std::iter::repeat(PAD).take(n - 1))
                .collect();
            for window in padded.windows(n) {
                let context: String = window[..n - 1].iter().collect();
                *counts
                    .entry(context)
                    .or_default()
                    .entry(window[n - 1])
                    .or_default() += 1;
                total += 1;
            }
        }

        let posteriors = counts
            .into_iter()
            .map(|(context, next)| {
                let mass = next.values().sum::<usize>() + 1;
                let log_total = (mass as f32).ln();
                let mut costs: HashMap<char, f32> = next
                    .into_iter()
                    .map(|(c, count)| (c, log_total - (count as f32).ln()))
                    .collect();
                costs.insert(REJECT, log_total);
                (context, costs)
            })
            .collect::<HashMap<_, _>>();

        tracing::debug!(
            n,
            ngraphs = total,
            contexts = posteriors.len(),
            "language: built n-graph model"
        );

        Ok(Self {
            n,
            backoff,
            rules,
            posteriors,
            contexts: Mutex::new(Interner::default()),
        })
    }

    pub fn order(&self) -> usize {
        self.n
    }

    /// Normalizes a line the same way training text was normalized.
    pub fn normalize(&self, text: &str) -> String {
        apply_rules(&self.rules, text)
    }

    /// Cost of `next` after `context`.
    pub fn cost(&self, context: &str, next: char) -> f32 {
        match self.posteriors.get(context) {
            Some(costs) => costs
                .get(&next)
                .or_else(|| costs.get(&REJECT))
                .copied()
                .unwrap_or(self.backoff),
            None => self.backoff,
        }
    }

    /// Total cost of a whole line, including the end padding.
    pub fn line_cost(&self, text: &str) -> f32 {
        let mut context: String = std::iter::repeat(PAD).take(self.n - 1).collect();
        let mut cost = 0.0;
        for c in self.normalize(text).chars().chain(std::iter::once(PAD)) {
            cost += self.cost(&context, c);
            context = self.shift(&context, c);
        }
        cost
    }

    fn shift(&self, context: &str, c: char) -> String {
        let mut chars: Vec<char> = context.chars().collect();
        chars.push(c);
        let keep = self.n - 1;
        chars[chars.len().saturating_sub(keep)..].iter().collect()
    }

    fn with_contexts<R>(&self, f: impl FnOnce(&mut Interner) -> R) -> R {
        match self.contexts.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn context_name(&self, state: StateId) -> Option<String> {
        self.with_contexts(|interner| interner.names.get(state).cloned())
    }
}

impl LanguageModel for NGraphModel {
    fn start(&self) -> Option<StateId> {
        let context: String = std::iter::repeat(PAD).take(self.n - 1).collect();
        Some(self.with_contexts(|interner| interner.intern(&context)))
    }

    fn arcs(&self, state: StateId, symbol: u32) -> Vec<LmArc> {
        let Some(mut context) = self.context_name(state) else {
            return Vec::new();
        };
        let Some(c) = char::from_u32(symbol) else {
            return vec![LmArc {
                to: state,
                output: symbol,
                cost: self.backoff,
            }];
        };
        let mut cost = 0.0;
        for ch in self.normalize(c.encode_utf8(&mut [0; 4])).chars() {
            cost += self.cost(&context, ch);
            context = self.shift(&context, ch);
        }
        let to = self.with_contexts(|interner| interner.intern(&context));
        vec![LmArc {
            to,
            output: symbol,
            cost,
        }]
    }

    fn final_cost(&self, state: StateId) -> Option<f32> {
        let context = self.context_name(state)?;
        Some(self.cost(&context, PAD))
    }
}

fn compile_rules(normalization: Normalization) -> Result<Vec<(Regex, &'static str)>, LatticeError> {
    let extra: &[(&str, &str)] = match normalization {
        Normalization::Basic => &[],
        Normalization::Collapsed => COLLAPSE_RULES,
    };
    BASIC_RULES
        .iter()
        .chain(extra)
        .map(|&(pattern, replacement)| {
            Regex::new(pattern)
                .map(|re| (re, replacement))
                .map_err(|e| LatticeError::runtime("compile normalization rule", e))
        })
        .collect()
}

fn apply_rules(rules: &[(Regex, &'static str)], text: &str) -> String {
    rules.iter().fold(text.to_string(), |acc, (re, replacement)| {
        re.replace_all(&acc, *replacement).into_owned()
    })
}
