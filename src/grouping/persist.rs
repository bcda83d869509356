//! Plain-text lattice files.
//!
//! ```text
//! segment <i>\t<start>:<end>\t<x0>:<y0>:<x1>:<y1>\t<yes> <no>
//! chr <i>\t<j>\t<cost>\t<class>
//! ```
//!
//! `chr` records follow the `segment` record they belong to. Lines starting
//! with `#` and blank lines are ignored. The class is the rest of the line and
//! may contain spaces.

use std::io::{BufRead, Write};
use std::str::FromStr;

use ndarray::Array2;

use super::{check_hypothesis, SegmentGrouper};
use crate::error::LatticeError;
use crate::geometry::BBox;
use crate::types::{Group, Hypothesis, SpaceCost};

impl SegmentGrouper {
    pub fn save_lattice<W: Write>(&self, mut out: W) -> Result<(), LatticeError> {
        let write_err = |e: std::io::Error| LatticeError::io("write lattice", e);
        for (i, group) in self.groups.iter().enumerate() {
            // effective costs are written, so an unscored group reloads as (999999, 0)
            let space = self.space_costs.get(i).copied().unwrap_or_default().effective();
            let b = &group.bbox;
            writeln!(
                out,
                "segment {i}\t{}:{}\t{}:{}:{}:{}\t{:.4} {:.4}",
                group.start(),
                group.end(),
                b.x0,
                b.y0,
                b.x1,
                b.y1,
                space.yes,
                space.no
            )
            .map_err(write_err)?;
            for (j, h) in self.hypotheses.get(i).into_iter().flatten().enumerate() {
                writeln!(out, "chr {i}\t{j:4}\t{:.4}\t{}", h.cost, h.class).map_err(write_err)?;
            }
        }
        out.flush().map_err(write_err)
    }

    /// Replaces groups and hypotheses with the contents of a lattice file.
    /// Nothing is changed when the file is malformed.
    pub fn load_lattice<R: BufRead>(
        &mut self,
        reader: R,
        segmentation: Option<Array2<u32>>,
    ) -> Result<(), LatticeError> {
        let mut groups: Vec<Group> = Vec::new();
        let mut hypotheses: Vec<Vec<Hypothesis>> = Vec::new();
        let mut space_costs: Vec<SpaceCost> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let lineno = idx + 1;
            let line = line.map_err(|e| LatticeError::io("read lattice", e))?;
            let mut fields = Fields::new(&line);
            match fields.next_token() {
                None => continue,
                Some(tag) if tag.starts_with('#') => continue,
                Some("segment") => {
                    let i: usize = field(fields.next_token(), "segment index", lineno)?;
                    if i != groups.len() {
                        return Err(LatticeError::parse(
                            lineno,
                            format!("segment {i} out of order, expected {}", groups.len()),
                        ));
                    }
                    let range = split_numbers::<u32>(fields.next_token(), 2, "segment range", lineno)?;
                    let (start, end) = (range[0], range[1]);
                    if start == 0 || start > end {
                        return Err(LatticeError::parse(
                            lineno,
                            format!("invalid segment range {start}:{end}"),
                        ));
                    }
                    let b = split_numbers::<usize>(fields.next_token(), 4, "bounding box", lineno)?;
                    let yes: f32 = field(fields.next_token(), "space cost", lineno)?;
                    let no: f32 = field(fields.next_token(), "no-space cost", lineno)?;
                    groups.push(Group {
                        bbox: BBox::new(b[0], b[1], b[2], b[3]),
                        labels: (start..=end).collect(),
                    });
                    hypotheses.push(Vec::new());
                    space_costs.push(SpaceCost { yes, no });
                }
                Some("chr") => {
                    let i: usize = field(fields.next_token(), "segment index", lineno)?;
                    if groups.is_empty() || i != groups.len() - 1 {
                        return Err(LatticeError::parse(
                            lineno,
                            format!("chr record for segment {i} does not follow its segment"),
                        ));
                    }
                    let j: usize = field(fields.next_token(), "hypothesis index", lineno)?;
                    if j != hypotheses[i].len() {
                        return Err(LatticeError::parse(
                            lineno,
                            format!("hypothesis {j} out of order, expected {}", hypotheses[i].len()),
                        ));
                    }
                    let cost: f32 = field(fields.next_token(), "cost", lineno)?;
                    let class = fields.remainder();
                    if class.is_empty() {
                        return Err(LatticeError::parse(lineno, "missing class"));
                    }
                    check_hypothesis(class, cost).map_err(|msg| LatticeError::parse(lineno, msg))?;
                    hypotheses[i].push(Hypothesis {
                        class: class.to_string(),
                        cost,
                    });
                }
                Some(other) => {
                    return Err(LatticeError::parse(lineno, format!("unknown record '{other}'")));
                }
            }
        }

        tracing::debug!(groups = groups.len(), "grouping: loaded lattice");
        self.groups = groups;
        self.hypotheses = hypotheses;
        self.space_costs = space_costs;
        self.segmentation = segmentation;
        self.correspondences = None;
        Ok(())
    }
}

/// Whitespace tokenizer that can hand back the untokenized rest of the line.
struct Fields<'a> {
    rest: &'a str,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            rest: line.trim_end_matches(['\r', '\n']),
        }
    }

    fn next_token(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        if trimmed.is_empty() {
            self.rest = trimmed;
            return None;
        }
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (token, rest) = trimmed.split_at(end);
        self.rest = rest;
        Some(token)
    }

    /// Everything after the single separator following the last token.
    fn remainder(&mut self) -> &'a str {
        let mut chars = self.rest.chars();
        if chars.next().is_some_and(char::is_whitespace) {
            self.rest = chars.as_str();
        }
        std::mem::take(&mut self.rest)
    }
}

fn field<T: FromStr>(token: Option<&str>, what: &str, lineno: usize) -> Result<T, LatticeError> {
    let token = token.ok_or_else(|| LatticeError::parse(lineno, format!("missing {what}")))?;
    token
        .parse()
        .map_err(|_| LatticeError::parse(lineno, format!("invalid {what} '{token}'")))
}

fn split_numbers<T: FromStr>(
    token: Option<&str>,
    count: usize,
    what: &str,
    lineno: usize,
) -> Result<Vec<T>, LatticeError> {
    let token = token.ok_or_else(|| LatticeError::parse(lineno, format!("missing {what}")))?;
    let values = token
        .split(':')
        .map(|part| field(Some(part), what, lineno))
        .collect::<Result<Vec<T>, _>>()?;
    if values.len() != count {
        return Err(LatticeError::parse(
            lineno,
            format!("{what} needs {count} values, got '{token}'"),
        ));
    }
    Ok(values)
}
