use crate::error::LatticeError;
use crate::lattice::{LigatureTable, SegmentId};
use crate::types::{AlignedToken, DecodedPath};

/// Collapses a decoded path into tokens.
///
/// Starting at transition `i`, following transitions are absorbed while they
/// emit nothing or consume the same nonzero segment id as `i`. Segment ranges
/// of absorbed transitions are unioned, costs summed and symbols concatenated.
/// Tokens without text are dropped.
pub fn merge_transitions(
    path: &DecodedPath,
    ligatures: &LigatureTable,
) -> Result<Vec<AlignedToken>, LatticeError> {
    path.validate()?;
    let n = path.len();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < n {
        let head = path.inputs[i];
        let mut j = i + 1;
        while j < n && (path.outputs[j] == 0 || (head != 0 && path.inputs[j] == head)) {
            j += 1;
        }

        let mut text = String::new();
        let mut cost = 0.0f32;
        let mut range: Option<(u16, u16)> = None;
        for k in i..j {
            cost += path.costs[k];
            let symbol = path.outputs[k];
            if symbol != 0 {
                let piece = ligatures
                    .chr(symbol)
                    .ok_or_else(|| LatticeError::unknown_class(format!("symbol {symbol}")))?;
                text.push_str(&piece);
            }
            if path.inputs[k] != 0 {
                let sid = SegmentId::unpack(path.inputs[k]);
                range = Some(match range {
                    Some((s, e)) => (s.min(sid.start), e.max(sid.end)),
                    None => (sid.start, sid.end),
                });
            }
        }

        if !text.is_empty() {
            let segments = range
                .map(|(start, end)| SegmentId { start, end })
                .unwrap_or(SegmentId::NONE);
            tokens.push(AlignedToken {
                text,
                cost,
                segments,
            });
        }
        i = j;
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(inputs: &[u32], outputs: &[u32], costs: &[f32]) -> DecodedPath {
        DecodedPath {
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            costs: costs.to_vec(),
        }
    }

    #[test]
    fn same_segment_symbols_form_one_token() {
        let sid = SegmentId::new(2, 3).expect("fits").pack();
        let tokens = merge_transitions(
            &path(&[sid; 4], &[65, 0, 66, 0], &[1.0, 0.0, 2.0, 0.0]),
            &LigatureTable::default(),
        )
        .expect("merge");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "AB");
        assert!((tokens[0].cost - 3.0).abs() < 1e-6);
        assert_eq!(tokens[0].segments, SegmentId { start: 2, end: 3 });
    }

    #[test]
    fn inserted_space_is_its_own_token() {
        let a = SegmentId::new(1, 1).expect("fits").pack();
        let b = SegmentId::new(2, 2).expect("fits").pack();
        let tokens = merge_transitions(
            &path(&[a, 0, b], &['a' as u32, ' ' as u32, 'b' as u32], &[0.5, 0.25, 1.0]),
            &LigatureTable::default(),
        )
        .expect("merge");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", " ", "b"]);
        assert_eq!(tokens[1].segments, SegmentId::NONE);
        assert_eq!(tokens[2].segments, SegmentId { start: 2, end: 2 });
    }

    #[test]
    fn null_transitions_join_the_previous_token() {
        let a = SegmentId::new(1, 1).expect("fits").pack();
        let b = SegmentId::new(2, 2).expect("fits").pack();
        let tokens = merge_transitions(
            &path(&[a, b], &['x' as u32, 0], &[1.0, 0.5]),
            &LigatureTable::default(),
        )
        .expect("merge");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].segments, SegmentId { start: 1, end: 2 });
        assert!((tokens[0].cost - 1.5).abs() < 1e-6);
    }

    #[test]
    fn ligature_symbols_expand_to_text() {
        let table = LigatureTable::default();
        let fi = table.ord("fi").expect("registered");
        let sid = SegmentId::new(1, 1).expect("fits").pack();
        let tokens = merge_transitions(&path(&[sid], &[fi], &[0.0]), &table).expect("merge");
        assert_eq!(tokens[0].text, "fi");
    }

    #[test]
    fn empty_tokens_are_dropped() {
        let tokens = merge_transitions(&path(&[5, 0], &[0, 0], &[1.0, 1.0]), &LigatureTable::default())
            .expect("merge");
        assert!(tokens.is_empty());
    }

    #[test]
    fn unknown_symbols_are_errors() {
        let err = merge_transitions(
            &path(&[1], &[0x11_ffff], &[0.0]),
            &LigatureTable::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LatticeError::UnknownOutputClass { .. }));
    }

    #[test]
    fn mismatched_arrays_fail_fast() {
        let err = merge_transitions(&path(&[1, 2], &[65], &[0.0]), &LigatureTable::default())
            .unwrap_err();
        assert!(matches!(err, LatticeError::DecoderContract { .. }));
    }
}
