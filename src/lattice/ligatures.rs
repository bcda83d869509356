use std::collections::HashMap;

/// First symbol assigned to multi-character ligatures; above the Unicode range
/// so it can never collide with a real code point.
pub const LIGATURE_BASE: u32 = 0x11_0000;

const DEFAULT_LIGATURES: &[&str] = &["ff", "fi", "fl", "ffi", "ffl", "ft", "st", "ct", "''", ",,"];

/// Maps output classes to lattice symbols and back.
///
/// Single characters use their code point. Multi-character classes must be
/// registered first.
#[derive(Debug, Clone)]
pub struct LigatureTable {
    by_name: HashMap<String, u32>,
    by_code: HashMap<u32, String>,
    next_code: u32,
}

impl LigatureTable {
    pub fn empty() -> Self {
        Self {
            by_name: HashMap::new(),
            by_code: HashMap::new(),
            next_code: LIGATURE_BASE,
        }
    }

    /// Registers `name` and returns its symbol. Registering twice returns the
    /// existing symbol.
    pub fn add(&mut self, name: &str) -> u32 {
        if let Some(code) = self.ord(name) {
            return code;
        }
        let code = self.next_code;
        self.next_code += 1;
        self.by_name.insert(name.to_string(), code);
        self.by_code.insert(code, name.to_string());
        code
    }

    pub fn ord(&self, name: &str) -> Option<u32> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c as u32),
            (Some(_), Some(_)) => self.by_name.get(name).copied(),
            (None, _) => None,
        }
    }

    /// Text for `code`; symbol 0 is the empty string.
    pub fn chr(&self, code: u32) -> Option<String> {
        if code == 0 {
            return Some(String::new());
        }
        if let Some(name) = self.by_code.get(&code) {
            return Some(name.clone());
        }
        char::from_u32(code).map(String::from)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for LigatureTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for name in DEFAULT_LIGATURES {
            table.add(name);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chars_map_to_code_points() {
        let table = LigatureTable::default();
        assert_eq!(table.ord("A"), Some(65));
        assert_eq!(table.ord("é"), Some(0xE9));
        assert_eq!(table.chr(65).as_deref(), Some("A"));
        assert_eq!(table.chr(0).as_deref(), Some(""));
    }

    #[test]
    fn registered_ligatures_round_trip() {
        let table = LigatureTable::default();
        let code = table.ord("ffi").expect("default ligature");
        assert!(code >= LIGATURE_BASE);
        assert_eq!(table.chr(code).as_deref(), Some("ffi"));
    }

    #[test]
    fn unknown_names_and_codes() {
        let table = LigatureTable::default();
        assert_eq!(table.ord("xyz"), None);
        assert_eq!(table.ord(""), None);
        assert_eq!(table.chr(LIGATURE_BASE + 10_000), None);
    }

    #[test]
    fn add_is_idempotent() {
        let mut table = LigatureTable::empty();
        let a = table.add("ae");
        let b = table.add("ae");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
        assert_eq!(table.add("x"), 'x' as u32);
        assert_eq!(table.len(), 1);
    }
}
