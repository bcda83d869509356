use std::collections::HashSet;
use std::sync::Mutex;

/// Emits each warning at most once per call site.
///
/// Shared by the recognizer across lines, so one bad classifier output does not
/// flood the log on every glyph of a page.
#[derive(Debug, Default)]
pub struct Reporter {
    seen: Mutex<HashSet<&'static str>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `message` unless `site` has already warned. Returns whether it logged.
    pub fn warn_once(&self, site: &'static str, message: &str) -> bool {
        let first = match self.seen.lock() {
            Ok(mut seen) => seen.insert(site),
            Err(poisoned) => poisoned.into_inner().insert(site),
        };
        if first {
            tracing::warn!(site, "{message}");
        }
        first
    }

    pub fn has_warned(&self, site: &'static str) -> bool {
        match self.seen.lock() {
            Ok(seen) => seen.contains(site),
            Err(poisoned) => poisoned.into_inner().contains(site),
        }
    }
}
