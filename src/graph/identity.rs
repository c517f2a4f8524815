use std::sync::atomic::{AtomicU64, Ordering};

/// Issues `prefix + sequence` identifiers.
///
/// Every call advances the sequence, so a value is handed out at most once by
/// one generator. Ids that were created with an explicit value (imports,
/// well-known ids) are skipped by probing the store before returning.
#[derive(Debug)]
pub struct IdentityGenerator {
    prefix: String,
    sequence: AtomicU64,
}

impl IdentityGenerator {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            sequence: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the next candidate for which `taken` answers false.
    pub fn next_unused(&self, mut taken: impl FnMut(&str) -> bool) -> String {
        loop {
            let value = self.sequence.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{}{value}", self.prefix);
            if !taken(&candidate) {
                return candidate;
            }
            tracing::debug!(%candidate, "identifier already in use, retrying");
        }
    }
}
