//! Run-scoped set of fingerprints already accepted into the sorted tree.

use super::traits::Fingerprint;
use std::collections::HashSet;

/// Fingerprints seen so far in one run.
///
/// Grows for the whole run and is never pruned; memory is bounded by the
/// number of unique images in the source tree.
#[derive(Debug, Default)]
pub struct SeenFingerprints {
    inner: HashSet<Fingerprint>,
}

impl SeenFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when an image with this fingerprint was already accepted.
    /// Must be asked before [`record`](Self::record) for the same file.
    pub fn is_duplicate(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.contains(fingerprint)
    }

    /// Remember an accepted image's fingerprint
    pub fn record(&mut self, fingerprint: Fingerprint) {
        self.inner.insert(fingerprint);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_is_not_a_duplicate() {
        let mut seen = SeenFingerprints::new();
        let fp = Fingerprint::from_bytes(vec![0xAA; 8]);

        assert!(!seen.is_duplicate(&fp));
        seen.record(fp.clone());
        assert!(seen.is_duplicate(&fp));
    }

    #[test]
    fn recording_twice_keeps_one_entry() {
        let mut seen = SeenFingerprints::new();
        seen.record(Fingerprint::from_bytes(vec![1; 8]));
        seen.record(Fingerprint::from_bytes(vec![1; 8]));
        seen.record(Fingerprint::from_bytes(vec![2; 8]));

        assert_eq!(seen.len(), 2);
        assert!(!seen.is_empty());
    }
}
