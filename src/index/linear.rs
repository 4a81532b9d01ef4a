use crate::error::IndexError;
use crate::index::types::Fingerprint;
use crate::index::Index;
use rustc_hash::FxHashSet;

/// Exhaustive-scan index.
///
/// Every search visits every stored fingerprint, so it is only suitable for
/// small collections; its value is as an obviously-correct reference for the
/// radix trie. It has no persistence capability.
#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    entries: FxHashSet<Fingerprint>,
}

impl LinearIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.entries.contains(&fingerprint)
    }
}

impl Index for LinearIndex {
    fn insert(&mut self, fingerprint: Fingerprint) -> Result<(), IndexError> {
        self.entries.insert(fingerprint);
        Ok(())
    }

    fn search(
        &self,
        fingerprint: Fingerprint,
        max_distance: u32,
    ) -> Result<Vec<Fingerprint>, IndexError> {
        Ok(self
            .entries
            .iter()
            .copied()
            .filter(|candidate| candidate.distance(fingerprint) <= max_distance)
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
