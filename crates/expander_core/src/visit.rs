use std::collections::HashSet;
use std::hash::Hash;

/// Markers already handled within one mutation batch.
///
/// Nodes are compared by handle identity, so two distinct markers with identical
/// markup are tracked separately. Create one per batch and drop it afterwards.
#[derive(Debug)]
pub struct VisitationSet<N> {
    seen: HashSet<N>,
}

impl<N: Eq + Hash> VisitationSet<N> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Records `marker`; returns false if it was already visited in this batch.
    pub fn visit(&mut self, marker: N) -> bool {
        self.seen.insert(marker)
    }

    pub fn contains(&self, marker: &N) -> bool {
        self.seen.contains(marker)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl<N: Eq + Hash> Default for VisitationSet<N> {
    fn default() -> Self {
        Self::new()
    }
}
