use std::collections::HashMap;

use crate::ResourceId;

/// Lets the cache tell an in-flight operation from a settled one.
pub trait Settle {
    fn is_settled(&self) -> bool;
}

/// Outcome of [`PendingRequestCache::acquire_or_attach`].
#[derive(Debug, Clone)]
pub enum Acquired<Op> {
    /// No entry existed; the operation was just started and is now cached.
    Fresh(Op),
    /// An entry existed; the caller shares its result instead of fetching again.
    Attached(Op),
}

impl<Op> Acquired<Op> {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Acquired::Fresh(_))
    }

    pub fn operation(&self) -> &Op {
        match self {
            Acquired::Fresh(op) | Acquired::Attached(op) => op,
        }
    }

    pub fn into_operation(self) -> Op {
        match self {
            Acquired::Fresh(op) | Acquired::Attached(op) => op,
        }
    }
}

/// At most one fetch operation per resource between navigations.
///
/// Entries are not dropped when their operation completes. A pending entry is shared
/// with every duplicate trigger; a settled entry is handed to the next duplicate
/// trigger and removed, so the trigger after that fetches afresh.
#[derive(Debug)]
pub struct PendingRequestCache<Op> {
    entries: HashMap<ResourceId, Op>,
}

impl<Op: Clone + Settle> PendingRequestCache<Op> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn acquire_or_attach<F>(&mut self, id: &ResourceId, start: F) -> Acquired<Op>
    where
        F: FnOnce() -> Op,
    {
        match self.entries.get(id) {
            Some(op) if op.is_settled() => {
                let op = op.clone();
                self.entries.remove(id);
                Acquired::Attached(op)
            }
            Some(op) => Acquired::Attached(op.clone()),
            None => {
                let op = start();
                self.entries.insert(id.clone(), op.clone());
                Acquired::Fresh(op)
            }
        }
    }

    pub fn remove(&mut self, id: &ResourceId) -> Option<Op> {
        self.entries.remove(id)
    }

    /// Drops every entry. Operations already handed out keep running.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<Op: Clone + Settle> Default for PendingRequestCache<Op> {
    fn default() -> Self {
        Self::new()
    }
}
