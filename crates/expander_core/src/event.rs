use crate::MutationRecord;

/// Everything the host page can tell the expander.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent<N> {
    /// The page finished loading (may fire more than once).
    Load,
    /// The URL fragment changed.
    Navigated { fragment: String },
    /// One delivery of mutation records from the observer.
    Mutations(Vec<MutationRecord<N>>),
    /// The user clicked the retry control next to `marker`.
    RetryClicked { target: N, marker: N },
}
