//! Capability interface over the host page.
//!
//! The coordination logic never touches a real DOM. Hosts implement
//! [`DocumentView`] over whatever they embed in; tests implement it over an
//! in-memory tree.
use std::fmt;
use std::hash::Hash;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DomError {
    #[error("no element matching {selector:?} inside the target")]
    MissingRegion { selector: String },
    #[error("target node is no longer attached to the document")]
    Detached,
}

/// Scope of a mutation subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserveOptions {
    pub subtree: bool,
    pub child_list: bool,
}

impl ObserveOptions {
    pub const SUBTREE_CHILD_LIST: Self = Self {
        subtree: true,
        child_list: true,
    };
}

/// One delivered mutation; only the mutated subtree root is of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub target: N,
}

impl<N> MutationRecord<N> {
    pub fn new(target: N) -> Self {
        Self { target }
    }
}

/// A live mutation subscription.
pub trait MutationObserver {
    /// Stops delivery. Calling it twice is harmless.
    fn disconnect(&mut self);
}

pub trait DocumentView {
    /// Element handle. Equality and hashing must follow node identity.
    type Node: Clone + Eq + Hash + fmt::Debug;
    type Observer: MutationObserver;
    /// Inline "expanding… / error, click here" control next to a preview.
    type Affordance: Clone + fmt::Debug;

    /// Current URL fragment including the leading `#`, or empty.
    fn location_fragment(&self) -> String;

    fn find_container(&self, selector: &str) -> Option<Self::Node>;

    fn observe(&self, container: &Self::Node, options: ObserveOptions) -> Self::Observer;

    /// First element under `subtree` matching `selector`.
    fn find_marker(&self, subtree: &Self::Node, selector: &str) -> Option<Self::Node>;

    /// Absolute link target embedded in a truncation marker.
    fn marker_link(&self, marker: &Self::Node) -> Option<String>;

    fn is_expanded(&self, node: &Self::Node) -> bool;

    fn mark_expanded(&self, node: &Self::Node);

    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Swaps the inner markup of the element matching `body_selector` inside `target`.
    fn replace_body(
        &self,
        target: &Self::Node,
        body_selector: &str,
        fragment_html: &str,
    ) -> Result<(), DomError>;

    /// Appends the progress control next to `marker`. Activating it must reach
    /// the host's retry path for (`target`, `marker`).
    fn show_progress(
        &self,
        target: &Self::Node,
        marker: &Self::Node,
        text: &str,
    ) -> Self::Affordance;

    /// Appends `suffix` to an existing control to turn it into a failure note.
    fn show_failure(&self, affordance: &Self::Affordance, suffix: &str);

    fn dismiss(&self, affordance: &Self::Affordance);
}
