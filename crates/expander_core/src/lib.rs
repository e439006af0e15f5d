//! Expander core: pure coordination state and the host-page capability traits.
mod cache;
mod dom;
mod event;
mod identifier;
mod view_filter;
mod visit;

pub use cache::{Acquired, PendingRequestCache, Settle};
pub use dom::{DocumentView, DomError, MutationObserver, MutationRecord, ObserveOptions};
pub use event::HostEvent;
pub use identifier::{IdentifierError, MessageNamespace, ResourceId, DEFAULT_NAMESPACE};
pub use view_filter::{ViewFilter, ViewPatternError, DEFAULT_VIEW_PATTERNS};
pub use visit::VisitationSet;
