//! Expander engine: fetch pipeline, content merging and lifecycle wiring.
mod config;
mod coordinator;
mod decode;
mod expander;
mod extract;
mod fetch;
mod i18n;
mod lifecycle;
mod merge;
mod operation;
mod types;

pub use config::{ConfigError, ExpanderConfig};
pub use coordinator::{BatchReport, ExpansionRequest, MutationCoordinator};
pub use decode::{decode_body, CharsetSource, DecodeError, DecodedBody};
pub use expander::Expander;
pub use extract::{MessageExtractor, MessageFragment, SelectorError};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use i18n::{failure_suffix, progress_text, Localizer, MessageCatalog, MessageKey};
pub use lifecycle::LifecycleManager;
pub use merge::{ContentMerger, InlineControl, MergeOutcome};
pub use operation::{FetchOperation, FetchOutcome, OperationState};
pub use types::{ExpandError, FailureKind, FetchError, FetchedDocument};
