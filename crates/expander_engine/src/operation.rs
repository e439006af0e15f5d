use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use expander_core::{ResourceId, Settle};
use futures_util::future::{FutureExt, LocalBoxFuture, Shared};

use crate::{FetchError, FetchedDocument, Fetcher};

pub type FetchOutcome = Result<Rc<FetchedDocument>, FetchError>;

pub enum OperationState<'a> {
    Pending,
    Succeeded(&'a FetchedDocument),
    Failed(&'a FetchError),
}

/// One fetch, shared by every trigger attached to it.
///
/// The request is issued when the first holder awaits [`FetchOperation::settled`]
/// and is abandoned once every holder has been dropped.
#[derive(Clone)]
pub struct FetchOperation {
    id: ResourceId,
    shared: Shared<LocalBoxFuture<'static, FetchOutcome>>,
}

impl FetchOperation {
    pub fn start(fetcher: Arc<dyn Fetcher>, id: ResourceId) -> Self {
        let target = id.clone();
        let shared = async move { fetcher.fetch(&target).await.map(Rc::new) }
            .boxed_local()
            .shared();
        Self { id, shared }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn state(&self) -> OperationState<'_> {
        match self.shared.peek() {
            None => OperationState::Pending,
            Some(Ok(document)) => OperationState::Succeeded(document),
            Some(Err(err)) => OperationState::Failed(err),
        }
    }

    pub async fn settled(&self) -> FetchOutcome {
        self.shared.clone().await
    }
}

impl Settle for FetchOperation {
    fn is_settled(&self) -> bool {
        self.shared.peek().is_some()
    }
}

impl fmt::Debug for FetchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state() {
            OperationState::Pending => "pending",
            OperationState::Succeeded(_) => "succeeded",
            OperationState::Failed(_) => "failed",
        };
        f.debug_struct("FetchOperation")
            .field("id", &self.id)
            .field("state", &state)
            .finish()
    }
}
