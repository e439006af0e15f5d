use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use expander_core::{DocumentView, MutationRecord, PendingRequestCache, ResourceId};
use expander_logging::{expander_debug, expander_error, expander_info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    BatchReport, ConfigError, ContentMerger, ExpanderConfig, ExpansionRequest, FetchOperation,
    Fetcher, InlineControl, MergeOutcome, MutationCoordinator,
};

type ControlSlot<A> = Rc<RefCell<InlineControl<A>>>;

/// Owns the pending-request cache and drives every expansion from trigger to merge.
///
/// All work happens on one thread: pipelines are spawned with
/// [`tokio::task::spawn_local`], so the expander must be used inside a
/// [`tokio::task::LocalSet`]. Cloning yields another handle to the same state.
pub struct Expander<D: DocumentView> {
    inner: Rc<Inner<D>>,
}

struct Inner<D: DocumentView> {
    view: D,
    fetcher: Arc<dyn Fetcher>,
    coordinator: MutationCoordinator,
    merger: ContentMerger,
    cache: RefCell<PendingRequestCache<FetchOperation>>,
    /// Inline control per target; kept after a failure so a retry can replace it.
    controls: RefCell<HashMap<D::Node, ControlSlot<D::Affordance>>>,
    /// Cancelled on navigation; pipelines from an older session drop their result.
    session: RefCell<CancellationToken>,
    tasks: RefCell<Vec<JoinHandle<MergeOutcome>>>,
    running: Cell<bool>,
}

impl<D: DocumentView> Clone for Expander<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: DocumentView + 'static> Expander<D> {
    pub fn new(
        view: D,
        fetcher: Arc<dyn Fetcher>,
        config: &ExpanderConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self::with_parts(
            view,
            fetcher,
            MutationCoordinator::new(config)?,
            ContentMerger::new(config)?,
        ))
    }

    pub fn with_parts(
        view: D,
        fetcher: Arc<dyn Fetcher>,
        coordinator: MutationCoordinator,
        merger: ContentMerger,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                view,
                fetcher,
                coordinator,
                merger,
                cache: RefCell::new(PendingRequestCache::new()),
                controls: RefCell::new(HashMap::new()),
                session: RefCell::new(CancellationToken::new()),
                tasks: RefCell::new(Vec::new()),
                running: Cell::new(false),
            }),
        }
    }

    pub fn view(&self) -> &D {
        &self.inner.view
    }

    pub fn coordinator(&self) -> &MutationCoordinator {
        &self.inner.coordinator
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Begins accepting mutation batches with a fresh session.
    pub fn start(&self) {
        if self.inner.running.replace(true) {
            return;
        }
        self.inner.session.replace(CancellationToken::new());
        expander_info!("expander started");
    }

    /// Stops accepting batches and abandons every running pipeline.
    pub fn stop(&self) {
        if !self.inner.running.replace(false) {
            return;
        }
        self.inner.session.borrow().cancel();
        self.inner.cache.borrow_mut().clear();
        expander_info!("expander stopped");
    }

    /// Forgets all cached fetches and tells in-flight pipelines their results are
    /// no longer wanted. Called when the page navigates.
    pub fn invalidate(&self) {
        let stale = self.inner.session.replace(CancellationToken::new());
        stale.cancel();
        let dropped = {
            let mut cache = self.inner.cache.borrow_mut();
            let len = cache.len();
            cache.clear();
            len
        };
        expander_debug!("session invalidated, {} cache entries dropped", dropped);
    }

    /// Feeds one mutation delivery through the coordinator and triggers a pipeline
    /// for every marker it finds. Ignored while stopped.
    pub fn handle_mutations(&self, records: &[MutationRecord<D::Node>]) -> BatchReport {
        if !self.is_running() {
            return BatchReport {
                records: records.len(),
                ..BatchReport::default()
            };
        }
        self.inner
            .coordinator
            .handle_batch(&self.inner.view, records, |request| self.trigger(request))
    }

    /// Starts or joins the fetch for `request.id` and merges the result into
    /// `request.target` once it settles.
    pub fn trigger(&self, request: ExpansionRequest<D::Node>) {
        let acquired = self.inner.cache.borrow_mut().acquire_or_attach(&request.id, || {
            FetchOperation::start(Arc::clone(&self.inner.fetcher), request.id.clone())
        });
        let control = if acquired.is_fresh() {
            self.fresh_control(&request)
        } else {
            expander_debug!("attached to pending fetch of {}", request.id);
            self.attached_control(&request.target)
        };

        let operation = acquired.into_operation();
        let session = self.inner.session.borrow().clone();
        let inner = Rc::clone(&self.inner);
        let handle = tokio::task::spawn_local(async move {
            let outcome = tokio::select! {
                biased;
                _ = session.cancelled() => {
                    expander_debug!("discarding stale fetch of {}", request.id);
                    if !control.borrow().has_failed() {
                        control.borrow_mut().dismiss(&inner.view);
                    }
                    MergeOutcome::Discarded
                }
                outcome = operation.settled() => {
                    inner.merger.apply(&inner.view, &request, &control, &outcome)
                }
            };
            if !control.borrow().has_failed() {
                inner.release_control(&request.target, &control);
            }
            outcome
        });

        let mut tasks = self.inner.tasks.borrow_mut();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Handles a click on the retry control: drops any cached fetch for the
    /// marker's resource and runs the pipeline again.
    pub fn retry(&self, target: &D::Node, marker: &D::Node) {
        if !self.is_running() {
            return;
        }
        if self.inner.view.is_expanded(target) {
            expander_debug!("retry ignored, {:?} already expanded", target);
            return;
        }
        let Some(request) = self
            .inner
            .coordinator
            .request_for(&self.inner.view, target, marker)
        else {
            return;
        };
        self.inner.cache.borrow_mut().remove(&request.id);
        expander_info!("retrying {}", request.id);
        self.trigger(request);
    }

    /// A fresh fetch owns a new progress control. Any control left on the target
    /// by an earlier attempt is removed first.
    fn fresh_control(&self, request: &ExpansionRequest<D::Node>) -> ControlSlot<D::Affordance> {
        let view = &self.inner.view;
        if let Some(previous) = self.inner.controls.borrow_mut().remove(&request.target) {
            previous.borrow_mut().dismiss(view);
        }
        let affordance = view.show_progress(
            &request.target,
            &request.marker,
            &self.inner.merger.progress_text(),
        );
        let control = Rc::new(RefCell::new(InlineControl::with_affordance(affordance)));
        self.inner
            .controls
            .borrow_mut()
            .insert(request.target.clone(), Rc::clone(&control));
        control
    }

    /// An attached trigger shares whatever control its target already has.
    fn attached_control(&self, target: &D::Node) -> ControlSlot<D::Affordance> {
        Rc::clone(
            self.inner
                .controls
                .borrow_mut()
                .entry(target.clone())
                .or_default(),
        )
    }

    /// Whether `target` currently has an inline control on the page.
    pub fn has_control(&self, target: &D::Node) -> bool {
        self.inner
            .controls
            .borrow()
            .get(target)
            .is_some_and(|control| control.borrow().affordance().is_some())
    }

    pub fn pending_len(&self) -> usize {
        self.inner.cache.borrow().len()
    }

    pub fn is_cached(&self, id: &ResourceId) -> bool {
        self.inner.cache.borrow().contains(id)
    }

    /// Waits for every pipeline still tracked, including ones spawned while
    /// waiting, and returns their outcomes in spawn order. Pipelines that finished
    /// before the latest trigger are no longer tracked.
    pub async fn settle(&self) -> Vec<MergeOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let tasks = std::mem::take(&mut *self.inner.tasks.borrow_mut());
            if tasks.is_empty() {
                return outcomes;
            }
            for task in tasks {
                match task.await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(err) => expander_error!("expansion pipeline failed: {}", err),
                }
            }
        }
    }
}

impl<D: DocumentView> Inner<D> {
    fn release_control(&self, target: &D::Node, control: &ControlSlot<D::Affordance>) {
        let mut controls = self.controls.borrow_mut();
        if controls
            .get(target)
            .is_some_and(|current| Rc::ptr_eq(current, control))
        {
            controls.remove(target);
        }
    }
}
