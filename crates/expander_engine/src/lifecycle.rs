use expander_core::{DocumentView, HostEvent, MutationObserver, ObserveOptions};
use expander_logging::{expander_debug, expander_info};

use crate::{BatchReport, Expander, ExpanderConfig};

/// Wires the expander to the page: observes the message list on load and
/// invalidates pending work on navigation. At most one observer is live.
pub struct LifecycleManager<D: DocumentView> {
    expander: Expander<D>,
    container_selector: String,
    observer: Option<D::Observer>,
}

impl<D: DocumentView + 'static> LifecycleManager<D> {
    pub fn new(expander: Expander<D>, config: &ExpanderConfig) -> Self {
        Self {
            expander,
            container_selector: config.container_selector.clone(),
            observer: None,
        }
    }

    pub fn expander(&self) -> &Expander<D> {
        &self.expander
    }

    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// Dispatches one host event. Returns the batch report for mutation deliveries.
    pub fn handle(&mut self, event: HostEvent<D::Node>) -> Option<BatchReport> {
        match event {
            HostEvent::Load => {
                self.on_load();
                None
            }
            HostEvent::Navigated { fragment } => {
                self.on_navigation(&fragment);
                None
            }
            HostEvent::Mutations(records) => Some(self.expander.handle_mutations(&records)),
            HostEvent::RetryClicked { target, marker } => {
                self.expander.retry(&target, &marker);
                None
            }
        }
    }

    /// Replaces any previous observer with one on the message-list container.
    /// Returns false when the container is not in the page yet.
    pub fn on_load(&mut self) -> bool {
        self.disconnect();
        self.expander.start();

        let view = self.expander.view();
        let Some(container) = view.find_container(&self.container_selector) else {
            expander_debug!("no message list matching {:?} yet", self.container_selector);
            return false;
        };
        self.observer = Some(view.observe(&container, ObserveOptions::SUBTREE_CHILD_LIST));
        expander_info!("observing message list {:?}", container);
        true
    }

    pub fn on_navigation(&mut self, fragment: &str) {
        expander_debug!("navigated to {:?}", fragment);
        self.expander.invalidate();
    }

    /// Detaches from the page and abandons all pending work.
    pub fn stop(&mut self) {
        self.disconnect();
        self.expander.stop();
    }

    fn disconnect(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
        }
    }
}

impl<D: DocumentView> Drop for LifecycleManager<D> {
    fn drop(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
        }
    }
}
