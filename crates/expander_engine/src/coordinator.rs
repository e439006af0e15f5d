use std::cell::Cell;

use expander_core::{
    DocumentView, MessageNamespace, MutationRecord, ResourceId, ViewFilter, VisitationSet,
};
use expander_logging::{expander_debug, expander_trace, set_batch_seq};

use crate::{ConfigError, ExpanderConfig};

/// One message to expand: where to put the result, which marker triggered it, and
/// what to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionRequest<N> {
    pub target: N,
    pub marker: N,
    pub id: ResourceId,
}

/// What happened to the records of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub records: usize,
    /// The whole batch was ignored because the current view is not a message list.
    pub off_view: bool,
    pub triggered: usize,
    pub already_expanded: usize,
    pub no_marker: usize,
    pub already_visited: usize,
    pub ineligible: usize,
}

/// Turns mutation batches into expansion requests.
#[derive(Debug)]
pub struct MutationCoordinator {
    view_filter: ViewFilter,
    namespace: MessageNamespace,
    primary_marker: String,
    fallback_marker: String,
    batches: Cell<u64>,
}

impl MutationCoordinator {
    pub fn new(config: &ExpanderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            view_filter: config.view_filter()?,
            namespace: config.namespace()?,
            primary_marker: config.primary_marker_selector.clone(),
            fallback_marker: config.fallback_marker_selector.clone(),
            batches: Cell::new(0),
        })
    }

    /// Number of batches seen so far, including ignored ones.
    pub fn batches_seen(&self) -> u64 {
        self.batches.get()
    }

    /// Processes one delivery of mutation records in order, calling `trigger` for
    /// each marker found. A record that yields nothing only skips itself; the rest
    /// of the batch is still processed.
    pub fn handle_batch<D, F>(
        &self,
        view: &D,
        records: &[MutationRecord<D::Node>],
        mut trigger: F,
    ) -> BatchReport
    where
        D: DocumentView,
        F: FnMut(ExpansionRequest<D::Node>),
    {
        let seq = self.batches.get() + 1;
        self.batches.set(seq);

        let mut report = BatchReport {
            records: records.len(),
            ..BatchReport::default()
        };

        let fragment = view.location_fragment();
        if !self.view_filter.matches(&fragment) {
            expander_trace!("ignoring {} mutations on view {:?}", records.len(), fragment);
            report.off_view = true;
            return report;
        }

        set_batch_seq(seq);
        let mut visited = VisitationSet::new();
        for record in records {
            let target = &record.target;
            if view.is_expanded(target) {
                report.already_expanded += 1;
                continue;
            }

            let Some(marker) = self.find_marker(view, target) else {
                report.no_marker += 1;
                continue;
            };
            if !visited.visit(marker.clone()) {
                report.already_visited += 1;
                continue;
            }

            let id = match view
                .marker_link(&marker)
                .ok_or_else(|| "marker has no link".to_string())
                .and_then(|href| self.namespace.resolve(&href).map_err(|err| err.to_string()))
            {
                Ok(id) => id,
                Err(reason) => {
                    expander_debug!("skipping marker {:?}: {}", marker, reason);
                    report.ineligible += 1;
                    continue;
                }
            };

            expander_debug!("expanding {:?} from {}", target, id);
            report.triggered += 1;
            trigger(ExpansionRequest {
                target: target.clone(),
                marker,
                id,
            });
        }
        expander_trace!("batch done: {:?}", report);
        set_batch_seq(0);
        report
    }

    /// Re-derives the request for a marker outside of a batch, e.g. on retry.
    pub fn request_for<D: DocumentView>(
        &self,
        view: &D,
        target: &D::Node,
        marker: &D::Node,
    ) -> Option<ExpansionRequest<D::Node>> {
        let href = view.marker_link(marker)?;
        match self.namespace.resolve(&href) {
            Ok(id) => Some(ExpansionRequest {
                target: target.clone(),
                marker: marker.clone(),
                id,
            }),
            Err(err) => {
                expander_debug!("retry ignored for {:?}: {}", marker, err);
                None
            }
        }
    }

    fn find_marker<D: DocumentView>(&self, view: &D, subtree: &D::Node) -> Option<D::Node> {
        view.find_marker(subtree, &self.primary_marker)
            .or_else(|| view.find_marker(subtree, &self.fallback_marker))
    }
}
