use std::cell::RefCell;

use expander_core::{DocumentView, DomError};
use expander_logging::{expander_debug, expander_error, expander_info, expander_warn};

use crate::i18n::{failure_suffix, progress_text};
use crate::{
    ConfigError, ExpandError, ExpanderConfig, ExpansionRequest, FetchOutcome, FetchedDocument,
    Localizer, MessageExtractor,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The body was replaced and the target flagged expanded.
    Expanded,
    /// The target left the document before the result arrived; nothing was touched.
    Detached,
    /// The preview was kept and the inline control now offers a retry.
    Failed(ExpandError),
    /// The page navigated while the fetch was running; the result was not wanted.
    Discarded,
}

/// The inline control of one target, shared by every pipeline merging into it.
///
/// At most one control exists per target and the failure suffix is rendered once.
#[derive(Debug)]
pub struct InlineControl<A> {
    affordance: Option<A>,
    failed: bool,
}

impl<A> Default for InlineControl<A> {
    fn default() -> Self {
        Self {
            affordance: None,
            failed: false,
        }
    }
}

impl<A: Clone> InlineControl<A> {
    pub fn with_affordance(affordance: A) -> Self {
        Self {
            affordance: Some(affordance),
            failed: false,
        }
    }

    pub fn affordance(&self) -> Option<&A> {
        self.affordance.as_ref()
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Removes the control from the page, if one is shown.
    pub fn dismiss<D>(&mut self, view: &D)
    where
        D: DocumentView<Affordance = A>,
    {
        if let Some(affordance) = self.affordance.take() {
            view.dismiss(&affordance);
        }
    }
}

/// Splices fetched message bodies into the page.
pub struct ContentMerger {
    extractor: MessageExtractor,
    body_selector: String,
    localizer: Box<dyn Localizer>,
}

impl ContentMerger {
    pub fn new(config: &ExpanderConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            extractor: config.extractor()?,
            body_selector: config.body_selector.clone(),
            localizer: Box::new(config.messages.clone()),
        })
    }

    pub fn with_localizer(mut self, localizer: Box<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn progress_text(&self) -> String {
        progress_text(self.localizer.as_ref())
    }

    /// Applies a settled fetch to `request.target`, updating the target's shared
    /// inline control.
    pub fn apply<D: DocumentView>(
        &self,
        view: &D,
        request: &ExpansionRequest<D::Node>,
        control: &RefCell<InlineControl<D::Affordance>>,
        outcome: &FetchOutcome,
    ) -> MergeOutcome {
        if !view.is_connected(&request.target) {
            expander_debug!("dropping result for detached {:?}", request.target);
            return MergeOutcome::Detached;
        }
        if view.is_expanded(&request.target) {
            expander_debug!("{:?} already expanded", request.target);
            control.borrow_mut().dismiss(view);
            return MergeOutcome::Expanded;
        }

        let result = match outcome {
            Ok(document) => self.splice(view, &request.target, document),
            Err(err) => Err(ExpandError::Fetch(err.clone())),
        };

        match result {
            Ok(()) => {
                view.mark_expanded(&request.target);
                control.borrow_mut().dismiss(view);
                expander_info!("expanded {}", request.id);
                MergeOutcome::Expanded
            }
            Err(ExpandError::Dom(DomError::Detached)) => {
                expander_debug!("target detached while merging {}", request.id);
                MergeOutcome::Detached
            }
            Err(err) => {
                let mut control = control.borrow_mut();
                if control.failed {
                    expander_debug!("failure for {} already shown", request.id);
                    return MergeOutcome::Failed(err);
                }
                expander_error!("expanding {} failed: {}", request.id, err);
                let affordance = control.affordance.get_or_insert_with(|| {
                    view.show_progress(&request.target, &request.marker, &self.progress_text())
                });
                view.show_failure(affordance, &failure_suffix(self.localizer.as_ref()));
                control.failed = true;
                MergeOutcome::Failed(err)
            }
        }
    }

    fn splice<D: DocumentView>(
        &self,
        view: &D,
        target: &D::Node,
        document: &FetchedDocument,
    ) -> Result<(), ExpandError> {
        let fragment = match self.extractor.extract(document) {
            Some(fragment) if !fragment.text.is_empty() => fragment,
            Some(fragment) => {
                expander_warn!("empty message fragment: {:?}", fragment.inner_html);
                return Err(ExpandError::EmptyContent {
                    url: document.url.clone(),
                });
            }
            None => {
                expander_warn!("no message fragment in {}", document.final_url);
                return Err(ExpandError::EmptyContent {
                    url: document.url.clone(),
                });
            }
        };
        view.replace_body(target, &self.body_selector, &fragment.inner_html)?;
        Ok(())
    }
}
