use std::path::Path;

use expander_core::{
    IdentifierError, MessageNamespace, ViewFilter, ViewPatternError, DEFAULT_NAMESPACE,
    DEFAULT_VIEW_PATTERNS,
};
use serde::{Deserialize, Serialize};

use crate::extract::{parse_selector, DEFAULT_FRAGMENT_SELECTOR};
use crate::{FetchSettings, MessageCatalog, MessageExtractor, SelectorError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error(transparent)]
    Namespace(#[from] IdentifierError),
    #[error(transparent)]
    ViewPattern(#[from] ViewPatternError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Everything host-specific: where things live in the page, which URLs may be
/// fetched, and how. Defaults match the host webmail service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderConfig {
    pub namespace: String,
    pub view_patterns: Vec<String>,
    /// Message-list container the observer is attached to.
    pub container_selector: String,
    pub primary_marker_selector: String,
    /// Used when the primary marker shape is absent.
    pub fallback_marker_selector: String,
    /// Message body inside the fetched page.
    pub fragment_selector: String,
    /// Message body region inside a target node on the host page.
    pub body_selector: String,
    pub fetch: FetchSettings,
    pub messages: MessageCatalog,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            view_patterns: DEFAULT_VIEW_PATTERNS.iter().map(|p| p.to_string()).collect(),
            container_selector: r#"div[id=":5"] + div"#.to_string(),
            primary_marker_selector: "vem".to_string(),
            fallback_marker_selector: ".ii.gt > div > div > br + br + a".to_string(),
            fragment_selector: DEFAULT_FRAGMENT_SELECTOR.to_string(),
            body_selector: ".a3s".to_string(),
            fetch: FetchSettings::default(),
            messages: MessageCatalog::default(),
        }
    }
}

impl ExpanderConfig {
    /// Parses and validates a RON document. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    /// Checks that every pattern and selector compiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.namespace()?;
        self.view_filter()?;
        self.extractor()?;
        for selector in [
            &self.container_selector,
            &self.primary_marker_selector,
            &self.fallback_marker_selector,
            &self.body_selector,
        ] {
            parse_selector(selector)?;
        }
        Ok(())
    }

    pub fn namespace(&self) -> Result<MessageNamespace, ConfigError> {
        Ok(MessageNamespace::new(&self.namespace)?)
    }

    pub fn view_filter(&self) -> Result<ViewFilter, ConfigError> {
        Ok(ViewFilter::new(&self.view_patterns)?)
    }

    pub fn extractor(&self) -> Result<MessageExtractor, ConfigError> {
        Ok(MessageExtractor::new(&self.fragment_selector)?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn defaults_validate() {
        ExpanderConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_ron_overrides_only_given_fields() {
        let config = ExpanderConfig::from_ron_str(
            r#"(
                namespace: "http://127.0.0.1:9000/mail/u/",
                fetch: (request_timeout: Some((secs: 30, nanos: 0))),
                messages: (error: "Fehler"),
            )"#,
        )
        .unwrap();
        assert_eq!(config.namespace, "http://127.0.0.1:9000/mail/u/");
        assert_eq!(config.fetch.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.fetch.max_bytes, FetchSettings::default().max_bytes);
        assert_eq!(config.messages.error, "Fehler");
        assert_eq!(config.primary_marker_selector, "vem");
    }

    #[test]
    fn bad_view_pattern_is_rejected() {
        let err = ExpanderConfig::from_ron_str(r##"(view_patterns: ["#inbox/("])"##).unwrap_err();
        assert!(matches!(err, ConfigError::ViewPattern(_)));
    }

    #[test]
    fn bad_selector_is_rejected() {
        let err = ExpanderConfig::from_ron_str(r#"(body_selector: "div >")"#).unwrap_err();
        assert!(matches!(err, ConfigError::Selector(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExpanderConfig::from_file(&dir.path().join("expander.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expander.ron");
        std::fs::write(&path, r#"(body_selector: ".body")"#).unwrap();
        let config = ExpanderConfig::from_file(&path).unwrap();
        assert_eq!(config.body_selector, ".body");
    }
}
