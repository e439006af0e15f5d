use std::fmt;

use url::Url;

/// Prefix every fetchable message URL lives under on the host service.
pub const DEFAULT_NAMESPACE: &str = "https://mail.google.com/mail/u/";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("invalid url {href:?}: {message}")]
    Invalid { href: String, message: String },
    #[error("{href} is outside the messaging namespace {namespace}")]
    OutsideNamespace { href: String, namespace: String },
}

/// URL of one fetchable message resource. Only constructed through
/// [`MessageNamespace::resolve`], so every value lies inside the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The host messaging namespace: scheme, host and port must match exactly and the
/// path must start with the prefix path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNamespace {
    prefix: Url,
}

impl MessageNamespace {
    pub fn new(prefix: &str) -> Result<Self, IdentifierError> {
        let prefix = Url::parse(prefix).map_err(|err| IdentifierError::Invalid {
            href: prefix.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    pub fn contains(&self, url: &Url) -> bool {
        url.scheme() == self.prefix.scheme()
            && url.host_str() == self.prefix.host_str()
            && url.port_or_known_default() == self.prefix.port_or_known_default()
            && url.path().starts_with(self.prefix.path())
    }

    /// Turns a marker's link into a resource identifier, rejecting anything outside
    /// the namespace.
    pub fn resolve(&self, href: &str) -> Result<ResourceId, IdentifierError> {
        let trimmed = href.trim();
        let url = Url::parse(trimmed).map_err(|err| IdentifierError::Invalid {
            href: trimmed.to_string(),
            message: err.to_string(),
        })?;
        if !self.contains(&url) {
            return Err(IdentifierError::OutsideNamespace {
                href: trimmed.to_string(),
                namespace: self.prefix.to_string(),
            });
        }
        Ok(ResourceId(url.into()))
    }
}

impl Default for MessageNamespace {
    fn default() -> Self {
        Self {
            prefix: Url::parse(DEFAULT_NAMESPACE).expect("default namespace is a valid url"),
        }
    }
}
