use regex::Regex;

/// Fragment patterns of the message-list views where expansion applies: two-level
/// label views and the built-in list views with a trailing segment.
pub const DEFAULT_VIEW_PATTERNS: [&str; 2] = [
    r"#label(?:/.+){2}",
    r"#(inbox|imp|all|search|trash|sent)/.+",
];

#[derive(Debug, thiserror::Error)]
#[error("invalid view pattern {pattern:?}: {source}")]
pub struct ViewPatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Decides from the URL fragment whether the current view is a message list.
#[derive(Debug, Clone)]
pub struct ViewFilter {
    patterns: Vec<Regex>,
}

impl ViewFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self, ViewPatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| ViewPatternError {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// `fragment` may be given with or without its leading `#`.
    pub fn matches(&self, fragment: &str) -> bool {
        let fragment = if fragment.starts_with('#') {
            std::borrow::Cow::Borrowed(fragment)
        } else {
            std::borrow::Cow::Owned(format!("#{fragment}"))
        };
        self.patterns.iter().any(|re| re.is_match(&fragment))
    }
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_PATTERNS).expect("default view patterns compile")
    }
}
