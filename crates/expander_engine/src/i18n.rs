use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Expanding,
    ClickHere,
    Error,
}

/// Resolves user-facing strings. Lookups are assumed to always succeed.
pub trait Localizer {
    fn message(&self, key: MessageKey) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageCatalog {
    pub expanding: String,
    pub click_here: String,
    pub error: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            expanding: "Expanding".to_string(),
            click_here: "click here".to_string(),
            error: "Error".to_string(),
        }
    }
}

impl Localizer for MessageCatalog {
    fn message(&self, key: MessageKey) -> String {
        match key {
            MessageKey::Expanding => self.expanding.clone(),
            MessageKey::ClickHere => self.click_here.clone(),
            MessageKey::Error => self.error.clone(),
        }
    }
}

/// Label of the control shown while a fetch is running.
pub fn progress_text(localizer: &dyn Localizer) -> String {
    format!(
        "{}... ({})",
        localizer.message(MessageKey::Expanding),
        localizer.message(MessageKey::ClickHere)
    )
}

/// Appended to the progress control when the expansion failed.
pub fn failure_suffix(localizer: &dyn Localizer) -> String {
    format!(
        " ― {} ({})",
        localizer.message(MessageKey::Error),
        localizer.message(MessageKey::ClickHere)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_defaults() {
        let catalog = MessageCatalog::default();
        assert_eq!(progress_text(&catalog), "Expanding... (click here)");
        assert_eq!(failure_suffix(&catalog), " ― Error (click here)");
    }

    #[test]
    fn partial_catalog_keeps_defaults() {
        let catalog: MessageCatalog = ron::from_str(r#"(expanding: "Wird erweitert")"#).unwrap();
        assert_eq!(catalog.message(MessageKey::Expanding), "Wird erweitert");
        assert_eq!(catalog.message(MessageKey::ClickHere), "click here");
    }
}
