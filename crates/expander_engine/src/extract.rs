use scraper::{Html, Selector};

use crate::FetchedDocument;

/// Default location of the full message text in the printable message page.
pub(crate) const DEFAULT_FRAGMENT_SELECTOR: &str = ".message div > font";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|err| SelectorError {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFragment {
    pub inner_html: String,
    pub text: String,
}

/// Pulls the message body fragment out of a fetched page.
#[derive(Debug, Clone)]
pub struct MessageExtractor {
    selector: Selector,
}

impl MessageExtractor {
    pub fn new(selector: &str) -> Result<Self, SelectorError> {
        Ok(Self {
            selector: parse_selector(selector)?,
        })
    }

    /// First matching element, or `None` when the page has no such element.
    pub fn extract(&self, document: &FetchedDocument) -> Option<MessageFragment> {
        self.extract_html(&document.parse())
    }

    fn extract_html(&self, html: &Html) -> Option<MessageFragment> {
        let element = html.select(&self.selector).next()?;
        Some(MessageFragment {
            inner_html: element.inner_html(),
            text: element.text().collect(),
        })
    }
}

impl Default for MessageExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_FRAGMENT_SELECTOR).expect("default fragment selector parses")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> FetchedDocument {
        FetchedDocument::new(
            "https://mail.google.com/mail/u/0/?view=lg",
            format!("<html><body>{body}</body></html>"),
        )
    }

    #[test]
    fn picks_first_font_inside_message_div() {
        let doc = page(
            r#"<table class="message"><tr><td><div><font size="-1">Bob</font></div></td></tr></table>
               <div class="message"><div><font>Hello <b>world</b></font></div></div>"#,
        );
        let fragment = MessageExtractor::default().extract(&doc).unwrap();
        assert_eq!(fragment.text, "Bob");
    }

    #[test]
    fn keeps_inner_markup() {
        let doc = page(r#"<div class="message"><div><font>Hello <b>world</b></font></div></div>"#);
        let fragment = MessageExtractor::default().extract(&doc).unwrap();
        assert_eq!(fragment.inner_html, "Hello <b>world</b>");
        assert_eq!(fragment.text, "Hello world");
    }

    #[test]
    fn missing_fragment_is_none() {
        let doc = page("<p>nothing here</p>");
        assert!(MessageExtractor::default().extract(&doc).is_none());
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let err = MessageExtractor::new("div >").unwrap_err();
        assert_eq!(err.selector, "div >");
    }
}
