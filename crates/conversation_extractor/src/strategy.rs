use scraper::Selector;

use crate::error::{ExtractError, Result};

/// Message containers, most specific markup first
pub const MESSAGE_SELECTORS: [&str; 3] = [
    "[data-message-author-role]",
    ".group.w-full",
    ".conversation-turn",
];

/// Where the message body lives inside a container, tried in order
pub const CONTENT_SELECTORS: [&str; 2] = [".markdown", ".whitespace-pre-wrap"];

pub const ROLE_ATTRIBUTE: &str = "data-message-author-role";

/// One way of locating message elements on the page
#[derive(Debug, Clone)]
pub struct ExtractionStrategy {
    source: String,
    selector: Selector,
}

impl ExtractionStrategy {
    pub fn new(selector: &str) -> Result<Self> {
        Ok(Self {
            source: selector.to_string(),
            selector: parse_selector(selector)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

pub fn default_strategies() -> Result<Vec<ExtractionStrategy>> {
    MESSAGE_SELECTORS
        .iter()
        .map(|selector| ExtractionStrategy::new(selector))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_in_priority_order() {
        let strategies = default_strategies().unwrap();
        let sources: Vec<&str> = strategies.iter().map(|s| s.source()).collect();
        assert_eq!(sources, MESSAGE_SELECTORS.to_vec());
    }

    #[test]
    fn bad_selector_is_reported() {
        let err = ExtractionStrategy::new("[[nope").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidSelector { ref selector, .. } if selector == "[[nope"));
    }
}
