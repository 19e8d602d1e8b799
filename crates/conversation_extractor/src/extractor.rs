use chat_core::{ConversationMessage, Role};
use chrono::{DateTime, SecondsFormat, Utc};
use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::strategy::{
    default_strategies, parse_selector, ExtractionStrategy, CONTENT_SELECTORS, ROLE_ATTRIBUTE,
};

/// Reads a chat transcript out of page HTML.
///
/// Strategies are tried in order and the first one that matches at least one
/// element is used, even if every match turns out empty. The result is
/// best-effort and follows the host page's markup.
#[derive(Debug, Clone)]
pub struct ConversationExtractor {
    strategies: Vec<ExtractionStrategy>,
    content_selectors: Vec<Selector>,
}

impl ConversationExtractor {
    pub fn new() -> Result<Self> {
        Self::with_strategies(default_strategies()?)
    }

    pub fn with_strategies(strategies: Vec<ExtractionStrategy>) -> Result<Self> {
        let content_selectors = CONTENT_SELECTORS
            .iter()
            .map(|selector| parse_selector(selector))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            strategies,
            content_selectors,
        })
    }

    pub fn extract(&self, html: &str) -> Vec<ConversationMessage> {
        self.extract_at(html, Utc::now())
    }

    /// Every message is stamped with `extracted_at`
    pub fn extract_at(&self, html: &str, extracted_at: DateTime<Utc>) -> Vec<ConversationMessage> {
        let document = Html::parse_document(html);
        let timestamp = extracted_at.to_rfc3339_opts(SecondsFormat::Millis, true);

        for strategy in &self.strategies {
            let elements: Vec<ElementRef> = document.select(strategy.selector()).collect();
            if elements.is_empty() {
                continue;
            }

            log::debug!(
                "Selector {} matched {} elements",
                strategy.source(),
                elements.len()
            );
            return elements
                .into_iter()
                .filter_map(|element| self.read_message(element, &timestamp))
                .collect();
        }

        log::debug!("No message selector matched");
        Vec::new()
    }

    fn read_message(&self, element: ElementRef, timestamp: &str) -> Option<ConversationMessage> {
        let role = match element.value().attr(ROLE_ATTRIBUTE) {
            Some(value) if !value.is_empty() => Role::from_attribute(value),
            _ if text_of(element).trim_start().starts_with("You") => Role::User,
            _ => Role::Assistant,
        };

        let content_element = self
            .content_selectors
            .iter()
            .find_map(|selector| element.select(selector).next())
            .unwrap_or(element);

        let content = text_of(content_element).trim().to_string();
        if content.is_empty() {
            return None;
        }

        Some(ConversationMessage::new(role, content, timestamp))
    }
}

fn text_of(element: ElementRef) -> String {
    element.text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn extract(html: &str) -> Vec<ConversationMessage> {
        ConversationExtractor::new().unwrap().extract_at(html, at())
    }

    #[test]
    fn reads_role_attribute_and_markdown_body() {
        let html = r#"
            <main>
              <div data-message-author-role="user">
                <div class="whitespace-pre-wrap">How do I sort a Vec?</div>
              </div>
              <div data-message-author-role="assistant">
                <span class="label">ChatGPT said:</span>
                <div class="markdown"><p>Use <code>sort()</code>.</p></div>
              </div>
            </main>"#;

        let messages = extract(html);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "How do I sort a Vec?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Use sort().");
        assert_eq!(messages[1].timestamp, "2024-03-01T10:00:00.000Z");
    }

    #[test]
    fn first_matching_strategy_wins() {
        let html = r#"
            <div class="conversation-turn">ignored turn</div>
            <div class="group w-full">You: hello</div>
            <div class="group w-full">Hi! How can I help?</div>"#;

        let messages = extract(html);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "You: hello");
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn matched_but_empty_strategy_does_not_fall_through() {
        let html = r#"
            <div data-message-author-role="assistant">   </div>
            <div class="conversation-turn">would match later</div>"#;

        assert!(extract(html).is_empty());
    }

    #[test]
    fn falls_back_to_last_strategy() {
        let html = r#"<section class="conversation-turn"><div class="markdown">Only turn</div></section>"#;
        let messages = extract(html);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Only turn");
        assert_eq!(messages[0].role, Role::Assistant);
    }

    #[test]
    fn order_is_preserved_and_empty_messages_dropped() {
        let html = r#"
            <div data-message-author-role="user">one</div>
            <div data-message-author-role="assistant"><div class="markdown"> </div></div>
            <div data-message-author-role="user">three</div>
            <div data-message-author-role="system">four</div>"#;

        let contents: Vec<(Role, String)> = extract(html)
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect();

        assert_eq!(
            contents,
            vec![
                (Role::User, "one".to_string()),
                (Role::User, "three".to_string()),
                (Role::Assistant, "four".to_string()),
            ]
        );
    }

    #[test]
    fn nothing_matches_yields_empty() {
        assert!(extract("<html><body><p>Welcome</p></body></html>").is_empty());
    }

    #[test]
    fn custom_strategies_are_used() {
        let extractor =
            ConversationExtractor::with_strategies(vec![ExtractionStrategy::new("article").unwrap()])
                .unwrap();
        let messages = extractor.extract_at("<article>You asked</article>", at());
        assert_eq!(messages[0].role, Role::User);
    }
}
