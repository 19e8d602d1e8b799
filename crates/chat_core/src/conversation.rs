//! Conversation types shared by the extractor, storage and publisher.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Storage key prefix for persisted conversations
pub const CONVERSATION_KEY_PREFIX: &str = "conversation_";

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Maps a page attribute value to a role. Only `user` is a user; system,
    /// tool and assistant turns are all attributed to the assistant.
    pub fn from_attribute(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    /// RFC 3339 extraction time
    pub timestamp: String,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// A persisted conversation: its storage id plus the ordered messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<ConversationMessage>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, messages: Vec<ConversationMessage>) -> Self {
        Self {
            id: id.into(),
            messages,
        }
    }

    /// Storage key for a conversation saved at `saved_at`
    pub fn key_for(saved_at: DateTime<Utc>) -> String {
        format!("{}{}", CONVERSATION_KEY_PREFIX, saved_at.timestamp_millis())
    }

    /// Save time decoded from the id, if it carries one
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        let millis = self
            .id
            .strip_prefix(CONVERSATION_KEY_PREFIX)?
            .parse::<i64>()
            .ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Default file name used when publishing
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.id, extension)
    }

    pub fn render_markdown(&self) -> String {
        let mut out = format!("# Conversation {}\n", self.id);
        if let Some(saved_at) = self.saved_at() {
            out.push_str(&format!("\n_Saved {}_\n", saved_at.to_rfc3339()));
        }
        for message in &self.messages {
            out.push_str(&format!(
                "\n## {}\n\n{}\n",
                message.role.label(),
                message.content.trim_end()
            ));
        }
        out
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Conversation {
        Conversation::new(
            "conversation_1700000000000",
            vec![
                ConversationMessage::new(Role::User, "Hello?", "2023-11-14T22:13:20Z"),
                ConversationMessage::new(Role::Assistant, "Hi there.\n", "2023-11-14T22:13:20Z"),
            ],
        )
    }

    #[test]
    fn role_from_attribute() {
        assert_eq!(Role::from_attribute("user"), Role::User);
        assert_eq!(Role::from_attribute(" USER "), Role::User);
        assert_eq!(Role::from_attribute("assistant"), Role::Assistant);
        assert_eq!(Role::from_attribute("system"), Role::Assistant);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).expect("serialize");
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn key_uses_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).single().expect("ts");
        assert_eq!(Conversation::key_for(at), "conversation_1700000000123");
    }

    #[test]
    fn saved_at_decodes_id() {
        let conversation = sample();
        let saved_at = conversation.saved_at().expect("saved_at");
        assert_eq!(saved_at.timestamp_millis(), 1_700_000_000_000);

        let other = Conversation::new("custom", vec![]);
        assert!(other.saved_at().is_none());
    }

    #[test]
    fn markdown_has_role_sections_in_order() {
        let markdown = sample().render_markdown();
        let user = markdown.find("## User").expect("user section");
        let assistant = markdown.find("## Assistant").expect("assistant section");
        assert!(user < assistant);
        assert!(markdown.starts_with("# Conversation conversation_1700000000000\n"));
        assert!(markdown.contains("\n\nHi there.\n"));
    }

    #[test]
    fn json_is_message_array() {
        let json = sample().to_pretty_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value[0]["role"], "user");
        assert_eq!(value[1]["content"], "Hi there.\n");
    }
}
