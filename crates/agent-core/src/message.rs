//! Prompt Messages
//!
//! Message format handed to every `LlmProvider`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona / instructions
    System,
    /// Prompt body
    User,
    /// Model output (few-shot examples)
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single prompt message
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    pub content: String,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Split a message list into the joined system instruction and the rest.
///
/// Providers with a dedicated system field (Gemini) use this; the others send
/// the list as-is.
pub fn split_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let rest = messages.iter().filter(|m| m.role != Role::System).collect();

    if system.is_empty() {
        (None, rest)
    } else {
        (Some(system.join("\n\n")), rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("gm");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "gm");
    }

    #[test]
    fn test_split_system() {
        let messages = vec![
            Message::system("You are a veteran trader."),
            Message::user("wen moon"),
            Message::system("No hashtags."),
        ];
        let (system, rest) = split_system(&messages);
        assert_eq!(system.as_deref(), Some("You are a veteran trader.\n\nNo hashtags."));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].content, "wen moon");
    }

    #[test]
    fn test_split_without_system() {
        let messages = vec![Message::user("hi")];
        let (system, rest) = split_system(&messages);
        assert!(system.is_none());
        assert_eq!(rest.len(), 1);
    }
}
