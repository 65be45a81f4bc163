//! Conversation turns

use serde::{Deserialize, Serialize};

/// Who wrote a turn; serialises to the lowercase wire name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single turn of plain text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn text(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(Message::system("Answer in Korean")).unwrap();
        assert_eq!(value, json!({ "role": "system", "content": "Answer in Korean" }));

        let parsed: Message =
            serde_json::from_value(json!({ "role": "assistant", "content": "BYD leads" })).unwrap();
        assert_eq!(parsed, Message::assistant("BYD leads"));
    }
}
