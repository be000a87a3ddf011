use serde::{Deserialize, Serialize};

use crate::types::ConversationTurn;

/// Body of a `POST /api/chat` request.
///
/// Each request carries the single turn being submitted; no history is
/// accumulated between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The turns sent to the backend.
    pub conversation: Vec<ConversationTurn>,
}

impl ChatRequest {
    /// Create a request from the given turns.
    pub fn new(conversation: Vec<ConversationTurn>) -> Self {
        Self { conversation }
    }

    /// Create a request carrying one user turn.
    pub fn from_user_text(text: impl Into<String>) -> Self {
        Self::new(vec![ConversationTurn::user(text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_turn_wire_format() {
        let request = ChatRequest::from_user_text("What is Rust?");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"conversation":[{"role":"user","text":"What is Rust?"}]}"#
        );
    }
}
