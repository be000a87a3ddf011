use serde::{Deserialize, Serialize};

/// One role-tagged text entry sent to the chat backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who authored the turn.
    pub role: TurnRole,

    /// The text of the turn.
    pub text: String,
}

/// Role type for a conversation turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// User role.
    User,
}

impl ConversationTurn {
    /// Create a new turn with the given role and text.
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Create a new user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_turn_serialization() {
        let turn = ConversationTurn::user("hello");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "text": "hello"}));
    }

    #[test]
    fn unknown_role_rejected() {
        let json = serde_json::json!({"role": "wizard", "text": "hi"});
        assert!(serde_json::from_value::<ConversationTurn>(json).is_err());
    }
}
