use std::fmt;

/// Who a displayed message belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Sender {
    /// Text the user submitted.
    User,

    /// Text produced on behalf of the backend.
    Bot,
}

impl Sender {
    /// Returns the lowercase tag for this sender.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    /// Returns the style class a surface attaches to this sender's messages.
    pub fn class(&self) -> &'static str {
        match self {
            Sender::User => "user-message",
            Sender::Bot => "bot-message",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as appended to the display list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The text of the message.
    pub text: String,

    /// Who the message belongs to.
    pub sender: Sender,
}

impl Message {
    /// Create a new message.
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
        }
    }

    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User)
    }

    /// Create a new bot message.
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot)
    }
}

/// Replacement content for an already-appended message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Plain text; a surface must display it verbatim.
    Text(String),

    /// Transformed backend output that may carry `<br>` line breaks.
    Markup(String),
}

impl MessageBody {
    /// Returns the raw content regardless of kind.
    pub fn as_str(&self) -> &str {
        match self {
            MessageBody::Text(s) | MessageBody::Markup(s) => s,
        }
    }

    /// Returns true if this body is markup.
    pub fn is_markup(&self) -> bool {
        matches!(self, MessageBody::Markup(_))
    }
}

/// Reference to one message node in a sink.
///
/// Handles are assigned by the sink in append order and stay valid for the
/// life of the sink.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageHandle(usize);

impl MessageHandle {
    /// Wraps a sink-assigned index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the sink-assigned index.
    pub fn index(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_tags() {
        assert_eq!(Sender::User.to_string(), "user");
        assert_eq!(Sender::Bot.class(), "bot-message");
    }

    #[test]
    fn body_kinds() {
        let text = MessageBody::Text("a<b".to_string());
        let markup = MessageBody::Markup("a<br>b".to_string());
        assert!(!text.is_markup());
        assert!(markup.is_markup());
        assert_eq!(markup.as_str(), "a<br>b");
    }
}
