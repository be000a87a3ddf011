//! The rendering surface the controller drives.
//!
//! A surface is whatever shows the conversation: a terminal, a test harness,
//! or a page in an embedding application.  The controller never creates its
//! surface; it locates three elements on a [`Page`] by id and talks to them
//! through the traits below.
//!
//! - [`MessageSink`]: the append-only message list.
//! - [`InputField`]: the text the user is composing.
//! - [`SubmitSource`]: the form that yields submit events.

mod memory;

use std::sync::Arc;

pub use memory::{ChannelForm, FormHandle, MemoryInput, MemoryPage, MemorySink, MessageNode};

use crate::types::{Message, MessageBody, MessageHandle};

/// Default id of the message container.
pub const CHAT_BOX_ID: &str = "chat-box";

/// Default id of the submission form.
pub const CHAT_FORM_ID: &str = "chat-form";

/// Default id of the text input.
pub const USER_INPUT_ID: &str = "user-input";

/// Identifiers of the three elements the controller requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementIds {
    /// The message container.
    pub container: String,
    /// The submission form.
    pub form: String,
    /// The text input.
    pub input: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            container: CHAT_BOX_ID.to_string(),
            form: CHAT_FORM_ID.to_string(),
            input: USER_INPUT_ID.to_string(),
        }
    }
}

/// The append-only list of displayed messages.
///
/// Implementations are shared between concurrently resolving submissions, so
/// every method takes `&self`.  Each submission only ever touches the node
/// behind its own handle.
pub trait MessageSink: Send + Sync {
    /// Appends a message node to the end of the list and returns its handle.
    fn append(&self, message: &Message) -> MessageHandle;

    /// Sets or clears the pending visual state of a node.
    fn set_pending(&self, handle: MessageHandle, pending: bool);

    /// Overwrites the content of a node in place.
    fn replace(&self, handle: MessageHandle, body: MessageBody, pending: bool);

    /// Scrolls the list so the newest node is visible.
    fn scroll_to_latest(&self);
}

/// The text input the user types into.
pub trait InputField: Send + Sync {
    /// Returns the current, untrimmed value.
    fn value(&self) -> String;

    /// Empties the field.
    fn clear(&self);
}

/// A submit event dispatched by a form.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubmitEvent {
    default_prevented: bool,
    value: Option<String>,
}

impl SubmitEvent {
    /// Creates a new event whose default action has not been suppressed.
    ///
    /// The handler reads the input field when it runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an event carrying the input's value as it was at dispatch.
    ///
    /// Forms whose events are handled later than they are dispatched use this
    /// so that a newer value in the field cannot replace an older submission.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            default_prevented: false,
            value: Some(value.into()),
        }
    }

    /// Returns the value captured at dispatch, if any.
    pub fn submitted_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Suppresses the form's default action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Returns true once [`SubmitEvent::prevent_default`] has been called.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// A form that yields submit events.
#[async_trait::async_trait]
pub trait SubmitSource: Send {
    /// Waits for the next submission.  Returns `None` once the form is gone.
    async fn next_submit(&mut self) -> Option<SubmitEvent>;
}

/// A page that holds surface elements addressed by id.
pub trait Page {
    /// Looks up a message container.
    fn message_list(&self, id: &str) -> Option<Arc<dyn MessageSink>>;

    /// Looks up a text input.
    fn input_field(&self, id: &str) -> Option<Arc<dyn InputField>>;

    /// Takes ownership of a form's submit events.
    ///
    /// A form can be taken once; later calls return `None`.
    fn take_form(&mut self, id: &str) -> Option<Box<dyn SubmitSource>>;
}
