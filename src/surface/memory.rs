//! In-memory surface for headless embedding and tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::{InputField, MessageSink, Page, SubmitEvent, SubmitSource};
use crate::types::{Message, MessageBody, MessageHandle, Sender};

//////////////////////////////////////////// MemorySink ////////////////////////////////////////////

/// A message node as held by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    /// Who the node belongs to.
    pub sender: Sender,
    /// Current content of the node.
    pub body: MessageBody,
    /// Whether the node carries the pending visual state.
    pub pending: bool,
}

impl MessageNode {
    /// Returns the node's content as a string.
    pub fn text(&self) -> &str {
        self.body.as_str()
    }
}

#[derive(Debug, Default)]
struct SinkState {
    nodes: Vec<MessageNode>,
    scroll_top: usize,
}

/// A message list that records every node in memory.
///
/// The scroll position is modelled as the index of the last node in view; the
/// list is at its maximum when it equals the node count.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<SinkState>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Returns true if no node has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the node behind `handle`.
    pub fn node(&self, handle: MessageHandle) -> Option<MessageNode> {
        self.lock().nodes.get(handle.index()).cloned()
    }

    /// Returns a copy of every node in display order.
    pub fn snapshot(&self) -> Vec<MessageNode> {
        self.lock().nodes.clone()
    }

    /// Returns the current scroll position.
    pub fn scroll_position(&self) -> usize {
        self.lock().scroll_top
    }

    /// Returns true if the newest node is in view.
    pub fn is_scrolled_to_latest(&self) -> bool {
        let state = self.lock();
        state.scroll_top == state.nodes.len()
    }
}

impl MessageSink for MemorySink {
    fn append(&self, message: &Message) -> MessageHandle {
        let mut state = self.lock();
        state.nodes.push(MessageNode {
            sender: message.sender,
            body: MessageBody::Text(message.text.clone()),
            pending: false,
        });
        MessageHandle::new(state.nodes.len() - 1)
    }

    fn set_pending(&self, handle: MessageHandle, pending: bool) {
        match self.lock().nodes.get_mut(handle.index()) {
            Some(node) => node.pending = pending,
            None => tracing::warn!(handle = handle.index(), "set_pending on unknown message"),
        }
    }

    fn replace(&self, handle: MessageHandle, body: MessageBody, pending: bool) {
        match self.lock().nodes.get_mut(handle.index()) {
            Some(node) => {
                node.body = body;
                node.pending = pending;
            }
            None => tracing::warn!(handle = handle.index(), "replace on unknown message"),
        }
    }

    fn scroll_to_latest(&self) {
        let mut state = self.lock();
        state.scroll_top = state.nodes.len();
    }
}

//////////////////////////////////////////// MemoryInput ///////////////////////////////////////////

/// A text input holding its value in memory.
#[derive(Debug, Default)]
pub struct MemoryInput {
    value: Mutex<String>,
}

impl MemoryInput {
    /// Creates an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the input's value, as if the user had typed it.
    pub fn set_value(&self, value: impl Into<String>) {
        *self.value.lock().unwrap_or_else(|p| p.into_inner()) = value.into();
    }
}

impl InputField for MemoryInput {
    fn value(&self) -> String {
        self.value.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn clear(&self) {
        self.value.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }
}

//////////////////////////////////////////// ChannelForm ///////////////////////////////////////////

/// A form whose submit events arrive over a channel.
///
/// Each event carries the bound input's value as it was when
/// [`FormHandle::submit`] was called, so events may queue up without losing
/// what was typed.
#[derive(Debug)]
pub struct ChannelForm {
    rx: mpsc::UnboundedReceiver<SubmitEvent>,
}

/// The sending half of a [`ChannelForm`].
#[derive(Clone)]
pub struct FormHandle {
    tx: mpsc::UnboundedSender<SubmitEvent>,
    input: Arc<dyn InputField>,
}

impl ChannelForm {
    /// Creates a form over `input` and the handle that submits it.
    pub fn new(input: Arc<dyn InputField>) -> (FormHandle, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (FormHandle { tx, input }, Self { rx })
    }
}

impl FormHandle {
    /// Dispatches a submit event.  Returns false if the form has been dropped.
    pub fn submit(&self) -> bool {
        self.tx
            .send(SubmitEvent::with_value(self.input.value()))
            .is_ok()
    }
}

impl fmt::Debug for FormHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHandle")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl SubmitSource for ChannelForm {
    async fn next_submit(&mut self) -> Option<SubmitEvent> {
        self.rx.recv().await
    }
}

//////////////////////////////////////////// MemoryPage ////////////////////////////////////////////

/// A page whose elements are registered by id.
#[derive(Default)]
pub struct MemoryPage {
    lists: HashMap<String, Arc<dyn MessageSink>>,
    inputs: HashMap<String, Arc<dyn InputField>>,
    forms: HashMap<String, Box<dyn SubmitSource>>,
}

impl MemoryPage {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a message container.
    pub fn with_message_list(mut self, id: impl Into<String>, list: Arc<dyn MessageSink>) -> Self {
        self.lists.insert(id.into(), list);
        self
    }

    /// Registers a text input.
    pub fn with_input_field(mut self, id: impl Into<String>, input: Arc<dyn InputField>) -> Self {
        self.inputs.insert(id.into(), input);
        self
    }

    /// Registers a form.
    pub fn with_form(mut self, id: impl Into<String>, form: Box<dyn SubmitSource>) -> Self {
        self.forms.insert(id.into(), form);
        self
    }
}

impl fmt::Debug for MemoryPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPage")
            .field("lists", &self.lists.keys().collect::<Vec<_>>())
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("forms", &self.forms.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Page for MemoryPage {
    fn message_list(&self, id: &str) -> Option<Arc<dyn MessageSink>> {
        self.lists.get(id).cloned()
    }

    fn input_field(&self, id: &str) -> Option<Arc<dyn InputField>> {
        self.inputs.get(id).cloned()
    }

    fn take_form(&mut self, id: &str) -> Option<Box<dyn SubmitSource>> {
        self.forms.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_handles_in_order() {
        let sink = MemorySink::new();
        let first = sink.append(&Message::user("one"));
        let second = sink.append(&Message::bot("two"));
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.node(second).unwrap().sender, Sender::Bot);
    }

    #[test]
    fn replace_overwrites_one_node() {
        let sink = MemorySink::new();
        let a = sink.append(&Message::bot("Thinking..."));
        let b = sink.append(&Message::bot("Thinking..."));
        sink.set_pending(a, true);
        sink.set_pending(b, true);
        sink.replace(b, MessageBody::Markup("done".to_string()), false);

        let a = sink.node(a).unwrap();
        let b = sink.node(b).unwrap();
        assert_eq!(a.text(), "Thinking...");
        assert!(a.pending);
        assert_eq!(b.text(), "done");
        assert!(!b.pending);
    }

    #[test]
    fn unknown_handle_is_ignored() {
        let sink = MemorySink::new();
        sink.replace(MessageHandle::new(7), MessageBody::Text("x".to_string()), false);
        sink.set_pending(MessageHandle::new(7), true);
        assert!(sink.is_empty());
    }

    #[test]
    fn scroll_tracks_latest() {
        let sink = MemorySink::new();
        sink.append(&Message::user("one"));
        assert!(!sink.is_scrolled_to_latest());
        sink.scroll_to_latest();
        assert!(sink.is_scrolled_to_latest());
        assert_eq!(sink.scroll_position(), 1);
    }

    #[test]
    fn input_set_and_clear() {
        let input = MemoryInput::new();
        input.set_value("  hi  ");
        assert_eq!(input.value(), "  hi  ");
        input.clear();
        assert_eq!(input.value(), "");
    }

    #[tokio::test]
    async fn channel_form_delivers_until_dropped() {
        let input = Arc::new(MemoryInput::new());
        let (handle, mut form) = ChannelForm::new(input.clone());
        input.set_value("hello");
        assert!(handle.submit());
        drop(handle);
        assert_eq!(
            form.next_submit().await,
            Some(SubmitEvent::with_value("hello"))
        );
        assert_eq!(form.next_submit().await, None);
    }

    #[tokio::test]
    async fn queued_events_keep_their_own_values() {
        let input = Arc::new(MemoryInput::new());
        let (handle, mut form) = ChannelForm::new(input.clone());
        input.set_value("first");
        assert!(handle.submit());
        input.set_value("second");
        assert!(handle.submit());

        let first = form.next_submit().await.unwrap();
        let second = form.next_submit().await.unwrap();
        assert_eq!(first.submitted_value(), Some("first"));
        assert_eq!(second.submitted_value(), Some("second"));
    }

    #[test]
    fn forms_are_taken_once() {
        let (_handle, form) = ChannelForm::new(Arc::new(MemoryInput::new()));
        let mut page = MemoryPage::new().with_form("chat-form", Box::new(form));
        assert!(page.take_form("chat-form").is_some());
        assert!(page.take_form("chat-form").is_none());
        assert!(page.message_list("chat-box").is_none());
    }
}
