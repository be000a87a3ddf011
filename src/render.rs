//! Terminal rendering of the message list.
//!
//! A terminal cannot rewrite a line the user has scrolled past, so
//! [`TerminalSink`] prints every change as a new line tagged with the node's
//! number.  A resolved placeholder shows up as a second line with the same
//! number as its `Thinking...` line.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use crate::surface::MessageSink;
use crate::transform::LINE_BREAK;
use crate::types::{Message, MessageBody, MessageHandle, Sender};

/// ANSI escape code for dim text (used for user echoes and status texts).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text (used for status texts).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the bot label).
const ANSI_CYAN: &str = "\x1b[36m";

/// Converts transformed markup into terminal text.
///
/// Line breaks become newlines continued at `indent`; everything else is
/// printed as-is, since a terminal does not interpret markup.
pub fn markup_to_text(markup: &str, indent: &str) -> String {
    markup.replace(LINE_BREAK, &format!("\n{indent}"))
}

/// Formats one line of output for a message node.
pub fn format_node(
    handle: MessageHandle,
    sender: Sender,
    body: &MessageBody,
    use_color: bool,
) -> String {
    let tag = format!("[#{}] {}: ", handle.index() + 1, sender);
    let indent = " ".repeat(tag.len());
    let text = match body {
        MessageBody::Markup(markup) => markup_to_text(markup, &indent),
        MessageBody::Text(text) => text.replace('\n', &format!("\n{indent}")),
    };
    if !use_color {
        return format!("{tag}{text}");
    }
    match (sender, body) {
        (Sender::User, _) => format!("{ANSI_DIM}{tag}{text}{ANSI_RESET}"),
        (Sender::Bot, MessageBody::Text(_)) => {
            format!("{ANSI_CYAN}{tag}{ANSI_RESET}{ANSI_DIM}{ANSI_ITALIC}{text}{ANSI_RESET}")
        }
        (Sender::Bot, MessageBody::Markup(_)) => format!("{ANSI_CYAN}{tag}{ANSI_RESET}{text}"),
    }
}

type LineWriter = Box<dyn FnMut(String) + Send>;

struct TerminalState {
    senders: Vec<Sender>,
    pending: Vec<bool>,
    write_line: LineWriter,
}

/// Message list that prints to the terminal.
pub struct TerminalSink {
    use_color: bool,
    state: Mutex<TerminalState>,
}

impl TerminalSink {
    /// Creates a sink that prints to stdout.
    pub fn stdout(use_color: bool) -> Self {
        Self::with_writer(use_color, |line| {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{line}");
            let _ = stdout.flush();
        })
    }

    /// Creates a sink that prints above an active line-editor prompt.
    pub fn with_printer<P>(use_color: bool, mut printer: P) -> Self
    where
        P: rustyline::ExternalPrinter + Send + 'static,
    {
        Self::with_writer(use_color, move |line| {
            if let Err(err) = printer.print(format!("{line}\n")) {
                tracing::warn!(error = %err, "could not print message");
            }
        })
    }

    /// Creates a sink that hands every formatted line to `write_line`.
    pub fn with_writer(use_color: bool, write_line: impl FnMut(String) + Send + 'static) -> Self {
        Self {
            use_color,
            state: Mutex::new(TerminalState {
                senders: Vec::new(),
                pending: Vec::new(),
                write_line: Box::new(write_line),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TerminalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns how many nodes are still pending.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.iter().filter(|p| **p).count()
    }
}

impl MessageSink for TerminalSink {
    fn append(&self, message: &Message) -> MessageHandle {
        let mut state = self.lock();
        let handle = MessageHandle::new(state.senders.len());
        state.senders.push(message.sender);
        state.pending.push(false);
        let line = format_node(
            handle,
            message.sender,
            &MessageBody::Text(message.text.clone()),
            self.use_color,
        );
        (state.write_line)(line);
        handle
    }

    fn set_pending(&self, handle: MessageHandle, pending: bool) {
        if let Some(slot) = self.lock().pending.get_mut(handle.index()) {
            *slot = pending;
        }
    }

    fn replace(&self, handle: MessageHandle, body: MessageBody, pending: bool) {
        let mut state = self.lock();
        let Some(sender) = state.senders.get(handle.index()).copied() else {
            return;
        };
        state.pending[handle.index()] = pending;
        let line = format_node(handle, sender, &body, self.use_color);
        (state.write_line)(line);
    }

    fn scroll_to_latest(&self) {
        // Terminals follow their output.
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn capture() -> (TerminalSink, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = lines.clone();
        let sink = TerminalSink::with_writer(false, move |line| {
            sink_lines.lock().unwrap().push(line);
        });
        (sink, lines)
    }

    #[test]
    fn markup_breaks_become_newlines() {
        assert_eq!(markup_to_text("ab<br>c", "  "), "ab\n  c");
        assert_eq!(markup_to_text("<b>x</b>", ""), "<b>x</b>");
    }

    #[test]
    fn plain_format() {
        let line = format_node(
            MessageHandle::new(0),
            Sender::User,
            &MessageBody::Text("hello".to_string()),
            false,
        );
        assert_eq!(line, "[#1] user: hello");

        let line = format_node(
            MessageHandle::new(1),
            Sender::Bot,
            &MessageBody::Markup("a<br>b".to_string()),
            false,
        );
        assert_eq!(line, "[#2] bot: a\n          b");
    }

    #[test]
    fn colored_placeholder_is_dim() {
        let line = format_node(
            MessageHandle::new(1),
            Sender::Bot,
            &MessageBody::Text("Thinking...".to_string()),
            true,
        );
        assert!(line.contains(ANSI_DIM));
        assert!(line.contains(ANSI_ITALIC));
        assert!(line.ends_with(ANSI_RESET));
    }

    #[test]
    fn exchange_prints_three_lines() {
        let (sink, lines) = capture();
        sink.append(&Message::user("hi"));
        let placeholder = sink.append(&Message::bot("Thinking..."));
        sink.set_pending(placeholder, true);
        assert_eq!(sink.pending_count(), 1);
        sink.replace(placeholder, MessageBody::Markup("hello".to_string()), false);
        assert_eq!(sink.pending_count(), 0);

        assert_eq!(
            *lines.lock().unwrap(),
            vec![
                "[#1] user: hi".to_string(),
                "[#2] bot: Thinking...".to_string(),
                "[#2] bot: hello".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_handles_print_nothing() {
        let (sink, lines) = capture();
        sink.replace(MessageHandle::new(3), MessageBody::Text("x".to_string()), false);
        sink.set_pending(MessageHandle::new(3), true);
        assert!(lines.lock().unwrap().is_empty());
    }
}
