//! The chat controller.
//!
//! The controller turns each submit event into one exchange with the backend:
//!
//! 1. the trimmed input is shown as a user message and the input is cleared;
//! 2. a `Thinking...` placeholder is shown in the pending state;
//! 3. the text is posted as the sole turn of a [`ChatRequest`];
//! 4. the placeholder is overwritten with the answer or a fixed failure text.
//!
//! Steps 1 and 2 run synchronously when the event is dispatched, so messages
//! appear in submission order.  Steps 3 and 4 run in a task per submission;
//! every task owns the handle of its own placeholder, so answers land on the
//! right node whatever order they arrive in.
//!
//! ```
//! # use std::sync::Arc;
//! # use chatbox::{ChatController, ChatRequest, ChatResponse, ChatTransport, Resolution};
//! # use chatbox::surface::{
//! #     ChannelForm, ElementIds, MemoryInput, MemoryPage, MemorySink, SubmitEvent,
//! # };
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl ChatTransport for Echo {
//!     async fn send(&self, request: &ChatRequest) -> chatbox::Result<ChatResponse> {
//!         let text = format!("**{}**", request.conversation[0].text);
//!         Ok(ChatResponse::with_result(text))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let sink = Arc::new(MemorySink::new());
//! let input = Arc::new(MemoryInput::new());
//! let (_handle, form) = ChannelForm::new(input.clone());
//! let ids = ElementIds::default();
//! let mut page = MemoryPage::new()
//!     .with_message_list(&ids.container, sink.clone())
//!     .with_input_field(&ids.input, input.clone())
//!     .with_form(&ids.form, Box::new(form));
//! let (controller, _form) =
//!     ChatController::initialize(&mut page, &ids, Arc::new(Echo)).unwrap();
//!
//! input.set_value("hello");
//! let resolution = controller.on_submit(&mut SubmitEvent::new()).await;
//! assert_eq!(resolution, Some(Resolution::Answered));
//! assert_eq!(sink.snapshot()[1].text(), "hello");
//! # });
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::task::JoinHandle;

use crate::client::ChatTransport;
use crate::error::{Error, Result};
use crate::observability::{
    RESOLVED_ANSWERED, RESOLVED_FAILED, RESOLVED_NO_RESULT, SUBMISSION_DURATION, SUBMISSIONS,
    SUBMISSIONS_EMPTY,
};
use crate::surface::{ElementIds, InputField, MessageSink, Page, SubmitEvent, SubmitSource};
use crate::transform::{MarkupPolicy, render_result};
use crate::types::{ChatRequest, Message, MessageBody, MessageHandle, Sender};

/// Text of the placeholder shown while a response is awaited.
pub const PLACEHOLDER_TEXT: &str = "Thinking...";

/// Shown when the backend answered without a usable result.
pub const NO_RESPONSE_TEXT: &str = "Sorry, no response received.";

/// Shown when the request failed for any reason.
pub const FAILURE_TEXT: &str = "Failed to get response from server.";

////////////////////////////////////////// SubmissionState /////////////////////////////////////////

/// Where a single submission is in its lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    /// Nothing submitted yet.
    Idle,
    /// The user's message is on screen.
    UserMessageShown,
    /// The placeholder is on screen and the request is in flight.
    PendingResponse,
    /// The placeholder holds the backend's answer or the no-result text.
    Resolved,
    /// The placeholder holds the failure text.
    ErrorShown,
}

impl SubmissionState {
    /// Returns true for states a submission never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Resolved | SubmissionState::ErrorShown)
    }
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The backend's result replaced the placeholder.
    Answered,
    /// The backend answered without a result.
    NoResult,
    /// The backend answered with a non-success status.
    HttpFailure {
        /// HTTP status code.
        status_code: u16,
    },
    /// The request never produced a usable response.
    TransportFailure,
}

impl Resolution {
    /// Returns the terminal state this resolution corresponds to.
    pub fn state(&self) -> SubmissionState {
        match self {
            Resolution::Answered | Resolution::NoResult => SubmissionState::Resolved,
            Resolution::HttpFailure { .. } | Resolution::TransportFailure => {
                SubmissionState::ErrorShown
            }
        }
    }

    /// Returns true if the failure text was shown.
    pub fn is_failure(&self) -> bool {
        self.state() == SubmissionState::ErrorShown
    }
}

///////////////////////////////////////// PendingSubmission ////////////////////////////////////////

/// A submission whose messages are shown but whose request has not been sent.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    text: String,
    user_message: MessageHandle,
    placeholder: MessageHandle,
    started: Instant,
}

impl PendingSubmission {
    /// The trimmed text that was submitted.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Handle of the user's message.
    pub fn user_message(&self) -> MessageHandle {
        self.user_message
    }

    /// Handle of the placeholder that will be overwritten.
    pub fn placeholder(&self) -> MessageHandle {
        self.placeholder
    }
}

//////////////////////////////////////////// SessionStats //////////////////////////////////////////

#[derive(Debug, Default)]
struct Counters {
    submissions: AtomicU64,
    empty_inputs: AtomicU64,
    answered: AtomicU64,
    no_result: AtomicU64,
    http_failures: AtomicU64,
    transport_failures: AtomicU64,
    in_flight: AtomicU64,
}

/// Counters for one controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Non-empty submissions.
    pub submissions: u64,
    /// Submissions ignored because the input was blank.
    pub empty_inputs: u64,
    /// Submissions answered with a result.
    pub answered: u64,
    /// Submissions answered without a result.
    pub no_result: u64,
    /// Submissions that got a non-success status.
    pub http_failures: u64,
    /// Submissions whose request failed outright.
    pub transport_failures: u64,
    /// Submissions still awaiting a response.
    pub in_flight: u64,
}

////////////////////////////////////////////// InFlight ////////////////////////////////////////////

/// Tasks still resolving when [`ChatController::run`] returned.
#[derive(Debug, Default)]
pub struct InFlight {
    tasks: Vec<JoinHandle<Resolution>>,
}

impl InFlight {
    /// Returns the number of tasks that have not finished.
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Waits for every task and returns their resolutions.
    pub async fn settle(self) -> Vec<Resolution> {
        let mut resolutions = Vec::with_capacity(self.tasks.len());
        for joined in futures::future::join_all(self.tasks).await {
            match joined {
                Ok(resolution) => resolutions.push(resolution),
                Err(err) => tracing::error!(error = %err, "submission task failed"),
            }
        }
        resolutions
    }

    /// Abandons every task.  Their placeholders stay as they are.
    pub fn abort(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}

/////////////////////////////////////////// ChatController /////////////////////////////////////////

/// Wires a page's form to the chat backend.
///
/// Cloning is cheap; clones share the surface, transport and counters.
#[derive(Clone)]
pub struct ChatController {
    transport: Arc<dyn ChatTransport>,
    list: Arc<dyn MessageSink>,
    input: Arc<dyn InputField>,
    markup: MarkupPolicy,
    counters: Arc<Counters>,
}

impl fmt::Debug for ChatController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatController")
            .field("markup", &self.markup)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ChatController {
    /// Locates the required elements on `page` and builds a controller.
    ///
    /// Returns the controller together with the form's submit events.  If any
    /// element is missing nothing is wired and a configuration error naming
    /// every missing id is returned.
    pub fn initialize(
        page: &mut dyn Page,
        ids: &ElementIds,
        transport: Arc<dyn ChatTransport>,
    ) -> Result<(Self, Box<dyn SubmitSource>)> {
        let list = page.message_list(&ids.container);
        let form = page.take_form(&ids.form);
        let input = page.input_field(&ids.input);

        let mut missing = Vec::new();
        if list.is_none() {
            missing.push(ids.container.clone());
        }
        if form.is_none() {
            missing.push(ids.form.clone());
        }
        if input.is_none() {
            missing.push(ids.input.clone());
        }

        match (list, form, input) {
            (Some(list), Some(form), Some(input)) => {
                let controller = Self {
                    transport,
                    list,
                    input,
                    markup: MarkupPolicy::default(),
                    counters: Arc::new(Counters::default()),
                };
                Ok((controller, form))
            }
            _ => {
                let err = Error::configuration("required page elements not found", missing);
                tracing::error!(error = %err, "chat controller not initialized");
                Err(err)
            }
        }
    }

    /// Sets how much of the backend's text is trusted as markup.
    pub fn with_markup_policy(mut self, markup: MarkupPolicy) -> Self {
        self.markup = markup;
        self
    }

    /// Returns the active markup policy.
    pub fn markup_policy(&self) -> MarkupPolicy {
        self.markup
    }

    /// Appends a message and keeps the newest message in view.
    pub fn append_message(&self, text: &str, sender: Sender) -> MessageHandle {
        let handle = self.list.append(&Message::new(text, sender));
        self.list.scroll_to_latest();
        handle
    }

    /// Runs the synchronous half of a submission.
    ///
    /// Suppresses the event's default action, then shows the user's message
    /// and the placeholder.  The text is the value the event captured at
    /// dispatch, or else the input's current value.  Returns `None` and does
    /// nothing else when the trimmed text is empty.
    ///
    /// The input is cleared unless it has changed since the event captured it.
    pub fn begin(&self, event: &mut SubmitEvent) -> Option<PendingSubmission> {
        event.prevent_default();

        let raw = match event.submitted_value() {
            Some(value) => value.to_string(),
            None => self.input.value(),
        };
        let text = raw.trim().to_string();
        if text.is_empty() {
            SUBMISSIONS_EMPTY.click();
            self.counters.empty_inputs.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        SUBMISSIONS.click();
        self.counters.submissions.fetch_add(1, Ordering::Relaxed);

        let user_message = self.append_message(&text, Sender::User);
        if self.input.value() == raw {
            self.input.clear();
        }
        tracing::debug!(
            state = ?SubmissionState::UserMessageShown,
            message = user_message.index(),
            "user message shown"
        );

        let placeholder = self.append_message(PLACEHOLDER_TEXT, Sender::Bot);
        self.list.set_pending(placeholder, true);
        self.counters.in_flight.fetch_add(1, Ordering::Relaxed);

        Some(PendingSubmission {
            text,
            user_message,
            placeholder,
            started: Instant::now(),
        })
    }

    /// Sends a begun submission and overwrites its placeholder with the outcome.
    pub async fn resolve(&self, pending: PendingSubmission) -> Resolution {
        let placeholder = pending.placeholder;
        tracing::debug!(
            state = ?SubmissionState::PendingResponse,
            message = placeholder.index(),
            "sending chat request"
        );

        let request = ChatRequest::from_user_text(pending.text.as_str());
        let resolution = match self.transport.send(&request).await {
            Ok(response) => match response.result() {
                Some(result) => {
                    let markup = render_result(result, self.markup);
                    self.list
                        .replace(placeholder, MessageBody::Markup(markup), false);
                    Resolution::Answered
                }
                None => {
                    self.list.replace(
                        placeholder,
                        MessageBody::Text(NO_RESPONSE_TEXT.to_string()),
                        false,
                    );
                    Resolution::NoResult
                }
            },
            Err(Error::Http {
                status_code,
                reason,
                body,
            }) => {
                tracing::error!(
                    status = status_code,
                    reason = reason.as_deref().unwrap_or(""),
                    body = body.as_deref().unwrap_or(""),
                    "server error"
                );
                self.show_failure(placeholder);
                Resolution::HttpFailure { status_code }
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    timed_out = err.is_timeout(),
                    unreachable = err.is_connection(),
                    "chat request failed"
                );
                self.show_failure(placeholder);
                Resolution::TransportFailure
            }
        };

        self.record(&resolution);
        SUBMISSION_DURATION.add(pending.started.elapsed().as_secs_f64());
        tracing::debug!(
            state = ?resolution.state(),
            message = placeholder.index(),
            ?resolution,
            "submission settled"
        );
        resolution
    }

    /// Handles one submit event from start to finish.
    ///
    /// Returns `None` if the input was blank.
    pub async fn on_submit(&self, event: &mut SubmitEvent) -> Option<Resolution> {
        let pending = self.begin(event)?;
        Some(self.resolve(pending).await)
    }

    /// Handles one submit event, resolving it on a spawned task.
    ///
    /// Must be called within a tokio runtime.  Returns `None` if the input
    /// was blank.
    pub fn submit(&self, mut event: SubmitEvent) -> Option<JoinHandle<Resolution>> {
        let pending = self.begin(&mut event)?;
        let this = self.clone();
        Some(tokio::spawn(async move { this.resolve(pending).await }))
    }

    /// Handles submit events until the form closes.
    ///
    /// Submissions are not serialized: each is resolved on its own task.  The
    /// tasks still running when the form closes are handed back.
    pub async fn run(&self, mut form: Box<dyn SubmitSource>) -> InFlight {
        let mut in_flight = InFlight::default();
        while let Some(event) = form.next_submit().await {
            in_flight.tasks.retain(|task| !task.is_finished());
            if let Some(task) = self.submit(event) {
                in_flight.tasks.push(task);
            }
        }
        tracing::debug!(pending = in_flight.pending(), "form closed");
        in_flight
    }

    /// Returns a snapshot of this controller's counters.
    pub fn stats(&self) -> SessionStats {
        let c = &self.counters;
        SessionStats {
            submissions: c.submissions.load(Ordering::Relaxed),
            empty_inputs: c.empty_inputs.load(Ordering::Relaxed),
            answered: c.answered.load(Ordering::Relaxed),
            no_result: c.no_result.load(Ordering::Relaxed),
            http_failures: c.http_failures.load(Ordering::Relaxed),
            transport_failures: c.transport_failures.load(Ordering::Relaxed),
            in_flight: c.in_flight.load(Ordering::Relaxed),
        }
    }

    fn show_failure(&self, placeholder: MessageHandle) {
        self.list.replace(
            placeholder,
            MessageBody::Text(FAILURE_TEXT.to_string()),
            false,
        );
    }

    fn record(&self, resolution: &Resolution) {
        let c = &self.counters;
        c.in_flight.fetch_sub(1, Ordering::Relaxed);
        match resolution {
            Resolution::Answered => {
                RESOLVED_ANSWERED.click();
                c.answered.fetch_add(1, Ordering::Relaxed);
            }
            Resolution::NoResult => {
                RESOLVED_NO_RESULT.click();
                c.no_result.fetch_add(1, Ordering::Relaxed);
            }
            Resolution::HttpFailure { .. } => {
                RESOLVED_FAILED.click();
                c.http_failures.fetch_add(1, Ordering::Relaxed);
            }
            Resolution::TransportFailure => {
                RESOLVED_FAILED.click();
                c.transport_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
