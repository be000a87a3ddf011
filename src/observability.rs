use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatbox.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("chatbox.client.request_errors");
pub(crate) static CLIENT_TRANSPORT_ERRORS: Counter =
    Counter::new("chatbox.client.transport_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatbox.client.request_duration_seconds");

pub(crate) static SUBMISSIONS: Counter = Counter::new("chatbox.controller.submissions");
pub(crate) static SUBMISSIONS_EMPTY: Counter = Counter::new("chatbox.controller.empty_inputs");
pub(crate) static RESOLVED_ANSWERED: Counter = Counter::new("chatbox.controller.answered");
pub(crate) static RESOLVED_NO_RESULT: Counter = Counter::new("chatbox.controller.no_result");
pub(crate) static RESOLVED_FAILED: Counter = Counter::new("chatbox.controller.failed");
pub(crate) static SUBMISSION_DURATION: Moments =
    Moments::new("chatbox.controller.submission_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_TRANSPORT_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SUBMISSIONS);
    collector.register_counter(&SUBMISSIONS_EMPTY);
    collector.register_counter(&RESOLVED_ANSWERED);
    collector.register_counter(&RESOLVED_NO_RESULT);
    collector.register_counter(&RESOLVED_FAILED);
    collector.register_moments(&SUBMISSION_DURATION);
}
