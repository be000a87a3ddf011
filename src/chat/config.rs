//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::ChatClient;
use crate::error::Result;
use crate::surface::ElementIds;
use crate::transform::MarkupPolicy;

/// Log filter used when neither `--log-filter` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Command-line arguments for the chatbox tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the chat backend.
    #[arrrg(
        optional,
        "Backend base URL (default: $CHATBOX_URL or http://127.0.0.1:3000)",
        "URL"
    )]
    pub url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECS")]
    pub timeout_secs: Option<u32>,

    /// Escape markup in backend answers instead of trusting it.
    #[arrrg(flag, "Escape markup in backend answers")]
    pub escape_markup: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Tracing filter directive.
    #[arrrg(optional, "Log filter (default: $RUST_LOG or warn)", "FILTER")]
    pub log_filter: Option<String>,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the backend; `None` defers to the environment.
    pub base_url: Option<String>,

    /// Optional request timeout.  `None` lets a request wait indefinitely.
    pub timeout: Option<Duration>,

    /// How much of the backend's text is trusted as markup.
    pub markup: MarkupPolicy,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Tracing filter directive, if given on the command line.
    pub log_filter: Option<String>,

    /// Ids of the surface elements the controller looks up.
    pub element_ids: ElementIds,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: from the environment
    /// - Timeout: none
    /// - Markup: trusted
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: None,
            markup: MarkupPolicy::Trusted,
            use_color: true,
            log_filter: None,
            element_ids: ElementIds::default(),
        }
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the markup policy.
    pub fn with_markup(mut self, markup: MarkupPolicy) -> Self {
        self.markup = markup;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the tracing filter.
    pub fn with_log_filter(mut self, filter: Option<String>) -> Self {
        self.log_filter = filter;
        self
    }

    /// Sets the surface element ids.
    pub fn with_element_ids(mut self, ids: ElementIds) -> Self {
        self.element_ids = ids;
        self
    }

    /// Returns the filter to install: the configured one, then `RUST_LOG`,
    /// then [`DEFAULT_LOG_FILTER`].
    pub fn effective_log_filter(&self) -> String {
        self.log_filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }

    /// Builds an HTTP client for this configuration.
    pub fn client(&self) -> Result<ChatClient> {
        ChatClient::with_options(self.base_url.clone(), self.timeout)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let markup = if args.escape_markup {
            MarkupPolicy::Escaped
        } else {
            MarkupPolicy::Trusted
        };

        ChatConfig {
            base_url: args.url,
            timeout: args
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(|secs| Duration::from_secs(secs.into())),
            markup,
            use_color: !args.no_color,
            log_filter: args.log_filter,
            ..ChatConfig::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert!(config.base_url.is_none());
        assert!(config.timeout.is_none());
        assert_eq!(config.markup, MarkupPolicy::Trusted);
        assert!(config.use_color);
        assert!(config.log_filter.is_none());
        assert_eq!(config.element_ids, ElementIds::default());
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert!(config.base_url.is_none());
        assert!(config.timeout.is_none());
        assert_eq!(config.markup, MarkupPolicy::Trusted);
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            url: Some("http://chat.internal:8080".to_string()),
            timeout_secs: Some(30),
            escape_markup: true,
            no_color: true,
            log_filter: Some("chatbox=debug".to_string()),
        };
        let config = ChatConfig::from(args);
        assert_eq!(
            config.base_url.as_deref(),
            Some("http://chat.internal:8080")
        );
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.markup, MarkupPolicy::Escaped);
        assert!(!config.use_color);
        assert_eq!(config.effective_log_filter(), "chatbox=debug");
    }

    #[test]
    fn zero_timeout_means_none() {
        let args = ChatArgs {
            timeout_secs: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::from(args).timeout.is_none());
    }

    #[test]
    fn config_builder_pattern() {
        let ids = ElementIds {
            container: "log".to_string(),
            form: "composer".to_string(),
            input: "prompt".to_string(),
        };
        let config = ChatConfig::new()
            .with_base_url("http://localhost:9000")
            .with_timeout(Some(Duration::from_secs(5)))
            .with_markup(MarkupPolicy::Escaped)
            .without_color()
            .with_log_filter(Some("info".to_string()))
            .with_element_ids(ids.clone());

        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.markup, MarkupPolicy::Escaped);
        assert!(!config.use_color);
        assert_eq!(config.effective_log_filter(), "info");
        assert_eq!(config.element_ids, ids);
    }

    #[test]
    fn client_uses_configured_url() {
        let config = ChatConfig::new().with_base_url("http://localhost:9000/chat");
        let client = config.client().unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:9000/chat/api/chat"
        );
    }
}
