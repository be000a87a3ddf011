//! Display transform for backend results.
//!
//! Backends answer with lightly-marked-up text: `**` wraps emphasis and a
//! lone `*` starts a bullet.  Neither renders well in a message bubble, so
//! emphasis markers are dropped and bullets become line breaks.

/// Line break inserted for every lone `*`.
pub const LINE_BREAK: &str = "<br>";

/// How much of the backend's text is trusted as markup.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum MarkupPolicy {
    /// Pass the backend's text through verbatim apart from the transform.
    #[default]
    Trusted,

    /// Entity-escape the backend's text so only the transform's own line
    /// breaks remain markup.
    Escaped,
}

/// Applies the display transform to a backend result.
///
/// All `**` sequences are removed first, then every remaining `*` becomes
/// [`LINE_BREAK`].
///
/// ```
/// use chatbox::transform::{MarkupPolicy, render_result};
///
/// assert_eq!(render_result("a**b*c", MarkupPolicy::Trusted), "ab<br>c");
/// ```
pub fn render_result(result: &str, policy: MarkupPolicy) -> String {
    let stripped = result.replace("**", "");
    let stripped = match policy {
        MarkupPolicy::Trusted => stripped,
        MarkupPolicy::Escaped => escape_markup(&stripped),
    };
    stripped.replace('*', LINE_BREAK)
}

/// Replaces markup-significant characters with their entities.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_emphasis_then_breaks_bullets() {
        assert_eq!(render_result("a**b*c", MarkupPolicy::Trusted), "ab<br>c");
    }

    #[test]
    fn odd_runs_leave_one_break() {
        // "***" is "**" followed by "*".
        assert_eq!(render_result("x***y", MarkupPolicy::Trusted), "x<br>y");
        assert_eq!(render_result("****", MarkupPolicy::Trusted), "");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(
            render_result("no markers here", MarkupPolicy::Trusted),
            "no markers here"
        );
    }

    #[test]
    fn bullet_list() {
        assert_eq!(
            render_result("Options:* **fast** one* slow one", MarkupPolicy::Trusted),
            "Options:<br> fast one<br> slow one"
        );
    }

    #[test]
    fn trusted_passes_markup_through() {
        assert_eq!(
            render_result("<b>hi</b>*", MarkupPolicy::Trusted),
            "<b>hi</b><br>"
        );
    }

    #[test]
    fn escaped_keeps_only_transform_breaks() {
        assert_eq!(
            render_result("<script>x</script>*a & b", MarkupPolicy::Escaped),
            "&lt;script&gt;x&lt;/script&gt;<br>a &amp; b"
        );
    }
}
