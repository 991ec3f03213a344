//! Log helpers shared by the IM and upload modules.

const CONTENT_LOG_MAX_LEN: usize = 120;

/// Truncate content for logging (avoid huge dumps of message text or raw HTTP
/// bodies). Truncation counts characters, so multi-byte content is never split
/// mid code point.
#[inline]
pub fn truncate_content(content: &str, max_len: usize) -> std::borrow::Cow<'_, str> {
    if content.chars().count() <= max_len {
        std::borrow::Cow::Borrowed(content)
    } else {
        let head: String = content.chars().take(max_len).collect();
        std::borrow::Cow::Owned(format!("{}... ({} bytes)", head, content.len()))
    }
}

#[inline]
pub fn truncate_content_default(content: &str) -> std::borrow::Cow<'_, str> {
    truncate_content(content, CONTENT_LOG_MAX_LEN)
}
