//! Reply formatting: pure functions from upload outcomes to outbound message text.
//! Success replies are Telegram HTML; failure replies are plain text with nothing
//! secret in them.

use crate::upload::ImageUrls;

/// HTML success reply: one labelled `<pre>` block per representation plus a
/// ready-to-paste Markdown snippet for the WebP variant. `base_url` must not end
/// with a slash.
pub fn success_message(urls: &ImageUrls, base_url: &str) -> String {
    let original = format!("{}/{}", base_url, urls.original);
    let avif = format!("{}/{}", base_url, urls.avif);
    let webp = format!("{}/{}", base_url, urls.webp);
    format!(
        "<b>Upload complete!</b>\n\n\
         <b>Original</b><pre>{original}</pre>\n\n\
         <b>AVIF</b><pre>{avif}</pre>\n\n\
         <b>WebP</b><pre>{webp}</pre>\n\n\
         <b>Markdown</b><pre>![image]({webp})</pre>"
    )
}

/// Plain-text failure reply naming the reason.
pub fn failure_message(reason: &str) -> String {
    format!("Image upload failed: {reason}")
}

/// Generic reply when the attachment itself could not be fetched from the chat
/// platform.
pub fn fetch_failure_message() -> String {
    "Could not fetch the image from the chat. Please try sending it again.".to_string()
}
