//! Message markup helpers.
//!
//! Templates are written once in the Telegram HTML subset (`<b>`, `<code>`,
//! `<i>`) and mechanically down-translated for WhatsApp, which only knows
//! `*bold*`.

use std::sync::LazyLock;

use regex::Regex;

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<b>(.*?)</b>").expect("valid regex"));

static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Escape text for interpolation into a Telegram HTML message.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Translate a Telegram HTML message into WhatsApp markup.
///
/// `<b>x</b>` becomes `*x*`; every other tag (including `<code>`) is removed
/// and its inner text kept. Entities produced by [`escape_html`] are decoded
/// last so escaped user text cannot turn into tags.
pub fn html_to_whatsapp(html: &str) -> String {
    let bolded = BOLD_RE.replace_all(html, "*$1*");
    let stripped = ANY_TAG_RE.replace_all(&bolded, "");
    unescape_html(&stripped).trim().to_string()
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
