use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:(amp|quot|lt|gt)|#([0-9]{1,8})|#[xX]([0-9a-fA-F]{1,6}));")
        .expect("entity pattern is a valid regex")
});

/// Decodes the HTML entities memory snippets arrive with.
///
/// Named `&amp; &quot; &lt; &gt;` plus decimal `&#N;` and hex `&#xN;` numeric
/// references are decoded in a single pass; anything that does not resolve to
/// a valid `char` is left untouched.
pub fn normalize(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    ENTITY_PATTERN.replace_all(text, |caps: &Captures<'_>| {
        let decoded = if let Some(named) = caps.get(1) {
            match named.as_str() {
                "amp" => Some('&'),
                "quot" => Some('"'),
                "lt" => Some('<'),
                _ => Some('>'),
            }
        } else if let Some(decimal) = caps.get(2) {
            decimal.as_str().parse::<u32>().ok().and_then(char::from_u32)
        } else {
            caps.get(3)
                .and_then(|hex| u32::from_str_radix(hex.as_str(), 16).ok())
                .and_then(char::from_u32)
        };

        match decoded {
            Some(ch) => ch.to_string(),
            None => caps[0].to_owned(),
        }
    })
}

pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Shortens `text` for on-canvas display, appending an ellipsis when cut.
pub fn ellipsize(text: &str, max_chars: usize) -> Cow<'_, str> {
    let truncated = truncate_chars(text, max_chars);
    if truncated.len() == text.len() {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{}…", truncated.trim_end()))
    }
}
