//! HTML to plain text conversion for scraped documentation pages.

use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;

/// Elements whose contents are never documentation text.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static NON_TEXT_ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>|<template\b.*?</template\s*>",
    )
    .unwrap()
});

/// HTML comments, including conditional comments.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Any remaining tag, doctype or processing instruction.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[!/?]?[a-zA-Z][^>]*>").unwrap());

/// Extract readable text from an HTML document.
///
/// Script, style, noscript and template elements are removed with their
/// contents, comments are dropped, every other tag becomes a separator,
/// entities are decoded and whitespace runs collapse to a single space.
///
/// ```rust
/// use apismith_core::html::extract_text_content;
///
/// let html = "<html><head><style>p{}</style></head><body><h1>Timers</h1><p>POST&nbsp;/timer/</p></body></html>";
/// assert_eq!(extract_text_content(html), "Timers POST /timer/");
/// ```
#[must_use]
pub fn extract_text_content(html: &str) -> String {
    let without_code = NON_TEXT_ELEMENT_RE.replace_all(html, " ");
    let without_comments = COMMENT_RE.replace_all(&without_code, " ");
    let without_tags = TAG_RE.replace_all(&without_comments, " ");
    let decoded = decode_html_entities(&without_tags);

    collapse_whitespace(&decoded)
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
