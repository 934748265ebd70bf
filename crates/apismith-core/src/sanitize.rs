//! Text clean-up applied by the orchestrator to model output.
//!
//! - [`sanitize_title`] folds an extracted API title to ASCII so it is safe to
//!   use as a file name and inside the generation prompt.
//! - [`clean_generated_code`] strips markdown fencing the model echoes around
//!   generated source.
//! - [`file_stem_for`] maps a sanitized title onto a file stem.

use unicode_normalization::UnicodeNormalization;

use crate::types::TargetLanguage;

/// File stem used when a title sanitizes to nothing.
pub const FALLBACK_FILE_STEM: &str = "api_client";

/// Fold a title to ASCII.
///
/// The title is decomposed (NFKD) so accented letters split into a base letter
/// plus combining marks, every non-ASCII char is dropped, and surrounding
/// whitespace is trimmed. The output is a fixed point: sanitizing it again
/// returns it unchanged.
///
/// ```rust
/// use apismith_core::sanitize::sanitize_title;
///
/// assert_eq!(sanitize_title("Café Réservations API"), "Cafe Reservations API");
/// assert_eq!(sanitize_title("日本 Weather"), "Weather");
/// ```
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let ascii: String = title.nfkd().filter(char::is_ascii).collect();
    ascii.trim().to_string()
}

/// Remove markdown fencing and a stray language token from generated code.
///
/// Lines opening or closing a fenced block (three backticks, optionally
/// followed by a language tag) are dropped. A first non-blank line that holds
/// nothing but a language name is dropped too, as is a single pair of
/// backticks wrapping the whole text. Backticks inside the code are kept. Blank lines at either end are removed and the result ends with
/// a single newline unless it is empty.
#[must_use]
pub fn clean_generated_code(code: &str, language: TargetLanguage) -> String {
    let unfenced: Vec<&str> = code
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();

    let mut start = unfenced
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(unfenced.len());
    if unfenced
        .get(start)
        .is_some_and(|line| is_language_token(line, language))
    {
        start += 1;
    }

    let body = unfenced[start..].join("\n");
    let body = strip_wrapping_backticks(&body);

    let lines: Vec<&str> = body.lines().collect();
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());

    match (first, last) {
        (Some(first), Some(last)) => {
            let mut cleaned = lines[first..=last].join("\n");
            cleaned.push('\n');
            cleaned
        },
        _ => String::new(),
    }
}

/// Unwrap `` `code` `` when one backtick pair encloses the entire text.
fn strip_wrapping_backticks(body: &str) -> &str {
    let trimmed = body.trim();
    trimmed
        .strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
        .filter(|inner| !inner.contains('`'))
        .unwrap_or(body)
}

fn is_language_token(line: &str, language: TargetLanguage) -> bool {
    let token = line.trim().trim_matches('`').trim().to_ascii_lowercase();
    if token.is_empty() {
        return false;
    }
    language.aliases().contains(&token.as_str())
        || TargetLanguage::ALL
            .iter()
            .any(|lang| lang.name() == token)
}

/// Derive a file stem from a sanitized title.
///
/// Path separators, characters rejected by common filesystems and control
/// characters become `_`; leading/trailing dots and spaces are trimmed. An
/// empty result falls back to [`FALLBACK_FILE_STEM`]. Deterministic: the same
/// title always yields the same stem.
#[must_use]
pub fn file_stem_for(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|ch| {
            if ch.is_control() || matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let trimmed = replaced.trim_matches(|ch: char| ch == '.' || ch.is_whitespace());
    if trimmed.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_title_strips_accents() {
        assert_eq!(sanitize_title("Crème Brûlée API"), "Creme Brulee API");
        assert_eq!(sanitize_title("Ñandú Service"), "Nandu Service");
    }

    #[test]
    fn test_sanitize_title_drops_non_latin() {
        assert_eq!(sanitize_title("Погода API"), "API");
        assert_eq!(sanitize_title("🚀 Rocket API ✨"), "Rocket API");
    }

    #[test]
    fn test_sanitize_title_compatibility_forms() {
        // NFKD maps the ligature and full-width letters onto ASCII
        assert_eq!(sanitize_title("ﬁle Ａpi"), "file Api");
    }

    #[test]
    fn test_sanitize_title_ascii_unchanged() {
        assert_eq!(sanitize_title("Timer API"), "Timer API");
    }

    #[test]
    fn test_clean_generated_code_removes_fences() {
        let raw = "```python\nimport requests\n\nclass TimerAPI:\n    pass\n```\n";
        let cleaned = clean_generated_code(raw, TargetLanguage::Python);
        assert_eq!(cleaned, "import requests\n\nclass TimerAPI:\n    pass\n");
    }

    #[test]
    fn test_clean_generated_code_removes_stray_language_line() {
        let raw = "python\nimport requests\n";
        let cleaned = clean_generated_code(raw, TargetLanguage::Python);
        assert_eq!(cleaned, "import requests\n");
    }

    #[test]
    fn test_clean_generated_code_keeps_language_word_in_body() {
        let raw = "# A python client\nimport requests\n";
        let cleaned = clean_generated_code(raw, TargetLanguage::Python);
        assert_eq!(cleaned, raw);
    }

    #[test]
    fn test_clean_generated_code_wrapped_in_single_backticks() {
        let raw = "`const x = 1;`";
        let cleaned = clean_generated_code(raw, TargetLanguage::JavaScript);
        assert_eq!(cleaned, "const x = 1;\n");
    }

    #[test]
    fn test_clean_generated_code_keeps_trailing_template_literal() {
        let raw = "```javascript\nconst USAGE = `\nnode client.js\n`\n```";
        let cleaned = clean_generated_code(raw, TargetLanguage::JavaScript);
        assert_eq!(cleaned, "const USAGE = `\nnode client.js\n`\n");
    }

    #[test]
    fn test_clean_generated_code_keeps_backticks_at_both_edges() {
        let raw = "`${a}` + `${b}`";
        let cleaned = clean_generated_code(raw, TargetLanguage::JavaScript);
        assert_eq!(cleaned, "`${a}` + `${b}`\n");
    }

    #[test]
    fn test_clean_generated_code_preserves_indentation() {
        let raw = "\n\n```rust\n    fn main() {}\n```";
        let cleaned = clean_generated_code(raw, TargetLanguage::Rust);
        assert_eq!(cleaned, "    fn main() {}\n");
    }

    #[test]
    fn test_clean_generated_code_empty() {
        assert_eq!(clean_generated_code("```\n```", TargetLanguage::Go), "");
        assert_eq!(clean_generated_code("", TargetLanguage::Go), "");
    }

    #[test]
    fn test_file_stem_for() {
        assert_eq!(file_stem_for("Timer API"), "Timer API");
        assert_eq!(file_stem_for("Users/Groups API"), "Users_Groups API");
        assert_eq!(file_stem_for("a:b*c?"), "a_b_c_");
        assert_eq!(file_stem_for("..."), FALLBACK_FILE_STEM);
        assert_eq!(file_stem_for(""), FALLBACK_FILE_STEM);
    }

    proptest! {
        #[test]
        fn test_sanitize_title_idempotent(title in "\\PC{0,40}") {
            let once = sanitize_title(&title);
            let twice = sanitize_title(&once);
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.is_ascii());
        }

        #[test]
        fn test_file_stem_never_contains_separators(title in "\\PC{0,40}") {
            let stem = file_stem_for(&sanitize_title(&title));
            prop_assert!(!stem.is_empty());
            prop_assert!(!stem.contains('/'));
            prop_assert!(!stem.contains('\\'));
        }

        #[test]
        fn test_clean_generated_code_has_no_fence_lines(body in "[a-z =;\\n]{0,80}") {
            let raw = format!("```python\n{body}\n```");
            let cleaned = clean_generated_code(&raw, TargetLanguage::Python);
            prop_assert!(cleaned.lines().all(|line| !line.trim_start().starts_with("```")));
        }
    }
}
