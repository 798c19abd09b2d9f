//! Markup sanitizer for `denyXSS` fields
//!
//! Detects and removes, case-insensitively:
//! - `<script>` and `<style>` elements including their bodies
//! - HTML comments
//! - any remaining closed tag
//! - `javascript:` URI schemes
//!
//! Whether a detection rejects the value or only strips it is decided by the
//! walker from [`XssPolicy`](super::XssPolicy).

use std::sync::OnceLock;

use regex::Regex;

/// Result of sanitizing one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    /// Text with all disallowed content removed
    pub value: String,
    /// Whether any disallowed content was found
    pub flagged: bool,
}

struct Patterns {
    elements: Regex,
    comments: Regex,
    tags: Regex,
    js_scheme: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("Invalid sanitizer pattern {}: {}", pattern, e))
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        // Unterminated script and style elements swallow the rest of the input.
        elements: compile(r"(?is)<(script|style)\b[^>]*>.*?(</(script|style)\s*>|$)"),
        comments: compile(r"(?s)<!--.*?(-->|$)"),
        // Only closed tags; a bare `<` in prose is left alone.
        tags: compile(r"</?[a-zA-Z!?][^<>]*>"),
        js_scheme: compile(r"(?i)javascript\s*:"),
    })
}

/// Stateless markup sanitizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer;

impl Sanitizer {
    pub fn new() -> Self {
        Sanitizer
    }

    /// Strips disallowed content from `input`.
    pub fn sanitize(&self, input: &str) -> Sanitized {
        let p = patterns();
        let cleaned = p.elements.replace_all(input, "");
        let cleaned = p.comments.replace_all(&cleaned, "");
        let cleaned = p.tags.replace_all(&cleaned, "");
        let cleaned = p.js_scheme.replace_all(&cleaned, "").into_owned();

        Sanitized {
            flagged: cleaned != input,
            value: cleaned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        let s = Sanitizer::new().sanitize("jay & tim say 1 < 2");
        assert_eq!(s.value, "jay & tim say 1 < 2");
        assert!(!s.flagged);
    }

    #[test]
    fn test_script_body_removed() {
        let s = Sanitizer::new().sanitize("<script>jay</script>");
        assert_eq!(s.value, "");
        assert!(s.flagged);

        let s = Sanitizer::new().sanitize("hi <SCRIPT type=\"x\">alert(1)</Script >there");
        assert_eq!(s.value, "hi there");
    }

    #[test]
    fn test_unterminated_script_removed() {
        let s = Sanitizer::new().sanitize("ok<script>alert(1)");
        assert_eq!(s.value, "ok");
        assert!(s.flagged);
    }

    #[test]
    fn test_tags_stripped_text_kept() {
        let s = Sanitizer::new().sanitize("<b>bold</b> <img src=x onerror=alert(1)>");
        assert_eq!(s.value, "bold ");
        assert!(s.flagged);
    }

    #[test]
    fn test_comments_and_js_scheme() {
        let s = Sanitizer::new().sanitize("a<!-- hidden -->b");
        assert_eq!(s.value, "ab");

        let s = Sanitizer::new().sanitize("JavaScript:alert(1)");
        assert_eq!(s.value, "alert(1)");
        assert!(s.flagged);
    }

    #[test]
    fn test_bare_angle_bracket_kept() {
        let sanitizer = Sanitizer::new();
        for text in ["if a<b then swap", "x <y then z", "a<b and c"] {
            let s = sanitizer.sanitize(text);
            assert_eq!(s.value, text);
            assert!(!s.flagged, "{:?} was flagged", text);
        }

        let s = sanitizer.sanitize("a<b and <i>c</i>");
        assert_eq!(s.value, "a<b and c");
        assert!(s.flagged);
    }
}
