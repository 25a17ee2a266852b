//! Surface-form matching: escaped, case-insensitive, whole-word patterns.

use std::ops::Range;

use regex::{Regex, RegexBuilder};

use super::anchor::AnchorMap;

/// Compile the whole-word search pattern for one surface form.
///
/// Regex metacharacters are escaped first, so a form such as `"Hawksmoor (Seven Dials)"`
/// matches literally. Each end gets a `\b` assertion when the form begins or
/// ends with a word character; an edge such as `)` already delimits itself and
/// `\b` there would demand a word character next to it. A literal `&` also
/// accepts its entity spelling `&amp;`, as ampersands appear in HTML text.
/// Returns `None` for a blank form.
pub fn build_pattern(surface_form: &str) -> Option<Regex> {
    let trimmed = surface_form.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = if trimmed.chars().next().is_some_and(is_word_char) { r"\b" } else { "" };
    let tail = if trimmed.chars().next_back().is_some_and(is_word_char) { r"\b" } else { "" };
    let body = trimmed
        .split('&')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("(?:&|&amp;)");
    let source = format!("{lead}{body}{tail}");
    match RegexBuilder::new(&source).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(form = trimmed, "surface form failed to compile: {e}");
            None
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A precompiled pattern for one surface form.
#[derive(Debug, Clone)]
pub struct SurfacePattern {
    regex: Regex,
}

impl SurfacePattern {
    /// Compile a pattern, or `None` if the form is blank.
    pub fn new(surface_form: &str) -> Option<Self> {
        build_pattern(surface_form).map(|regex| Self { regex })
    }

    /// Whether the form occurs anywhere in `content`.
    pub fn has_match(&self, content: &str) -> bool {
        !content.is_empty() && self.regex.is_match(content)
    }

    /// The first occurrence that touches neither markup nor existing anchor text.
    pub fn first_unprotected(&self, content: &str, map: &AnchorMap) -> Option<Range<usize>> {
        if content.is_empty() {
            return None;
        }
        self.regex
            .find_iter(content)
            .map(|m| m.range())
            .find(|r| !map.is_protected(r))
    }

    /// Whether the form occurs in visible text (anchor text included, tag markup excluded).
    pub fn is_present(&self, content: &str, map: &AnchorMap) -> bool {
        if content.is_empty() {
            return false;
        }
        self.regex
            .find_iter(content)
            .any(|m| !map.overlaps_markup(&m.range()))
    }
}
