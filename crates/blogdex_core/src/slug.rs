//! Facet values as URL path segments.

use deunicode::deunicode;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Characters forbidden in path segments.
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '/', '(', ')', '[', ']', '\t', '\r', '\n',
];

/// Stand-in segment for values that slugify to nothing.
const EMPTY_SEGMENT: &str = "_";

/// How facet values are turned into path segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugMode {
    /// Transliterate to a lowercase ASCII slug (e.g., "你好 World" → "ni-hao-world").
    On,
    /// Strip forbidden characters and replace whitespace; keep everything else (default).
    #[default]
    Safe,
    /// Use the value unchanged, apart from path separators.
    No,
}

/// Convert one facet value to a path segment.
pub fn slugify(text: &str, mode: SlugMode) -> String {
    let slug = match mode {
        SlugMode::Safe => sanitize_text(text),
        SlugMode::On => ascii_slug(text),
        SlugMode::No => text.chars().filter(|c| !matches!(c, '/' | '\\')).collect(),
    };

    // A slug is exactly one path segment, never `.` or `..`
    if slug.is_empty() || slug.chars().all(|c| c == '.') {
        EMPTY_SEGMENT.to_owned()
    } else {
        slug
    }
}

/// Remove forbidden characters and replace whitespace with underscores
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn ascii_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in deunicode(text).chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Hands out unique segments within one facet.
///
/// Distinct values whose slugs collide get `-2`, `-3`, … in the order they
/// are claimed, which is discovery order.
#[derive(Debug, Default)]
pub(crate) struct SegmentAllocator {
    taken: FxHashSet<String>,
}

impl SegmentAllocator {
    pub fn claim(&mut self, value: &str, mode: SlugMode) -> String {
        let base = slugify(value, mode);
        if self.taken.insert(base.clone()) {
            return base;
        }

        let mut n = 2usize;
        loop {
            let candidate = format!("{base}-{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_mode_removes_forbidden_chars() {
        assert_eq!(slugify("a<b>c:d|e?f*g#h\\i(j)k[l]m", SlugMode::Safe), "abcdefghijklm");
        assert_eq!(slugify("C/C++", SlugMode::Safe), "CC++");
    }

    #[test]
    fn test_safe_mode_replaces_whitespace() {
        assert_eq!(slugify("  Hello World  ", SlugMode::Safe), "Hello_World");
    }

    #[test]
    fn test_safe_mode_preserves_unicode_and_case() {
        assert_eq!(slugify("前端", SlugMode::Safe), "前端");
        assert_eq!(slugify("Rust", SlugMode::Safe), "Rust");
    }

    #[test]
    fn test_on_mode() {
        assert_eq!(slugify("Hello, World!", SlugMode::On), "hello-world");
        assert_eq!(slugify("Crème Brûlée", SlugMode::On), "creme-brulee");
        assert_eq!(slugify("--x--", SlugMode::On), "x");
    }

    #[test]
    fn test_no_mode() {
        assert_eq!(slugify("As Is", SlugMode::No), "As Is");
    }

    #[test]
    fn test_no_mode_stays_one_segment() {
        assert_eq!(slugify("../../../escape", SlugMode::No), "......escape");
        assert_eq!(slugify("../article", SlugMode::No), "..article");
        assert_eq!(slugify("a\\b/c", SlugMode::No), "abc");
        assert_eq!(slugify("/", SlugMode::No), "_");
        assert_eq!(slugify("./..", SlugMode::No), "_");
    }

    #[test]
    fn test_empty_and_dot_values_get_placeholder() {
        assert_eq!(slugify("", SlugMode::Safe), "_");
        assert_eq!(slugify("<>", SlugMode::Safe), "_");
        assert_eq!(slugify("..", SlugMode::No), "_");
    }

    #[test]
    fn test_allocator_suffixes_collisions() {
        let mut alloc = SegmentAllocator::default();
        assert_eq!(alloc.claim("Hello World", SlugMode::On), "hello-world");
        assert_eq!(alloc.claim("hello world", SlugMode::On), "hello-world-2");
        assert_eq!(alloc.claim("HELLO WORLD", SlugMode::On), "hello-world-3");
        assert_eq!(alloc.claim("other", SlugMode::On), "other");
    }

    #[test]
    fn test_allocator_skips_suffix_taken_by_real_value() {
        let mut alloc = SegmentAllocator::default();
        assert_eq!(alloc.claim("a-2", SlugMode::Safe), "a-2");
        assert_eq!(alloc.claim("a", SlugMode::Safe), "a");
        assert_eq!(alloc.claim("a ", SlugMode::Safe), "a-3");
    }
}
