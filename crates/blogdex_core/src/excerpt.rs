//! Excerpt resolution.
//!
//! Precedence, first match wins:
//!
//! 1. `home: true` → no excerpt
//! 2. `excerpt: false` → no excerpt
//! 3. `excerpt: "text"` (non-empty) → that text, verbatim
//! 4. otherwise → auto-derived by the renderer

use crate::document::{Document, ExcerptOverride};
use serde::Serialize;
use std::sync::Arc;

/// Marker separating the auto-excerpt from the rest of a markdown body.
pub const MORE_MARKER: &str = "<!-- more -->";

/// Resolved excerpt decision for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Excerpt {
    None,
    Verbatim(String),
    Auto,
}

impl Excerpt {
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Apply the resolution chain to a document. Cannot fail.
pub fn resolve(doc: &Document) -> Excerpt {
    if doc.home {
        return Excerpt::None;
    }

    match &doc.excerpt {
        Some(ExcerptOverride::Disabled) => Excerpt::None,
        Some(ExcerptOverride::Text(text)) if !text.is_empty() => Excerpt::Verbatim(text.clone()),
        _ => Excerpt::Auto,
    }
}

/// A document paired with its excerpt decision, as handed to the search indexer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedExcerpt {
    pub document: Arc<Document>,
    pub excerpt: Excerpt,
}

/// Body text before the [`MORE_MARKER`], if the body has one.
///
/// This is the candidate an auto excerpt is rendered from.
pub fn split_more(body: &str) -> Option<&str> {
    body.find(MORE_MARKER).map(|at| body[..at].trim_end())
}
