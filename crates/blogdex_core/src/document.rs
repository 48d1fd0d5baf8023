//! Normalized in-memory documents.
//!
//! A [`Document`] is built once by the document source and then frozen behind
//! an `Arc`. Every derived structure (facet groups, listings, pages) holds
//! clones of that `Arc`, so there is exactly one copy of each document per
//! build pass and nothing downstream can mutate it.
//!
//! | Field        | Frontmatter         | Default        |
//! |--------------|---------------------|----------------|
//! | `id`         | relative file path  | required       |
//! | `title`      | `title`             | required       |
//! | `date`       | `date`              | absent         |
//! | `categories` | `category`          | empty          |
//! | `tags`       | `tag`               | empty          |
//! | `sticky`     | `sticky`            | absent         |
//! | `archived`   | `archive`           | `false`        |
//! | `home`       | `home`              | `false`        |
//! | `excerpt`    | `excerpt`           | absent (auto)  |

use crate::error::{CoreError, Result};
use chrono::NaiveDateTime;
use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Explicit excerpt setting from frontmatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcerptOverride {
    /// `excerpt: "..."`
    Text(String),
    /// `excerpt: false`
    Disabled,
}

/// One content item and its typed metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Stable identifier, the source path relative to the content root.
    pub id: String,
    pub title: String,
    pub date: Option<NaiveDateTime>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Pin priority; `None` means not pinned.
    pub sticky: Option<u32>,
    pub archived: bool,
    pub home: bool,
    pub excerpt: Option<ExcerptOverride>,
    pub author: Option<String>,
    /// Frontmatter fields without a typed counterpart.
    pub extra: Map<String, Value>,
    /// Raw body, opaque to the indexer.
    pub body: Arc<str>,
}

impl Document {
    /// Create a document with every optional field at its default.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date: None,
            categories: Vec::new(),
            tags: Vec::new(),
            sticky: None,
            archived: false,
            home: false,
            excerpt: None,
            author: None,
            extra: Map::new(),
            body: Arc::from(""),
        }
    }

    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sticky(mut self, rank: u32) -> Self {
        self.sticky = Some(rank);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    pub fn home(mut self, home: bool) -> Self {
        self.home = home;
        self
    }

    pub fn with_excerpt(mut self, excerpt: ExcerptOverride) -> Self {
        self.excerpt = Some(excerpt);
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Arc<str>>) -> Self {
        self.body = body.into();
        self
    }

    /// `date` formatted as `YYYY-MM-DD`, or with the time when it is not midnight.
    pub fn date_string(&self) -> Option<String> {
        self.date.map(|date| {
            if date.time() == chrono::NaiveTime::MIN {
                date.format("%Y-%m-%d").to_string()
            } else {
                date.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
        })
    }
}

/// The immutable document set of one build pass, in discovery order.
///
/// Cloning is cheap: the set and its documents are reference counted.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    docs: Arc<[Arc<Document>]>,
}

impl DocumentSet {
    /// Freeze documents into a set, rejecting duplicate ids.
    pub fn new(docs: impl IntoIterator<Item = Document>) -> Result<Self> {
        let docs: Vec<Arc<Document>> = docs.into_iter().map(Arc::new).collect();

        let mut seen = FxHashSet::default();
        for doc in &docs {
            if !seen.insert(doc.id.as_str()) {
                return Err(CoreError::DuplicateDocument(doc.id.clone()));
            }
        }

        Ok(Self { docs: docs.into() })
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Arc<Document>> + Clone {
        self.docs.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Document>> {
        self.docs.iter().find(|doc| doc.id == id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    /// The three-document blog used across the test suites.
    pub fn sample_set() -> DocumentSet {
        DocumentSet::new([
            Document::new("doc1", "Doc1")
                .with_date(ymd(2024, 1, 1))
                .with_sticky(5)
                .with_categories(["A"]),
            Document::new("doc2", "Doc2")
                .with_date(ymd(2024, 6, 1))
                .with_categories(["A", "B"]),
            Document::new("doc3", "Doc3")
                .with_date(ymd(2023, 1, 1))
                .with_categories(["B"])
                .archived(true),
        ])
        .unwrap()
    }

    pub fn ids<'a>(docs: impl IntoIterator<Item = &'a Arc<Document>>) -> Vec<&'a str> {
        docs.into_iter().map(|d| d.id.as_str()).collect()
    }
}
