//! Derived pages handed to the rendering engine.
//!
//! A [`DerivedPage`] is created fresh every build pass and never mutated
//! afterwards. Its item list is shared, so iterating it any number of times
//! yields the same sequence.

use crate::document::Document;
use crate::facet::Frontmatter;
use serde::Serialize;
use std::{slice, sync::Arc};

/// One entry of a facet root page (`/category/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetEntry {
    pub name: String,
    pub path: String,
    pub count: usize,
}

/// What a derived page lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PageKind {
    /// Root of a facet, enumerating every distinct value.
    FacetIndex { facet: String, entries: Vec<FacetEntry> },
    /// Documents sharing one facet value.
    FacetValue { facet: String, value: String },
    /// A curated collection.
    Collection { collection: String },
}

/// A synthetic page.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedPage {
    pub(crate) path: String,
    pub(crate) layout: String,
    pub(crate) kind: PageKind,
    pub(crate) frontmatter: Frontmatter,
    pub(crate) sidebar_disabled: bool,
    pub(crate) items: Arc<[Arc<Document>]>,
}

impl DerivedPage {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    pub fn kind(&self) -> &PageKind {
        &self.kind
    }

    pub fn frontmatter(&self) -> &Frontmatter {
        &self.frontmatter
    }

    pub const fn sidebar_disabled(&self) -> bool {
        self.sidebar_disabled
    }

    /// Listed documents, in listing order. Restartable.
    pub fn items(&self) -> Items<'_> {
        Items {
            inner: self.items.iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serializable view of the page.
    pub fn record(&self) -> PageRecord<'_> {
        PageRecord {
            path: &self.path,
            layout: &self.layout,
            kind: &self.kind,
            frontmatter: &self.frontmatter,
            sidebar: !self.sidebar_disabled,
            items: self.items().map(ItemRecord::from).collect(),
        }
    }

    /// Canonical JSON bytes of [`record`](Self::record).
    pub fn to_json(&self) -> Vec<u8> {
        // Serializing plain maps, strings and numbers cannot fail
        serde_json::to_vec_pretty(&self.record()).unwrap_or_default()
    }

    /// Content hash of the canonical JSON.
    pub fn fingerprint(&self) -> blake3::Hash {
        blake3::hash(&self.to_json())
    }
}

/// Iterator over a page's documents.
#[derive(Debug, Clone)]
pub struct Items<'a> {
    inner: slice::Iter<'a, Arc<Document>>,
}

impl<'a> Iterator for Items<'a> {
    type Item = &'a Arc<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Items<'_> {}

// ============================================================================
// Records
// ============================================================================

/// JSON shape of a derived page.
#[derive(Debug, Serialize)]
pub struct PageRecord<'a> {
    pub path: &'a str,
    pub layout: &'a str,
    #[serde(flatten)]
    pub kind: &'a PageKind,
    pub frontmatter: &'a Frontmatter,
    pub sidebar: bool,
    pub items: Vec<ItemRecord<'a>>,
}

/// JSON shape of a listed document.
#[derive(Debug, Serialize)]
pub struct ItemRecord<'a> {
    pub id: &'a str,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty_list")]
    pub categories: &'a [String],
    #[serde(skip_serializing_if = "is_empty_list")]
    pub tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticky: Option<u32>,
}

fn is_empty_list(list: &&[String]) -> bool {
    list.is_empty()
}

impl<'a> From<&'a Arc<Document>> for ItemRecord<'a> {
    fn from(doc: &'a Arc<Document>) -> Self {
        Self {
            id: &doc.id,
            title: &doc.title,
            date: doc.date_string(),
            author: doc.author.as_deref(),
            categories: &doc.categories,
            tags: &doc.tags,
            sticky: doc.sticky,
        }
    }
}
