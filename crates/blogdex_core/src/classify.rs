//! Curated collections: filter, then stable sort.
//!
//! # Built-in policies
//!
//! | Type       | Membership            | Order                                   |
//! |------------|-----------------------|-----------------------------------------|
//! | `article`  | not archived          | sticky rank desc, then date desc        |
//! | `timeline` | has a parsed date     | date desc                               |
//!
//! Both sorts are stable: documents that compare equal keep discovery order.

use crate::document::{Document, DocumentSet};
use crate::error::{CoreError, DescriptorError, Result};
use crate::facet::{DefaultFrontmatter, FrontmatterFactory, TitleFrontmatter};
use std::{cmp::Ordering, fmt, sync::Arc};

// ============================================================================
// Strategies
// ============================================================================

/// Membership predicate of a collection.
pub trait MembershipFilter: Send + Sync {
    fn admits(&self, doc: &Document) -> Result<bool, DescriptorError>;
}

/// Total order of a collection.
pub trait Comparator: Send + Sync {
    fn compare(&self, a: &Document, b: &Document) -> Ordering;
}

/// Admits every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Everything;

impl MembershipFilter for Everything {
    fn admits(&self, _doc: &Document) -> Result<bool, DescriptorError> {
        Ok(true)
    }
}

/// Rejects documents flagged `archive: true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotArchived;

impl MembershipFilter for NotArchived {
    fn admits(&self, doc: &Document) -> Result<bool, DescriptorError> {
        Ok(!doc.archived)
    }
}

/// Admits only documents whose date parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasDate;

impl MembershipFilter for HasDate {
    fn admits(&self, doc: &Document) -> Result<bool, DescriptorError> {
        Ok(doc.date.is_some())
    }
}

/// Article order: pinned first by descending rank, then by descending date.
///
/// Among equally pinned documents, one without a date sorts *ahead* of a
/// dated one.
#[derive(Debug, Clone, Copy, Default)]
pub struct StickyThenRecent;

impl Comparator for StickyThenRecent {
    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match (a.sticky, b.sticky) {
            (Some(x), Some(y)) if x != y => return y.cmp(&x),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            _ => {}
        }

        match (a.date, b.date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Strictly descending by date. Undated documents, if a filter lets any
/// through, go last.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewestFirst;

impl Comparator for NewestFirst {
    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match (a.date, b.date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Keeps discovery order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOrder;

impl Comparator for DiscoveryOrder {
    fn compare(&self, _a: &Document, _b: &Document) -> Ordering {
        Ordering::Equal
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// A named curated collection.
#[derive(Clone)]
pub struct TypeDescriptor {
    pub key: String,
    pub filter: Arc<dyn MembershipFilter>,
    pub comparator: Arc<dyn Comparator>,
    pub layout: String,
    pub frontmatter: Arc<dyn FrontmatterFactory>,
}

impl TypeDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            layout: key.clone(),
            key,
            filter: Arc::new(Everything),
            comparator: Arc::new(DiscoveryOrder),
            frontmatter: Arc::new(DefaultFrontmatter),
        }
    }

    pub fn filter(mut self, filter: impl MembershipFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn comparator(mut self, comparator: impl Comparator + 'static) -> Self {
        self.comparator = Arc::new(comparator);
        self
    }

    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    pub fn frontmatter(mut self, factory: impl FrontmatterFactory + 'static) -> Self {
        self.frontmatter = Arc::new(factory);
        self
    }

    /// Non-archived documents, pinned first, newest first.
    pub fn article() -> Self {
        Self::new("article")
            .filter(NotArchived)
            .comparator(StickyThenRecent)
            .layout("Article")
            .frontmatter(TitleFrontmatter::new("Articles"))
    }

    /// Dated documents, newest first.
    pub fn timeline() -> Self {
        Self::new("timeline")
            .filter(HasDate)
            .comparator(NewestFirst)
            .layout("Timeline")
            .frontmatter(TitleFrontmatter::new("Timeline"))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Filter the set through the descriptor's predicate and stable-sort the rest.
pub fn classify(desc: &TypeDescriptor, docs: &DocumentSet) -> Result<Vec<Arc<Document>>> {
    let mut members = Vec::new();
    for doc in docs.iter() {
        let admitted = desc
            .filter
            .admits(doc)
            .map_err(|e| CoreError::descriptor(&desc.key, e))?;
        if admitted {
            members.push(Arc::clone(doc));
        }
    }

    // `sort_by` is stable
    members.sort_by(|a, b| desc.comparator.compare(a, b));
    Ok(members)
}
