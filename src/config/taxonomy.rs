//! `[[facet]]` and `[[type]]` declarations.
//!
//! Each entry becomes a descriptor of the core pipeline. Declaring any
//! `[[facet]]` replaces the default `category`/`tag` pair; declaring any
//! `[[type]]` replaces the default `article`/`timeline` pair.
//!
//! ```toml
//! [[facet]]
//! key = "series"            # path: /series/ and /series/<value>/
//! field = "series"          # frontmatter field (default: key)
//! layout = "Series"
//! title = "All series"
//! item_title = "Series: {name}"
//!
//! [[type]]
//! key = "article"
//! policy = "article"        # article | timeline
//! ```

use blogdex_core::classify::{HasDate, NewestFirst, NotArchived, StickyThenRecent};
use blogdex_core::facet::{FacetSource, TitleFrontmatter};
use blogdex_core::{FacetDescriptor, FieldExtractor, TypeDescriptor};
use serde::{Deserialize, Serialize};

// ============================================================================
// [[facet]]
// ============================================================================

/// One grouping dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacetConfig {
    /// Path segment and page-kind name.
    pub key: String,

    /// Frontmatter field the values come from. `category(ies)` and `tag(s)`
    /// read the normalized lists; other names read the raw field.
    #[serde(default)]
    pub field: Option<String>,

    /// Layout of the root page (default: key).
    #[serde(default)]
    pub layout: Option<String>,

    /// Layout of each per-value page (default: `layout`).
    #[serde(default)]
    pub item_layout: Option<String>,

    /// Title of the root page (default: key).
    #[serde(default)]
    pub title: Option<String>,

    /// Title template of per-value pages, `{name}` is the value
    /// (default: `"<key> <value>"`).
    #[serde(default)]
    pub item_title: Option<String>,
}

impl FacetConfig {
    pub(super) fn preset(key: &str, layout: &str, title: &str, item_title: &str) -> Self {
        Self {
            key: key.into(),
            field: None,
            layout: Some(layout.into()),
            item_layout: None,
            title: Some(title.into()),
            item_title: Some(item_title.into()),
        }
    }

    pub fn descriptor(&self, skip_empty: bool) -> FacetDescriptor {
        let field = self.field.as_deref().unwrap_or(&self.key);
        let extractor = FieldExtractor::new(FacetSource::parse(field)).skip_empty(skip_empty);
        let layout = self.layout.as_deref().unwrap_or(&self.key);
        let item_layout = self.item_layout.as_deref().unwrap_or(layout);

        let mut desc = FacetDescriptor::new(&self.key, extractor)
            .layout(layout)
            .item_layout(item_layout);

        if self.title.is_some() || self.item_title.is_some() {
            let title = self.title.as_deref().unwrap_or(&self.key);
            let mut frontmatter = TitleFrontmatter::new(title);
            frontmatter.item_title = self.item_title.clone();
            desc = desc.frontmatter(frontmatter);
        }
        desc
    }
}

// ============================================================================
// [[type]]
// ============================================================================

/// Built-in membership and ordering rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Not archived; pinned first, then newest.
    Article,
    /// Dated only; newest first.
    Timeline,
}

/// One curated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeConfig {
    pub key: String,

    pub policy: Policy,

    /// Layout of the listing page (default: key).
    #[serde(default)]
    pub layout: Option<String>,

    /// Title of the listing page (default: key).
    #[serde(default)]
    pub title: Option<String>,
}

impl TypeConfig {
    pub(super) fn preset(key: &str, policy: Policy, layout: &str, title: &str) -> Self {
        Self {
            key: key.into(),
            policy,
            layout: Some(layout.into()),
            title: Some(title.into()),
        }
    }

    pub fn descriptor(&self) -> TypeDescriptor {
        let desc = TypeDescriptor::new(&self.key).layout(self.layout.as_deref().unwrap_or(&self.key));
        let desc = match self.policy {
            Policy::Article => desc.filter(NotArchived).comparator(StickyThenRecent),
            Policy::Timeline => desc.filter(HasDate).comparator(NewestFirst),
        };
        match &self.title {
            Some(title) => desc.frontmatter(TitleFrontmatter::new(title)),
            None => desc,
        }
    }
}
