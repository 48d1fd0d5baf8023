//! Turning facet indexes and collections into derived pages.
//!
//! | Page           | Path                | Default title     |
//! |----------------|---------------------|-------------------|
//! | facet root     | `/{key}/`           | `{key}`           |
//! | facet value    | `/{key}/{slug}/`    | `{key} {value}`   |
//! | collection     | `/{key}/`           | `{key}`           |
//!
//! Factory frontmatter is merged over the defaults (`sidebar: false` and the
//! title above), field by field.

use crate::classify::TypeDescriptor;
use crate::document::Document;
use crate::error::{CoreError, Result};
use crate::facet::{FacetDescriptor, Frontmatter};
use crate::page::{DerivedPage, FacetEntry, PageKind};
use crate::slug::{SegmentAllocator, SlugMode};
use crate::taxonomy::FacetIndex;
use serde_json::Value;
use std::sync::Arc;

/// Builds derived pages; stateless apart from the slug mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Synthesizer {
    slug: SlugMode,
}

impl Synthesizer {
    pub const fn new(slug: SlugMode) -> Self {
        Self { slug }
    }

    /// Root page plus one page per distinct value, root first.
    pub fn facet_pages(&self, desc: &FacetDescriptor, index: &FacetIndex) -> Result<Vec<DerivedPage>> {
        let key = desc.key.as_str();
        let root_path = listing_path(key);
        let mut segments = SegmentAllocator::default();

        let mut entries = Vec::with_capacity(index.len());
        let mut value_pages = Vec::with_capacity(index.len());

        for group in &index.groups {
            let path = format!("{root_path}{}/", segments.claim(&group.value, self.slug));
            let overrides = desc
                .frontmatter
                .item(key, &group.value)
                .map_err(|e| CoreError::descriptor(key, e))?;
            let frontmatter = merge(defaults(format!("{key} {}", group.value)), overrides);

            entries.push(FacetEntry {
                name: group.value.clone(),
                path: path.clone(),
                count: group.documents.len(),
            });
            value_pages.push(page(
                path,
                desc.item_layout.clone(),
                PageKind::FacetValue {
                    facet: key.to_owned(),
                    value: group.value.clone(),
                },
                frontmatter,
                group.documents.iter().cloned().collect(),
            ));
        }

        let overrides = desc
            .frontmatter
            .listing(key)
            .map_err(|e| CoreError::descriptor(key, e))?;
        let root = page(
            root_path,
            desc.layout.clone(),
            PageKind::FacetIndex {
                facet: key.to_owned(),
                entries,
            },
            merge(defaults(key.to_owned()), overrides),
            Vec::new().into(),
        );

        let mut pages = Vec::with_capacity(value_pages.len() + 1);
        pages.push(root);
        pages.extend(value_pages);
        Ok(pages)
    }

    /// The single page of a curated collection.
    pub fn collection_page(&self, desc: &TypeDescriptor, members: Vec<Arc<Document>>) -> Result<DerivedPage> {
        let key = desc.key.as_str();
        let overrides = desc
            .frontmatter
            .listing(key)
            .map_err(|e| CoreError::descriptor(key, e))?;

        Ok(page(
            listing_path(key),
            desc.layout.clone(),
            PageKind::Collection {
                collection: key.to_owned(),
            },
            merge(defaults(key.to_owned()), overrides),
            members.into(),
        ))
    }
}

fn listing_path(key: &str) -> String {
    format!("/{key}/")
}

fn defaults(title: String) -> Frontmatter {
    let mut fm = Frontmatter::new();
    fm.insert("title".into(), Value::String(title));
    fm.insert("sidebar".into(), Value::Bool(false));
    fm
}

fn merge(mut base: Frontmatter, overrides: Frontmatter) -> Frontmatter {
    base.extend(overrides);
    base
}

fn page(
    path: String,
    layout: String,
    kind: PageKind,
    frontmatter: Frontmatter,
    items: Arc<[Arc<Document>]>,
) -> DerivedPage {
    let sidebar_disabled = matches!(frontmatter.get("sidebar"), Some(Value::Bool(false)));
    DerivedPage {
        path,
        layout,
        kind,
        frontmatter,
        sidebar_disabled,
        items,
    }
}
