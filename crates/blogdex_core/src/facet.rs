//! Facet descriptors and the strategies they hold.
//!
//! A facet is a grouping dimension such as `category` or `tag`. The
//! descriptor is plain data: a key, layout tags, and shared handles to an
//! [`Extractor`] and a [`FrontmatterFactory`].

use crate::document::Document;
use crate::error::DescriptorError;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::{borrow::Cow, fmt, sync::Arc};

/// Frontmatter handed to the renderer with a derived page.
pub type Frontmatter = Map<String, Value>;

/// Facet values extracted from one document, in document order.
pub type FacetValues<'d> = SmallVec<[Cow<'d, str>; 4]>;

// ============================================================================
// Strategies
// ============================================================================

/// Extract the ordered facet values of a document.
pub trait Extractor: Send + Sync {
    fn extract<'d>(&self, doc: &'d Document) -> Result<FacetValues<'d>, DescriptorError>;
}

/// Produce frontmatter for a listing page and, for facets, its per-value pages.
pub trait FrontmatterFactory: Send + Sync {
    /// Frontmatter of the listing root (`/category/`, `/article/`).
    fn listing(&self, key: &str) -> Result<Frontmatter, DescriptorError>;

    /// Frontmatter of a per-value page (`/category/rust/`).
    fn item(&self, key: &str, value: &str) -> Result<Frontmatter, DescriptorError> {
        let _ = (key, value);
        Ok(Frontmatter::new())
    }
}

// ============================================================================
// Built-in extractors
// ============================================================================

/// Where a [`FieldExtractor`] reads its values from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetSource {
    Categories,
    Tags,
    /// An untyped frontmatter field holding a string or a list of scalars.
    Field(String),
}

impl FacetSource {
    /// `categories` and `tags` name the typed lists; anything else is a raw field.
    pub fn parse(field: &str) -> Self {
        match field {
            "category" | "categories" => Self::Categories,
            "tag" | "tags" => Self::Tags,
            other => Self::Field(other.to_owned()),
        }
    }
}

/// Reads facet values from document metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldExtractor {
    pub source: FacetSource,
    /// Drop `""` values instead of indexing them.
    pub skip_empty: bool,
}

impl FieldExtractor {
    pub const fn new(source: FacetSource) -> Self {
        Self {
            source,
            skip_empty: false,
        }
    }

    pub const fn skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }
}

impl Extractor for FieldExtractor {
    fn extract<'d>(&self, doc: &'d Document) -> Result<FacetValues<'d>, DescriptorError> {
        let mut values: FacetValues<'d> = match &self.source {
            FacetSource::Categories => doc.categories.iter().map(|s| Cow::Borrowed(s.as_str())).collect(),
            FacetSource::Tags => doc.tags.iter().map(|s| Cow::Borrowed(s.as_str())).collect(),
            FacetSource::Field(name) => match doc.extra.get(name) {
                None | Some(Value::Null) => FacetValues::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| scalar(doc, name, item))
                    .collect::<Result<_, _>>()?,
                Some(value) => std::iter::once(scalar(doc, name, value)?).collect(),
            },
        };

        if self.skip_empty {
            values.retain(|v| !v.is_empty());
        }
        Ok(values)
    }
}

/// Render a scalar frontmatter value as a facet value.
fn scalar<'d>(doc: &Document, field: &str, value: &'d Value) -> Result<Cow<'d, str>, DescriptorError> {
    match value {
        Value::String(s) => Ok(Cow::Borrowed(s)),
        Value::Number(n) => Ok(Cow::Owned(n.to_string())),
        Value::Bool(b) => Ok(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(DescriptorError::Extract {
            document: doc.id.clone(),
            reason: format!("field `{field}` must hold strings, found {value}"),
        }),
    }
}

// ============================================================================
// Built-in frontmatter
// ============================================================================

/// Frontmatter with fixed titles; `{name}` in `item_title` is the facet value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleFrontmatter {
    pub title: String,
    pub item_title: Option<String>,
}

impl TitleFrontmatter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            item_title: None,
        }
    }

    pub fn with_item_title(mut self, template: impl Into<String>) -> Self {
        self.item_title = Some(template.into());
        self
    }
}

impl FrontmatterFactory for TitleFrontmatter {
    fn listing(&self, _key: &str) -> Result<Frontmatter, DescriptorError> {
        Ok(titled(self.title.clone()))
    }

    fn item(&self, _key: &str, value: &str) -> Result<Frontmatter, DescriptorError> {
        Ok(self
            .item_title
            .as_ref()
            .map(|template| titled(template.replace("{name}", value)))
            .unwrap_or_default())
    }
}

fn titled(title: String) -> Frontmatter {
    let mut fm = Frontmatter::new();
    fm.insert("title".into(), Value::String(title));
    fm.insert("sidebar".into(), Value::Bool(false));
    fm
}

/// Leaves every field to the synthesizer defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFrontmatter;

impl FrontmatterFactory for DefaultFrontmatter {
    fn listing(&self, _key: &str) -> Result<Frontmatter, DescriptorError> {
        Ok(Frontmatter::new())
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// A named grouping rule.
#[derive(Clone)]
pub struct FacetDescriptor {
    pub key: String,
    pub extractor: Arc<dyn Extractor>,
    /// Layout of the root page listing every value.
    pub layout: String,
    /// Layout of each per-value page.
    pub item_layout: String,
    pub frontmatter: Arc<dyn FrontmatterFactory>,
}

impl FacetDescriptor {
    pub fn new(key: impl Into<String>, extractor: impl Extractor + 'static) -> Self {
        let key = key.into();
        Self {
            layout: key.clone(),
            item_layout: key.clone(),
            key,
            extractor: Arc::new(extractor),
            frontmatter: Arc::new(DefaultFrontmatter),
        }
    }

    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    pub fn item_layout(mut self, layout: impl Into<String>) -> Self {
        self.item_layout = layout.into();
        self
    }

    pub fn frontmatter(mut self, factory: impl FrontmatterFactory + 'static) -> Self {
        self.frontmatter = Arc::new(factory);
        self
    }

    /// `/category/` and `/category/<name>/`.
    pub fn category() -> Self {
        Self::new("category", FieldExtractor::new(FacetSource::Categories))
            .layout("Category")
            .item_layout("Category")
            .frontmatter(TitleFrontmatter::new("Categories").with_item_title("Category {name}"))
    }

    /// `/tag/` and `/tag/<name>/`.
    pub fn tag() -> Self {
        Self::new("tag", FieldExtractor::new(FacetSource::Tags))
            .layout("Tag")
            .item_layout("Tag")
            .frontmatter(TitleFrontmatter::new("Tags").with_item_title("Tag {name}"))
    }
}

impl fmt::Debug for FacetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacetDescriptor")
            .field("key", &self.key)
            .field("layout", &self.layout)
            .field("item_layout", &self.item_layout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(extractor: &FieldExtractor, doc: &Document) -> Vec<String> {
        extractor
            .extract(doc)
            .unwrap()
            .into_iter()
            .map(Cow::into_owned)
            .collect()
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(FacetSource::parse("category"), FacetSource::Categories);
        assert_eq!(FacetSource::parse("tags"), FacetSource::Tags);
        assert_eq!(FacetSource::parse("series"), FacetSource::Field("series".into()));
    }

    #[test]
    fn test_extract_typed_lists_in_order() {
        let doc = Document::new("a", "A").with_categories(["B", "A"]).with_tags(["x"]);
        let cats = FieldExtractor::new(FacetSource::Categories);
        let tags = FieldExtractor::new(FacetSource::Tags);
        assert_eq!(values(&cats, &doc), vec!["B", "A"]);
        assert_eq!(values(&tags, &doc), vec!["x"]);
    }

    #[test]
    fn test_extract_raw_field() {
        let doc = Document::new("a", "A")
            .with_extra("series", json!(["Intro", 2024, true]))
            .with_extra("lang", json!("en"));
        let series = FieldExtractor::new(FacetSource::Field("series".into()));
        let lang = FieldExtractor::new(FacetSource::Field("lang".into()));
        let missing = FieldExtractor::new(FacetSource::Field("nope".into()));
        assert_eq!(values(&series, &doc), vec!["Intro", "2024", "true"]);
        assert_eq!(values(&lang, &doc), vec!["en"]);
        assert!(values(&missing, &doc).is_empty());
    }

    #[test]
    fn test_extract_rejects_nested_values() {
        let doc = Document::new("a", "A").with_extra("series", json!([["nested"]]));
        let series = FieldExtractor::new(FacetSource::Field("series".into()));
        let err = series.extract(&doc).unwrap_err();
        assert!(matches!(err, DescriptorError::Extract { ref document, .. } if document == "a"));
    }

    #[test]
    fn test_empty_values_kept_unless_skipped() {
        let doc = Document::new("a", "A").with_tags(["", "x"]);
        let keep = FieldExtractor::new(FacetSource::Tags);
        let skip = FieldExtractor::new(FacetSource::Tags).skip_empty(true);
        assert_eq!(values(&keep, &doc), vec!["", "x"]);
        assert_eq!(values(&skip, &doc), vec!["x"]);
    }

    #[test]
    fn test_title_frontmatter() {
        let fm = TitleFrontmatter::new("Tags").with_item_title("Tag {name}");
        assert_eq!(fm.listing("tag").unwrap()["title"], json!("Tags"));
        let item = fm.item("tag", "rust").unwrap();
        assert_eq!(item["title"], json!("Tag rust"));
        assert_eq!(item["sidebar"], json!(false));
    }

    #[test]
    fn test_title_frontmatter_without_item_title() {
        let fm = TitleFrontmatter::new("Articles");
        assert!(fm.item("article", "x").unwrap().is_empty());
    }

    #[test]
    fn test_builtin_descriptors() {
        let category = FacetDescriptor::category();
        assert_eq!(category.key, "category");
        assert_eq!(category.layout, "Category");
        let tag = FacetDescriptor::tag();
        assert_eq!(tag.item_layout, "Tag");
    }
}
