//! Grouping documents by facet value.
//!
//! Values match exactly (case-sensitive, no normalization). Groups appear in
//! the order their value was first seen, and each group lists documents in
//! discovery order with no duplicates.

use crate::document::{Document, DocumentSet};
use crate::error::{CoreError, Result};
use crate::facet::FacetDescriptor;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Documents sharing one facet value.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetGroup {
    pub value: String,
    pub documents: Vec<Arc<Document>>,
}

/// All groups of one facet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetIndex {
    pub key: String,
    pub groups: Vec<FacetGroup>,
}

impl FacetIndex {
    pub fn get(&self, value: &str) -> Option<&FacetGroup> {
        self.groups.iter().find(|g| g.value == value)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Build the index of one facet over the whole set.
pub fn index_facet(desc: &FacetDescriptor, docs: &DocumentSet) -> Result<FacetIndex> {
    let mut slots: FxHashMap<String, usize> = FxHashMap::default();
    let mut groups: Vec<FacetGroup> = Vec::new();

    for doc in docs.iter() {
        let values = desc
            .extractor
            .extract(doc)
            .map_err(|e| CoreError::descriptor(&desc.key, e))?;

        for value in values {
            let slot = match slots.get(value.as_ref()) {
                Some(&slot) => slot,
                None => {
                    let slot = groups.len();
                    slots.insert(value.to_string(), slot);
                    groups.push(FacetGroup {
                        value: value.into_owned(),
                        documents: Vec::new(),
                    });
                    slot
                }
            };

            // A repeated value within one document lands on the same group
            // while that document is still its last entry.
            let documents = &mut groups[slot].documents;
            if !documents.last().is_some_and(|last| Arc::ptr_eq(last, doc)) {
                documents.push(Arc::clone(doc));
            }
        }
    }

    Ok(FacetIndex {
        key: desc.key.clone(),
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::*;
    use crate::error::DescriptorError;
    use crate::facet::{Extractor, FacetValues};
    use std::collections::BTreeSet;

    struct Exploding;

    impl Extractor for Exploding {
        fn extract<'d>(&self, doc: &'d Document) -> Result<FacetValues<'d>, DescriptorError> {
            Err(DescriptorError::Extract {
                document: doc.id.clone(),
                reason: "boom".into(),
            })
        }
    }

    #[test]
    fn test_category_scenario() {
        let docs = sample_set();
        let index = index_facet(&FacetDescriptor::category(), &docs).unwrap();
        assert_eq!(index.values().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(ids(&index.get("A").unwrap().documents), vec!["doc1", "doc2"]);
        assert_eq!(ids(&index.get("B").unwrap().documents), vec!["doc2", "doc3"]);
    }

    #[test]
    fn test_duplicate_value_in_one_document() {
        let docs = DocumentSet::new([Document::new("a", "A").with_tags(["x", "y", "x"])]).unwrap();
        let index = index_facet(&FacetDescriptor::tag(), &docs).unwrap();
        assert_eq!(index.get("x").unwrap().documents.len(), 1);
        assert_eq!(index.values().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_values_are_case_sensitive() {
        let docs = DocumentSet::new([
            Document::new("a", "A").with_tags(["Rust"]),
            Document::new("b", "B").with_tags(["rust"]),
        ])
        .unwrap();
        let index = index_facet(&FacetDescriptor::tag(), &docs).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(ids(&index.get("Rust").unwrap().documents), vec!["a"]);
        assert_eq!(ids(&index.get("rust").unwrap().documents), vec!["b"]);
    }

    #[test]
    fn test_document_without_values_is_absent() {
        let docs = DocumentSet::new([
            Document::new("bare", "Bare"),
            Document::new("tagged", "T").with_tags(["x"]),
        ])
        .unwrap();
        let index = index_facet(&FacetDescriptor::tag(), &docs).unwrap();
        assert!(index.groups.iter().all(|g| g.documents.iter().all(|d| d.id != "bare")));
    }

    #[test]
    fn test_empty_value_is_ordinary() {
        let docs = DocumentSet::new([Document::new("a", "A").with_tags([""])]).unwrap();
        let index = index_facet(&FacetDescriptor::tag(), &docs).unwrap();
        assert_eq!(ids(&index.get("").unwrap().documents), vec!["a"]);
    }

    #[test]
    fn test_membership_iff_value_extracted() {
        let docs = DocumentSet::new([
            Document::new("a", "A").with_tags(["x", "y"]),
            Document::new("b", "B").with_tags(["y", "z", "y"]),
            Document::new("c", "C"),
            Document::new("d", "D").with_tags(["z", "x"]),
        ])
        .unwrap();
        let index = index_facet(&FacetDescriptor::tag(), &docs).unwrap();

        let distinct: BTreeSet<&str> = docs.iter().flat_map(|d| d.tags.iter().map(String::as_str)).collect();
        assert_eq!(index.values().collect::<BTreeSet<_>>(), distinct);

        for doc in docs.iter() {
            for group in &index.groups {
                let listed = group.documents.iter().any(|d| Arc::ptr_eq(d, doc));
                let has_value = doc.tags.contains(&group.value);
                assert_eq!(listed, has_value, "{} / {}", doc.id, group.value);
            }
        }
    }

    #[test]
    fn test_extractor_error_fails_whole_facet() {
        let docs = sample_set();
        let desc = FacetDescriptor::new("bad", Exploding);
        let err = index_facet(&desc, &docs).unwrap_err();
        assert!(matches!(err, CoreError::Descriptor { ref key, .. } if key == "bad"));
    }
}
