//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "docs".into()
    }

    pub fn output() -> PathBuf {
        "public/_blogdex".into()
    }

    pub fn include() -> Vec<String> {
        Vec::new()
    }

    pub mod slug {
        use blogdex_core::SlugMode;

        pub fn value() -> SlugMode {
            SlugMode::Safe
        }
    }
}

// ============================================================================
// [[facet]] / [[type]] Defaults
// ============================================================================

pub mod taxonomy {
    use super::super::taxonomy::{FacetConfig, Policy, TypeConfig};

    /// `category` and `tag`, as the blog theme expects them.
    pub fn facets() -> Vec<FacetConfig> {
        vec![
            FacetConfig::preset("category", "Category", "Categories", "Category {name}"),
            FacetConfig::preset("tag", "Tag", "Tags", "Tag {name}"),
        ]
    }

    /// `article` and `timeline`.
    pub fn types() -> Vec<TypeConfig> {
        vec![
            TypeConfig::preset("article", Policy::Article, "Article", "Articles"),
            TypeConfig::preset("timeline", Policy::Timeline, "Timeline", "Timeline"),
        ]
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    pub fn debounce_ms() -> u64 {
        300
    }
}
