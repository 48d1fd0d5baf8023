//! Error types for the indexing pipeline.
//!
//! Missing or malformed metadata is never an error here: the document source
//! normalizes it to "absent" before the core sees it. What remains are
//! configuration mistakes (duplicate keys, descriptors whose strategies fail)
//! and cancellation of a superseded build pass.

use thiserror::Error;

/// Failure raised by a descriptor strategy (extractor, filter, frontmatter factory).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("cannot extract facet values from `{document}`: {reason}")]
    Extract { document: String, reason: String },

    #[error("membership test failed for `{document}`: {reason}")]
    Filter { document: String, reason: String },

    #[error("frontmatter factory failed: {0}")]
    Frontmatter(String),
}

/// Errors surfaced by the core pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A facet or type descriptor failed; none of its pages were produced.
    #[error("descriptor `{key}` failed")]
    Descriptor {
        key: String,
        #[source]
        source: DescriptorError,
    },

    /// Two descriptors share a key, so their pages would share paths.
    #[error("descriptor key `{0}` is declared more than once")]
    DuplicateKey(String),

    /// Descriptor keys become path segments and must be usable as one.
    #[error("descriptor key `{0:?}` is not a valid path segment")]
    InvalidKey(String),

    /// Two documents in one set carry the same id.
    #[error("document id `{0}` appears more than once")]
    DuplicateDocument(String),

    /// A newer build pass started; this pass's output must be discarded.
    #[error("build pass superseded by a newer one")]
    Cancelled,
}

impl CoreError {
    pub(crate) fn descriptor(key: &str, source: DescriptorError) -> Self {
        Self::Descriptor {
            key: key.to_owned(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
