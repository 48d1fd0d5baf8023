//! Taxonomy pages and curated listings derived from a blog's documents.
//!
//! # Pipeline
//!
//! ```text
//! DocumentSet (frozen, Arc-shared)
//!     │
//!     ├── excerpt::resolve()          per document
//!     │
//!     ├── taxonomy::index_facet()     per FacetDescriptor ─┐
//!     │                                                    ├─► synth::Synthesizer
//!     └── classify::classify()        per TypeDescriptor ──┘         │
//!                                                                    ▼
//!                                                          Vec<DerivedPage>
//! ```
//!
//! [`BuildContext`] runs one pass; [`Supervisor`] makes sure that when
//! passes overlap, only the newest one is published.
//!
//! # Example
//!
//! ```
//! use blogdex_core::{BuildContext, Document, DocumentSet};
//!
//! let docs = DocumentSet::new([
//!     Document::new("a.md", "A").with_categories(["rust"]),
//!     Document::new("b.md", "B").with_categories(["rust", "web"]),
//! ])
//! .unwrap();
//!
//! let output = BuildContext::blog_defaults().run(&docs);
//! let rust = output.page("/category/rust/").unwrap();
//! assert_eq!(rust.len(), 2);
//! ```

pub mod classify;
pub mod context;
pub mod document;
pub mod error;
pub mod excerpt;
pub mod facet;
pub mod page;
pub mod slug;
pub mod supervisor;
pub mod synth;
pub mod taxonomy;

pub use classify::{Comparator, MembershipFilter, TypeDescriptor};
pub use context::{BuildContext, BuildOutput, Cancellation, DescriptorOutcome};
pub use document::{Document, DocumentSet, ExcerptOverride};
pub use error::{CoreError, DescriptorError};
pub use excerpt::{Excerpt, ResolvedExcerpt};
pub use facet::{Extractor, FacetDescriptor, FieldExtractor, FrontmatterFactory, Frontmatter};
pub use page::{DerivedPage, FacetEntry, PageKind};
pub use slug::SlugMode;
pub use supervisor::{Supervisor, Ticket};
pub use synth::Synthesizer;
pub use taxonomy::{FacetGroup, FacetIndex};
