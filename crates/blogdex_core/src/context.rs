//! One build pass over a document set.
//!
//! # Stages
//!
//! ```text
//! BuildContext::run()
//!     │
//!     ├── excerpts     resolve every document
//!     │
//!     ├── fan-out      one task per descriptor (rayon::join / par_iter)
//!     │     ├── index_facet()   per facet
//!     │     └── classify()      per type
//!     │
//!     └── synthesize   derived pages per descriptor
//! ```
//!
//! Each stage boundary checks the [`Cancellation`] handle. A failing
//! descriptor does not stop the others; its outcome carries the error and
//! none of its pages.

use crate::classify::{TypeDescriptor, classify};
use crate::document::{Document, DocumentSet};
use crate::error::{CoreError, Result};
use crate::excerpt::{ResolvedExcerpt, resolve};
use crate::facet::FacetDescriptor;
use crate::page::DerivedPage;
use crate::slug::SlugMode;
use crate::synth::Synthesizer;
use crate::taxonomy::{FacetIndex, index_facet};
use rustc_hash::FxHashSet;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Lets a caller abandon a pass between stages.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

/// Never cancels.
impl Cancellation for () {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Descriptors and options of one build invocation.
#[derive(Debug, Clone)]
pub struct BuildContext {
    facets: Vec<FacetDescriptor>,
    types: Vec<TypeDescriptor>,
    synthesizer: Synthesizer,
}

impl BuildContext {
    /// Validate descriptor keys and assemble a context.
    pub fn new(facets: Vec<FacetDescriptor>, types: Vec<TypeDescriptor>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        let keys = facets.iter().map(|f| &f.key).chain(types.iter().map(|t| &t.key));
        for key in keys {
            if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
                return Err(CoreError::InvalidKey(key.clone()));
            }
            if !seen.insert(key.as_str()) {
                return Err(CoreError::DuplicateKey(key.clone()));
            }
        }

        Ok(Self {
            facets,
            types,
            synthesizer: Synthesizer::default(),
        })
    }

    /// `category` and `tag` facets, `article` and `timeline` types.
    pub fn blog_defaults() -> Self {
        Self {
            facets: vec![FacetDescriptor::category(), FacetDescriptor::tag()],
            types: vec![TypeDescriptor::article(), TypeDescriptor::timeline()],
            synthesizer: Synthesizer::default(),
        }
    }

    pub fn with_slug_mode(mut self, mode: SlugMode) -> Self {
        self.synthesizer = Synthesizer::new(mode);
        self
    }

    pub fn facets(&self) -> &[FacetDescriptor] {
        &self.facets
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    /// Run a pass that cannot be cancelled.
    pub fn run(&self, docs: &DocumentSet) -> BuildOutput {
        match self.run_with(docs, &()) {
            Ok(output) => output,
            Err(_) => unreachable!("only cancellation aborts a pass"),
        }
    }

    /// Run a pass, returning [`CoreError::Cancelled`] once `cancel` fires.
    pub fn run_with(&self, docs: &DocumentSet, cancel: &(impl Cancellation + ?Sized)) -> Result<BuildOutput> {
        let excerpts: Vec<ResolvedExcerpt> = docs
            .iter()
            .map(|doc| ResolvedExcerpt {
                document: Arc::clone(doc),
                excerpt: resolve(doc),
            })
            .collect();
        check(cancel)?;

        let (indexes, listings) = self.fan_out(docs);
        check(cancel)?;

        let facets = self
            .facets
            .iter()
            .zip(indexes)
            .map(|(desc, index)| DescriptorOutcome {
                key: desc.key.clone(),
                result: index.and_then(|index| self.synthesizer.facet_pages(desc, &index)),
            })
            .collect();

        let types = self
            .types
            .iter()
            .zip(listings)
            .map(|(desc, members)| DescriptorOutcome {
                key: desc.key.clone(),
                result: members
                    .and_then(|members| self.synthesizer.collection_page(desc, members))
                    .map(|page| vec![page]),
            })
            .collect();
        check(cancel)?;

        Ok(BuildOutput {
            excerpts,
            facets,
            types,
        })
    }

    #[cfg(feature = "parallel")]
    fn fan_out(&self, docs: &DocumentSet) -> (Vec<Result<FacetIndex>>, Vec<Result<Vec<Arc<Document>>>>) {
        rayon::join(
            || self.facets.par_iter().map(|desc| index_facet(desc, docs)).collect(),
            || self.types.par_iter().map(|desc| classify(desc, docs)).collect(),
        )
    }

    #[cfg(not(feature = "parallel"))]
    fn fan_out(&self, docs: &DocumentSet) -> (Vec<Result<FacetIndex>>, Vec<Result<Vec<Arc<Document>>>>) {
        (
            self.facets.iter().map(|desc| index_facet(desc, docs)).collect(),
            self.types.iter().map(|desc| classify(desc, docs)).collect(),
        )
    }
}

fn check(cancel: &(impl Cancellation + ?Sized)) -> Result<()> {
    if cancel.is_cancelled() {
        Err(CoreError::Cancelled)
    } else {
        Ok(())
    }
}

// ============================================================================
// Output
// ============================================================================

/// Pages of one descriptor, or why there are none.
#[derive(Debug, Clone)]
pub struct DescriptorOutcome {
    pub key: String,
    pub result: Result<Vec<DerivedPage>>,
}

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub excerpts: Vec<ResolvedExcerpt>,
    pub facets: Vec<DescriptorOutcome>,
    pub types: Vec<DescriptorOutcome>,
}

impl BuildOutput {
    fn outcomes(&self) -> impl Iterator<Item = &DescriptorOutcome> {
        self.facets.iter().chain(&self.types)
    }

    /// Pages of every successful descriptor; facets first, in declaration order.
    pub fn pages(&self) -> impl Iterator<Item = &DerivedPage> {
        self.outcomes()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
    }

    pub fn page(&self, path: &str) -> Option<&DerivedPage> {
        self.pages().find(|p| p.path() == path)
    }

    /// Descriptors that failed this pass.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &CoreError)> {
        self.outcomes()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.key.as_str(), e)))
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Replace failed descriptors with their pages from `previous`.
    ///
    /// Returns the keys that were patched. Descriptors that also failed (or
    /// did not exist) in `previous` stay failed.
    pub fn keep_stale(&mut self, previous: &BuildOutput) -> Vec<String> {
        let mut patched = Vec::new();
        let current = self.facets.iter_mut().chain(self.types.iter_mut());
        for outcome in current.filter(|o| o.result.is_err()) {
            let stale = previous
                .outcomes()
                .find(|p| p.key == outcome.key)
                .and_then(|p| p.result.as_ref().ok());
            if let Some(pages) = stale {
                outcome.result = Ok(pages.clone());
                patched.push(outcome.key.clone());
            }
        }
        patched
    }

    /// Hash over every page fingerprint, in page order.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for page in self.pages() {
            hasher.update(page.path().as_bytes());
            hasher.update(page.fingerprint().as_bytes());
        }
        hasher.finalize()
    }
}
