//! JSON output for the renderer and the search indexer.
//!
//! # Layout
//!
//! ```text
//! <output>/
//! ├── pages.json                 manifest of every derived page
//! ├── search.json                one record per document, with its excerpt
//! ├── category/index.json        facet root
//! ├── category/Rust/index.json   facet value
//! └── article/index.json         collection
//! ```
//!
//! Files whose content hash is unchanged are not rewritten, so a rebuild
//! that changes one page touches one file. `index.json` files left over
//! from pages that no longer exist are removed.

use crate::{config::BlogConfig, log};
use anyhow::{Context, Result, bail};
use blogdex_core::{BuildOutput, DerivedPage, Excerpt, PageKind, excerpt::split_more};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};
use walkdir::WalkDir;

pub const PAGE_FILE: &str = "index.json";
pub const MANIFEST_FILE: &str = "pages.json";
pub const SEARCH_FILE: &str = "search.json";

/// What one write pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub written: usize,
    pub unchanged: usize,
    pub removed: usize,
}

// ============================================================================
// Records
// ============================================================================

#[derive(Serialize)]
struct Manifest<'a> {
    site: Site<'a>,
    pages: Vec<ManifestEntry<'a>>,
}

#[derive(Serialize)]
struct Site<'a> {
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    path: &'a str,
    layout: &'a str,
    #[serde(flatten)]
    kind: &'a PageKind,
    count: usize,
    fingerprint: String,
}

#[derive(Serialize)]
struct SearchRecord<'a> {
    id: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    excerpt: &'a Excerpt,
    /// Body text before `<!-- more -->`, for auto excerpts.
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate: Option<&'a str>,
}

fn manifest(output: &BuildOutput, config: &BlogConfig) -> Result<Vec<u8>> {
    let manifest = Manifest {
        site: Site {
            title: &config.base.title,
            description: &config.base.description,
            url: config.base.url.as_deref(),
        },
        pages: output
            .pages()
            .map(|page| ManifestEntry {
                path: page.path(),
                layout: page.layout(),
                kind: page.kind(),
                count: match page.kind() {
                    PageKind::FacetIndex { entries, .. } => entries.len(),
                    _ => page.len(),
                },
                fingerprint: page.fingerprint().to_hex().to_string(),
            })
            .collect(),
    };
    serde_json::to_vec_pretty(&manifest).context("cannot serialize page manifest")
}

fn search_index(output: &BuildOutput) -> Result<Vec<u8>> {
    let records: Vec<_> = output
        .excerpts
        .iter()
        .map(|resolved| {
            let doc = &resolved.document;
            SearchRecord {
                id: &doc.id,
                title: &doc.title,
                date: doc.date_string(),
                excerpt: &resolved.excerpt,
                candidate: match resolved.excerpt {
                    Excerpt::Auto => split_more(&doc.body),
                    _ => None,
                },
            }
        })
        .collect();
    serde_json::to_vec_pretty(&records).context("cannot serialize search index")
}

// ============================================================================
// Writing
// ============================================================================

/// `/category/Rust/` → `<output>/category/Rust/index.json`
///
/// Fails when the page path would leave `output_dir`.
pub fn page_file(output_dir: &Path, page_path: &str) -> Result<PathBuf> {
    let relative = Path::new(page_path.trim_matches(['/', '\\']));
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        bail!("page path `{page_path}` escapes the output directory");
    }
    Ok(output_dir.join(relative).join(PAGE_FILE))
}

/// Write `bytes` unless the file already holds exactly them.
fn write_if_changed(path: &Path, bytes: &[u8]) -> io::Result<bool> {
    if let Ok(existing) = fs::read(path)
        && blake3::hash(&existing) == blake3::hash(bytes)
    {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(true)
}

/// Write every page, the manifest and the search index of a pass.
pub fn write_output(output: &BuildOutput, config: &BlogConfig, clean: bool) -> Result<WriteStats> {
    let dir = &config.build.output;
    if clean && dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("cannot clean {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let pages: Vec<&DerivedPage> = output.pages().collect();
    let mut files: Vec<(PathBuf, Vec<u8>)> = pages
        .par_iter()
        .map(|page| Ok((page_file(dir, page.path())?, page.to_json())))
        .collect::<Result<_>>()?;
    files.push((dir.join(MANIFEST_FILE), manifest(output, config)?));
    files.push((dir.join(SEARCH_FILE), search_index(output)?));

    let changed = files
        .par_iter()
        .map(|(path, bytes)| {
            write_if_changed(path, bytes).with_context(|| format!("cannot write {}", path.display()))
        })
        .collect::<Result<Vec<bool>>>()?;

    let written = changed.iter().filter(|&&c| c).count();
    let keep: FxHashSet<&Path> = files.iter().map(|(path, _)| path.as_path()).collect();
    let removed = prune(dir, &keep)?;

    Ok(WriteStats {
        written,
        unchanged: changed.len() - written,
        removed,
    })
}

/// Remove `index.json` files not in `keep`, then directories left empty.
fn prune(dir: &Path, keep: &FxHashSet<&Path>) -> Result<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.with_context(|| format!("cannot walk {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file()
            && entry.file_name() == PAGE_FILE
            && !keep.contains(path)
        {
            fs::remove_file(path).with_context(|| format!("cannot remove {}", path.display()))?;
            log!("write"; "removed {}", path.strip_prefix(dir).unwrap_or(path).display());
            removed += 1;
        }
    }

    if removed > 0 {
        for entry in WalkDir::new(dir).min_depth(1).contents_first(true).into_iter().flatten() {
            if entry.file_type().is_dir() {
                // Fails on non-empty directories, which is what we want
                fs::remove_dir(entry.path()).ok();
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogdex_core::{BuildContext, Document, DocumentSet, ExcerptOverride, SlugMode};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn config(dir: &Path) -> BlogConfig {
        let mut config = BlogConfig::default();
        config.base.title = "Blog".into();
        config.build.output = dir.join("out");
        config
    }

    fn docs() -> DocumentSet {
        DocumentSet::new([
            Document::new("a.md", "A")
                .with_categories(["Rust"])
                .with_body("intro\n<!-- more -->\nrest"),
            Document::new("b.md", "B")
                .with_categories(["Rust", "Web"])
                .with_excerpt(ExcerptOverride::Text("Bee".into())),
            Document::new("index.md", "Home").home(true),
        ])
        .unwrap()
    }

    fn read(path: PathBuf) -> Value {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    #[test]
    fn test_page_file() {
        let root = Path::new("/out");
        assert_eq!(page_file(root, "/category/").unwrap(), root.join("category").join("index.json"));
        assert_eq!(page_file(root, "/tag/x y/").unwrap(), root.join("tag").join("x y").join("index.json"));
    }

    #[test]
    fn test_page_file_rejects_escaping_paths() {
        let root = Path::new("/out");
        assert!(page_file(root, "/tag/../../etc/").is_err());
        assert!(page_file(root, "/../").is_err());
        assert!(page_file(root, "/tag/./x/").is_err());
        assert!(page_file(root, "/tag/..x/").is_ok());
    }

    #[test]
    fn test_unslugged_values_stay_inside_output() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let docs = DocumentSet::new([
            Document::new("a.md", "A").with_tags(["../../../escaped"]),
            Document::new("b.md", "B").with_tags([".."]),
        ])
        .unwrap();
        let output = BuildContext::blog_defaults().with_slug_mode(SlugMode::No).run(&docs);
        write_output(&output, &config, false).unwrap();

        assert!(!dir.path().join("escaped").exists());
        assert!(!dir.path().parent().unwrap().join("escaped").exists());
        let out = &config.build.output;
        assert!(page_file(out, "/tag/......escaped/").unwrap().exists());
        assert!(page_file(out, "/tag/_/").unwrap().exists());
        for entry in WalkDir::new(dir.path()).into_iter().flatten() {
            if entry.file_type().is_file() {
                assert!(entry.path().starts_with(out), "{}", entry.path().display());
            }
        }
    }

    #[test]
    fn test_writes_pages_manifest_and_search() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let output = BuildContext::blog_defaults().run(&docs());
        let stats = write_output(&output, &config, false).unwrap();

        let out = &config.build.output;
        assert_eq!(stats.written, output.pages().count() + 2);
        assert_eq!(stats.unchanged, 0);

        let rust = read(page_file(out, "/category/Rust/").unwrap());
        assert_eq!(rust["kind"], json!("facet-value"));
        assert_eq!(rust["items"].as_array().unwrap().len(), 2);

        let manifest = read(out.join(MANIFEST_FILE));
        assert_eq!(manifest["site"]["title"], json!("Blog"));
        assert_eq!(manifest["pages"][0]["path"], json!("/category/"));
        assert_eq!(manifest["pages"][0]["count"], json!(2));
        assert_eq!(manifest["pages"][0]["fingerprint"].as_str().unwrap().len(), 64);

        let search = read(out.join(SEARCH_FILE));
        assert_eq!(search[0]["excerpt"], json!({ "kind": "auto" }));
        assert_eq!(search[0]["candidate"], json!("intro"));
        assert_eq!(search[1]["excerpt"], json!({ "kind": "verbatim", "text": "Bee" }));
        assert!(search[1].get("candidate").is_none());
        assert_eq!(search[2]["excerpt"], json!({ "kind": "none" }));
    }

    #[test]
    fn test_unchanged_files_are_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let output = BuildContext::blog_defaults().run(&docs());

        write_output(&output, &config, false).unwrap();
        let again = write_output(&output, &config, false).unwrap();
        assert_eq!(again.written, 0);
        assert_eq!(again.unchanged, output.pages().count() + 2);
        assert_eq!(again.removed, 0);
    }

    #[test]
    fn test_stale_pages_are_pruned() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let ctx = BuildContext::blog_defaults();
        write_output(&ctx.run(&docs()), &config, false).unwrap();

        let fewer = DocumentSet::new([Document::new("a.md", "A").with_categories(["Rust"])]).unwrap();
        let stats = write_output(&ctx.run(&fewer), &config, false).unwrap();

        let out = &config.build.output;
        assert_eq!(stats.removed, 1);
        assert!(!page_file(out, "/category/Web/").unwrap().exists());
        assert!(!out.join("category").join("Web").exists());
        assert!(page_file(out, "/category/Rust/").unwrap().exists());
    }

    #[test]
    fn test_prune_leaves_foreign_files() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let out = &config.build.output;
        fs::create_dir_all(out.join("assets")).unwrap();
        fs::write(out.join("assets").join("style.css"), "body {}").unwrap();

        write_output(&BuildContext::blog_defaults().run(&docs()), &config, false).unwrap();
        assert!(out.join("assets").join("style.css").exists());
    }

    #[test]
    fn test_clean_removes_everything_first() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let out = &config.build.output;
        fs::create_dir_all(out).unwrap();
        fs::write(out.join("leftover.txt"), "x").unwrap();

        write_output(&BuildContext::blog_defaults().run(&docs()), &config, true).unwrap();
        assert!(!out.join("leftover.txt").exists());
        assert!(out.join(MANIFEST_FILE).exists());
    }
}
