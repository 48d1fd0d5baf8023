//! Markdown document source.
//!
//! Walks the content directory, splits each `.md` file into YAML frontmatter
//! and body, and normalizes the frontmatter into a [`Document`].
//!
//! ```text
//! docs/posts/hello.md
//! ┌─────────────────────────────┐
//! │ ---                         │   title     → Document::title
//! │ title: Hello                │   date      → Document::date (or absent)
//! │ date: 2024-06-01            │   category  → Document::categories
//! │ category: [Rust]            │   tag       → Document::tags
//! │ sticky: 2                   │   sticky    → Document::sticky
//! │ ---                         │   ...       → Document::extra
//! │ Body <!-- more --> rest     │   body      → Document::body
//! └─────────────────────────────┘
//! ```
//!
//! Malformed metadata never fails a file: a bad date or a wrongly typed flag
//! is recorded as a warning and treated as absent. Unreadable files and
//! frontmatter that is not YAML do fail.

use crate::{config::BlogConfig, log};
use blogdex_core::{CoreError, Document, DocumentSet, ExcerptOverride};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use regex::Regex;
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use thiserror::Error;
use walkdir::WalkDir;

/// First level-1 heading, the title fallback.
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t#\r]*$").unwrap());

/// Frontmatter keys with a typed counterpart on [`Document`].
const KNOWN_KEYS: &[&str] = &[
    "title", "date", "category", "categories", "tag", "tags", "sticky", "archive", "home",
    "excerpt", "author",
];

// ============================================================================
// Errors
// ============================================================================

/// Failure to turn one file into a document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("cannot walk content directory")]
    Walk(#[from] walkdir::Error),

    #[error("invalid YAML frontmatter in `{path}`")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("frontmatter of `{0}` is not a mapping")]
    NotMapping(String),

    #[error(transparent)]
    Set(#[from] CoreError),
}

// ============================================================================
// Parsing
// ============================================================================

/// A normalized document plus what was wrong with its metadata.
#[derive(Debug)]
pub struct Parsed {
    pub document: Document,
    pub warnings: Vec<String>,
}

/// Parse one markdown source. `id` is the path relative to the content root.
pub fn parse_document(id: &str, source: &str) -> Result<Parsed, LoadError> {
    let (yaml, body) = split_frontmatter(source);
    let mut fm = parse_frontmatter(id, yaml)?;
    let mut warnings = Vec::new();

    let title = match fm.remove("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback_title(id, body),
    };

    let mut doc = Document::new(id, title).with_body(body);

    match fm.remove("date") {
        None | Some(Value::Null) => {}
        Some(Value::String(raw)) => match parse_date(&raw) {
            Some(date) => doc.date = Some(date),
            None => warnings.push(format!("unparsable date `{raw}`")),
        },
        Some(other) => warnings.push(format!("unparsable date `{other}`")),
    }

    doc.categories = string_list(&mut fm, &["category", "categories"], &mut warnings);
    doc.tags = string_list(&mut fm, &["tag", "tags"], &mut warnings);
    doc.sticky = fm.remove("sticky").and_then(|v| sticky_rank(&v, &mut warnings));
    doc.archived = fm.remove("archive").is_some_and(|v| truthy(&v));
    doc.home = fm.remove("home").is_some_and(|v| truthy(&v));

    doc.excerpt = match fm.remove("excerpt") {
        None | Some(Value::Null) | Some(Value::Bool(true)) => None,
        Some(Value::Bool(false)) => Some(ExcerptOverride::Disabled),
        Some(Value::String(text)) => Some(ExcerptOverride::Text(text)),
        Some(other) => {
            warnings.push(format!("ignored excerpt `{other}`"));
            None
        }
    };

    doc.author = match fm.remove("author") {
        Some(Value::String(author)) if !author.is_empty() => Some(author),
        _ => None,
    };

    fm.retain(|key, _| !KNOWN_KEYS.contains(&key.as_str()));
    doc.extra = fm;

    Ok(Parsed {
        document: doc,
        warnings,
    })
}

/// Split `---` delimited frontmatter from the body.
///
/// Without an opening `---` line, or without a closing one, the whole source
/// is body.
fn split_frontmatter(source: &str) -> (&str, &str) {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return ("", source);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "---" || trimmed == "..." {
            return (&rest[..offset], &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    ("", source)
}

fn parse_frontmatter(id: &str, yaml: &str) -> Result<Map<String, Value>, LoadError> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(yaml).map_err(|source| LoadError::Yaml {
        path: id.to_owned(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(LoadError::NotMapping(id.to_owned())),
    }
}

/// First `# ` heading of the body, else the file stem.
fn fallback_title(id: &str, body: &str) -> String {
    if let Some(caps) = HEADING.captures(body) {
        return caps[1].to_owned();
    }
    Path::new(id)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| id.to_owned())
}

/// `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` (or with `T`), or RFC 3339.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

/// Merge the given keys, in order, into one list of strings.
fn string_list(fm: &mut Map<String, Value>, keys: &[&str], warnings: &mut Vec<String>) -> Vec<String> {
    let mut list = Vec::new();
    for key in keys {
        match fm.remove(*key) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    match scalar_string(item) {
                        Ok(s) => list.push(s),
                        Err(item) => warnings.push(format!("ignored {key} entry `{item}`")),
                    }
                }
            }
            Some(value) => match scalar_string(value) {
                Ok(s) => list.push(s),
                Err(value) => warnings.push(format!("ignored {key} `{value}`")),
            },
        }
    }
    list
}

fn scalar_string(value: Value) -> Result<String, Value> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(other),
    }
}

/// Pin rank: positive numbers pin, `true` is rank 1, zero and `false` do not.
fn sticky_rank(value: &Value, warnings: &mut Vec<String>) -> Option<u32> {
    let rank = match value {
        Value::Null | Value::Bool(false) => return None,
        Value::Bool(true) => return Some(1),
        Value::Number(n) => n.as_u64().or_else(|| {
            let f = n.as_f64().filter(|f| *f > 0.0)?;
            if f.fract() != 0.0 {
                warnings.push(format!("rounded sticky `{value}` up to {}", f.ceil()));
            }
            Some(f.ceil() as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match rank {
        Some(0) => None,
        Some(rank) => Some(u32::try_from(rank).unwrap_or(u32::MAX)),
        None => {
            warnings.push(format!("ignored sticky `{value}`"));
            None
        }
    }
}

/// Frontmatter truthiness for boolean flags.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Markdown files under `content`, as (relative id, absolute path), sorted by id.
fn collect_sources(content: &Path, config: &BlogConfig) -> Result<Vec<(String, PathBuf)>, LoadError> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(content).follow_links(true) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }
        let Ok(rel) = path.strip_prefix(content) else {
            continue;
        };
        let id = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if id.split('/').any(|part| part.starts_with('.')) || !config.includes(&id) {
            continue;
        }
        sources.push((id, path.to_path_buf()));
    }
    sources.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(sources)
}

/// Load and freeze the document set of one build pass.
pub fn load_documents(config: &BlogConfig) -> Result<DocumentSet, LoadError> {
    let sources = collect_sources(&config.build.content, config)?;

    let parsed: Vec<Parsed> = sources
        .par_iter()
        .map(|(id, path)| {
            let source = fs::read_to_string(path).map_err(|err| LoadError::Io(path.clone(), err))?;
            parse_document(id, &source)
        })
        .collect::<Result<_, _>>()?;

    let mut documents = Vec::with_capacity(parsed.len());
    for Parsed { document, warnings } in parsed {
        for warning in warnings {
            log!("warn"; "{}: {warning}", document.id);
        }
        documents.push(document);
    }

    Ok(DocumentSet::new(documents)?)
}
