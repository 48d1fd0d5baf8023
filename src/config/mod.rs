//! Configuration management for `blogdex.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[base]`     | Site metadata copied into `pages.json`           |
//! | `[build]`    | Paths, include prefixes, slugs, failure policy   |
//! | `[[facet]]`  | Grouping dimensions (default: category, tag)     |
//! | `[[type]]`   | Curated collections (default: article, timeline) |
//! | `[watch]`    | Debounce of the file watcher                     |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Blog"
//! url = "https://example.com"
//!
//! [build]
//! content = "docs"
//! include = ["posts/"]
//!
//! [[facet]]
//! key = "category"
//! layout = "Category"
//! title = "Categories"
//! item_title = "Category {name}"
//! ```
//!
//! The file is optional; without it every section takes its defaults.

mod base;
mod build;
pub mod defaults;
mod error;
mod handle;
mod taxonomy;
mod watch;

pub use build::OnError;
pub use error::ConfigError;
pub use handle::{cfg, init_config, reload_config};

use base::BaseConfig;
use build::BuildConfig;
use taxonomy::{FacetConfig, TypeConfig};
use watch::WatchConfig;

use crate::cli::Cli;
use crate::output::{MANIFEST_FILE, SEARCH_FILE};
use blogdex_core::BuildContext;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing blogdex.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BlogConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Hash of the config file content this value was parsed from
    #[serde(skip)]
    pub source_hash: Option<blake3::Hash>,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Facet declarations
    #[serde(default = "defaults::taxonomy::facets", rename = "facet")]
    #[educe(Default = defaults::taxonomy::facets())]
    pub facets: Vec<FacetConfig>,

    /// Collection declarations
    #[serde(default = "defaults::taxonomy::types", rename = "type")]
    #[educe(Default = defaults::taxonomy::types())]
    pub types: Vec<TypeConfig>,

    /// File watcher settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl BlogConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.source_hash = Some(blake3::hash(content.as_bytes()));
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load the config named by the CLI (or defaults when the file is
    /// missing), apply CLI overrides and validate.
    pub fn load(cli: &'static Cli) -> Result<Self, ConfigError> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Re-read the config file.
    ///
    /// Returns `Ok(None)` when the content hash matches the current one.
    pub fn reload(&self) -> Result<Option<Self>, ConfigError> {
        let content = fs::read_to_string(&self.config_path)
            .map_err(|err| ConfigError::Io(self.config_path.clone(), err))?;
        if self.source_hash == Some(blake3::hash(content.as_bytes())) {
            return Ok(None);
        }

        let mut config = Self::from_str(&content)?;
        config.set_root(self.get_root());
        if let Some(cli) = self.cli {
            config.update_with_cli(cli);
        }
        config.validate()?;
        Ok(Some(config))
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        let root = cli
            .root
            .as_ref()
            .cloned()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.update_path_with_root(&root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make every path absolute, relative to root
    fn update_path_with_root(&mut self, root: &Path, config_file: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config_file));
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            return Err(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into(),
            ));
        }

        if !self.build.content.is_dir() {
            return Err(ConfigError::Validation(format!(
                "[build.content] `{}` is not a directory",
                self.build.content.display()
            )));
        }

        if self.build.content.starts_with(&self.build.output) {
            return Err(ConfigError::Validation(
                "[build.output] must not contain [build.content]".into(),
            ));
        }

        if let Some(prefix) = self.build.include.iter().find(|p| p.starts_with('/') || p.contains('\\')) {
            return Err(ConfigError::Validation(format!(
                "[build.include] `{prefix}` must be a relative path with forward slashes"
            )));
        }

        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation("[watch.debounce_ms] must be positive".into()));
        }

        let mut keys = self.facets.iter().map(|f| f.key.as_str()).chain(self.types.iter().map(|t| t.key.as_str()));
        if let Some(key) = keys.find(|k| [MANIFEST_FILE, SEARCH_FILE].contains(k)) {
            return Err(ConfigError::Validation(format!(
                "[[facet]]/[[type]] key `{key}` is reserved for an output file"
            )));
        }

        self.build_context()?;
        Ok(())
    }

    /// Descriptors of one build pass, in declaration order.
    pub fn build_context(&self) -> Result<BuildContext, ConfigError> {
        let skip_empty = self.build.skip_empty_values;
        let facets = self.facets.iter().map(|f| f.descriptor(skip_empty)).collect();
        let types = self.types.iter().map(TypeConfig::descriptor).collect();
        Ok(BuildContext::new(facets, types)?.with_slug_mode(self.build.slug.value))
    }

    /// Whether a path relative to the content root (forward slashes) is
    /// selected by `[build.include]`.
    pub fn includes(&self, rel: &str) -> bool {
        self.build.include.is_empty() || self.build.include.iter().any(|prefix| rel.starts_with(prefix.as_str()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(root: &Path) -> &'static Cli {
        let root = root.to_string_lossy().into_owned();
        Box::leak(Box::new(Cli::try_parse_from(["blogdex", "--root", &root, "build"]).unwrap()))
    }

    fn site(config: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("blogdex.toml"), config).unwrap();
        dir
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(BlogConfig::from_str("[base\ntitle = 1").is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = BlogConfig::from_str("[serve]\nport = 1");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_get_root_default() {
        let config = BlogConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_default_matches_empty_file() {
        let empty = BlogConfig::from_str("").unwrap();
        let default = BlogConfig::default();
        assert_eq!(empty.facets, default.facets);
        assert_eq!(empty.types, default.types);
        assert_eq!(empty.build.content, default.build.content);
    }

    #[test]
    fn test_load_resolves_paths_against_root() {
        let dir = site("[build]\noutput = \"out\"");
        let config = BlogConfig::load(cli(dir.path())).unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.get_root(), root);
        assert_eq!(config.build.content, root.join("docs"));
        assert_eq!(config.build.output, root.join("out"));
        assert_eq!(config.config_path, root.join("blogdex.toml"));
        assert!(config.source_hash.is_some());
    }

    #[test]
    fn test_load_without_config_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        let config = BlogConfig::load(cli(dir.path())).unwrap();
        assert!(config.source_hash.is_none());
        assert_eq!(config.facets.len(), 2);
    }

    #[test]
    fn test_cli_overrides_paths() {
        let dir = site("");
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        let cli: &'static Cli = Box::leak(Box::new(
            Cli::try_parse_from(["blogdex", "--root", &root, "--content", "posts", "-o", "json", "build"]).unwrap(),
        ));
        let config = BlogConfig::load(cli).unwrap();
        assert!(config.build.content.ends_with("posts"));
        assert!(config.build.output.ends_with("json"));
    }

    #[test]
    fn test_validate_missing_content() {
        let dir = TempDir::new().unwrap();
        let err = BlogConfig::load(cli(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_validate_base_url() {
        let dir = site("[base]\nurl = \"example.com\"");
        let err = BlogConfig::load(cli(dir.path())).unwrap_err();
        assert!(format!("{err}").contains("[base.url]"));
    }

    #[test]
    fn test_validate_output_contains_content() {
        let dir = site("[build]\noutput = \".\"");
        let err = BlogConfig::load(cli(dir.path())).unwrap_err();
        assert!(format!("{err}").contains("[build.output]"));
    }

    #[test]
    fn test_validate_duplicate_keys() {
        let dir = site(
            r#"
            [[facet]]
            key = "tag"
            [[type]]
            key = "tag"
            policy = "article"
        "#,
        );
        let err = BlogConfig::load(cli(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Descriptor(_)));
    }

    #[test]
    fn test_validate_reserved_key() {
        for config in [
            "[[type]]\nkey = \"pages.json\"\npolicy = \"article\"",
            "[[facet]]\nkey = \"search.json\"",
        ] {
            let dir = site(config);
            let err = BlogConfig::load(cli(dir.path())).unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
            assert!(format!("{err}").contains("reserved"));
        }
    }

    #[test]
    fn test_validate_include_prefix() {
        let dir = site("[build]\ninclude = [\"/posts\"]");
        let err = BlogConfig::load(cli(dir.path())).unwrap_err();
        assert!(format!("{err}").contains("[build.include]"));
    }

    #[test]
    fn test_includes() {
        let mut config = BlogConfig::default();
        assert!(config.includes("about.md"));
        config.build.include = vec!["posts/".into()];
        assert!(config.includes("posts/a.md"));
        assert!(!config.includes("about.md"));
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = site("[base]\ntitle = \"One\"");
        let config = BlogConfig::load(cli(dir.path())).unwrap();
        assert!(config.reload().unwrap().is_none());

        fs::write(dir.path().join("blogdex.toml"), "[base]\ntitle = \"Two\"").unwrap();
        let reloaded = config.reload().unwrap().unwrap();
        assert_eq!(reloaded.base.title, "Two");
        assert_eq!(reloaded.build.content, config.build.content);
    }

    #[test]
    fn test_reload_rejects_invalid() {
        let dir = site("");
        let config = BlogConfig::load(cli(dir.path())).unwrap();
        fs::write(dir.path().join("blogdex.toml"), "[build]\non_error = 3").unwrap();
        assert!(config.reload().is_err());
    }
}
