//! `[build]` section configuration.
//!
//! Paths, document selection, slugs and the failure policy of a build pass.

use super::defaults;
use blogdex_core::SlugMode;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Enums
// ============================================================================

/// What to do when a facet or type descriptor fails during a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnError {
    /// Fail the whole build; nothing is written (default).
    #[default]
    Abort,
    /// Write the pass, re-using the failed descriptor's pages from the last
    /// published pass.
    KeepStale,
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in blogdex.toml.
///
/// # Example
/// ```toml
/// [build]
/// content = "docs"              # Markdown source directory
/// output = "public/_blogdex"    # JSON output directory
/// include = ["posts/"]          # Only index these prefixes
/// on_error = "keep-stale"
///
/// [build.slug]
/// value = "on"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Markdown source directory.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// JSON output directory. Owned by blogdex: stale files in it are pruned.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Relative path prefixes (forward slashes) a file must match to become
    /// a document. Empty means every markdown file.
    #[serde(default = "defaults::build::include")]
    #[educe(Default = defaults::build::include())]
    pub include: Vec<String>,

    /// Descriptor failure policy.
    #[serde(default)]
    pub on_error: OnError,

    /// Ignore empty facet values instead of giving them their own page.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub skip_empty_values: bool,

    /// Slugification of facet values in page paths.
    #[serde(default)]
    pub slug: SlugConfig,
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.slug]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SlugConfig {
    /// Slug mode for facet value path segments.
    #[serde(default = "defaults::build::slug::value")]
    #[educe(Default = defaults::build::slug::value())]
    pub value: SlugMode,
}

#[cfg(test)]
mod tests {
    use super::super::BlogConfig;
    use super::*;

    #[test]
    fn test_build_config_defaults() {
        let config: BlogConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.root, None);
        assert_eq!(config.build.content, PathBuf::from("docs"));
        assert_eq!(config.build.output, PathBuf::from("public/_blogdex"));
        assert!(config.build.include.is_empty());
        assert_eq!(config.build.on_error, OnError::Abort);
        assert!(!config.build.skip_empty_values);
        assert_eq!(config.build.slug.value, SlugMode::Safe);
    }

    #[test]
    fn test_build_config_custom() {
        let config = r#"
            [build]
            content = "content"
            output = "dist/index"
            include = ["posts/"]
            on_error = "keep-stale"
            skip_empty_values = true

            [build.slug]
            value = "on"
        "#;
        let config: BlogConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.output, PathBuf::from("dist/index"));
        assert_eq!(config.build.include, vec!["posts/".to_string()]);
        assert_eq!(config.build.on_error, OnError::KeepStale);
        assert!(config.build.skip_empty_values);
        assert_eq!(config.build.slug.value, SlugMode::On);
    }

    #[test]
    fn test_slug_modes() {
        for (text, mode) in [("on", SlugMode::On), ("safe", SlugMode::Safe), ("no", SlugMode::No)] {
            let config: BlogConfig = toml::from_str(&format!("[build.slug]\nvalue = \"{text}\"")).unwrap();
            assert_eq!(config.build.slug.value, mode);
        }
    }

    #[test]
    fn test_invalid_on_error() {
        let result: Result<BlogConfig, _> = toml::from_str("[build]\non_error = \"retry\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_build_field() {
        let result: Result<BlogConfig, _> = toml::from_str("[build]\nminify = true");
        assert!(result.is_err());
    }
}
