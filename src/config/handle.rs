//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement, so a
//! rebuild thread keeps the config it started with while watch mode swaps
//! in an edited `blogdex.toml`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   CONFIG (ArcSwap)                       │
//! │                                                          │
//! │   rebuild thread ── cfg() ──► Arc<BlogConfig> (pinned)   │
//! │   rebuild thread ── cfg() ──► Arc<BlogConfig> (pinned)   │
//! │   watch loop ─── reload_config() ──► atomic replace      │
//! └──────────────────────────────────────────────────────────┘
//! ```

use super::{BlogConfig, ConfigError};
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage, replaced with the loaded config in main.
pub static CONFIG: LazyLock<ArcSwap<BlogConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(BlogConfig::default()));

/// Current config. Wait-free; the returned `Arc` stays valid across reloads.
#[inline]
pub fn cfg() -> Arc<BlogConfig> {
    CONFIG.load_full()
}

/// Install the loaded config (called once at startup).
#[inline]
pub fn init_config(config: BlogConfig) {
    CONFIG.store(Arc::new(config));
}

/// Re-read `blogdex.toml` and swap it in.
///
/// Returns `true` if the config was replaced, `false` if the file content is
/// unchanged. On error the current config stays in place.
pub fn reload_config() -> Result<bool, ConfigError> {
    match cfg().reload()? {
        Some(config) => {
            init_config(config);
            Ok(true)
        }
        None => Ok(false),
    }
}
