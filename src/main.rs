//! Blogdex - taxonomy and listing indexes for markdown blogs.

mod cli;
mod config;
mod loader;
mod logger;
mod output;
mod pipeline;
mod watch;

use anyhow::{Result, bail};
use blogdex_core::{BuildOutput, Supervisor};
use clap::Parser;
use cli::Cli;
use config::{BlogConfig, cfg, init_config};
use pipeline::{Rebuild, rebuild};
use watch::watch_for_changes_blocking;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    init_config(BlogConfig::load(cli)?);

    let supervisor = Supervisor::new();
    let first = build_once(&supervisor, cli.clean());
    if !cli.is_watch() {
        return first;
    }

    // A failed first pass is reported, the watcher still starts
    if let Err(err) = first {
        log!("error"; "{err:#}");
    }
    watch_for_changes_blocking(&supervisor)
}

/// Run one pass with the installed config.
fn build_once(supervisor: &Supervisor<BuildOutput>, clean: bool) -> Result<()> {
    match rebuild(&cfg(), supervisor, clean)? {
        Rebuild::Published(output) => {
            let failed: Vec<_> = output.failures().map(|(key, _)| key).collect();
            if !failed.is_empty() {
                log!("warn"; "published without {}", failed.join(", "));
            }
            Ok(())
        }
        Rebuild::Superseded => bail!("build pass was superseded"),
    }
}
