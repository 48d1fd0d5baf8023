//! File system watcher for live reindexing.
//!
//! Monitors the content directory and the config file, and starts a full
//! rebuild for every settled batch of changes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Loop                              │
//! │                                                              │
//! │  ┌──────────┐    ┌──────────┐    ┌────────────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│    handle_changes()    │  │
//! │  │ events   │    │ (300ms)  │    │                        │  │
//! │  └──────────┘    └──────────┘    │  config → reload       │  │
//! │                                  │  spawn rebuild thread  │  │
//! │                                  └───────────┬────────────┘  │
//! │                                              ▼               │
//! │                               Supervisor: newest pass wins   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rebuilds run on their own threads so a slow pass never blocks event
//! intake. A pass started later supersedes every older one still running.

use crate::{
    config::{BlogConfig, cfg, reload_config},
    log,
    logger::now,
    pipeline::{Rebuild, rebuild},
};
use anyhow::{Context, Result};
use blogdex_core::{BuildOutput, Supervisor};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::RecvTimeoutError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Upper bound on how long the loop sleeps while idle, so Ctrl-C is noticed.
const IDLE_POLL_MS: u64 = 250;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// What a changed path means for the next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Config,
    Content,
    Ignored,
}

fn categorize(path: &Path, config: &BlogConfig) -> Change {
    if path == config.config_path {
        Change::Config
    } else if path.starts_with(&config.build.content) {
        Change::Content
    } else {
        Change::Ignored
    }
}

/// Format path as relative to root for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events until they go quiet.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    quiet: Duration,
}

impl Debouncer {
    fn new(debounce_ms: u64) -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            quiet: Duration::from_millis(debounce_ms),
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.quiet)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_millis(IDLE_POLL_MS)
        } else {
            self.quiet
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Spawn a rebuild pass with the current config.
fn spawn_rebuild(supervisor: &Supervisor<BuildOutput>, trigger: String) -> JoinHandle<()> {
    let config = cfg();
    let supervisor = supervisor.clone();
    thread::spawn(move || match rebuild(&config, &supervisor, false) {
        Ok(Rebuild::Published(_)) => log!("watch"; "[{}] rebuilt ({trigger})", now()),
        Ok(Rebuild::Superseded) => log!("watch"; "superseded ({trigger})"),
        Err(err) => log!("error"; "rebuild failed ({trigger})\n{err:#}"),
    })
}

/// Reload the config if it changed. Returns the config to watch with.
///
/// A broken config is reported and the previous one stays active.
fn apply_config_change() -> Arc<BlogConfig> {
    match reload_config() {
        Ok(true) => log!("watch"; "config reloaded"),
        Ok(false) => {}
        Err(err) => log!("error"; "config not reloaded, keeping previous\n{:#}", anyhow::Error::new(err)),
    }
    cfg()
}

/// Process a settled batch. Returns the handle of the rebuild it started.
fn handle_changes(
    paths: &[PathBuf],
    watcher: &mut impl Watcher,
    supervisor: &Supervisor<BuildOutput>,
) -> Result<Option<JoinHandle<()>>> {
    let before = cfg();
    let changes: Vec<(&PathBuf, Change)> = paths
        .iter()
        .map(|p| (p, categorize(p, &before)))
        .filter(|(_, c)| *c != Change::Ignored)
        .collect();
    if changes.is_empty() {
        return Ok(None);
    }

    let config_changed = changes.iter().any(|(_, c)| *c == Change::Config);
    let after = if config_changed { apply_config_change() } else { before.clone() };
    if after.build.content != before.build.content {
        watcher.unwatch(&before.build.content).ok();
        watch_content(watcher, &after)?;
    }

    let root = after.get_root();
    let first = rel_path(changes[0].0, root);
    let trigger = match changes.len() {
        1 => first,
        n => format!("{first} and {} more", n - 1),
    };
    Ok(Some(spawn_rebuild(supervisor, trigger)))
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn watch_content(watcher: &mut impl Watcher, config: &BlogConfig) -> Result<()> {
    watcher
        .watch(&config.build.content, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch content: {}", config.build.content.display()))
}

/// Watch the content directory and the directory holding the config file.
///
/// The config's parent is watched, not the file: a save-by-rename drops a
/// watch on the file itself.
fn setup_watchers(watcher: &mut impl Watcher, config: &BlogConfig) -> Result<()> {
    watch_content(watcher, config)?;
    if let Some(parent) = config.config_path.parent()
        && parent.exists()
    {
        watcher
            .watch(parent, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config: {}", config.config_path.display()))?;
    }

    let root = config.get_root();
    log!(
        "watch";
        "watching {}/ and {}",
        rel_path(&config.build.content, root),
        rel_path(&config.config_path, root)
    );
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Watch for changes and rebuild until Ctrl-C.
///
/// Waits for running rebuilds before returning.
pub fn watch_for_changes_blocking(supervisor: &Supervisor<BuildOutput>) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("Failed to set Ctrl-C handler")?;
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, &cfg())?;

    let mut debouncer = Debouncer::new(cfg().watch.debounce_ms);
    let mut running: Vec<JoinHandle<()>> = Vec::new();

    while !stop.load(Ordering::SeqCst) {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                match handle_changes(&debouncer.take(), &mut watcher, supervisor) {
                    Ok(Some(handle)) => running.push(handle),
                    Ok(None) => {}
                    Err(err) => log!("error"; "{err:#}"),
                }
                debouncer.quiet = Duration::from_millis(cfg().watch.debounce_ms);
                running.retain(|h| !h.is_finished());
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    log!("watch"; "stopping, waiting for {} running pass(es)", running.len());
    for handle in running {
        handle.join().ok();
    }
    Ok(())
}
