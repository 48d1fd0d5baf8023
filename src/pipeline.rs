//! One full rebuild: load, index, publish.
//!
//! ```text
//! rebuild()
//!     │
//!     ├── supervisor.begin()        newer passes cancel this one
//!     ├── load_documents()          content dir → DocumentSet
//!     ├── BuildContext::run_with()  cancelled at stage boundaries
//!     ├── on_error policy           abort | keep-stale
//!     └── supervisor.publish_with() write JSON, then swap in the output
//! ```

use crate::{
    config::{BlogConfig, OnError},
    loader::load_documents,
    log,
    output::write_output,
};
use anyhow::{Context, Result, bail};
use blogdex_core::{BuildOutput, CoreError, Supervisor};
use std::{sync::Arc, time::Instant};

/// How a rebuild ended, when it did not fail.
#[derive(Debug)]
pub enum Rebuild {
    Published(Arc<BuildOutput>),
    /// A newer pass started; this one's output was dropped.
    Superseded,
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<CoreError>(), Some(CoreError::Cancelled))
}

/// Run a full pass and publish it if no newer pass started meanwhile.
pub fn rebuild(config: &BlogConfig, supervisor: &Supervisor<BuildOutput>, clean: bool) -> Result<Rebuild> {
    let started = Instant::now();
    let ticket = supervisor.begin();

    let docs = load_documents(config).context("cannot load documents")?;
    log!("load"; "{} documents", docs.len());

    let ctx = config.build_context()?;
    let mut output = match ctx.run_with(&docs, &ticket) {
        Ok(output) => output,
        Err(CoreError::Cancelled) => return Ok(Rebuild::Superseded),
        Err(err) => return Err(err.into()),
    };

    if !output.is_complete() {
        for (key, err) in output.failures() {
            log!("error"; "{key}: {:#}", anyhow::Error::new(err.clone()));
        }
        match config.build.on_error {
            OnError::Abort => bail!("{} descriptor(s) failed", output.failures().count()),
            OnError::KeepStale => {
                let patched = supervisor
                    .current()
                    .map(|previous| output.keep_stale(&previous))
                    .unwrap_or_default();
                if !patched.is_empty() {
                    log!("warn"; "keeping previous pages of {}", patched.join(", "));
                }
            }
        }
    }

    let pages = output.pages().count();
    let published = supervisor.publish_with(&ticket, output, |output| {
        let stats = write_output(output, config, clean)?;
        log!(
            "write";
            "{} written, {} unchanged, {} removed",
            stats.written, stats.unchanged, stats.removed
        );
        Ok::<_, anyhow::Error>(())
    });

    match published {
        Ok(output) => {
            log!("index"; "{pages} pages in {:.2?}", started.elapsed());
            Ok(Rebuild::Published(output))
        }
        Err(err) if is_cancelled(&err) => Ok(Rebuild::Superseded),
        Err(err) => Err(err),
    }
}
