//! Cancel-and-restart coordination for concurrent build passes.
//!
//! Every pass starts by taking a [`Ticket`]. Starting a newer pass bumps the
//! generation, which makes every older ticket report itself cancelled. Only
//! the holder of the newest ticket may publish.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Supervisor<T>                         │
//! │                                                              │
//! │   begin() ──► Ticket(gen=1) ── run ── publish ✗ (superseded) │
//! │   begin() ──► Ticket(gen=2) ── run ── publish ✓              │
//! │                                          │                   │
//! │                                          ▼                   │
//! │                          current (ArcSwapOption, lock-free)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Publishing holds a mutex across the generation check and the store, so a
//! pass that is superseded mid-publish cannot overwrite a newer result.

use crate::context::Cancellation;
use crate::error::{CoreError, Result};
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug)]
struct Inner<T> {
    /// Newest generation handed out.
    latest: AtomicU64,
    /// Serializes publishing.
    publish: Mutex<()>,
    current: ArcSwapOption<T>,
}

/// Hands out tickets and holds the last published value.
#[derive(Debug)]
pub struct Supervisor<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Supervisor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Supervisor<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                latest: AtomicU64::new(0),
                publish: Mutex::new(()),
                current: ArcSwapOption::empty(),
            }),
        }
    }
}

impl<T> Supervisor<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pass, superseding every pass started before it.
    pub fn begin(&self) -> Ticket<T> {
        let generation = self.inner.latest.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            generation,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Last published value.
    pub fn current(&self) -> Option<Arc<T>> {
        self.inner.current.load_full()
    }

    /// Publish `value` if `ticket` is still the newest one.
    pub fn publish(&self, ticket: &Ticket<T>, value: T) -> Result<Arc<T>> {
        self.publish_with(ticket, value, |_| Ok(()))
    }

    /// Like [`publish`](Self::publish), running `commit` first.
    ///
    /// `commit` runs under the publish lock, after the generation check, so
    /// side effects such as writing files happen only for the winning pass.
    /// If it fails, nothing is stored and its error is returned.
    pub fn publish_with<E>(
        &self,
        ticket: &Ticket<T>,
        value: T,
        commit: impl FnOnce(&T) -> std::result::Result<(), E>,
    ) -> std::result::Result<Arc<T>, E>
    where
        E: From<CoreError>,
    {
        let _guard = self.inner.publish.lock();
        if ticket.is_cancelled() {
            return Err(CoreError::Cancelled.into());
        }

        commit(&value)?;
        let value = Arc::new(value);
        self.inner.current.store(Some(Arc::clone(&value)));
        Ok(value)
    }
}

/// Proof of having started a pass.
#[derive(Debug)]
pub struct Ticket<T> {
    generation: u64,
    inner: Arc<Inner<T>>,
}

impl<T> Ticket<T> {
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> Cancellation for Ticket<T> {
    fn is_cancelled(&self) -> bool {
        self.inner.latest.load(Ordering::Acquire) != self.generation
    }
}
