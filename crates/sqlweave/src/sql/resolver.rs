//! Per-call parameter bookkeeping.
//!
//! Each template append checks a [`Resolver`] out of a small process-wide free
//! list. Dropping the guard clears it and hands it back, so the maps keep their
//! capacity across calls and are returned on every exit path, unwinding
//! included.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Upper bound on idle scratch maps kept around.
pub(super) const POOL_LIMIT: usize = 32;

static POOL: Mutex<Vec<Scratch>> = Mutex::new(Vec::new());

#[cfg(test)]
static RETURNED: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// Idle scratch maps currently in the pool.
#[cfg(test)]
pub(crate) fn pool_len() -> usize {
    POOL.lock().unwrap_or_else(PoisonError::into_inner).len()
}

/// Total scratch maps handed back since the process started.
#[cfg(test)]
pub(crate) fn returned_count() -> usize {
    RETURNED.load(std::sync::atomic::Ordering::SeqCst)
}

/// What a source parameter was turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Bound once; every later reference reuses this output ordinal.
    Bound(usize),
    /// Inlined as an expression; not assigned an ordinal.
    Inlined,
}

#[derive(Debug, Default)]
struct Scratch {
    ordinal: HashMap<usize, Slot>,
    named: HashMap<String, Slot>,
}

impl Scratch {
    fn clear(&mut self) {
        self.ordinal.clear();
        self.named.clear();
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.ordinal.is_empty() && self.named.is_empty()
    }
}

/// RAII handle on a pooled scratch map.
#[derive(Debug)]
pub(crate) struct Resolver {
    scratch: Scratch,
}

impl Resolver {
    pub(crate) fn acquire() -> Self {
        let scratch = POOL
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        Self { scratch }
    }

    pub(crate) fn ordinal(&self, ordinal: usize) -> Option<Slot> {
        self.scratch.ordinal.get(&ordinal).copied()
    }

    pub(crate) fn named(&self, name: &str) -> Option<Slot> {
        self.scratch.named.get(name).copied()
    }

    pub(crate) fn set_ordinal(&mut self, ordinal: usize, slot: Slot) {
        self.scratch.ordinal.insert(ordinal, slot);
    }

    pub(crate) fn set_named(&mut self, name: &str, slot: Slot) {
        self.scratch.named.insert(name.to_string(), slot);
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.scratch.is_empty()
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        let mut pool = POOL.lock().unwrap_or_else(PoisonError::into_inner);
        if pool.len() < POOL_LIMIT {
            pool.push(scratch);
            #[cfg(test)]
            RETURNED.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }
}

