//! # Reference GPS Port
//!
//! The base station carries a co-located reference GPS (part of the
//! satellite tracker hardware). Its driver is an external collaborator;
//! this module only defines the read seam the engine and dispatch tasks
//! use, plus the shared cell the relay task publishes readings into.

use std::sync::{Arc, RwLock};

/// One valid position reading from the local reference GPS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// Read access to the latest reference GPS fix.
///
/// Implementations return `None` when the reference has no valid
/// reading; callers decide whether to skip (relay) or degrade (broker).
pub trait ReferenceGps: Send + Sync {
    /// Latest valid reading, if any. Must not block.
    fn current_fix(&self) -> Option<ReferenceFix>;
}

/// Shared cell holding the latest reference reading.
///
/// The relay task is the only writer; the dispatch loop and its tasks
/// read copies. Readings are small `Copy` values, so readers never hold
/// the lock across any I/O.
#[derive(Debug, Clone, Default)]
pub struct SharedReferenceFix {
    inner: Arc<RwLock<Option<ReferenceFix>>>,
}

impl SharedReferenceFix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new reading (or `None` when the reference lost its fix).
    pub fn set(&self, fix: Option<ReferenceFix>) {
        *self.inner.write().expect("reference lock poisoned") = fix;
    }
}

impl ReferenceGps for SharedReferenceFix {
    fn current_fix(&self) -> Option<ReferenceFix> {
        *self.inner.read().expect("reference lock poisoned")
    }
}
