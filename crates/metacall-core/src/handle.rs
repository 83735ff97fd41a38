//! Handles: opaque tokens identifying one successful load.

use std::cell::Cell;

/// Opaque identifier for a [`Handle`], unique within its owning loader
/// instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    #[must_use]
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// What a successful `load_from_file`/`load_from_memory`/`load_from_package`
/// produced.
///
/// A handle records exactly the names it introduced into its loader's
/// context, so `clear` is a deterministic inverse of discovery rather than
/// a full context rebuild.
#[derive(Debug)]
pub struct Handle {
    id: HandleId,
    /// The backend-private artifact token this handle's load produced;
    /// passed back to the backend on `clear`.
    artifact: u64,
    /// Names this handle's discovery step published into the loader's
    /// context. `clear` removes precisely these.
    introduced_names: Vec<String>,
    /// Number of invocations currently in flight against a function this
    /// handle introduced. `clear` while this is non-zero transitions the
    /// handle to draining instead of removing it immediately.
    in_flight: Cell<u32>,
    /// Set once `clear` has been requested; the actual removal happens
    /// when `in_flight` reaches zero.
    draining: Cell<bool>,
}

impl Handle {
    #[must_use]
    pub(crate) fn new(id: HandleId, artifact: u64, introduced_names: Vec<String>) -> Self {
        Self {
            id,
            artifact,
            introduced_names,
            in_flight: Cell::new(0),
            draining: Cell::new(false),
        }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub(crate) fn artifact(&self) -> u64 {
        self.artifact
    }

    #[must_use]
    pub fn introduced_names(&self) -> &[String] {
        &self.introduced_names
    }

    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.draining.get()
    }

    pub(crate) fn begin_invocation(&self) {
        self.in_flight.set(self.in_flight.get() + 1);
    }

    /// Returns `true` once the last in-flight invocation has ended while
    /// the handle was draining, meaning the caller should now finish the
    /// removal it deferred.
    pub(crate) fn end_invocation(&self) -> bool {
        let remaining = self.in_flight.get().saturating_sub(1);
        self.in_flight.set(remaining);
        self.draining.get() && remaining == 0
    }

    /// Requests that this handle be cleared. Returns `true` if the
    /// removal can happen immediately (no invocation in flight), `false`
    /// if the handle is now draining and removal must wait.
    pub(crate) fn request_clear(&self) -> bool {
        if self.in_flight.get() == 0 {
            true
        } else {
            self.draining.set(true);
            false
        }
    }
}
