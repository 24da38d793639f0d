//! Process-wide capability registry
//!
//! Write once at bootstrap, read many thereafter. A second install while a
//! set is live is rejected, so network primitives are never swapped under
//! in-flight operations. [`reset`] is the explicit teardown.

use crate::capabilities::{CapabilitySet, CapabilitySetBuilder};
use crate::error::{HostkitError, HostkitResult};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

static REGISTRY: RwLock<Option<Arc<CapabilitySet>>> = RwLock::new(None);

fn poisoned<T>(_: T) -> HostkitError {
    HostkitError::Internal("capability registry lock poisoned".to_string())
}

/// Validate `capabilities` and publish them as the process-wide set
///
/// Validation happens before anything is published; a rejected install
/// leaves any previously installed set untouched.
pub fn install(capabilities: CapabilitySetBuilder) -> HostkitResult<Arc<CapabilitySet>> {
    install_set(capabilities.build()?)
}

/// Publish an already-built set
pub fn install_set(set: CapabilitySet) -> HostkitResult<Arc<CapabilitySet>> {
    let mut slot = REGISTRY.write().map_err(poisoned)?;

    if let Some(existing) = slot.as_ref() {
        warn!(
            "Rejected capability install for runtime '{}': runtime '{}' already installed",
            set.runtime(),
            existing.runtime()
        );
        return Err(HostkitError::AlreadyInstalled {
            runtime: existing.runtime().to_string(),
        });
    }

    let set = Arc::new(set);
    *slot = Some(Arc::clone(&set));
    info!(
        "Installed capabilities for runtime '{}' (server: {}, version {})",
        set.runtime(),
        set.is_server(),
        set.info().version
    );
    Ok(set)
}

/// The installed capability set
pub fn current() -> HostkitResult<Arc<CapabilitySet>> {
    REGISTRY
        .read()
        .map_err(poisoned)?
        .clone()
        .ok_or(HostkitError::NotInitialized)
}

/// Whether a capability set is installed
///
/// A poisoned registry lock is reported, not read as "not installed".
pub fn is_installed() -> HostkitResult<bool> {
    Ok(REGISTRY.read().map_err(poisoned)?.is_some())
}

/// Tear down the installed set, returning it
///
/// Holders of the returned `Arc` (and of earlier `current()` results) keep
/// working against the old set until they drop it.
pub fn reset() -> HostkitResult<Option<Arc<CapabilitySet>>> {
    let previous = REGISTRY.write().map_err(poisoned)?.take();
    if let Some(set) = &previous {
        debug!("Reset capabilities for runtime '{}'", set.runtime());
    }
    Ok(previous)
}
