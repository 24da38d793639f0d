//! Hostkit - runtime capability injection layer
//!
//! Lets one runtime-agnostic client library run unmodified across host
//! environments. Each host installs a [`CapabilitySet`] (cache, hashing,
//! id generation, script evaluation, network access) once at startup;
//! library code looks it up through [`capabilities::current`].

pub mod cache;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod eval;
pub mod hash;
pub mod host;
pub mod ids;
pub mod logging;
pub mod network;

pub use cache::{Cache, CacheExt, CacheValue, PersistenceMode};
pub use capabilities::{CapabilitySet, CapabilitySetBuilder, RuntimeInfo};
pub use error::{HostkitError, HostkitResult};
