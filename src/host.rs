//! Host bootstrap
//!
//! A host integration builds a [`HostProfile`], supplies the pieces only it
//! can provide (network access and script evaluation) and installs the
//! resulting capability set once at startup:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use hostkit::{config::Config, eval::DisabledEvaluator, host::HostProfile, network::Fetch};
//! # fn fetch() -> Arc<dyn Fetch> { unimplemented!() }
//! let config = Config::default();
//! let caps = HostProfile::mobile()
//!     .bootstrap(&config, fetch(), Arc::new(DisabledEvaluator::new("mobile")))
//!     .expect("capabilities installed once");
//! ```

use crate::cache::{Cache, KvCacheFactory};
use crate::capabilities::{registry, CapabilitySet, CapabilitySetBuilder, RuntimeInfo};
use crate::config::{Config, ConfigManager};
use crate::error::HostkitResult;
use crate::eval::Evaluator;
use crate::hash::Sha1Hasher;
use crate::ids::UuidV4Generator;
use crate::network::Fetch;
use std::sync::Arc;
use tracing::debug;

/// Host identity installed alongside the capabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProfile {
    pub runtime: String,
    pub server: bool,
    pub info: RuntimeInfo,
}

impl HostProfile {
    pub fn new(runtime: impl Into<String>, server: bool) -> Self {
        Self {
            runtime: runtime.into(),
            server,
            info: RuntimeInfo::from_build(),
        }
    }

    /// Long-running server process
    pub fn server() -> Self {
        Self::new("server", true)
    }

    /// Mobile application runtime
    pub fn mobile() -> Self {
        Self::new("mobile", false)
    }

    /// Profile described by the `[runtime]` config section
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.runtime.name.clone(), config.runtime.server)
    }

    pub fn with_info(mut self, info: RuntimeInfo) -> Self {
        self.info = info;
        self
    }

    /// Cache factory described by the `[cache]` config section
    fn cache_factory(config: &Config) -> KvCacheFactory {
        KvCacheFactory::new(config.cache.namespace.clone()).with_default_dir(
            config
                .cache
                .directory
                .clone()
                .or_else(ConfigManager::default_cache_dir),
        )
    }

    /// Builder with every default capability filled in
    pub fn builder(
        &self,
        config: &Config,
        fetch: Arc<dyn Fetch>,
        evaluator: Arc<dyn Evaluator>,
    ) -> CapabilitySetBuilder {
        CapabilitySet::builder()
            .runtime(self.runtime.clone())
            .server(self.server)
            .info(self.info.clone())
            .cache_factory(Arc::new(Self::cache_factory(config)))
            .hasher(Arc::new(Sha1Hasher))
            .id_generator(Arc::new(UuidV4Generator))
            .evaluator(evaluator)
            .fetch(fetch)
    }

    /// Assemble the default capability set and install it process-wide
    pub fn bootstrap(
        &self,
        config: &Config,
        fetch: Arc<dyn Fetch>,
        evaluator: Arc<dyn Evaluator>,
    ) -> HostkitResult<Arc<CapabilitySet>> {
        debug!(
            "Bootstrapping runtime '{}' (persistent cache: {})",
            self.runtime, config.cache.persistent
        );
        registry::install(self.builder(config, fetch, evaluator))
    }

    /// The cache the configuration describes, built from the installed set
    pub fn default_cache(config: &Config) -> HostkitResult<Arc<dyn Cache>> {
        registry::current()?.create_cache(config.cache.persistence())
    }
}
