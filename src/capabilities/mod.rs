//! Capability set: everything a host runtime must supply
//!
//! The client library never inspects the host it runs on. Instead the host
//! assembles one [`CapabilitySet`] at startup and installs it through
//! [`registry::install`]; library code reads it back with
//! [`registry::current`].

pub mod registry;

pub use registry::{current, install, install_set, is_installed, reset};

use crate::cache::{Cache, CacheFactory, PersistenceMode};
use crate::error::{HostkitError, HostkitResult};
use crate::eval::Evaluator;
use crate::hash::ContentHasher;
use crate::ids::IdGenerator;
use crate::network::Fetch;
use std::fmt;
use std::sync::Arc;

/// Version metadata passed through to the client library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub version: String,
    pub bugs_url: String,
    pub repo_url: String,
}

impl RuntimeInfo {
    pub fn new(
        version: impl Into<String>,
        bugs_url: impl Into<String>,
        repo_url: impl Into<String>,
    ) -> Self {
        let repo_url: String = repo_url.into();
        Self {
            version: version.into(),
            bugs_url: bugs_url.into(),
            repo_url: strip_fragment(&repo_url).to_string(),
        }
    }

    /// Metadata of this crate's build
    pub fn from_build() -> Self {
        let repo = env!("CARGO_PKG_REPOSITORY");
        let repo = strip_fragment(repo).trim_end_matches('/');
        Self::new(env!("CARGO_PKG_VERSION"), format!("{}/issues", repo), repo)
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or_default()
}

/// The process-wide bundle of host capabilities
///
/// Only constructible through [`CapabilitySetBuilder`], so every field is
/// always populated.
#[derive(Clone)]
pub struct CapabilitySet {
    runtime: String,
    server: bool,
    info: RuntimeInfo,
    cache_factory: Arc<dyn CacheFactory>,
    hasher: Arc<dyn ContentHasher>,
    ids: Arc<dyn IdGenerator>,
    evaluator: Arc<dyn Evaluator>,
    fetch: Arc<dyn Fetch>,
}

impl CapabilitySet {
    pub fn builder() -> CapabilitySetBuilder {
        CapabilitySetBuilder::default()
    }

    /// Runtime identifier tag (e.g. "server", "mobile")
    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    /// Whether the host is a server runtime
    pub fn is_server(&self) -> bool {
        self.server
    }

    pub fn info(&self) -> &RuntimeInfo {
        &self.info
    }

    pub fn cache_factory(&self) -> &Arc<dyn CacheFactory> {
        &self.cache_factory
    }

    /// Construct a cache with the given persistence mode
    pub fn create_cache(&self, mode: PersistenceMode) -> HostkitResult<Arc<dyn Cache>> {
        self.cache_factory.create(mode)
    }

    pub fn hasher(&self) -> &Arc<dyn ContentHasher> {
        &self.hasher
    }

    /// Hash `data` with the host digest function
    pub fn hash(&self, data: &[u8]) -> String {
        self.hasher.digest(data)
    }

    pub fn id_generator(&self) -> &Arc<dyn IdGenerator> {
        &self.ids
    }

    /// Generate a unique identifier
    pub fn new_id(&self) -> String {
        self.ids.generate()
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.evaluator
    }

    pub fn fetch(&self) -> &Arc<dyn Fetch> {
        &self.fetch
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySet")
            .field("runtime", &self.runtime)
            .field("server", &self.server)
            .field("info", &self.info)
            .field("hasher", &self.hasher.algorithm())
            .finish_non_exhaustive()
    }
}

/// Collects capability fields; `build()` rejects any that are missing
#[derive(Default)]
pub struct CapabilitySetBuilder {
    runtime: Option<String>,
    server: bool,
    info: Option<RuntimeInfo>,
    cache_factory: Option<Arc<dyn CacheFactory>>,
    hasher: Option<Arc<dyn ContentHasher>>,
    ids: Option<Arc<dyn IdGenerator>>,
    evaluator: Option<Arc<dyn Evaluator>>,
    fetch: Option<Arc<dyn Fetch>>,
}

impl CapabilitySetBuilder {
    pub fn runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    pub fn server(mut self, server: bool) -> Self {
        self.server = server;
        self
    }

    pub fn info(mut self, info: RuntimeInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn cache_factory(mut self, factory: Arc<dyn CacheFactory>) -> Self {
        self.cache_factory = Some(factory);
        self
    }

    pub fn hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn fetch(mut self, fetch: Arc<dyn Fetch>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    /// Validate and assemble the set
    ///
    /// Reports every missing field at once, in declaration order.
    /// Empty strings count as missing.
    pub fn build(self) -> HostkitResult<CapabilitySet> {
        let runtime = self.runtime.filter(|r| !r.is_empty());
        let info = self.info;
        let version = info.as_ref().is_some_and(|i| !i.version.is_empty());
        let bugs = info.as_ref().is_some_and(|i| !i.bugs_url.is_empty());
        let repo = info.as_ref().is_some_and(|i| !i.repo_url.is_empty());

        let missing: Vec<&'static str> = [
            ("runtime", runtime.is_some()),
            ("version", version),
            ("bugs_url", bugs),
            ("repo_url", repo),
            ("cache_factory", self.cache_factory.is_some()),
            ("hasher", self.hasher.is_some()),
            ("id_generator", self.ids.is_some()),
            ("evaluator", self.evaluator.is_some()),
            ("fetch", self.fetch.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, present)| (!present).then_some(field))
        .collect();

        match (
            runtime,
            info,
            self.cache_factory,
            self.hasher,
            self.ids,
            self.evaluator,
            self.fetch,
        ) {
            (
                Some(runtime),
                Some(info),
                Some(cache_factory),
                Some(hasher),
                Some(ids),
                Some(evaluator),
                Some(fetch),
            ) if missing.is_empty() => Ok(CapabilitySet {
                runtime,
                server: self.server,
                info,
                cache_factory,
                hasher,
                ids,
                evaluator,
                fetch,
            }),
            _ => Err(HostkitError::InvalidCapabilitySet { missing }),
        }
    }
}
