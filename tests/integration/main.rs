//! Integration tests for Hostkit

mod registry_tests {
    use async_trait::async_trait;
    use hostkit::cache::KvCacheFactory;
    use hostkit::capabilities::{self, RuntimeInfo};
    use hostkit::eval::{EvalEnv, FnEvaluator};
    use hostkit::hash::Sha1Hasher;
    use hostkit::ids::UuidV4Generator;
    use hostkit::network::{Fetch, Request, Response};
    use hostkit::{
        Cache, CacheExt, CapabilitySet, CapabilitySetBuilder, HostkitError, HostkitResult,
        PersistenceMode,
    };
    use serde_json::json;
    use serial_test::serial;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct EchoFetch;

    #[async_trait]
    impl Fetch for EchoFetch {
        async fn fetch(&self, request: Request) -> HostkitResult<Response> {
            let body = request.body.bytes().await?;
            let mut response = Response::new(200, body);
            response.headers.set("x-echo-url", request.url);
            Ok(response)
        }
    }

    fn builder(runtime: &str, factory: KvCacheFactory) -> CapabilitySetBuilder {
        CapabilitySet::builder()
            .runtime(runtime)
            .server(runtime == "server")
            .info(RuntimeInfo::new(
                "9.4.0",
                "https://example.test/client/issues",
                "https://example.test/client#readme",
            ))
            .cache_factory(Arc::new(factory))
            .hasher(Arc::new(Sha1Hasher))
            .id_generator(Arc::new(UuidV4Generator))
            .evaluator(Arc::new(FnEvaluator::new(|code: &str, _env: &EvalEnv| {
                Ok(json!(code.len()))
            })))
            .fetch(Arc::new(EchoFetch))
    }

    fn memory_factory() -> KvCacheFactory {
        KvCacheFactory::new("IntegrationCache").with_default_dir(None)
    }

    #[test]
    #[serial]
    fn current_before_install_is_not_initialized() {
        capabilities::reset().unwrap();
        let err = capabilities::current().unwrap_err();
        assert!(matches!(err, HostkitError::NotInitialized));
    }

    #[tokio::test]
    #[serial]
    async fn ephemeral_scenario() {
        capabilities::reset().unwrap();
        capabilities::install(builder("mobile", memory_factory())).unwrap();

        let caps = capabilities::current().unwrap();
        let cache = caps.create_cache(PersistenceMode::ephemeral()).unwrap();

        cache.set("a", b"hello".to_vec().into()).await.unwrap();
        let bytes = cache.get("a").await.unwrap().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "hello");
        assert_eq!(cache.cache_dir(), None);

        capabilities::reset().unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn durable_scenario_reports_directory() {
        capabilities::reset().unwrap();
        capabilities::install(builder("server", memory_factory())).unwrap();

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("data").join("cache");
        let caps = capabilities::current().unwrap();
        let cache = caps
            .create_cache(PersistenceMode::durable(dir.clone()))
            .unwrap();
        assert_eq!(cache.cache_dir(), Some(dir.as_path()));

        let literal = PersistenceMode::durable("/data/cache");
        assert_eq!(literal.cache_dir(), Some(Path::new("/data/cache")));

        capabilities::reset().unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn structured_value_scenario() {
        capabilities::reset().unwrap();
        capabilities::install(builder("mobile", memory_factory())).unwrap();
        let cache = capabilities::current()
            .unwrap()
            .create_cache(PersistenceMode::ephemeral())
            .unwrap();

        cache.set("k", json!({"x": 1}).into()).await.unwrap();
        let bytes = cache.get("k").await.unwrap().unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(parsed, json!({"x": 1}));

        let typed: Option<serde_json::Value> = cache.get_json("k").await.unwrap();
        assert_eq!(typed, Some(json!({"x": 1})));

        capabilities::reset().unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn absent_and_remove_semantics() {
        capabilities::reset().unwrap();
        capabilities::install(builder("mobile", memory_factory())).unwrap();
        let cache = capabilities::current()
            .unwrap()
            .create_cache(PersistenceMode::ephemeral())
            .unwrap();

        assert_eq!(cache.get("never-set").await.unwrap(), None);
        cache.remove("never-set").await.unwrap();

        for (key, payload) in [("a", vec![]), ("b", vec![0u8, 255, 1]), ("c", b"text".to_vec())] {
            cache.set(key, payload.clone().into()).await.unwrap();
            assert_eq!(cache.get(key).await.unwrap(), Some(payload));
            cache.remove(key).await.unwrap();
            assert_eq!(cache.get(key).await.unwrap(), None);
        }

        capabilities::reset().unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn durable_entries_survive_reinstall() {
        capabilities::reset().unwrap();
        let temp = TempDir::new().unwrap();
        let mode = PersistenceMode::durable(temp.path());

        capabilities::install(builder("server", memory_factory())).unwrap();
        let cache = capabilities::current().unwrap().create_cache(mode.clone()).unwrap();
        cache.set_json("session", &json!({"visitor": "abc"})).await.unwrap();

        // Tear down and bring up a fresh registry, as a restart would
        capabilities::reset().unwrap();
        capabilities::install(builder("server", memory_factory())).unwrap();
        let cache = capabilities::current().unwrap().create_cache(mode).unwrap();
        let restored: Option<serde_json::Value> = cache.get_json("session").await.unwrap();
        assert_eq!(restored, Some(json!({"visitor": "abc"})));

        capabilities::reset().unwrap();
    }

    #[test]
    #[serial]
    fn missing_field_rejected_without_touching_state() {
        capabilities::reset().unwrap();
        capabilities::install(builder("server", memory_factory())).unwrap();

        let incomplete = CapabilitySet::builder()
            .runtime("mobile")
            .hasher(Arc::new(Sha1Hasher));
        let err = capabilities::install(incomplete).unwrap_err();
        match err {
            HostkitError::InvalidCapabilitySet { missing } => {
                assert!(missing.contains(&"fetch"));
                assert!(!missing.contains(&"hasher"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(capabilities::current().unwrap().runtime(), "server");

        capabilities::reset().unwrap();
    }

    #[test]
    #[serial]
    fn second_install_rejected() {
        capabilities::reset().unwrap();
        capabilities::install(builder("server", memory_factory())).unwrap();

        let err = capabilities::install(builder("mobile", memory_factory())).unwrap_err();
        assert!(matches!(err, HostkitError::AlreadyInstalled { .. }));
        assert!(capabilities::current().unwrap().is_server());

        capabilities::reset().unwrap();
    }

    #[tokio::test]
    #[serial]
    async fn collaborators_are_reachable_through_registry() {
        capabilities::reset().unwrap();
        capabilities::install(builder("server", memory_factory())).unwrap();
        let caps = capabilities::current().unwrap();

        assert_eq!(caps.info().repo_url, "https://example.test/client");
        assert_eq!(caps.hash(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");

        let value = caps
            .evaluator()
            .evaluate("abcd", &EvalEnv::new())
            .await
            .unwrap();
        assert_eq!(value, json!(4));

        let response = caps
            .fetch()
            .fetch(Request::post("https://example.test/echo", String::from("ping")))
            .await
            .unwrap();
        assert_eq!(response.headers.get("X-Echo-Url"), Some("https://example.test/echo"));
        assert_eq!(response.body.text().await.unwrap(), "ping");

        capabilities::reset().unwrap();
    }
}

mod host_tests {
    use async_trait::async_trait;
    use hostkit::cache::{CacheFactory, KvCache, KvCacheFactory, MemoryStore};
    use hostkit::capabilities;
    use hostkit::config::{Config, ConfigManager};
    use hostkit::eval::DisabledEvaluator;
    use hostkit::host::HostProfile;
    use hostkit::network::{Fetch, Request, Response};
    use hostkit::{Cache, HostkitError, HostkitResult, PersistenceMode};
    use serial_test::serial;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct OfflineFetch;

    #[async_trait]
    impl Fetch for OfflineFetch {
        async fn fetch(&self, request: Request) -> HostkitResult<Response> {
            Err(HostkitError::Fetch {
                url: request.url,
                reason: "offline".to_string(),
            })
        }
    }

    #[tokio::test]
    #[serial]
    async fn bootstrap_from_saved_config() {
        capabilities::reset().unwrap();
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));

        let mut config = Config::default();
        config.runtime.name = "mobile".to_string();
        config.runtime.server = false;
        config.cache.persistent = true;
        config.cache.directory = Some(temp.path().join("cache"));
        manager.save(&config).await.unwrap();

        let config = manager.load().await.unwrap();
        let caps = HostProfile::from_config(&config)
            .bootstrap(
                &config,
                Arc::new(OfflineFetch),
                Arc::new(DisabledEvaluator::new("mobile")),
            )
            .unwrap();
        assert_eq!(caps.runtime(), "mobile");
        assert!(!caps.is_server());

        let cache = HostProfile::default_cache(&config).unwrap();
        assert_eq!(cache.cache_dir(), Some(temp.path().join("cache").as_path()));

        let err = caps.fetch().fetch(Request::get("https://x.test")).await.unwrap_err();
        assert!(err.is_retryable());

        capabilities::reset().unwrap();
    }

    #[tokio::test]
    async fn unavailable_store_is_not_a_miss() {
        let cache = KvCache::new(
            Arc::new(MemoryStore::unavailable("engine")),
            PersistenceMode::ephemeral(),
        );
        let err = cache.get("k").await.unwrap_err();
        assert!(matches!(err, HostkitError::AdapterUnavailable { .. }));
    }

    #[tokio::test]
    async fn concurrent_writes_last_write_wins() {
        let factory = KvCacheFactory::new("race").with_default_dir(None);
        let cache = factory.create(PersistenceMode::ephemeral()).unwrap();

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.set("shared", vec![i].into()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let value = cache.get("shared").await.unwrap().unwrap();
        assert_eq!(value.len(), 1);
        assert!(value[0] < 16);
    }
}
