use actix_web::{App, test};
use appshelf::{
    conf::ServerConfig,
    install::{InstallError, run_install},
    response::StoredResponse,
    routes::setup_service_config,
    store::{CacheStore, StoreError, memory::MemoryStore},
    upstream::{
        UpstreamError,
        memory::{
            MemoryUpstream,
            testing::{self, create_example_upstream},
        },
    },
};
use bytes::Bytes;

/* -------------------------------------------------------------------------- */
/*                                   Warm-up                                  */
/* -------------------------------------------------------------------------- */

/// Ensure a warm-up against an empty store lands exactly the allow-list.
#[tokio::test]
async fn install_populates_exactly_the_allow_list() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let config = ServerConfig::default();
    let upstream = create_example_upstream();
    let store = MemoryStore::open(&config.cache.name);

    let count = run_install(&upstream, &store, &config.cache.precache)
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(store.len().await.unwrap(), 2);
    assert!(store.lookup(testing::PATH_INDEX).await.unwrap().is_some());
    assert!(store.lookup(testing::PATH_STYLE).await.unwrap().is_some());
    assert_eq!(store.lookup(testing::PATH_EXTRA).await.unwrap(), None);
    assert_eq!(store.lookup(testing::PATH_EVENTS).await.unwrap(), None);
}

/// Ensure re-running the warm-up re-adds the planned keys and disturbs
/// nothing else in the store.
#[tokio::test]
async fn install_is_idempotent_over_a_populated_store() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let config = ServerConfig::default();
    let upstream = create_example_upstream();
    let store = MemoryStore::open(&config.cache.name);

    // A stale allow-list entry plus a foreign key the plan does not cover
    store
        .insert_all(vec![
            ("/".to_string(), StoredResponse::from_str("stale")),
            ("/keep.js".to_string(), StoredResponse::from_str("keep")),
        ])
        .await
        .unwrap();

    run_install(&upstream, &store, &config.cache.precache)
        .await
        .unwrap();

    assert_eq!(store.len().await.unwrap(), 3);
    assert_eq!(
        store.lookup("/").await.unwrap().unwrap().body().as_ref(),
        testing::DATA_INDEX.as_bytes()
    );
    assert_eq!(
        store
            .lookup("/keep.js")
            .await
            .unwrap()
            .unwrap()
            .body()
            .as_ref(),
        b"keep"
    );
}

/// Ensure duplicated allow-list entries are fetched once.
#[tokio::test]
async fn install_fetches_duplicates_once() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let upstream = create_example_upstream();
    let store = MemoryStore::open("dedup-cache");

    let paths = vec![
        "/".to_string(),
        "/static/style.css".to_string(),
        "/".to_string(),
    ];
    let count = run_install(&upstream, &store, &paths).await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(upstream.hits(), 2);
}

/* -------------------------------------------------------------------------- */
/*                              Warm-up Failures                              */
/* -------------------------------------------------------------------------- */

/// Ensure one non-2xx answer fails the whole warm-up and leaves the store
/// untouched.
#[tokio::test]
async fn install_fails_atomically_on_bad_status() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let config = ServerConfig::default();
    let upstream = MemoryUpstream::new()
        .with_response(
            "/",
            StoredResponse::new(200, None, Bytes::from_static(b"index")),
        )
        .with_response(
            "/static/style.css",
            StoredResponse::new(500, None, Bytes::from_static(b"boom")),
        );
    let store = MemoryStore::open(&config.cache.name);

    let err = run_install(&upstream, &store, &config.cache.precache)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        InstallError::BadStatus {
            path: "/static/style.css".to_string(),
            status: 500,
        }
    );
    assert_eq!(store.len().await.unwrap(), 0);
}

/// Ensure an unreachable upstream fails the warm-up before anything lands.
#[tokio::test]
async fn install_fails_when_upstream_unreachable() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let config = ServerConfig::default();
    let upstream = MemoryUpstream::offline();
    let store = MemoryStore::open(&config.cache.name);

    let err = run_install(&upstream, &store, &config.cache.precache)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InstallError::Fetch {
            source: UpstreamError::Unreachable(_),
            ..
        }
    ));
    assert_eq!(store.len().await.unwrap(), 0);
}

/// Ensure a store that cannot commit surfaces as a warm-up failure.
#[tokio::test]
async fn install_surfaces_store_faults() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }

        async fn lookup(&self, _path: &str) -> Result<Option<StoredResponse>, StoreError> {
            Err(StoreError::Connection)
        }

        async fn insert_all(
            &self,
            _entries: Vec<(String, StoredResponse)>,
        ) -> Result<(), StoreError> {
            Err(StoreError::Connection)
        }

        async fn len(&self) -> Result<usize, StoreError> {
            Err(StoreError::Connection)
        }
    }

    let config = ServerConfig::default();
    let upstream = create_example_upstream();

    let err = run_install(&upstream, &BrokenStore, &config.cache.precache)
        .await
        .unwrap_err();

    assert_eq!(err, InstallError::Store(StoreError::Connection));
}

/* -------------------------------------------------------------------------- */
/*                              Store Versioning                              */
/* -------------------------------------------------------------------------- */

/// Ensure warming a store under one name leaves a differently-named store
/// empty: the name is the version tag.
#[tokio::test]
async fn store_names_are_disjoint_versions() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let config = ServerConfig::default();
    let upstream = create_example_upstream();

    let v1 = MemoryStore::open("kintai-app-cache-v1");
    let v2 = MemoryStore::open("kintai-app-cache-v2");

    run_install(&upstream, &v1, &config.cache.precache)
        .await
        .unwrap();

    assert_eq!(v1.len().await.unwrap(), 2);
    assert_eq!(v2.len().await.unwrap(), 0);
    assert_eq!(v2.lookup("/").await.unwrap(), None);
}

/* -------------------------------------------------------------------------- */
/*                              Upstream Failures                             */
/* -------------------------------------------------------------------------- */

/// Ensure a dead upstream surfaces as 502 on both the miss path and the
/// bypass path.
#[tokio::test]
async fn unreachable_upstream_surfaces_bad_gateway() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let config = ServerConfig::default();
    let store = MemoryStore::open(&config.cache.name);

    let app = test::init_service(App::new().configure({
        let config = config.clone();
        let store = store.clone();
        move |f| {
            setup_service_config(f, &config, MemoryUpstream::offline(), store);
        }
    }))
    .await;

    // Cache miss falling through to a dead origin
    let req = test::TestRequest::get().uri("/missing.html").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 502);

    // Bypass path hitting the same dead origin
    let req = test::TestRequest::get().uri("/events").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 502);
}

/// Ensure a dead upstream does not break cache hits.
#[tokio::test]
async fn cache_hits_survive_a_dead_upstream() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();

    let config = ServerConfig::default();
    let store = MemoryStore::open(&config.cache.name);
    store
        .insert_all(vec![("/".to_string(), StoredResponse::from_str("index"))])
        .await
        .unwrap();

    let app = test::init_service(App::new().configure({
        let config = config.clone();
        let store = store.clone();
        move |f| {
            setup_service_config(f, &config, MemoryUpstream::offline(), store);
        }
    }))
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body = test::read_body(resp).await;
    assert_eq!(body, "index".as_bytes());
}
