//! # Integration tests
//!
//! Everything runs against an in-memory SQLite database, so no external
//! services are needed.
//!
//! ```bash
//! cargo test                              # everything
//! cargo test --test integration_tests     # only this file
//! cargo test service_tests                # one group
//! ```

use std::sync::Arc;

use link_shortener::{
    cache::{cache_key, LinkCache, MemoryCache},
    config::{Config, ConfigBuilder},
    database::Database,
    services::AppState,
};

async fn test_state() -> (AppState, Arc<MemoryCache>) {
    let db = Database::in_memory().await.expect("in-memory database");
    let cache = Arc::new(MemoryCache::new());
    let state = AppState::with_cache(db, test_config(), cache.clone());
    (state, cache)
}

fn test_config() -> Config {
    ConfigBuilder::new().base_url("https://sho.rt").build()
}

mod shortener_tests {
    use link_shortener::shortener::{
        decode_to_id, encode_id, generate, is_valid_code, GeneratorError, ALPHABET,
    };

    #[test]
    fn test_generated_codes_are_distinct() {
        let codes: Vec<String> = (0..200).map(|_| generate(7).unwrap()).collect();
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_generate_rejects_bad_lengths() {
        assert_eq!(generate(0), Err(GeneratorError::InvalidLength(0)));
        assert_eq!(generate(-1), Err(GeneratorError::InvalidLength(-1)));
    }

    #[test]
    fn test_encode_decode_representative_ids() {
        for id in [0u64, 1, 100, 999_999] {
            assert_eq!(decode_to_id(&encode_id(id)).unwrap(), id);
        }
    }

    #[test]
    fn test_code_validation() {
        assert!(!is_valid_code(""));
        for bad in ["a b", "a@b", "a/b", "код", "日本"] {
            assert!(!is_valid_code(bad), "{bad} should be rejected");
        }
        let all = std::str::from_utf8(ALPHABET).unwrap();
        assert!(is_valid_code(all));
    }
}

mod config_tests {
    use link_shortener::config::{Config, ConfigBuilder, Environment};

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.port, 8080);
        assert_eq!(config.short_code_length, 7);
        assert_eq!(config.cache_ttl_seconds, 86_400);
        assert!(config.cache_enabled);
        assert!(config.environment.is_development());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validation() {
        assert!(ConfigBuilder::new().short_code_length(0).build_validated().is_err());
        assert!(ConfigBuilder::new().short_code_length(53).build_validated().is_err());
        assert!(ConfigBuilder::new().base_url("").build_validated().is_err());
        assert!(ConfigBuilder::new()
            .cache_enabled(false)
            .cache_ttl_seconds(0)
            .build_validated()
            .is_ok());
    }

    #[test]
    fn test_environment_conversion() {
        assert_eq!(Environment::from("PROD".to_string()), Environment::Production);
        assert_eq!(Environment::from("test".to_string()), Environment::Testing);
        assert_eq!(Environment::from("whatever".to_string()), Environment::Development);
    }
}

mod ip_tests {
    use axum::http::{HeaderMap, HeaderValue};
    use link_shortener::utils::resolve_client_ip;

    #[test]
    fn test_real_ip_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Real-IP", HeaderValue::from_static("1.2.3.4"));
        assert_eq!(resolve_client_ip(&headers, Some("10.0.0.1:54321")).as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn test_forwarded_for_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("5.6.7.8, 9.9.9.9"));
        assert_eq!(resolve_client_ip(&headers, Some("10.0.0.1:54321")).as_deref(), Some("5.6.7.8"));
    }

    #[test]
    fn test_socket_address() {
        assert_eq!(
            resolve_client_ip(&HeaderMap::new(), Some("10.0.0.1:54321")).as_deref(),
            Some("10.0.0.1")
        );
    }
}

mod service_tests {
    use super::*;
    use chrono::{Duration, Utc};
    use link_shortener::{
        error::AppError,
        models::{CreateLinkRequest, UpdateLinkRequest},
    };
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_duplicate_custom_code_is_taken() {
        let (state, _) = test_state().await;

        state
            .links
            .create_link(CreateLinkRequest::new("https://example.com/a").custom_code("mycode"))
            .await
            .unwrap();

        let err = state
            .links
            .create_link(CreateLinkRequest::new("https://example.com/b").custom_code("mycode"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CodeTaken(ref code) if code == "mycode"));
    }

    #[tokio::test]
    async fn test_resolve_from_cache_and_from_store() {
        let (state, cache) = test_state().await;

        let created = state
            .links
            .create_link(CreateLinkRequest::new("https://example.com/page"))
            .await
            .unwrap();
        let key = cache_key(&created.short_code);

        assert_eq!(
            cache.get(&key).await.unwrap().as_deref(),
            Some("https://example.com/page")
        );
        let from_cache = state.links.resolve(&created.short_code).await.unwrap();

        cache.delete(&key).await.unwrap();
        let from_store = state.links.resolve(&created.short_code).await.unwrap();

        assert_eq!(from_cache, "https://example.com/page");
        assert_eq!(from_store, from_cache);
        assert!(cache.get(&key).await.unwrap().is_some(), "miss repopulates");
    }

    #[tokio::test]
    async fn test_expired_link() {
        let (state, cache) = test_state().await;

        state
            .links
            .create_link(
                CreateLinkRequest::new("https://example.com")
                    .custom_code("old")
                    .expires_at(Utc::now() - Duration::hours(1)),
            )
            .await
            .unwrap();

        assert!(cache.get(&cache_key("old")).await.unwrap().is_none());
        assert!(matches!(state.links.resolve("old").await, Err(AppError::Expired(_))));
        assert!(matches!(
            state.links.get_link_by_code("old").await,
            Err(AppError::Expired(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let (state, _) = test_state().await;

        assert!(matches!(state.links.resolve("nope").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_click_increments_once() {
        let (state, _) = test_state().await;

        let created = state
            .links
            .create_link(CreateLinkRequest::new("https://example.com"))
            .await
            .unwrap();

        state
            .analytics
            .record_click(created.id, Some("1.2.3.4".to_string()), None, None)
            .await
            .unwrap();

        let link = state.links.get_link_by_id(created.id).await.unwrap();
        assert_eq!(link.clicks_count, 1);
        assert!(link.last_clicked_at.is_some());
    }

    #[tokio::test]
    async fn test_stats_without_clicks() {
        let (state, _) = test_state().await;

        let created = state
            .links
            .create_link(CreateLinkRequest::new("https://example.com"))
            .await
            .unwrap();

        let stats = state.analytics.get_stats(created.id).await.unwrap();
        assert_eq!(stats.total_clicks, 0);
        assert_eq!(stats.unique_ips, 0);
        assert!(stats.clicks_by_date.is_empty());
        assert!(stats.clicks_by_country.is_empty());
        assert!(stats.recent_clicks.is_empty());
    }

    #[tokio::test]
    async fn test_stats_aggregate_distinct_ips() {
        let (state, _) = test_state().await;

        let created = state
            .links
            .create_link(CreateLinkRequest::new("https://example.com"))
            .await
            .unwrap();

        for ip in ["1.1.1.1", "1.1.1.1", "2.2.2.2"] {
            state
                .analytics
                .record_click(created.id, Some(ip.to_string()), None, None)
                .await
                .unwrap();
        }

        let stats = state.analytics.get_stats(created.id).await.unwrap();
        assert_eq!(stats.total_clicks, 3);
        assert_eq!(stats.unique_ips, 2);
        assert_eq!(stats.clicks_by_date.len(), 1);
        assert_eq!(stats.clicks_by_date[0].count, 3);
        assert_eq!(stats.recent_clicks.len(), 3);
    }

    #[tokio::test]
    async fn test_listing_normalises_paging() {
        let (state, _) = test_state().await;

        for i in 0..55 {
            state
                .links
                .create_link(CreateLinkRequest::new(format!("https://example.com/{i}")))
                .await
                .unwrap();
        }

        assert_eq!(state.links.list_links(0, 0).await.unwrap().len(), 50);
        assert_eq!(state.links.list_links(-5, 0).await.unwrap().len(), 50);
        assert_eq!(state.links.list_links(500, 0).await.unwrap().len(), 50);

        let first_page = state.links.list_links(10, 0).await.unwrap();
        let negative_offset = state.links.list_links(10, -3).await.unwrap();
        assert_eq!(first_page, negative_offset);
        assert_eq!(first_page[0].original_url, "https://example.com/54");

        assert_eq!(state.links.list_links(10, 50).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_delete_evicts_and_forgets() {
        let (state, cache) = test_state().await;

        let created = state
            .links
            .create_link(CreateLinkRequest::new("https://example.com").custom_code("gone"))
            .await
            .unwrap();

        state.links.delete_link(created.id).await.unwrap();

        assert!(cache.get(&cache_key("gone")).await.unwrap().is_none());
        assert!(matches!(state.links.resolve("gone").await, Err(AppError::NotFound(_))));
        assert!(matches!(
            state.links.delete_link(created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_extends_expired_link() {
        let (state, _) = test_state().await;

        let created = state
            .links
            .create_link(
                CreateLinkRequest::new("https://example.com")
                    .custom_code("revive")
                    .expires_at(Utc::now() - Duration::minutes(1)),
            )
            .await
            .unwrap();

        state
            .links
            .update_link(
                created.id,
                UpdateLinkRequest {
                    original_url: None,
                    expires_at: Some(Utc::now() + Duration::days(1)),
                },
            )
            .await
            .unwrap();

        assert_eq!(state.links.resolve("revive").await.unwrap(), "https://example.com");
    }
}

mod router_tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use link_shortener::{
        api::router,
        models::{ApiResponse, CreateLinkRequest, LinkResponse, UrlStats},
    };
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    async fn app() -> (Router, AppState) {
        let (state, _) = test_state().await;
        (router(state.clone()), state)
    }

    async fn json_body<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/urls")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_redirect_records_click() {
        let (app, state) = app().await;

        let response = app
            .clone()
            .oneshot(create_request(
                r#"{"original_url":"https://example.com/target","custom_code":"go"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: ApiResponse<LinkResponse> = json_body(response).await;
        assert_eq!(created.data.short_url, "https://sho.rt/go");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/go")
                    .header("X-Real-IP", "1.2.3.4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://example.com/target"
        );

        // Recording is detached; poll until it lands.
        let mut clicks = 0;
        for _ in 0..50 {
            clicks = state
                .links
                .get_link_by_id(created.data.id)
                .await
                .unwrap()
                .clicks_count;
            if clicks == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(clicks, 1);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/urls/{}/stats", created.data.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stats: ApiResponse<UrlStats> = json_body(response).await;
        assert_eq!(stats.data.total_clicks, 1);
        assert_eq!(
            stats.data.recent_clicks[0].ip_address.as_deref(),
            Some("1.2.3.4")
        );
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (app, _) = app().await;

        let cases = [
            (create_request(r#"{"original_url":"not a url"}"#), StatusCode::BAD_REQUEST),
            (create_request("{broken"), StatusCode::BAD_REQUEST),
            (
                Request::builder().uri("/missing").body(Body::empty()).unwrap(),
                StatusCode::NOT_FOUND,
            ),
            (
                Request::builder().uri("/api/v1/urls/999").body(Body::empty()).unwrap(),
                StatusCode::NOT_FOUND,
            ),
            (
                Request::builder()
                    .uri("/api/v1/urls/999/stats")
                    .body(Body::empty())
                    .unwrap(),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (request, expected) in cases {
            let uri = request.uri().clone();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), expected, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_conflict_and_gone() {
        let (app, _) = app().await;

        let body = r#"{"original_url":"https://example.com","custom_code":"dup"}"#;
        let first = app.clone().oneshot(create_request(body)).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let second = app.clone().oneshot(create_request(body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);

        let expired = app
            .clone()
            .oneshot(create_request(
                r#"{"original_url":"https://example.com","custom_code":"past","expires_at":"2000-01-01T00:00:00Z"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(expired.status(), StatusCode::CREATED);

        let response = app
            .oneshot(Request::builder().uri("/past").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_reserved_custom_code_is_bad_request() {
        let (app, _) = app().await;

        for code in ["health", "api"] {
            let body = format!(r#"{{"original_url":"https://example.com","custom_code":"{code}"}}"#);
            let response = app.clone().oneshot(create_request(&body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{code}");
        }

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unparseable_paging_uses_defaults() {
        let (app, state) = app().await;

        for i in 0..3 {
            state
                .links
                .create_link(CreateLinkRequest::new(format!("https://example.com/{i}")))
                .await
                .unwrap();
        }

        for uri in [
            "/api/v1/urls?limit=abc",
            "/api/v1/urls?offset=x",
            "/api/v1/urls?limit=abc&offset=x",
            "/api/v1/urls?limit=",
        ] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let listed: ApiResponse<Vec<LinkResponse>> = json_body(response).await;
            assert_eq!(listed.data.len(), 3, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_health_and_request_id() {
        let (app, _) = app().await;

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}

mod concurrency_tests {
    use super::*;
    use link_shortener::{error::AppError, models::CreateLinkRequest};
    use std::path::PathBuf;

    /// SQLite file under the temp dir, removed with its WAL files on drop.
    struct TempDb {
        path: PathBuf,
    }

    impl TempDb {
        fn new() -> Self {
            let path = std::env::temp_dir()
                .join(format!("link-shortener-{}.db", nanoid::nanoid!(8)));
            Self { path }
        }

        async fn open(&self) -> Database {
            let db = Database::connect(format!("sqlite://{}?mode=rwc", self.path.display()))
                .await
                .unwrap();
            db.migrate().await.unwrap();
            db
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = self.path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_clicks_are_all_counted() {
        const CLICKS: i64 = 50;

        let temp = TempDb::new();
        let state = AppState::new(temp.open().await, test_config());

        let link = state
            .links
            .create_link(CreateLinkRequest::new("https://example.com").custom_code("busy"))
            .await
            .unwrap();

        let handles: Vec<_> = (0..CLICKS)
            .map(|i| {
                state.analytics.dispatch_click(
                    link.id,
                    Some(format!("10.0.0.{i}")),
                    Some("load".to_string()),
                    None,
                )
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let reloaded = state.links.get_link_by_id(link.id).await.unwrap();
        assert_eq!(reloaded.clicks_count, CLICKS);

        let stats = state.analytics.get_stats(link.id).await.unwrap();
        assert_eq!(stats.total_clicks, CLICKS);
        assert_eq!(stats.unique_ips, CLICKS);

        state.db.pool().close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_custom_code_has_one_winner() {
        let temp = TempDb::new();
        let state = AppState::new(temp.open().await, test_config());

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let links = state.links.clone();
                tokio::spawn(async move {
                    links
                        .create_link(
                            CreateLinkRequest::new(format!("https://example.com/{i}"))
                                .custom_code("contended"),
                        )
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::CodeTaken(code)) => assert_eq!(code, "contended"),
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(created, 1);

        state.db.pool().close().await;
    }
}

mod backend_tests {
    use super::*;
    use link_shortener::error::AppError;

    #[tokio::test]
    async fn test_connect_with_unreachable_redis_fails() {
        let db = Database::in_memory().await.unwrap();
        let config = ConfigBuilder::new()
            .base_url("https://sho.rt")
            .redis_url("redis://127.0.0.1:1")
            .build();

        let err = AppState::connect(db, config).await.err().unwrap();
        assert!(matches!(err, AppError::Config(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connect_ignores_redis_when_cache_disabled() {
        let db = Database::in_memory().await.unwrap();
        let config = ConfigBuilder::new()
            .base_url("https://sho.rt")
            .cache_enabled(false)
            .redis_url("redis://127.0.0.1:1")
            .build();

        let state = AppState::connect(db, config).await.unwrap();

        let key = cache_key("abc");
        state
            .cache
            .set(&key, "https://example.com", std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(state.cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_connect_defaults_to_memory_cache() {
        let db = Database::in_memory().await.unwrap();
        let state = AppState::connect(db, test_config()).await.unwrap();

        state
            .cache
            .set(&cache_key("abc"), "https://example.com", std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(
            state.cache.get(&cache_key("abc")).await.unwrap().as_deref(),
            Some("https://example.com")
        );
    }
}

mod property_tests {
    use link_shortener::shortener::{decode_to_id, encode_id, generate, is_valid_code};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn generated_codes_are_valid(len in 1i64..=52) {
            let code = generate(len).unwrap();
            prop_assert_eq!(code.len() as i64, len);
            prop_assert!(is_valid_code(&code));
        }

        #[test]
        fn base62_roundtrip(id: u64) {
            prop_assert_eq!(decode_to_id(&encode_id(id)).ok(), Some(id));
        }

        #[test]
        fn codes_with_foreign_symbols_are_rejected(
            prefix in "[0-9A-Za-z]{0,5}",
            bad in "[ @/#?%\\-_.~]",
            suffix in "[0-9A-Za-z]{0,5}",
        ) {
            let code = format!("{prefix}{bad}{suffix}");
            prop_assert!(!is_valid_code(&code));
        }
    }
}
