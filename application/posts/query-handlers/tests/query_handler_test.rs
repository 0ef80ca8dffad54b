use std::{sync::Arc, time::Duration};

use anyhow::Result;
use common_errors::ErrorKind;
use database_traits::GenericDao;
use http_client::{ApiClient, RequestOptions, RetryPolicy, StatusCode, TokenStore};
use post_cache_keys::PostKeys;
use post_commands::UpdatePostCommand;
use post_dao::{MockStoreConfig, PostDao, RemotePostDao};
use post_errors::PostError;
use post_queries::PostQueryParams;
use post_query_handlers::{PostQueryHandler, QueryConfig, QueryState};
use query_cache::QueryCache;
use serde_json::json;
use test_utils::{StubTransport, init_test_tracing, published};

fn opts() -> RequestOptions { RequestOptions::new() }

fn seeded() -> (Arc<PostDao>, PostQueryHandler<PostDao>) {
    init_test_tracing();
    let store = Arc::new(PostDao::new(MockStoreConfig::without_latency()));
    let handler = PostQueryHandler::new(
        store.clone(),
        QueryCache::unbounded(),
        QueryConfig::default(),
    );
    (store, handler)
}

fn ids(posts: &[post_models::Post]) -> Vec<i64> {
    posts.iter().map(|p| p.id).collect()
}

#[tokio::test]
async fn test_second_read_is_served_from_cache() -> Result<()> {
    let (store, handler) = seeded();
    let params = PostQueryParams::new();

    let first = handler.list(&params, &opts()).await?;
    // Bypass the handler so only a refetch could observe the change.
    store
        .update(1, UpdatePostCommand::title("Changed behind the cache"), &opts())
        .await?;
    let second = handler.list(&params, &opts()).await?;

    assert_eq!(first, second);

    handler.cache().invalidate(&PostKeys::lists()).await;
    let third = handler.list(&params, &opts()).await?;
    assert_eq!(third[0].title, "Changed behind the cache");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stale_entries_are_refetched() -> Result<()> {
    let (store, handler) = seeded();

    handler.detail(2, &opts()).await?;
    store
        .update(2, UpdatePostCommand::title("Fresh title"), &opts())
        .await?;

    tokio::time::advance(Duration::from_secs(4 * 60)).await;
    assert_ne!(handler.detail(2, &opts()).await?.title, "Fresh title");

    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(handler.detail(2, &opts()).await?.title, "Fresh title");
    Ok(())
}

#[tokio::test]
async fn test_paginated_list_reports_totals() -> Result<()> {
    let (_, handler) = seeded();

    let first = handler
        .list_paginated(&PostQueryParams::new(), &opts())
        .await?;
    assert_eq!(first.total, 12);
    assert_eq!(first.page, 1);
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_pages, 2);

    let second = handler
        .list_paginated(&PostQueryParams::new().with_page(2, 10), &opts())
        .await?;
    assert_eq!(ids(&second.items), vec![11, 12]);
    Ok(())
}

#[tokio::test]
async fn test_author_and_tag_queries() -> Result<()> {
    let (_, handler) = seeded();

    let by_author = handler
        .by_author(1, &PostQueryParams::new(), &opts())
        .await?;
    assert_eq!(ids(&by_author), vec![1, 3, 6, 9, 12]);

    let tagged = handler
        .by_tags(&["Backend".to_string()], &PostQueryParams::new(), &opts())
        .await?;
    assert_eq!(ids(&tagged), vec![7, 12]);

    assert!(
        handler
            .cache()
            .keys()
            .iter()
            .any(|key| key.starts_with(&PostKeys::author(1)))
    );
    Ok(())
}

#[tokio::test]
async fn test_aggregates_through_the_cache() -> Result<()> {
    let (_, handler) = seeded();

    assert_eq!(ids(&handler.popular(3, &opts()).await?), vec![12, 10, 8]);
    assert_eq!(ids(&handler.latest(2, &opts()).await?), vec![1, 2]);

    let tags = handler.popular_tags(3, &opts()).await?;
    let flat: Vec<_> = tags.iter().map(|t| (t.tag.as_str(), t.count)).collect();
    assert_eq!(flat, vec![("Frontend", 5), ("Architecture", 2), ("Backend", 2)]);

    let all = handler.all_tags(&opts()).await?;
    assert!(all.windows(2).all(|w| w[0] < w[1]));

    let count = handler
        .count(&PostQueryParams::new().with_search("REACT"), &opts())
        .await?;
    let search = handler
        .search(&PostQueryParams::new().with_search("react"), &opts())
        .await?;
    assert_eq!(count, search.len());
    Ok(())
}

#[tokio::test]
async fn test_not_found_is_not_cached() -> Result<()> {
    let (_, handler) = seeded();

    let err = handler.detail(99, &opts()).await.unwrap_err();

    assert!(matches!(err, PostError::NotFound { post_id: 99 }));
    assert!(handler.cache().read_stale::<serde_json::Value>(&PostKeys::detail(99)).await?.is_none());

    let state = QueryState::resolve(handler.detail(99, &opts())).await;
    assert!(!state.is_loading);
    assert_eq!(state.error.map(|e| e.code()), Some(404));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_timeout_settles_as_error_without_caching() -> Result<()> {
    init_test_tracing();
    let store = Arc::new(PostDao::new(MockStoreConfig::default()));
    let handler =
        PostQueryHandler::new(store, QueryCache::unbounded(), QueryConfig::default());

    let err = handler
        .detail(1, &opts().with_timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();

    assert!(matches!(err, PostError::Timeout(_)));
    assert!(handler.cache().keys().is_empty());

    let post = handler.detail(1, &opts()).await?;
    assert_eq!(post.id, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_reads_retry_server_errors_when_asked() -> Result<()> {
    init_test_tracing();
    let transport = StubTransport::new();
    transport
        .status(StatusCode::SERVICE_UNAVAILABLE, json!({"message": "busy"}))
        .ok(&published(5));
    let client = ApiClient::new(Arc::new(transport.clone()), Arc::new(TokenStore::new()));
    let config = QueryConfig {
        retry: RetryPolicy::new(0, Duration::from_millis(10)),
        ..QueryConfig::default()
    };
    let handler = PostQueryHandler::new(
        Arc::new(RemotePostDao::new(client)),
        QueryCache::unbounded(),
        config,
    );

    let post = handler.detail(5, &opts().with_retries(1)).await?;

    assert_eq!(post.id, 5);
    assert_eq!(transport.requests().len(), 2);
    assert!(transport.requests().iter().all(|r| r.path == "/posts/5"));
    Ok(())
}

#[tokio::test]
async fn test_server_error_without_retries_surfaces() -> Result<()> {
    init_test_tracing();
    let transport = StubTransport::new();
    transport.status(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "boom"}));
    let client = ApiClient::new(Arc::new(transport.clone()), Arc::new(TokenStore::new()));
    let handler = PostQueryHandler::new(
        Arc::new(RemotePostDao::new(client)),
        QueryCache::unbounded(),
        QueryConfig::default(),
    );

    let err = handler.list(&PostQueryParams::new(), &opts()).await.unwrap_err();
    let app: common_errors::AppError = err.into();

    assert_eq!(app.kind(), ErrorKind::Server);
    assert_eq!(app.message(), "boom");
    assert_eq!(transport.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_paginated_author_and_search_reads() -> Result<()> {
    let (_, handler) = seeded();

    let second = handler
        .by_author_paginated(1, &PostQueryParams::new().with_page(2, 2), &opts())
        .await?;
    assert_eq!(ids(&second.items), vec![6, 9]);
    assert_eq!((second.total, second.total_pages), (5, 3));
    assert!(second.has_next());

    let params = PostQueryParams::new().with_search("react").with_page(1, 1);
    let found = handler.search_paginated(&params, &opts()).await?;
    assert_eq!(found.total, handler.count(&params, &opts()).await?);
    assert!(found.items.len() <= 1);

    let keys = handler.cache().keys();
    assert!(keys.contains(&PostKeys::by_author_paged(1, &PostQueryParams::new().with_page(2, 2))));
    assert!(keys.contains(&PostKeys::search_paged(&params)));
    Ok(())
}

#[tokio::test]
async fn test_empty_filters_never_reach_the_store() -> Result<()> {
    init_test_tracing();
    let transport = StubTransport::new();
    let client = ApiClient::new(Arc::new(transport.clone()), Arc::new(TokenStore::new()));
    let handler = PostQueryHandler::new(
        Arc::new(RemotePostDao::new(client)),
        QueryCache::unbounded(),
        QueryConfig::default(),
    );

    let tagged = handler.by_tags(&[], &PostQueryParams::new(), &opts()).await?;
    let blank = handler
        .by_tags(&[String::new()], &PostQueryParams::new(), &opts())
        .await?;
    let searched = handler
        .search(&PostQueryParams::new().with_search("").with_page(1, 5), &opts())
        .await?;
    let paged = handler
        .search_paginated(&PostQueryParams::new(), &opts())
        .await?;

    assert!(tagged.is_empty() && blank.is_empty() && searched.is_empty());
    assert!(paged.items.is_empty());
    assert_eq!((paged.total, paged.page, paged.page_size), (0, 1, 10));
    assert!(transport.requests().is_empty());
    assert!(handler.cache().keys().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_recommended_has_its_own_key_and_window() -> Result<()> {
    init_test_tracing();
    let transport = StubTransport::new();
    transport.ok(&vec![published(4)]).ok(&vec![published(8)]);
    let client = ApiClient::new(Arc::new(transport.clone()), Arc::new(TokenStore::new()));
    let handler = PostQueryHandler::new(
        Arc::new(RemotePostDao::new(client)),
        QueryCache::unbounded(),
        QueryConfig::default(),
    );

    assert_eq!(ids(&handler.recommended(Some(2), 3, &opts()).await?), vec![4]);
    assert_eq!(
        transport.last().map(|r| r.path),
        Some("/posts/recommended?limit=3&userId=2".to_string())
    );

    tokio::time::advance(Duration::from_secs(4 * 60)).await;
    assert_eq!(ids(&handler.recommended(Some(2), 3, &opts()).await?), vec![4]);
    assert_eq!(transport.requests().len(), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(ids(&handler.recommended(Some(2), 3, &opts()).await?), vec![8]);
    assert!(
        handler
            .cache()
            .keys()
            .iter()
            .all(|key| key.starts_with(&PostKeys::recommended_all()))
    );
    Ok(())
}
