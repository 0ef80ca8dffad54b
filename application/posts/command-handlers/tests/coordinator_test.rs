use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::Result;
use database_traits::GenericDao;
use http_client::RequestOptions;
use post_cache_keys::PostKeys;
use post_command_handlers::{
    Mutation, MutationCallbacks, PostMutationCoordinator,
};
use post_commands::{
    BatchDeletePostsCommand, BatchUpdateStatusCommand, CreatePostCommand,
    UpdatePostCommand,
};
use post_dao::{MockStoreConfig, PostDao};
use post_errors::PostError;
use post_models::{Post, PostStatus};
use post_queries::PostQueryParams;
use post_query_handlers::{PostQueryHandler, QueryConfig};
use query_cache::{EntryState, QueryCache};
use test_utils::init_test_tracing;

struct Harness {
    store: Arc<PostDao>,
    queries: PostQueryHandler<PostDao>,
    mutations: PostMutationCoordinator<PostDao>,
}

fn harness(config: MockStoreConfig) -> Harness {
    init_test_tracing();
    let store = Arc::new(PostDao::new(config));
    let cache = QueryCache::unbounded();
    Harness {
        queries: PostQueryHandler::new(
            store.clone(),
            cache.clone(),
            QueryConfig::default(),
        ),
        mutations: PostMutationCoordinator::new(store.clone(), cache),
        store,
    }
}

fn opts() -> RequestOptions { RequestOptions::new() }

fn ids(posts: &[Post]) -> Vec<i64> { posts.iter().map(|p| p.id).collect() }

#[tokio::test]
async fn test_list_reflects_create_once_success_fires() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());
    let params = PostQueryParams::new();
    assert_eq!(h.queries.list(&params, &opts()).await?.len(), 12);

    let cache = h.queries.cache().clone();
    let keys_at_callback = Arc::new(Mutex::new(Vec::new()));
    let seen = keys_at_callback.clone();

    let mutation = Mutation::new();
    let post = mutation
        .run(
            h.mutations
                .create(CreatePostCommand::new("Fresh", "Body"), &opts()),
            MutationCallbacks::new().on_success(move |_: &Post| {
                *seen.lock().unwrap() = cache.keys();
            }),
        )
        .await?;

    // The detail entry is written by the plan, so seeing it proves the
    // callback ran after the cache effects.
    assert!(keys_at_callback.lock().unwrap().contains(&PostKeys::detail(post.id)));

    let list = h.queries.list(&params, &opts()).await?;
    assert_eq!(list.len(), 13);
    assert_eq!(list[0].id, post.id);
    Ok(())
}

#[tokio::test]
async fn test_failed_mutation_leaves_cache_untouched() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());
    let params = PostQueryParams::new();
    h.queries.list(&params, &opts()).await?;
    h.queries.detail(1, &opts()).await?;
    let keys_before = h.queries.cache().keys();

    let errors = Arc::new(AtomicUsize::new(0));
    let counter = errors.clone();
    let mutation = Mutation::<Post>::new();

    let result = mutation
        .run(
            h.mutations
                .update(99, UpdatePostCommand::title("Nope"), &opts()),
            MutationCallbacks::new()
                .on_success(|_| panic!("update of a missing post succeeded"))
                .on_error(move |err| {
                    assert_eq!(err.code(), 404);
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .await;

    assert!(matches!(result, Err(PostError::NotFound { post_id: 99 })));
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(mutation.error().map(|e| e.code()), Some(404));
    assert_eq!(h.queries.cache().keys(), keys_before);
    assert_eq!(
        h.queries.cache().state(&PostKeys::list(&params)).await,
        Some(EntryState::Fresh)
    );
    Ok(())
}

#[tokio::test]
async fn test_validation_failure_does_not_touch_store_or_cache() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());
    h.queries.list(&PostQueryParams::new(), &opts()).await?;

    let err = h
        .mutations
        .create(CreatePostCommand::new("", "Body"), &opts())
        .await
        .unwrap_err();

    assert!(matches!(err, PostError::Validation { .. }));
    assert_eq!(h.store.len().await, 12);
    assert_eq!(
        h.queries
            .cache()
            .state(&PostKeys::list(&PostQueryParams::new()))
            .await,
        Some(EntryState::Fresh)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_timeout_settles_without_mutating() -> Result<()> {
    let h = harness(MockStoreConfig::default());
    h.queries.list(&PostQueryParams::new(), &opts()).await?;
    let keys_before = h.queries.cache().keys();

    let err = h
        .mutations
        .create(
            CreatePostCommand::new("Slow", "Body"),
            &opts().with_timeout(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PostError::Timeout(_)));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.store.len().await, 12);
    assert_eq!(h.queries.cache().keys(), keys_before);

    let next = h
        .mutations
        .create(CreatePostCommand::new("Next", "Body"), &opts())
        .await?;
    assert_eq!(next.id, 13);
    Ok(())
}

#[tokio::test]
async fn test_update_writes_detail_and_preserves_fields() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());
    let before = h.queries.detail(5, &opts()).await?;

    let updated = h
        .mutations
        .update(5, UpdatePostCommand::title("X"), &opts())
        .await?;

    assert_eq!(updated.title, "X");
    assert!(updated.updated_at >= before.updated_at);
    assert_eq!(
        Post {
            title: before.title.clone(),
            updated_at: before.updated_at,
            ..updated.clone()
        },
        before
    );

    let cached: Option<Post> =
        h.queries.cache().read(&PostKeys::detail(5)).await?;
    assert_eq!(cached, Some(updated));
    Ok(())
}

#[tokio::test]
async fn test_publish_refreshes_latest_and_author_lists() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());
    let latest = h.queries.latest(3, &opts()).await?;
    assert_eq!(ids(&latest), vec![1, 2, 3]);
    let by_author = h
        .queries
        .by_author(3, &PostQueryParams::new().with_status(PostStatus::Published), &opts())
        .await?;
    assert_eq!(ids(&by_author), vec![10]);

    h.mutations.publish(4, &opts()).await?;

    let by_author = h
        .queries
        .by_author(3, &PostQueryParams::new().with_status(PostStatus::Published), &opts())
        .await?;
    assert_eq!(ids(&by_author), vec![4, 10]);
    assert_eq!(
        h.queries.cache().state(&PostKeys::latest(3)).await,
        Some(EntryState::Invalidated)
    );
    Ok(())
}

#[tokio::test]
async fn test_archive_and_unpublish() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());

    let archived = h.mutations.archive(1, &opts()).await?;
    assert_eq!(archived.status, PostStatus::Archived);

    let draft = h.mutations.unpublish(2, &opts()).await?;
    assert_eq!(draft.status, PostStatus::Draft);

    let popular = h.queries.popular(20, &opts()).await?;
    assert!(!popular.iter().any(|p| p.id == 1 || p.id == 2));
    Ok(())
}

#[tokio::test]
async fn test_delete_removes_detail_and_refreshes_lists() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());
    h.queries.detail(6, &opts()).await?;
    h.queries.popular(5, &opts()).await?;

    h.mutations.delete(6, &opts()).await?;

    assert!(h.queries.cache().state(&PostKeys::detail(6)).await.is_none());
    assert!(matches!(
        h.queries.detail(6, &opts()).await,
        Err(PostError::NotFound { post_id: 6 })
    ));
    assert!(!ids(&h.queries.popular(5, &opts()).await?).contains(&6));
    assert_eq!(h.queries.list(&PostQueryParams::new(), &opts()).await?.len(), 11);
    Ok(())
}

#[tokio::test]
async fn test_batch_delete_is_atomic_through_coordinator() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());
    h.queries.detail(1, &opts()).await?;

    let err = h
        .mutations
        .batch_delete(BatchDeletePostsCommand::new([1, 500]), &opts())
        .await
        .unwrap_err();
    assert!(matches!(err, PostError::NotFound { post_id: 500 }));
    assert_eq!(
        h.queries.cache().state(&PostKeys::detail(1)).await,
        Some(EntryState::Fresh)
    );

    h.mutations
        .batch_delete(BatchDeletePostsCommand::new([1, 2]), &opts())
        .await?;
    assert!(h.queries.cache().state(&PostKeys::detail(1)).await.is_none());
    assert_eq!(h.store.len().await, 10);
    Ok(())
}

#[tokio::test]
async fn test_batch_status_invalidates_details() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());
    h.queries.detail(4, &opts()).await?;
    h.queries.detail(7, &opts()).await?;

    h.mutations
        .batch_update_status(
            BatchUpdateStatusCommand::new([4, 7], PostStatus::Published),
            &opts(),
        )
        .await?;

    assert_eq!(
        h.queries.cache().state(&PostKeys::detail(4)).await,
        Some(EntryState::Invalidated)
    );
    assert_eq!(h.queries.detail(7, &opts()).await?.status, PostStatus::Published);
    assert_eq!(
        h.queries
            .count(&PostQueryParams::new().with_status(PostStatus::Published), &opts())
            .await?,
        10
    );
    Ok(())
}

#[tokio::test]
async fn test_ids_grow_across_creates_and_deletes() -> Result<()> {
    let h = harness(MockStoreConfig::without_latency());
    let mut issued = Vec::new();

    for round in 0..4 {
        let post = h
            .mutations
            .create(CreatePostCommand::new(format!("Round {round}"), "Body"), &opts())
            .await?;
        issued.push(post.id);
        h.mutations.delete(post.id, &opts()).await?;
        h.mutations.delete(12 - round, &opts()).await?;
    }

    assert_eq!(issued, vec![13, 14, 15, 16]);
    let live = ids(&h.store.all(&opts()).await?);
    let mut unique = live.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), live.len());
    Ok(())
}
