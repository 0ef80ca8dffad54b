mod cli;
mod config;

use std::{sync::Arc, time::Duration};

use clap::Parser;
use http_client::RequestOptions;
use post_command_handlers::{
    Mutation, MutationCallbacks, PostMutationCoordinator,
};
use post_commands::{CreatePostCommand, UpdatePostCommand};
use post_dao::PostDao;
use post_models::{Post, PostStatus};
use post_queries::PostQueryParams;
use post_query_handlers::{PostQueryHandler, QueryState};
use query_cache::QueryCache;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{cli::Cli, config::DemoConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config =
        DemoConfig::load(cli.config_path().as_deref())?.with_latency(cli.latency_ms);
    info!("Store latency: {:?}", config.store.latency);

    let store = Arc::new(PostDao::new(config.store.clone()));
    let cache = QueryCache::new(&config.cache);
    let queries =
        PostQueryHandler::new(store.clone(), cache.clone(), config.query.clone());
    let mutations = PostMutationCoordinator::new(store, cache.clone());

    let mut options = RequestOptions::new();
    if let Some(ms) = cli.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    run(&queries, &mutations, &options).await?;

    info!("{} cache entries at exit", cache.keys().len());
    Ok(())
}

async fn run(
    queries: &PostQueryHandler<PostDao>,
    mutations: &PostMutationCoordinator<PostDao>, options: &RequestOptions,
) -> anyhow::Result<()> {
    let all = PostQueryParams::new();

    let page = queries
        .list_paginated(&all.clone().with_page(1, 5), options)
        .await?;
    info!(
        "Page {}/{}: {} of {} posts",
        page.page,
        page.total_pages,
        page.items.len(),
        page.total
    );

    let tags = queries.popular_tags(5, options).await?;
    for entry in &tags {
        info!("Tag {} used {} times", entry.tag, entry.count);
    }

    let react = queries
        .search(&all.clone().with_search("react"), options)
        .await?;
    info!("Search \"react\" matched {} posts", react.len());

    // Second read is served from the cache.
    queries.list(&all, options).await?;
    queries.list(&all, options).await?;

    let create = Mutation::<Post>::new();
    let created = create
        .run(
            mutations.create(
                CreatePostCommand::new(
                    "Caching in practice",
                    "Stale times, invalidation and the cost of a refetch.",
                )
                .with_tags(["Cache", "Architecture"]),
                options,
            ),
            MutationCallbacks::new()
                .on_success(|post: &Post| info!("Draft {} saved", post.id))
                .on_error(|err| warn!("Create failed: {}", err)),
        )
        .await?;

    let listed = queries.list(&all, options).await?;
    info!(
        "List now holds {} posts, first is {}",
        listed.len(),
        listed.first().map_or(0, |p| p.id)
    );

    mutations
        .update(created.id, UpdatePostCommand::title("Caching, in practice"), options)
        .await?;
    let published = mutations.publish(created.id, options).await?;
    info!("Post {} is {}", published.id, published.status);

    let latest = queries.latest(3, options).await?;
    info!(
        "Latest: {:?}",
        latest.iter().map(|p| p.id).collect::<Vec<_>>()
    );

    let picked = queries.recommended(Some(2), 3, options).await?;
    info!(
        "Recommended for author 2: {:?}",
        picked.iter().map(|p| p.id).collect::<Vec<_>>()
    );

    let mut pages = queries.pages(&all.clone().with_page(1, 4));
    while pages.fetch_next_page(options).await?.is_some() {}
    info!(
        "Scrolled {} pages, {} posts",
        pages.pages().len(),
        pages.items().count()
    );

    mutations.delete(created.id, options).await?;
    let gone = QueryState::resolve(queries.detail(created.id, options)).await;
    if let Some(err) = gone.error {
        info!("Post {} after delete: {}", created.id, err);
    }

    let drafts = queries
        .count(&all.with_status(PostStatus::Draft), options)
        .await?;
    info!("{} drafts remain", drafts);
    Ok(())
}
