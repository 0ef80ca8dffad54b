use std::fmt;

use post_cache_keys::PostKeys;
use post_models::Post;
use query_cache::{CacheResult, QueryCache, QueryKey};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Patch,
    Publish,
    Unpublish,
    Archive,
    Delete,
    BatchDelete,
    BatchUpdateStatus,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Patch => "patch",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Archive => "archive",
            Self::Delete => "delete",
            Self::BatchDelete => "batch_delete",
            Self::BatchUpdateStatus => "batch_update_status",
        }
    }

    /// Kinds whose result is the saved post.
    pub fn saves_post(&self) -> bool {
        matches!(
            self,
            Self::Create
                | Self::Update
                | Self::Patch
                | Self::Publish
                | Self::Unpublish
                | Self::Archive
        )
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheEffect {
    /// Mark every entry under the prefix for refetch.
    Invalidate(QueryKey),
    Write(QueryKey, Post),
    Remove(QueryKey),
}

/// Cache operations a successful mutation must perform.
///
/// Invalidations run before writes and removals, so a freshly written
/// detail entry is never marked stale by its own plan.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidationPlan {
    kind: MutationKind,
    effects: Vec<CacheEffect>,
}

impl InvalidationPlan {
    /// Plan for a mutation that returned the saved post.
    pub fn saved(kind: MutationKind, post: &Post) -> Self {
        let mut effects = vec![
            CacheEffect::Invalidate(PostKeys::lists()),
            CacheEffect::Invalidate(PostKeys::author(post.author_id)),
        ];

        match kind {
            MutationKind::Create => {
                effects.push(CacheEffect::Invalidate(PostKeys::latest_all()));
                if post.is_published() {
                    effects.extend([
                        CacheEffect::Invalidate(PostKeys::popular_all()),
                        CacheEffect::Invalidate(PostKeys::recommended_all()),
                    ]);
                }
                effects.push(CacheEffect::Invalidate(PostKeys::tags()));
            }
            MutationKind::Update | MutationKind::Patch => {
                effects.push(CacheEffect::Invalidate(PostKeys::latest_all()));
                effects.push(CacheEffect::Invalidate(PostKeys::popular_all()));
                effects
                    .push(CacheEffect::Invalidate(PostKeys::recommended_all()));
                effects.push(CacheEffect::Invalidate(PostKeys::tags()));
            }
            _ => {
                effects.push(CacheEffect::Invalidate(PostKeys::latest_all()));
                effects.push(CacheEffect::Invalidate(PostKeys::popular_all()));
                effects
                    .push(CacheEffect::Invalidate(PostKeys::recommended_all()));
            }
        }

        effects.push(CacheEffect::Write(PostKeys::detail(post.id), post.clone()));
        Self { kind, effects }
    }

    /// Plan for single or batch deletion of `ids`.
    pub fn removed(kind: MutationKind, ids: &[i64]) -> Self {
        let mut effects = vec![
            CacheEffect::Invalidate(PostKeys::lists()),
            CacheEffect::Invalidate(PostKeys::latest_all()),
            CacheEffect::Invalidate(PostKeys::popular_all()),
            CacheEffect::Invalidate(PostKeys::recommended_all()),
            CacheEffect::Invalidate(PostKeys::authors()),
            CacheEffect::Invalidate(PostKeys::tags()),
        ];
        effects.extend(
            ids.iter()
                .map(|&id| CacheEffect::Remove(PostKeys::detail(id))),
        );
        Self { kind, effects }
    }

    /// Plan for a batch status change of `ids`.
    pub fn status_changed(ids: &[i64]) -> Self {
        let mut effects: Vec<CacheEffect> = ids
            .iter()
            .map(|&id| CacheEffect::Invalidate(PostKeys::detail(id)))
            .collect();
        effects.extend([
            CacheEffect::Invalidate(PostKeys::lists()),
            CacheEffect::Invalidate(PostKeys::latest_all()),
            CacheEffect::Invalidate(PostKeys::popular_all()),
            CacheEffect::Invalidate(PostKeys::recommended_all()),
            CacheEffect::Invalidate(PostKeys::authors()),
        ]);
        Self {
            kind: MutationKind::BatchUpdateStatus,
            effects,
        }
    }

    pub fn kind(&self) -> MutationKind { self.kind }

    pub fn effects(&self) -> &[CacheEffect] { &self.effects }

    pub async fn apply(&self, cache: &QueryCache) -> CacheResult<()> {
        let (invalidations, rest): (Vec<_>, Vec<_>) = self
            .effects
            .iter()
            .partition(|effect| matches!(effect, CacheEffect::Invalidate(_)));

        for effect in invalidations.into_iter().chain(rest) {
            match effect {
                CacheEffect::Invalidate(prefix) => {
                    cache.invalidate(prefix).await;
                }
                CacheEffect::Write(key, post) => {
                    cache.write(key.clone(), post).await?;
                }
                CacheEffect::Remove(key) => {
                    cache.remove(key).await;
                }
            }
        }
        debug!("Applied {} cache effects for {}", self.effects.len(), self.kind);
        Ok(())
    }
}
