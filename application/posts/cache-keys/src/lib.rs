use post_queries::PostQueryParams;
use query_cache::QueryKey;

/// Key namespace for every cached post query.
///
/// ```text
/// posts
/// ├── list ── {params} | paged:{params} | search:{params} | search:paged:{params}
/// │          | tagged:[tags]:{params} | count:{params}
/// ├── detail ── {id}
/// ├── author ── {id} ── {params} | paged:{params}
/// ├── popular ── {limit}
/// ├── latest ── {limit}
/// ├── recommended ── {user id}|anyone ── {limit}
/// └── tags ── all | popular:{limit}
/// ```
///
/// Every list-shaped query sits under `posts:list`, so invalidating
/// [`PostKeys::lists`] refreshes searches, tag filters and counts too.
pub struct PostKeys;

impl PostKeys {
    pub fn all() -> QueryKey { QueryKey::root("posts") }

    pub fn lists() -> QueryKey { Self::all().name("list") }

    pub fn list(params: &PostQueryParams) -> QueryKey {
        Self::lists().params(&params.normalized())
    }

    /// A page plus totals; kept apart from [`PostKeys::list`] because the
    /// payload shape differs.
    pub fn paginated(params: &PostQueryParams) -> QueryKey {
        Self::lists().name("paged").params(&params.normalized())
    }

    pub fn search(params: &PostQueryParams) -> QueryKey {
        Self::lists().name("search").params(&params.normalized())
    }

    pub fn search_paged(params: &PostQueryParams) -> QueryKey {
        Self::lists()
            .name("search")
            .name("paged")
            .params(&params.normalized())
    }

    /// Tags are sorted so `[b, a]` and `[a, b]` share an entry.
    pub fn by_tags(tags: &[String], params: &PostQueryParams) -> QueryKey {
        let mut tags = tags.to_vec();
        tags.sort();
        tags.dedup();
        Self::lists()
            .name("tagged")
            .params(&tags)
            .params(&params.normalized())
    }

    pub fn count(params: &PostQueryParams) -> QueryKey {
        Self::lists()
            .name("count")
            .params(&params.without_pagination().normalized())
    }

    pub fn details() -> QueryKey { Self::all().name("detail") }

    pub fn detail(id: i64) -> QueryKey { Self::details().id(id) }

    pub fn authors() -> QueryKey { Self::all().name("author") }

    pub fn author(author_id: i64) -> QueryKey { Self::authors().id(author_id) }

    pub fn by_author(author_id: i64, params: &PostQueryParams) -> QueryKey {
        Self::author(author_id).params(&params.normalized())
    }

    pub fn by_author_paged(
        author_id: i64, params: &PostQueryParams,
    ) -> QueryKey {
        Self::author(author_id)
            .name("paged")
            .params(&params.normalized())
    }

    pub fn popular_all() -> QueryKey { Self::all().name("popular") }

    pub fn popular(limit: usize) -> QueryKey {
        Self::popular_all().id(limit_segment(limit))
    }

    pub fn latest_all() -> QueryKey { Self::all().name("latest") }

    pub fn latest(limit: usize) -> QueryKey {
        Self::latest_all().id(limit_segment(limit))
    }

    pub fn recommended_all() -> QueryKey { Self::all().name("recommended") }

    pub fn recommended(user_id: Option<i64>, limit: usize) -> QueryKey {
        let scope = match user_id {
            Some(user_id) => Self::recommended_all().id(user_id),
            None => Self::recommended_all().name("anyone"),
        };
        scope.id(limit_segment(limit))
    }

    pub fn tags() -> QueryKey { Self::all().name("tags") }

    pub fn all_tags() -> QueryKey { Self::tags().name("all") }

    pub fn popular_tags(limit: usize) -> QueryKey {
        Self::tags().name("popular").id(limit_segment(limit))
    }
}

fn limit_segment(limit: usize) -> i64 { i64::try_from(limit).unwrap_or(i64::MAX) }
