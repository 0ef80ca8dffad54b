use post_models::Post;

use crate::PostQueryParams;

/// True when `post` satisfies every filter present in `params`.
/// Pagination is ignored.
pub fn matches(post: &Post, params: &PostQueryParams) -> bool {
    if let Some(term) = params.search.as_deref().filter(|s| !s.is_empty()) {
        let term = term.to_lowercase();
        let hit = post.title.to_lowercase().contains(&term)
            || post.content.to_lowercase().contains(&term)
            || post
                .excerpt
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&term));
        if !hit {
            return false;
        }
    }

    if params.status.is_some_and(|status| post.status != status) {
        return false;
    }

    if let Some(tags) = params.tags.as_deref().filter(|t| !t.is_empty()) {
        if !post.has_any_tag(tags) {
            return false;
        }
    }

    if params.author_id.is_some_and(|author| post.author_id != author) {
        return false;
    }

    true
}

/// Filters `posts` in order, then applies 1-based pagination. Pages past
/// the end are empty.
pub fn filter_posts(posts: &[Post], params: &PostQueryParams) -> Vec<Post> {
    let filtered = posts.iter().filter(|post| matches(post, params));

    match params.pagination() {
        Some((page, page_size)) => {
            let start = (page as usize - 1).saturating_mul(page_size as usize);
            filtered
                .skip(start)
                .take(page_size as usize)
                .cloned()
                .collect()
        }
        None => filtered.cloned().collect(),
    }
}

/// Number of posts matching `params`, ignoring pagination.
pub fn count_posts(posts: &[Post], params: &PostQueryParams) -> usize {
    posts.iter().filter(|post| matches(post, params)).count()
}
