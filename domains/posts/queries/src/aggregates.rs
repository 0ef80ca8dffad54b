use std::{
    cmp::Reverse,
    collections::{BTreeSet, HashMap, HashSet},
};

use post_models::{Post, TagCount};

/// Published posts, highest id first.
pub fn popular(posts: &[Post], limit: usize) -> Vec<Post> {
    let mut published: Vec<Post> =
        posts.iter().filter(|p| p.is_published()).cloned().collect();
    published.sort_by(|a, b| b.id.cmp(&a.id));
    published.truncate(limit);
    published
}

/// Published posts, newest `created_at` first. Equal timestamps keep
/// collection order.
pub fn latest(posts: &[Post], limit: usize) -> Vec<Post> {
    let mut published: Vec<Post> =
        posts.iter().filter(|p| p.is_published()).cloned().collect();
    published.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    published.truncate(limit);
    published
}

/// Published posts for `user_id`, never their own. Posts sharing more tags
/// with the user's own posts come first; ties keep [`latest`] order.
/// Without a user this is [`latest`].
pub fn recommended(
    posts: &[Post], user_id: Option<i64>, limit: usize,
) -> Vec<Post> {
    let Some(user_id) = user_id
    else {
        return latest(posts, limit);
    };

    let interests: HashSet<&str> = posts
        .iter()
        .filter(|p| p.author_id == user_id)
        .flat_map(|p| p.tags.iter().map(String::as_str))
        .collect();

    let mut candidates: Vec<Post> = latest(posts, usize::MAX)
        .into_iter()
        .filter(|p| p.author_id != user_id)
        .collect();
    candidates.sort_by_key(|p| {
        Reverse(
            p.tags
                .iter()
                .filter(|t| interests.contains(t.as_str()))
                .count(),
        )
    });
    candidates.truncate(limit);
    candidates
}

/// Every tag in use, deduplicated and sorted.
pub fn all_tags(posts: &[Post]) -> Vec<String> {
    posts
        .iter()
        .flat_map(|p| p.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Tag histogram over all posts, most used first. Ties keep the order in
/// which the tags were first seen.
pub fn popular_tags(posts: &[Post], limit: usize) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for tag in posts.iter().flat_map(|p| p.tags.iter()) {
        match index.get(tag.as_str()) {
            Some(&at) => counts[at].count += 1,
            None => {
                index.insert(tag.as_str(), counts.len());
                counts.push(TagCount {
                    tag: tag.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use post_models::PostStatus;

    use super::*;

    fn post(id: i64, status: PostStatus, days: i64, tags: &[&str]) -> Post {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Post {
            id,
            title: format!("post {id}"),
            content: "body".into(),
            excerpt: None,
            author_id: 1,
            author_name: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            status,
            created_at: base + Duration::days(days),
            updated_at: base + Duration::days(days),
        }
    }

    fn sample() -> Vec<Post> {
        vec![
            post(1, PostStatus::Published, 5, &["b", "a"]),
            post(2, PostStatus::Draft, 9, &["c"]),
            post(3, PostStatus::Published, 1, &["a", "c"]),
            post(4, PostStatus::Published, 3, &["b"]),
        ]
    }

    #[test]
    fn test_popular_orders_published_by_id_desc() {
        let ids: Vec<_> = popular(&sample(), 2).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn test_latest_orders_published_by_created_desc() {
        let ids: Vec<_> = latest(&sample(), 10).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 4, 3]);
    }

    #[test]
    fn test_recommended_ranks_shared_tags_and_skips_own_posts() {
        let mut posts = sample();
        let mut own = post(5, PostStatus::Published, 7, &["c"]);
        own.author_id = 2;
        posts.push(own);

        let ids: Vec<_> =
            recommended(&posts, Some(2), 10).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 4]);

        let ids: Vec<_> =
            recommended(&posts, Some(2), 1).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_recommended_without_user_is_latest() {
        assert_eq!(recommended(&sample(), None, 2), latest(&sample(), 2));
    }

    #[test]
    fn test_all_tags_sorted_and_unique() {
        assert_eq!(all_tags(&sample()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_popular_tags_ties_keep_first_seen_order() {
        let tags = popular_tags(&sample(), 10);
        let flat: Vec<_> =
            tags.iter().map(|t| (t.tag.as_str(), t.count)).collect();
        assert_eq!(flat, vec![("b", 2), ("a", 2), ("c", 2)]);
    }

    #[test]
    fn test_popular_tags_truncates() {
        let mut posts = sample();
        posts.push(post(5, PostStatus::Draft, 0, &["c"]));
        let tags = popular_tags(&posts, 1);
        assert_eq!(tags, vec![TagCount {
            tag: "c".into(),
            count: 3
        }]);
    }
}
