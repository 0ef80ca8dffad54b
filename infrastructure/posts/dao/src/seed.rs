use chrono::{DateTime, Utc};
use post_models::{Post, PostStatus};

struct SeedPost {
    title: &'static str,
    content: &'static str,
    author: (i64, &'static str),
    tags: &'static [&'static str],
    status: PostStatus,
    created: i64,
}

const SEED: [SeedPost; 12] = [
    SeedPost {
        title: "React Query Best Practices",
        content: "React Query is a powerful data fetching library that helps \
                  manage server state. This article covers its core concepts \
                  and best practices, including query caching, background \
                  refetching and optimistic updates, so you can build more \
                  robust and performant React applications.",
        author: (1, "Zhang San"),
        tags: &["React", "React Query", "Frontend"],
        status: PostStatus::Published,
        created: 1705314600,
    },
    SeedPost {
        title: "A Deep Dive into the TypeScript Type System",
        content: "The type system is one of the strongest features of \
                  TypeScript. We explore union, intersection, conditional and \
                  mapped types, and how inference keeps large applications \
                  type safe without slowing development down.",
        author: (2, "Li Si"),
        tags: &["TypeScript", "Type Systems", "Frontend"],
        status: PostStatus::Published,
        created: 1705242000,
    },
    SeedPost {
        title: "Modern Frontend Architecture Patterns",
        content: "As frontend applications grow, choosing an architecture \
                  pattern matters more and more. We compare MVC, MVP, MVVM and \
                  component based architectures, with their trade-offs and \
                  practical recommendations.",
        author: (1, "Zhang San"),
        tags: &["Architecture", "Design Patterns", "Frontend"],
        status: PostStatus::Published,
        created: 1705137300,
    },
    SeedPost {
        title: "Vue 3 Composition API Explained",
        content: "The Composition API in Vue 3 offers a more flexible way to \
                  organize component logic. This post walks through setup, the \
                  reactivity APIs and lifecycle hooks, and shows how to build \
                  reusable logic with composables.",
        author: (3, "Wang Wu"),
        tags: &["Vue 3", "Composition API", "Frameworks"],
        status: PostStatus::Draft,
        created: 1705077900,
    },
    SeedPost {
        title: "Micro Frontends in Practice",
        content: "Micro frontends split an application into smaller pieces \
                  that separate teams can build, test and deploy on their own. \
                  We share lessons learned on technology choices, team \
                  collaboration and deployment strategy.",
        author: (2, "Li Si"),
        tags: &["Micro Frontends", "Architecture", "Collaboration"],
        status: PostStatus::Published,
        created: 1704972600,
    },
    SeedPost {
        title: "Performance Optimization from Theory to Practice",
        content: "Web performance directly affects user experience. Starting \
                  from how browsers render pages, this article covers resource \
                  loading, rendering and runtime optimizations with concrete \
                  measurements.",
        author: (1, "Zhang San"),
        tags: &["Performance", "Browsers", "Frontend"],
        status: PostStatus::Published,
        created: 1704892800,
    },
    SeedPost {
        title: "GraphQL versus REST",
        content: "GraphQL and REST are two popular API design styles. We \
                  compare their data fetching models, caching behaviour, \
                  tooling and learning curve to help you choose the right one \
                  for your project.",
        author: (3, "Wang Wu"),
        tags: &["GraphQL", "REST API", "Backend"],
        status: PostStatus::Draft,
        created: 1704813000,
    },
    SeedPost {
        title: "Comparing CSS-in-JS Solutions",
        content: "CSS-in-JS moves styles next to components. This comparison \
                  looks at styled-components, Emotion and zero-runtime \
                  alternatives, focusing on developer experience and runtime \
                  cost.",
        author: (2, "Li Si"),
        tags: &["CSS-in-JS", "Styling", "Frontend"],
        status: PostStatus::Published,
        created: 1704710700,
    },
    SeedPost {
        title: "Unit Testing Best Practices",
        content: "Unit tests are the foundation of code quality. We discuss \
                  test structure, naming, mocking and coverage, and how to \
                  keep a test suite fast and trustworthy as a codebase grows.",
        author: (1, "Zhang San"),
        tags: &["Unit Testing", "Code Quality", "Testing Tools"],
        status: PostStatus::Draft,
        created: 1704637800,
    },
    SeedPost {
        title: "Web Components Under the Hood",
        content: "Web Components bring native component models to the \
                  browser. We cover custom elements, shadow DOM and templates, \
                  and how they interoperate with existing frameworks.",
        author: (3, "Wang Wu"),
        tags: &["Web Components", "Web Platform", "Components"],
        status: PostStatus::Published,
        created: 1704543300,
    },
    SeedPost {
        title: "What Is New in Webpack 5",
        content: "Webpack 5 introduces module federation, persistent caching \
                  and better tree shaking. This post explains each feature and \
                  what it takes to migrate an existing build.",
        author: (2, "Li Si"),
        tags: &["Webpack 5", "Build Tools", "Frontend Engineering"],
        status: PostStatus::Draft,
        created: 1704446400,
    },
    SeedPost {
        title: "Monitoring and Tuning Node.js Performance",
        content: "Production Node.js services need visibility into the event \
                  loop, memory and CPU. We look at profiling tools, common \
                  bottlenecks and tuning techniques for high traffic \
                  services.",
        author: (1, "Zhang San"),
        tags: &["Node.js", "Monitoring", "Backend"],
        status: PostStatus::Published,
        created: 1704386400,
    },
];

/// The initial collection: ids 1 to 12, newest first, 8 published and 4
/// drafts.
pub fn seed_posts() -> Vec<Post> {
    SEED.iter()
        .zip(1..)
        .map(|(seed, id)| {
            let created_at =
                DateTime::<Utc>::from_timestamp(seed.created, 0)
                    .unwrap_or_default();
            Post {
                id,
                title: seed.title.to_string(),
                content: seed.content.to_string(),
                excerpt: Some(first_sentence(seed.content)),
                author_id: seed.author.0,
                author_name: Some(seed.author.1.to_string()),
                tags: seed.tags.iter().map(|t| t.to_string()).collect(),
                status: seed.status,
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
}

fn first_sentence(content: &str) -> String {
    match content.split_once(". ") {
        Some((head, _)) => format!("{head}..."),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_shape() {
        let posts = seed_posts();
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());

        let published = posts.iter().filter(|p| p.is_published()).count();
        assert_eq!(published, 8);
        assert_eq!(posts.len() - published, 4);

        assert!(posts.windows(2).all(|w| w[0].created_at > w[1].created_at));
        assert!(posts.iter().all(|p| p.updated_at == p.created_at));
    }
}
