//! Demo content for the in-memory document store.

use tracing::info;

use crate::error::Result;
use crate::models::{NewPost, NewUser, PostStatus};
use crate::services::Services;

/// Creates a couple of users, posts and engagement records so the cache
/// endpoints have something to show. Goes through the services, so it also
/// exercises the write-then-invalidate path.
pub async fn seed_demo_data(services: &Services) -> Result<()> {
    let ada = services
        .users
        .create(NewUser {
            username: "ada".to_string(),
            display_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            bio: "Writes about storage engines".to_string(),
        })
        .await?;
    let grace = services
        .users
        .create(NewUser {
            username: "grace".to_string(),
            display_name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            bio: String::new(),
        })
        .await?;

    let posts = [
        ("Hello World", true, PostStatus::Published),
        ("Read-through caching in practice", false, PostStatus::Published),
        ("Notes on TTLs", false, PostStatus::Draft),
    ];
    let mut created = Vec::with_capacity(posts.len());
    for (title, featured, status) in posts {
        let post = services
            .posts
            .create(NewPost {
                title: title.to_string(),
                slug: None,
                content: format!("{title}: demo content."),
                excerpt: String::new(),
                author_id: ada.id.clone(),
                category: Some("engineering".to_string()),
                tags: vec!["cache".to_string()],
                status,
                featured,
            })
            .await?;
        created.push(post);
    }

    if let Some(first) = created.first() {
        services.likes.like(&first.id, &grace.id).await?;
        services.views.record(&first.id, Some(grace.id.as_str())).await?;
        services.comments.add(&first.id, &grace.id, "Great intro!").await?;
        services.shares.share(&first.id, &grace.id, "mastodon").await?;
    }
    services.follows.follow(&grace.id, &ada.id).await?;

    info!(
        users = 2,
        posts = created.len(),
        "Seeded demo content"
    );
    Ok(())
}
