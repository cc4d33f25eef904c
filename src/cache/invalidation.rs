//! Invalidation helper.
//!
//! Turns domain write events into cache deletions. Called by services only
//! after the document-store write has succeeded. Stateless and infallible:
//! deleting an absent key is a no-op.

use tracing::debug;

use crate::cache::keys::{pair, scoped};
use crate::cache::policy::{category, invalidation_targets};
use crate::cache::{CacheManager, Namespace};

#[derive(Debug, Clone)]
pub struct Invalidator {
    cache: CacheManager,
}

impl Invalidator {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    /// Drops every target the policy lists for `event`.
    ///
    /// Unknown events do nothing. Returns the number of targets visited.
    pub fn invalidate_by_event(&self, event: impl AsRef<str>) -> usize {
        let event = event.as_ref();
        let targets = invalidation_targets(event);
        if targets.is_empty() {
            debug!(event, "No invalidation targets for event");
            return 0;
        }

        for (namespace, key) in targets {
            self.cache.delete(namespace, key);
        }
        debug!(event, targets = targets.len(), "Invalidated cache for event");
        targets.len()
    }

    /// A post was created, edited or removed.
    ///
    /// List-shaped post caches (by category, by author, featured...) cannot
    /// be patched selectively, so the whole namespace goes.
    pub fn post_changed(&self, post_id: &str, slug: Option<&str>) {
        self.cache.delete(Namespace::Posts, &scoped(category::ID, post_id));
        if let Some(slug) = slug {
            self.cache.delete(Namespace::Posts, &scoped(category::SLUG, slug));
        }
        self.cache.clear_namespace(Namespace::Posts);
    }

    /// A user profile was created or edited.
    pub fn user_changed(&self, user_id: &str, username: Option<&str>) {
        self.cache.delete(Namespace::Users, &scoped(category::ID, user_id));
        if let Some(username) = username {
            self.cache
                .delete(Namespace::Users, &scoped(category::USERNAME, username));
        }
        self.cache.clear_namespace(Namespace::Users);
    }

    /// A comment on `post_id` was added or removed.
    pub fn comments_changed(&self, post_id: &str) {
        self.cache.delete(Namespace::Comments, &scoped(category::POST, post_id));
        self.cache.delete(Namespace::Comments, &scoped(category::COUNT, post_id));
        self.cache.clear_namespace(Namespace::Comments);
    }

    /// `user_id` liked or unliked `post_id`.
    pub fn likes_changed(&self, post_id: &str, user_id: &str) {
        self.cache.delete(Namespace::Likes, &scoped(category::COUNT, post_id));
        self.cache
            .delete(Namespace::Likes, &pair(category::USER_LIKED, post_id, user_id));
        self.cache.delete(Namespace::Likes, &scoped(category::BY_USER, user_id));
    }

    /// A view of `post_id` was recorded.
    pub fn view_recorded(&self, post_id: &str) {
        self.cache.delete(Namespace::Views, &scoped(category::COUNT, post_id));
    }

    /// `follower_id` started or stopped following `following_id`.
    pub fn follow_changed(&self, follower_id: &str, following_id: &str) {
        let follows = Namespace::Follows;
        self.cache.delete(follows, &scoped(category::FOLLOWERS, following_id));
        self.cache.delete(follows, &scoped(category::FOLLOWER_COUNT, following_id));
        self.cache.delete(follows, &scoped(category::FOLLOWING, follower_id));
        self.cache.delete(follows, &scoped(category::FOLLOWING_COUNT, follower_id));
        self.cache.delete(
            follows,
            &pair(category::IS_FOLLOWING, follower_id, following_id),
        );
    }

    /// A share of `post_id` was recorded.
    pub fn share_recorded(&self, post_id: &str) {
        self.cache.delete(Namespace::Shares, &scoped(category::COUNT, post_id));
        self.cache.delete(Namespace::Shares, &scoped(category::POST, post_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primed() -> (CacheManager, Invalidator) {
        let cache = CacheManager::new(false);
        let invalidator = Invalidator::new(cache.clone());
        (cache, invalidator)
    }

    #[test]
    fn test_post_updated_event() {
        let (cache, invalidator) = primed();
        cache.set("POSTS", "all", vec!["a"], 0);
        cache.set("POSTS", "featured", vec!["b"], 0);
        cache.set("USERS", "u1", "alice", 0);

        assert_eq!(invalidator.invalidate_by_event("POST_UPDATED"), 2);

        assert!(!cache.has("POSTS", "all"));
        assert!(!cache.has("POSTS", "featured"));
        assert!(cache.has("USERS", "u1"));
    }

    #[test]
    fn test_unknown_event_is_noop() {
        let (cache, invalidator) = primed();
        cache.set("POSTS", "all", 1_u8, 0);

        assert_eq!(invalidator.invalidate_by_event("SOMETHING_NEW"), 0);
        assert!(cache.has("POSTS", "all"));
    }

    #[test]
    fn test_invalidation_is_idempotent() {
        let (cache, invalidator) = primed();
        cache.set("POSTS", "all", 1_u8, 0);

        invalidator.invalidate_by_event(crate::cache::CacheEvent::PostCreated);
        invalidator.invalidate_by_event(crate::cache::CacheEvent::PostCreated);

        assert!(cache.is_empty());
    }

    #[test]
    fn test_post_changed_clears_namespace() {
        let (cache, invalidator) = primed();
        cache.set("POSTS", "slug_hello", 1_u8, 0);
        cache.set("POSTS", "category_rust", 1_u8, 0);
        cache.set("COMMENTS", "post_p1", 1_u8, 0);

        invalidator.post_changed("p1", Some("hello"));

        assert!(!cache.has("POSTS", "slug_hello"));
        assert!(!cache.has("POSTS", "category_rust"));
        assert!(cache.has("COMMENTS", "post_p1"));
    }

    #[test]
    fn test_likes_changed_is_targeted() {
        let (cache, invalidator) = primed();
        cache.set("LIKES", "count_p1", 3_u64, 0);
        cache.set("LIKES", "user_liked_p1_u1", true, 0);
        cache.set("LIKES", "count_p2", 8_u64, 0);

        invalidator.likes_changed("p1", "u1");

        assert!(!cache.has("LIKES", "count_p1"));
        assert!(!cache.has("LIKES", "user_liked_p1_u1"));
        assert!(cache.has("LIKES", "count_p2"));
    }

    #[test]
    fn test_follow_changed_touches_both_sides() {
        let (cache, invalidator) = primed();
        cache.set("FOLLOWS", "follower_count_bob", 1_u64, 0);
        cache.set("FOLLOWS", "following_count_alice", 1_u64, 0);
        cache.set("FOLLOWS", "is_following_alice_bob", true, 0);
        cache.set("FOLLOWS", "follower_count_carol", 4_u64, 0);

        invalidator.follow_changed("alice", "bob");

        assert!(!cache.has("FOLLOWS", "follower_count_bob"));
        assert!(!cache.has("FOLLOWS", "following_count_alice"));
        assert!(!cache.has("FOLLOWS", "is_following_alice_bob"));
        assert!(cache.has("FOLLOWS", "follower_count_carol"));
    }
}
