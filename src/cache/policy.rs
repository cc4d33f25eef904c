//! Cache policy tables.
//!
//! Every TTL used by a data-access service and every event-driven
//! invalidation target lives here. Services look TTLs up by
//! `(namespace, category)`; a missing row means the read is not cached.

use std::fmt;

use crate::cache::Namespace;

const SECOND: u64 = 1_000;
const MINUTE: u64 = 60 * SECOND;

/// Read categories. Parameterised reads use the category as key prefix,
/// e.g. `slug_hello-world`; singleton reads use it as the whole key.
pub mod category {
    pub const ALL: &str = "all";
    pub const PUBLISHED: &str = "published";
    pub const FEATURED: &str = "featured";
    pub const RECENT: &str = "recent";
    pub const SLUG: &str = "slug";
    pub const ID: &str = "id";
    pub const USERNAME: &str = "username";
    pub const CATEGORY: &str = "category";
    pub const AUTHOR: &str = "author";
    pub const POST: &str = "post";
    pub const COUNT: &str = "count";
    pub const USER_LIKED: &str = "user_liked";
    pub const BY_USER: &str = "by_user";
    pub const FOLLOWERS: &str = "followers";
    pub const FOLLOWING: &str = "following";
    pub const FOLLOWER_COUNT: &str = "follower_count";
    pub const FOLLOWING_COUNT: &str = "following_count";
    pub const IS_FOLLOWING: &str = "is_following";
}

/// One row of the TTL table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlRule {
    pub namespace: Namespace,
    pub category: &'static str,
    pub ttl_ms: u64,
}

const fn rule(namespace: Namespace, category: &'static str, ttl_ms: u64) -> TtlRule {
    TtlRule {
        namespace,
        category,
        ttl_ms,
    }
}

pub const TTL_TABLE: &[TtlRule] = &[
    // Posts: lists change on every publish, single posts rarely
    rule(Namespace::Posts, category::ALL, 5 * MINUTE),
    rule(Namespace::Posts, category::PUBLISHED, 5 * MINUTE),
    rule(Namespace::Posts, category::FEATURED, 10 * MINUTE),
    rule(Namespace::Posts, category::SLUG, 10 * MINUTE),
    rule(Namespace::Posts, category::ID, 10 * MINUTE),
    rule(Namespace::Posts, category::CATEGORY, 5 * MINUTE),
    rule(Namespace::Posts, category::AUTHOR, 5 * MINUTE),
    // Users
    rule(Namespace::Users, category::ALL, 10 * MINUTE),
    rule(Namespace::Users, category::ID, 15 * MINUTE),
    rule(Namespace::Users, category::USERNAME, 15 * MINUTE),
    // Comments
    rule(Namespace::Comments, category::POST, 2 * MINUTE),
    rule(Namespace::Comments, category::COUNT, 2 * MINUTE),
    rule(Namespace::Comments, category::RECENT, MINUTE),
    // Likes
    rule(Namespace::Likes, category::COUNT, MINUTE),
    rule(Namespace::Likes, category::USER_LIKED, MINUTE),
    rule(Namespace::Likes, category::BY_USER, 2 * MINUTE),
    // Views
    rule(Namespace::Views, category::COUNT, MINUTE),
    // Follows
    rule(Namespace::Follows, category::FOLLOWERS, 5 * MINUTE),
    rule(Namespace::Follows, category::FOLLOWING, 5 * MINUTE),
    rule(Namespace::Follows, category::FOLLOWER_COUNT, 5 * MINUTE),
    rule(Namespace::Follows, category::FOLLOWING_COUNT, 5 * MINUTE),
    rule(Namespace::Follows, category::IS_FOLLOWING, 2 * MINUTE),
    // Shares
    rule(Namespace::Shares, category::COUNT, 2 * MINUTE),
    rule(Namespace::Shares, category::POST, 2 * MINUTE),
];

/// TTL in milliseconds for a read category, or `None` if it must not be cached.
pub fn ttl_ms(namespace: impl AsRef<str>, category: &str) -> Option<u64> {
    let namespace = namespace.as_ref();
    TTL_TABLE
        .iter()
        .find(|rule| rule.namespace.as_str() == namespace && rule.category == category)
        .map(|rule| rule.ttl_ms)
}

// == Events ==
/// Write events with statically known cache targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    PostCreated,
    PostUpdated,
    PostDeleted,
    UserCreated,
    UserUpdated,
    CommentAdded,
    CommentDeleted,
}

impl CacheEvent {
    pub const ALL: [CacheEvent; 7] = [
        CacheEvent::PostCreated,
        CacheEvent::PostUpdated,
        CacheEvent::PostDeleted,
        CacheEvent::UserCreated,
        CacheEvent::UserUpdated,
        CacheEvent::CommentAdded,
        CacheEvent::CommentDeleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheEvent::PostCreated => "POST_CREATED",
            CacheEvent::PostUpdated => "POST_UPDATED",
            CacheEvent::PostDeleted => "POST_DELETED",
            CacheEvent::UserCreated => "USER_CREATED",
            CacheEvent::UserUpdated => "USER_UPDATED",
            CacheEvent::CommentAdded => "COMMENT_ADDED",
            CacheEvent::CommentDeleted => "COMMENT_DELETED",
        }
    }
}

impl AsRef<str> for CacheEvent {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Target = (Namespace, &'static str);

const POST_LISTS: &[Target] = &[
    (Namespace::Posts, category::ALL),
    (Namespace::Posts, category::PUBLISHED),
    (Namespace::Posts, category::FEATURED),
];

pub const EVENT_TABLE: &[(&str, &[Target])] = &[
    ("POST_CREATED", POST_LISTS),
    (
        "POST_UPDATED",
        &[
            (Namespace::Posts, category::ALL),
            (Namespace::Posts, category::FEATURED),
        ],
    ),
    ("POST_DELETED", POST_LISTS),
    ("USER_CREATED", &[(Namespace::Users, category::ALL)]),
    ("USER_UPDATED", &[(Namespace::Users, category::ALL)]),
    ("COMMENT_ADDED", &[(Namespace::Comments, category::RECENT)]),
    ("COMMENT_DELETED", &[(Namespace::Comments, category::RECENT)]),
];

/// Cache entries to drop when `event` happens. Unknown events have none.
pub fn invalidation_targets(event: &str) -> &'static [Target] {
    EVENT_TABLE
        .iter()
        .find(|(name, _)| *name == event)
        .map(|(_, targets)| *targets)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ttl_lookup() {
        assert_eq!(ttl_ms(Namespace::Posts, category::ALL), Some(300_000));
        assert_eq!(ttl_ms("POSTS", category::SLUG), Some(600_000));
        assert_eq!(ttl_ms(Namespace::Views, category::COUNT), Some(60_000));
    }

    #[test]
    fn test_unknown_rows_are_uncached() {
        assert_eq!(ttl_ms("POSTS", "nope"), None);
        assert_eq!(ttl_ms("NOTIFICATIONS", category::ALL), None);
    }

    #[test]
    fn test_every_namespace_has_a_row() {
        for namespace in Namespace::ALL {
            assert!(
                TTL_TABLE.iter().any(|rule| rule.namespace == namespace),
                "{namespace} has no TTL rule"
            );
        }
    }

    #[test]
    fn test_table_rows_are_unique() {
        let mut seen = HashSet::new();
        for rule in TTL_TABLE {
            assert!(seen.insert((rule.namespace, rule.category)), "{rule:?}");
            assert!(rule.ttl_ms > 0);
        }
    }

    #[test]
    fn test_event_names_match_enum() {
        for event in CacheEvent::ALL {
            assert!(
                !invalidation_targets(event.as_str()).is_empty(),
                "{event} has no targets"
            );
        }
        assert_eq!(EVENT_TABLE.len(), CacheEvent::ALL.len());
    }

    #[test]
    fn test_post_updated_targets() {
        assert_eq!(
            invalidation_targets("POST_UPDATED"),
            &[(Namespace::Posts, "all"), (Namespace::Posts, "featured")]
        );
    }

    #[test]
    fn test_unknown_event_has_no_targets() {
        assert!(invalidation_targets("POST_ARCHIVED").is_empty());
    }

    #[test]
    fn test_event_targets_are_cached_reads() {
        for (event, targets) in EVENT_TABLE {
            for (namespace, key) in *targets {
                assert!(ttl_ms(namespace, key).is_some(), "{event} -> {namespace}:{key}");
            }
        }
    }
}
