//! Cache key construction.
//!
//! Composite keys have the form `NAMESPACE:key`. Namespaces never contain the
//! separator, so splitting at the first `:` always recovers the pair and two
//! distinct `(namespace, key)` pairs can never share a composite key.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

/// Separator between namespace and key.
pub const SEPARATOR: char = ':';

/// Separator between a read category and its parameters.
pub const PART_SEPARATOR: char = '_';

/// Escaped in parameters: the part separator, the namespace separator and
/// the escape character itself.
const PARAM_SET: &AsciiSet = &CONTROLS.add(b'%').add(b'_').add(b':');

/// Logical partitions of the key space, one per domain entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Namespace {
    Posts,
    Users,
    Comments,
    Likes,
    Views,
    Follows,
    Shares,
}

impl Namespace {
    pub const ALL: [Namespace; 7] = [
        Namespace::Posts,
        Namespace::Users,
        Namespace::Comments,
        Namespace::Likes,
        Namespace::Views,
        Namespace::Follows,
        Namespace::Shares,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Posts => "POSTS",
            Namespace::Users => "USERS",
            Namespace::Comments => "COMMENTS",
            Namespace::Likes => "LIKES",
            Namespace::Views => "VIEWS",
            Namespace::Follows => "FOLLOWS",
            Namespace::Shares => "SHARES",
        }
    }

    /// Parses a namespace name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ns| ns.as_str().eq_ignore_ascii_case(name))
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the composite key for `(namespace, key)`.
///
/// An empty namespace or one containing `:` is a programmer error.
pub fn composite_key(namespace: &str, key: &str) -> String {
    debug_assert!(
        is_valid_namespace(namespace),
        "invalid cache namespace {namespace:?}"
    );
    let mut composite = String::with_capacity(namespace.len() + 1 + key.len());
    composite.push_str(namespace);
    composite.push(SEPARATOR);
    composite.push_str(key);
    composite
}

/// Prefix shared by every composite key of a namespace.
pub fn namespace_prefix(namespace: &str) -> String {
    debug_assert!(
        is_valid_namespace(namespace),
        "invalid cache namespace {namespace:?}"
    );
    format!("{namespace}{SEPARATOR}")
}

pub fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty() && !namespace.contains(SEPARATOR)
}

// == Parameterised Keys ==
/// Key for a parameterised read, e.g. `scoped("slug", "my-post")` -> `slug_my-post`.
///
/// The parameter is percent-escaped, so `scoped("following", "count_bob")`
/// and `scoped("following_count", "bob")` stay distinct.
pub fn scoped(category: &str, id: impl fmt::Display) -> String {
    let mut key = String::from(category);
    push_param(&mut key, &id.to_string());
    key
}

/// Key for a read parameterised by two ids, e.g. `user_liked_p1_u1`.
pub fn pair(category: &str, first: impl fmt::Display, second: impl fmt::Display) -> String {
    let mut key = String::from(category);
    push_param(&mut key, &first.to_string());
    push_param(&mut key, &second.to_string());
    key
}

fn push_param(key: &mut String, param: &str) {
    key.push(PART_SEPARATOR);
    key.extend(utf8_percent_encode(param, PARAM_SET));
}
