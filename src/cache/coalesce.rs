//! Single-flight registry for cache misses.
//!
//! Concurrent callers asking for the same composite key while a fetch is
//! outstanding all await one shared future instead of starting their own.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, error, trace};

type SharedFetch<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;
type PendingMap = Arc<Mutex<HashMap<String, Pending>>>;

struct Pending {
    id: u64,
    /// A `SharedFetch<T, E>` erased so fetches of different types share one map
    fetch: Box<dyn Any + Send + Sync>,
}

// == In-Flight Registry ==
/// Tracks at most one outstanding fetch per composite key.
#[derive(Default)]
pub struct InFlightRegistry {
    pending: PendingMap,
    next_id: AtomicU64,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches currently outstanding.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every registration. Callers already awaiting keep their futures.
    pub fn clear(&self) {
        // Dropped outside the lock: an abandoned fetch's guard locks it again
        let drained = std::mem::take(&mut *self.pending.lock());
        drop(drained);
    }

    // == Run ==
    /// Joins the outstanding fetch for `key`, or starts one with `producer`.
    ///
    /// The producer is invoked at most once per registration. Its result, or
    /// its error, is handed to every caller that joined. The registration is
    /// removed as soon as the fetch settles, so a failure never sticks.
    ///
    /// # Panics
    /// In debug builds, if a fetch for `key` is already outstanding with a
    /// different result type. Release builds log it and run `producer` alone.
    pub async fn run<T, E, F, Fut>(&self, key: &str, producer: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let joined = {
            let mut pending = self.pending.lock();
            let existing = pending
                .get(key)
                .map(|existing| existing.fetch.downcast_ref::<SharedFetch<T, E>>().cloned());

            match existing {
                Some(Some(fetch)) => {
                    trace!(key, "Joining in-flight fetch");
                    Ok(fetch)
                }
                Some(None) => Err(producer),
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let guard = Registration {
                        pending: Arc::clone(&self.pending),
                        key: key.to_owned(),
                        id,
                    };

                    let fetch: SharedFetch<T, E> = async move {
                        let _registration = guard;
                        producer().await
                    }
                    .boxed()
                    .shared();

                    pending.insert(
                        key.to_owned(),
                        Pending {
                            id,
                            fetch: Box::new(fetch.clone()),
                        },
                    );
                    debug!(key, "Started coalesced fetch");
                    Ok(fetch)
                }
            }
        };

        match joined {
            Ok(fetch) => fetch.await,
            Err(producer) => {
                if cfg!(debug_assertions) {
                    panic!(
                        "in-flight fetch for cache key `{key}` was registered with a different result type"
                    );
                }
                error!(
                    key,
                    expected = type_name::<T>(),
                    "In-flight fetch type mismatch, fetching without coalescing"
                );
                producer().await
            }
        }
    }
}

impl std::fmt::Debug for InFlightRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.pending.lock();
        f.debug_struct("InFlightRegistry")
            .field("keys", &pending.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Removes its registration when the fetch settles, fails or unwinds.
struct Registration {
    pending: PendingMap,
    key: String,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let removed = {
            let mut pending = self.pending.lock();
            // Only our own registration; a reset may have let a newer one in
            if pending.get(&self.key).is_some_and(|p| p.id == self.id) {
                pending.remove(&self.key)
            } else {
                None
            }
        };
        drop(removed);
    }
}
