//! Coalescing of concurrent identical fetches
//!
//! Wraps `async_singleflight` so that concurrent callers asking for the same
//! key share one in-flight future and its result, success or failure.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use crate::{Error, Result};

/// One in-flight execution per key; later callers await the leader's result.
///
/// If the leader is dropped mid-flight, `async_singleflight` promotes a waiter
/// and retries; when no one is left to retry, the caller gets `Unavailable`.
pub struct SingleFlight<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    group: Arc<async_singleflight::Group<K, V, Error>>,
}

impl<K, V> Clone for SingleFlight<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            group: Arc::clone(&self.group),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            group: Arc::new(async_singleflight::Group::new()),
        }
    }

    /// Run `fut` unless a call for `key` is already in flight, in which case
    /// wait for that call's result instead.
    pub async fn run<Fut>(&self, key: K, fut: Fut) -> Result<V>
    where
        Fut: Future<Output = Result<V>> + Send,
    {
        // Err(None) means the leader went away and no retry succeeded
        self.group.work(&key, fut).await.map_err(|err| {
            err.unwrap_or_else(|| {
                Error::Unavailable(format!("In-flight call for {key:?} was abandoned"))
            })
        })
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
