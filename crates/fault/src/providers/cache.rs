//! This module contains the [ProviderCache], which keeps bottom game trace providers alive across
//! ticks.

use crate::TraceProvider;
use alloy_primitives::B256;
use anyhow::Result;
use lru::LruCache;
use std::{future::Future, num::NonZeroUsize, sync::Arc};
use tokio::sync::Mutex;

/// The default number of bottom game providers kept per game.
pub const DEFAULT_PROVIDER_CACHE_SIZE: usize = 100;

struct CacheInner {
    anchor: Option<B256>,
    providers: LruCache<B256, Arc<dyn TraceProvider>>,
}

/// The [ProviderCache] is an LRU of bottom game providers keyed by local context. Entries are
/// tied to the L1 head they were created against, and the whole cache is dropped when it moves.
pub struct ProviderCache {
    inner: Mutex<CacheInner>,
}

impl ProviderCache {
    pub fn new(size: usize) -> Self {
        let size = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                anchor: None,
                providers: LruCache::new(size),
            }),
        }
    }

    /// Sets the L1 head the cached providers were built against. A different anchor evicts every
    /// entry.
    pub async fn set_anchor(&self, l1_head: B256) {
        let mut inner = self.inner.lock().await;
        if inner.anchor != Some(l1_head) {
            if inner.anchor.is_some() {
                tracing::debug!(
                    target: "provider-cache",
                    anchor = %l1_head,
                    "L1 anchor moved, evicting providers"
                );
            }
            inner.providers.clear();
            inner.anchor = Some(l1_head);
        }
    }

    /// Returns the provider cached for `local_context`, creating it with `create` on a miss.
    /// Failed creations are not cached.
    pub async fn get_or_create<F, Fut>(
        &self,
        local_context: B256,
        create: F,
    ) -> Result<Arc<dyn TraceProvider>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Arc<dyn TraceProvider>>> + Send,
    {
        if let Some(provider) = self.inner.lock().await.providers.get(&local_context) {
            return Ok(provider.clone());
        }

        let provider = create().await?;
        self.inner
            .lock()
            .await
            .providers
            .put(local_context, provider.clone());
        Ok(provider)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.providers.len()
    }
}

impl Default for ProviderCache {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER_CACHE_SIZE)
    }
}
