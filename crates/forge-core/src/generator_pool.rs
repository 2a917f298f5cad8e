//! Generator pool for managing per-application instances
//!
//! Provides instance reuse and lifecycle management:
//! - Instance acquisition (create once, then reuse)
//! - Memory hydration from chat history on creation
//! - Bounded size with LRU eviction and optional idle expiry
//! - Pool statistics

use crate::backend::BackendFactory;
use crate::config::{MemoryConfig, PoolConfig};
use crate::error::PoolError;
use crate::history::ChatHistoryStore;
use crate::instance::GeneratorInstance;
use crate::memory::ChatMemory;
use forge_artifact::AppId;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Pool statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances currently cached
    pub entry_count: u64,
    /// Instances built since the pool was created
    pub instances_created: u64,
}

/// Per-application generator instances
///
/// Concurrent first requests for the same application build exactly one
/// instance; every caller gets the same `Arc`.
pub struct GeneratorPool {
    cache: Cache<AppId, Arc<GeneratorInstance>>,
    factory: Arc<dyn BackendFactory>,
    history: Arc<dyn ChatHistoryStore>,
    memory: MemoryConfig,
    created: AtomicU64,
}

impl std::fmt::Debug for GeneratorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorPool")
            .field("entry_count", &self.cache.entry_count())
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}

impl GeneratorPool {
    /// Create pool
    #[must_use]
    pub fn new(
        pool: PoolConfig,
        memory: MemoryConfig,
        factory: Arc<dyn BackendFactory>,
        history: Arc<dyn ChatHistoryStore>,
    ) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(pool.max_instances)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(ttl) = pool.idle_ttl() {
            builder = builder.time_to_idle(ttl);
        }

        Self {
            cache: builder.build(),
            factory,
            history,
            memory,
            created: AtomicU64::new(0),
        }
    }

    /// Instance for `app_id`, created and hydrated on first use
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Configuration`] when the backend cannot be built.
    pub async fn get_instance(&self, app_id: AppId) -> Result<Arc<GeneratorInstance>, PoolError> {
        self.cache
            .try_get_with(app_id, self.create_instance(app_id))
            .await
            .map_err(|e| (*e).clone())
    }

    /// Evict the instance of `app_id`, if cached
    pub async fn invalidate(&self, app_id: AppId) {
        self.cache.invalidate(&app_id).await;
        tracing::debug!(%app_id, "generator instance invalidated");
    }

    /// Whether `app_id` currently has an instance
    #[must_use]
    pub fn contains(&self, app_id: AppId) -> bool {
        self.cache.contains_key(&app_id)
    }

    /// Get pool statistics
    pub async fn stats(&self) -> PoolStats {
        self.cache.run_pending_tasks().await;
        PoolStats {
            entry_count: self.cache.entry_count(),
            instances_created: self.created.load(Ordering::Relaxed),
        }
    }

    async fn create_instance(&self, app_id: AppId) -> Result<Arc<GeneratorInstance>, PoolError> {
        let backend = self.factory.build(app_id).await?;

        let turns = match self
            .history
            .load_recent_turns(app_id, self.memory.hydrate_turns)
            .await
        {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(%app_id, error = %e, "history load failed, starting with empty memory");
                Vec::new()
            }
        };
        let hydrated = turns.len();
        let memory = ChatMemory::hydrated(self.memory.max_messages, turns);

        self.created.fetch_add(1, Ordering::Relaxed);
        tracing::info!(%app_id, hydrated, backend = backend.name(), "generator instance created");

        Ok(Arc::new(GeneratorInstance::new(app_id, backend, memory)))
    }
}
