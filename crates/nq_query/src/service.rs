use nq_core::{ArticleStorage, CacheStorage, ChatRequest, ChatResponse, Error, InferenceModel, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::ResponseCache;
use crate::handlers::HandlerContext;
use crate::planner::Planner;
use crate::registry::CommandRegistry;
use crate::QueryConfig;

/// Question in, answer out: cache, then plan, then dispatch.
pub struct ChatService {
    planner: Planner,
    registry: CommandRegistry,
    cache: Arc<ResponseCache>,
}

impl ChatService {
    pub fn new(planner: Planner, registry: CommandRegistry, cache: Arc<ResponseCache>) -> Self {
        Self {
            planner,
            registry,
            cache,
        }
    }

    /// Wire the default planner, every built-in handler and a cache over `cache_store`.
    pub fn with_defaults(
        store: Arc<dyn ArticleStorage>,
        cache_store: Arc<dyn CacheStorage>,
        model: Arc<dyn InferenceModel>,
        config: QueryConfig,
    ) -> Self {
        let cache = Arc::new(ResponseCache::new(cache_store, config.cache_ttl));
        let planner = Planner::new(model.clone());
        let registry = CommandRegistry::with_default_handlers(HandlerContext::new(store, model, config));
        Self::new(planner, registry, cache)
    }

    pub fn cache(&self) -> Arc<ResponseCache> {
        self.cache.clone()
    }

    pub async fn chat(&self, query: &str) -> Result<ChatResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".to_string()));
        }
        let request = ChatRequest {
            query: query.to_string(),
        };

        match self.cache.get(&request).await {
            Ok(Some(response)) => {
                info!("💾 Answering from cache: {}", query);
                return Ok(response);
            }
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed, answering fresh: {}", e),
        }

        info!("💬 Planning: {}", query);
        let plan = self.planner.plan(query).await?;
        let response = self.registry.execute(&plan, query).await?;

        if let Err(e) = self.cache.set(&request, &response).await {
            warn!("Could not cache response for '{}': {}", query, e);
        }
        Ok(response)
    }
}
