use nq_core::{ArticleStorage, Ingestor};
use nq_query::ChatService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub ingestor: Arc<dyn Ingestor>,
    pub articles: Arc<dyn ArticleStorage>,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>, ingestor: Arc<dyn Ingestor>, articles: Arc<dyn ArticleStorage>) -> Self {
        Self {
            chat,
            ingestor,
            articles,
        }
    }
}
