pub mod batches;
pub mod wip;

use std::sync::Arc;

use axum::Router;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{batches::BatchService, wip::WipService},
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub batches: Arc<BatchService>,
    pub wip: Arc<WipService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let batches = Arc::new(BatchService::new(
            db_pool.clone(),
            event_sender,
            config.gap_threshold_days,
        ));
        let wip = Arc::new(WipService::new(db_pool));
        Self { batches, wip }
    }
}

/// Versioned API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/work-orders", batches::work_orders_router())
        .nest("/batches", batches::batches_router())
        .nest("/wip", wip::wip_router())
}
