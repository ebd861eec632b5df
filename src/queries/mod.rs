use crate::errors::ServiceError;
use async_trait::async_trait;
use sea_orm::DatabaseConnection;

/// Query trait for read-side operations. Queries never mutate state and
/// never publish events.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

pub mod batch_queries;
pub mod wip_queries;
