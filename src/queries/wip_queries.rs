use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::{
    entities::{carton, external_move, external_partner, production_batch, work_order},
    errors::ServiceError,
    models::wip::{self, WipSnapshot},
    queries::Query,
};

/// Rebuilds the full WIP picture from the current set of batch, movement
/// and carton records. Always a from-scratch recomputation over all active
/// rows; the cost is O(total active rows), which is the intended trade at
/// hundreds of concurrent batches.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetWipSnapshotQuery;

#[async_trait]
impl Query for GetWipSnapshotQuery {
    type Result = WipSnapshot;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let batches = production_batch::Entity::find()
            .filter(production_batch::Column::EndedAt.is_null())
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let work_orders = work_order::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let moves = external_move::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let cartons = carton::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let partners = external_partner::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let started = std::time::Instant::now();
        let snapshot = wip::build_snapshot(
            Utc::now(),
            &batches,
            &work_orders,
            &moves,
            &cartons,
            &partners,
        );
        metrics::histogram!(
            "shopfloor.wip.recompute_seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(snapshot)
    }
}
