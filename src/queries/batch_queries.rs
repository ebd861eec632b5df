use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::{production_batch, qc_record},
    errors::ServiceError,
    models::quality::BatchQcData,
    queries::Query,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct GetBatchQcDataQuery {
    pub batch_id: Uuid,
}

#[async_trait]
impl Query for GetBatchQcDataQuery {
    type Result = BatchQcData;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        production_batch::Entity::find_by_id(self.batch_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .map(|batch| BatchQcData::from(&batch))
            .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", self.batch_id)))
    }
}

/// Immutable QC history of a batch, oldest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetBatchQcHistoryQuery {
    pub batch_id: Uuid,
}

#[async_trait]
impl Query for GetBatchQcHistoryQuery {
    type Result = Vec<qc_record::Model>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        qc_record::Entity::find()
            .filter(qc_record::Column::BatchId.eq(self.batch_id))
            .order_by_asc(qc_record::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// QC records filed at work-order level (legacy rows with no batch) plus
/// those of every batch on the order, for audit display.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetWorkOrderQcHistoryQuery {
    pub work_order_id: Uuid,
}

#[async_trait]
impl Query for GetWorkOrderQcHistoryQuery {
    type Result = Vec<qc_record::Model>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        qc_record::Entity::find()
            .filter(qc_record::Column::WorkOrderId.eq(self.work_order_id))
            .order_by_asc(qc_record::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// All batches of a work order, newest first. Several may be active at
/// once; there is no single "current" batch.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetWorkOrderBatchesQuery {
    pub work_order_id: Uuid,
    pub include_closed: bool,
}

#[async_trait]
impl Query for GetWorkOrderBatchesQuery {
    type Result = Vec<production_batch::Model>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut select = production_batch::Entity::find()
            .filter(production_batch::Column::WorkOrderId.eq(self.work_order_id));
        if !self.include_closed {
            select = select.filter(production_batch::Column::EndedAt.is_null());
        }
        select
            .order_by_desc(production_batch::Column::BatchNumber)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}
