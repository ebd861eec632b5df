use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One production event against a batch. The latest `logged_at` per batch
/// drives the gap-restart policy; the quantity columns are the source for
/// the batch's mirrored `produced_qty` / `qc_rejected_qty` totals.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub work_order_id: Uuid,
    pub quantity: i32,
    pub rejected_qty: i32,
    pub logged_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production_batch::Entity",
        from = "Column::BatchId",
        to = "super::production_batch::Column::Id"
    )]
    ProductionBatch,
}

impl Related<super::production_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionBatch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
