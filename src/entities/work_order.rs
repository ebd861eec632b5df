use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Planning container for production batches. Read-mostly from the core's
/// point of view; it is never the source of stage or quantity truth.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_number: String,
    pub customer: Option<String>,
    pub item_code: Option<String>,
    pub quantity: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub gross_weight_per_pc: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::production_batch::Entity")]
    ProductionBatches,
    #[sea_orm(has_many = "super::external_move::Entity")]
    ExternalMoves,
    #[sea_orm(has_many = "super::carton::Entity")]
    Cartons,
}

impl Related<super::production_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionBatches.def()
    }
}

impl Related<super::external_move::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExternalMoves.def()
    }
}

impl Related<super::carton::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cartons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
