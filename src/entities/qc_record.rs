use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum QcType {
    #[sea_orm(string_value = "material")]
    Material,
    #[sea_orm(string_value = "first_piece")]
    FirstPiece,
    #[sea_orm(string_value = "final")]
    Final,
    #[sea_orm(string_value = "post_external")]
    PostExternal,
}

/// Stored two-valued result. A waiver is flattened to `Pass` plus a
/// populated `waive_reason` at this boundary; business logic never works
/// with the flattened form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum QcResult {
    #[sea_orm(string_value = "pass")]
    Pass,
    #[sea_orm(string_value = "fail")]
    Fail,
}

/// Append-only audit trail. Rows are created once per submission and never
/// mutated; history views order by `created_at`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "qc_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Null means a work-order-level legacy record.
    pub batch_id: Option<Uuid>,
    pub work_order_id: Uuid,
    pub qc_type: QcType,
    pub result: QcResult,
    pub inspected_quantity: Option<i32>,
    pub waive_reason: Option<String>,
    pub remarks: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_waiver(&self) -> bool {
        self.result == QcResult::Pass && self.waive_reason.is_some()
    }
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
