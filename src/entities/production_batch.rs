use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    #[sea_orm(string_value = "cutting")]
    Cutting,
    #[sea_orm(string_value = "production")]
    Production,
    #[sea_orm(string_value = "external")]
    External,
    #[sea_orm(string_value = "qc")]
    Qc,
    #[sea_orm(string_value = "packing")]
    Packing,
    #[sea_orm(string_value = "dispatched")]
    Dispatched,
}

impl StageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageType::Cutting => "cutting",
            StageType::Production => "production",
            StageType::External => "external",
            StageType::Qc => "qc",
            StageType::Packing => "packing",
            StageType::Dispatched => "dispatched",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[sea_orm(string_value = "in_queue")]
    InQueue,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    #[sea_orm(string_value = "initial")]
    Initial,
    #[sea_orm(string_value = "post_dispatch")]
    PostDispatch,
    #[sea_orm(string_value = "gap_restart")]
    GapRestart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum QcGateStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "passed")]
    Passed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "waived")]
    Waived,
}

impl QcGateStatus {
    /// A gate is satisfied for downstream-permission purposes by a clean
    /// pass or an explicit waiver.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, QcGateStatus::Passed | QcGateStatus::Waived)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub work_order_id: Uuid,
    /// Monotonically increasing per work order, starting at 1.
    pub batch_number: i32,
    pub trigger_reason: TriggerReason,
    pub previous_batch_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub stage_type: StageType,
    pub batch_status: BatchStatus,
    pub stage_entered_at: DateTime<Utc>,
    pub external_process_type: Option<String>,
    pub external_partner_id: Option<Uuid>,
    pub external_sent_at: Option<DateTime<Utc>>,
    pub external_returned_at: Option<DateTime<Utc>>,
    pub requires_qc_on_return: bool,
    pub post_external_qc_status: Option<QcGateStatus>,
    pub batch_quantity: i32,
    pub produced_qty: i32,
    pub qc_rejected_qty: i32,
    pub qc_approved_qty: i32,
    pub qc_material_status: QcGateStatus,
    pub qc_material_approved_by: Option<Uuid>,
    pub qc_material_approved_at: Option<DateTime<Utc>>,
    pub qc_first_piece_status: QcGateStatus,
    pub qc_first_piece_approved_by: Option<Uuid>,
    pub qc_first_piece_approved_at: Option<DateTime<Utc>>,
    pub qc_final_status: QcGateStatus,
    pub qc_final_approved_by: Option<Uuid>,
    pub qc_final_approved_at: Option<DateTime<Utc>>,
    /// Derived from the gate statuses, never set independently.
    pub production_allowed: bool,
    pub dispatch_allowed: bool,
    /// Optimistic concurrency guard; every successful write increments it.
    pub row_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Closed batches are immutable except for QC history appended against
    /// them.
    pub fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
    #[sea_orm(has_many = "super::qc_record::Entity")]
    QcRecords,
    #[sea_orm(has_many = "super::production_log::Entity")]
    ProductionLogs,
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
    }
}

impl Related<super::qc_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QcRecords.def()
    }
}

impl Related<super::production_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
