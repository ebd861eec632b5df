use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ExternalMoveStatus {
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "returned")]
    Returned,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ExternalMoveStatus {
    /// Open moves still hold WIP at the partner.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ExternalMoveStatus::Sent | ExternalMoveStatus::InTransit | ExternalMoveStatus::Partial
        )
    }
}

/// Movement of quantities to and from an external processing partner.
/// Consumed by the WIP aggregation and partner analytics only; the gate
/// engine never reads these rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "external_moves")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub work_order_id: Uuid,
    pub partner_id: Option<Uuid>,
    pub process: String,
    pub quantity_sent: i32,
    pub quantity_returned: i32,
    pub quantity_rejected: i32,
    pub sent_date: DateTime<Utc>,
    pub expected_return_date: Option<DateTime<Utc>>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub status: ExternalMoveStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
    #[sea_orm(
        belongs_to = "super::external_partner::Entity",
        from = "Column::PartnerId",
        to = "super::external_partner::Column::Id"
    )]
    ExternalPartner,
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
    }
}

impl Related<super::external_partner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExternalPartner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
