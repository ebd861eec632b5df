use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// External processing partner directory entry; display names for the
/// movement and WIP views.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "external_partners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::external_move::Entity")]
    ExternalMoves,
}

impl Related<super::external_move::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExternalMoves.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
