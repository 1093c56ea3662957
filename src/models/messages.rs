use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub pair_id: i32,
    pub sender_user_id: i32,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pairs::Entity",
        from = "Column::PairId",
        to = "super::pairs::Column::Id"
    )]
    Pair,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SenderUserId",
        to = "super::users::Column::Id"
    )]
    Sender,
}

impl Related<super::pairs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pair.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
