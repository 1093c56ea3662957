use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

// Relation mutuelle entre deux utilisateurs, indépendante de l'ordre:
// user_low_id < user_high_id, unique via l'index uq_pair_users (voir db.rs)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pairs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_low_id: i32,
    pub user_high_id: i32,
    pub created_at: DateTimeUtc,
}

impl Model {
    pub fn has_member(&self, user_id: i32) -> bool {
        self.user_low_id == user_id || self.user_high_id == user_id
    }

    /// L'autre membre de la paire, vu depuis user_id
    pub fn other_user(&self, user_id: i32) -> i32 {
        if self.user_low_id == user_id {
            self.user_high_id
        } else {
            self.user_low_id
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserLowId",
        to = "super::users::Column::Id"
    )]
    UserLow,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserHighId",
        to = "super::users::Column::Id"
    )]
    UserHigh,

    #[sea_orm(has_many = "super::messages::Entity")]
    Messages,
}

impl Related<super::messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
