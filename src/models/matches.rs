use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum MatchDecision {
    #[sea_orm(string_value = "undecided")]
    Undecided,
    #[sea_orm(string_value = "liked")]
    Liked,
    #[sea_orm(string_value = "passed")]
    Passed,
}

impl MatchDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchDecision::Undecided => "undecided",
            MatchDecision::Liked => "liked",
            MatchDecision::Passed => "passed",
        }
    }
}

// Une décision d'un utilisateur sur un pet d'un autre utilisateur.
// Unique sur (owner_user_id, target_pet_id): index uq_match_owner_target (voir db.rs)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "matches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_user_id: i32,
    pub target_pet_id: i32,
    pub decision: MatchDecision,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerUserId",
        to = "super::users::Column::Id"
    )]
    Owner,

    #[sea_orm(
        belongs_to = "super::pets::Entity",
        from = "Column::TargetPetId",
        to = "super::pets::Column::Id"
    )]
    TargetPet,
}

impl Related<super::pets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TargetPet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
