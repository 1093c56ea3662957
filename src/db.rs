// connexion BD + création du schéma

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

use crate::models::{matches, messages, pairs, pets, photos, users};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Crée les tables (si absentes) à partir des entités, puis les index.
/// L'ordre respecte les clés étrangères.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, pets::Entity).await?;
    create_table(db, photos::Entity).await?;
    create_table(db, matches::Entity).await?;
    create_table(db, pairs::Entity).await?;
    create_table(db, messages::Entity).await?;

    for index in indexes() {
        let backend = db.get_database_backend();
        db.execute(backend.build(&index)).await?;
    }

    Ok(())
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        // Une seule décision par (utilisateur, pet cible)
        Index::create()
            .name("uq_match_owner_target")
            .table(matches::Entity)
            .col(matches::Column::OwnerUserId)
            .col(matches::Column::TargetPetId)
            .unique()
            .if_not_exists()
            .to_owned(),
        // Une seule paire par couple d'utilisateurs (low < high)
        Index::create()
            .name("uq_pair_users")
            .table(pairs::Entity)
            .col(pairs::Column::UserLowId)
            .col(pairs::Column::UserHighId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ix_pets_owner_id")
            .table(pets::Entity)
            .col(pets::Column::OwnerId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ix_photos_pet_id_created_at")
            .table(photos::Entity)
            .col(photos::Column::PetId)
            .col(photos::Column::CreatedAt)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ix_matches_target_pet_id")
            .table(matches::Entity)
            .col(matches::Column::TargetPetId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ix_messages_pair_id_created_at")
            .table(messages::Entity)
            .col(messages::Column::PairId)
            .col(messages::Column::CreatedAt)
            .if_not_exists()
            .to_owned(),
    ]
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let db = setup_db().await;
        create_schema(&db).await.unwrap();
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        use chrono::Utc;
        use sea_orm::{ActiveModelTrait, Set};

        let db = setup_db().await;
        create_user(&db, "dup@example.com").await;

        let duplicate = users::ActiveModel {
            email: Set("dup@example.com".to_string()),
            password_hash: Set("unused".to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await;

        assert!(duplicate.is_err());
    }
}
