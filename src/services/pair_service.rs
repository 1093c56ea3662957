use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::error::AppError;
use crate::models::dto::PairOut;
use crate::models::matches::{self, MatchDecision};
use crate::models::{pairs, pets};
use crate::utils::pagination::Window;

pub struct PairService;

/// (a, b) -> (min, max)
fn sorted_users(a: i32, b: i32) -> (i32, i32) {
    if a < b { (a, b) } else { (b, a) }
}

impl PairService {
    /// Appelé après un "liked": forme une paire si les deux utilisateurs
    /// ont chacun liké au moins un pet de l'autre.
    /// Renvoie None (sans erreur) si le pet n'existe pas ou appartient au liker.
    pub async fn try_create_pair_on_mutual_like<C: ConnectionTrait>(
        db: &C,
        liker_user_id: i32,
        target_pet_id: i32,
    ) -> Result<Option<pairs::Model>, DbErr> {
        let Some(pet) = pets::Entity::find_by_id(target_pet_id).one(db).await? else {
            return Ok(None);
        };
        if pet.owner_id == liker_user_id {
            return Ok(None);
        }
        let target_owner_id = pet.owner_id;

        // (a) pets du propriétaire cible likés par le liker
        let liker_likes = Self::liked_pet_ids(db, liker_user_id, target_owner_id).await?;
        if liker_likes.is_empty() {
            return Ok(None);
        }

        // (b) pets du liker likés par le propriétaire cible
        let target_likes = Self::liked_pet_ids(db, target_owner_id, liker_user_id).await?;
        if target_likes.is_empty() {
            return Ok(None);
        }

        let pair = Self::upsert_pair_for_users(db, liker_user_id, target_owner_id).await?;
        if let Some(pair) = &pair {
            tracing::info!(
                pair_id = pair.id,
                user_low_id = pair.user_low_id,
                user_high_id = pair.user_high_id,
                "mutual like, pair ready"
            );
        }
        Ok(pair)
    }

    /// Ids des pets de `pet_owner_id` que `liker_id` a likés
    async fn liked_pet_ids<C: ConnectionTrait>(
        db: &C,
        liker_id: i32,
        pet_owner_id: i32,
    ) -> Result<Vec<i32>, DbErr> {
        matches::Entity::find()
            .select_only()
            .column(matches::Column::TargetPetId)
            .inner_join(pets::Entity)
            .filter(matches::Column::OwnerUserId.eq(liker_id))
            .filter(matches::Column::Decision.eq(MatchDecision::Liked))
            .filter(pets::Column::OwnerId.eq(pet_owner_id))
            .into_tuple::<i32>()
            .all(db)
            .await
    }

    /// Insert-or-fetch atomique sur (user_low_id, user_high_id)
    pub async fn upsert_pair_for_users<C: ConnectionTrait>(
        db: &C,
        a_user_id: i32,
        b_user_id: i32,
    ) -> Result<Option<pairs::Model>, DbErr> {
        if a_user_id == b_user_id {
            return Ok(None);
        }
        let (low, high) = sorted_users(a_user_id, b_user_id);

        let pair = pairs::ActiveModel {
            user_low_id: Set(low),
            user_high_id: Set(high),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let inserted = pairs::Entity::insert(pair)
            .on_conflict(
                OnConflict::columns([pairs::Column::UserLowId, pairs::Column::UserHighId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;

        match inserted {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }

        pairs::Entity::find()
            .filter(pairs::Column::UserLowId.eq(low))
            .filter(pairs::Column::UserHighId.eq(high))
            .one(db)
            .await
    }

    /// Paires de l'utilisateur, plus récentes d'abord, avec le total
    pub async fn list_pairs_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: i32,
        window: Window,
    ) -> Result<(Vec<PairOut>, u64), AppError> {
        let query = pairs::Entity::find().filter(
            Condition::any()
                .add(pairs::Column::UserLowId.eq(user_id))
                .add(pairs::Column::UserHighId.eq(user_id)),
        );

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(pairs::Column::CreatedAt)
            .order_by_desc(pairs::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?
            .into_iter()
            .map(|pair| PairOut {
                id: pair.id,
                other_user_id: pair.other_user(user_id),
                created_at: pair.created_at,
            })
            .collect();

        Ok((items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{create_pet, create_user, setup_db};
    use crate::models::pets::Gender;

    async fn like<C: ConnectionTrait>(db: &C, owner: i32, pet: i32) {
        matches::ActiveModel {
            owner_user_id: Set(owner),
            target_pet_id: Set(pet),
            decision: Set(MatchDecision::Liked),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[test]
    fn test_sorted_users() {
        assert_eq!(sorted_users(7, 3), (3, 7));
        assert_eq!(sorted_users(3, 7), (3, 7));
    }

    #[tokio::test]
    async fn test_one_sided_like_forms_no_pair() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let _p1 = create_pet(&db, a.id, "P1", "dog", Gender::Male).await;
        let p2 = create_pet(&db, b.id, "P2", "dog", Gender::Female).await;

        like(&db, a.id, p2.id).await;
        let pair = PairService::try_create_pair_on_mutual_like(&db, a.id, p2.id)
            .await
            .unwrap();

        assert!(pair.is_none());
        assert_eq!(pairs::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mutual_like_forms_one_ordered_pair() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let p1 = create_pet(&db, a.id, "P1", "dog", Gender::Male).await;
        let p2 = create_pet(&db, b.id, "P2", "dog", Gender::Female).await;

        like(&db, a.id, p2.id).await;
        like(&db, b.id, p1.id).await;

        let first = PairService::try_create_pair_on_mutual_like(&db, b.id, p1.id)
            .await
            .unwrap()
            .unwrap();
        let again = PairService::try_create_pair_on_mutual_like(&db, a.id, p2.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.id, again.id);
        assert_eq!(first.user_low_id, a.id.min(b.id));
        assert_eq!(first.user_high_id, a.id.max(b.id));
        assert_eq!(pairs::Entity::find().count(&db).await.unwrap(), 1);

        let window = Window { limit: 20, offset: 0 };
        let (for_a, total_a) = PairService::list_pairs_for_user(&db, a.id, window).await.unwrap();
        let (for_b, total_b) = PairService::list_pairs_for_user(&db, b.id, window).await.unwrap();
        assert_eq!((total_a, total_b), (1, 1));
        assert_eq!(for_a[0].other_user_id, b.id);
        assert_eq!(for_b[0].other_user_id, a.id);
    }

    #[tokio::test]
    async fn test_self_owned_or_missing_pet_is_ignored() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let p1 = create_pet(&db, a.id, "P1", "dog", Gender::Male).await;

        assert!(PairService::try_create_pair_on_mutual_like(&db, a.id, p1.id).await.unwrap().is_none());
        assert!(PairService::try_create_pair_on_mutual_like(&db, a.id, 999).await.unwrap().is_none());
        assert!(PairService::upsert_pair_for_users(&db, a.id, a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_pairs_excludes_other_users() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let c = create_user(&db, "c@example.com").await;

        PairService::upsert_pair_for_users(&db, b.id, c.id).await.unwrap();

        let (items, total) = PairService::list_pairs_for_user(&db, a.id, Window { limit: 20, offset: 0 })
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 0);
    }
}
