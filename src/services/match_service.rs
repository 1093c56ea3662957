use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;

use crate::error::AppError;
use crate::models::matches::{self, MatchDecision};
use crate::models::pets::{self, Gender};
use crate::services::pair_service::PairService;
use crate::utils::pagination::Window;

pub struct MatchService;

impl MatchService {
    /// Renvoie le match (owner, pet cible), en le créant "undecided" si besoin.
    /// NotFound si le pet n'existe pas, BadRequest si c'est un pet du demandeur.
    pub async fn ensure_match_for_decision<C: ConnectionTrait>(
        db: &C,
        owner_user_id: i32,
        target_pet_id: i32,
    ) -> Result<matches::Model, AppError> {
        let pet = pets::Entity::find_by_id(target_pet_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Target pet not found.".to_string()))?;

        if pet.owner_id == owner_user_id {
            return Err(AppError::BadRequest("Cannot match against own pet.".to_string()));
        }

        Self::insert_or_fetch(db, owner_user_id, target_pet_id).await?;

        Self::find_match(db, owner_user_id, target_pet_id)
            .await?
            .ok_or_else(|| AppError::Internal("match vanished after insert".to_string()))
    }

    /// INSERT ... ON CONFLICT DO NOTHING; renvoie true si une ligne a été créée
    async fn insert_or_fetch<C: ConnectionTrait>(
        db: &C,
        owner_user_id: i32,
        target_pet_id: i32,
    ) -> Result<bool, DbErr> {
        let new_match = matches::ActiveModel {
            owner_user_id: Set(owner_user_id),
            target_pet_id: Set(target_pet_id),
            decision: Set(MatchDecision::Undecided),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let inserted = matches::Entity::insert(new_match)
            .on_conflict(
                OnConflict::columns([matches::Column::OwnerUserId, matches::Column::TargetPetId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn find_match<C: ConnectionTrait>(
        db: &C,
        owner_user_id: i32,
        target_pet_id: i32,
    ) -> Result<Option<matches::Model>, DbErr> {
        matches::Entity::find()
            .filter(matches::Column::OwnerUserId.eq(owner_user_id))
            .filter(matches::Column::TargetPetId.eq(target_pet_id))
            .one(db)
            .await
    }

    /// Enregistre une décision; un "liked" déclenche la formation de paire
    pub async fn decide_match<C: ConnectionTrait>(
        db: &C,
        owner_user_id: i32,
        target_pet_id: i32,
        decision: MatchDecision,
    ) -> Result<matches::Model, AppError> {
        let mut current = Self::ensure_match_for_decision(db, owner_user_id, target_pet_id).await?;

        if current.decision != decision {
            let mut active: matches::ActiveModel = current.into();
            active.decision = Set(decision);
            current = active.update(db).await?;
        }

        if decision == MatchDecision::Liked {
            PairService::try_create_pair_on_mutual_like(db, owner_user_id, target_pet_id).await?;
        }

        Ok(current)
    }

    /// Page des matches du demandeur (pet cible encore existant), plus récents d'abord
    pub async fn list_matches<C: ConnectionTrait>(
        db: &C,
        owner_user_id: i32,
        decision: Option<MatchDecision>,
        window: Window,
    ) -> Result<(Vec<matches::Model>, u64), AppError> {
        let mut query = matches::Entity::find()
            .inner_join(pets::Entity)
            .filter(matches::Column::OwnerUserId.eq(owner_user_id));

        if let Some(decision) = decision {
            query = query.filter(matches::Column::Decision.eq(decision));
        }

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(matches::Column::CreatedAt)
            .order_by_desc(matches::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;

        Ok((items, total))
    }

    /// Supprime le match s'il existe; renvoie true si une ligne a été supprimée
    pub async fn delete_match<C: ConnectionTrait>(
        db: &C,
        owner_user_id: i32,
        target_pet_id: i32,
    ) -> Result<bool, AppError> {
        let result = matches::Entity::delete_many()
            .filter(matches::Column::OwnerUserId.eq(owner_user_id))
            .filter(matches::Column::TargetPetId.eq(target_pet_id))
            .exec(db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Nombre de matches par décision; les trois clés sont toujours présentes
    pub async fn count_by_decision<C: ConnectionTrait>(
        db: &C,
        owner_user_id: i32,
    ) -> Result<BTreeMap<String, i64>, AppError> {
        let mut counts: BTreeMap<String, i64> = MatchDecision::iter()
            .map(|decision| (decision.as_str().to_string(), 0))
            .collect();

        let rows: Vec<(MatchDecision, i64)> = matches::Entity::find()
            .select_only()
            .column(matches::Column::Decision)
            .column_as(Expr::col(matches::Column::Id).count(), "total")
            .filter(matches::Column::OwnerUserId.eq(owner_user_id))
            .group_by(matches::Column::Decision)
            .into_tuple()
            .all(db)
            .await?;

        for (decision, total) in rows {
            counts.insert(decision.as_str().to_string(), total);
        }

        Ok(counts)
    }

    /// Crée des matches "undecided" vers au plus `limit` pets candidats
    /// (pas au demandeur, pas déjà matchés, filtres optionnels).
    /// Ordre déterministe: id croissant.
    pub async fn generate_matches<C: ConnectionTrait>(
        db: &C,
        owner_user_id: i32,
        species: Option<&str>,
        gender: Option<Gender>,
        limit: u64,
    ) -> Result<(u64, Vec<pets::Model>), AppError> {
        if limit == 0 {
            return Ok((0, Vec::new()));
        }

        let already_matched: Vec<i32> = matches::Entity::find()
            .select_only()
            .column(matches::Column::TargetPetId)
            .filter(matches::Column::OwnerUserId.eq(owner_user_id))
            .into_tuple()
            .all(db)
            .await?;

        let mut query = pets::Entity::find().filter(pets::Column::OwnerId.ne(owner_user_id));
        if let Some(species) = species.filter(|s| !s.is_empty()) {
            query = query.filter(pets::Column::Species.eq(species));
        }
        if let Some(gender) = gender {
            query = query.filter(pets::Column::Gender.eq(gender));
        }
        if !already_matched.is_empty() {
            query = query.filter(pets::Column::Id.is_not_in(already_matched));
        }

        let candidates = query
            .order_by_asc(pets::Column::Id)
            .limit(limit)
            .all(db)
            .await?;

        let mut created = 0;
        for pet in &candidates {
            if Self::insert_or_fetch(db, owner_user_id, pet.id).await? {
                created += 1;
            }
        }

        tracing::debug!(owner_user_id, created, candidates = candidates.len(), "matches generated");

        Ok((created, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{create_pet, create_user, setup_db};
    use crate::models::pairs;

    fn window(limit: u64, offset: u64) -> Window {
        Window { limit, offset }
    }

    #[tokio::test]
    async fn test_decide_twice_is_idempotent() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let p2 = create_pet(&db, b.id, "P2", "cat", Gender::Female).await;

        let first = MatchService::decide_match(&db, a.id, p2.id, MatchDecision::Passed).await.unwrap();
        let second = MatchService::decide_match(&db, a.id, p2.id, MatchDecision::Passed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.decision, MatchDecision::Passed);
        assert_eq!(matches::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_decision_can_change() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let p2 = create_pet(&db, b.id, "P2", "cat", Gender::Female).await;

        MatchService::decide_match(&db, a.id, p2.id, MatchDecision::Passed).await.unwrap();
        let updated = MatchService::decide_match(&db, a.id, p2.id, MatchDecision::Liked).await.unwrap();

        assert_eq!(updated.decision, MatchDecision::Liked);
        assert_eq!(matches::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cannot_match_own_pet() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let own = create_pet(&db, a.id, "Mine", "dog", Gender::Male).await;

        let result = MatchService::decide_match(&db, a.id, own.id, MatchDecision::Liked).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result = MatchService::ensure_match_for_decision(&db, a.id, own.id).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(matches::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_target_pet() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;

        let result = MatchService::decide_match(&db, a.id, 999, MatchDecision::Liked).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mutual_like_scenario() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let p1 = create_pet(&db, a.id, "P1", "dog", Gender::Male).await;
        let p2 = create_pet(&db, b.id, "P2", "dog", Gender::Female).await;
        let p3 = create_pet(&db, b.id, "P3", "dog", Gender::Male).await;

        MatchService::decide_match(&db, a.id, p2.id, MatchDecision::Liked).await.unwrap();
        assert_eq!(pairs::Entity::find().count(&db).await.unwrap(), 0);

        MatchService::decide_match(&db, b.id, p1.id, MatchDecision::Liked).await.unwrap();
        assert_eq!(pairs::Entity::find().count(&db).await.unwrap(), 1);

        // Un troisième like ne crée pas de seconde paire
        MatchService::decide_match(&db, a.id, p3.id, MatchDecision::Liked).await.unwrap();
        assert_eq!(pairs::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_passed_never_forms_pair() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let p1 = create_pet(&db, a.id, "P1", "dog", Gender::Male).await;
        let p2 = create_pet(&db, b.id, "P2", "dog", Gender::Female).await;

        MatchService::decide_match(&db, a.id, p2.id, MatchDecision::Liked).await.unwrap();
        MatchService::decide_match(&db, b.id, p1.id, MatchDecision::Passed).await.unwrap();

        assert_eq!(pairs::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_by_decision_has_all_keys() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let p2 = create_pet(&db, b.id, "P2", "dog", Gender::Female).await;
        let p3 = create_pet(&db, b.id, "P3", "dog", Gender::Female).await;
        let p4 = create_pet(&db, b.id, "P4", "dog", Gender::Female).await;

        let empty = MatchService::count_by_decision(&db, a.id).await.unwrap();
        assert_eq!(empty.len(), 3);
        assert!(empty.values().all(|v| *v == 0));

        MatchService::decide_match(&db, a.id, p2.id, MatchDecision::Liked).await.unwrap();
        MatchService::decide_match(&db, a.id, p3.id, MatchDecision::Liked).await.unwrap();
        MatchService::ensure_match_for_decision(&db, a.id, p4.id).await.unwrap();

        let counts = MatchService::count_by_decision(&db, a.id).await.unwrap();
        assert_eq!(counts["liked"], 2);
        assert_eq!(counts["undecided"], 1);
        assert_eq!(counts["passed"], 0);
    }

    #[tokio::test]
    async fn test_delete_match() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let p2 = create_pet(&db, b.id, "P2", "dog", Gender::Female).await;

        MatchService::decide_match(&db, a.id, p2.id, MatchDecision::Passed).await.unwrap();

        assert!(MatchService::delete_match(&db, a.id, p2.id).await.unwrap());
        assert!(!MatchService::delete_match(&db, a.id, p2.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_matches_filter_and_pages() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;

        for i in 0..5 {
            let pet = create_pet(&db, b.id, &format!("P{}", i), "dog", Gender::Male).await;
            let decision = if i % 2 == 0 { MatchDecision::Liked } else { MatchDecision::Passed };
            MatchService::decide_match(&db, a.id, pet.id, decision).await.unwrap();
        }

        let (page1, total) = MatchService::list_matches(&db, a.id, None, window(2, 0)).await.unwrap();
        let (page2, _) = MatchService::list_matches(&db, a.id, None, window(2, 2)).await.unwrap();
        assert_eq!(total, 5);
        assert!(page1.iter().all(|x| page2.iter().all(|y| x.id != y.id)));

        let (liked, liked_total) =
            MatchService::list_matches(&db, a.id, Some(MatchDecision::Liked), window(10, 0)).await.unwrap();
        assert_eq!(liked_total, 3);
        assert_eq!(liked.len(), 3);
        assert!(liked.iter().all(|m| m.decision == MatchDecision::Liked));

        // Les matches d'un autre utilisateur ne sont pas visibles
        let (_, other_total) = MatchService::list_matches(&db, b.id, None, window(10, 0)).await.unwrap();
        assert_eq!(other_total, 0);
    }

    #[tokio::test]
    async fn test_generate_matches() {
        let db = setup_db().await;
        let a = create_user(&db, "a@example.com").await;
        let b = create_user(&db, "b@example.com").await;
        let _own = create_pet(&db, a.id, "Mine", "dog", Gender::Male).await;
        let d1 = create_pet(&db, b.id, "D1", "dog", Gender::Female).await;
        let _c1 = create_pet(&db, b.id, "C1", "cat", Gender::Female).await;
        let d2 = create_pet(&db, b.id, "D2", "dog", Gender::Male).await;

        MatchService::decide_match(&db, a.id, d1.id, MatchDecision::Passed).await.unwrap();

        let (created, candidates) =
            MatchService::generate_matches(&db, a.id, Some("dog"), None, 10).await.unwrap();
        assert_eq!(created, 1);
        assert_eq!(candidates.iter().map(|p| p.id).collect::<Vec<_>>(), vec![d2.id]);

        // Plus rien à générer pour les chiens
        let (created, candidates) =
            MatchService::generate_matches(&db, a.id, Some("dog"), None, 10).await.unwrap();
        assert_eq!(created, 0);
        assert!(candidates.is_empty());

        let (created, candidates) =
            MatchService::generate_matches(&db, a.id, None, Some(Gender::Female), 1).await.unwrap();
        assert_eq!(created, 1);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].species, "cat");
    }
}
