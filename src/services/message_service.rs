use chrono::Utc;
use sea_orm::*;

use crate::error::AppError;
use crate::models::{messages, pairs};
use crate::utils::pagination::Window;

pub struct MessageService;

impl MessageService {
    async fn participant_pair<C: ConnectionTrait>(
        db: &C,
        pair_id: i32,
        user_id: i32,
    ) -> Result<pairs::Model, AppError> {
        let pair = pairs::Entity::find_by_id(pair_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Pair not found.".to_string()))?;

        if !pair.has_member(user_id) {
            return Err(AppError::Forbidden("User is not part of this pair.".to_string()));
        }

        Ok(pair)
    }

    /// Ajoute un message (corps trimé, non vide) dans une paire dont l'expéditeur est membre
    pub async fn send_message<C: ConnectionTrait>(
        db: &C,
        pair_id: i32,
        sender_user_id: i32,
        body: &str,
    ) -> Result<messages::Model, AppError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Unprocessable("Message body cannot be empty.".to_string()));
        }

        Self::participant_pair(db, pair_id, sender_user_id).await?;

        let message = messages::ActiveModel {
            pair_id: Set(pair_id),
            sender_user_id: Set(sender_user_id),
            body: Set(body.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(message)
    }

    /// Messages de la paire en ordre chronologique, avec le total
    pub async fn list_messages<C: ConnectionTrait>(
        db: &C,
        pair_id: i32,
        requester_user_id: i32,
        window: Window,
    ) -> Result<(Vec<messages::Model>, u64), AppError> {
        Self::participant_pair(db, pair_id, requester_user_id).await?;

        let query = messages::Entity::find().filter(messages::Column::PairId.eq(pair_id));

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_asc(messages::Column::CreatedAt)
            .order_by_asc(messages::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;

        Ok((items, total))
    }
}
