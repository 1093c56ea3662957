use std::collections::HashMap;
use std::path::{Path, PathBuf};

use actix_web::web::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{pets, photos};
use crate::utils::pagination::Window;

/// Stockage des photos: fichiers sur disque + lignes en base.
/// Construit une fois depuis la Config, partagé via web::Data.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    media_dir: PathBuf,
    base_url: String,
    max_bytes: u64,
    allowed: Vec<String>,
}

/// Extension du fichier selon le type MIME déclaré
pub fn extension_for(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/jpeg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/webp" => Some(".webp"),
        _ => None,
    }
}

impl PhotoStore {
    pub fn new(
        media_dir: impl Into<PathBuf>,
        base_url: &str,
        max_bytes: u64,
        allowed: Vec<String>,
    ) -> Self {
        PhotoStore {
            media_dir: media_dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_bytes,
            allowed,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.media_dir,
            &config.media_base_url,
            config.photo_max_bytes,
            config.photo_allowed.clone(),
        )
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    pub async fn ensure_media_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.media_dir).await
    }

    fn build_url(&self, filename: &str) -> String {
        format!("{}/{}", self.base_url, filename)
    }

    /// Enregistre une photo pour un pet.
    ///
    /// Le flux est écrit sur disque chunk par chunk; au-delà de `max_bytes`
    /// l'écriture est abandonnée (413) et le fichier partiel supprimé.
    /// La première photo du pet devient primaire.
    pub async fn save_photo<C, S, E>(
        &self,
        db: &C,
        pet_id: i32,
        content_type: Option<&str>,
        stream: S,
    ) -> Result<photos::Model, AppError>
    where
        C: ConnectionTrait,
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<AppError>,
    {
        // 1. Le pet doit exister
        pets::Entity::find_by_id(pet_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("pet not found".to_string()))?;

        // 2. Type MIME autorisé
        let mime_type = content_type.unwrap_or_default().trim().to_lowercase();
        let extension = extension_for(&mime_type)
            .filter(|_| self.allowed.iter().any(|a| a == &mime_type))
            .ok_or_else(|| AppError::BadRequest("unsupported photo type".to_string()))?;

        // 3. Écriture sur disque avec limite de taille
        self.ensure_media_dir().await?;
        let filename = format!("{}_{}{}", pet_id, Uuid::new_v4().simple(), extension);
        let destination = self.media_dir.join(&filename);

        let size = match self.write_stream(&destination, stream).await {
            Ok(size) => size,
            Err(e) => {
                remove_quietly(&destination).await;
                return Err(e);
            }
        };

        // 4. Métadonnées en base; en cas d'échec le fichier est retiré
        match self.persist(db, pet_id, &filename, &mime_type, size).await {
            Ok(photo) => {
                tracing::info!(photo_id = photo.id, pet_id, size, "photo saved");
                Ok(photo)
            }
            Err(e) => {
                remove_quietly(&destination).await;
                Err(e)
            }
        }
    }

    async fn write_stream<S, E>(&self, destination: &Path, mut stream: S) -> Result<u64, AppError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<AppError>,
    {
        let mut file = tokio::fs::File::create(destination).await?;
        let mut size: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(Into::<AppError>::into)?;
            size += chunk.len() as u64;
            if size > self.max_bytes {
                return Err(AppError::PayloadTooLarge("photo too large".to_string()));
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(size)
    }

    async fn persist<C: ConnectionTrait>(
        &self,
        db: &C,
        pet_id: i32,
        filename: &str,
        mime_type: &str,
        size: u64,
    ) -> Result<photos::Model, AppError> {
        let photo = photos::ActiveModel {
            pet_id: Set(pet_id),
            filename: Set(filename.to_string()),
            mime_type: Set(mime_type.to_string()),
            size_bytes: Set(size as i64),
            url: Set(self.build_url(filename)),
            is_primary: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        let has_primary = photos::Entity::find()
            .filter(photos::Column::PetId.eq(pet_id))
            .filter(photos::Column::IsPrimary.eq(true))
            .count(db)
            .await?
            > 0;

        if has_primary {
            return Ok(photo);
        }

        Self::assign_primary(db, pet_id, photo.id).await?;
        Self::find_photo(db, photo.id).await
    }

    /// Page de photos d'un pet, plus récentes d'abord, avec le total
    pub async fn list_photos<C: ConnectionTrait>(
        db: &C,
        pet_id: i32,
        window: Window,
    ) -> Result<(Vec<photos::Model>, u64), AppError> {
        pets::Entity::find_by_id(pet_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("pet not found".to_string()))?;

        let query = photos::Entity::find().filter(photos::Column::PetId.eq(pet_id));

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(photos::Column::CreatedAt)
            .order_by_desc(photos::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;

        Ok((items, total))
    }

    /// Photos de plusieurs pets en une requête, groupées par pet
    pub async fn photos_for_pets<C: ConnectionTrait>(
        db: &C,
        pet_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<photos::Model>>, DbErr> {
        let mut grouped: HashMap<i32, Vec<photos::Model>> =
            pet_ids.iter().map(|id| (*id, Vec::new())).collect();

        if pet_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = photos::Entity::find()
            .filter(photos::Column::PetId.is_in(pet_ids.to_vec()))
            .order_by_asc(photos::Column::PetId)
            .order_by_desc(photos::Column::CreatedAt)
            .order_by_desc(photos::Column::Id)
            .all(db)
            .await?;

        for photo in rows {
            grouped.entry(photo.pet_id).or_default().push(photo);
        }

        Ok(grouped)
    }

    /// Supprime une photo après vérification du propriétaire.
    /// Renvoie le nom du fichier à retirer du disque une fois la transaction validée.
    pub async fn delete_photo<C: ConnectionTrait>(
        db: &C,
        requester_id: i32,
        photo_id: i32,
    ) -> Result<String, AppError> {
        let photo = Self::find_photo(db, photo_id).await?;
        Self::ensure_owner(db, photo.pet_id, requester_id).await?;
        Self::remove_photo(db, photo).await
    }

    /// Supprime la ligne; si elle était primaire, la plus récente restante
    /// devient primaire. Pas de contrôle d'accès ici.
    pub async fn remove_photo<C: ConnectionTrait>(
        db: &C,
        photo: photos::Model,
    ) -> Result<String, AppError> {
        let pet_id = photo.pet_id;
        let was_primary = photo.is_primary;
        let filename = photo.filename.clone();

        photos::Entity::delete_by_id(photo.id).exec(db).await?;

        if was_primary {
            let replacement = photos::Entity::find()
                .filter(photos::Column::PetId.eq(pet_id))
                .order_by_desc(photos::Column::CreatedAt)
                .order_by_desc(photos::Column::Id)
                .one(db)
                .await?;

            if let Some(replacement) = replacement {
                Self::assign_primary(db, pet_id, replacement.id).await?;
            }
        }

        Ok(filename)
    }

    /// Rend une photo primaire (propriétaire uniquement)
    pub async fn set_primary<C: ConnectionTrait>(
        db: &C,
        requester_id: i32,
        photo_id: i32,
    ) -> Result<photos::Model, AppError> {
        let photo = Self::find_photo(db, photo_id).await?;
        Self::ensure_owner(db, photo.pet_id, requester_id).await?;

        Self::assign_primary(db, photo.pet_id, photo.id).await?;
        Self::find_photo(db, photo.id).await
    }

    /// Seul point de modification du flag primaire:
    /// on retire le flag des autres photos du pet, puis on le pose sur la cible.
    async fn assign_primary<C: ConnectionTrait>(
        db: &C,
        pet_id: i32,
        photo_id: i32,
    ) -> Result<(), DbErr> {
        photos::Entity::update_many()
            .col_expr(photos::Column::IsPrimary, Expr::value(false))
            .filter(photos::Column::PetId.eq(pet_id))
            .filter(photos::Column::Id.ne(photo_id))
            .exec(db)
            .await?;

        photos::Entity::update_many()
            .col_expr(photos::Column::IsPrimary, Expr::value(true))
            .filter(photos::Column::Id.eq(photo_id))
            .exec(db)
            .await?;

        Ok(())
    }

    async fn find_photo<C: ConnectionTrait>(db: &C, photo_id: i32) -> Result<photos::Model, AppError> {
        photos::Entity::find_by_id(photo_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("photo not found".to_string()))
    }

    async fn ensure_owner<C: ConnectionTrait>(
        db: &C,
        pet_id: i32,
        requester_id: i32,
    ) -> Result<pets::Model, AppError> {
        let pet = pets::Entity::find_by_id(pet_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("pet not found".to_string()))?;

        if pet.owner_id != requester_id {
            return Err(AppError::Forbidden(
                "not authorized to modify this pet photo".to_string(),
            ));
        }

        Ok(pet)
    }

    /// Suppression des fichiers, au mieux (les erreurs sont ignorées)
    pub async fn discard_files(&self, filenames: &[String]) {
        for filename in filenames {
            remove_quietly(&self.media_dir.join(filename)).await;
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove photo file");
        }
    }
}
