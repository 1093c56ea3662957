use chrono::Utc;
use sea_orm::*;

use crate::error::AppError;
use crate::models::dto::{PetOut, PetRequest};
use crate::models::pets::{self, Gender};
use crate::models::{matches, photos};
use crate::services::photo_store::PhotoStore;
use crate::utils::pagination::Window;

pub struct PetService;

impl PetService {
    pub async fn create_pet<C: ConnectionTrait>(
        db: &C,
        owner_id: i32,
        request: PetRequest,
    ) -> Result<PetOut, AppError> {
        let pet = pets::ActiveModel {
            owner_id: Set(owner_id),
            name: Set(request.name),
            species: Set(request.species),
            gender: Set(request.gender),
            age: Set(request.age),
            bio: Set(request.bio),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_) | SqlErr::ForeignKeyConstraintViolation(_)) => {
                tracing::warn!(owner_id, error = %e, "pet insert rejected");
                AppError::BadRequest("Failed to create pet".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(PetOut::with_photos(pet, Vec::new()))
    }

    /// Pets du propriétaire (id décroissant), filtrés, avec leurs photos
    pub async fn list_pets<C: ConnectionTrait>(
        db: &C,
        owner_id: i32,
        species: Option<&str>,
        gender: Option<Gender>,
        window: Window,
    ) -> Result<(Vec<PetOut>, u64), AppError> {
        let mut query = pets::Entity::find().filter(pets::Column::OwnerId.eq(owner_id));
        if let Some(species) = species.filter(|s| !s.is_empty()) {
            query = query.filter(pets::Column::Species.eq(species));
        }
        if let Some(gender) = gender {
            query = query.filter(pets::Column::Gender.eq(gender));
        }

        let total = query.clone().count(db).await?;
        let page = query
            .order_by_desc(pets::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?;

        Ok((Self::with_photos(db, page).await?, total))
    }

    /// Ajoute à chaque pet ses photos (plus récentes d'abord) et l'URL primaire
    pub async fn with_photos<C: ConnectionTrait>(
        db: &C,
        pets: Vec<pets::Model>,
    ) -> Result<Vec<PetOut>, DbErr> {
        let ids: Vec<i32> = pets.iter().map(|pet| pet.id).collect();
        let mut photos_by_pet = PhotoStore::photos_for_pets(db, &ids).await?;

        Ok(pets
            .into_iter()
            .map(|pet| {
                let photos = photos_by_pet.remove(&pet.id).unwrap_or_default();
                PetOut::with_photos(pet, photos)
            })
            .collect())
    }

    /// NotFound si absent, Forbidden si le pet appartient à un autre utilisateur
    pub async fn get_owned_pet<C: ConnectionTrait>(
        db: &C,
        pet_id: i32,
        owner_id: i32,
    ) -> Result<pets::Model, AppError> {
        let pet = pets::Entity::find_by_id(pet_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("pet not found".to_string()))?;

        if pet.owner_id != owner_id {
            return Err(AppError::Forbidden("not authorized to access this pet".to_string()));
        }

        Ok(pet)
    }

    pub async fn get_pet<C: ConnectionTrait>(
        db: &C,
        pet_id: i32,
        owner_id: i32,
    ) -> Result<PetOut, AppError> {
        let pet = Self::get_owned_pet(db, pet_id, owner_id).await?;
        Self::single(db, pet).await
    }

    async fn single<C: ConnectionTrait>(db: &C, pet: pets::Model) -> Result<PetOut, AppError> {
        Self::with_photos(db, vec![pet])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("pet vanished while loading photos".to_string()))
    }

    pub async fn update_pet<C: ConnectionTrait>(
        db: &C,
        pet_id: i32,
        owner_id: i32,
        request: PetRequest,
    ) -> Result<PetOut, AppError> {
        let pet = Self::get_owned_pet(db, pet_id, owner_id).await?;

        let mut active: pets::ActiveModel = pet.into();
        active.name = Set(request.name);
        active.species = Set(request.species);
        active.gender = Set(request.gender);
        active.age = Set(request.age);
        active.bio = Set(request.bio);
        let pet = active.update(db).await?;

        Self::single(db, pet).await
    }

    /// Supprime le pet: photos (via PhotoStore) puis matches qui le visent, puis la ligne.
    /// Renvoie les fichiers à retirer du disque après commit.
    pub async fn delete_pet<C: ConnectionTrait>(
        db: &C,
        pet_id: i32,
        owner_id: i32,
    ) -> Result<Vec<String>, AppError> {
        let pet = Self::get_owned_pet(db, pet_id, owner_id).await?;

        let pet_photos = photos::Entity::find()
            .filter(photos::Column::PetId.eq(pet.id))
            .all(db)
            .await?;

        let mut filenames = Vec::with_capacity(pet_photos.len());
        for photo in pet_photos {
            filenames.push(PhotoStore::remove_photo(db, photo).await?);
        }

        let removed_matches = matches::Entity::delete_many()
            .filter(matches::Column::TargetPetId.eq(pet.id))
            .exec(db)
            .await?;

        pets::Entity::delete_by_id(pet.id).exec(db).await?;

        tracing::info!(
            pet_id = pet.id,
            photos = filenames.len(),
            matches = removed_matches.rows_affected,
            "pet deleted"
        );

        Ok(filenames)
    }

    /// PATCH /pets/{id}/primary_photo: la photo doit appartenir à ce pet
    pub async fn set_primary_photo<C: ConnectionTrait>(
        db: &C,
        pet_id: i32,
        owner_id: i32,
        photo_id: i32,
    ) -> Result<PetOut, AppError> {
        let pet = Self::get_owned_pet(db, pet_id, owner_id).await?;

        let photo = photos::Entity::find_by_id(photo_id)
            .one(db)
            .await?
            .filter(|photo| photo.pet_id == pet.id)
            .ok_or_else(|| AppError::NotFound("photo not found".to_string()))?;

        PhotoStore::set_primary(db, owner_id, photo.id).await?;

        Self::single(db, pet).await
    }
}
