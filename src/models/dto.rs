// Objets d'entrée/sortie de l'API (séparés des entités SeaORM)
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::matches::MatchDecision;
use crate::models::pets::Gender;
use crate::models::{matches, messages, pets, photos};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 256))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i32,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Pets & photos
// ---------------------------------------------------------------------------

/// Corps de POST /pets et PUT /pets/{id}
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PetRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub species: String,
    #[serde(default)]
    pub gender: Gender,
    #[validate(range(min = 0))]
    pub age: Option<i32>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoOut {
    pub id: i32,
    pub pet_id: i32,
    pub url: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl From<photos::Model> for PhotoOut {
    fn from(photo: photos::Model) -> Self {
        PhotoOut {
            id: photo.id,
            pet_id: photo.pet_id,
            url: photo.url,
            is_primary: photo.is_primary,
            created_at: photo.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetOut {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub species: String,
    pub gender: Gender,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub primary_photo_url: Option<String>,
    pub photos: Vec<PhotoOut>,
}

impl PetOut {
    /// Construit la sortie à partir du pet et de ses photos (plus récentes d'abord)
    pub fn with_photos(pet: pets::Model, photos: Vec<photos::Model>) -> Self {
        let primary_photo_url = photos
            .iter()
            .find(|photo| photo.is_primary)
            .map(|photo| photo.url.clone());

        PetOut {
            id: pet.id,
            owner_id: pet.owner_id,
            name: pet.name,
            species: pet.species,
            gender: pet.gender,
            age: pet.age,
            bio: pet.bio,
            primary_photo_url,
            photos: photos.into_iter().map(PhotoOut::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: MatchDecision,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    pub species: Option<String>,
    pub gender: Option<String>,
    #[serde(default = "default_generate_limit")]
    #[validate(range(min = 1, max = 50))]
    pub limit: u64,
}

fn default_generate_limit() -> u64 {
    10
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub created: u64,
    pub candidates: Vec<PetOut>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOut {
    pub id: i32,
    pub owner_user_id: i32,
    pub target_pet_id: i32,
    pub decision: MatchDecision,
    pub created_at: DateTime<Utc>,
}

impl From<matches::Model> for MatchOut {
    fn from(m: matches::Model) -> Self {
        MatchOut {
            id: m.id,
            owner_user_id: m.owner_user_id,
            target_pet_id: m.target_pet_id,
            decision: m.decision,
            created_at: m.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Pairs & messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairOut {
    pub id: i32,
    pub other_user_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MessageCreate {
    pub pair_id: i32,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageOut {
    pub id: i32,
    pub pair_id: i32,
    pub sender_user_id: i32,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<messages::Model> for MessageOut {
    fn from(m: messages::Model) -> Self {
        MessageOut {
            id: m.id,
            pair_id: m.pair_id,
            sender_user_id: m.sender_user_id,
            body: m.body,
            created_at: m.created_at,
        }
    }
}
