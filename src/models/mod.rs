// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (email + hash du mot de passe)
//   - pets : Animaux, chacun appartient à un utilisateur
//   - photos : Photos d'un pet (fichier sur disque + métadonnées)
//   - matches : Décision d'un utilisateur sur le pet d'un autre
//   - pairs : Like mutuel entre deux utilisateurs
//   - messages : Messages échangés dans une paire
//   - dto : Data Transfer Objects pour les réponses API
//
// Points d'attention:
//   - Les contraintes d'unicité composites sont créées dans db.rs
//   - La photo primaire est un flag par pet, maintenu par PhotoStore
//
// ============================================================================

pub mod health;
pub mod users;
pub mod pets;
pub mod photos;
pub mod matches;
pub mod pairs;
pub mod messages;
pub mod dto;
