pub mod auth_service;
pub mod match_service;
pub mod message_service;
pub mod pair_service;
pub mod pet_service;
pub mod photo_store;
