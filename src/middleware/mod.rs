pub mod auth;
pub mod cors;

pub use auth::AuthUser;
pub use cors::cors;
