//! Service layer providing business-oriented CRUD operations on top of models.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Maps entities to the wire records exposed by the HTTP layer.

pub mod errors;
pub mod auth;
pub mod user_service;
pub mod game_user_map_service;
pub mod company_service;
#[cfg(test)]
pub mod test_support;
