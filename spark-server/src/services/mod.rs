pub mod auth_service;
pub mod discovery_service;
pub mod match_service;
pub mod message_service;
pub mod profile_service;
pub mod token_service;
pub mod validation;
