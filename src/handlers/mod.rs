pub mod audit;
pub mod auth;
pub mod configuration;
pub mod documents;
pub mod scholarships;
pub mod users;
pub mod verifications;
