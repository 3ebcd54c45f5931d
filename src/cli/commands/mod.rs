pub mod auth;
pub mod fixture;
pub mod review;
pub mod server;
pub mod taxonomy;
