pub mod audit_service;
pub mod configuration_service;
pub mod document_service;
pub mod file_store;
pub mod scholarship_service;
pub mod user_service;
pub mod verification_service;
