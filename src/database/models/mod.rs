pub mod audit;
pub mod configuration;
pub mod document;
pub mod scholarship;
pub mod user;
pub mod verification;

pub use audit::AuditEvent;
pub use configuration::ConfigurationDocument;
pub use document::StoredDocument;
pub use scholarship::{Scholarship, ScholarshipStatus};
pub use user::{User, UserRole, UserStatus, UserView};
pub use verification::{
    Persona, PersonaCounts, PersonaProfile, StatusCounts, Verification, VerificationStatus,
};
