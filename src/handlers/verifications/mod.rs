pub mod admin;
pub mod portal;
pub mod school;

use serde::Deserialize;

use crate::database::models::VerificationStatus;
use crate::error::ApiError;

/// Reviewer decision payload, shared by the school and admin endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBody {
    pub status: String,
    #[serde(default)]
    pub denial_reason: Option<String>,
}

impl DecisionBody {
    pub fn status(&self) -> Result<VerificationStatus, ApiError> {
        VerificationStatus::parse(&self.status)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown status: {}", self.status)))
    }
}
