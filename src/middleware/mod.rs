pub mod auth;
pub mod response;

pub use auth::{
    jwt_auth_middleware, require_admin, require_school, require_sponsor_or_admin, AuthUser,
};
pub use response::{ApiResponse, ApiResult};
