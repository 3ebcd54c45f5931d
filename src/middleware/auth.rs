use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::config;
use crate::database::models::UserRole;
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub school_name: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            school_name: claims.school_name,
        }
    }
}

/// JWT authentication middleware that validates tokens and injects
/// [`AuthUser`] into request extensions.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let secret = &config::config().security.jwt_secret;
    let claims =
        auth::validate_jwt(&token, secret).map_err(|e| ApiError::unauthorized(e.to_string()))?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

fn current_user(request: &Request) -> Result<AuthUser, ApiError> {
    request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))
}

/// Gate: admin role only. Runs inside `jwt_auth_middleware`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = current_user(&request)?;
    if user.role != UserRole::Admin {
        return Err(ApiError::forbidden("Administrator access required"));
    }
    Ok(next.run(request).await)
}

/// Gate: school reviewer role only.
pub async fn require_school(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = current_user(&request)?;
    if user.role != UserRole::School {
        return Err(ApiError::forbidden("School reviewer access required"));
    }
    Ok(next.run(request).await)
}

/// Gate: scholarship management (sponsors and admins).
pub async fn require_sponsor_or_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = current_user(&request)?;
    if !matches!(user.role, UserRole::Sponsor | UserRole::Admin) {
        return Err(ApiError::forbidden("Sponsor or administrator access required"));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_header_is_rejected() {
        let err = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert!(err.contains("Missing Authorization"));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn empty_bearer_token_is_rejected() {
        let headers = headers_with("Bearer   ");
        assert!(extract_bearer_token(&headers).is_err());
    }
}
