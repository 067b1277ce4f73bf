use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

/// Identity established by the upstream gateway. Token verification happens
/// there; this service only trusts the forwarded numeric id.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

pub async fn require_user(mut req: Request, next: Next) -> Result<Response, AppError> {
    let user_id = req
        .headers()
        .get("X-User-Id")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid X-User-Id header".to_string())
        })?;

    req.extensions_mut().insert(AuthenticatedUser { user_id });

    Ok(next.run(req).await)
}

pub async fn admin_auth(req: Request, next: Next) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let admin_api_key =
        std::env::var("ADMIN_API_KEY").unwrap_or_else(|_| "admin-secret-key".to_string());

    match auth_header {
        Some(auth) if auth == format!("Bearer {}", admin_api_key) || auth == admin_api_key => {
            Ok(next.run(req).await)
        }
        _ => Err(AppError::Forbidden("Admin access required".to_string())),
    }
}
