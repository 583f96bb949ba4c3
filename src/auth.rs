use actix_web::HttpRequest;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

use crate::db::Database;
use crate::error::ApiError;
use crate::models::user::User;

/// Name of the cookie carrying the HTML session id.
pub const SESSION_COOKIE: &str = "sessionid";

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a password with Argon2id, producing a PHC string for storage.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verifies a password against a stored PHC hash. Unparseable hashes
/// count as a failed verification rather than an error.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Resolves the user behind an `Authorization: Bearer <key>` header.
/// No header at all means an anonymous request (`Ok(None)`); a header
/// that does not resolve to a user is rejected outright.
pub async fn bearer_user(db: &Database, req: &HttpRequest) -> Result<Option<User>, ApiError> {
    let header = match req.headers().get("Authorization") {
        Some(value) => value,
        None => return Ok(None),
    };
    let key = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("Invalid token."))?;

    match db.find_user_by_token(key).await? {
        Some(user) => Ok(Some(user)),
        None => Err(ApiError::Unauthorized("Invalid token.")),
    }
}

/// Like [`bearer_user`], but anonymous requests are an error too.
pub async fn require_user(db: &Database, req: &HttpRequest) -> Result<User, ApiError> {
    bearer_user(db, req).await?.ok_or(ApiError::Unauthorized(
        "Authentication credentials were not provided.",
    ))
}

/// Token auth plus the staff check guarding product writes.
pub async fn require_staff(db: &Database, req: &HttpRequest) -> Result<User, ApiError> {
    let user = require_user(db, req).await?;
    if !user.is_staff {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action.",
        ));
    }
    Ok(user)
}

/// Token auth for review submission: staff accounts are barred.
pub async fn require_regular_user(db: &Database, req: &HttpRequest) -> Result<User, ApiError> {
    let user = require_user(db, req).await?;
    if user.is_staff {
        return Err(ApiError::Forbidden("Staff users cannot submit reviews."));
    }
    Ok(user)
}

/// Resolves the user behind the session cookie, if any. Stale cookies
/// (no matching session row) resolve to anonymous.
pub async fn session_user(db: &Database, req: &HttpRequest) -> Result<Option<User>, ApiError> {
    match req.cookie(SESSION_COOKIE) {
        Some(cookie) => Ok(db.find_user_by_session(cookie.value()).await?),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not a phc string"));
    }
}
