use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    repository::RepositoryState,
};

/// Claims
///
/// The payload structure signed into every session token. Claims are signed
/// with the server's secret and validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user in `users.id`.
    pub sub: Uuid,
    /// Expiration time (exp): timestamp after which the token must not be
    /// accepted.
    pub exp: usize,
    /// Issued at (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// AuthError
///
/// Why a credential failed to resolve to an identity. All variants surface to
/// clients as a 401; the distinction is kept for logging and for callers of
/// [`verify_token`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header, or no bearer token inside it.
    #[error("missing credential")]
    MissingCredential,
    /// Malformed, wrongly signed, or expired token.
    #[error("invalid credential")]
    InvalidCredential,
    /// The token verified but its subject no longer resolves to a user
    /// (e.g. the account was deleted after issuance).
    #[error("unknown identity")]
    UnknownIdentity,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::debug!("authentication failed: {}", err);
        ApiError::Unauthenticated
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the user id plus the
/// admin flag consulted by the ownership guard. Re-derived from the bearer
/// credential on every request and discarded at request end; never cached
/// across requests.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub is_admin: bool,
}

/// issue_token
///
/// Signs a session token for `user_id`, valid for `ttl_secs` from now.
pub fn issue_token(user_id: Uuid, secret: &str, ttl_secs: i64) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// verify_token
///
/// Decodes and validates a bearer token against the signing secret. Checks
/// signature authenticity and expiry only; resolving the subject to a live
/// user record is the caller's job.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::default();
    // Expiration validation is always active.
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidCredential)
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. This keeps authentication
/// (extractor) cleanly separated from business logic (the handler).
///
/// The process:
/// 1. Dependency resolution: Repository and AppConfig from the app state.
/// 2. Local bypass: development-time access via the 'x-user-id' header.
/// 3. Token validation: Bearer extraction and signature/expiry checks.
/// 4. DB lookup: the subject must still resolve to a current user record.
///
/// Rejection: `ApiError::Unauthenticated` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local development bypass: authentication via a known user id in the
        // 'x-user-id' header, guarded by the Env check. The id must still map
        // to an actual user row so the admin flag is correctly loaded.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        if let Some(user) = repo.get_user(user_id).await? {
                            return Ok(AuthUser {
                                id: user.id,
                                is_admin: user.is_admin,
                            });
                        }
                    }
                }
            }
        }
        // In Production, or if the bypass fell through, standard token flow.

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingCredential)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingCredential)?;

        let claims = verify_token(token, &config.jwt_secret)?;

        // The token may outlive the account. Re-resolve the subject on every
        // request so deleted users lose access immediately.
        let user = repo
            .get_user(claims.sub)
            .await?
            .ok_or(AuthError::UnknownIdentity)?;

        Ok(AuthUser {
            id: user.id,
            is_admin: user.is_admin,
        })
    }
}

// --- Password Hashing ---

/// hash_password
///
/// Hashes a password with Argon2id using OWASP-recommended parameters
/// (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
/// generated per hash.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| ApiError::Internal(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// verify_password
///
/// Verifies a plaintext password against an Argon2id PHC-format hash.
/// Returns `Ok(false)` on mismatch; errors only when the stored hash itself
/// is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(format!("verify error: {e}"))),
    }
}
