use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::routes::AppState;
use crate::error::ApiError;
use crate::types::account::AdminRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Admin,
    Customer,
}

/// JWT claims: `sub` = principal id, `kind` tells admin and customer tokens apart,
/// `role` is only present for admins.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub kind: PrincipalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AdminRole>,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated admin extracted from a Bearer token.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub admin_id: Uuid,
    pub email: String,
    pub role: AdminRole,
}

impl AdminPrincipal {
    pub fn require_catalog_manager(&self) -> Result<(), ApiError> {
        if self.role.can_manage_catalog() {
            Ok(())
        } else {
            Err(ApiError::InsufficientPermission)
        }
    }
}

/// Authenticated customer extracted from a Bearer token.
#[derive(Debug, Clone)]
pub struct CustomerPrincipal {
    pub customer_id: Uuid,
    pub email: String,
}

impl Claims {
    pub fn new(
        id: Uuid,
        email: &str,
        kind: PrincipalKind,
        role: Option<AdminRole>,
        ttl_hours: i64,
    ) -> Self {
        let now = chrono::Utc::now();
        // Out-of-range lifetimes saturate instead of panicking.
        let exp = chrono::TimeDelta::try_hours(ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
            .timestamp();
        Self {
            sub: id.to_string(),
            email: email.to_string(),
            kind,
            role,
            exp,
            iat: now.timestamp(),
        }
    }
}

pub fn create_token(secret: &[u8], claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret))
}

pub fn decode_token(secret: &[u8], token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal("password hash", e))
}

/// False for a wrong password and for a malformed stored hash alike.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn bearer_claims(parts: &Parts, secret: &[u8]) -> Result<Claims, ApiError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header missing or invalid".into())
        })?;
    decode_token(secret, token).map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        ApiError::Unauthorized("Invalid or expired token".into())
    })
}

fn principal_id(claims: &Claims) -> Result<Uuid, ApiError> {
    Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))
}

impl FromRequestParts<AppState> for AdminPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, &state.config.jwt_secret)?;
        let role = match (claims.kind, claims.role) {
            (PrincipalKind::Admin, Some(role)) => role,
            _ => return Err(ApiError::Unauthorized("Admin access required".into())),
        };
        Ok(AdminPrincipal {
            admin_id: principal_id(&claims)?,
            email: claims.email,
            role,
        })
    }
}

impl FromRequestParts<AppState> for CustomerPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, &state.config.jwt_secret)?;
        if claims.kind != PrincipalKind::Customer {
            return Err(ApiError::Unauthorized("Customer access required".into()));
        }
        Ok(CustomerPrincipal {
            customer_id: principal_id(&claims)?,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_kind_and_role() {
        let id = Uuid::new_v4();
        let claims = Claims::new(
            id,
            "manager@hapas.com",
            PrincipalKind::Admin,
            Some(AdminRole::Manager),
            24,
        );
        let token = create_token(b"secret", &claims).unwrap();
        let decoded = decode_token(b"secret", &token).unwrap();
        assert_eq!(decoded.sub, id.to_string());
        assert_eq!(decoded.kind, PrincipalKind::Admin);
        assert_eq!(decoded.role, Some(AdminRole::Manager));
        assert!(decode_token(b"other", &token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.vn", PrincipalKind::Customer, None, -2);
        let token = create_token(b"secret", &claims).unwrap();
        assert!(decode_token(b"secret", &token).is_err());
    }

    #[test]
    fn huge_lifetime_saturates() {
        let id = Uuid::new_v4();
        let claims = Claims::new(id, "a@b.vn", PrincipalKind::Customer, None, i64::MAX);
        assert!(claims.exp > claims.iat);
        let token = create_token(b"secret", &claims).unwrap();
        assert!(decode_token(b"secret", &token).is_ok());
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("Matkhau123").unwrap(), hash_password("Matkhau123").unwrap());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("Matkhau123").unwrap();
        assert!(verify_password("Matkhau123", &hash));
        assert!(!verify_password("matkhau123", &hash));
        assert!(!verify_password("Matkhau123", "not-a-hash"));
    }
}
