//! Password hashing and token issuance.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Issued tokens are valid for one day.
const TOKEN_TTL_HOURS: i64 = 24;

/// JWT payload binding a staff member to their hospital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Staff id.
    pub sub: String,
    /// Hospital code every query made with this token is scoped to.
    pub hospital: String,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
}

pub fn hash_password(password: &str) -> Result<String> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    Ok(verify(password, password_hash)?)
}

/// Issue an HS256 token for the given staff member.
pub fn generate_token(staff_id: Uuid, hospital: &str, secret: &str) -> Result<String> {
    let expiry = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
    let claims = Claims {
        sub: staff_id.to_string(),
        hospital: hospital.to_string(),
        exp: expiry.timestamp() as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Decode a token, verifying signature and expiry.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
