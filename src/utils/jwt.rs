//! JWT utilities
//!
//! Bearer tokens carry the vendor id in `sub`.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::EnvironmentConfig, models::VendorType, utils::errors::AppError};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,         // vendor_id
    pub vendor_type: String, // informational, authorization reloads the vendor
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration: u64,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration,
        }
    }
}

pub fn generate_token(vendor_id: Uuid, vendor_type: VendorType, config: &JwtConfig) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::seconds(config.expiration as i64);

    let claims = JwtClaims {
        sub: vendor_id.to_string(),
        vendor_type: vendor_type.to_string(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(config.secret.as_ref()))
        .map_err(|e| AppError::Jwt(format!("Failed to sign token: {}", e)))
}

pub fn verify_token(token: &str, config: &JwtConfig) -> Result<JwtClaims, AppError> {
    decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authorization header must start with 'Bearer '".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Token cannot be empty".to_string()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
        }
    }

    #[test]
    fn test_token_carries_vendor_id() {
        let vendor_id = Uuid::new_v4();
        let token = generate_token(vendor_id, VendorType::City, &config()).unwrap();
        let claims = verify_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, vendor_id.to_string());
        assert_eq!(claims.vendor_type, "CITY");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = generate_token(Uuid::new_v4(), VendorType::Super, &config()).unwrap();
        let other = JwtConfig {
            secret: "other".to_string(),
            expiration: 3600,
        };
        assert!(matches!(verify_token(&token, &other), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(extract_token_from_header("Basic xyz").is_err());
        assert!(extract_token_from_header("Bearer ").is_err());
    }
}
