//! Authentication
//!
//! bcrypt password hashes and HS256 bearer tokens carrying the vendor id.

use bcrypt::{hash, verify};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::auth_dto::{LoginRequest, LoginResponse, RegisterSuperVendorRequest};
use crate::models::{Vendor, VendorType};
use crate::repositories::VendorRepository;
use crate::utils::errors::{conflict_error, AppError, AppResult};
use crate::utils::jwt::{generate_token, verify_token, JwtConfig};

#[derive(Clone)]
pub struct AuthService {
    vendors: Arc<dyn VendorRepository>,
    jwt: JwtConfig,
    allow_super_registration: bool,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        vendors: Arc<dyn VendorRepository>,
        jwt: JwtConfig,
        allow_super_registration: bool,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            vendors,
            jwt,
            allow_super_registration,
            bcrypt_cost,
        }
    }

    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| AppError::Hash(e.to_string()))
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> AppResult<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || verify(password, &password_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| AppError::Hash(e.to_string()))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let email = request.email.trim().to_lowercase();
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let vendor = self.vendors.find_by_email(&email).await?.ok_or_else(invalid)?;
        if !self.verify_password(&request.password, &vendor.password_hash).await? {
            warn!("🔒 Failed login for {}", email);
            return Err(invalid());
        }
        if !vendor.is_active {
            return Err(AppError::Unauthorized("Vendor account is inactive".to_string()));
        }

        let token = generate_token(vendor.id, vendor.vendor_type, &self.jwt)?;
        info!("🔑 Vendor {} logged in", vendor.email);
        Ok(LoginResponse {
            token,
            token_type: "Bearer",
            expires_in: self.jwt.expiration,
            vendor,
        })
    }

    /// Create a root vendor. Disabled unless explicitly allowed by config.
    pub async fn register_super_vendor(&self, request: RegisterSuperVendorRequest) -> AppResult<Vendor> {
        if !self.allow_super_registration {
            return Err(AppError::Forbidden(
                "Registration of SUPER vendors is disabled".to_string(),
            ));
        }

        let email = request.email.trim().to_lowercase();
        if self.vendors.find_by_email(&email).await?.is_some() {
            return Err(conflict_error("Vendor", "email", &email));
        }

        let password_hash = self.hash_password(&request.password).await?;
        let vendor = Vendor::new(
            request.name.trim().to_string(),
            email,
            password_hash,
            VendorType::Super,
            None,
            VendorType::Super.default_permissions(),
            request.operating_area,
        );
        let created = self.vendors.create(&vendor).await?;
        info!("🏢 SUPER vendor {} registered", created.email);
        Ok(created)
    }

    /// Resolve a bearer token to an active vendor
    pub async fn authenticate(&self, token: &str) -> AppResult<Vendor> {
        let claims = verify_token(token, &self.jwt)?;
        let vendor_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

        let vendor = self
            .vendors
            .find_by_id(vendor_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Vendor no longer exists".to_string()))?;
        if !vendor.is_active {
            return Err(AppError::Unauthorized("Vendor account is inactive".to_string()));
        }
        Ok(vendor)
    }

    pub fn issue_token(&self, vendor: &Vendor) -> AppResult<String> {
        generate_token(vendor.id, vendor.vendor_type, &self.jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::InMemoryVendorRepository;

    fn service(allow: bool) -> AuthService {
        AuthService::new(
            Arc::new(InMemoryVendorRepository::new()),
            JwtConfig {
                secret: "secret".into(),
                expiration: 600,
            },
            allow,
            4,
        )
    }

    fn register_request() -> RegisterSuperVendorRequest {
        RegisterSuperVendorRequest {
            name: "Head Office".into(),
            email: "HQ@Fleet.test".into(),
            password: "s3cret-pass".into(),
            operating_area: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login_then_authenticate() {
        let service = service(true);
        let vendor = service.register_super_vendor(register_request()).await.unwrap();
        assert_eq!(vendor.email, "hq@fleet.test");
        assert_ne!(vendor.password_hash, "s3cret-pass");

        let login = service
            .login(LoginRequest {
                email: "hq@fleet.test".into(),
                password: "s3cret-pass".into(),
            })
            .await
            .unwrap();
        let authenticated = service.authenticate(&login.token).await.unwrap();
        assert_eq!(authenticated.id, vendor.id);
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let service = service(true);
        service.register_super_vendor(register_request()).await.unwrap();
        let result = service
            .login(LoginRequest {
                email: "hq@fleet.test".into(),
                password: "nope-nope".into(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_registration_disabled_by_default() {
        let result = service(false).register_super_vendor(register_request()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
