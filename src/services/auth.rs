//! Authentication service
//!
//! Password hashing with Argon2 and token issuance for both account roles.

use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Duration;
use rand::rngs::OsRng;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    config::AuthConfig,
    middleware::auth::{create_access_token, create_refresh_token, create_token, TokenPurpose},
    models::{AccountProfile, AccountRole, AuthResponse, TokenResponse},
    utils::{validation::field_error, AppError, AppResult},
};

/// Stateless authentication helpers
pub struct AuthService;

impl AuthService {
    /// Hash a password using Argon2id
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(password_hash)
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Access + refresh token pair for a logged-in account
    pub fn issue_session(config: &AuthConfig, account: AccountProfile) -> AppResult<AuthResponse> {
        let access_token = create_access_token(
            &account.id,
            &account.email,
            account.role,
            &config.jwt_secret,
            config.token_expiry_hours,
        )
        .map_err(token_error)?;
        let refresh_token = create_refresh_token(
            &account.id,
            &account.email,
            account.role,
            &config.jwt_secret,
            config.refresh_token_expiry_days,
        )
        .map_err(token_error)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: config.token_expiry_hours * 3600,
            account,
        })
    }

    pub fn issue_access(
        config: &AuthConfig,
        account_id: &Uuid,
        email: &str,
        role: AccountRole,
    ) -> AppResult<TokenResponse> {
        let access_token = create_access_token(
            account_id,
            email,
            role,
            &config.jwt_secret,
            config.token_expiry_hours,
        )
        .map_err(token_error)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: config.token_expiry_hours * 3600,
        })
    }

    pub fn issue_verification_token(
        config: &AuthConfig,
        account_id: &Uuid,
        email: &str,
        role: AccountRole,
    ) -> AppResult<String> {
        create_token(
            account_id,
            email,
            role,
            TokenPurpose::EmailVerification,
            &config.jwt_secret,
            Duration::hours(config.verification_token_expiry_hours as i64),
        )
        .map_err(token_error)
    }

    pub fn issue_recovery_token(
        config: &AuthConfig,
        account_id: &Uuid,
        email: &str,
        role: AccountRole,
    ) -> AppResult<String> {
        create_token(
            account_id,
            email,
            role,
            TokenPurpose::PasswordRecovery,
            &config.jwt_secret,
            Duration::minutes(config.recovery_token_expiry_minutes as i64),
        )
        .map_err(token_error)
    }

    /// Reject passwords shorter than the configured minimum
    pub fn check_password_policy(
        config: &AuthConfig,
        field: &'static str,
        password: &str,
    ) -> Result<(), ValidationErrors> {
        if password.chars().count() < config.password_min_length {
            return Err(field_error(
                field,
                "length",
                format!(
                    "must be at least {} characters long",
                    config.password_min_length
                ),
            ));
        }
        Ok(())
    }
}

fn token_error(err: jsonwebtoken::errors::Error) -> AppError {
    AppError::internal(format!("Failed to create token: {}", err))
}
