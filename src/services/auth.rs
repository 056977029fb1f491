//! Authentication service: password login and token issuing

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{Capability, User, UserClaims},
    repository::AccountStore,
};

/// Issued bearer token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
    pub claims: UserClaims,
}

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountStore>, config: AuthConfig) -> Self {
        Self { accounts, config }
    }

    /// Authenticate by username/password and return a signed token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<IssuedToken> {
        let user = self
            .accounts
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user, password)? {
            tracing::info!(username, "Rejected login");
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let capabilities = self.accounts.user_capabilities(user.id).await?;
        let issued = self.issue_token(&user, capabilities)?;
        tracing::info!(username = %user.username, "User logged in");
        Ok(issued)
    }

    /// Validate a bearer token
    pub fn decode_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }

    fn issue_token(&self, user: &User, capabilities: Vec<Capability>) -> AppResult<IssuedToken> {
        let now = Utc::now().timestamp();
        let expires_in = self.config.jwt_expiration_hours as i64 * 3600;

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            capabilities,
            exp: now + expires_in,
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_in,
            claims,
        })
    }

    /// Create the configured bootstrap account (with every capability) if it is missing
    pub async fn ensure_bootstrap_user(&self) -> AppResult<()> {
        let (Some(username), Some(password)) = (
            self.config.bootstrap_username.as_deref(),
            self.config.bootstrap_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.accounts.find_user_by_username(username).await?.is_some() {
            tracing::debug!(username, "Bootstrap account already present");
            return Ok(());
        }

        let hash = hash_password(password)?;
        self.accounts
            .create_user(username, &hash, &Capability::ALL)
            .await?;
        tracing::info!(username, "Created bootstrap account");
        Ok(())
    }
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
