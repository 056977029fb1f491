//! User model, capabilities and token claims

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// Named permissions an identity either holds or does not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Capability {
    /// Manage loans: see every borrowed copy and renew due dates
    #[serde(rename = "catalog.can_mark_returned")]
    CanMarkReturned,
    #[serde(rename = "catalog.author_edit")]
    AuthorEdit,
    #[serde(rename = "catalog.book_edit")]
    BookEdit,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::CanMarkReturned,
        Capability::AuthorEdit,
        Capability::BookEdit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CanMarkReturned => "catalog.can_mark_returned",
            Capability::AuthorEdit => "catalog.author_edit",
            Capability::BookEdit => "catalog.book_edit",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown capability: {}", s))
    }
}

/// User account from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Guard: fail with an authorization error unless `capability` is held
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.has(capability) {
            Ok(())
        } else {
            tracing::warn!(user = %self.sub, %capability, "Capability check failed");
            Err(AppError::Authorization(format!(
                "Permission '{}' required",
                capability
            )))
        }
    }
}

/// Current identity as returned by `/auth/me`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub capabilities: Vec<Capability>,
}

impl From<&UserClaims> for UserInfo {
    fn from(claims: &UserClaims) -> Self {
        UserInfo {
            id: claims.user_id,
            username: claims.sub.clone(),
            capabilities: claims.capabilities.clone(),
        }
    }
}
