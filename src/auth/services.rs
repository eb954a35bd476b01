use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{
    errors::AuthError,
    password::PasswordHasher,
    repo::{CredentialStore, User},
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// The authenticated principal carried in the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    pub email: String,
}

/// Checks credentials against the user store and creates accounts.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
}

impl Authenticator {
    pub fn new(users: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<IdentityClaim, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user = match self.users.find_by_email(email).await? {
            Some(u) => u,
            None => {
                self.hasher.verify_decoy(password);
                warn!(email = %email, "login unknown email");
                return Err(AuthError::AuthFailure);
            }
        };

        if !self.hasher.verify(&user.password_hash, password)? {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AuthError::AuthFailure);
        }

        info!(user_id = %user.id, email = %user.email, "user authenticated");
        Ok(IdentityClaim { email: user.email })
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AuthError::InvalidInput("a valid email is required".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.users.find_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::EmailTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: self.hasher.hash(password)?,
            created_at: OffsetDateTime::now_utc(),
        };
        let id = self.users.insert(&user).await.map_err(|e| {
            error!(error = %e, "create user failed");
            AuthError::Store(e)
        })?;

        info!(user_id = %id, email = %user.email, "user registered");
        Ok(id)
    }
}
