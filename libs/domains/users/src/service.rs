use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum_helpers::{AppError, AuthUser, TokenResolver};
use rand::{Rng, distr::Alphanumeric};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{
    LoginRequest, SessionResponse, SignupRequest, UpdateUserRequest, User, UserResponse,
    normalize_email,
};
use crate::repository::UserRepository;

/// Length of an issued auth token
pub const TOKEN_LENGTH: usize = 64;

/// Draws before giving up on finding an unused token
pub const MAX_TOKEN_ATTEMPTS: usize = 10;

/// Source of candidate auth tokens
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// 64 alphanumeric characters from the thread-local CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokens;

impl TokenGenerator for RandomTokens {
    fn generate(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// Service layer for users, sessions and token resolution
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    tokens: Arc<dyn TokenGenerator>,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            tokens: Arc::new(RandomTokens),
        }
    }

    /// Replace the token source
    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Draw tokens until one is unused, store it on the user and return it.
    #[instrument(skip(self))]
    pub async fn issue_token(&self, user_id: Uuid) -> UserResult<String> {
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = self.tokens.generate();

            if self.repository.token_exists(&token).await? {
                tracing::warn!(attempt, "Generated auth token already in use");
                continue;
            }

            match self.repository.set_token(user_id, &token).await {
                Ok(()) => return Ok(token),
                Err(UserError::TokenTaken) => {
                    tracing::warn!(attempt, "Auth token taken concurrently");
                }
                Err(e) => return Err(e),
            }
        }

        Err(UserError::Internal(format!(
            "No unused auth token after {} attempts",
            MAX_TOKEN_ATTEMPTS
        )))
    }

    /// Exact-match lookup of a token; empty tokens never resolve
    pub async fn resolve_token(&self, token: &str) -> UserResult<Option<AuthUser>> {
        if token.is_empty() {
            return Ok(None);
        }

        let user = self.repository.get_by_token(token).await?;
        Ok(user.map(|u| AuthUser {
            id: u.id,
            email: u.email,
        }))
    }

    /// Register a user and issue their first token
    #[instrument(skip(self, input))]
    pub async fn signup(&self, input: SignupRequest) -> UserResult<UserResponse> {
        let (Some(email), Some(password)) = (input.email, input.password) else {
            return Err(UserError::Internal("Validated signup without credentials".into()));
        };
        let email = normalize_email(&email);

        if self.repository.get_by_email(&email).await?.is_some() {
            return Err(UserError::DuplicateEmail(email));
        }

        let password_hash = hash_password(&password)?;
        let user = self.repository.create(User::new(email, password_hash)).await?;

        let token = match self.issue_token(user.id).await {
            Ok(token) => token,
            Err(e) => {
                // Signup leaves no user behind without a token
                self.repository.delete(user.id).await?;
                return Err(e);
            }
        };
        Ok(UserResponse::new(user, Vec::new()).with_token(token))
    }

    /// Public profile of any user
    pub async fn show(&self, id: Uuid) -> UserResult<UserResponse> {
        let user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let product_ids = self.repository.product_ids(id).await?;
        Ok(UserResponse::new(user, product_ids))
    }

    /// Update the caller's own email and/or password
    #[instrument(skip(self, current, input), fields(caller = %current.id))]
    pub async fn update(
        &self,
        current: &AuthUser,
        id: Uuid,
        input: UpdateUserRequest,
    ) -> UserResult<UserResponse> {
        if current.id != id {
            return Err(UserError::NotFound(id));
        }

        let mut user = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let email = input.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if *email != user.email && self.repository.get_by_email(email).await?.is_some() {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }

        let password_hash = input.password.as_deref().map(hash_password).transpose()?;

        user.apply_update(email, password_hash);
        let updated = self.repository.update(user).await?;

        let product_ids = self.repository.product_ids(id).await?;
        Ok(UserResponse::new(updated, product_ids))
    }

    /// Delete the caller's own account with everything it owns
    #[instrument(skip(self, current), fields(caller = %current.id))]
    pub async fn delete(&self, current: &AuthUser, id: Uuid) -> UserResult<()> {
        if current.id != id {
            return Err(UserError::NotFound(id));
        }

        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    /// Verify credentials and issue a fresh token
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<SessionResponse> {
        let email = normalize_email(&input.email);
        if email.is_empty() || input.password.is_empty() {
            return Err(UserError::InvalidCredentials);
        }

        let user = self
            .repository
            .get_by_email(&email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "Rejected login with wrong password");
            return Err(UserError::InvalidCredentials);
        }

        let token = self.issue_token(user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(SessionResponse::new(user, token))
    }

    /// Rotate the caller's token so `token` stops resolving.
    ///
    /// A token that is not the caller's current one is not found.
    #[instrument(skip(self, current, token), fields(caller = %current.id))]
    pub async fn logout(&self, current: &AuthUser, token: &str) -> UserResult<()> {
        let user = self
            .repository
            .get_by_id(current.id)
            .await?
            .ok_or(UserError::NotFound(current.id))?;

        if token.is_empty() || user.auth_token.as_deref() != Some(token) {
            return Err(UserError::NotFound(current.id));
        }

        self.issue_token(user.id).await?;
        tracing::info!(user_id = %user.id, "User logged out");
        Ok(())
    }
}

#[async_trait]
impl<R: UserRepository + 'static> TokenResolver for UserService<R> {
    async fn resolve(&self, token: &str) -> Result<Option<AuthUser>, AppError> {
        self.resolve_token(token).await.map_err(AppError::from)
    }
}

// Password helpers

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
