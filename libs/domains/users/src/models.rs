use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// User entity - matches SQL schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Stored trimmed and lowercased
    pub email: String,
    /// Argon2 PHC string (never exposed in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Current opaque auth token, if one was issued
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user (password will be hashed by service layer)
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email,
            password_hash,
            auth_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply updates (password should already be hashed if provided)
    pub fn apply_update(&mut self, email: Option<String>, password_hash: Option<String>) {
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(hash) = password_hash {
            self.password_hash = hash;
        }
        self.updated_at = Utc::now();
    }
}

/// Public representation of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Products owned by the user
    pub product_ids: Vec<Uuid>,
    /// Only present in the signup response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl UserResponse {
    pub fn new(user: User, product_ids: Vec<Uuid>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
            product_ids,
            auth_token: None,
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }
}

/// Response of `POST /sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub auth_token: String,
}

impl SessionResponse {
    pub fn new(user: User, auth_token: String) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
            auth_token,
        }
    }
}

/// Request body for `POST /users`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[schema(example = "buyer@example.com")]
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// Request body for `PATCH /users/{user_id}`; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

/// Request body for `POST /sessions`
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Normalized form used for storage and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Rules shared by signup and update. On signup every field is required;
/// on update only the fields present are checked.
fn credential_errors(
    email: Option<&str>,
    password: Option<&str>,
    confirmation: Option<&str>,
    required: bool,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    match email.map(str::trim) {
        None | Some("") if required || email.is_some() => {
            errors.add("email", error("blank", "can't be blank"));
        }
        Some(email) if !email.is_empty() && !email.validate_email() => {
            errors.add("email", error("email", "is invalid"));
        }
        _ => {}
    }

    match password {
        None if required => {
            errors.add("password", error("blank", "can't be blank"));
        }
        Some(password) if password.chars().count() < MIN_PASSWORD_LENGTH => {
            errors.add(
                "password",
                error("length", "is too short (minimum is 8 characters)"),
            );
        }
        _ => {}
    }

    if confirmation.is_some() && confirmation != password {
        errors.add(
            "password_confirmation",
            error("confirmation", "doesn't match Password"),
        );
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        credential_errors(
            self.email.as_deref(),
            self.password.as_deref(),
            self.password_confirmation.as_deref(),
            true,
        )
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        credential_errors(
            self.email.as_deref(),
            self.password.as_deref(),
            self.password_confirmation.as_deref(),
            false,
        )
    }
}
