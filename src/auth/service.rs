// Authentication service - business logic layer

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{
        normalize_email, AuthResponse, ChangePasswordRequest, DeleteAccountRequest,
        RegisterRequest, UpdateProfileRequest, User,
    },
    password::PasswordService,
    repository::UserRepository,
    token::{TokenType, TokenService},
};
use crate::error::StoreError;
use crate::logs::{error::LogError, service::LogService};

/// Authentication service coordinating all auth operations
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<PasswordService>,
    tokens: Arc<TokenService>,
    logs: LogService,
}

fn duplicate_as_conflict(err: StoreError) -> AuthError {
    match err {
        StoreError::Conflict(_) => AuthError::EmailAlreadyExists,
        other => AuthError::Storage(other),
    }
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<PasswordService>,
        tokens: Arc<TokenService>,
        logs: LogService,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            logs,
        }
    }

    /// Register a new user
    ///
    /// This method:
    /// 1. Validates name, email format and password strength
    /// 2. Checks that no account owns the (lowercased) email
    /// 3. Hashes the password with Argon2id
    /// 4. Stores the user
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        // 1. Validate request
        request.validate()?;

        // 2. Uniqueness
        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            warn!("Registration attempt with existing email");
            return Err(AuthError::EmailAlreadyExists);
        }

        // 3. Hash password
        let password_hash = self.passwords.hash_password(&request.password)?;

        // 4. Store; the unique index still catches a concurrent registration
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        };
        let user = self.users.create(&user).await.map_err(duplicate_as_conflict)?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check an email/password pair
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.passwords.verify_dummy(password);
            debug!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.passwords.verify_password(password, &user.password_hash)? {
            warn!("Failed login for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Mint an access/refresh pair for `user`
    pub fn issue_token_pair(&self, user: User) -> Result<AuthResponse, AuthError> {
        let tokens = self.tokens.issue_pair(user.id)?;
        Ok(AuthResponse {
            tokens,
            user: user.into(),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let user = self.authenticate(email, password).await?;
        info!("User {} logged in", user.id);
        self.issue_token_pair(user)
    }

    /// Exchange a refresh token for a fresh pair
    ///
    /// 1. Verifies the token signature and expiry
    /// 2. Requires `typ = refresh`
    /// 3. Re-resolves the subject; a deleted user invalidates the token
    /// 4. Issues a new pair
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        // 1. Verify
        let claims = self.tokens.verify(refresh_token)?;

        // 2. Type check
        if claims.typ != TokenType::Refresh {
            debug!("Access token presented to refresh");
            return Err(AuthError::WrongTokenType);
        }

        // 3. Subject must still exist
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        // 4. Rotate
        debug!("Refreshed tokens for user {}", user.id);
        self.issue_token_pair(user)
    }

    /// Tokens are not tracked server side, so there is nothing to revoke
    pub fn logout(&self, user_id: Uuid) {
        info!("User {} logged out", user_id);
    }

    pub async fn get_current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change name and email, re-checking email uniqueness when it changes
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<User, AuthError> {
        request.validate()?;
        let mut user = self.get_current_user(user_id).await?;

        let email = normalize_email(&request.email);
        if email != user.email {
            if let Some(other) = self.users.find_by_email(&email).await? {
                if other.id != user.id {
                    return Err(AuthError::EmailAlreadyExists);
                }
            }
        }

        user.name = request.name.trim().to_string();
        user.email = email;
        user.updated_at = Utc::now();

        let updated = self.users.update(&user).await.map_err(|err| match err {
            StoreError::NotFound => AuthError::UserNotFound,
            other => duplicate_as_conflict(other),
        })?;

        info!("Updated profile for user {}", user_id);
        Ok(updated)
    }

    /// Replace the password after re-verifying the current one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        request.validate()?;
        let mut user = self.get_current_user(user_id).await?;

        if !self
            .passwords
            .verify_password(&request.current_password, &user.password_hash)?
        {
            warn!("Password change with wrong current password for user {}", user_id);
            return Err(AuthError::InvalidCredentials);
        }

        user.password_hash = self.passwords.hash_password(&request.new_password)?;
        user.updated_at = Utc::now();
        self.users.update(&user).await.map_err(|err| match err {
            StoreError::NotFound => AuthError::UserNotFound,
            other => AuthError::Storage(other),
        })?;

        info!("Changed password for user {}", user_id);
        Ok(())
    }

    /// Delete the account and everything it owns
    ///
    /// Images and log entries go first so a failure never leaves orphans
    /// behind a deleted user.
    pub async fn delete_account(
        &self,
        user_id: Uuid,
        request: DeleteAccountRequest,
    ) -> Result<(), AuthError> {
        request.validate()?;
        let user = self.get_current_user(user_id).await?;

        if !self
            .passwords
            .verify_password(&request.password, &user.password_hash)?
        {
            warn!("Account deletion with wrong password for user {}", user_id);
            return Err(AuthError::InvalidCredentials);
        }

        self.logs.purge_owner(user_id).await.map_err(|err| match err {
            LogError::Storage(store) => AuthError::Storage(store),
            other => AuthError::Storage(StoreError::Backend(other.to_string())),
        })?;
        self.users.delete(user_id).await.map_err(|err| match err {
            StoreError::NotFound => AuthError::UserNotFound,
            other => AuthError::Storage(other),
        })?;

        info!("Deleted account {}", user_id);
        Ok(())
    }
}
