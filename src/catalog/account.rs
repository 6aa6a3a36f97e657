//! User accounts, password hashing and token authentication

use crate::config::SeedUser;
use crate::core::auth::{AuthContext, AuthProvider, Role};
use crate::core::error::{AuthError, CatalogError, CatalogResult, RequestError};
use crate::core::service::{DataService, TokenStore};
use crate::entities::{ReadUser, User};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Hash a plaintext password into an Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| AuthError::Crypto(format!("salt error: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Crypto(format!("hash error: {e}")))
}

/// Verify a plaintext password against a PHC string
///
/// Returns `Ok(false)` on mismatch and an error only for malformed hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

/// Data needed to open an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role,
            is_superuser: false,
        }
    }
}

impl From<&SeedUser> for NewUser {
    fn from(seed: &SeedUser) -> Self {
        Self {
            username: seed.username.clone(),
            password: seed.password.clone(),
            email: seed.email.clone(),
            first_name: seed.first_name.clone(),
            last_name: seed.last_name.clone(),
            role: seed.role,
            is_superuser: seed.is_superuser,
        }
    }
}

/// Successful login: the public user fields plus the token key
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: ReadUser,
    pub token: String,
}

/// Account service backing login and token authentication
#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn DataService<User>>,
    tokens: Arc<dyn TokenStore>,
}

impl Accounts {
    pub fn new(users: Arc<dyn DataService<User>>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { users, tokens }
    }

    pub fn users(&self) -> &Arc<dyn DataService<User>> {
        &self.users
    }

    pub async fn find_by_username(&self, username: &str) -> CatalogResult<Option<User>> {
        Ok(self
            .users
            .list()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    /// Create an account; usernames are unique
    pub async fn create_user(&self, new: NewUser) -> CatalogResult<User> {
        if self.find_by_username(&new.username).await?.is_some() {
            return Err(CatalogError::field(
                "username",
                "A user with that username already exists.",
            ));
        }
        let mut user = User::new(new.username, hash_password(&new.password)?, new.role);
        user.email = new.email;
        user.first_name = new.first_name;
        user.last_name = new.last_name;
        user.is_superuser = new.is_superuser;
        user.normalize_admin();

        let user = self.users.create(user).await?;
        tracing::info!(user = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    /// Create the configured seed accounts, skipping existing usernames
    pub async fn seed(&self, seeds: &[SeedUser]) -> CatalogResult<usize> {
        let mut created = 0;
        for seed in seeds {
            if self.find_by_username(&seed.username).await?.is_some() {
                tracing::debug!(user = %seed.username, "seed user already exists");
                continue;
            }
            self.create_user(NewUser::from(seed)).await?;
            created += 1;
        }
        Ok(created)
    }

    /// Check credentials; `None` when the user is unknown or the password wrong
    pub async fn authenticate(&self, username: &str, password: &str) -> CatalogResult<Option<User>> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };
        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Authenticate and hand out the user's token
    pub async fn login(&self, username: &str, password: &str) -> CatalogResult<LoginResponse> {
        let Some(user) = self.authenticate(username, password).await? else {
            tracing::warn!(user = %username, "login failed");
            return Err(AuthError::InvalidCredentials.into());
        };
        let (token, created) = self.tokens.get_or_create(&user.id).await?;
        tracing::info!(user = %user.username, new_token = created, "login succeeded");
        Ok(LoginResponse {
            user: ReadUser::from(&user),
            token,
        })
    }
}

/// Resolves `Authorization: Token <key>` headers
pub struct TokenAuthProvider {
    accounts: Accounts,
}

impl TokenAuthProvider {
    pub fn new(accounts: Accounts) -> Self {
        Self { accounts }
    }
}

fn unauthorized(message: &str) -> CatalogError {
    RequestError::Unauthorized {
        message: message.to_string(),
    }
    .into()
}

#[async_trait]
impl AuthProvider for TokenAuthProvider {
    async fn extract_context(&self, headers: &HeaderMap) -> CatalogResult<AuthContext> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(AuthContext::Anonymous);
        };
        let value = value
            .to_str()
            .map_err(|_| unauthorized("Invalid token header."))?;

        let mut parts = value.split_whitespace();
        // other schemes are not ours to judge
        if !parts.next().is_some_and(|scheme| scheme.eq_ignore_ascii_case("token")) {
            return Ok(AuthContext::Anonymous);
        }
        let key = match (parts.next(), parts.next()) {
            (Some(key), None) => key,
            (None, _) => return Err(unauthorized("Invalid token header. No credentials provided.")),
            (Some(_), Some(_)) => {
                return Err(unauthorized(
                    "Invalid token header. Token string should not contain spaces.",
                ));
            }
        };

        let Some(user_id) = self.accounts.tokens.resolve(key).await? else {
            tracing::warn!("rejected unknown token");
            return Err(unauthorized("Invalid token."));
        };
        let Some(user) = self.accounts.users.get(&user_id).await? else {
            tracing::warn!(%user_id, "token refers to a deleted user");
            return Err(unauthorized("User inactive or deleted."));
        };
        Ok(AuthContext::User(user.principal()))
    }
}
