use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::auth::{
    dto::{LoginCommand, LoginResult, ProfileResult, RegisterCommand, RegisterResult},
    jwt::TokenSigner,
    password::{CredentialHasher, HashingError},
    repo::UserStore,
    repo_types::{NewUser, User},
};
use crate::error::{IdentityError, Result};

/// Register, login and profile lookups on top of the store, hasher and signer.
///
/// Holds no per-request state; one instance is shared by every request.
/// Dropping a returned future abandons the operation at its next await, so a
/// cancelled request never reaches hashing or signing.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    signer: Arc<dyn TokenSigner>,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        signer: Arc<dyn TokenSigner>,
    ) -> Self {
        Self {
            store,
            hasher,
            signer,
        }
    }

    #[instrument(skip(self, cmd), fields(email = %cmd.email))]
    pub async fn register(&self, cmd: RegisterCommand) -> Result<RegisterResult> {
        if cmd.name.is_empty() || cmd.email.is_empty() || cmd.password.is_empty() {
            warn!("register with missing fields");
            return Err(IdentityError::InvalidInput);
        }

        // The store's unique email constraint still catches a concurrent duplicate.
        match self.store.get_by_email(&cmd.email).await {
            Ok(Some(_)) => {
                warn!("email already registered");
                return Err(IdentityError::EmailAlreadyExists);
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "get_by_email failed");
                return Err(e.into());
            }
        }

        let password = self.hash_password(cmd.password).await?;

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let new_user = NewUser {
            name: cmd.name,
            email: cmd.email,
            password,
            created_at: now,
            updated_at: now,
        };
        let user = self.store.create(new_user).await.map_err(|e| {
            error!(error = %e, "create user failed");
            IdentityError::from(e)
        })?;

        info!(user_id = user.user_id, "user registered");
        Ok(RegisterResult {
            id: user.user_id,
            name: user.name,
            email: user.email,
        })
    }

    #[instrument(skip(self, cmd), fields(email = %cmd.email))]
    pub async fn login(&self, cmd: LoginCommand) -> Result<LoginResult> {
        if cmd.email.is_empty() || cmd.password.is_empty() {
            warn!("login with missing fields");
            return Err(IdentityError::InvalidInput);
        }

        let user = match self.store.get_by_email(&cmd.email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!("login unknown email");
                return Err(IdentityError::InvalidCredentials);
            }
            Err(e) => {
                // Reported as bad credentials so callers cannot probe for accounts.
                error!(error = %e, "get_by_email failed during login");
                return Err(IdentityError::InvalidCredentials);
            }
        };

        if !self.verify_password(user.password, cmd.password).await? {
            warn!(user_id = user.user_id, "login invalid password");
            return Err(IdentityError::InvalidCredentials);
        }

        let token = self.signer.sign(user.user_id)?;
        info!(user_id = user.user_id, "user logged in");
        Ok(LoginResult { token })
    }

    /// Profile of the caller, whose identifier came out of a verified token.
    #[instrument(skip(self))]
    pub async fn get_me(&self, user_id: i64) -> Result<ProfileResult> {
        self.profile(user_id).await
    }

    /// Profile of any user, identifier taken from the request path.
    #[instrument(skip(self))]
    pub async fn get_user_by_id(&self, user_id: i64) -> Result<ProfileResult> {
        self.profile(user_id).await
    }

    /// Raw token string in, user identifier out.
    pub fn verify_token(&self, token: &str) -> Result<i64> {
        Ok(self.signer.verify(token)?)
    }

    // Argon2 is CPU-bound, so it runs on the blocking pool instead of a runtime worker.
    async fn hash_password(&self, plain: String) -> Result<String> {
        let hasher = Arc::clone(&self.hasher);
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| HashingError(format!("hashing task failed: {e}")))??;
        Ok(hashed)
    }

    async fn verify_password(&self, secret: String, plain: String) -> Result<bool> {
        let hasher = Arc::clone(&self.hasher);
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&secret, &plain))
            .await
            .map_err(|e| HashingError(format!("verify task failed: {e}")))?;
        Ok(matched)
    }

    async fn profile(&self, user_id: i64) -> Result<ProfileResult> {
        if user_id <= 0 {
            return Err(IdentityError::InvalidIdentifier);
        }
        match self.store.get_by_id(user_id).await {
            Ok(Some(user)) => Ok(to_profile(user)),
            Ok(None) => {
                warn!(user_id, "user not found");
                Err(IdentityError::UserNotFound)
            }
            Err(e) => {
                error!(error = %e, user_id, "get_by_id failed");
                Err(IdentityError::UserNotFound)
            }
        }
    }
}

fn to_profile(user: User) -> ProfileResult {
    ProfileResult {
        id: user.user_id,
        name: user.name,
        email: user.email,
    }
}
