use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    claims::TokenKind,
    cookies::{CookieOptions, CookieSink},
    dto::{LoginRequest, PublicUser, SignupRequest},
    error::AuthError,
    jwt::TokenSigner,
    password::{hash_password, verify_password},
    repo::{StoreError, UserStore},
    repo_types::NewUser,
};
use crate::config::CookieConfig;

/// Login, signup and token lifecycle over a credential store and a token signer.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenSigner>,
    cookies: CookieConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenSigner>,
        cookies: CookieConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            cookies,
        }
    }

    pub fn tokens(&self) -> &dyn TokenSigner {
        self.tokens.as_ref()
    }

    /// Check credentials and write the access/refresh cookie pair to `sink`.
    #[instrument(skip(self, credentials, sink))]
    pub async fn login(
        &self,
        credentials: LoginRequest,
        sink: &mut impl CookieSink,
    ) -> Result<(), AuthError> {
        let Some(user) = self.users.find_by_email(&credentials.username).await? else {
            warn!("login unknown email");
            return Err(AuthError::AccessDenied);
        };

        if !verify_password(&credentials.password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::AccessDenied);
        }

        self.issue_tokens(user.id, sink)?;
        info!(user_id = %user.id, "user logged in");
        Ok(())
    }

    /// Create a user with a hashed password and return its public view.
    #[instrument(skip(self, registration))]
    pub async fn signup(&self, registration: SignupRequest) -> Result<PublicUser, AuthError> {
        let hash = hash_password(&registration.password)?;
        let new_user = NewUser {
            email: registration.username,
            password: hash,
            name: registration.name,
        };

        let user = match self.users.create(new_user).await {
            Ok(u) => u,
            Err(StoreError::Duplicate) => {
                warn!("signup email already registered");
                return Err(AuthError::DuplicateUser);
            }
            Err(StoreError::Other(e)) => return Err(AuthError::Internal(e)),
        };

        info!(user_id = %user.id, "user registered");
        Ok(PublicUser::from(user))
    }

    /// Exchange a refresh token for a new cookie pair.
    #[instrument(skip(self, refresh_token, sink))]
    pub async fn refresh(
        &self,
        refresh_token: Option<&str>,
        sink: &mut impl CookieSink,
    ) -> Result<(), AuthError> {
        let token = refresh_token.ok_or(AuthError::AccessDenied)?;
        let claims = self
            .tokens
            .verify_kind(token, TokenKind::Refresh)
            .map_err(|e| {
                warn!(error = %e, "refresh token rejected");
                AuthError::AccessDenied
            })?;

        if self.users.find_by_id(claims.sub).await?.is_none() {
            warn!(user_id = %claims.sub, "refresh for missing user");
            return Err(AuthError::AccessDenied);
        }

        self.issue_tokens(claims.sub, sink)?;
        info!(user_id = %claims.sub, "tokens refreshed");
        Ok(())
    }

    /// Overwrite both auth cookies with expired empty values.
    pub fn logout(&self, sink: &mut impl CookieSink) {
        let opts = CookieOptions::auth(&self.cookies, 0);
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            sink.cookie(kind.cookie_name(), "", &opts);
        }
    }

    pub async fn me(&self, user_id: Uuid) -> Result<PublicUser, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or(AuthError::AccessDenied)
    }

    fn issue_tokens(&self, user_id: Uuid, sink: &mut impl CookieSink) -> anyhow::Result<()> {
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let token = self.tokens.sign(user_id, kind)?;
            let opts = CookieOptions::auth(&self.cookies, self.tokens.ttl(kind).as_secs());
            sink.cookie(kind.cookie_name(), &token, &opts);
        }
        Ok(())
    }
}
