use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    bearer::bearer_token,
    config::{AuthConfig, ConfigError},
    directory::UserDirectory,
    error::AuthError,
    token::{Clock, SystemClock, TokenIssuer, TokenVerifier},
    types::{Claims, User, UserID},
};

pub(crate) struct AuthInternal {
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    directory: Arc<dyn UserDirectory>,
}

/// The auth gate: issues session tokens and resolves bearer credentials to users.
///
/// Cloning is cheap and every clone shares the same keys and directory.
#[derive(Clone)]
pub struct Auth {
    pub(crate) internal: Arc<AuthInternal>,
}

impl Auth {
    pub fn new(config: AuthConfig, directory: Arc<dyn UserDirectory>) -> Result<Self, ConfigError> {
        Self::with_clock(config, directory, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: AuthConfig,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            internal: Arc::new(AuthInternal {
                issuer: TokenIssuer::new(&config, clock.clone()),
                verifier: TokenVerifier::new(&config, clock),
                directory,
            }),
        })
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.internal.directory
    }

    pub fn token_lifetime(&self) -> Duration {
        self.internal.issuer.default_ttl()
    }

    pub fn issue_token(&self, user_id: &UserID) -> Result<String, AuthError> {
        Ok(self.internal.issuer.issue(user_id)?)
    }

    pub fn issue_token_with_ttl(&self, user_id: &UserID, ttl: Duration) -> Result<String, AuthError> {
        Ok(self.internal.issuer.issue_with_ttl(user_id, ttl)?)
    }

    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        self.internal.verifier.verify(token)
    }

    /// Resolve an `Authorization` header value to a user.
    ///
    /// Every failure surfaces as [`AuthError::Unauthenticated`], whether the header was missing,
    /// the token was bad, or its subject no longer exists.
    pub async fn authorize(&self, authorization: Option<&str>) -> Result<User, AuthError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or_else(|| rejected("credential"))?;

        let claims = self
            .verify_token(token)
            .ok_or_else(|| rejected("verification"))?;

        let subject = claims.sub.ok_or_else(|| rejected("subject"))?;

        match self.internal.directory.lookup_by_id(&UserID(subject)).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(rejected("directory")),
            Err(source) => {
                warn!(%source, "user directory lookup failed during authorization");
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Like [`Auth::authorize`], but credential problems resolve to `None`.
    ///
    /// A failing directory is still an error: an outage must not quietly turn every caller anonymous.
    pub async fn authorize_optional(
        &self,
        authorization: Option<&str>,
    ) -> Result<Option<UserID>, AuthError> {
        let Some(subject) = authorization
            .and_then(bearer_token)
            .and_then(|token| self.verify_token(token))
            .and_then(|claims| claims.sub)
        else {
            return Ok(None);
        };

        let user = self
            .internal
            .directory
            .lookup_by_id(&UserID(subject))
            .await
            .map_err(|source| {
                warn!(%source, "user directory lookup failed during optional authorization");
                AuthError::DirectoryError { source }
            })?;

        Ok(user.map(|u| u.id))
    }
}

fn rejected(stage: &'static str) -> AuthError {
    debug!(stage, "rejecting bearer credential");
    AuthError::Unauthenticated
}
