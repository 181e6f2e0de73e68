use std::{str::FromStr, time::Duration};

use jsonwebtoken::Algorithm;

pub const DEFAULT_TTL_MINUTES: u64 = 1440;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY must be set to a non-empty value")]
    MissingSecret,
    #[error("unsupported signing algorithm {0:?}, expected one of HS256, HS384, HS512")]
    UnsupportedAlgorithm(String),
    #[error("invalid token lifetime {0:?}, expected a positive number of minutes")]
    InvalidLifetime(String),
}

#[derive(Clone)]
pub struct AuthConfig {
    /// The secret used to sign session tokens.
    /// If the secret changes, all currently issued tokens stop verifying.
    pub signing_secret: String,
    /// Signing algorithm. Only the HMAC family is usable with a shared secret.
    pub algorithm: Algorithm,
    /// How long issued tokens remain valid for. After this interval, the client will have to re-login.
    pub default_ttl: Duration,
}

impl AuthConfig {
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            algorithm: Algorithm::HS256,
            default_ttl: Duration::from_secs(DEFAULT_TTL_MINUTES * 60),
        }
    }

    /// Read `JWT_SECRET_KEY`, `JWT_ALGORITHM` and `JWT_ACCESS_TOKEN_EXPIRE_MINUTES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signing_secret = lookup("JWT_SECRET_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let algorithm = match lookup("JWT_ALGORITHM") {
            Some(raw) => parse_algorithm(raw.trim())?,
            None => Algorithm::HS256,
        };

        let seconds = match lookup("JWT_ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|m| *m > 0)
                .and_then(|m| m.checked_mul(60))
                .ok_or(ConfigError::InvalidLifetime(raw))?,
            None => DEFAULT_TTL_MINUTES * 60,
        };

        Ok(Self {
            signing_secret,
            algorithm,
            default_ttl: Duration::from_secs(seconds),
        })
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !is_hmac(self.algorithm) {
            return Err(ConfigError::UnsupportedAlgorithm(format!(
                "{:?}",
                self.algorithm
            )));
        }
        if self.default_ttl.as_secs() == 0 {
            return Err(ConfigError::InvalidLifetime(format!(
                "{:?}",
                self.default_ttl
            )));
        }
        Ok(())
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    Algorithm::from_str(raw)
        .ok()
        .filter(|alg| is_hmac(*alg))
        .ok_or_else(|| ConfigError::UnsupportedAlgorithm(raw.to_string()))
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}
