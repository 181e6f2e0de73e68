use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::{
    config::AuthConfig,
    types::{Claims, UserID},
};

/// Source of the current time, in seconds since the unix epoch.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// A clock that only moves when told to. Handy for exercising token expiry.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Start from the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now())
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_secs(), Ordering::SeqCst);
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    header: Header,
    key: EncodingKey,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            header: Header::new(config.algorithm),
            key: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            default_ttl: config.default_ttl,
            clock,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn issue(&self, subject: &UserID) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_with_ttl(subject, self.default_ttl)
    }

    pub fn issue_with_ttl(
        &self,
        subject: &UserID,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = self.clock.now();

        let claims = Claims {
            sub: Some(subject.0.clone()),
            exp: now.saturating_add(ttl.as_secs()),
            iat: now,
        };

        encode(&self.header, &claims, &self.key)
    }
}

#[derive(thiserror::Error, Debug)]
enum VerificationFailure {
    #[error("token rejected: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token expired at {exp}, now {now}")]
    Expired { exp: u64, now: u64 },
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        // expiry is checked against our own clock, with no leeway
        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            validation,
            clock,
        }
    }

    /// Decoded claims, or `None` if the token is forged, corrupt or expired.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match self.decode_claims(token) {
            Ok(claims) => Some(claims),
            Err(failure) => {
                debug!(%failure, "token verification failed");
                None
            }
        }
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, VerificationFailure> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)?.claims;

        let now = self.clock.now();
        if now >= claims.exp {
            return Err(VerificationFailure::Expired {
                exp: claims.exp,
                now,
            });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::Algorithm;

    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn pair(config: &AuthConfig, clock: &Arc<ManualClock>) -> (TokenIssuer, TokenVerifier) {
        (
            TokenIssuer::new(config, clock.clone()),
            TokenVerifier::new(config, clock.clone()),
        )
    }

    #[test]
    fn token_is_valid_until_it_expires() {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let (issuer, verifier) = pair(&AuthConfig::new("secret"), &clock);

        let token = issuer.issue_with_ttl(&UserID("user-1".into()), HOUR).unwrap();

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_000 + 3600);

        clock.advance(HOUR - Duration::from_secs(1));
        assert!(verifier.verify(&token).is_some());

        clock.advance(Duration::from_secs(1));
        assert!(verifier.verify(&token).is_none());

        clock.advance(HOUR);
        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn issue_uses_the_configured_lifetime() {
        let clock = Arc::new(ManualClock::new(1_000));
        let config = AuthConfig::new("secret").with_default_ttl(Duration::from_secs(90));
        let (issuer, verifier) = pair(&config, &clock);

        let token = issuer.issue(&UserID("user-1".into())).unwrap();

        assert_eq!(verifier.verify(&token).unwrap().exp, 1_090);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let (issuer, _) = pair(&AuthConfig::new("some other secret"), &clock);
        let (_, verifier) = pair(&AuthConfig::new("secret"), &clock);

        let token = issuer.issue(&UserID("user-1".into())).unwrap();

        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn tokens_signed_with_another_algorithm_are_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let (issuer, _) = pair(
            &AuthConfig::new("secret").with_algorithm(Algorithm::HS512),
            &clock,
        );
        let (_, verifier) = pair(&AuthConfig::new("secret"), &clock);

        let token = issuer.issue(&UserID("user-1".into())).unwrap();

        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let (issuer, verifier) = pair(&AuthConfig::new("secret"), &clock);

        let token = issuer.issue(&UserID("user-1".into())).unwrap();
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        let payload = segments[1];

        for i in 0..payload.len() {
            let original = payload.as_bytes()[i];
            let replacement = if original == b'A' { 'B' } else { 'A' };
            let mut tampered_payload = payload.to_string();
            tampered_payload.replace_range(i..i + 1, &replacement.to_string());

            let tampered = [segments[0], &tampered_payload, segments[2]].join(".");
            assert!(verifier.verify(&tampered).is_none(), "position {i}");
        }
    }

    #[test]
    fn garbage_is_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let (_, verifier) = pair(&AuthConfig::new("secret"), &clock);

        for junk in ["", "fake token", "a.b.c", "...", "eyJhbGciOiJIUzI1NiJ9.e30."] {
            assert!(verifier.verify(junk).is_none(), "{junk}");
        }
    }
}
