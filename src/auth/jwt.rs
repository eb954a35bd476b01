use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    auth::{
        claims::{Claims, RESERVED_KEYS},
        errors::AuthError,
    },
    config::{JwtConfig, MAX_TOKEN_MINUTES},
};

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl IssuedToken {
    /// Seconds left until expiry, as used for the cookie `Max-Age`.
    pub fn max_age(&self, now: OffsetDateTime) -> i64 {
        (self.expires_at - now).whole_seconds().max(0)
    }
}

/// Issues and checks session tokens. `now` is passed in so callers (and tests)
/// control the clock.
pub trait TokenCodec: Send + Sync {
    fn issue(&self, identity: &str, now: OffsetDateTime) -> Result<IssuedToken, AuthError>;
    fn verify(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AuthError>;
    fn refresh(&self, token: &str, now: OffsetDateTime) -> Result<IssuedToken, AuthError>;
}

/// HS256 keys plus token policy.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    identity_key: String,
    timeout: Duration,
    max_refresh: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(!cfg.secret.is_empty(), "JWT secret must not be empty");
        anyhow::ensure!(
            !cfg.identity_key.is_empty() && !RESERVED_KEYS.contains(&cfg.identity_key.as_str()),
            "JWT identity key {:?} clashes with a registered claim",
            cfg.identity_key
        );
        anyhow::ensure!(
            (1..=MAX_TOKEN_MINUTES).contains(&cfg.ttl_minutes)
                && (0..=MAX_TOKEN_MINUTES).contains(&cfg.max_refresh_minutes),
            "JWT lifetimes must be within {MAX_TOKEN_MINUTES} minutes"
        );
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            identity_key: cfg.identity_key.clone(),
            timeout: Duration::minutes(cfg.ttl_minutes),
            max_refresh: Duration::minutes(cfg.max_refresh_minutes),
        })
    }

    fn sign(&self, identity: &str, now: OffsetDateTime, orig_iat: i64) -> Result<IssuedToken, AuthError> {
        let expires_at = now.checked_add(self.timeout).ok_or_else(|| {
            error!(ttl = %self.timeout, "token expiry out of range");
            AuthError::Signing("token expiry out of range".into())
        })?;
        let claims = Claims {
            identity: identity.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            orig_iat,
            iss: self.issuer.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims.to_payload(&self.identity_key),
            &self.encoding,
        )
        .map_err(|e| {
            error!(error = %e, "jwt encode failed");
            AuthError::Signing(e.to_string())
        })?;
        debug!(jti = %claims.jti, exp = claims.exp, "jwt signed");
        Ok(IssuedToken { token, expires_at })
    }

    /// Signature, issuer and shape checks only. Expiry is left to the caller,
    /// since refresh must accept expired tokens.
    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Map<String, Value>>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AuthError::TokenMalformed
        })?;
        Claims::from_payload(data.claims, &self.identity_key)
    }
}

impl TokenCodec for JwtKeys {
    fn issue(&self, identity: &str, now: OffsetDateTime) -> Result<IssuedToken, AuthError> {
        self.sign(identity, now, now.unix_timestamp())
    }

    fn verify(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AuthError> {
        let claims = self.decode_claims(token)?;
        if now.unix_timestamp() > claims.exp {
            return Err(AuthError::TokenExpired);
        }
        debug!(jti = %claims.jti, "jwt verified");
        Ok(claims)
    }

    fn refresh(&self, token: &str, now: OffsetDateTime) -> Result<IssuedToken, AuthError> {
        let claims = self.decode_claims(token)?;
        let window_end = claims
            .orig_iat
            .saturating_add(self.max_refresh.whole_seconds());
        if now.unix_timestamp() > window_end {
            return Err(AuthError::RefreshWindowExceeded);
        }
        self.sign(&claims.identity, now, claims.orig_iat)
    }
}

#[cfg(test)]
pub(crate) fn test_keys(secret: &str) -> JwtKeys {
    JwtKeys::new(&JwtConfig {
        secret: secret.into(),
        issuer: "todoapp".into(),
        identity_key: "email".into(),
        ttl_minutes: 60 * 24,
        max_refresh_minutes: 60 * 24,
    })
    .expect("test keys")
}
