use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::errors::AuthError;

/// Registered claim names; the identity key may not shadow any of them.
pub const RESERVED_KEYS: &[&str] = &["jti", "iat", "exp", "orig_iat", "iss"];

/// JWT payload used for the browser session.
///
/// The identity is stored under a configurable key, so the payload is built and
/// read through [`Claims::to_payload`] / [`Claims::from_payload`] rather than a
/// plain derive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub identity: String, // user email
    pub jti: String,      // unique token id
    pub iat: i64,         // issued at (unix timestamp)
    pub exp: i64,         // expires at (unix timestamp)
    pub orig_iat: i64,    // first issuance, bounds the refresh window
    pub iss: String,      // issuer
}

#[derive(Deserialize)]
struct Registered {
    jti: String,
    iat: i64,
    exp: i64,
    orig_iat: i64,
    iss: String,
}

impl Claims {
    pub fn to_payload(&self, identity_key: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(identity_key.to_string(), Value::String(self.identity.clone()));
        map.insert("jti".into(), Value::String(self.jti.clone()));
        map.insert("iat".into(), Value::from(self.iat));
        map.insert("exp".into(), Value::from(self.exp));
        map.insert("orig_iat".into(), Value::from(self.orig_iat));
        map.insert("iss".into(), Value::String(self.iss.clone()));
        map
    }

    /// Rebuild typed claims from a decoded payload. Any missing or mistyped
    /// field, or an empty identity, is `TokenMalformed`.
    pub fn from_payload(payload: Map<String, Value>, identity_key: &str) -> Result<Self, AuthError> {
        let identity = match payload.get(identity_key) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(AuthError::TokenMalformed),
        };
        let reg: Registered = serde_json::from_value(Value::Object(payload))
            .map_err(|_| AuthError::TokenMalformed)?;
        Ok(Self {
            identity,
            jti: reg.jti,
            iat: reg.iat,
            exp: reg.exp,
            orig_iat: reg.orig_iat,
            iss: reg.iss,
        })
    }
}
