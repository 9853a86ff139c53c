//! Signed session tokens.
//!
//! A token is a base64url claims payload joined to an HMAC-SHA256
//! signature, verified with a constant-time comparison. Issued tokens are
//! also recorded in the sessions table so the backend can expire or revoke
//! them server-side. The rest of the system only ever sees the user id
//! carried by a token that passed both checks.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{AuthError, CoreError};
use crate::storage::Database;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HMAC-signed session tokens.
pub struct TokenSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Mint a token for a verified user.
    pub fn issue(&self, user_id: &str) -> Result<(String, SessionClaims), AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Mint a token with an explicit issue time.
    pub fn issue_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, SessionClaims), AuthError> {
        let claims = SessionClaims {
            user_id: user_id.to_string(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let payload =
            serde_json::to_vec(&claims).map_err(|e| AuthError::TokenInvalid(e.to_string()))?;
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let signature = self.sign(encoded.as_bytes());
        Ok((format!("{encoded}.{signature}"), claims))
    }

    /// Check a token's signature and expiry.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let (encoded, signature) = token
            .split_once('.')
            .ok_or_else(|| AuthError::TokenInvalid("malformed token".to_string()))?;

        let expected = self.sign(encoded.as_bytes());
        if !constant_time_eq(signature, &expected) {
            return Err(AuthError::TokenInvalid("signature mismatch".to_string()));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| AuthError::TokenInvalid(e.to_string()))?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|e| AuthError::TokenInvalid(e.to_string()))?;

        if claims.expires_at <= now {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take keys of any size");
        mac.update(data);
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Record a freshly issued token in the sessions table.
pub fn store_session(
    db: &Database,
    token: &str,
    claims: &SessionClaims,
) -> Result<(), CoreError> {
    db.create_session(token, &claims.user_id, claims.expires_at)?;
    Ok(())
}

/// Verify a token and confirm its session is still live.
///
/// Both a missing session row and an expired one are reported as
/// [`AuthError::SessionExpired`]; the caller cannot distinguish a revoked
/// token from a stale one.
pub fn authenticate(
    db: &Database,
    signer: &TokenSigner,
    token: &str,
    now: DateTime<Utc>,
) -> Result<SessionClaims, CoreError> {
    let claims = signer.verify(token, now)?;
    match db.session_expiry(token, &claims.user_id)? {
        Some(expires_at) if expires_at > now => Ok(claims),
        _ => Err(AuthError::SessionExpired.into()),
    }
}
