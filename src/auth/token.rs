//! HMAC-SHA256 bearer tokens.
//!
//! A token is `base64url(claims JSON) "." base64url(signature)`, where the
//! signature covers the encoded claims segment.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Signed token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub email: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Issues and verifies access tokens with one shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::MalformedToken)
    }

    /// Issue a token for a user, valid for the configured lifetime.
    pub fn issue(&self, user_id: i64, email: &str) -> Result<String, AuthError> {
        self.issue_at(user_id, email, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, user_id: i64, email: &str, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            exp: now.saturating_add(self.ttl_secs),
        };
        let json = serde_json::to_vec(&claims).map_err(|_| AuthError::MalformedToken)?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::MalformedToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::MalformedToken)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims: Claims =
            serde_json::from_slice(&json).map_err(|_| AuthError::MalformedToken)?;

        if claims.exp <= now {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_issue_and_verify() {
        let signer = TokenSigner::new("secret", 3600);
        let token = signer.issue_at(7, "a@example.com", NOW).unwrap();

        let claims = signer.verify_at(&token, NOW + 10).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.exp, NOW + 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = TokenSigner::new("secret", 60);
        let token = signer.issue_at(7, "a@example.com", NOW).unwrap();

        assert!(matches!(
            signer.verify_at(&token, NOW + 60),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let signer = TokenSigner::new("secret", 3600);
        let token = signer.issue_at(7, "a@example.com", NOW).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged_claims = Claims {
            sub: 1,
            email: "admin@example.com".to_string(),
            exp: NOW + 3600,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{forged_payload}.{signature}");

        assert!(matches!(
            signer.verify_at(&forged, NOW),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = TokenSigner::new("secret", 3600)
            .issue_at(7, "a@example.com", NOW)
            .unwrap();

        assert!(matches!(
            TokenSigner::new("other", 3600).verify_at(&token, NOW),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = TokenSigner::new("secret", 3600);
        assert!(matches!(
            signer.verify_at("no-dot-here", NOW),
            Err(AuthError::MalformedToken)
        ));
        assert!(matches!(
            signer.verify_at("abc.!!!", NOW),
            Err(AuthError::MalformedToken)
        ));
    }
}
