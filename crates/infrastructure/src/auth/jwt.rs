//! HS256 bearer tokens.
//!
//! Tokens are issued elsewhere; this side only verifies the signature and
//! expiry and extracts the user id. `issue` exists for tooling and tests.

use chrono::{DateTime, Utc};
use domain::UserId;
use domain::auth::{AuthError, Authenticator};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (UTC Unix timestamp)
    pub exp: i64,
}

pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(), // HS256, validates exp
        }
    }

    pub fn issue(
        &self,
        user_id: UserId,
        email: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            user_id: user_id.value(),
            email,
            exp: expires_at.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(UserId::new(data.claims.user_id)),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(AuthError::Expired),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                Err(AuthError::InvalidCredential)
            }
        }
    }
}
