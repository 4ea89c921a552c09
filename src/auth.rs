use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("malformed session token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("session token carries no usable email")]
    MissingEmail,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Client,
    Provider,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Subject {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
struct CallbackClaims {
    sub: Subject,
    email: String,
    #[serde(default)]
    name: Option<String>,
    role: Role,
    #[serde(default)]
    exp: Option<i64>,
}

/// Signed-in session handed over by the auth flow.
#[derive(Debug, Clone)]
pub struct AuthSession {
    token: String,
    user: Option<SessionUser>,
    expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// Session for a token whose payload is not inspected.
    pub fn opaque(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
            expires_at: None,
        }
    }

    /// Builds a session from the token delivered to the OAuth callback.
    ///
    /// The payload is read without signature verification: the client holds
    /// no key and the API re-validates the token on every request.
    pub fn from_callback_token(token: &str) -> Result<Self, AuthError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode::<CallbackClaims>(token, &DecodingKey::from_secret(&[]), &validation)?
            .claims;

        let email = claims.email.trim().to_string();
        let local_part = email.split('@').next().unwrap_or_default().to_string();
        if local_part.is_empty() {
            return Err(AuthError::MissingEmail);
        }

        let name = claims
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(local_part);

        let id = match claims.sub {
            Subject::Number(id) => id.to_string(),
            Subject::Text(id) => id,
        };

        Ok(Self {
            token: token.to_string(),
            user: Some(SessionUser {
                id,
                email,
                name,
                role: claims.role,
            }),
            expires_at: claims
                .exp
                .and_then(|exp| Utc.timestamp_opt(exp, 0).single()),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| now >= exp).unwrap_or(false)
    }
}
