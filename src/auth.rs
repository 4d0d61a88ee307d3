use std::{
    convert::Infallible,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AppConfig, Env};

/// SessionContext
///
/// The only thing the routing layer needs from the session store: a synchronous,
/// uncached answer to "is this session signed in right now".
pub trait SessionContext: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

impl SessionContext for bool {
    fn is_authenticated(&self) -> bool {
        *self
    }
}

/// SessionStore
///
/// A process-wide authentication flag shared by clones. The sign-in and sign-out
/// flows own the mutators; guards only ever read it.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    authenticated: Arc<AtomicBool>,
}

impl SessionStore {
    pub fn new(authenticated: bool) -> Self {
        Self {
            authenticated: Arc::new(AtomicBool::new(authenticated)),
        }
    }

    pub fn sign_in(&self) {
        self.authenticated.store(true, Ordering::SeqCst);
    }

    pub fn sign_out(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
    }
}

impl SessionContext for SessionStore {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }
}

/// Claims
///
/// Payload of the signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The signed-in user's id.
    pub sub: Uuid,
    /// Expiry, seconds since the epoch. Always validated.
    pub exp: usize,
    /// Issued at, seconds since the epoch.
    pub iat: usize,
}

/// issue_token
///
/// Signs an HS256 session token for `user_id` that expires after `ttl`. Used by local
/// tooling and tests; production tokens come from the identity provider.
pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp().max(0) as usize,
        exp: (now + ttl).timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// verify_token
///
/// Decodes and validates a session token, expiry included.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// RequestSession
///
/// The session of one HTTP request. Anonymous unless the request carries a valid token;
/// a missing, malformed or expired token is not an error, just an anonymous session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSession {
    pub user_id: Option<Uuid>,
}

impl RequestSession {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn authenticated(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// from_headers
    ///
    /// Resolution order:
    /// 1. Local bypass: a UUID in `x-user-id` (only when `Env::Local`).
    /// 2. `Authorization: Bearer <token>`.
    /// 3. The session cookie named by `AppConfig::session_cookie`.
    pub fn from_headers(headers: &HeaderMap, config: &AppConfig) -> Self {
        if config.env == Env::Local {
            let bypass = headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());
            if let Some(user_id) = bypass {
                return Self::authenticated(user_id);
            }
        }

        let Some(token) =
            bearer_token(headers).or_else(|| cookie_token(headers, &config.session_cookie))
        else {
            return Self::anonymous();
        };

        match verify_token(&config.jwt_secret, token) {
            Ok(claims) => Self::authenticated(claims.sub),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("session token expired"),
                    _ => tracing::debug!(error = %e, "session token rejected"),
                }
                Self::anonymous()
            }
        }
    }
}

impl SessionContext for RequestSession {
    fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

impl<S> FromRequestParts<S> for RequestSession
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(Self::from_headers(&parts.headers, &config))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_token<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, token)| token.trim_matches('"'))
        .filter(|token| !token.is_empty())
}
