use std::{env, path::PathBuf};

use crate::error::ConfigError;

/// Secret used when `SESSION_JWT_SECRET` is unset outside production.
pub const LOCAL_JWT_SECRET: &str = "practice-router-local-session-secret";

/// AppConfig
///
/// Immutable runtime configuration, loaded once at startup and shared through
/// `AppState`. Handlers and the `RequestSession` extractor reach it via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment. Controls log format and the `x-user-id` bypass.
    pub env: Env,
    // Socket address the navigation host binds to.
    pub bind_addr: String,
    // HS256 secret used to validate session tokens.
    pub jwt_secret: String,
    // Directory holding `<module>.html` view files.
    pub views_dir: PathBuf,
    // Cookie that may carry the session token.
    pub session_cookie: String,
}

/// Env
///
/// Runtime context. `Local` enables the `x-user-id` bypass, pretty logs and the
/// built-in session secret; `Production` requires an explicit secret and logs JSON.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe values for tests; nothing is read from the environment.
    fn default() -> Self {
        // Loopback only, relative views directory, local signing secret.
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            views_dir: PathBuf::from("views"),
            session_cookie: "access_token".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment. Production refuses to start
    /// without an explicit session secret.
    pub fn load() -> Result<Self, ConfigError> {
        // 1. Environment marker. Anything but "production" is local.
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        // 2. Session secret. Mandatory in production, defaulted locally.
        let jwt_secret = match (env, env::var("SESSION_JWT_SECRET")) {
            (_, Ok(secret)) if !secret.is_empty() => secret,
            (Env::Production, _) => return Err(ConfigError::Missing("SESSION_JWT_SECRET")),
            (Env::Local, _) => LOCAL_JWT_SECRET.to_string(),
        };

        // 3. Everything else has a default.
        Ok(Self {
            env,
            bind_addr: env::var("APP_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt_secret,
            views_dir: env::var("VIEWS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("views")),
            session_cookie: env::var("SESSION_COOKIE")
                .unwrap_or_else(|_| "access_token".to_string()),
        })
    }
}
