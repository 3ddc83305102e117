use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub auth: Option<AuthConfig>,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

impl AppConfig {
    /// Reads configuration from the environment once at startup. Auth is
    /// enabled only when JWT_SECRET is set, in which case issuer and audience
    /// become mandatory.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://taskman.db".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5000".to_string())
            .parse()
            .map_err(|e| AppError::Validation(format!("invalid BIND_ADDR: {e}")))?;

        let auth = match env::var("JWT_SECRET") {
            Ok(secret) => {
                let issuer = env::var("JWT_ISSUER")
                    .map_err(|_| AppError::Validation("JWT_ISSUER is not set".to_string()))?;
                let audience = env::var("JWT_AUDIENCE")
                    .map_err(|_| AppError::Validation("JWT_AUDIENCE is not set".to_string()))?;
                Some(AuthConfig { secret, issuer, audience })
            }
            Err(_) => None,
        };

        Ok(Self { database_url, bind_addr, auth })
    }
}
