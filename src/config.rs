use std::env;

/// Token signing configuration, loaded once at startup and passed by reference
/// into the encoder and session manager. No part of the request path reads the
/// environment directly.
pub struct AuthConfig {
    /// Symmetric secret used to sign and verify all tokens (HS256).
    pub jwt_secret: String,
    /// Lifetime of short-lived access tokens, in minutes.
    pub access_token_minutes: i64,
    /// Lifetime of long-lived refresh tokens, in days.
    pub refresh_token_days: i64,
}

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
                access_token_minutes: env::var("ACCESS_TOKEN_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .expect("ACCESS_TOKEN_MINUTES must be a number"),
                refresh_token_days: env::var("REFRESH_TOKEN_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .expect("REFRESH_TOKEN_DAYS must be a number"),
            },
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
