pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod store;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use session::{SessionManager, TokenPair};
pub use store::{MemoryRefreshTokenStore, PgRefreshTokenStore, RefreshTokenStore};
pub use token::{Claims, TokenEncoder};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address for the new account.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Payload carrying a refresh token, used by both the refresh and logout
/// endpoints.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response structure after successful authentication or rotation.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Short-lived bearer token for API calls.
    pub access_token: String,
    /// Long-lived token exchanged at `/auth/refresh` for a new pair.
    pub refresh_token: String,
    pub token_type: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}
