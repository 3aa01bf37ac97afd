//! Haggle API types and definitions
//!
//! This crate defines the request/response types for the Haggle HTTP API,
//! shared between the server and any client.

pub mod error;
pub mod requests;
pub mod responses;

pub use error::ApiError;

// Re-export common types from haggle-core
pub use haggle_core::id::{ProductId, SessionId, UserId, VoiceSessionId};
pub use haggle_core::session::SessionStatus;

/// API version constant
pub const API_VERSION: &str = "v1";

/// Claims carried by a bearer access token
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccessTokenClaims {
    /// The authenticated user
    pub sub: UserId,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn new(sub: UserId, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub,
            iat: now,
            exp: now + ttl_seconds,
        }
    }
}
