//! Persistence for catalog records and sessions
//!
//! Sessions are stored in their own tables keyed by session id, with the owning
//! user as an indexed column. Every write of an existing session is a
//! compare-and-swap on its `version`, so two writers that read the same state
//! cannot both succeed.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::catalog::{Product, User};
use crate::id::{ProductId, SessionId, UserId, VoiceSessionId};
use crate::session::{NegotiationSession, VoiceSession};

pub mod memory;
pub mod surreal;

pub use memory::MemoryStore;
pub use surreal::SurrealStore;

/// Core database error type
#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("Connection failed")]
    #[diagnostic(help("Check the database URL and ensure the database is reachable"))]
    ConnectionFailed(#[source] surrealdb::Error),

    #[error("Query failed")]
    #[diagnostic(help("Check the query syntax and table schema"))]
    QueryFailed(#[source] surrealdb::Error),

    #[error("Record {id} changed since it was read (expected version {expected_version})")]
    VersionConflict { id: String, expected_version: u64 },

    #[error("Record {id} already exists in {table}")]
    DuplicateRecord { table: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Read/write access to products and user accounts
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn product(&self, id: &ProductId) -> Result<Option<Product>>;

    async fn user(&self, id: &UserId) -> Result<Option<User>>;

    /// Insert or replace a product
    async fn put_product(&self, product: Product) -> Result<()>;

    /// Insert or replace a user
    async fn put_user(&self, user: User) -> Result<()>;
}

/// Session persistence
///
/// Lookups are scoped to the owner: a session belonging to someone else is
/// reported as absent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a freshly opened session
    async fn insert_session(&self, session: &NegotiationSession) -> Result<()>;

    async fn session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<NegotiationSession>>;

    /// Write `session` if the stored copy still has `session.version`.
    ///
    /// Returns the stored session with its version advanced by one, or
    /// [`DatabaseError::VersionConflict`] if another write got there first.
    async fn save_session(&self, session: &NegotiationSession) -> Result<NegotiationSession>;

    /// All of a user's sessions in creation order
    async fn sessions_for_user(&self, user_id: &UserId) -> Result<Vec<NegotiationSession>>;

    async fn insert_voice_session(&self, session: &VoiceSession) -> Result<()>;

    async fn voice_session(
        &self,
        user_id: &UserId,
        session_id: &VoiceSessionId,
    ) -> Result<Option<VoiceSession>>;

    /// Compare-and-swap write, as [`SessionStore::save_session`]
    async fn save_voice_session(&self, session: &VoiceSession) -> Result<VoiceSession>;

    async fn voice_sessions_for_user(&self, user_id: &UserId) -> Result<Vec<VoiceSession>>;
}
