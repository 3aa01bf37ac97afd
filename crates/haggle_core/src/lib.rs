//! Haggle Core - negotiation session engine
//!
//! Buyers open a negotiation over a catalog item with an opening offer, trade
//! messages with a scripted counterpart, and close the session at an agreed
//! price. This crate owns the offer rule, the session state machine and its
//! persistence; HTTP lives in `haggle-server`.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod id;
pub mod manager;
pub mod offer;
pub mod policy;
pub mod session;

pub use catalog::{CatalogSeed, Product, User, load_catalog};
pub use config::EngineConfig;
pub use db::{Catalog, DatabaseError, MemoryStore, SessionStore, SurrealStore};
pub use error::{CoreError, Result};
pub use id::{Id, IdType, ProductId, SessionId, UserId, VoiceSessionId};
pub use manager::NegotiationManager;
pub use offer::{Decision, evaluate, parse_offer};
pub use policy::{ResponsePolicy, ScriptedPolicy};
pub use session::{NegotiationMessage, NegotiationSession, SessionStatus, Speaker, VoiceSession};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        Catalog, CoreError, Decision, EngineConfig, NegotiationManager, NegotiationSession,
        ProductId, ResponsePolicy, Result, SessionId, SessionStatus, SessionStore, UserId,
    };
}
