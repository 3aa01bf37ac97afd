//! SurrealDB-backed store

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use surrealdb::{Surreal, engine::any::Any};

use super::{Catalog, DatabaseError, Result, SessionStore};
use crate::catalog::{Product, User};
use crate::id::{ProductId, SessionId, UserId, VoiceSessionId};
use crate::session::{NegotiationSession, VoiceSession};

const NAMESPACE: &str = "haggle";
const DATABASE: &str = "main";

const PRODUCT_TABLE: &str = "product";
const USER_TABLE: &str = "user";
const NEGOTIATION_TABLE: &str = "negotiation";
const VOICE_TABLE: &str = "voice_session";

const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS product SCHEMALESS;
DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
DEFINE TABLE IF NOT EXISTS negotiation SCHEMALESS;
DEFINE INDEX IF NOT EXISTS negotiation_user ON TABLE negotiation COLUMNS user_id;
DEFINE TABLE IF NOT EXISTS voice_session SCHEMALESS;
DEFINE INDEX IF NOT EXISTS voice_session_user ON TABLE voice_session COLUMNS user_id;
"#;

/// Store backed by a SurrealDB connection (embedded `mem://` or remote)
#[derive(Clone)]
pub struct SurrealStore {
    db: Surreal<Any>,
}

impl SurrealStore {
    /// Connect to `url`, select the haggle namespace and define the schema
    pub async fn connect(url: &str) -> Result<Self> {
        tracing::info!("Connecting to database at {}", url);
        let connect_start = std::time::Instant::now();

        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(DatabaseError::ConnectionFailed)?;
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(DatabaseError::ConnectionFailed)?;

        tracing::info!(
            "Database connection established in {:?}",
            connect_start.elapsed()
        );

        Self::with_client(db).await
    }

    /// Wrap an already connected client, defining the schema if needed
    pub async fn with_client(db: Surreal<Any>) -> Result<Self> {
        db.query(SCHEMA)
            .await
            .map_err(DatabaseError::QueryFailed)?
            .check()
            .map_err(DatabaseError::QueryFailed)?;
        Ok(Self { db })
    }

    async fn insert<T>(&self, table: &'static str, key: String, record: &T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let created: Option<T> = self
            .db
            .create((table, key.clone()))
            .content(record.clone())
            .await
            .map_err(|e| match e {
                surrealdb::Error::Db(surrealdb::error::Db::RecordExists { .. }) => {
                    DatabaseError::DuplicateRecord { table, id: key }
                }
                other => DatabaseError::QueryFailed(other),
            })?;

        if created.is_none() {
            tracing::warn!("create in {} returned no record", table);
        }
        Ok(())
    }

    async fn upsert<T>(&self, table: &'static str, key: String, record: T) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let _: Option<T> = self
            .db
            .upsert((table, key))
            .content(record)
            .await
            .map_err(DatabaseError::QueryFailed)?;
        Ok(())
    }

    async fn select<T>(&self, table: &'static str, key: String) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.db
            .select((table, key))
            .await
            .map_err(DatabaseError::QueryFailed)
    }

    async fn select_owned<T>(
        &self,
        table: &'static str,
        key: String,
        user_id: &UserId,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut response = self
            .db
            .query("SELECT * FROM type::thing($table, $key) WHERE user_id = $user")
            .bind(("table", table))
            .bind(("key", key))
            .bind(("user", user_id.to_string()))
            .await
            .map_err(DatabaseError::QueryFailed)?;

        let records: Vec<T> = response.take(0).map_err(DatabaseError::QueryFailed)?;
        Ok(records.into_iter().next())
    }

    /// Replace the record only if its stored version is still `expected`.
    ///
    /// Returns `Ok(None)` when the version check fails. A transaction that
    /// loses a commit race with another writer is reported the same way as a
    /// stale version.
    async fn compare_and_swap<T>(
        &self,
        table: &'static str,
        key: String,
        id: String,
        expected: u64,
        next: T,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let conflict_or_failed = |e: surrealdb::Error| {
            if is_write_conflict(&e) {
                DatabaseError::VersionConflict {
                    id: id.clone(),
                    expected_version: expected,
                }
            } else {
                DatabaseError::QueryFailed(e)
            }
        };

        let mut response = self
            .db
            .query("UPDATE type::thing($table, $key) CONTENT $record WHERE version = $expected")
            .bind(("table", table))
            .bind(("key", key))
            .bind(("record", next))
            .bind(("expected", expected))
            .await
            .map_err(conflict_or_failed)?;

        let updated: Vec<T> = response.take(0).map_err(conflict_or_failed)?;
        Ok(updated.into_iter().next())
    }

    async fn list_for_user<T>(&self, table: &'static str, user_id: &UserId) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut response = self
            .db
            .query("SELECT * FROM type::table($table) WHERE user_id = $user")
            .bind(("table", table))
            .bind(("user", user_id.to_string()))
            .await
            .map_err(DatabaseError::QueryFailed)?;

        response.take(0).map_err(DatabaseError::QueryFailed)
    }
}

/// Commit failures caused by a concurrent writer touching the same record.
fn is_write_conflict(err: &surrealdb::Error) -> bool {
    use surrealdb::error::Db;

    match err {
        surrealdb::Error::Db(Db::TxRetryable) => true,
        surrealdb::Error::Db(Db::QueryNotExecutedDetail { message }) => {
            message.contains("can be retried")
        }
        other => other.to_string().contains("can be retried"),
    }
}

#[async_trait]
impl Catalog for SurrealStore {
    async fn product(&self, id: &ProductId) -> Result<Option<Product>> {
        self.select(PRODUCT_TABLE, id.to_record_id()).await
    }

    async fn user(&self, id: &UserId) -> Result<Option<User>> {
        self.select(USER_TABLE, id.to_record_id()).await
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        self.upsert(PRODUCT_TABLE, product.product_id.to_record_id(), product)
            .await
    }

    async fn put_user(&self, user: User) -> Result<()> {
        self.upsert(USER_TABLE, user.user_id.to_record_id(), user).await
    }
}

#[async_trait]
impl SessionStore for SurrealStore {
    async fn insert_session(&self, session: &NegotiationSession) -> Result<()> {
        self.insert(
            NEGOTIATION_TABLE,
            session.session_id.to_record_id(),
            session,
        )
        .await
    }

    async fn session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<NegotiationSession>> {
        self.select_owned(NEGOTIATION_TABLE, session_id.to_record_id(), user_id)
            .await
    }

    async fn save_session(&self, session: &NegotiationSession) -> Result<NegotiationSession> {
        let mut next = session.clone();
        next.version = session.version + 1;

        self.compare_and_swap(
            NEGOTIATION_TABLE,
            session.session_id.to_record_id(),
            session.session_id.to_string(),
            session.version,
            next,
        )
        .await?
        .ok_or_else(|| DatabaseError::VersionConflict {
            id: session.session_id.to_string(),
            expected_version: session.version,
        })
    }

    async fn sessions_for_user(&self, user_id: &UserId) -> Result<Vec<NegotiationSession>> {
        let mut sessions: Vec<NegotiationSession> =
            self.list_for_user(NEGOTIATION_TABLE, user_id).await?;
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }

    async fn insert_voice_session(&self, session: &VoiceSession) -> Result<()> {
        self.insert(VOICE_TABLE, session.session_id.to_record_id(), session)
            .await
    }

    async fn voice_session(
        &self,
        user_id: &UserId,
        session_id: &VoiceSessionId,
    ) -> Result<Option<VoiceSession>> {
        self.select_owned(VOICE_TABLE, session_id.to_record_id(), user_id)
            .await
    }

    async fn save_voice_session(&self, session: &VoiceSession) -> Result<VoiceSession> {
        let mut next = session.clone();
        next.version = session.version + 1;

        self.compare_and_swap(
            VOICE_TABLE,
            session.session_id.to_record_id(),
            session.session_id.to_string(),
            session.version,
            next,
        )
        .await?
        .ok_or_else(|| DatabaseError::VersionConflict {
            id: session.session_id.to_string(),
            expected_version: session.version,
        })
    }

    async fn voice_sessions_for_user(&self, user_id: &UserId) -> Result<Vec<VoiceSession>> {
        let mut sessions: Vec<VoiceSession> = self.list_for_user(VOICE_TABLE, user_id).await?;
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }
}
