//! In-process store backed by concurrent maps

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{Catalog, DatabaseError, Result, SessionStore};
use crate::catalog::{Product, User};
use crate::id::{ProductId, SessionId, UserId, VoiceSessionId};
use crate::session::{NegotiationSession, VoiceSession};

/// Store that keeps everything in memory.
///
/// The compare-and-swap in `save_*` happens while holding the map shard lock
/// for that key, so it is atomic with respect to other writers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: DashMap<ProductId, Product>,
    users: DashMap<UserId, User>,
    sessions: DashMap<SessionId, NegotiationSession>,
    voice_sessions: DashMap<VoiceSessionId, VoiceSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn product(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.get(id).map(|p| p.clone()))
    }

    async fn user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn put_product(&self, product: Product) -> Result<()> {
        self.products.insert(product.product_id, product);
        Ok(())
    }

    async fn put_user(&self, user: User) -> Result<()> {
        self.users.insert(user.user_id, user);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &NegotiationSession) -> Result<()> {
        match self.sessions.entry(session.session_id) {
            Entry::Occupied(_) => Err(DatabaseError::DuplicateRecord {
                table: "negotiation",
                id: session.session_id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<NegotiationSession>> {
        Ok(self
            .sessions
            .get(session_id)
            .filter(|s| s.user_id == *user_id)
            .map(|s| s.clone()))
    }

    async fn save_session(&self, session: &NegotiationSession) -> Result<NegotiationSession> {
        let conflict = || DatabaseError::VersionConflict {
            id: session.session_id.to_string(),
            expected_version: session.version,
        };

        let mut stored = self.sessions.get_mut(&session.session_id).ok_or_else(conflict)?;
        if stored.version != session.version {
            return Err(conflict());
        }

        let mut next = session.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn sessions_for_user(&self, user_id: &UserId) -> Result<Vec<NegotiationSession>> {
        let mut sessions: Vec<NegotiationSession> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == *user_id)
            .map(|s| s.clone())
            .collect();
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }

    async fn insert_voice_session(&self, session: &VoiceSession) -> Result<()> {
        match self.voice_sessions.entry(session.session_id) {
            Entry::Occupied(_) => Err(DatabaseError::DuplicateRecord {
                table: "voice_session",
                id: session.session_id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn voice_session(
        &self,
        user_id: &UserId,
        session_id: &VoiceSessionId,
    ) -> Result<Option<VoiceSession>> {
        Ok(self
            .voice_sessions
            .get(session_id)
            .filter(|s| s.user_id == *user_id)
            .map(|s| s.clone()))
    }

    async fn save_voice_session(&self, session: &VoiceSession) -> Result<VoiceSession> {
        let conflict = || DatabaseError::VersionConflict {
            id: session.session_id.to_string(),
            expected_version: session.version,
        };

        let mut stored = self
            .voice_sessions
            .get_mut(&session.session_id)
            .ok_or_else(conflict)?;
        if stored.version != session.version {
            return Err(conflict());
        }

        let mut next = session.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn voice_sessions_for_user(&self, user_id: &UserId) -> Result<Vec<VoiceSession>> {
        let mut sessions: Vec<VoiceSession> = self
            .voice_sessions
            .iter()
            .filter(|s| s.user_id == *user_id)
            .map(|s| s.clone())
            .collect();
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NegotiationMessage;
    use pretty_assertions::assert_eq;

    fn open(user: UserId) -> NegotiationSession {
        NegotiationSession::open(
            user,
            ProductId::generate(),
            100.0,
            NegotiationMessage::buyer("Initial offer: 80", Some(80.0)),
            NegotiationMessage::counterpart("Thanks", None),
        )
    }

    #[tokio::test]
    async fn test_stale_write_is_rejected() {
        let store = MemoryStore::new();
        let user = UserId::generate();
        let session = open(user);
        store.insert_session(&session).await.unwrap();

        let mut first = store.session(&user, &session.session_id).await.unwrap().unwrap();
        let mut second = first.clone();

        first.messages.push(NegotiationMessage::buyer("first", None));
        second.messages.push(NegotiationMessage::buyer("second", None));

        let saved = store.save_session(&first).await.unwrap();
        assert_eq!(saved.version, 1);

        let err = store.save_session(&second).await.unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::VersionConflict {
                expected_version: 0,
                ..
            }
        ));

        let stored = store.session(&user, &session.session_id).await.unwrap().unwrap();
        assert_eq!(stored.messages.last().unwrap().text, "first");
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = UserId::generate();
        let session = open(owner);
        store.insert_session(&session).await.unwrap();

        let stranger = UserId::generate();
        assert!(
            store
                .session(&stranger, &session.session_id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.sessions_for_user(&stranger).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_insert_fails() {
        let store = MemoryStore::new();
        let session = open(UserId::generate());
        store.insert_session(&session).await.unwrap();
        assert!(matches!(
            store.insert_session(&session).await,
            Err(DatabaseError::DuplicateRecord { .. })
        ));
    }

    #[tokio::test]
    async fn test_history_in_creation_order() {
        let store = MemoryStore::new();
        let user = UserId::generate();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let session = open(user);
            ids.push(session.session_id);
            store.insert_session(&session).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let listed: Vec<SessionId> = store
            .sessions_for_user(&user)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.session_id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_history_ties_break_on_session_id() {
        let store = MemoryStore::new();
        let user = UserId::generate();
        let first = open(user);
        let created_at = first.created_at;

        let mut ids = vec![first.session_id];
        store.insert_session(&first).await.unwrap();
        for _ in 0..4 {
            let mut session = open(user);
            session.created_at = created_at;
            ids.push(session.session_id);
            store.insert_session(&session).await.unwrap();
        }
        ids.sort();

        for _ in 0..3 {
            let listed: Vec<SessionId> = store
                .sessions_for_user(&user)
                .await
                .unwrap()
                .into_iter()
                .map(|s| s.session_id)
                .collect();
            assert_eq!(listed, ids);
        }
    }
}
