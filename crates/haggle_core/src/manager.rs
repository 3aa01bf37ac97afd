//! Negotiation session manager
//!
//! The manager is the only path that writes session state. Each operation is
//! one read-modify-write cycle against the store: load, apply the transition
//! in memory, then a compare-and-swap save. A save that loses a race surfaces
//! as [`CoreError::ConcurrentModification`]; nothing is retried here.

use std::future::Future;
use std::sync::Arc;

use crate::catalog::{Product, User};
use crate::config::EngineConfig;
use crate::db::{Catalog, SessionStore};
use crate::error::{CoreError, Result};
use crate::id::{ProductId, SessionId, UserId, VoiceSessionId};
use crate::offer::{evaluate, offer_or_zero, parse_offer};
use crate::policy::ResponsePolicy;
use crate::session::{NegotiationMessage, NegotiationSession, VoiceSession};

pub struct NegotiationManager {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn SessionStore>,
    policy: Arc<dyn ResponsePolicy>,
    config: EngineConfig,
}

impl NegotiationManager {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn SessionStore>,
        policy: Arc<dyn ResponsePolicy>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            policy,
            config,
        }
    }

    /// Run one storage call under the configured timeout.
    async fn bounded<T, E, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        CoreError: From<E>,
    {
        let limit = self.config.store_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => {
                tracing::warn!(
                    operation,
                    after_ms = self.config.store_timeout_ms,
                    "storage call timed out"
                );
                Err(CoreError::Timeout {
                    operation,
                    after_ms: self.config.store_timeout_ms,
                })
            }
        }
    }

    async fn require_user(&self, user_id: &UserId) -> Result<User> {
        self.bounded("load user", self.catalog.user(user_id))
            .await?
            .ok_or_else(|| CoreError::user_not_found(user_id))
    }

    /// Products that can be bargained over: present, active, positively priced.
    async fn require_listed_product(&self, product_id: &ProductId) -> Result<Product> {
        self.bounded("load product", self.catalog.product(product_id))
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| CoreError::product_not_found(product_id))
    }

    /// A listed product with a price the counterpart can negotiate from
    async fn require_product(&self, product_id: &ProductId) -> Result<Product> {
        let product = self.require_listed_product(product_id).await?;

        if !(product.price.is_finite() && product.price > 0.0) {
            return Err(CoreError::validation(
                "price",
                format!("product {} has no positive price to negotiate from", product_id),
            ));
        }
        Ok(product)
    }

    async fn require_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<NegotiationSession> {
        self.bounded("load session", self.store.session(user_id, session_id))
            .await?
            .ok_or_else(|| CoreError::session_not_found(session_id))
    }

    /// Open a negotiation over `product_id` with the buyer's opening offer.
    #[tracing::instrument(skip_all, fields(user = %user_id, product = %product_id))]
    pub async fn start_negotiation(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        initial_offer: &str,
    ) -> Result<NegotiationSession> {
        let initial_offer = initial_offer.trim();
        if initial_offer.is_empty() {
            return Err(CoreError::validation("initialOffer", "offer must not be empty"));
        }

        let product = self.require_product(product_id).await?;
        self.require_user(user_id).await?;

        let opening = NegotiationMessage::buyer(
            format!("Initial offer: {}", initial_offer),
            parse_offer(initial_offer),
        );
        let acknowledgement =
            NegotiationMessage::counterpart(self.policy.opening(initial_offer).await, None);

        let session = NegotiationSession::open(
            *user_id,
            *product_id,
            product.price,
            opening,
            acknowledgement,
        );
        self.bounded("insert session", self.store.insert_session(&session))
            .await?;

        tracing::info!(
            session = %session.session_id,
            reference_price = session.reference_price,
            "negotiation started"
        );
        Ok(session)
    }

    /// Post a buyer message and append the counterpart's evaluated reply.
    ///
    /// Both messages are written in the same save, so a failure leaves the
    /// transcript untouched.
    #[tracing::instrument(skip_all, fields(user = %user_id, session = %session_id))]
    pub async fn submit_message(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        text: &str,
    ) -> Result<NegotiationSession> {
        if text.trim().is_empty() {
            return Err(CoreError::validation("content", "message must not be empty"));
        }

        self.require_user(user_id).await?;
        let mut session = self.require_session(user_id, session_id).await?;
        session.ensure_active()?;

        let offer = parse_offer(text);
        let decision = evaluate(session.reference_price, offer_or_zero(text));
        let reply = self.policy.respond(&decision).await;
        tracing::debug!(?offer, ?decision, "evaluated offer");

        session.record_exchange(
            NegotiationMessage::buyer(text, offer),
            NegotiationMessage::counterpart(reply, decision.price_on_table()),
        )?;

        self.bounded("save session", self.store.save_session(&session))
            .await
    }

    /// Close an active negotiation at `final_price`.
    #[tracing::instrument(skip_all, fields(user = %user_id, session = %session_id))]
    pub async fn end_negotiation(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        final_price: f64,
    ) -> Result<NegotiationSession> {
        if !(final_price.is_finite() && final_price >= 0.0) {
            return Err(CoreError::validation(
                "finalPrice",
                "final price must be a non-negative number",
            ));
        }

        self.require_user(user_id).await?;
        let mut session = self.require_session(user_id, session_id).await?;
        session.complete(final_price)?;

        let saved = self
            .bounded("save session", self.store.save_session(&session))
            .await?;
        tracing::info!(final_price, "negotiation completed");
        Ok(saved)
    }

    /// Every negotiation the user has opened, oldest first.
    pub async fn list_history(&self, user_id: &UserId) -> Result<Vec<NegotiationSession>> {
        self.require_user(user_id).await?;
        self.bounded("list sessions", self.store.sessions_for_user(user_id))
            .await
    }

    #[tracing::instrument(skip_all, fields(user = %user_id, product = %product_id))]
    pub async fn start_voice(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<VoiceSession> {
        self.require_listed_product(product_id).await?;
        self.require_user(user_id).await?;

        let session = VoiceSession::start(*user_id, *product_id);
        self.bounded("insert voice session", self.store.insert_voice_session(&session))
            .await?;
        tracing::info!(session = %session.session_id, "voice session started");
        Ok(session)
    }

    #[tracing::instrument(skip_all, fields(user = %user_id, session = %session_id))]
    pub async fn end_voice(
        &self,
        user_id: &UserId,
        session_id: &VoiceSessionId,
        duration_secs: u64,
    ) -> Result<VoiceSession> {
        self.require_user(user_id).await?;
        let mut session = self
            .bounded("load voice session", self.store.voice_session(user_id, session_id))
            .await?
            .ok_or_else(|| CoreError::session_not_found(session_id))?;
        session.complete(duration_secs)?;

        self.bounded("save voice session", self.store.save_voice_session(&session))
            .await
    }

    pub async fn voice_history(&self, user_id: &UserId) -> Result<Vec<VoiceSession>> {
        self.require_user(user_id).await?;
        self.bounded(
            "list voice sessions",
            self.store.voice_sessions_for_user(user_id),
        )
        .await
    }
}
