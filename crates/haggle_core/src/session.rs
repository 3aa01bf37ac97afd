//! Negotiation and voice session records
//!
//! Sessions move one way: `active` to either `completed` or `cancelled`, and a
//! finished session never changes again. Messages are only ever appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::id::{ProductId, SessionId, UserId, VoiceSessionId};

/// Lifecycle state shared by negotiation and voice sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Buyer,
    Counterpart,
}

/// One entry in a negotiation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationMessage {
    pub speaker: Speaker,
    pub text: String,
    /// Price carried by the message: the buyer's parsed offer, or the
    /// counterpart's counter/accepted price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_value: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl NegotiationMessage {
    pub fn buyer(text: impl Into<String>, offer_value: Option<f64>) -> Self {
        Self {
            speaker: Speaker::Buyer,
            text: text.into(),
            offer_value,
            timestamp: Utc::now(),
        }
    }

    pub fn counterpart(text: impl Into<String>, offer_value: Option<f64>) -> Self {
        Self {
            speaker: Speaker::Counterpart,
            text: text.into(),
            offer_value,
            timestamp: Utc::now(),
        }
    }
}

/// A negotiation thread between one buyer and the counterpart over one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub product_id: ProductId,

    /// Product price captured when the session opened. Later catalog price
    /// changes do not affect it.
    pub reference_price: f64,

    #[serde(default)]
    pub messages: Vec<NegotiationMessage>,

    pub status: SessionStatus,

    /// Agreed price, present only once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_price: Option<f64>,

    /// Optimistic concurrency counter, advanced by the store on every save
    #[serde(default)]
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NegotiationSession {
    /// Open a new session seeded with the buyer's opening line and the
    /// counterpart's acknowledgement.
    pub fn open(
        user_id: UserId,
        product_id: ProductId,
        reference_price: f64,
        opening: NegotiationMessage,
        acknowledgement: NegotiationMessage,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: SessionId::generate(),
            user_id,
            product_id,
            reference_price,
            messages: vec![opening, acknowledgement],
            status: SessionStatus::Active,
            final_price: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn ensure_active(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(CoreError::SessionNotActive {
                id: self.session_id.to_string(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Append a buyer message and the counterpart's reply as a single step.
    pub fn record_exchange(
        &mut self,
        buyer: NegotiationMessage,
        counterpart: NegotiationMessage,
    ) -> Result<()> {
        self.ensure_active()?;
        self.messages.push(buyer);
        self.messages.push(counterpart);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Close the negotiation at `final_price`.
    pub fn complete(&mut self, final_price: f64) -> Result<()> {
        self.ensure_active()?;
        self.status = SessionStatus::Completed;
        self.final_price = Some(final_price);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// A voice call about a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSession {
    pub session_id: VoiceSessionId,
    pub user_id: UserId,
    pub product_id: ProductId,
    #[serde(default)]
    pub duration_secs: u64,
    pub status: SessionStatus,
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VoiceSession {
    pub fn start(user_id: UserId, product_id: ProductId) -> Self {
        let now = Utc::now();
        Self {
            session_id: VoiceSessionId::generate(),
            user_id,
            product_id,
            duration_secs: 0,
            status: SessionStatus::Active,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn complete(&mut self, duration_secs: u64) -> Result<()> {
        if self.status.is_terminal() {
            return Err(CoreError::SessionNotActive {
                id: self.session_id.to_string(),
                status: self.status,
            });
        }
        self.status = SessionStatus::Completed;
        self.duration_secs = duration_secs;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> NegotiationSession {
        NegotiationSession::open(
            UserId::generate(),
            ProductId::generate(),
            100.0,
            NegotiationMessage::buyer("Initial offer: 80", Some(80.0)),
            NegotiationMessage::counterpart("Thanks", None),
        )
    }

    #[test]
    fn test_open_session_is_active_with_two_messages() {
        let s = session();
        assert_eq!(s.status, SessionStatus::Active);
        assert_eq!(s.messages.len(), 2);
        assert_eq!(s.messages[0].speaker, Speaker::Buyer);
        assert_eq!(s.messages[1].speaker, Speaker::Counterpart);
        assert_eq!(s.final_price, None);
        assert_eq!(s.version, 0);
    }

    #[test]
    fn test_exchange_appends_in_order() {
        let mut s = session();
        let before = s.updated_at;
        s.record_exchange(
            NegotiationMessage::buyer("88", Some(88.0)),
            NegotiationMessage::counterpart("90?", Some(90.0)),
        )
        .unwrap();
        assert_eq!(s.messages.len(), 4);
        assert_eq!(s.messages[2].text, "88");
        assert_eq!(s.messages[3].text, "90?");
        assert!(s.updated_at >= before);
    }

    #[test]
    fn test_terminal_states_are_sinks() {
        let mut completed = session();
        completed.complete(95.0).unwrap();
        assert_eq!(completed.status, SessionStatus::Completed);
        assert_eq!(completed.final_price, Some(95.0));

        let mut cancelled = session();
        cancelled.status = SessionStatus::Cancelled;

        for s in [&mut completed, &mut cancelled] {
            let status = s.status;
            assert!(matches!(
                s.complete(10.0),
                Err(CoreError::SessionNotActive { .. })
            ));
            assert!(matches!(
                s.record_exchange(
                    NegotiationMessage::buyer("1", Some(1.0)),
                    NegotiationMessage::counterpart("no", None),
                ),
                Err(CoreError::SessionNotActive { .. })
            ));
            assert_eq!(s.status, status);
            assert_eq!(s.messages.len(), 2);
        }
    }

    #[test]
    fn test_voice_session_completes_once() {
        let mut v = VoiceSession::start(UserId::generate(), ProductId::generate());
        v.complete(120).unwrap();
        assert_eq!(v.duration_secs, 120);
        assert!(v.complete(5).is_err());
        assert_eq!(v.duration_secs, 120);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }
}
