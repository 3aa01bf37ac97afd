//! API response types

use chrono::{DateTime, Utc};
use haggle_core::{
    id::{ProductId, SessionId, VoiceSessionId},
    session::{NegotiationMessage, NegotiationSession, SessionStatus, Speaker, VoiceSession},
};
use serde::{Deserialize, Serialize};

/// Who wrote a message, in the vocabulary clients expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl From<Speaker> for MessageRole {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::Buyer => MessageRole::User,
            Speaker::Counterpart => MessageRole::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Price stated by the buyer, or put on the table by the counterpart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_value: Option<f64>,
}

impl From<NegotiationMessage> for MessageResponse {
    fn from(message: NegotiationMessage) -> Self {
        Self {
            role: message.speaker.into(),
            content: message.text,
            timestamp: message.timestamp,
            offer_value: message.offer_value,
        }
    }
}

/// Negotiation session as returned by every negotiation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub product_id: ProductId,
    pub messages: Vec<MessageResponse>,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NegotiationSession> for SessionResponse {
    fn from(session: NegotiationSession) -> Self {
        Self {
            session_id: session.session_id,
            product_id: session.product_id,
            messages: session.messages.into_iter().map(Into::into).collect(),
            status: session.status,
            final_price: session.final_price,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSessionResponse {
    pub session_id: VoiceSessionId,
    pub product_id: ProductId,
    /// Call length in seconds
    pub duration: u64,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VoiceSession> for VoiceSessionResponse {
    fn from(session: VoiceSession) -> Self {
        Self {
            session_id: session.session_id,
            product_id: session.product_id,
            duration: session.duration_secs,
            status: session.status,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_core::id::UserId;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_session_serializes_with_client_field_names() {
        let session = NegotiationSession::open(
            UserId::generate(),
            ProductId::generate(),
            100.0,
            NegotiationMessage::buyer("Initial offer: 80", Some(80.0)),
            NegotiationMessage::counterpart("Thank you", None),
        );
        let id = session.session_id;

        let json = serde_json::to_value(SessionResponse::from(session)).unwrap();
        assert_eq!(json["sessionId"], id.to_string());
        assert_eq!(json["status"], "active");
        assert!(json.get("finalPrice").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["offerValue"], 80.0);
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert!(json["messages"][1].get("offerValue").is_none());
        assert!(json.get("userId").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_voice_session_reports_duration() {
        let mut voice = VoiceSession::start(UserId::generate(), ProductId::generate());
        voice.complete(42).unwrap();

        let json = serde_json::to_value(VoiceSessionResponse::from(voice)).unwrap();
        assert_eq!(json["duration"], 42);
        assert_eq!(json["status"], "completed");
    }
}
