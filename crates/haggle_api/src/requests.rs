//! API request types

use haggle_core::id::ProductId;
use haggle_core::offer::format_price;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An opening offer, sent either as a bare number or as free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OfferInput {
    Amount(f64),
    Text(String),
}

impl OfferInput {
    /// The offer as the buyer's words, the form the session records
    pub fn to_text(&self) -> String {
        match self {
            OfferInput::Amount(amount) => format_price(*amount),
            OfferInput::Text(text) => text.clone(),
        }
    }
}

/// Open a negotiation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartNegotiationRequest {
    pub product_id: ProductId,
    pub initial_offer: OfferInput,
}

/// Post a buyer message to an open negotiation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Close a negotiation at the agreed price
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndNegotiationRequest {
    pub final_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartVoiceRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EndVoiceRequest {
    /// Call length in seconds
    pub duration: u64,
}
