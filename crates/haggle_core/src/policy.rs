//! Counterpart reply generation
//!
//! The counterpart's wording is kept behind [`ResponsePolicy`] so a different
//! negotiation voice (or a model-backed one) can replace the scripted templates
//! without touching the session state machine.

use async_trait::async_trait;

use crate::offer::{Decision, format_price};

/// Produces the counterpart's side of the conversation
#[async_trait]
pub trait ResponsePolicy: Send + Sync {
    /// Reply to the buyer's opening offer when a session starts
    async fn opening(&self, initial_offer: &str) -> String;

    /// Reply to a buyer message that has been evaluated into `decision`
    async fn respond(&self, decision: &Decision) -> String;
}

/// Fixed template replies
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedPolicy;

#[async_trait]
impl ResponsePolicy for ScriptedPolicy {
    async fn opening(&self, initial_offer: &str) -> String {
        format!(
            "Thank you for your offer of {}. I'll help you negotiate the best price for this product.",
            initial_offer
        )
    }

    async fn respond(&self, decision: &Decision) -> String {
        match decision {
            Decision::Reject { reference_price } => format!(
                "I apologize, but that offer is too low. The current price is {}. Would you like to make a higher offer?",
                format_price(*reference_price)
            ),
            Decision::Accept { offer } => format!(
                "That's a good offer! I can accept {} for this product. Would you like to proceed with the purchase?",
                format_price(*offer)
            ),
            Decision::Counter {
                offer,
                counter_price,
            } => format!(
                "Thank you for your offer of {}. I can offer you a price of {}. Would you like to accept this offer?",
                format_price(*offer),
                format_price(*counter_price)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::evaluate;

    #[tokio::test]
    async fn test_reject_restates_reference_price() {
        let reply = ScriptedPolicy.respond(&evaluate(100.0, 70.0)).await;
        assert!(reply.contains("too low"));
        assert!(reply.contains("The current price is 100."));
    }

    #[tokio::test]
    async fn test_accept_names_offer() {
        let reply = ScriptedPolicy.respond(&evaluate(100.0, 96.0)).await;
        assert!(reply.contains("I can accept 96 for this product"));
    }

    #[tokio::test]
    async fn test_counter_names_both_prices() {
        let reply = ScriptedPolicy.respond(&evaluate(100.0, 88.0)).await;
        assert!(reply.contains("your offer of 88"));
        assert!(reply.contains("a price of 90."));
    }

    #[tokio::test]
    async fn test_opening_echoes_offer_text() {
        let reply = ScriptedPolicy.opening("about 75 bucks").await;
        assert!(reply.starts_with("Thank you for your offer of about 75 bucks."));
    }
}
