//! Offer extraction and evaluation
//!
//! Buyers type free-form text ("I can do 85.50 for it"). The first number in the
//! text is taken as the offer and compared against the session's frozen
//! reference price. Evaluation is a pure function of those two numbers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Offers strictly below this share of the reference price are rejected.
pub const REJECT_BELOW: f64 = 0.8;

/// Offers strictly above this share of the reference price are accepted.
pub const ACCEPT_ABOVE: f64 = 0.95;

/// Share of the reference price proposed when countering.
pub const COUNTER_AT: f64 = 0.9;

static OFFER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)?").expect("offer pattern is a valid regex"));

/// Extract the first unsigned decimal number from `text`.
///
/// There is no sign or thousands-separator handling: `"-5"` yields `5` and
/// `"1,200"` yields `1`.
pub fn parse_offer(text: &str) -> Option<f64> {
    OFFER_PATTERN
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Offer used for evaluation. Text without a number counts as an offer of zero,
/// which always lands in the reject tier.
pub fn offer_or_zero(text: &str) -> f64 {
    parse_offer(text).unwrap_or(0.0)
}

/// Outcome of comparing an offer against the reference price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Offer below the floor
    Reject { reference_price: f64 },
    /// Offer inside the bargaining band; counter at a fixed share of the reference
    Counter { offer: f64, counter_price: f64 },
    /// Offer close enough to the reference to take as-is
    Accept { offer: f64 },
}

impl Decision {
    /// Price the counterpart puts on the table, if any.
    pub fn price_on_table(&self) -> Option<f64> {
        match self {
            Decision::Reject { .. } => None,
            Decision::Counter { counter_price, .. } => Some(*counter_price),
            Decision::Accept { offer } => Some(*offer),
        }
    }
}

/// Classify `offer` against `reference_price`.
///
/// Both band edges belong to `Counter`: an offer of exactly 80% or exactly 95%
/// of the reference is countered. `reference_price` must be positive; callers
/// reject zero-priced products before getting here.
pub fn evaluate(reference_price: f64, offer: f64) -> Decision {
    debug_assert!(reference_price > 0.0, "reference price must be positive");

    if offer < reference_price * REJECT_BELOW {
        Decision::Reject { reference_price }
    } else if offer > reference_price * ACCEPT_ABOVE {
        Decision::Accept { offer }
    } else {
        Decision::Counter {
            offer,
            counter_price: reference_price * COUNTER_AT,
        }
    }
}

/// Render a price for counterpart messages: `90`, `89.99`, `12.5`.
pub fn format_price(value: f64) -> String {
    if value.fract() == 0.0 {
        return format!("{:.0}", value);
    }
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_first_number() {
        assert_eq!(parse_offer("I offer 70"), Some(70.0));
        assert_eq!(parse_offer("how about 85.50 or 90?"), Some(85.5));
        assert_eq!(parse_offer("1,200 is my limit"), Some(1.0));
        assert_eq!(parse_offer("-5"), Some(5.0));
        assert_eq!(parse_offer("12. dollars"), Some(12.0));
    }

    #[test]
    fn test_unparsable_offer_is_zero_and_rejected() {
        assert_eq!(parse_offer("too expensive"), None);
        assert_eq!(offer_or_zero("too expensive"), 0.0);
        assert_eq!(
            evaluate(100.0, offer_or_zero("no idea")),
            Decision::Reject {
                reference_price: 100.0
            }
        );
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(
            evaluate(100.0, offer_or_zero("I offer 70")),
            Decision::Reject {
                reference_price: 100.0
            }
        );
        assert_eq!(
            evaluate(100.0, offer_or_zero("I offer 96")),
            Decision::Accept { offer: 96.0 }
        );
        assert_eq!(
            evaluate(100.0, offer_or_zero("I offer 88")),
            Decision::Counter {
                offer: 88.0,
                counter_price: 90.0
            }
        );
    }

    #[test]
    fn test_band_edges_counter() {
        for reference in [100.0, 250.0, 19.99, 1234.56] {
            let floor = reference * REJECT_BELOW;
            let ceiling = reference * ACCEPT_ABOVE;

            assert!(matches!(
                evaluate(reference, floor),
                Decision::Counter { .. }
            ));
            assert!(matches!(
                evaluate(reference, ceiling),
                Decision::Counter { .. }
            ));
        }
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        for offer in [0.0, 50.0, 80.0, 88.0, 95.0, 95.01, 300.0] {
            assert_eq!(evaluate(100.0, offer), evaluate(100.0, offer));
        }
        assert_eq!(
            evaluate(200.0, 170.0).price_on_table(),
            Some(200.0 * COUNTER_AT)
        );
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(90.0), "90");
        assert_eq!(format_price(89.991), "89.99");
        assert_eq!(format_price(12.5), "12.5");
        assert_eq!(format_price(0.0), "0");
    }
}
