//! Token estimation and cost calculation.
//!
//! These are deliberate approximations: no real tokenizer is involved. Tests
//! rely only on the estimators being deterministic and monotonic.

use serde::{Deserialize, Serialize};

/// Estimate the token count of `text` as `ceil(chars / 4)`.
///
/// Monotonic in text length: appending text never lowers the estimate.
///
/// # Examples
///
/// ```
/// use tandem_core::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 0);
/// assert_eq!(estimate_tokens("ping"), 1);
/// assert_eq!(estimate_tokens("ping "), 2);
/// ```
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Round a USD amount to six decimal places.
pub fn round_usd(amount: f64) -> f64 {
    (amount * 1_000_000.0).round() / 1_000_000.0
}

/// Flat per-1K-token price for one provider (input and output combined).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Pricing {
    /// USD per 1000 tokens.
    price_per_1k_usd: f64,
}

impl Pricing {
    /// Default OpenAI rate (0.15 USD per 1K tokens).
    pub const OPENAI: Pricing = Pricing {
        price_per_1k_usd: 0.15,
    };

    /// Default Gemini rate (0.10 USD per 1K tokens).
    pub const GEMINI: Pricing = Pricing {
        price_per_1k_usd: 0.1,
    };

    /// Create a pricing rule. Negative prices are clamped to zero.
    pub fn per_1k(price_per_1k_usd: f64) -> Self {
        Self {
            price_per_1k_usd: price_per_1k_usd.max(0.0),
        }
    }

    /// Cost of `tokens` in USD, linear in the token count, rounded to 6 places.
    ///
    /// # Examples
    ///
    /// ```
    /// use tandem_core::Pricing;
    ///
    /// assert_eq!(Pricing::OPENAI.cost_for(1000), 0.15);
    /// assert_eq!(Pricing::GEMINI.cost_for(25), 0.0025);
    /// ```
    pub fn cost_for(&self, tokens: u64) -> f64 {
        round_usd(tokens as f64 * self.price_per_1k_usd / 1000.0)
    }
}
