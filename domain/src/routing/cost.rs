//! Token and cost estimation.

/// Rough token count: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Estimated cost of a round trip for `text`, assuming the answer is about as
/// long as the prompt.
pub fn estimate_cost(text: &str, cost_per_token: f64) -> f64 {
    estimate_tokens(text) as f64 * 2.0 * cost_per_token
}
