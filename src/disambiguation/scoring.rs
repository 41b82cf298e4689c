//! Candidate text scoring used to break near-ties

/// Penalty per character that is neither digit nor letter
const SYMBOL_PENALTY: f32 = 0.5;

/// Score a candidate: digits and letters count +1, anything else -0.5
pub fn score(text: &str) -> f32 {
    text.chars()
        .map(|c| {
            if c.is_numeric() || c.is_alphabetic() {
                1.0
            } else {
                -SYMBOL_PENALTY
            }
        })
        .sum()
}
