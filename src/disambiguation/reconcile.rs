//! Reconciliation of second-pass candidates against the first-pass reading

use serde::{Deserialize, Serialize};

use super::scoring::score;
use crate::vision::Token;

/// Default confidence margin separating a clear win from a near-tie
pub const DEFAULT_MARGIN: f64 = 0.1;

/// How candidates are reconciled with the original reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Walk candidates in engine order; each one is compared against the
    /// current best, so a later near-tie can replace an earlier winner
    #[default]
    Sequential,
    /// Judge each candidate against the original reading only and keep the
    /// most confident qualifier (higher score, then engine order, breaks ties)
    GlobalBest,
}

/// A (text, confidence) reading
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub confidence: f64,
}

impl Candidate {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    /// Whether this candidate beats `best` under the margin rule
    fn beats(&self, best: &Candidate, margin: f64) -> bool {
        if self.confidence > best.confidence + margin {
            return true;
        }
        (self.confidence - best.confidence).abs() <= margin && score(&self.text) > score(&best.text)
    }
}

impl From<Token> for Candidate {
    fn from(token: Token) -> Self {
        Self {
            text: token.text,
            confidence: token.confidence,
        }
    }
}

impl From<&Token> for Candidate {
    fn from(token: &Token) -> Self {
        Self::new(token.text.clone(), token.confidence)
    }
}

/// Pick the reading to keep for a token
pub fn reconcile(
    original: Candidate,
    candidates: impl IntoIterator<Item = Candidate>,
    margin: f64,
    policy: ReconcilePolicy,
) -> Candidate {
    match policy {
        ReconcilePolicy::Sequential => candidates.into_iter().fold(original, |best, candidate| {
            if candidate.beats(&best, margin) {
                candidate
            } else {
                best
            }
        }),
        ReconcilePolicy::GlobalBest => {
            let winner = candidates
                .into_iter()
                .filter(|c| c.beats(&original, margin))
                .fold(None::<Candidate>, |best, candidate| match best {
                    Some(b) if !outranks(&candidate, &b) => Some(b),
                    _ => Some(candidate),
                });
            winner.unwrap_or(original)
        }
    }
}

fn outranks(candidate: &Candidate, other: &Candidate) -> bool {
    candidate.confidence > other.confidence
        || (candidate.confidence == other.confidence && score(&candidate.text) > score(&other.text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential(original: Candidate, candidates: Vec<Candidate>) -> Candidate {
        reconcile(original, candidates, DEFAULT_MARGIN, ReconcilePolicy::Sequential)
    }

    #[test]
    fn test_confident_candidate_wins() {
        let result = sequential(Candidate::new("O0", 0.40), vec![Candidate::new("00", 0.85)]);
        assert_eq!(result, Candidate::new("00", 0.85));
    }

    #[test]
    fn test_near_tie_needs_better_score() {
        // Same score as the original: not adopted
        let result = sequential(Candidate::new("O0", 0.40), vec![Candidate::new("OO", 0.44)]);
        assert_eq!(result, Candidate::new("O0", 0.40));

        // Original carries a symbol, candidate does not: adopted
        let result = sequential(Candidate::new("O-0", 0.40), vec![Candidate::new("O00", 0.35)]);
        assert_eq!(result, Candidate::new("O00", 0.35));
    }

    #[test]
    fn test_no_candidates() {
        let result = sequential(Candidate::new("O0", 0.40), vec![]);
        assert_eq!(result, Candidate::new("O0", 0.40));
    }

    #[test]
    fn test_low_confidence_never_wins() {
        let result = sequential(Candidate::new("I-1", 0.80), vec![Candidate::new("II1", 0.55)]);
        assert_eq!(result, Candidate::new("I-1", 0.80));
    }

    #[test]
    fn test_sequential_is_order_sensitive() {
        let original = Candidate::new("5!", 0.50);
        let strong = Candidate::new("5S", 0.70);
        let weaker = Candidate::new("5SS", 0.62);

        // The later near-tie with a higher score replaces the stronger reading
        let result = sequential(original.clone(), vec![strong.clone(), weaker.clone()]);
        assert_eq!(result, weaker);

        // Reversed: 0.70 is within the margin of 0.62 and scores lower
        // The weaker reading stays
        let result = sequential(original, vec![weaker.clone(), strong]);
        assert_eq!(result, weaker);
    }

    #[test]
    fn test_global_best_prefers_confidence() {
        let original = Candidate::new("5!", 0.50);
        let strong = Candidate::new("5S", 0.70);
        let weaker = Candidate::new("5SS", 0.62);

        let result = reconcile(
            original,
            vec![strong.clone(), weaker],
            DEFAULT_MARGIN,
            ReconcilePolicy::GlobalBest,
        );
        assert_eq!(result, strong);
    }

    #[test]
    fn test_global_best_keeps_original_without_qualifier() {
        let original = Candidate::new("O0", 0.40);
        let result = reconcile(
            original.clone(),
            vec![Candidate::new("OO", 0.44), Candidate::new("0", 0.10)],
            DEFAULT_MARGIN,
            ReconcilePolicy::GlobalBest,
        );
        assert_eq!(result, original);
    }

    #[test]
    fn test_global_best_tie_uses_score_then_order() {
        let original = Candidate::new("8", 0.20);
        let result = reconcile(
            original,
            vec![
                Candidate::new("B", 0.90),
                Candidate::new("B8", 0.90),
                Candidate::new("88", 0.90),
            ],
            DEFAULT_MARGIN,
            ReconcilePolicy::GlobalBest,
        );
        assert_eq!(result, Candidate::new("B8", 0.90));
    }

    #[test]
    fn test_band_edge_uses_double_precision() {
        // 0.4 - 0.3 is 0.10000000000000003 in f64: outside the near-tie band
        let result = sequential(Candidate::new("O-0", 0.3), vec![Candidate::new("O00", 0.4)]);
        assert_eq!(result, Candidate::new("O-0", 0.3));
    }

    #[test]
    fn test_custom_margin() {
        let original = Candidate::new("Z2", 0.50);
        let candidate = Candidate::new("22", 0.58);
        // 0.58 is a near-tie under 0.1 but a clear win under 0.05
        assert_eq!(
            reconcile(original.clone(), vec![candidate.clone()], 0.1, ReconcilePolicy::Sequential),
            original
        );
        assert_eq!(
            reconcile(original, vec![candidate.clone()], 0.05, ReconcilePolicy::Sequential),
            candidate
        );
    }
}
