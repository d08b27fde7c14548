//! Heuristic confidence in `[0, 1]` for a parsed call.

use std::sync::LazyLock;

use regex::Regex;

const BASE: f32 = 0.2;
const CLEAN_OUTPUT: f32 = 0.25;
const EXACT_NAME: f32 = 0.25;
const PARAMETERS: f32 = 0.15;
const NO_HEDGING: f32 = 0.15;

static HEDGING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(maybe|perhaps|i think|not sure|might|possibly|i guess|probably|unclear|assum(e|ing))\b",
    )
    .ok()
});

/// Whether `text` contains hedging language.
#[must_use]
pub fn contains_hedging(text: &str) -> bool {
    HEDGING
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(text))
}

/// Observable signals about one engine response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceSignals {
    /// The response was exactly one structured block.
    pub clean_output: bool,
    /// The proposed name matched a visible tool exactly (not only after normalization).
    pub exact_name: bool,
    /// The call carries parameters.
    pub has_parameters: bool,
    /// The tool declares parameters at all.
    pub expects_parameters: bool,
    /// Prose around the call hedges.
    pub hedging: bool,
}

impl ConfidenceSignals {
    /// Weighted sum of the signals. A parameterless tool called without parameters
    /// earns the parameter weight.
    #[must_use]
    pub fn score(&self) -> f32 {
        let mut score = BASE;
        if self.clean_output {
            score += CLEAN_OUTPUT;
        }
        if self.exact_name {
            score += EXACT_NAME;
        }
        if self.has_parameters || !self.expects_parameters {
            score += PARAMETERS;
        }
        if !self.hedging {
            score += NO_HEDGING;
        }
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_signals_give_full_confidence() {
        let signals = ConfidenceSignals {
            clean_output: true,
            exact_name: true,
            has_parameters: true,
            expects_parameters: true,
            hedging: false,
        };
        assert!((signals.score() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hedging_words_are_detected() {
        assert!(contains_hedging("I think you want a filter"));
        assert!(contains_hedging("Maybe this works"));
        assert!(!contains_hedging("Applying a 4-40 Hz band-pass filter."));
    }
}
