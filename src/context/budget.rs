//! Token cost approximation.

use super::DEFAULT_CHARS_PER_TOKEN;

/// Estimate the token cost of `text` with the default ratio.
///
/// Byte length is used rather than char count: multi-byte scripts such as
/// Hangul then estimate high, and overestimation is the safe direction.
pub fn estimate_tokens(text: &str) -> usize {
    TokenEstimator::default().estimate(text)
}

/// Length-over-ratio token estimator, rounded up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimator {
    chars_per_token: usize,
}

impl TokenEstimator {
    /// Create an estimator. A zero ratio is treated as one.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }

    pub fn estimate(&self, text: &str) -> usize {
        text.len().div_ceil(self.chars_per_token)
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_empty() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_estimate_counts_multibyte_high() {
        // 3 Hangul syllables, 9 bytes
        assert_eq!(estimate_tokens("적용해"), 3);
    }

    #[test]
    fn test_zero_ratio_is_clamped() {
        let estimator = TokenEstimator::new(0);
        assert_eq!(estimator.chars_per_token(), 1);
        assert_eq!(estimator.estimate("abc"), 3);
    }
}
