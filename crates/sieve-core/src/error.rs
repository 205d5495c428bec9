//! Error types for logit shaping.

use thiserror::Error;

/// Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid {name}: {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            expected,
        }
    }
}

/// Input vectors that no operation can produce a distribution from.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("logit vector is empty")]
    Empty,

    #[error("logit {index} is {value}, expected a finite value or -inf")]
    NotALogit { index: usize, value: f64 },

    #[error("every logit is -inf, there is no distribution to normalize")]
    FullyMasked,

    #[error("{tokens} tokens but {logits} logits")]
    LengthMismatch { tokens: usize, logits: usize },

    #[error("token {index} is out of range for a vocabulary of {len}")]
    TokenOutOfRange { index: usize, len: usize },
}

/// Rejects empty vectors and entries outside `ℝ ∪ {-∞}`.
pub(crate) fn check_logits(logits: &[f64]) -> Result<()> {
    if logits.is_empty() {
        return Err(DomainError::Empty.into());
    }
    match logits
        .iter()
        .position(|x| x.is_nan() || *x == f64::INFINITY)
    {
        Some(index) => Err(DomainError::NotALogit {
            index,
            value: logits[index],
        }
        .into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_masked_entries() {
        assert!(check_logits(&[f64::NEG_INFINITY, 1.0]).is_ok());
    }

    #[test]
    fn rejects_nan_and_positive_infinity() {
        assert!(matches!(
            check_logits(&[0.0, f64::NAN]),
            Err(Error::Domain(DomainError::NotALogit { index: 1, .. }))
        ));
        assert!(matches!(
            check_logits(&[f64::INFINITY]),
            Err(Error::Domain(DomainError::NotALogit { index: 0, .. }))
        ));
    }

    #[test]
    fn display() {
        let err = Error::invalid("k", 0, "a positive integer");
        assert_eq!(err.to_string(), "invalid k: 0 (expected a positive integer)");
        let err: Error = DomainError::Empty.into();
        assert_eq!(err.to_string(), "logit vector is empty");
    }
}
