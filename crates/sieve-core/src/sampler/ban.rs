use serde::{Deserialize, Serialize};

use super::Transform;
use crate::error::{check_logits, DomainError, Result};

/// Mask the listed token indices to `-inf`.
pub fn ban(logits: &[f64], tokens: &[usize]) -> Result<Vec<f64>> {
    check_logits(logits)?;
    let len = logits.len();
    if let Some(&index) = tokens.iter().find(|&&index| index >= len) {
        return Err(DomainError::TokenOutOfRange { index, len }.into());
    }

    let mut output = logits.to_vec();
    for &index in tokens {
        output[index] = f64::NEG_INFINITY;
    }
    Ok(output)
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ban(pub Vec<usize>);

impl Transform for Ban {
    fn transform(&self, logits: &[f64]) -> Result<Vec<f64>> {
        ban(logits, &self.0)
    }

    fn is_active(&self, _len: usize) -> bool {
        !self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const NEG: f64 = f64::NEG_INFINITY;

    #[test]
    fn masks_listed_tokens() {
        let logits = [1.0, 2.0, 3.0];
        assert_eq!(ban(&logits, &[0, 2]).unwrap(), vec![NEG, 2.0, NEG]);
        assert_eq!(logits, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn can_mask_everything() {
        assert_eq!(ban(&[1.0, 2.0], &[1, 0, 1]).unwrap(), vec![NEG, NEG]);
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert_eq!(
            ban(&[1.0, 2.0], &[2]),
            Err(Error::Domain(DomainError::TokenOutOfRange { index: 2, len: 2 }))
        );
    }
}
