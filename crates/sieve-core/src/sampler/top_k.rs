use derivative::Derivative;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::Transform;
use crate::error::{check_logits, Error, Result};

/// Keep the `k` highest logits.
///
/// The cutoff is a value, not a rank: every entry equal to the k-th largest
/// logit survives, so ties at the boundary can leave more than `k` entries.
/// With `k >= len` the logits are returned unchanged.
pub fn top_k(logits: &[f64], k: usize) -> Result<Vec<f64>> {
    if k == 0 {
        return Err(Error::invalid("k", k, "a positive integer"));
    }
    check_logits(logits)?;

    if k >= logits.len() {
        return Ok(logits.to_vec());
    }

    let kth = logits
        .iter()
        .copied()
        .sorted_unstable_by(|x, y| x.total_cmp(y).reverse())
        .nth(k - 1)
        .unwrap_or(f64::NEG_INFINITY);
    Ok(logits
        .iter()
        .map(|&x| if x >= kth { x } else { f64::NEG_INFINITY })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct TopK {
    #[derivative(Default(value = "1"))]
    pub k: usize,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Transform for TopK {
    fn transform(&self, logits: &[f64]) -> Result<Vec<f64>> {
        top_k(logits, self.k)
    }

    fn is_active(&self, len: usize) -> bool {
        self.k >= 1 && self.k < len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEG: f64 = f64::NEG_INFINITY;

    #[test]
    fn keeps_the_two_largest() {
        let filtered = top_k(&[3.5, 3.1, 2.9, 2.0, -0.5], 2).unwrap();
        assert_eq!(filtered, vec![3.5, 3.1, NEG, NEG, NEG]);
    }

    #[test]
    fn large_k_is_a_copy() {
        let logits = [1.0, NEG, 0.0];
        assert_eq!(top_k(&logits, 3).unwrap(), logits.to_vec());
        assert_eq!(top_k(&logits, 100).unwrap(), logits.to_vec());
    }

    #[test]
    fn ties_at_the_cutoff_survive() {
        let filtered = top_k(&[1.0, 2.0, 2.0, 2.0, 0.5], 2).unwrap();
        assert_eq!(filtered, vec![NEG, 2.0, 2.0, 2.0, NEG]);
    }

    #[test]
    fn all_equal_keeps_everything() {
        assert_eq!(top_k(&[0.3; 4], 1).unwrap(), vec![0.3; 4]);
    }

    #[test]
    fn fewer_finite_than_k_keeps_the_finite_ones() {
        let filtered = top_k(&[NEG, 1.0, NEG, NEG], 2).unwrap();
        assert_eq!(filtered, vec![NEG, 1.0, NEG, NEG]);
    }

    #[test]
    fn rejects_zero() {
        assert!(matches!(
            top_k(&[1.0, 2.0], 0),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn activity() {
        assert!(TopK::new(2).is_active(5));
        assert!(!TopK::new(5).is_active(5));
        assert!(!TopK::new(0).is_active(5));
    }
}
