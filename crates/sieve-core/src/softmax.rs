use itertools::Itertools;

use crate::error::{check_logits, DomainError, Result};

/// Numerically stable softmax.
///
/// The maximum is subtracted before exponentiating, so large logits never
/// overflow and `-inf` entries map to exactly `0.0`.
///
/// # Errors
/// [`DomainError::Empty`] for an empty vector, [`DomainError::FullyMasked`]
/// when every entry is `-inf`.
pub fn softmax(logits: &[f64]) -> Result<Vec<f64>> {
    check_logits(logits)?;

    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return Err(DomainError::FullyMasked.into());
    }

    let exps = logits.iter().map(|x| (x - max).exp()).collect_vec();
    let sum: f64 = exps.iter().sum();
    Ok(exps.into_iter().map(|x| x / sum).collect())
}

/// Indices whose logit survived filtering.
pub fn kept(logits: &[f64]) -> Vec<usize> {
    logits
        .iter()
        .positions(|x| x.is_finite())
        .collect()
}

/// `true` when no entry is finite.
pub fn is_fully_masked(logits: &[f64]) -> bool {
    logits.iter().all(|&x| x == f64::NEG_INFINITY)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::Error;

    const ROCKET: [f64; 5] = [3.5, 3.1, 2.9, 2.0, -0.5];

    #[test]
    fn rocket_distribution() {
        let probs = softmax(&ROCKET).unwrap();
        let expected = [0.4064, 0.2724, 0.2230, 0.0907, 0.0074];
        for (p, e) in probs.iter().zip(expected) {
            assert_abs_diff_eq!(*p, e, epsilon = 1e-3);
        }
        assert_abs_diff_eq!(probs.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn masked_entries_get_zero() {
        let probs = softmax(&[1.0, f64::NEG_INFINITY, 1.0]).unwrap();
        assert_eq!(probs, vec![0.5, 0.0, 0.5]);
    }

    #[test]
    fn huge_logits_do_not_overflow() {
        let probs = softmax(&[1e300, 1e300 - 1e290, 0.0]).unwrap();
        assert!(probs.iter().all(|p| p.is_finite()));
        assert_abs_diff_eq!(probs.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn single_entry() {
        assert_eq!(softmax(&[-42.0]).unwrap(), vec![1.0]);
    }

    #[test]
    fn rejects_degenerate_input() {
        assert_eq!(softmax(&[]), Err(Error::Domain(DomainError::Empty)));
        assert_eq!(
            softmax(&[f64::NEG_INFINITY; 3]),
            Err(Error::Domain(DomainError::FullyMasked))
        );
    }

    #[test]
    fn kept_indices() {
        let logits = [1.0, f64::NEG_INFINITY, -3.0, f64::NEG_INFINITY];
        assert_eq!(kept(&logits), vec![0, 2]);
        assert!(!is_fully_masked(&logits));
        assert!(is_fully_masked(&[f64::NEG_INFINITY]));
    }
}
