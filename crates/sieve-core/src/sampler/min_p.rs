use derivative::Derivative;
use serde::{Deserialize, Serialize};

use super::{check_epsilon, Transform, DEFAULT_EPSILON};
use crate::{
    error::{Error, Result},
    softmax::softmax,
};

/// Min-P filtering with the default tolerance.
pub fn min_p(logits: &[f64], min_p: f64) -> Result<Vec<f64>> {
    min_p_with_epsilon(logits, min_p, DEFAULT_EPSILON)
}

/// Keep tokens whose probability is at least `min_p` times the peak probability.
///
/// Tokens within `epsilon` of the peak are always kept.
pub fn min_p_with_epsilon(logits: &[f64], min_p: f64, epsilon: f64) -> Result<Vec<f64>> {
    if !(min_p > 0.0 && min_p < 1.0) {
        return Err(Error::invalid("min_p", min_p, "a value in (0, 1)"));
    }
    check_epsilon(epsilon)?;
    let probs = softmax(logits)?;
    let max = probs.iter().copied().fold(0.0, f64::max);
    let threshold = max * min_p;

    Ok(logits
        .iter()
        .zip(probs)
        .map(|(&x, prob)| {
            if (prob - max).abs() < epsilon || prob >= threshold {
                x
            } else {
                f64::NEG_INFINITY
            }
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
pub struct MinP {
    #[derivative(Default(value = "0.1"))]
    pub min_p: f64,
    #[derivative(Default(value = "DEFAULT_EPSILON"))]
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_epsilon() -> f64 {
    MinP::default().epsilon
}

impl MinP {
    pub fn new(min_p: f64) -> Self {
        Self {
            min_p,
            ..Default::default()
        }
    }
}

impl Transform for MinP {
    fn transform(&self, logits: &[f64]) -> Result<Vec<f64>> {
        min_p_with_epsilon(logits, self.min_p, self.epsilon)
    }

    fn is_active(&self, _len: usize) -> bool {
        self.min_p > 0.0 && self.min_p < 1.0
    }
}
