use derivative::Derivative;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{check_epsilon, Transform, DEFAULT_EPSILON};
use crate::{
    error::{Error, Result},
    softmax::softmax,
};

/// Nucleus filtering with the default tolerance.
pub fn top_p(logits: &[f64], p: f64) -> Result<Vec<f64>> {
    top_p_with_epsilon(logits, p, DEFAULT_EPSILON)
}

/// Keep the most probable tokens whose cumulative mass stays within `p`.
///
/// Probabilities are walked in descending order. The threshold follows the
/// current probability until the running sum exceeds `p + epsilon`; the top
/// token is always in. Every token with `prob + epsilon >= threshold` is kept,
/// so ties at the boundary all survive and `p = 1` keeps everything.
pub fn top_p_with_epsilon(logits: &[f64], p: f64, epsilon: f64) -> Result<Vec<f64>> {
    if !(p > 0.0 && p <= 1.0) {
        return Err(Error::invalid("p", p, "a value in (0, 1]"));
    }
    check_epsilon(epsilon)?;
    let probs = softmax(logits)?;

    let sorted = probs
        .iter()
        .copied()
        .sorted_unstable_by(|x, y| x.total_cmp(y).reverse())
        .collect_vec();

    let mut cum = 0.0;
    let mut threshold = sorted[0];
    for &prob in &sorted {
        cum += prob;
        if cum > p + epsilon {
            break;
        }
        threshold = prob;
    }

    Ok(logits
        .iter()
        .zip(probs)
        .map(|(&x, prob)| match prob + epsilon >= threshold {
            true => x,
            false => f64::NEG_INFINITY,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
pub struct TopP {
    #[derivative(Default(value = "1.0"))]
    pub p: f64,
    #[derivative(Default(value = "DEFAULT_EPSILON"))]
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_epsilon() -> f64 {
    TopP::default().epsilon
}

impl TopP {
    pub fn new(p: f64) -> Self {
        Self {
            p,
            ..Default::default()
        }
    }
}

impl Transform for TopP {
    fn transform(&self, logits: &[f64]) -> Result<Vec<f64>> {
        top_p_with_epsilon(logits, self.p, self.epsilon)
    }

    fn is_active(&self, _len: usize) -> bool {
        self.p > 0.0 && self.p < 1.0
    }
}
