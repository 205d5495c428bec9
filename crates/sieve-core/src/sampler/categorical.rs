use super::{RandomSource, Sampler};
use crate::{
    error::{check_logits, Error, Result},
    softmax::softmax,
};

/// Draw an index from the softmax of `logits` using one uniform number `r` in `[0, 1)`.
///
/// Entries are walked in index order and the first whose cumulative
/// probability exceeds `r` is returned. If rounding keeps the total below `r`,
/// the last index with non-zero probability is returned instead. This differs
/// from returning the plain last index only when that entry is masked, which
/// keeps masked tokens from ever being drawn.
pub fn sample(logits: &[f64], r: f64) -> Result<usize> {
    if !(0.0..1.0).contains(&r) {
        return Err(Error::invalid("r", r, "a uniform number in [0, 1)"));
    }
    let probs = softmax(logits)?;

    let mut cum = 0.0;
    for (index, prob) in probs.iter().enumerate() {
        cum += prob;
        if r < cum {
            return Ok(index);
        }
    }
    Ok(probs.iter().rposition(|&p| p > 0.0).unwrap_or(probs.len() - 1))
}

/// Index of the largest logit, the first one on ties.
pub fn argmax(logits: &[f64]) -> Result<usize> {
    check_logits(logits)?;
    let (index, _) = logits
        .iter()
        .enumerate()
        .fold((0, logits[0]), |(best, max), (index, &x)| match x > max {
            true => (index, x),
            false => (best, max),
        });
    Ok(index)
}

#[derive(Debug, Clone)]
pub struct Categorical<R> {
    pub source: R,
}

impl<R: RandomSource> Categorical<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: RandomSource> Sampler for Categorical<R> {
    fn sample(&mut self, logits: &[f64]) -> Result<usize> {
        let r = self.source.uniform();
        sample(logits, r)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Greedy;

impl Sampler for Greedy {
    fn sample(&mut self, logits: &[f64]) -> Result<usize> {
        argmax(logits)
    }
}
