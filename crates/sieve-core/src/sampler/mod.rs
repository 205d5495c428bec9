use crate::error::{Error, Result};

pub mod ban;
pub mod categorical;
pub mod min_p;
pub mod temperature;
pub mod top_k;
pub mod top_p;

/// Tolerance used by the probability comparisons of Min-P and Top-P.
pub const DEFAULT_EPSILON: f64 = 1e-8;

pub(crate) fn check_epsilon(epsilon: f64) -> Result<()> {
    match epsilon.is_finite() && epsilon >= 0.0 {
        true => Ok(()),
        false => Err(Error::invalid("epsilon", epsilon, "a finite non-negative tolerance")),
    }
}

pub trait Transform {
    /// Return a filtered copy of the logits; the input is never modified.
    fn transform(&self, logits: &[f64]) -> Result<Vec<f64>>;
    /// Whether applying this transform to a vocabulary of `len` could change anything.
    fn is_active(&self, len: usize) -> bool;
}

pub trait Sampler {
    /// Select one token index from the distribution the logits describe.
    fn sample(&mut self, logits: &[f64]) -> Result<usize>;
}

/// A source of uniform numbers in `[0, 1)`.
pub trait RandomSource {
    fn uniform(&mut self) -> f64;
}

impl RandomSource for fastrand::Rng {
    fn uniform(&mut self) -> f64 {
        self.f64()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }
}

/// Replays a fixed list of values, starting over when exhausted.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<f64>,
    cursor: usize,
}

impl FixedSequence {
    /// # Panics
    /// When `values` is empty.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values.into();
        assert!(!values.is_empty(), "a fixed sequence needs at least one value");
        Self { values, cursor: 0 }
    }
}

impl RandomSource for FixedSequence {
    fn uniform(&mut self) -> f64 {
        let value = self.values[self.cursor];
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_sequence_cycles() {
        let mut source = FixedSequence::new([0.1, 0.2]);
        let drawn: Vec<_> = (0..5).map(|_| source.uniform()).collect();
        assert_eq!(drawn, vec![0.1, 0.2, 0.1, 0.2, 0.1]);
    }

    #[test]
    #[should_panic(expected = "at least one value")]
    fn fixed_sequence_needs_values() {
        FixedSequence::new(Vec::new());
    }

    #[test]
    fn seeded_rng_is_in_range() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..1000 {
            let r = rng.uniform();
            assert!((0.0..1.0).contains(&r));
        }
    }
}
