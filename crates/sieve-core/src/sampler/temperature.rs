use serde::Serialize;

use crate::{
    error::{Error, Result},
    softmax::softmax,
};

/// Temperatures below this are clamped before dividing.
pub const MIN_TEMPERATURE: f64 = 1e-5;

/// Divide every logit by the temperature, clamped to [`MIN_TEMPERATURE`].
///
/// A zero or negative temperature is not an error: it behaves like the floor,
/// giving very sharp but finite logits (effectively greedy). Finite logits stay
/// finite, saturating at `f64::MAX` in magnitude, and `-inf` stays `-inf`.
pub fn temperature_scale(logits: &[f64], temperature: f64) -> Vec<f64> {
    let t = temperature.max(MIN_TEMPERATURE);
    logits
        .iter()
        .map(|&x| match x == f64::NEG_INFINITY {
            true => x,
            false => (x / t).clamp(f64::MIN, f64::MAX),
        })
        .collect()
}

/// One point of a temperature sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub temperature: f64,
    pub probs: Vec<f64>,
}

/// Softmax of the scaled logits for `from, from + step, ...` up to `to`.
pub fn temperature_sweep(logits: &[f64], from: f64, to: f64, step: f64) -> Result<Vec<SweepPoint>> {
    if !from.is_finite() {
        return Err(Error::invalid("from", from, "a finite temperature"));
    }
    if !to.is_finite() || to < from {
        return Err(Error::invalid("to", to, "a finite temperature not below `from`"));
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(Error::invalid("step", step, "a positive step"));
    }

    // counting steps avoids accumulating `from += step` drift
    let count = ((to - from) / step + 1e-9).floor() as usize + 1;
    (0..count)
        .map(|i| from + i as f64 * step)
        .map(|temperature| -> Result<SweepPoint> {
            let probs = softmax(&temperature_scale(logits, temperature))?;
            Ok(SweepPoint { temperature, probs })
        })
        .collect()
}
