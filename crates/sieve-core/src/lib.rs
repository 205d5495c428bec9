//! Logit shaping for language-model decoding.
//!
//! Every operation is a pure function over a logit vector: temperature
//! scaling, Min-P, Top-K and Top-P filtering, softmax, categorical sampling
//! and greedy selection. [`pipeline`] chains them in any order and records
//! each intermediate step.

pub mod error;
pub mod pipeline;
pub mod sampler;
pub mod scenario;
pub mod softmax;

pub use error::{DomainError, Error, Result};
pub use pipeline::{run_pipeline, OrderOutcome, MAX_ORDER_STAGES, Outcome, Pipeline, Stage, StageLabel, StageRecord};
pub use sampler::{
    ban::{ban, Ban},
    categorical::{argmax, sample, Categorical, Greedy},
    min_p::{min_p, min_p_with_epsilon, MinP},
    temperature::{temperature_scale, temperature_sweep, SweepPoint, MIN_TEMPERATURE},
    top_k::{top_k, TopK},
    top_p::{top_p, top_p_with_epsilon, TopP},
    FixedSequence, RandomSource, Sampler, Transform, DEFAULT_EPSILON,
};
pub use scenario::Scenario;
pub use softmax::{is_fully_masked, kept, softmax};
