//! Temperature scaling followed by a caller-ordered chain of filters.
//!
//! The pipeline is a strict left-to-right reduction: temperature always runs
//! first, then every active stage in the order given. Each applied step is
//! recorded so callers can inspect or chart the whole transformation.
//!
//! # Fully-masked fallback
//! When the chain leaves every token at `-inf` (only possible with [`Stage::Ban`]),
//! the sample and the greedy choice are taken from the temperature-scaled
//! logits instead, and [`Outcome::fallback`] is set. Stages that follow a
//! fully-masked step are recorded as unchanged copies.

use std::{fmt, str::FromStr};

use derivative::Derivative;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::{check_logits, DomainError, Error, Result},
    sampler::{
        ban::Ban,
        categorical::{argmax, sample},
        min_p::MinP,
        temperature::temperature_scale,
        top_k::TopK,
        top_p::TopP,
        FixedSequence, RandomSource, Transform,
    },
    softmax::{is_fully_masked, kept, softmax},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "param", rename_all = "snake_case")]
pub enum Stage {
    MinP(f64),
    TopK(usize),
    TopP(f64),
    Ban(Vec<usize>),
}

impl Stage {
    pub fn label(&self) -> StageLabel {
        match self {
            Stage::MinP(_) => StageLabel::MinP,
            Stage::TopK(_) => StageLabel::TopK,
            Stage::TopP(_) => StageLabel::TopP,
            Stage::Ban(_) => StageLabel::Ban,
        }
    }

    /// Reject parameters that cannot even be classified as on or off.
    pub fn validate(&self, len: usize) -> Result<()> {
        match self {
            Stage::MinP(x) if x.is_nan() => Err(Error::invalid("min_p", x, "a number")),
            Stage::TopP(x) if x.is_nan() => Err(Error::invalid("p", x, "a number")),
            Stage::Ban(tokens) => match tokens.iter().find(|&&index| index >= len) {
                Some(&index) => Err(DomainError::TokenOutOfRange { index, len }.into()),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

impl Transform for Stage {
    fn transform(&self, logits: &[f64]) -> Result<Vec<f64>> {
        match self {
            Stage::MinP(x) => MinP::new(*x).transform(logits),
            Stage::TopK(k) => TopK::new(*k).transform(logits),
            Stage::TopP(p) => TopP::new(*p).transform(logits),
            Stage::Ban(tokens) => Ban(tokens.clone()).transform(logits),
        }
    }

    fn is_active(&self, len: usize) -> bool {
        match self {
            Stage::MinP(x) => MinP::new(*x).is_active(len),
            Stage::TopK(k) => TopK::new(*k).is_active(len),
            Stage::TopP(p) => TopP::new(*p).is_active(len),
            Stage::Ban(tokens) => !tokens.is_empty(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::MinP(x) => write!(f, "min_p={x}"),
            Stage::TopK(k) => write!(f, "top_k={k}"),
            Stage::TopP(p) => write!(f, "top_p={p}"),
            Stage::Ban(tokens) => write!(f, "ban={}", tokens.iter().join(":")),
        }
    }
}

/// Parses `min_p=0.1`, `top_k=3`, `top_p=0.9` or `ban=0:4`.
/// The short forms `minp`, `topk` and `topp` are accepted too.
impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, param) = s
            .split_once('=')
            .ok_or_else(|| Error::invalid("stage", s, "`kind=param`"))?;
        let param = param.trim();
        let number = |name| {
            param
                .parse::<f64>()
                .map_err(|_| Error::invalid(name, param, "a number"))
        };
        match kind.trim().to_ascii_lowercase().as_str() {
            "min_p" | "minp" => Ok(Stage::MinP(number("min_p")?)),
            "top_p" | "topp" => Ok(Stage::TopP(number("p")?)),
            "top_k" | "topk" => param
                .parse()
                .map(Stage::TopK)
                .map_err(|_| Error::invalid("k", param, "a non-negative integer")),
            "ban" => param
                .split(':')
                .filter(|x| !x.is_empty())
                .map(|x| {
                    x.trim()
                        .parse::<usize>()
                        .map_err(|_| Error::invalid("ban", x, "token indices separated by `:`"))
                })
                .collect::<Result<Vec<_>>>()
                .map(Stage::Ban),
            _ => Err(Error::invalid("stage", kind, "one of min_p, top_k, top_p, ban")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageLabel {
    Original,
    Temperature,
    MinP,
    TopK,
    TopP,
    Ban,
}

impl fmt::Display for StageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageLabel::Original => "original",
            StageLabel::Temperature => "temperature",
            StageLabel::MinP => "min_p",
            StageLabel::TopK => "top_k",
            StageLabel::TopP => "top_p",
            StageLabel::Ban => "ban",
        };
        f.write_str(name)
    }
}

/// The logits after one step, with their probabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub label: StageLabel,
    pub logits: Vec<f64>,
    /// `None` when every logit is `-inf`.
    pub probs: Option<Vec<f64>>,
}

impl StageRecord {
    fn new(label: StageLabel, logits: Vec<f64>) -> Self {
        let probs = softmax(&logits).ok();
        Self {
            label,
            logits,
            probs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// `original`, `temperature`, then one record per applied stage.
    pub history: Vec<StageRecord>,
    pub sampled: usize,
    pub greedy: usize,
    /// The final stage was fully masked and the temperature stage was sampled instead.
    pub fallback: bool,
}

impl Outcome {
    /// The logits the sampled and greedy tokens were drawn from.
    pub fn final_logits(&self) -> &[f64] {
        let index = match self.fallback {
            true => 1,
            false => self.history.len() - 1,
        };
        &self.history[index].logits
    }

    /// Tokens that remain candidates after the last stage.
    pub fn kept(&self) -> Vec<usize> {
        kept(self.final_logits())
    }
}

/// Scale by `temperature`, apply `stages` in order, then sample and pick greedily.
pub fn run_pipeline(
    logits: &[f64],
    temperature: f64,
    stages: &[Stage],
    mut source: impl RandomSource,
) -> Result<Outcome> {
    check_logits(logits)?;
    if temperature.is_nan() {
        return Err(Error::invalid("temperature", temperature, "a number"));
    }
    let len = logits.len();
    for stage in stages {
        stage.validate(len)?;
    }

    let scaled = temperature_scale(logits, temperature);
    let mut history = vec![
        StageRecord::new(StageLabel::Original, logits.to_vec()),
        StageRecord::new(StageLabel::Temperature, scaled.clone()),
    ];

    let mut current = scaled.clone();
    for stage in stages {
        if !stage.is_active(len) {
            log::debug!("[pipeline][skip] {stage}");
            continue;
        }
        if is_fully_masked(&current) {
            log::debug!("[pipeline][masked] {stage}");
        } else {
            current = stage.transform(&current)?;
            log::debug!("[pipeline][apply] {stage} kept {:?}", kept(&current));
        }
        history.push(StageRecord::new(stage.label(), current.clone()));
    }

    let fallback = is_fully_masked(&current);
    let target = match fallback {
        true => {
            log::warn!("[pipeline][fallback] every token masked, sampling the temperature stage");
            &scaled
        }
        false => &current,
    };
    let sampled = sample(target, source.uniform())?;
    let greedy = argmax(target)?;

    Ok(Outcome {
        history,
        sampled,
        greedy,
        fallback,
    })
}

/// Largest stage list [`Pipeline::explore_orders`] will permute (720 orderings).
pub const MAX_ORDER_STAGES: usize = 6;

#[derive(Debug, Clone, PartialEq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct Pipeline {
    #[derivative(Default(value = "1.0"))]
    pub temperature: f64,
    #[derivative(Default(
        value = "vec![Stage::MinP(0.1), Stage::TopK(3), Stage::TopP(0.9)]"
    ))]
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn run(&self, logits: &[f64], source: impl RandomSource) -> Result<Outcome> {
        run_pipeline(logits, self.temperature, &self.stages, source)
    }

    /// Run every ordering of the stages against the same random draw.
    ///
    /// This runs the pipeline `n!` times, so at most [`MAX_ORDER_STAGES`]
    /// stages are accepted.
    pub fn explore_orders(
        &self,
        logits: &[f64],
        mut source: impl RandomSource,
    ) -> Result<Vec<OrderOutcome>> {
        let count = self.stages.len();
        if count > MAX_ORDER_STAGES {
            return Err(Error::invalid(
                "stages",
                count,
                "at most 6 stages to permute",
            ));
        }
        let r = source.uniform();
        self.stages
            .iter()
            .cloned()
            .permutations(count)
            .map(|stages| -> Result<OrderOutcome> {
                let outcome =
                    run_pipeline(logits, self.temperature, &stages, FixedSequence::new([r]))?;
                Ok(OrderOutcome {
                    kept: outcome.kept(),
                    sampled: outcome.sampled,
                    greedy: outcome.greedy,
                    fallback: outcome.fallback,
                    stages,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderOutcome {
    pub stages: Vec<Stage>,
    pub kept: Vec<usize>,
    pub sampled: usize,
    pub greedy: usize,
    pub fallback: bool,
}
