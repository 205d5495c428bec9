use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::error::{check_logits, DomainError, Result};

/// A prompt with its candidate continuations and their logits.
#[derive(Debug, Clone, PartialEq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct Scenario {
    /// Text the tokens would continue.
    #[derivative(Default(value = "\"The rocket lifted off towards the\".into()"))]
    pub context: String,
    /// One label per logit, in the same order.
    #[derivative(Default(
        value = "[\"moon\", \"stars\", \"sky\", \"station\", \"launchpad\"].map(String::from).to_vec()"
    ))]
    pub tokens: Vec<String>,
    #[derivative(Default(value = "vec![3.5, 3.1, 2.9, 2.0, -0.5]"))]
    pub logits: Vec<f64>,
}

impl Scenario {
    pub fn validate(&self) -> Result<()> {
        check_logits(&self.logits)?;
        if self.tokens.len() != self.logits.len() {
            return Err(DomainError::LengthMismatch {
                tokens: self.tokens.len(),
                logits: self.logits.len(),
            }
            .into());
        }
        Ok(())
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// The context continued with the chosen token.
    pub fn complete(&self, index: usize) -> String {
        match self.token(index) {
            Some(token) => format!("{} {token}...", self.context),
            None => format!("{} ...", self.context),
        }
    }
}
