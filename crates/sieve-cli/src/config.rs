use std::path::Path;

use anyhow::{Context, Result};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use sieve_core::{Pipeline, Scenario};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scenario: Scenario,
    pub pipeline: Pipeline,
    pub sweep: SweepOption,
    /// Seed for the sampler; unseeded runs draw from entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Derivative, Clone, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct SweepOption {
    /// Lowest temperature of the sweep.
    #[derivative(Default(value = "0.1"))]
    pub from: f64,
    /// Highest temperature of the sweep.
    #[derivative(Default(value = "3.0"))]
    pub to: f64,
    #[derivative(Default(value = "0.1"))]
    pub step: f64,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config.scenario.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use sieve_core::Stage;

    use super::*;

    #[test]
    fn empty_config_is_the_rocket_demo() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scenario, Scenario::default());
        assert_eq!(config.pipeline, Pipeline::default());
        assert_eq!(config.seed, None);
        assert_eq!(config.sweep.to, 3.0);
    }

    #[test]
    fn parses_stages_in_order() {
        let config: Config = toml::from_str(
            r#"
            seed = 7

            [pipeline]
            temperature = 0.8
            stages = [
                { kind = "top_p", param = 0.9 },
                { kind = "top_k", param = 3 },
                { kind = "min_p", param = 0.1 },
                { kind = "ban", param = [4] },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.pipeline.temperature, 0.8);
        assert_eq!(
            config.pipeline.stages,
            vec![
                Stage::TopP(0.9),
                Stage::TopK(3),
                Stage::MinP(0.1),
                Stage::Ban(vec![4])
            ]
        );
    }

    #[test]
    fn loads_and_validates_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[scenario]\ncontext = \"I like\"\ntokens = [\"tea\", \"coffee\"]\nlogits = [1.0, 2.0]"
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.scenario.complete(1), "I like coffee...");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scenario]\ntokens = [\"tea\"]").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = load_config("does/not/exist.toml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.toml"));
    }
}
