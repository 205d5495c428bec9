use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use sieve_core::{temperature_sweep, Stage};

use crate::config::{load_config, Config};

mod config;
mod report;

const DEFAULT_CONFIG: &str = "assets/configs/Config.toml";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Scenario and pipeline settings; falls back to `assets/configs/Config.toml`.
    #[arg(long, short, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Seed the sampler for reproducible draws.
    #[arg(long, short, global = true)]
    seed: Option<u64>,
    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    /// Log every pipeline step.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run temperature and the configured filters, then sample.
    Run {
        #[arg(long, short, allow_negative_numbers = true)]
        temperature: Option<f64>,
        /// Comma separated stages, e.g. `minp=0.1,topk=3,topp=0.9,ban=4`.
        #[arg(long, value_delimiter = ',')]
        stages: Option<Vec<Stage>>,
    },
    /// Apply a single filter after temperature scaling.
    Filter {
        stage: Stage,
        #[arg(long, short, allow_negative_numbers = true)]
        temperature: Option<f64>,
    },
    /// Show how temperature reshapes the distribution.
    Sweep {
        #[arg(long)]
        from: Option<f64>,
        #[arg(long)]
        to: Option<f64>,
        #[arg(long)]
        step: Option<f64>,
    },
    /// Run every ordering of the configured filters.
    Orders {
        #[arg(long, value_delimiter = ',')]
        stages: Option<Vec<Stage>>,
    },
}

fn config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => load_config(DEFAULT_CONFIG)?,
        None => Config::default(),
    };
    config.seed = args.seed.or(config.seed);
    Ok(config)
}

fn rng(seed: Option<u64>) -> fastrand::Rng {
    match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    }
}

fn run(args: Args) -> Result<String> {
    let Config {
        scenario,
        mut pipeline,
        sweep,
        seed,
    } = config(&args)?;
    let mut rng = rng(seed);

    match args.command {
        Command::Run {
            temperature,
            stages,
        } => {
            pipeline.temperature = temperature.unwrap_or(pipeline.temperature);
            pipeline.stages = stages.unwrap_or(pipeline.stages);
            let outcome = pipeline.run(&scenario.logits, &mut rng)?;
            match args.json {
                true => report::render_json(&scenario, &outcome),
                false => Ok(report::render_outcome(&scenario, &outcome)),
            }
        }
        Command::Filter { stage, temperature } => {
            pipeline.temperature = temperature.unwrap_or(pipeline.temperature);
            pipeline.stages = vec![stage];
            let outcome = pipeline.run(&scenario.logits, &mut rng)?;
            match args.json {
                true => report::render_json(&scenario, &outcome),
                false => Ok(report::render_outcome(&scenario, &outcome)),
            }
        }
        Command::Sweep { from, to, step } => {
            let points = temperature_sweep(
                &scenario.logits,
                from.unwrap_or(sweep.from),
                to.unwrap_or(sweep.to),
                step.unwrap_or(sweep.step),
            )?;
            match args.json {
                true => report::render_json(&scenario, &points),
                false => Ok(report::render_sweep(&scenario, &points)),
            }
        }
        Command::Orders { stages } => {
            pipeline.stages = stages.unwrap_or(pipeline.stages);
            let orders = pipeline.explore_orders(&scenario.logits, &mut rng)?;
            match args.json {
                true => report::render_json(&scenario, &orders),
                false => Ok(report::render_orders(&scenario, &orders)),
            }
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        true => log::LevelFilter::Debug,
        false => log::LevelFilter::Info,
    };
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .with_module_level("sieve", level)
        .with_module_level("sieve_core", level)
        .init()
        .expect("start logger");

    let cmd = Args::command();
    let version = cmd.get_version().unwrap_or("0.0.1");
    let bin_name = cmd.get_bin_name().unwrap_or("sieve");
    log::debug!("{}\tversion: {}", bin_name, version);

    match run(args) {
        Ok(output) => print!("{output}"),
        Err(err) => {
            log::error!("{err:#}");
            std::process::exit(1);
        }
    }
}
