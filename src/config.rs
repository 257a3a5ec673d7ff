use crate::error::{CfResult, ChordError};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Run-time tuning shared by every subcommand.
#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub beam: BeamParams,
    #[command(flatten)]
    pub colony: ColonyParams,
    #[command(flatten)]
    pub eval: EvalParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamParams {
    #[arg(long, default_value_t = 1000)]
    pub beam_width: usize,
    #[arg(long, default_value_t = 5000)]
    pub max_iterations: usize,
}

impl Default for BeamParams {
    fn default() -> Self {
        Self {
            beam_width: 1000,
            max_iterations: 5000,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyParams {
    #[arg(long, default_value_t = 100_000)]
    pub generations: usize,
    #[arg(long, default_value_t = 240)]
    pub population: usize,

    // === PHEROMONE ===
    #[arg(long, default_value_t = 1.0)]
    pub initial_pheromone: f64,
    #[arg(long, default_value_t = 0.01)]
    pub evaporation_rate: f64,
    #[arg(long, default_value_t = 0.01)]
    pub pheromone_boost: f64,
    #[arg(long, default_value_t = 0.0001)]
    pub pheromone_floor: f64,

    /// Hand out chords left over after construction as extra aliases.
    #[arg(long, default_value_t = false)]
    pub assign_aliases: bool,
}

impl Default for ColonyParams {
    fn default() -> Self {
        Self {
            generations: 100_000,
            population: 240,
            initial_pheromone: 1.0,
            evaporation_rate: 0.01,
            pheromone_boost: 0.01,
            pheromone_floor: 0.0001,
            assign_aliases: false,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EvalParams {
    /// Evaluation threads; 0 uses every available core.
    #[arg(long, default_value_t = 0)]
    pub workers: usize,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CfResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CfResult<()> {
        if self.beam.beam_width == 0 {
            return Err(ChordError::Config("beam_width must be at least 1".into()));
        }
        if self.colony.population == 0 {
            return Err(ChordError::Config("population must be at least 1".into()));
        }
        let c = &self.colony;
        if !(0.0..1.0).contains(&c.evaporation_rate) {
            return Err(ChordError::Config(format!(
                "evaporation_rate must be in [0, 1), got {}",
                c.evaporation_rate
            )));
        }
        if !(c.pheromone_floor > 0.0) {
            return Err(ChordError::Config(
                "pheromone_floor must be positive".into(),
            ));
        }
        if !(c.initial_pheromone >= c.pheromone_floor) {
            return Err(ChordError::Config(
                "initial_pheromone must not be below pheromone_floor".into(),
            ));
        }
        if !(c.pheromone_boost >= 0.0) {
            return Err(ChordError::Config(
                "pheromone_boost must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Copies every value the user typed on the command line over `self`,
    /// leaving file-loaded values alone where the CLI only has a default.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(beam.beam_width);
        update_if_present!(beam.max_iterations);

        update_if_present!(colony.generations);
        update_if_present!(colony.population);
        update_if_present!(colony.initial_pheromone);
        update_if_present!(colony.evaporation_rate);
        update_if_present!(colony.pheromone_boost);
        update_if_present!(colony.pheromone_floor);
        update_if_present!(colony.assign_aliases);

        update_if_present!(eval.workers);
    }
}
