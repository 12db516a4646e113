/// run settings for polyevo
/// every field has a default; a settings file only needs the fields it changes
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::analysis::ColorInit;
use crate::engine::{Crossover, Selection, Substitution};
use crate::error::ConfigError;
use crate::fitness::Metric;
use crate::mutation_config::{HardMutationPolicy, MutateConfig};

/// which loop drives the population
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// selection, crossover, mutation, substitution
    #[default]
    Genetic,
    /// independent hill-climbers, no recombination
    Swarm,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genetic" => Ok(Mode::Genetic),
            "swarm" => Ok(Mode::Swarm),
            other => Err(ConfigError::UnknownPolicy {
                family: "mode",
                name: other.to_string(),
            }),
        }
    }
}

/// halting conditions; the run stops on the first one met. unset = inactive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopConditions {
    pub max_cycles: Option<u64>,
    pub max_duration_secs: Option<f64>,
    /// stop once the best fitness is at or below this
    pub fitness_limit: Option<f64>,
    pub max_unimproved_cycles: Option<u64>,
}

impl StopConditions {
    pub fn is_unbounded(&self) -> bool {
        self.max_cycles.is_none()
            && self.max_duration_secs.is_none()
            && self.fitness_limit.is_none()
            && self.max_unimproved_cycles.is_none()
    }
}

/// where and how often results are written
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointSettings {
    pub output_dir: PathBuf,
    /// best raster every N cycles (0 = only at the end)
    pub save_best_every: u64,
    /// population mosaic every N cycles (0 = only at the end)
    pub save_all_every: u64,
    pub save_dna: bool,
    /// DNA is only written when the best fitness is below this
    pub dna_min_fitness: Option<f64>,
    /// scale of the final best render
    pub export_scale: f32,
    pub export_svg: bool,
    pub best_prefix: String,
    pub all_prefix: String,
    pub dna_prefix: String,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
            save_best_every: 0,
            save_all_every: 0,
            save_dna: true,
            dna_min_fitness: None,
            export_scale: 1.0,
            export_svg: false,
            best_prefix: "best_".into(),
            all_prefix: "all_".into(),
            dna_prefix: "dna_".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    // genome layout
    pub polygon_count: usize,
    pub vertices_count: usize,

    // population
    pub population_size: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub selection: Selection,
    pub crossover: Crossover,
    pub substitution: Substitution,
    pub tournament_size: usize,
    pub mode: Mode,
    /// swarm only: one segment crossover per cycle, replacing the worst if better
    pub swarm_prophase: bool,

    // fitness / rendering
    pub metric: Metric,
    /// compare parent and child on the mutated region only
    pub use_partial_fitness: bool,
    pub antialias: bool,

    // initial genomes
    pub initial_colors: ColorInit,
    pub initial_alpha: u8,
    /// canvas colour; None = average colour of the target
    pub background: Option<[u8; 3]>,

    // mutation
    pub mutation: MutateConfig,
    pub hard_mutation: HardMutationPolicy,

    // run control
    pub seed: u64,
    /// longest side of the working raster; larger targets are downsampled
    pub max_internal_size: u32,
    /// progress log every N cycles (0 = off)
    pub log_every: u64,
    pub stop: StopConditions,
    pub checkpoint: CheckpointSettings,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            polygon_count: 64,
            vertices_count: 3,
            population_size: 8,
            mutation_rate: 1.0,
            crossover_rate: 0.63,
            selection: Selection::StochasticAcceptance,
            crossover: Crossover::Uniform,
            substitution: Substitution::PlusSelection,
            tournament_size: 3,
            mode: Mode::Genetic,
            swarm_prophase: false,
            metric: Metric::Ssd,
            use_partial_fitness: true,
            antialias: false,
            initial_colors: ColorInit::VertexMid,
            initial_alpha: 100,
            background: None,
            mutation: MutateConfig::default(),
            hard_mutation: HardMutationPolicy::Always,
            seed: 0,
            max_internal_size: 512,
            log_every: 1000,
            stop: StopConditions::default(),
            checkpoint: CheckpointSettings::default(),
        }
    }
}

impl RunSettings {
    /// reject out-of-range values. called before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=255).contains(&self.polygon_count) {
            return Err(ConfigError::out_of_range("polygon_count", self.polygon_count, "1..=255"));
        }
        if !(3..=255).contains(&self.vertices_count) {
            return Err(ConfigError::out_of_range("vertices_count", self.vertices_count, "3..=255"));
        }
        if self.population_size == 0 {
            return Err(ConfigError::out_of_range("population_size", 0, ">= 1"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::out_of_range("mutation_rate", self.mutation_rate, "0..=1"));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(ConfigError::out_of_range("crossover_rate", self.crossover_rate, "0..=1"));
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::out_of_range("tournament_size", 0, ">= 1"));
        }
        if self.max_internal_size == 0 {
            return Err(ConfigError::out_of_range("max_internal_size", 0, ">= 1"));
        }
        if let HardMutationPolicy::Adaptive { random_prob, .. } = self.hard_mutation {
            if !(0.0..=1.0).contains(&random_prob) {
                return Err(ConfigError::out_of_range("hard_mutation.random_prob", random_prob, "0..=1"));
            }
        }
        let scale = self.checkpoint.export_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ConfigError::out_of_range("checkpoint.export_scale", scale, "> 0"));
        }
        self.mutation.validate()
    }

    /// number of crossover pairs per iteration
    pub fn crossover_pairs(&self) -> usize {
        (self.crossover_rate * self.population_size as f64).round() as usize
    }

    /// save settings to a pretty JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load settings from a JSON file. missing fields take their defaults;
    /// unknown policy names fail here.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        Ok(settings)
    }
}
