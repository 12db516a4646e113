//! polyevo: evolve a set of semi-transparent polygons until their rendering
//! approximates a target image.
//!
//! a [`Genome`] is painted by the [`CpuRenderer`] and scored by a
//! [`FitnessEvaluator`]; a [`Population`] evolves genomes either as a genetic
//! algorithm or as a swarm of hill-climbers, and the [`Runner`] drives it with
//! stopping conditions, checkpoints and a final export.

pub mod analysis;
pub mod dna;
pub mod engine;
pub mod error;
pub mod export;
pub mod fitness;
pub mod geom;
pub mod individual;
pub mod mutate;
pub mod mutation_config;
pub mod render;
pub mod runner;
pub mod settings;

pub use dna::{DnaShape, Genome, GenomeShape, Polygon};
pub use engine::{Crossover, Population, Selection, Substitution};
pub use error::{ConfigError, DnaError, Error, ExportError, Result};
pub use fitness::{FitnessEvaluator, Metric};
pub use individual::{Evaluator, Individual};
pub use mutation_config::{HardMutationPolicy, MutateConfig, MutationKind};
pub use render::{CpuRenderer, Raster};
pub use runner::{Runner, RunSummary, StopReason};
pub use settings::{Mode, RunSettings};
