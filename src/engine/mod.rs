// engine module organization
// the population and its evolutionary iteration; each submodule is one policy family

pub mod crossover;
pub mod selection;
pub mod substitution;
pub mod swarm;

pub use crossover::{segment_crossover, Crossover};
pub use selection::Selection;
pub use substitution::Substitution;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;

use crate::analysis::ColorInit;
use crate::dna::{Genome, GenomeShape};
use crate::error::ConfigError;
use crate::individual::{Evaluator, Individual};
use crate::settings::RunSettings;

/// best / mean / worst fitness of the current generation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitnessStats {
    pub best: f64,
    pub average: f64,
    pub worst: f64,
}

/// how fresh genomes are built for a population
#[derive(Clone, Copy, Debug)]
pub struct GenomeInit {
    pub shape: GenomeShape,
    pub background: [u8; 3],
    pub colors: ColorInit,
    pub initial_alpha: u8,
}

pub struct Population {
    individuals: Vec<Individual>,
    // snapshot, never aliased with a live individual
    best_ever: Individual,
    iteration: u64,
}

impl Population {
    pub fn new(individuals: Vec<Individual>) -> Result<Self, ConfigError> {
        let best_ever = individuals
            .iter()
            .min_by(|a, b| a.fitness().total_cmp(&b.fitness()))
            .cloned()
            .ok_or_else(|| ConfigError::Invalid("population must not be empty".into()))?;
        Ok(Self {
            individuals,
            best_ever,
            iteration: 0,
        })
    }

    /// `size` random individuals; a `seed` genome (e.g. decoded DNA) takes the last slot
    pub fn random<R: Rng>(
        rng: &mut R,
        eval: &Evaluator,
        init: &GenomeInit,
        size: usize,
        seed: Option<Genome>,
    ) -> Result<Self, ConfigError> {
        profiling::scope!("Population::random");
        let fresh = if seed.is_some() { size.saturating_sub(1) } else { size };
        let mut genomes: Vec<Genome> = (0..fresh)
            .map(|_| {
                Genome::random(
                    rng,
                    init.shape,
                    init.background,
                    eval.fitness.target(),
                    init.colors,
                    init.initial_alpha,
                )
            })
            .collect();
        genomes.extend(seed);

        let individuals: Vec<Individual> = genomes.into_par_iter().map(|g| eval.express(g)).collect();
        Self::new(individuals)
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn best_ever(&self) -> &Individual {
        &self.best_ever
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn stats(&self) -> FitnessStats {
        let n = self.individuals.len().max(1) as f64;
        let mut best = f64::INFINITY;
        let mut worst = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for ind in &self.individuals {
            let f = ind.fitness();
            best = best.min(f);
            worst = worst.max(f);
            sum += f;
        }
        FitnessStats {
            best,
            average: sum / n,
            worst,
        }
    }

    /// snapshot the best current individual if it strictly beats best-ever
    fn update_best(&mut self) -> bool {
        let Some(best) = self
            .individuals
            .iter()
            .min_by(|a, b| a.fitness().total_cmp(&b.fitness()))
        else {
            return false;
        };
        if best.fitness() < self.best_ever.fitness() {
            self.best_ever = best.clone();
            true
        } else {
            false
        }
    }

    /// one evolutionary iteration: selection+crossover, mutation, substitution,
    /// best-ever update. returns true when best-ever improved.
    ///
    /// every random draw happens on this thread in a fixed order; only rendering
    /// and scoring run in parallel, so a seeded run is reproducible.
    pub fn iterate<R: Rng>(&mut self, rng: &mut R, eval: &Evaluator, settings: &RunSettings, hard: bool) -> bool {
        profiling::scope!("Population::iterate");
        let n = self.individuals.len();
        let fitness: Vec<f64> = self.individuals.iter().map(Individual::fitness).collect();

        // selection + crossover
        let children: Vec<Genome> = {
            profiling::scope!("crossover_phase");
            let pairs = settings.selection.select_pairs(rng, &fitness, settings.crossover_pairs());
            let mut out = Vec::with_capacity(pairs.len() * 2);
            for (a, b) in pairs {
                let (x, y) = settings.crossover.recombine(
                    rng,
                    self.individuals[a].genome(),
                    self.individuals[b].genome(),
                );
                out.push(x);
                out.push(y);
            }
            out
        };

        // mutation: children always need a render; parent copies only when mutated.
        // an unmutated parent moves into the pool, a mutated one is displaced by its copy
        let mut pending: Vec<Genome> = Vec::new();
        let mut pool: Vec<Individual> = Vec::with_capacity(children.len() + n);
        let mut displaced: Vec<Individual> = Vec::new();
        {
            profiling::scope!("mutation_phase");
            for child in children {
                pending.push(if rng.random_bool(settings.mutation_rate) {
                    child.mutant(rng, &settings.mutation, hard).genome
                } else {
                    child
                });
            }
            for parent in std::mem::take(&mut self.individuals) {
                if rng.random_bool(settings.mutation_rate) {
                    pending.push(parent.genome().mutant(rng, &settings.mutation, hard).genome);
                    displaced.push(parent);
                } else {
                    pool.push(parent);
                }
            }
        }
        {
            profiling::scope!("evaluate_pool");
            let evaluated: Vec<Individual> = pending.into_par_iter().map(|g| eval.express(g)).collect();
            pool.extend(evaluated);
        }

        // substitution
        self.individuals = settings
            .substitution
            .survivors(rng, displaced, pool, n, settings.tournament_size);

        self.iteration += 1;
        let improved = self.update_best();
        if log::log_enabled!(log::Level::Debug) {
            let s = self.stats();
            log::debug!(
                "iteration {}: best={:.1} avg={:.1} worst={:.1}",
                self.iteration, s.best, s.average, s.worst
            );
        }
        improved
    }
}

/// seeds for per-individual generators, drawn serially from the master generator
pub(crate) fn split_seeds<R: Rng>(rng: &mut R, n: usize) -> Vec<Pcg32> {
    (0..n).map(|_| Pcg32::seed_from_u64(rng.random::<u64>())).collect()
}
