// swarm variant: every individual hill-climbs on its own, no recombination,
// with an optional single segment crossover ("prophase") per cycle.

use rand::Rng;
use rayon::prelude::*;

use super::{segment_crossover, split_seeds, Population};
use crate::individual::{Evaluator, Individual};
use crate::settings::RunSettings;

impl Population {
    /// one hill-climbing cycle for every individual, in parallel.
    /// each individual gets its own generator seeded from `rng`, so the outcome
    /// does not depend on scheduling. returns true when best-ever improved.
    pub fn swarm_cycle<R: Rng>(&mut self, rng: &mut R, eval: &Evaluator, settings: &RunSettings, hard: bool) -> bool {
        profiling::scope!("Population::swarm_cycle");
        let mut rngs = split_seeds(rng, self.individuals.len());
        let accepted: usize = self
            .individuals
            .par_iter_mut()
            .zip(rngs.par_iter_mut())
            .map(|(ind, r)| {
                ind.cycle(r, eval, &settings.mutation, hard, settings.use_partial_fitness) as usize
            })
            .sum();

        if settings.swarm_prophase {
            self.prophase(rng, eval);
        }

        self.iteration += 1;
        let improved = self.update_best();
        log::trace!("swarm cycle {}: {accepted} accepted", self.iteration);
        improved
    }

    /// cross a random mother with a distinct random father; the child replaces
    /// the worst individual if it is strictly better. returns true on replacement.
    pub fn prophase<R: Rng>(&mut self, rng: &mut R, eval: &Evaluator) -> bool {
        profiling::scope!("Population::prophase");
        let n = self.individuals.len();
        if n < 2 {
            return false;
        }
        let mother = rng.random_range(0..n);
        let mut father = rng.random_range(0..n - 1);
        if father >= mother {
            father += 1;
        }

        let child = segment_crossover(
            rng,
            self.individuals[mother].genome(),
            self.individuals[father].genome(),
        );
        let child: Individual = eval.express(child);

        let worst = (0..n)
            .max_by(|&a, &b| self.individuals[a].fitness().total_cmp(&self.individuals[b].fitness()))
            .unwrap_or(0);
        if child.fitness() < self.individuals[worst].fitness() {
            self.individuals[worst] = child;
            true
        } else {
            false
        }
    }
}
