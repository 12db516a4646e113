use rand::Rng;

use crate::dna::Genome;
use crate::fitness::{FitnessEvaluator, Metric};
use crate::mutation_config::MutateConfig;
use crate::render::{CpuRenderer, Raster};

/// renderer and fitness function, shared read-only by every individual of a run
#[derive(Clone, Debug)]
pub struct Evaluator {
    pub renderer: CpuRenderer,
    pub fitness: FitnessEvaluator,
}

impl Evaluator {
    pub fn new(target: Raster, metric: Metric, antialias: bool) -> Self {
        Self {
            renderer: CpuRenderer::new(antialias),
            fitness: FitnessEvaluator::new(target, metric),
        }
    }

    /// render and score a genome in full
    pub fn express(&self, genome: Genome) -> Individual {
        profiling::scope!("Evaluator::express");
        let raster = self.renderer.render(&genome);
        let fitness = self.fitness.full(&raster);
        Individual { genome, raster, fitness }
    }
}

/// a genome with its rendered raster and full-frame fitness.
/// the three are only ever replaced together.
#[derive(Clone, Debug)]
pub struct Individual {
    genome: Genome,
    raster: Raster,
    fitness: f64,
}

impl Individual {
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// one hill-climbing step: mutate a copy, render, score, and keep it only
    /// if it is strictly better. with `use_partial` the parent/child comparison
    /// is restricted to the mutated polygon's region; the stored fitness is
    /// always full-frame. returns true when the mutation was accepted.
    pub fn cycle<R: Rng>(
        &mut self,
        rng: &mut R,
        eval: &Evaluator,
        cfg: &MutateConfig,
        hard: bool,
        use_partial: bool,
    ) -> bool {
        profiling::scope!("Individual::cycle");
        let mutation = self.genome.mutant(rng, cfg, hard);
        let raster = eval.renderer.render(&mutation.genome);

        let fitness = if use_partial && eval.fitness.metric().is_additive() {
            // nothing outside this box can differ between parent and child
            let Some(rect) = mutation.bounds(eval.renderer.bbox_pad()) else {
                return false;
            };
            let child = eval.fitness.partial_rect(&raster, rect);
            let parent = eval.fitness.partial_rect(&self.raster, rect);
            if child >= parent {
                return false;
            }
            eval.fitness.full(&raster)
        } else {
            eval.fitness.full(&raster)
        };

        if fitness < self.fitness {
            log::trace!("accepted {:?} on slot {} ({} -> {})", mutation.kind, mutation.index, self.fitness, fitness);
            self.genome = mutation.genome;
            self.raster = raster;
            self.fitness = fitness;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ColorInit;
    use crate::dna::GenomeShape;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup(metric: Metric) -> (Evaluator, Individual, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(17);
        let mut target = Raster::solid(24, 18, [230, 230, 230]);
        for y in 4..14 {
            for x in 6..20 {
                let i = ((y * 24 + x) * 4) as usize;
                target.data[i..i + 3].copy_from_slice(&[20, 60, 180]);
            }
        }
        let eval = Evaluator::new(target.clone(), metric, false);
        let shape = GenomeShape {
            width: 24,
            height: 18,
            polygon_count: 6,
            vertices_count: 3,
        };
        let genome = Genome::random(&mut rng, shape, [128, 128, 128], &target, ColorInit::Random, 100);
        let ind = eval.express(genome);
        (eval, ind, rng)
    }

    #[test]
    fn fitness_never_increases() {
        for partial in [true, false] {
            let (eval, mut ind, mut rng) = setup(Metric::Ssd);
            let cfg = MutateConfig::default();
            let mut last = ind.fitness();
            for _ in 0..300 {
                ind.cycle(&mut rng, &eval, &cfg, false, partial);
                assert!(ind.fitness() <= last);
                last = ind.fitness();
            }
        }
    }

    #[test]
    fn cached_state_matches_genome() {
        let (eval, mut ind, mut rng) = setup(Metric::ColorDist);
        let cfg = MutateConfig::default();
        let mut accepted = 0;
        for _ in 0..200 {
            if ind.cycle(&mut rng, &eval, &cfg, true, true) {
                accepted += 1;
            }
        }
        assert!(accepted > 0);
        let fresh = eval.express(ind.genome().clone());
        assert_eq!(fresh.raster(), ind.raster());
        assert_eq!(fresh.fitness(), ind.fitness());
    }

    #[test]
    fn ssim_climbs_on_full_frame() {
        let (eval, mut ind, mut rng) = setup(Metric::Ssim);
        let start = ind.fitness();
        let cfg = MutateConfig::default();
        for _ in 0..200 {
            ind.cycle(&mut rng, &eval, &cfg, true, true);
        }
        assert!(ind.fitness() <= start);
    }
}
