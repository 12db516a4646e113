use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::dna::Genome;
use crate::error::ConfigError;

/// how two parents recombine into two children.
/// slots are exchanged whole (vertices and colour together).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    /// swap the first half of the slots
    SinglePoint,
    /// swap a prefix of random length
    SinglePointStochastic,
    /// swap each slot with probability 0.5
    #[default]
    Uniform,
}

impl FromStr for Crossover {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_point" => Ok(Crossover::SinglePoint),
            "single_point_stochastic" => Ok(Crossover::SinglePointStochastic),
            "uniform" => Ok(Crossover::Uniform),
            other => Err(ConfigError::UnknownPolicy {
                family: "crossover",
                name: other.to_string(),
            }),
        }
    }
}

impl Crossover {
    /// recombine two genomes of the same shape. copies are cheap (pointer swaps).
    pub fn recombine<R: Rng>(self, rng: &mut R, a: &Genome, b: &Genome) -> (Genome, Genome) {
        profiling::scope!("Crossover::recombine");
        debug_assert_eq!(a.polys.len(), b.polys.len());
        let mut x = a.clone();
        let mut y = b.clone();
        let n = x.polys.len().min(y.polys.len());

        match self {
            Crossover::SinglePoint => swap_prefix(&mut x, &mut y, n / 2),
            Crossover::SinglePointStochastic => {
                let k = if n < 2 { n } else { rng.random_range(1..n) };
                swap_prefix(&mut x, &mut y, k);
            }
            Crossover::Uniform => {
                for i in 0..n {
                    if rng.random_bool(0.5) {
                        std::mem::swap(&mut x.polys[i], &mut y.polys[i]);
                    }
                }
            }
        }
        (x, y)
    }
}

fn swap_prefix(x: &mut Genome, y: &mut Genome, k: usize) {
    for i in 0..k {
        std::mem::swap(&mut x.polys[i], &mut y.polys[i]);
    }
}

/// copy a middle segment of `father` into a copy of `mother`.
/// the segment starts in [n/4, n/2) and ends (inclusive) in [start, 3n/4).
pub fn segment_crossover<R: Rng>(rng: &mut R, mother: &Genome, father: &Genome) -> Genome {
    profiling::scope!("segment_crossover");
    let mut child = mother.clone();
    let n = child.polys.len().min(father.polys.len());
    if n == 0 {
        return child;
    }

    let start = if n / 4 < n / 2 { rng.random_range(n / 4..n / 2) } else { n / 4 };
    let end = if start < 3 * n / 4 { rng.random_range(start..3 * n / 4) } else { start };
    let end = end.min(n - 1);
    for i in start.min(n - 1)..=end {
        child.polys[i] = father.polys[i].clone();
    }
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ColorInit;
    use crate::dna::GenomeShape;
    use crate::render::Raster;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::sync::Arc;

    fn parents(rng: &mut Pcg32, n: usize) -> (Genome, Genome) {
        let shape = GenomeShape {
            width: 16,
            height: 16,
            polygon_count: n,
            vertices_count: 3,
        };
        let target = Raster::solid(16, 16, [0, 0, 0]);
        (
            Genome::random(rng, shape, [0, 0, 0], &target, ColorInit::Random, 100),
            Genome::random(rng, shape, [0, 0, 0], &target, ColorInit::Random, 100),
        )
    }

    #[test]
    fn single_point_swaps_first_half() {
        let mut rng = Pcg32::seed_from_u64(1);
        let (a, b) = parents(&mut rng, 6);
        let (x, y) = Crossover::SinglePoint.recombine(&mut rng, &a, &b);
        for i in 0..3 {
            assert!(Arc::ptr_eq(&x.polys[i], &b.polys[i]));
            assert!(Arc::ptr_eq(&y.polys[i], &a.polys[i]));
        }
        for i in 3..6 {
            assert!(Arc::ptr_eq(&x.polys[i], &a.polys[i]));
            assert!(Arc::ptr_eq(&y.polys[i], &b.polys[i]));
        }
    }

    #[test]
    fn children_are_complementary() {
        let mut rng = Pcg32::seed_from_u64(2);
        let (a, b) = parents(&mut rng, 9);
        for policy in [Crossover::SinglePoint, Crossover::SinglePointStochastic, Crossover::Uniform] {
            let (x, y) = policy.recombine(&mut rng, &a, &b);
            for i in 0..9 {
                let from_a = Arc::ptr_eq(&x.polys[i], &a.polys[i]);
                assert!(from_a || Arc::ptr_eq(&x.polys[i], &b.polys[i]));
                // the other child got the other parent's slot
                let other = if from_a { &b } else { &a };
                assert!(Arc::ptr_eq(&y.polys[i], &other.polys[i]));
            }
        }
    }

    #[test]
    fn single_polygon_genomes_survive() {
        let mut rng = Pcg32::seed_from_u64(3);
        let (a, b) = parents(&mut rng, 1);
        for policy in [Crossover::SinglePoint, Crossover::SinglePointStochastic, Crossover::Uniform] {
            let (x, y) = policy.recombine(&mut rng, &a, &b);
            assert_eq!((x.polys.len(), y.polys.len()), (1, 1));
        }
        assert_eq!(segment_crossover(&mut rng, &a, &b).polys.len(), 1);
    }

    #[test]
    fn segment_comes_from_father() {
        let mut rng = Pcg32::seed_from_u64(4);
        let (m, f) = parents(&mut rng, 16);
        for _ in 0..20 {
            let child = segment_crossover(&mut rng, &m, &f);
            let from_father: Vec<usize> =
                (0..16).filter(|&i| Arc::ptr_eq(&child.polys[i], &f.polys[i])).collect();
            assert!(!from_father.is_empty());
            let (lo, hi) = (from_father[0], *from_father.last().unwrap());
            assert!((4..8).contains(&lo) && hi < 12);
            assert_eq!(from_father.len(), hi - lo + 1);
            for i in (0..16).filter(|i| !from_father.contains(i)) {
                assert!(Arc::ptr_eq(&child.polys[i], &m.polys[i]));
            }
        }
    }
}
