use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// how parents are paired for crossover
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// pair i with i+1 (mod N) in index order
    FirstPacks,
    /// like first_packs, after sorting by fitness ascending
    Truncation,
    /// accept a random individual with probability best / fitness
    #[default]
    StochasticAcceptance,
    /// cumulative-sum draw weighted by fitness / total
    RouletteWheel,
}

impl FromStr for Selection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_packs" => Ok(Selection::FirstPacks),
            "truncation" => Ok(Selection::Truncation),
            "stochastic_acceptance" => Ok(Selection::StochasticAcceptance),
            "roulette_wheel" => Ok(Selection::RouletteWheel),
            other => Err(ConfigError::UnknownPolicy {
                family: "selection",
                name: other.to_string(),
            }),
        }
    }
}

/// indices sorted by fitness, best (lowest) first
pub(crate) fn ranked(fitness: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));
    order
}

impl Selection {
    /// choose `pairs` parent pairs (indices into `fitness`)
    pub fn select_pairs<R: Rng>(self, rng: &mut R, fitness: &[f64], pairs: usize) -> Vec<(usize, usize)> {
        profiling::scope!("Selection::select_pairs");
        let n = fitness.len();
        if n == 0 || pairs == 0 {
            return Vec::new();
        }
        match self {
            Selection::FirstPacks => (0..pairs).map(|i| (i % n, (i + 1) % n)).collect(),
            Selection::Truncation => {
                let order = ranked(fitness);
                (0..pairs).map(|i| (order[i % n], order[(i + 1) % n])).collect()
            }
            Selection::StochasticAcceptance => {
                let pool: Vec<usize> = (0..pairs * 2).map(|_| stochastic_accept(rng, fitness)).collect();
                pool.chunks_exact(2).map(|p| (p[0], p[1])).collect()
            }
            Selection::RouletteWheel => {
                let pool: Vec<usize> = (0..pairs * 2).map(|_| roulette(rng, fitness)).collect();
                pool.chunks_exact(2).map(|p| (p[0], p[1])).collect()
            }
        }
    }
}

/// pick random individuals until one passes the best/fitness acceptance test.
/// a zero or negative fitness on either side accepts unconditionally.
pub(crate) fn stochastic_accept<R: Rng>(rng: &mut R, fitness: &[f64]) -> usize {
    let best = fitness.iter().copied().fold(f64::INFINITY, f64::min);
    loop {
        let i = rng.random_range(0..fitness.len());
        let f = fitness[i];
        if best <= 0.0 || f <= 0.0 || !best.is_finite() {
            return i;
        }
        if rng.random::<f64>() < best / f {
            return i;
        }
    }
}

/// cumulative-sum draw with weights fitness / total.
/// falls back to a uniform pick when the total is not positive.
pub(crate) fn roulette<R: Rng>(rng: &mut R, fitness: &[f64]) -> usize {
    let total: f64 = fitness.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return rng.random_range(0..fitness.len());
    }
    let r = rng.random::<f64>() * total;
    let mut acc = 0.0;
    for (i, &f) in fitness.iter().enumerate() {
        acc += f;
        if r < acc {
            return i;
        }
    }
    fitness.len() - 1
}
