use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::individual::Individual;

/// how the next generation is formed from the candidate pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Substitution {
    /// pool plus every parent, best N survive
    #[default]
    PlusSelection,
    /// pool alone, best N survive
    CommaSelection,
    /// N groups of k draws from the pool, each group's best survives
    Tournament,
}

impl FromStr for Substitution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plus_selection" => Ok(Substitution::PlusSelection),
            "comma_selection" => Ok(Substitution::CommaSelection),
            "tournament" => Ok(Substitution::Tournament),
            other => Err(ConfigError::UnknownPolicy {
                family: "substitution",
                name: other.to_string(),
            }),
        }
    }
}

fn best_n(mut candidates: Vec<Individual>, n: usize) -> Vec<Individual> {
    candidates.sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));
    candidates.truncate(n);
    candidates
}

/// draw `n` groups of `k` pool indices, uniformly with replacement
pub fn tournament_groups<R: Rng>(rng: &mut R, pool_len: usize, n: usize, k: usize) -> Vec<Vec<usize>> {
    (0..n)
        .map(|_| (0..k.max(1)).map(|_| rng.random_range(0..pool_len)).collect())
        .collect()
}

/// index of the lowest fitness in a group (first one on ties)
pub fn group_winner(group: &[usize], fitness: &[f64]) -> usize {
    let mut best = group[0];
    for &i in &group[1..] {
        if fitness[i] < fitness[best] {
            best = i;
        }
    }
    best
}

impl Substitution {
    /// form the next generation of `n` individuals.
    /// `pool` holds the crossover children, the mutated copies and the parents
    /// that were not mutated; `displaced` holds the originals of the mutated
    /// copies. every current individual is in exactly one of the two.
    pub fn survivors<R: Rng>(
        self,
        rng: &mut R,
        displaced: Vec<Individual>,
        mut pool: Vec<Individual>,
        n: usize,
        tournament_size: usize,
    ) -> Vec<Individual> {
        profiling::scope!("Substitution::survivors");
        match self {
            Substitution::PlusSelection => {
                pool.extend(displaced);
                best_n(pool, n)
            }
            Substitution::CommaSelection => {
                if pool.len() < n {
                    // top up from the displaced parents so the population size holds
                    let missing = n - pool.len();
                    pool.extend(best_n(displaced, missing));
                }
                best_n(pool, n)
            }
            Substitution::Tournament => {
                if pool.is_empty() {
                    return best_n(displaced, n);
                }
                let fitness: Vec<f64> = pool.iter().map(Individual::fitness).collect();
                tournament_groups(rng, pool.len(), n, tournament_size)
                    .iter()
                    .map(|g| pool[group_winner(g, &fitness)].clone())
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn groups_have_requested_shape() {
        let mut rng = Pcg32::seed_from_u64(6);
        let groups = tournament_groups(&mut rng, 10, 6, 3);
        assert_eq!(groups.len(), 6);
        assert!(groups.iter().all(|g| g.len() == 3 && g.iter().all(|&i| i < 10)));
    }

    #[test]
    fn winner_is_group_minimum() {
        let fitness = [4.0, 1.0, 9.0, 1.0];
        assert_eq!(group_winner(&[0, 2, 3, 1], &fitness), 3);
        assert_eq!(group_winner(&[2], &fitness), 2);
    }

    #[test]
    fn unknown_substitution_fails() {
        assert!("mu_lambda".parse::<Substitution>().is_err());
        assert_eq!("comma_selection".parse::<Substitution>().unwrap(), Substitution::CommaSelection);
    }
}
