use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// the mutation operators; one is drawn uniformly from the enabled set per mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// move one vertex
    VertexJitter,
    /// move every vertex of the polygon
    PolygonReplace,
    /// perturb the RGB channels
    ColorPerturb,
    /// draw a fresh alpha from [alpha_min, alpha_max]
    AlphaReassign,
    /// swap paint order with a nearby polygon
    OrderSwap,
}

impl MutationKind {
    pub const ALL: [MutationKind; 5] = [
        MutationKind::VertexJitter,
        MutationKind::PolygonReplace,
        MutationKind::ColorPerturb,
        MutationKind::AlphaReassign,
        MutationKind::OrderSwap,
    ];
}

impl FromStr for MutationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertex_jitter" => Ok(MutationKind::VertexJitter),
            "polygon_replace" => Ok(MutationKind::PolygonReplace),
            "color_perturb" => Ok(MutationKind::ColorPerturb),
            "alpha_reassign" => Ok(MutationKind::AlphaReassign),
            "order_swap" => Ok(MutationKind::OrderSwap),
            other => Err(ConfigError::UnknownPolicy {
                family: "mutation operator",
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutateConfig {
    pub operators: Vec<MutationKind>, // enabled operators, must not be empty

    // soft-mode magnitudes
    pub soft_vertex_divisor: u32, // vertex delta = dim / divisor + 1
    pub soft_color_delta: u8,     // ± per RGB channel
    pub soft_order_divisor: usize, // order distance = polygon_count / divisor + 1

    // alpha range for alpha-reassign (inclusive)
    pub alpha_min: u8,
    pub alpha_max: u8,
}

impl Default for MutateConfig {
    fn default() -> Self {
        Self {
            operators: MutationKind::ALL.to_vec(),
            soft_vertex_divisor: 8,
            soft_color_delta: 32,
            soft_order_divisor: 10,
            // neither invisible nor fully occluding
            alpha_min: 32,
            alpha_max: 196,
        }
    }
}

impl MutateConfig {
    /// config with a single enabled operator
    pub fn only(kind: MutationKind) -> Self {
        Self {
            operators: vec![kind],
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operators.is_empty() {
            return Err(ConfigError::Invalid("no mutation operators enabled".into()));
        }
        if self.soft_vertex_divisor == 0 {
            return Err(ConfigError::out_of_range("soft_vertex_divisor", 0, ">= 1"));
        }
        if self.soft_order_divisor == 0 {
            return Err(ConfigError::out_of_range("soft_order_divisor", 0, ">= 1"));
        }
        if self.alpha_min > self.alpha_max {
            return Err(ConfigError::Invalid(format!(
                "alpha_min {} > alpha_max {}",
                self.alpha_min, self.alpha_max
            )));
        }
        Ok(())
    }
}

/// when a cycle uses hard (full range) or soft (local) mutation
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardMutationPolicy {
    #[default]
    Always,
    Never,
    /// hard until the best fitness reaches `fitness_limit`, then hard only with
    /// probability `random_prob` per cycle
    Adaptive { fitness_limit: f64, random_prob: f64 },
}

impl HardMutationPolicy {
    /// decide the mode for the next cycle
    pub fn choose<R: Rng>(&self, rng: &mut R, best_fitness: f64) -> bool {
        match *self {
            HardMutationPolicy::Always => true,
            HardMutationPolicy::Never => false,
            HardMutationPolicy::Adaptive { fitness_limit, random_prob } => {
                best_fitness > fitness_limit || rng.random_bool(random_prob.clamp(0.0, 1.0))
            }
        }
    }
}
