// fitness module organization
// each submodule handles a family of pixel-difference kernels

pub mod metrics;
pub mod sad;
pub mod ssim;

pub use sad::{sad_full, sad_rect};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::geom::{self, DirtyRect, Point};
use crate::render::Raster;

/// dissimilarity measure between a candidate and the target. lower is better.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// sum of absolute RGB differences
    Sad,
    /// sum of squared RGB differences
    #[default]
    Ssd,
    /// SSD divided by the pixel count of the whole image
    Mse,
    /// per-pixel RGB euclidean distance, summed
    Euclidean,
    /// red-mean weighted colour distance, square-rooted per pixel and summed
    ColorDist,
    /// red-mean weighted colour distance without the square root
    SquaredColorDist,
    /// 1 - mean SSIM over luma windows
    Ssim,
}

impl Metric {
    /// true when the metric is a sum over pixels, so a bounded region comparison
    /// orders two rasters the same way the full frame does
    pub fn is_additive(self) -> bool {
        !matches!(self, Metric::Ssim)
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "sad" => Metric::Sad,
            "ssd" => Metric::Ssd,
            "mse" => Metric::Mse,
            "euclidean" => Metric::Euclidean,
            "color_dist" => Metric::ColorDist,
            "squared_color_dist" => Metric::SquaredColorDist,
            "ssim" => Metric::Ssim,
            other => {
                return Err(ConfigError::UnknownPolicy {
                    family: "metric",
                    name: other.to_string(),
                })
            }
        })
    }
}

/// holds the immutable target raster and scores candidates against it
#[derive(Clone, Debug)]
pub struct FitnessEvaluator {
    target: Raster,
    metric: Metric,
}

impl FitnessEvaluator {
    pub fn new(mut target: Raster, metric: Metric) -> Self {
        // candidates are always opaque; make the target agree so alpha never scores
        for px in target.data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self { target, metric }
    }

    pub fn target(&self) -> &Raster {
        &self.target
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// full-frame fitness
    pub fn full(&self, current: &Raster) -> f64 {
        profiling::scope!("FitnessEvaluator::full");
        debug_assert_eq!(current.data.len(), self.target.data.len());
        match self.metric {
            Metric::Ssim => {
                let s = ssim::mean_ssim(&self.target.data, &current.data, self.target.width, self.target.height);
                1.0 - s
            }
            _ => self.partial_rect(current, DirtyRect::full(self.target.width, self.target.height)),
        }
    }

    /// fitness restricted to the bbox of the union of two vertex sets (a polygon
    /// before and after one mutation), grown by `pad` pixels.
    /// only differences between two candidates scored over the same region are meaningful.
    pub fn partial(&self, current: &Raster, before: &[Point], after: &[Point], pad: u32) -> f64 {
        match geom::union_bounds(before, after, pad, self.target.width, self.target.height) {
            Some(rect) => self.partial_rect(current, rect),
            None => 0.0,
        }
    }

    /// fitness over one rectangle (inclusive bounds).
    /// non-additive metrics have no local form and fall back to the full frame.
    pub fn partial_rect(&self, current: &Raster, rect: DirtyRect) -> f64 {
        profiling::scope!("FitnessEvaluator::partial_rect");
        let (t, c, stride) = (&self.target.data, &current.data, self.target.width);
        match self.metric {
            Metric::Sad => sad::sad_rect(t, c, rect, stride) as f64,
            Metric::Ssd => metrics::sum_rect(t, c, rect, stride, metrics::squared_diff),
            Metric::Mse => {
                let ssd = metrics::sum_rect(t, c, rect, stride, metrics::squared_diff);
                ssd / self.target.pixel_count().max(1) as f64
            }
            Metric::Euclidean => metrics::sum_rect(t, c, rect, stride, metrics::euclidean),
            Metric::ColorDist => metrics::sum_rect(t, c, rect, stride, metrics::color_dist),
            Metric::SquaredColorDist => {
                metrics::sum_rect(t, c, rect, stride, metrics::squared_color_dist)
            }
            Metric::Ssim => self.full(current),
        }
    }
}
