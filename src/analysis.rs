use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::geom::Point;
use crate::render::Raster;

/// how a fresh polygon gets its colour
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorInit {
    /// uniform random RGBA
    Random,
    /// target colour under the centre of the polygon's bounding box
    #[default]
    VertexMid,
    /// mean target colour under the vertices
    VertexAvg,
}

impl FromStr for ColorInit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(ColorInit::Random),
            "vertex_mid" => Ok(ColorInit::VertexMid),
            "vertex_avg" => Ok(ColorInit::VertexAvg),
            other => Err(ConfigError::UnknownPolicy {
                family: "initial colour",
                name: other.to_string(),
            }),
        }
    }
}

/// mean RGB of the whole image, used as the default background
pub fn average_color(img: &Raster) -> [u8; 3] {
    profiling::scope!("average_color");
    let pixels = (img.width as u64 * img.height as u64).max(1);
    let mut sum = [0u64; 3];
    for px in img.data.chunks_exact(4) {
        sum[0] += px[0] as u64;
        sum[1] += px[1] as u64;
        sum[2] += px[2] as u64;
    }
    [
        (sum[0] / pixels) as u8,
        (sum[1] / pixels) as u8,
        (sum[2] / pixels) as u8,
    ]
}

/// target colour at the middle of the vertices' bounding box
pub fn vertex_mid_color(img: &Raster, points: &[Point]) -> [u8; 3] {
    let Some(first) = points.first() else {
        return [0, 0, 0];
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
    for &(x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    img.rgb_at(((min_x + max_x) / 2, (min_y + max_y) / 2))
}

/// mean target colour over the vertices
pub fn vertex_avg_color(img: &Raster, points: &[Point]) -> [u8; 3] {
    if points.is_empty() {
        return [0, 0, 0];
    }
    let mut sum = [0u32; 3];
    for &p in points {
        let [r, g, b] = img.rgb_at(p);
        sum[0] += r as u32;
        sum[1] += g as u32;
        sum[2] += b as u32;
    }
    let n = points.len() as u32;
    [(sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn halves() -> Raster {
        // left half black, right half white
        let mut img = Raster::solid(4, 2, [0, 0, 0]);
        for y in 0..2 {
            for x in 2..4 {
                let i = ((y * 4 + x) * 4) as usize;
                img.data[i..i + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        img
    }

    #[test]
    fn average_of_halves_is_mid_grey() {
        assert_eq!(average_color(&halves()), [127, 127, 127]);
    }

    #[test]
    fn vertex_sampling() {
        let img = halves();
        assert_eq!(vertex_mid_color(&img, &[(0, 0), (1, 1), (0, 1)]), [0, 0, 0]);
        assert_eq!(vertex_avg_color(&img, &[(0, 0), (3, 0)]), [127, 127, 127]);
        assert_eq!(vertex_mid_color(&img, &[(2, 0), (3, 1)]), [255, 255, 255]);
    }

    #[test]
    fn unknown_colour_init_is_rejected() {
        assert_eq!("vertex_avg".parse::<ColorInit>().unwrap(), ColorInit::VertexAvg);
        assert!(matches!(
            "median".parse::<ColorInit>(),
            Err(ConfigError::UnknownPolicy { .. })
        ));
    }
}
