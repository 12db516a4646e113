use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::analysis::{self, ColorInit};
use crate::error::DnaError;
use crate::geom::{self, Point};
use crate::render::Raster;

/// a polygon with a fixed number of lattice vertices and a straight (un-premultiplied)
/// RGBA colour. also caches a tiny-skia path.
#[derive(Debug, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
    pub rgba: [u8; 4],

    // None when the vertex set does not form a drawable path
    #[serde(skip)]
    pub(crate) cached_path: OnceLock<Option<Arc<tiny_skia::Path>>>,
}

// this way stale paths won't be copied if the polygon is cloned and then mutated.
impl Clone for Polygon {
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            rgba: self.rgba,
            cached_path: OnceLock::new(),
        }
    }
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points && self.rgba == other.rgba
    }
}

impl Polygon {
    pub fn new(points: Vec<Point>, rgba: [u8; 4]) -> Self {
        Self {
            points,
            rgba,
            cached_path: OnceLock::new(),
        }
    }
}

/// dimensions and polygon layout of every genome in a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenomeShape {
    pub width: u32,
    pub height: u32,
    pub polygon_count: usize,
    pub vertices_count: usize,
}

// arc wrapper enables copy-on-write: cloning a genome only copies pointers,
// not entire polygons. mutations use Arc::make_mut() to clone only the touched slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Genome {
    pub width: u32,
    pub height: u32,
    pub vertices_count: usize,
    /// opaque canvas colour
    pub background: [u8; 3],
    /// paint order: later slots are drawn on top
    pub polys: Vec<Arc<Polygon>>,
}

impl Genome {
    /// random genome: uniform vertices, colours per `colors` sampled from `target`
    pub fn random<R: Rng>(
        rng: &mut R,
        shape: GenomeShape,
        background: [u8; 3],
        target: &Raster,
        colors: ColorInit,
        initial_alpha: u8,
    ) -> Self {
        profiling::scope!("Genome::random");
        let polys = (0..shape.polygon_count)
            .map(|_| {
                let points: Vec<Point> = (0..shape.vertices_count)
                    .map(|_| {
                        (
                            rng.random_range(0..shape.width as i32),
                            rng.random_range(0..shape.height as i32),
                        )
                    })
                    .collect();
                let rgba = match colors {
                    ColorInit::Random => rng.random::<[u8; 4]>(),
                    ColorInit::VertexMid => {
                        let [r, g, b] = analysis::vertex_mid_color(target, &points);
                        [r, g, b, initial_alpha]
                    }
                    ColorInit::VertexAvg => {
                        let [r, g, b] = analysis::vertex_avg_color(target, &points);
                        [r, g, b, initial_alpha]
                    }
                };
                Arc::new(Polygon::new(points, rgba))
            })
            .collect();

        Self {
            width: shape.width,
            height: shape.height,
            vertices_count: shape.vertices_count,
            background,
            polys,
        }
    }

    pub fn shape(&self) -> GenomeShape {
        GenomeShape {
            width: self.width,
            height: self.height,
            polygon_count: self.polys.len(),
            vertices_count: self.vertices_count,
        }
    }

    /// check the structural invariants: fixed vertex count, every vertex on the lattice
    pub fn validate(&self) -> Result<(), DnaError> {
        if self.width == 0 || self.height == 0 {
            return Err(DnaError::Malformed(format!(
                "empty canvas {}x{}",
                self.width, self.height
            )));
        }
        for (i, poly) in self.polys.iter().enumerate() {
            if poly.points.len() != self.vertices_count {
                return Err(DnaError::Malformed(format!(
                    "polygon {i} has {} vertices, expected {}",
                    poly.points.len(),
                    self.vertices_count
                )));
            }
            if !geom::in_bounds(&poly.points, self.width, self.height) {
                return Err(DnaError::Malformed(format!(
                    "polygon {i} has a vertex outside {}x{}",
                    self.width, self.height
                )));
            }
        }
        Ok(())
    }

    /// serialize to a self-describing DNA blob
    pub fn to_dna(&self) -> Result<Vec<u8>, DnaError> {
        profiling::scope!("Genome::to_dna");
        let record = DnaRecord {
            magic: DNA_MAGIC,
            version: DNA_VERSION,
            width: self.width,
            height: self.height,
            vertices_count: self.vertices_count as u32,
            polygons: self.polys.iter().map(|p| p.points.clone()).collect(),
            colors: self.polys.iter().map(|p| p.rgba).collect(),
            background: self.background,
        };
        bincode::serialize(&record).map_err(DnaError::Encode)
    }

    /// rebuild a genome from a DNA blob. when `expect` is given the blob must
    /// agree with it on width, height and vertex count.
    pub fn from_dna(bytes: &[u8], expect: Option<&DnaShape>) -> Result<Self, DnaError> {
        profiling::scope!("Genome::from_dna");
        let record: DnaRecord = bincode::deserialize(bytes).map_err(DnaError::Decode)?;
        if record.magic != DNA_MAGIC {
            return Err(DnaError::BadMagic);
        }
        if record.version != DNA_VERSION {
            return Err(DnaError::UnsupportedVersion(record.version));
        }

        let found = DnaShape {
            width: record.width,
            height: record.height,
            vertices_count: record.vertices_count as usize,
        };
        if let Some(expected) = expect {
            if *expected != found {
                return Err(DnaError::Mismatch {
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }
        if record.polygons.len() != record.colors.len() {
            return Err(DnaError::Malformed(format!(
                "{} polygons but {} colours",
                record.polygons.len(),
                record.colors.len()
            )));
        }

        let genome = Genome {
            width: record.width,
            height: record.height,
            vertices_count: found.vertices_count,
            background: record.background,
            polys: record
                .polygons
                .into_iter()
                .zip(record.colors)
                .map(|(points, rgba)| Arc::new(Polygon::new(points, rgba)))
                .collect(),
        };
        genome.validate()?;
        Ok(genome)
    }
}

/// the part of a genome's layout that a DNA blob must agree on with its run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DnaShape {
    pub width: u32,
    pub height: u32,
    pub vertices_count: usize,
}

impl std::fmt::Display for DnaShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} with {} vertices", self.width, self.height, self.vertices_count)
    }
}

impl From<GenomeShape> for DnaShape {
    fn from(s: GenomeShape) -> Self {
        DnaShape {
            width: s.width,
            height: s.height,
            vertices_count: s.vertices_count,
        }
    }
}

const DNA_MAGIC: [u8; 4] = *b"PEVO";
const DNA_VERSION: u16 = 1;

// on-disk layout: parallel vertex and colour arrays, as the genome is described
#[derive(Serialize, Deserialize)]
struct DnaRecord {
    magic: [u8; 4],
    version: u16,
    width: u32,
    height: u32,
    vertices_count: u32,
    polygons: Vec<Vec<Point>>,
    colors: Vec<[u8; 4]>,
    background: [u8; 3],
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn sample(seed: u64) -> Genome {
        let mut rng = Pcg32::seed_from_u64(seed);
        let target = Raster::solid(12, 9, [40, 80, 120]);
        let shape = GenomeShape {
            width: 12,
            height: 9,
            polygon_count: 5,
            vertices_count: 4,
        };
        Genome::random(&mut rng, shape, [1, 2, 3], &target, ColorInit::Random, 100)
    }

    #[test]
    fn random_genome_respects_shape() {
        let g = sample(7);
        assert_eq!(g.polys.len(), 5);
        assert!(g.validate().is_ok());
        for p in &g.polys {
            assert_eq!(p.points.len(), 4);
        }
    }

    #[test]
    fn sampled_colours_use_initial_alpha() {
        let mut rng = Pcg32::seed_from_u64(3);
        let target = Raster::solid(8, 8, [200, 10, 10]);
        let shape = GenomeShape {
            width: 8,
            height: 8,
            polygon_count: 3,
            vertices_count: 3,
        };
        let g = Genome::random(&mut rng, shape, [0, 0, 0], &target, ColorInit::VertexMid, 100);
        for p in &g.polys {
            assert_eq!(p.rgba, [200, 10, 10, 100]);
        }
    }

    #[test]
    fn dna_round_trip() {
        let g = sample(11);
        let bytes = g.to_dna().unwrap();
        let back = Genome::from_dna(&bytes, Some(&g.shape().into())).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn dna_rejects_mismatched_shape() {
        let g = sample(5);
        let bytes = g.to_dna().unwrap();
        let wrong = DnaShape {
            width: 12,
            height: 9,
            vertices_count: 3,
        };
        assert!(matches!(
            Genome::from_dna(&bytes, Some(&wrong)),
            Err(DnaError::Mismatch { .. })
        ));
    }

    #[test]
    fn dna_rejects_garbage() {
        assert!(Genome::from_dna(b"nope", None).is_err());
        let mut bytes = sample(1).to_dna().unwrap();
        bytes[0] = b'X';
        assert!(matches!(Genome::from_dna(&bytes, None), Err(DnaError::BadMagic)));
    }

    #[test]
    fn clone_shares_polygons() {
        let g = sample(2);
        let c = g.clone();
        assert!(Arc::ptr_eq(&g.polys[0], &c.polys[0]));
    }
}
