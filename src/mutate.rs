use rand::Rng;
use std::sync::Arc;

use crate::dna::Genome;
use crate::geom::{self, DirtyRect, Point};
use crate::mutation_config::{MutateConfig, MutationKind};

/// a mutated copy of a genome plus what changed.
/// `before`/`after` are the vertex sets of slot `index` on either side of the
/// mutation; their union bbox covers every pixel the mutation can change.
#[derive(Clone, Debug)]
pub struct Mutation {
    pub genome: Genome,
    pub kind: MutationKind,
    pub index: usize,
    pub before: Vec<Point>,
    pub after: Vec<Point>,
}

impl Mutation {
    /// region that may differ between parent and child raster
    pub fn bounds(&self, pad: u32) -> Option<DirtyRect> {
        geom::union_bounds(&self.before, &self.after, pad, self.genome.width, self.genome.height)
    }
}

#[inline]
fn jitter<R: Rng>(rng: &mut R, v: i32, delta: i32) -> i32 {
    v + rng.random_range(-delta..=delta)
}

impl Genome {
    /// produce a copy with exactly one operator applied to one random slot.
    /// `hard` selects full-range magnitudes, otherwise soft (local) ones.
    /// only the touched slot is cloned; every other polygon stays shared.
    pub fn mutant<R: Rng>(&self, rng: &mut R, cfg: &MutateConfig, hard: bool) -> Mutation {
        profiling::scope!("Genome::mutant");
        let mut genome = self.clone();
        let kind = match cfg.operators.len() {
            0 => MutationKind::VertexJitter,
            n => cfg.operators[rng.random_range(0..n)],
        };
        if genome.polys.is_empty() {
            return Mutation { genome, kind, index: 0, before: Vec::new(), after: Vec::new() };
        }

        let index = rng.random_range(0..genome.polys.len());
        let before = genome.polys[index].points.clone();
        match kind {
            MutationKind::VertexJitter => genome.jitter_vertex(rng, cfg, index, hard),
            MutationKind::PolygonReplace => genome.replace_polygon(rng, cfg, index, hard),
            MutationKind::ColorPerturb => genome.perturb_color(rng, cfg, index, hard),
            MutationKind::AlphaReassign => genome.reassign_alpha(rng, cfg, index),
            MutationKind::OrderSwap => genome.swap_order(rng, cfg, index, hard),
        }
        let after = genome.polys[index].points.clone();

        Mutation { genome, kind, index, before, after }
    }

    fn vertex_deltas(&self, cfg: &MutateConfig, hard: bool) -> (i32, i32) {
        if hard {
            (self.width as i32, self.height as i32)
        } else {
            let d = cfg.soft_vertex_divisor.max(1);
            ((self.width / d + 1) as i32, (self.height / d + 1) as i32)
        }
    }

    fn jitter_vertex<R: Rng>(&mut self, rng: &mut R, cfg: &MutateConfig, index: usize, hard: bool) {
        profiling::scope!("jitter_vertex");
        let (dx, dy) = self.vertex_deltas(cfg, hard);
        let (w, h) = (self.width, self.height);
        let poly = Arc::make_mut(&mut self.polys[index]);
        if poly.points.is_empty() {
            return;
        }
        let v = rng.random_range(0..poly.points.len());
        let (x, y) = poly.points[v];
        poly.points[v] = geom::clamp_point((jitter(rng, x, dx), jitter(rng, y, dy)), w, h);
    }

    fn replace_polygon<R: Rng>(&mut self, rng: &mut R, cfg: &MutateConfig, index: usize, hard: bool) {
        profiling::scope!("replace_polygon");
        let (dx, dy) = self.vertex_deltas(cfg, hard);
        let (w, h) = (self.width, self.height);
        let poly = Arc::make_mut(&mut self.polys[index]);
        for p in poly.points.iter_mut() {
            *p = if hard {
                (rng.random_range(0..w as i32), rng.random_range(0..h as i32))
            } else {
                geom::clamp_point((jitter(rng, p.0, dx), jitter(rng, p.1, dy)), w, h)
            };
        }
    }

    fn perturb_color<R: Rng>(&mut self, rng: &mut R, cfg: &MutateConfig, index: usize, hard: bool) {
        profiling::scope!("perturb_color");
        let delta = if hard { 255 } else { cfg.soft_color_delta as i32 };
        let poly = Arc::make_mut(&mut self.polys[index]);
        for c in poly.rgba[..3].iter_mut() {
            *c = jitter(rng, *c as i32, delta).clamp(0, 255) as u8;
        }
    }

    fn reassign_alpha<R: Rng>(&mut self, rng: &mut R, cfg: &MutateConfig, index: usize) {
        let lo = cfg.alpha_min.min(cfg.alpha_max);
        let poly = Arc::make_mut(&mut self.polys[index]);
        poly.rgba[3] = rng.random_range(lo..=cfg.alpha_max);
    }

    // swaps the whole slot (shape and colour), only paint order changes
    fn swap_order<R: Rng>(&mut self, rng: &mut R, cfg: &MutateConfig, index: usize, hard: bool) {
        let n = self.polys.len();
        if n < 2 {
            return;
        }
        let d = (if hard { n } else { n / cfg.soft_order_divisor.max(1) + 1 }) as i64;
        let mut other = (index as i64 + rng.random_range(-d..=d)).rem_euclid(n as i64) as usize;
        if other == index {
            other = (index + 1) % n;
        }
        self.polys.swap(index, other);
    }
}
