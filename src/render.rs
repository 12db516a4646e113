use tiny_skia as sk;
use crate::dna::{Genome, Polygon};
use std::sync::Arc;

/// an opaque RGBA8 pixel buffer, row-major.
/// every pixel has alpha 255, so premultiplied and straight bytes coincide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Raster {
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self { width, height, data }
    }

    /// build from packed RGB8 (the layout of image::RgbImage)
    pub fn from_rgb(width: u32, height: u32, rgb: &[u8]) -> Self {
        profiling::scope!("Raster::from_rgb");
        debug_assert_eq!(rgb.len(), width as usize * height as usize * 3);
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for px in rgb.chunks_exact(3) {
            data.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        Self { width, height, data }
    }

    /// packed RGB8, dropping the alpha channel
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() / 4 * 3);
        for px in self.data.chunks_exact(4) {
            out.extend_from_slice(&px[..3]);
        }
        out
    }

    /// colour at a lattice point, clamped into the image
    #[inline]
    pub fn rgb_at(&self, p: (i32, i32)) -> [u8; 3] {
        let (x, y) = crate::geom::clamp_point(p, self.width, self.height);
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// software rasteriser on top of tiny-skia
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuRenderer {
    pub antialias: bool,
}

impl CpuRenderer {
    pub fn new(antialias: bool) -> Self {
        Self { antialias }
    }

    /// padding (in pixels) to add around a vertex bbox so it covers every pixel
    /// a polygon can touch. anti-aliased edges reach one pixel further.
    #[inline]
    pub fn bbox_pad(&self) -> u32 {
        if self.antialias { 2 } else { 1 }
    }

    /// full-frame render at the genome's own resolution
    pub fn render(&self, genome: &Genome) -> Raster {
        profiling::scope!("render");
        self.render_scaled(genome, 1.0)
    }

    /// render with every coordinate and the canvas multiplied by `scale`.
    /// used for high resolution export; the genome itself is unchanged.
    pub fn render_scaled(&self, genome: &Genome, scale: f32) -> Raster {
        profiling::scope!("render_scaled");
        let w = ((genome.width as f32 * scale).round() as u32).max(1);
        let h = ((genome.height as f32 * scale).round() as u32).max(1);
        let [r, g, b] = genome.background;

        let Some(mut pix) = sk::Pixmap::new(w, h) else {
            return Raster::solid(w, h, genome.background);
        };
        pix.fill(sk::Color::from_rgba8(r, g, b, 255));

        let transform = if scale == 1.0 {
            sk::Transform::identity()
        } else {
            sk::Transform::from_scale(scale, scale)
        };
        for poly in &genome.polys {
            draw_polygon(&mut pix, poly, transform, self.antialias);
        }

        // the background is opaque, so the premultiplied buffer is already straight RGBA
        Raster {
            width: w,
            height: h,
            data: pix.take(),
        }
    }
}

fn polygon_path(poly: &Polygon) -> Option<Arc<sk::Path>> {
    let (first, rest) = poly.points.split_first()?;
    let mut pb = sk::PathBuilder::new();
    pb.move_to(first.0 as f32, first.1 as f32);
    for &(x, y) in rest {
        pb.line_to(x as f32, y as f32);
    }
    pb.close();
    pb.finish().map(Arc::new)
}

fn draw_polygon(pix: &mut sk::Pixmap, poly: &Polygon, transform: sk::Transform, antialias: bool) {
    profiling::scope!("draw_polygon");
    if poly.rgba[3] == 0 {
        return;
    }

    // path is built once per polygon and reused until the polygon is cloned for mutation.
    // degenerate vertex sets produce no path and paint nothing.
    let Some(path) = poly.cached_path.get_or_init(|| polygon_path(poly)) else {
        return;
    };

    let [r, g, b, a] = poly.rgba;
    let mut paint = sk::Paint::default();
    paint.anti_alias = antialias;
    paint.shader = sk::Shader::SolidColor(sk::Color::from_rgba8(r, g, b, a));

    pix.fill_path(path, &paint, sk::FillRule::Winding, transform, None);
}
