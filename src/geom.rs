// integer geometry shared by the genome, the renderer and the partial metrics.
//
// vertices live on the pixel lattice: every coordinate of a well-formed genome
// is inside [0, width) x [0, height). mutation operators clamp at the call site
// so nothing downstream has to handle out-of-bounds points.

/// a polygon vertex in pixel coordinates
pub type Point = (i32, i32);

/// clamp a point into the image lattice
#[inline]
pub fn clamp_point(p: Point, width: u32, height: u32) -> Point {
    (
        p.0.clamp(0, width as i32 - 1),
        p.1.clamp(0, height as i32 - 1),
    )
}

/// true if every vertex lies inside the image lattice
pub fn in_bounds(points: &[Point], width: u32, height: u32) -> bool {
    points
        .iter()
        .all(|&(x, y)| x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height)
}

/// dirty rectangle for tracking which pixels a mutation may have touched.
/// bounds are inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl DirtyRect {
    /// create a new dirty rect from pixel coordinates (inclusive bounds)
    #[inline]
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        debug_assert!(x0 <= x1 && y0 <= y1, "inverted rect ({x0},{y0})-({x1},{y1})");
        DirtyRect { x0, y0, x1, y1 }
    }

    /// the whole image
    #[inline]
    pub fn full(width: u32, height: u32) -> Self {
        DirtyRect::new(0, 0, width.saturating_sub(1), height.saturating_sub(1))
    }

    /// compute union of two dirty rects (smallest rect containing both)
    #[inline]
    pub fn union(self, other: DirtyRect) -> DirtyRect {
        DirtyRect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// axis-aligned bounding box of a vertex set, grown by `pad` pixels and clamped
/// to the image. returns None for an empty vertex set.
///
/// a vertex at x = max_x is a pixel corner, and non-AA coverage samples pixel
/// centres, so the inclusive box [min_x, max_x] already contains every pixel
/// the polygon can paint. anti-aliased edges bleed about one pixel further,
/// which is what `pad` is for.
pub fn bounds(points: &[Point], pad: u32, width: u32, height: u32) -> Option<DirtyRect> {
    profiling::scope!("geom::bounds");
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
    for &(x, y) in &points[1..] {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    let pad = pad as i32;
    let x_max = width as i32 - 1;
    let y_max = height as i32 - 1;
    Some(DirtyRect::new(
        (min_x - pad).clamp(0, x_max) as u32,
        (min_y - pad).clamp(0, y_max) as u32,
        (max_x + pad).clamp(0, x_max) as u32,
        (max_y + pad).clamp(0, y_max) as u32,
    ))
}

/// bounding box of the union of two vertex sets (before and after a mutation)
pub fn union_bounds(
    before: &[Point],
    after: &[Point],
    pad: u32,
    width: u32,
    height: u32,
) -> Option<DirtyRect> {
    match (bounds(before, pad, width, height), bounds(after, pad, width, height)) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, b) => a.or(b),
    }
}
