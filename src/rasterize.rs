//! Scanline rasterization with analytic coverage
//!
//! The rasterizer works in two steps. First every flattened line segment
//! deposits signed winding differences into a scalar buffer: for each pixel
//! the value describes how the winding number changes from the previous
//! pixel in the row, weighted by the exact fractional area the segment cuts
//! out of the pixel. Second, a left to right prefix sum per row recovers the
//! winding number, and the fill rule maps it to coverage in [0, 1].
//!
//! Horizontal segments contribute nothing and are skipped; shared vertices
//! of adjacent segments deposit complementary fractions, so closed contours
//! always sum to zero winding across a row.
use crate::{
    utils::clamp, FillRule, Image, ImageMut, ImageOwned, Line, Path, Point, Scalar, Size,
    Transform, DEFAULT_FLATNESS, EPSILON,
};

/// Rasterized pixel coverage sample
#[derive(Debug, Clone, Copy)]
pub struct CoverageSample {
    /// Column of the pixel
    pub x: usize,
    /// Row of the pixel
    pub y: usize,
    /// Fraction of the pixel covered by the shape, in [0, 1]
    pub coverage: Scalar,
}

/// Analytic coverage rasterizer
#[derive(Debug, Clone, Copy)]
pub struct Rasterizer {
    flatness: Scalar,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self {
            flatness: DEFAULT_FLATNESS,
        }
    }
}

impl Rasterizer {
    pub fn new(flatness: Scalar) -> Self {
        Self { flatness }
    }

    /// Deposit signed winding differences of the path into the image
    ///
    /// The image is interpreted as a winding-difference accumulator; use
    /// [`winding_to_coverage`] afterwards (or a manual prefix sum) to turn
    /// it into coverage. Sub-paths are implicitly closed.
    pub fn deposit(
        &self,
        path: &Path,
        tr: Transform,
        img: &mut (impl ImageMut<Pixel = Scalar> + ?Sized),
    ) {
        if img.width() == 0 || img.height() == 0 {
            return;
        }
        for line in path.flatten(tr, self.flatness, true) {
            deposit_line(&mut *img, line);
        }
    }

    /// Rasterize the path as a coverage mask into the provided image
    ///
    /// The image is assumed to contain zeros; everything outside of it is
    /// cropped.
    pub fn mask(
        &self,
        path: &Path,
        tr: Transform,
        img: &mut (impl ImageMut<Pixel = Scalar> + ?Sized),
        fill_rule: FillRule,
    ) {
        self.deposit(path, tr, &mut *img);
        winding_to_coverage(img, fill_rule);
    }

    /// Iterator over coverage samples of the rasterized path
    pub fn coverage(
        &self,
        path: &Path,
        tr: Transform,
        size: Size,
        fill_rule: FillRule,
    ) -> impl Iterator<Item = CoverageSample> {
        let mut img = ImageOwned::new_default(size);
        if !size.is_empty() {
            self.deposit(path, tr, &mut img);
        }
        let mut winding = 0.0;
        img.into_vec()
            .into_iter()
            .enumerate()
            .filter_map(move |(index, delta)| {
                if size.width == 0 {
                    return None;
                }
                let y = index / size.width;
                let x = index - y * size.width;
                if x == 0 {
                    winding = 0.0;
                }
                winding += delta;
                let coverage = fill_rule.coverage_from_winding(winding);
                if coverage < 1e-6 {
                    None
                } else {
                    Some(CoverageSample { x, y, coverage })
                }
            })
    }
}

/// Update the image with the signed winding difference introduced by a line
///
/// The difference of a pixel describes how the winding number changes
/// between it and the pixel to its left, so a later prefix sum over the row
/// reconstructs per-pixel winding with analytic area accuracy.
fn deposit_line(img: &mut (impl ImageMut<Pixel = Scalar> + ?Sized), line: Line) {
    let Line([p0, p1]) = line;

    // geometry right of the image changes winding only for columns that
    // are never scanned; clip it at the border
    let right = img.width() as Scalar;
    let line = if p0.x() >= right && p1.x() >= right {
        return;
    } else if p0.x() > right || p1.x() > right {
        let t = (p0.x() - right) / (p0.x() - p1.x());
        let mid = Point::new(right, (1.0 - t) * p0.y() + t * p1.y());
        if p0.x() < right {
            Line::new(p0, mid)
        } else {
            Line::new(mid, p1)
        }
    } else {
        line
    };

    // the part of the line left of the image is replaced with a vertical
    // line on the left border spanning the same rows, rasterized separately
    let Line([p0, p1]) = line;
    let line = if p0.x() < 0.0 || p1.x() < 0.0 {
        let (vertical, line) = if p1.x() > 0.0 || p0.x() > 0.0 {
            let t = p0.x() / (p0.x() - p1.x());
            let mid = Point::new(0.0, (1.0 - t) * p0.y() + t * p1.y());
            if p1.x() > 0.0 {
                let p = Point::new(0.0, p0.y());
                (Line::new(p, mid), Line::new(mid, p1))
            } else {
                let p = Point::new(0.0, p1.y());
                (Line::new(mid, p), Line::new(p0, mid))
            }
        } else {
            (
                Line::new((0.0, p0.y()), (0.0, p1.y())),
                Line::new((0.0, 0.0), (0.0, 0.0)),
            )
        };
        deposit_line(&mut *img, vertical);
        line
    } else {
        line
    };

    let Line([p0, p1]) = line;
    if (p0.y() - p1.y()).abs() < EPSILON {
        // horizontal lines do not change winding
        return;
    }
    let shape = img.shape();
    let data = img.data_mut();
    let stride = shape.col_stride;

    // iterate from the endpoint with the smaller y coordinate
    let (dir, p0, p1) = if p0.y() < p1.y() {
        (1.0, p0, p1)
    } else {
        (-1.0, p1, p0)
    };
    let dxdy = (p1.x() - p0.x()) / (p1.y() - p0.y());
    // first traced row; x is adjusted when the line starts above the image
    let y = p0.y().max(0.0) as usize;
    let mut x = if p0.y() < 0.0 {
        p0.x() - p0.y() * dxdy
    } else {
        p0.x()
    };
    let mut x_next = x;
    for y in y..shape.height.min(p1.y().ceil().max(0.0) as usize) {
        x = x_next;
        let row_offset = shape.offset(y, 0);
        // winding fractions landing outside of the image belong to pixels
        // that are never scanned, drop them
        let mut put = |col: i32, value: Scalar| {
            if col >= 0 && (col as usize) < shape.width {
                data[row_offset + (col as usize) * stride] += value;
            }
        };
        // height of the row slice covered by the line
        let dy = ((y + 1) as Scalar).min(p1.y()) - (y as Scalar).max(p0.y());
        let d = dir * dy;
        x_next = x + dxdy * dy;
        let (x0, x1) = if x < x_next { (x, x_next) } else { (x_next, x) };
        let x0_floor = x0.floor().max(0.0);
        let x0i = x0_floor as i32;
        let x1_ceil = x1.ceil();
        let x1i = x1_ceil as i32;
        if x1i <= x0i + 1 {
            // the slice stays within one pixel column; its winding is
            // split between this pixel and the next by the covered area
            let xmf = 0.5 * (x + x_next) - x0_floor;
            put(x0i, d * (1.0 - xmf));
            put(x0i + 1, d * xmf);
        } else {
            // the slice spans multiple columns; distribute the winding by
            // the trapezoid areas the line cuts out of each pixel
            let s = (x1 - x0).recip();
            let x0f = x0 - x0_floor;
            let x1f = x1 - x1_ceil + 1.0;
            let a0 = 0.5 * s * (1.0 - x0f) * (1.0 - x0f);
            let am = 0.5 * s * x1f * x1f;
            put(x0i, d * a0);
            if x1i == x0i + 2 {
                put(x0i + 1, d * (1.0 - a0 - am));
            } else {
                let a1 = s * (1.5 - x0f);
                put(x0i + 1, d * (a1 - a0));
                for xi in x0i + 2..x1i - 1 {
                    put(xi, d * s);
                }
                let a2 = a1 + (x1i - x0i - 3) as Scalar * s;
                put(x1i - 1, d * (1.0 - a2 - am));
            }
            put(x1i, d * am);
        }
    }
}

/// Convert a winding-difference image into a coverage mask in place
pub fn winding_to_coverage(img: &mut (impl ImageMut<Pixel = Scalar> + ?Sized), fill_rule: FillRule) {
    let shape = img.shape();
    let data = img.data_mut();
    for y in 0..shape.height {
        let mut acc = 0.0;
        for x in 0..shape.width {
            let offset = shape.offset(y, x);
            acc += data[offset];
            data[offset] = clamp(fill_rule.coverage_from_winding(acc), 0.0, 1.0);
        }
    }
}
