//! Line segments and Bezier curves
//!
//! All curves are flattened into line segments by recursive midpoint
//! subdivision before rasterization. The subdivision stops once the maximum
//! deviation of the curve from its chord falls below the requested flatness,
//! or once the depth limit is reached, so degenerate input always terminates.
use crate::{
    utils::{quadratic_solve, ArrayIter},
    BBox, Point, Scalar, Transform, EPSILON, PI,
};
use std::fmt;

/// Subdivision depth limit for curve flattening
const MAX_FLATTEN_DEPTH: u8 = 16;

/// Line segment curve
#[derive(Clone, Copy, PartialEq)]
pub struct Line(pub [Point; 2]);

impl Line {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into()])
    }

    /// Length of the line
    pub fn length(&self) -> Scalar {
        let Self([p0, p1]) = self;
        p0.dist(*p1)
    }

    /// Start and end points of the line
    pub fn points(&self) -> [Point; 2] {
        self.0
    }

    /// Direction vector associated with the line segment
    pub fn direction(&self) -> Point {
        self.end() - self.start()
    }

    pub fn start(&self) -> Point {
        self.0[0]
    }

    pub fn end(&self) -> Point {
        self.0[1]
    }

    /// Parametric representation of the line at `t`
    pub fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1]) = self;
        (1.0 - t) * *p0 + t * *p1
    }

    pub fn transform(&self, tr: Transform) -> Self {
        let Self([p0, p1]) = self;
        Self([tr.apply(*p0), tr.apply(*p1)])
    }

    pub fn reverse(&self) -> Self {
        let Self([p0, p1]) = *self;
        Self([p1, p0])
    }

    pub fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1]) = *self;
        BBox::new(p0, p1).union_opt(init)
    }

    /// Find intersection of two infinite lines
    ///
    /// Returns pair of parametric `t` parameters for this line and the other,
    /// found by solving `self.at(t0) == other.at(t1)`. Intersection of the
    /// actual segments additionally requires both parameters in [0, 1].
    pub fn intersect(&self, other: Line) -> Option<(Scalar, Scalar)> {
        let Line([Point([x1, y1]), Point([x2, y2])]) = *self;
        let Line([Point([x3, y3]), Point([x4, y4])]) = other;
        let det = (x4 - x3) * (y1 - y2) - (x1 - x2) * (y4 - y3);
        if det.abs() < EPSILON {
            return None;
        }
        let t0 = ((y3 - y4) * (x1 - x3) + (x4 - x3) * (y1 - y3)) / det;
        let t1 = ((y1 - y2) * (x1 - x3) + (x2 - x1) * (y1 - y3)) / det;
        Some((t0, t1))
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Line([p0, p1]) = self;
        write!(f, "Line {:?} {:?}", p0, p1)
    }
}

/// Offset line to the distance along its normal
pub(crate) fn line_offset(line: Line, dist: Scalar) -> Option<Line> {
    let Line([p0, p1]) = line;
    let offset = dist * (p1 - p0).normal().normalize()?;
    Some(Line::new(p0 + offset, p1 + offset))
}

/// Quadratic bezier curve
///
/// Polynomial form:
/// `(1 - t)^2 * p0 + 2 * (1 - t) * t * p1 + t^2 * p2`
#[derive(Clone, Copy, PartialEq)]
pub struct Quad(pub [Point; 3]);

impl Quad {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into(), p2.into()])
    }

    pub fn points(&self) -> [Point; 3] {
        self.0
    }

    pub fn start(&self) -> Point {
        self.0[0]
    }

    pub fn end(&self) -> Point {
        self.0[2]
    }

    pub fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2]) = self;
        let (t1, t_1) = (t, 1.0 - t);
        t_1 * t_1 * *p0 + 2.0 * t1 * t_1 * *p1 + t1 * t1 * *p2
    }

    pub fn transform(&self, tr: Transform) -> Self {
        let Self([p0, p1, p2]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2)])
    }

    pub fn reverse(&self) -> Self {
        let Self([p0, p1, p2]) = *self;
        Self([p2, p1, p0])
    }

    /// Flatness criterion for the quadratic curve
    ///
    /// Maximum deviation from the chord is `|2 * p1 - p0 - p2| / 4`
    /// (reached at t = 1/2), so the returned squared norm is comparable
    /// against `16 * flatness^2`.
    pub(crate) fn flatness(&self) -> Scalar {
        let Self([p0, p1, p2]) = *self;
        let Point([x, y]) = 2.0 * p1 - p0 - p2;
        x * x + y * y
    }

    /// Optimized version of `split_at(0.5)`
    pub fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2]) = *self;
        let mid = 0.25 * (p0 + 2.0 * p1 + p2);
        (
            Self([p0, 0.5 * (p0 + p1), mid]),
            Self([mid, 0.5 * (p1 + p2), p2]),
        )
    }

    /// Split curve at parametric value `t`
    pub fn split_at(&self, t: Scalar) -> (Self, Self) {
        let Self([p0, p1, p2]) = *self;
        let (t1, t_1) = (t, 1.0 - t);
        let mid = self.at(t);
        (
            Self([p0, t_1 * p0 + t1 * p1, mid]),
            Self([mid, t_1 * p1 + t1 * p2, p2]),
        )
    }

    pub fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1, p2]) = self;
        let mut bbox = BBox::new(*p0, *p2).union_opt(init);
        if bbox.contains(*p1) {
            return bbox;
        }
        // curve'(t) = 2 * ((p2 - 2 p1 + p0) * t + (p1 - p0))
        let Point([a0, a1]) = *p2 - 2.0 * *p1 + *p0;
        let Point([b0, b1]) = *p1 - *p0;
        for (a, b) in [(a0, b0), (a1, b1)] {
            if a.abs() > EPSILON {
                let t = -b / a;
                if (0.0..=1.0).contains(&t) {
                    bbox = bbox.extend(self.at(t));
                }
            }
        }
        bbox
    }
}

impl fmt::Debug for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Quad([p0, p1, p2]) = self;
        write!(f, "Quad {:?} {:?} {:?}", p0, p1, p2)
    }
}

/// Cubic bezier curve
///
/// Polynomial form:
/// `(1 - t)^3 * p0 + 3 * (1 - t)^2 * t * p1 + 3 * (1 - t) * t^2 * p2 + t^3 * p3`
#[derive(Clone, Copy, PartialEq)]
pub struct Cubic(pub [Point; 4]);

impl Cubic {
    pub fn new(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Self {
        Self([p0.into(), p1.into(), p2.into(), p3.into()])
    }

    pub fn points(&self) -> [Point; 4] {
        self.0
    }

    pub fn start(&self) -> Point {
        self.0[0]
    }

    pub fn end(&self) -> Point {
        self.0[3]
    }

    pub fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2, p3]) = self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let (t3, t_3) = (t2 * t1, t_2 * t_1);
        t_3 * *p0 + 3.0 * t1 * t_2 * *p1 + 3.0 * t2 * t_1 * *p2 + t3 * *p3
    }

    pub fn transform(&self, tr: Transform) -> Self {
        let Self([p0, p1, p2, p3]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2), tr.apply(*p3)])
    }

    pub fn reverse(&self) -> Self {
        let Self([p0, p1, p2, p3]) = *self;
        Self([p3, p2, p1, p0])
    }

    /// Flatness criterion for the cubic curve
    ///
    /// Upper bound on the squared distance between the curve and its chord:
    /// `f^2 <= 1/16 (max{u_x^2, v_x^2} + max{u_y^2, v_y^2})` where
    /// `u = 3 p1 - 2 p0 - p3` and `v = 3 p2 - p0 - 2 p3`, which bounds the
    /// deviation of both control points from the chord. Comparable against
    /// `16 * flatness^2`.
    ///
    /// [Linear Approximation of Bezier Curve](https://hcklbrrfnn.files.wordpress.com/2012/08/bez.pdf)
    pub(crate) fn flatness(&self) -> Scalar {
        let Self([p0, p1, p2, p3]) = *self;
        let u = 3.0 * p1 - 2.0 * p0 - p3;
        let v = 3.0 * p2 - p0 - 2.0 * p3;
        (u.x() * u.x()).max(v.x() * v.x()) + (u.y() * u.y()).max(v.y() * v.y())
    }

    /// Optimized version of `split_at(0.5)`
    pub fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2, p3]) = *self;
        let mid = 0.125 * p0 + 0.375 * p1 + 0.375 * p2 + 0.125 * p3;
        let c0 = Self([
            p0,
            0.5 * p0 + 0.5 * p1,
            0.25 * p0 + 0.5 * p1 + 0.25 * p2,
            mid,
        ]);
        let c1 = Self([
            mid,
            0.25 * p1 + 0.5 * p2 + 0.25 * p3,
            0.5 * p2 + 0.5 * p3,
            p3,
        ]);
        (c0, c1)
    }

    /// Split curve at parametric value `t`
    pub fn split_at(&self, t: Scalar) -> (Self, Self) {
        let Self([p0, p1, p2, p3]) = *self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let mid = self.at(t);
        let c0 = Self([
            p0,
            t_1 * p0 + t1 * p1,
            t_2 * p0 + 2.0 * t1 * t_1 * p1 + t2 * p2,
            mid,
        ]);
        let c1 = Self([
            mid,
            t_2 * p1 + 2.0 * t1 * t_1 * p2 + t2 * p3,
            t_1 * p2 + t1 * p3,
            p3,
        ]);
        (c0, c1)
    }

    pub fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1, p2, p3]) = self;
        let bbox = BBox::new(*p0, *p3).union_opt(init);
        if bbox.contains(*p1) && bbox.contains(*p2) {
            return bbox;
        }
        // curve'(t) = 3 (a t^2 + b t + c) per component
        let Point([a0, a1]) = -1.0 * *p0 + 3.0 * *p1 - 3.0 * *p2 + 1.0 * *p3;
        let Point([b0, b1]) = 2.0 * *p0 - 4.0 * *p1 + 2.0 * *p2;
        let Point([c0, c1]) = -1.0 * *p0 + *p1;
        quadratic_solve(a0, b0, c0)
            .chain(quadratic_solve(a1, b1, c1))
            .filter(|t| (0.0..=1.0).contains(t))
            .fold(bbox, |bbox, t| bbox.extend(self.at(t)))
    }
}

impl fmt::Debug for Cubic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Cubic([p0, p1, p2, p3]) = self;
        write!(f, "Cubic {:?} {:?} {:?} {:?}", p0, p1, p2, p3)
    }
}

impl From<Quad> for Cubic {
    fn from(quad: Quad) -> Self {
        let Quad([p0, p1, p2]) = quad;
        Self([
            p0,
            (1.0 / 3.0) * p0 + (2.0 / 3.0) * p1,
            (2.0 / 3.0) * p1 + (1.0 / 3.0) * p2,
            p2,
        ])
    }
}

/// Single drawing primitive: a line segment or a Bezier curve
#[derive(Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Line),
    Quad(Quad),
    Cubic(Cubic),
}

impl Segment {
    pub fn start(&self) -> Point {
        match self {
            Segment::Line(line) => line.start(),
            Segment::Quad(quad) => quad.start(),
            Segment::Cubic(cubic) => cubic.start(),
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Segment::Line(line) => line.end(),
            Segment::Quad(quad) => quad.end(),
            Segment::Cubic(cubic) => cubic.end(),
        }
    }

    pub fn at(&self, t: Scalar) -> Point {
        match self {
            Segment::Line(line) => line.at(t),
            Segment::Quad(quad) => quad.at(t),
            Segment::Cubic(cubic) => cubic.at(t),
        }
    }

    pub fn transform(&self, tr: Transform) -> Self {
        match self {
            Segment::Line(line) => line.transform(tr).into(),
            Segment::Quad(quad) => quad.transform(tr).into(),
            Segment::Cubic(cubic) => cubic.transform(tr).into(),
        }
    }

    pub fn reverse(&self) -> Self {
        match self {
            Segment::Line(line) => line.reverse().into(),
            Segment::Quad(quad) => quad.reverse().into(),
            Segment::Cubic(cubic) => cubic.reverse().into(),
        }
    }

    pub fn bbox(&self, init: Option<BBox>) -> BBox {
        match self {
            Segment::Line(line) => line.bbox(init),
            Segment::Quad(quad) => quad.bbox(init),
            Segment::Cubic(cubic) => cubic.bbox(init),
        }
    }

    pub(crate) fn flatness(&self) -> Scalar {
        match self {
            Segment::Line(_) => 0.0,
            Segment::Quad(quad) => quad.flatness(),
            Segment::Cubic(cubic) => cubic.flatness(),
        }
    }

    pub(crate) fn split(&self) -> (Self, Self) {
        match self {
            Segment::Line(line) => {
                let mid = line.at(0.5);
                (
                    Line::new(line.start(), mid).into(),
                    Line::new(mid, line.end()).into(),
                )
            }
            Segment::Quad(quad) => {
                let (q0, q1) = quad.split();
                (q0.into(), q1.into())
            }
            Segment::Cubic(cubic) => {
                let (c0, c1) = cubic.split();
                (c0.into(), c1.into())
            }
        }
    }

    /// Convert segment to an iterator over line segments with desired flatness
    pub fn flatten(&self, tr: Transform, flatness: Scalar) -> SegmentFlattenIter {
        SegmentFlattenIter::new(self.transform(tr), flatness)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Line(line) => line.fmt(f),
            Segment::Quad(quad) => quad.fmt(f),
            Segment::Cubic(cubic) => cubic.fmt(f),
        }
    }
}

impl From<Line> for Segment {
    fn from(line: Line) -> Self {
        Segment::Line(line)
    }
}

impl From<Quad> for Segment {
    fn from(quad: Quad) -> Self {
        Segment::Quad(quad)
    }
}

impl From<Cubic> for Segment {
    fn from(cubic: Cubic) -> Self {
        Segment::Cubic(cubic)
    }
}

/// Iterator over line segments approximating a curve
///
/// Keeps an explicit stack of pending sub-curves together with their
/// subdivision depth, which bounds recursion on degenerate input.
pub struct SegmentFlattenIter {
    flatness: Scalar,
    stack: Vec<(Segment, u8)>,
}

impl SegmentFlattenIter {
    pub(crate) fn new(segment: Segment, flatness: Scalar) -> Self {
        Self {
            flatness: 16.0 * flatness * flatness,
            stack: vec![(segment, 0)],
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            flatness: 0.0,
            stack: Vec::new(),
        }
    }
}

impl Iterator for SegmentFlattenIter {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (segment, depth) = self.stack.pop()?;
            if segment.flatness() <= self.flatness || depth >= MAX_FLATTEN_DEPTH {
                let line = Line::new(segment.start(), segment.end());
                if line.length() > EPSILON {
                    return Some(line);
                }
            } else {
                let (s0, s1) = segment.split();
                self.stack.push((s1, depth + 1));
                self.stack.push((s0, depth + 1));
            }
        }
    }
}

/// Approximate a circular arc with a sequence of cubic bezier curves
///
/// The arc is centered at `center` with given `radius`, starts at angle
/// `start` and covers `sweep` radians (positive sweep is clockwise in a
/// y-down frame). Arc is split into slices not exceeding `pi / 2`, each
/// approximated with the standard tangent-handle construction
/// `alpha = 4/3 * tan(delta / 4)`.
pub fn arc_to_cubics(
    center: Point,
    radius: Scalar,
    start: Scalar,
    sweep: Scalar,
) -> ArrayIter<Cubic, 8> {
    let mut result = ArrayIter::new();
    if radius < EPSILON || sweep.abs() < EPSILON {
        return result;
    }
    let sweep = crate::utils::clamp(sweep, -2.0 * PI, 2.0 * PI);
    let count = (sweep.abs() / (PI / 2.0)).ceil().max(1.0);
    let delta = sweep / count;
    let alpha = 4.0 / 3.0 * (delta / 4.0).tan();
    let at = |angle: Scalar| -> (Point, Point) {
        let (sin, cos) = angle.sin_cos();
        (
            center + Point::new(radius * cos, radius * sin),
            Point::new(-radius * sin, radius * cos),
        )
    };
    for index in 0..count as usize {
        let a0 = start + delta * index as Scalar;
        let a1 = a0 + delta;
        let (p0, d0) = at(a0);
        let (p3, d3) = at(a1);
        result.push(Cubic::new(p0, p0 + alpha * d0, p3 - alpha * d3, p3));
    }
    result
}
