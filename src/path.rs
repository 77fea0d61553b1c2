//! Paths: ordered collections of drawing primitives
use crate::{
    curve::Segment, BBox, Cubic, Line, Point, Quad, Scalar, SegmentFlattenIter, Transform, EPSILON,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// The algorithm used to determine the inside part of a shape when filling it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FillRule {
    /// Fill area with non-zero winding number
    #[default]
    NonZero,
    /// Fill area with odd winding number
    EvenOdd,
}

impl FillRule {
    /// Convert accumulated winding number into coverage in [0, 1]
    pub fn coverage_from_winding(&self, winding: Scalar) -> Scalar {
        match self {
            FillRule::EvenOdd => ((winding + 1.0).rem_euclid(2.0) - 1.0).abs(),
            FillRule::NonZero => {
                let value = winding.abs();
                if value >= 1.0 {
                    1.0
                } else if value < 1e-6 {
                    0.0
                } else {
                    value
                }
            }
        }
    }
}

/// Non-empty sequence of segments where the end of each segment coincides
/// with the start of the next one
#[derive(Clone, PartialEq)]
pub struct SubPath {
    segments: Vec<Segment>,
    /// Whether there is an implicit line segment connecting start and end
    closed: bool,
}

impl fmt::Debug for SubPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.segments.iter() {
            writeln!(f, "{:?}", segment)?;
        }
        if self.closed {
            writeln!(f, "Close")
        } else {
            writeln!(f, "End")
        }
    }
}

impl SubPath {
    pub fn new(segments: Vec<Segment>, closed: bool) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments, closed })
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// First segment in the sub-path
    pub fn first(&self) -> Segment {
        *self.segments.first().expect("SubPath is never empty")
    }

    /// Last segment in the sub-path
    pub fn last(&self) -> Segment {
        *self.segments.last().expect("SubPath is never empty")
    }

    /// Start point of the sub-path
    pub fn start(&self) -> Point {
        self.first().start()
    }

    /// End point of the sub-path
    pub fn end(&self) -> Point {
        self.last().end()
    }

    /// Apply transformation to the sub-path in place
    pub fn transform(&mut self, tr: Transform) {
        for segment in self.segments.iter_mut() {
            *segment = segment.transform(tr);
        }
    }

    /// Bounding box of the sub-path
    pub fn bbox(&self, init: Option<BBox>, tr: Transform) -> BBox {
        self.segments
            .iter()
            .fold(init, |bbox, seg| Some(seg.transform(tr).bbox(bbox)))
            .expect("SubPath is never empty")
    }

    /// Create new sub-path with reversed direction
    pub fn reverse(&self) -> Self {
        Self {
            segments: self.segments.iter().rev().map(|s| s.reverse()).collect(),
            closed: self.closed,
        }
    }

    /// Convert sub-path to an iterator over line segments
    ///
    /// The implicit closing line is produced when the sub-path is closed or
    /// `close` is requested.
    pub fn flatten(
        &self,
        tr: Transform,
        flatness: Scalar,
        close: bool,
    ) -> impl Iterator<Item = Line> + '_ {
        let last = if self.closed || close {
            let line = Line::new(self.end(), self.start()).transform(tr);
            (line.length() > EPSILON).then_some(line)
        } else {
            None
        };
        self.segments
            .iter()
            .flat_map(move |segment| segment.flatten(tr, flatness))
            .chain(last)
    }
}

/// Collection of sub-paths treated as a single shape
#[derive(Clone, PartialEq, Default)]
pub struct Path {
    subpaths: Vec<SubPath>,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subpaths.is_empty() {
            write!(f, "Empty")?;
        }
        for subpath in self.subpaths.iter() {
            subpath.fmt(f)?;
        }
        Ok(())
    }
}

impl Path {
    /// Create path from a list of sub-paths
    pub fn new(subpaths: Vec<SubPath>) -> Self {
        Self { subpaths }
    }

    /// Create empty path
    pub fn empty() -> Self {
        Self {
            subpaths: Default::default(),
        }
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    /// List of sub-paths
    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    /// Convenience method to create [`PathBuilder`]
    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    /// Apply transformation to the path in place
    pub fn transform(&mut self, tr: Transform) {
        for subpath in self.subpaths.iter_mut() {
            subpath.transform(tr);
        }
    }

    /// Number of segments in the path
    pub fn segments_count(&self) -> usize {
        self.subpaths
            .iter()
            .fold(0usize, |acc, subpath| acc + subpath.segments().len())
    }

    /// Convert path to an iterator over line segments
    pub fn flatten(
        &self,
        tr: Transform,
        flatness: Scalar,
        close: bool,
    ) -> PathFlattenIter<'_> {
        PathFlattenIter::new(self, tr, flatness, close)
    }

    /// Bounding box of the path after provided transformation is applied
    pub fn bbox(&self, tr: Transform) -> Option<BBox> {
        self.subpaths
            .iter()
            .fold(None, |bbox, subpath| Some(subpath.bbox(bbox, tr)))
    }

    /// Reverse order and direction of all segments
    pub fn reverse(&self) -> Self {
        Self {
            subpaths: self.subpaths.iter().map(|s| s.reverse()).collect(),
        }
    }

    /// Single line segment from `p0` to `p1`
    pub fn line(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        let mut builder = Path::builder();
        builder.move_to(p0).line_to(p1);
        builder.build()
    }

    /// Axis-aligned rectangle spanning corners `p0` and `p1`
    pub fn rectangle(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        let bbox = BBox::new(p0, p1);
        let Point([x0, y0]) = bbox.min();
        let Point([x1, y1]) = bbox.max();
        let mut builder = Path::builder();
        builder
            .move_to((x0, y0))
            .line_to((x1, y0))
            .line_to((x1, y1))
            .line_to((x0, y1))
            .close();
        builder.build()
    }

    /// Axis-aligned rectangle with elliptic corners of radii `radii`
    pub fn rounded_rectangle(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        radii: impl Into<Point>,
    ) -> Self {
        // quarter ellipse handle, (4/3) * tan(pi / 8)
        const K: Scalar = 0.5522847498307935;
        let bbox = BBox::new(p0, p1);
        let Point([x0, y0]) = bbox.min();
        let Point([x1, y1]) = bbox.max();
        let Point([rx, ry]) = radii.into();
        let rx = rx.abs().min(bbox.width() / 2.0);
        let ry = ry.abs().min(bbox.height() / 2.0);
        if rx < EPSILON || ry < EPSILON {
            return Self::rectangle((x0, y0), (x1, y1));
        }
        let (hx, hy) = (K * rx, K * ry);
        let mut builder = Path::builder();
        builder
            .move_to((x0 + rx, y0))
            .line_to((x1 - rx, y0))
            .cubic_to((x1 - rx + hx, y0), (x1, y0 + ry - hy), (x1, y0 + ry))
            .line_to((x1, y1 - ry))
            .cubic_to((x1, y1 - ry + hy), (x1 - rx + hx, y1), (x1 - rx, y1))
            .line_to((x0 + rx, y1))
            .cubic_to((x0 + rx - hx, y1), (x0, y1 - ry + hy), (x0, y1 - ry))
            .line_to((x0, y0 + ry))
            .cubic_to((x0, y0 + ry - hy), (x0 + rx - hx, y0), (x0 + rx, y0))
            .close();
        builder.build()
    }

    /// Circle centered at `center` with the provided `radius`
    pub fn circle(center: impl Into<Point>, radius: Scalar) -> Self {
        let center = center.into();
        Self::ellipse(center, Point::new(radius, radius))
    }

    /// Axis-aligned ellipse centered at `center` with radii `radii`
    pub fn ellipse(center: impl Into<Point>, radii: impl Into<Point>) -> Self {
        const K: Scalar = 0.5522847498307935;
        let center = center.into();
        let Point([rx, ry]) = radii.into();
        let (rx, ry) = (rx.abs(), ry.abs());
        if rx < EPSILON || ry < EPSILON {
            return Self::empty();
        }
        let (hx, hy) = (K * rx, K * ry);
        let Point([cx, cy]) = center;
        let mut builder = Path::builder();
        builder
            .move_to((cx + rx, cy))
            .cubic_to((cx + rx, cy + hy), (cx + hx, cy + ry), (cx, cy + ry))
            .cubic_to((cx - hx, cy + ry), (cx - rx, cy + hy), (cx - rx, cy))
            .cubic_to((cx - rx, cy - hy), (cx - hx, cy - ry), (cx, cy - ry))
            .cubic_to((cx + hx, cy - ry), (cx + rx, cy - hy), (cx + rx, cy))
            .close();
        builder.build()
    }

    /// Open polyline through the provided points
    ///
    /// Fewer than two distinct points produce an empty path.
    pub fn polyline<P: Into<Point>>(points: impl IntoIterator<Item = P>) -> Self {
        let mut builder = Path::builder();
        let mut first = true;
        for point in points {
            if first {
                builder.move_to(point);
                first = false;
            } else {
                builder.line_to(point);
            }
        }
        builder.build()
    }

    /// Closed polygon through the provided points
    ///
    /// Fewer than three distinct points produce an empty path.
    pub fn polygon<P: Into<Point>>(points: impl IntoIterator<Item = P>) -> Self {
        let points: Vec<Point> = points.into_iter().map(Into::into).collect();
        let mut distinct: Vec<Point> = Vec::with_capacity(points.len());
        for point in points {
            if distinct.last().map_or(true, |last| !last.is_close_to(point)) {
                distinct.push(point);
            }
        }
        if distinct.len() < 3 {
            return Self::empty();
        }
        let mut builder = Path::builder();
        let mut iter = distinct.into_iter();
        builder.move_to(iter.next().expect("checked above"));
        for point in iter {
            builder.line_to(point);
        }
        builder.close();
        builder.build()
    }
}

impl IntoIterator for Path {
    type Item = SubPath;
    type IntoIter = <Vec<SubPath> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.subpaths.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a SubPath;
    type IntoIter = <&'a Vec<SubPath> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.subpaths.iter()
    }
}

impl Extend<SubPath> for Path {
    fn extend<T: IntoIterator<Item = SubPath>>(&mut self, iter: T) {
        self.subpaths.extend(iter)
    }
}

/// Iterator over line segments approximating the whole path
pub struct PathFlattenIter<'a> {
    path: &'a Path,
    transform: Transform,
    flatness: Scalar,
    close: bool,
    subpath_index: usize,
    segment_index: usize,
    segment: SegmentFlattenIter,
}

impl<'a> PathFlattenIter<'a> {
    fn new(path: &'a Path, transform: Transform, flatness: Scalar, close: bool) -> Self {
        Self {
            path,
            transform,
            flatness,
            close,
            subpath_index: 0,
            segment_index: 0,
            segment: SegmentFlattenIter::empty(),
        }
    }
}

impl<'a> Iterator for PathFlattenIter<'a> {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.segment.next() {
                return Some(line);
            }
            let subpath = self.path.subpaths.get(self.subpath_index)?;
            match subpath.segments().get(self.segment_index) {
                None => {
                    self.subpath_index += 1;
                    self.segment_index = 0;
                    if subpath.is_closed() || self.close {
                        let line =
                            Line::new(subpath.end(), subpath.start()).transform(self.transform);
                        if line.length() > EPSILON {
                            return Some(line);
                        }
                    }
                }
                Some(segment) => {
                    self.segment_index += 1;
                    self.segment = segment.flatten(self.transform, self.flatness);
                }
            }
        }
    }
}

/// Path builder similar to Canvas/Cairo interface
#[derive(Clone)]
pub struct PathBuilder {
    position: Point,
    subpath: Vec<Segment>,
    subpaths: Vec<SubPath>,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            position: Point::new(0.0, 0.0),
            subpath: Default::default(),
            subpaths: Default::default(),
        }
    }

    /// Build path
    pub fn build(&mut self) -> Path {
        let PathBuilder {
            subpath,
            mut subpaths,
            ..
        } = std::mem::take(self);
        subpaths.extend(SubPath::new(subpath, false));
        Path::new(subpaths)
    }

    /// Move current position, ending the current subpath
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let subpath = std::mem::take(&mut self.subpath);
        self.subpaths.extend(SubPath::new(subpath, false));
        self.position = p.into();
        self
    }

    /// Close current subpath
    pub fn close(&mut self) -> &mut Self {
        let subpath = std::mem::take(&mut self.subpath);
        if let Some(seg) = subpath.first() {
            self.position = seg.start();
        }
        self.subpaths.extend(SubPath::new(subpath, true));
        self
    }

    /// Add line from the current position to the specified point
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        if !self.position.is_close_to(p) {
            let line = Line::new(self.position, p);
            self.position = line.end();
            self.subpath.push(line.into());
        }
        self
    }

    /// Add quadratic bezier curve
    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        let quad = Quad::new(self.position, p1, p2);
        self.position = quad.end();
        self.subpath.push(quad.into());
        self
    }

    /// Add cubic bezier curve
    pub fn cubic_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        let cubic = Cubic::new(self.position, p1, p2, p3);
        self.position = cubic.end();
        self.subpath.push(cubic.into());
        self
    }

    /// Current position of the builder
    pub fn position(&self) -> Point {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, DEFAULT_FLATNESS};

    #[test]
    fn test_builder() {
        let path = {
            let mut builder = Path::builder();
            builder
                .move_to((1.0, 1.0))
                .line_to((4.0, 1.0))
                .line_to((4.0, 3.0))
                .close()
                .move_to((5.0, 5.0))
                .quad_to((6.0, 6.0), (7.0, 5.0));
            builder.build()
        };
        assert_eq!(path.subpaths().len(), 2);
        assert!(path.subpaths()[0].is_closed());
        assert!(!path.subpaths()[1].is_closed());
        assert_eq!(path.segments_count(), 3);

        // duplicate points do not create zero length lines
        let path = {
            let mut builder = Path::builder();
            builder.move_to((1.0, 1.0)).line_to((1.0, 1.0));
            builder.build()
        };
        assert!(path.is_empty());
    }

    #[test]
    fn test_bbox() {
        let path = Path::circle((5.0, 5.0), 4.0);
        let bbox = path.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox.x(), 1.0, 1e-9);
        assert_approx_eq!(bbox.y(), 1.0, 1e-9);
        assert_approx_eq!(bbox.width(), 8.0, 1e-9);
        assert_approx_eq!(bbox.height(), 8.0, 1e-9);
    }

    #[test]
    fn test_flatten_connected() {
        let path = Path::circle((5.0, 5.0), 4.0);
        let lines: Vec<_> = path
            .flatten(Transform::identity(), DEFAULT_FLATNESS, true)
            .collect();
        assert!(!lines.is_empty());
        for pair in lines.windows(2) {
            assert!(pair[0].end().is_close_to(pair[1].start()));
        }
        // closed contour ends where it starts
        assert!(lines
            .last()
            .unwrap()
            .end()
            .is_close_to(lines.first().unwrap().start()));
    }

    #[test]
    fn test_shapes() {
        // polygon with too few points is empty
        assert!(Path::polygon([(0.0, 0.0), (1.0, 1.0)]).is_empty());
        assert!(Path::polyline([(0.0, 0.0)]).is_empty());

        let rect = Path::rectangle((0.0, 0.0), (4.0, 2.0));
        assert_eq!(rect.segments_count(), 3); // closing line is implicit
        assert!(rect.subpaths()[0].is_closed());

        let poly = Path::polygon([(0.0, 0.0), (4.0, 0.0), (2.0, 3.0)]);
        assert_eq!(poly.subpaths().len(), 1);
        assert!(poly.subpaths()[0].is_closed());

        // rounded rectangle degenerates to a rectangle with zero radii
        let rrect = Path::rounded_rectangle((0.0, 0.0), (4.0, 2.0), (0.0, 0.0));
        assert_eq!(rrect.segments_count(), 3);

        // ellipse with a zero radius is empty
        assert!(Path::ellipse((0.0, 0.0), (0.0, 2.0)).is_empty());
    }

    #[test]
    fn test_fill_rule() {
        assert_approx_eq!(FillRule::NonZero.coverage_from_winding(0.0), 0.0);
        assert_approx_eq!(FillRule::NonZero.coverage_from_winding(1.0), 1.0);
        assert_approx_eq!(FillRule::NonZero.coverage_from_winding(-1.0), 1.0);
        assert_approx_eq!(FillRule::NonZero.coverage_from_winding(2.5), 1.0);
        assert_approx_eq!(FillRule::NonZero.coverage_from_winding(0.25), 0.25);

        assert_approx_eq!(FillRule::EvenOdd.coverage_from_winding(0.0), 0.0);
        assert_approx_eq!(FillRule::EvenOdd.coverage_from_winding(1.0), 1.0);
        assert_approx_eq!(FillRule::EvenOdd.coverage_from_winding(2.0), 0.0);
        assert_approx_eq!(FillRule::EvenOdd.coverage_from_winding(1.5), 0.5);
        assert_approx_eq!(FillRule::EvenOdd.coverage_from_winding(-0.5), 0.5);
    }
}
