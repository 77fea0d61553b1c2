//! Stroke to fill conversion
//!
//! Stroking widens a path into a closed outline which is then filled with
//! the non-zero rule. Curves are flattened first, the resulting polyline is
//! offset to both sides by half the stroke width, vertices are resolved by
//! the join rule and open ends are closed by caps. Dashing splits the path
//! into "on" runs by arc length before any widening happens.
use crate::{
    curve::{arc_to_cubics, line_offset},
    Line, Path, Point, Scalar, Segment, SubPath, Transform, DEFAULT_FLATNESS, EPSILON, PI,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shape used at the corners of a stroked path
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineJoin {
    /// Extend outer edges until they intersect, as long as the miter length
    /// does not exceed `limit` half stroke widths; falls back to bevel
    Miter(Scalar),
    /// Connect edges with a straight line
    Bevel,
    /// Connect edges with a circular arc centered on the join point
    Round,
}

impl Default for LineJoin {
    fn default() -> Self {
        Self::Miter(4.0)
    }
}

/// Shape used at the ends of an open stroked sub-path
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineCap {
    /// Flat cap extended the given distance past the endpoint
    /// (`Flat(0.0)` is the classic butt cap)
    Flat(Scalar),
    /// Semi-circular cap centered on the endpoint
    Round,
}

impl Default for LineCap {
    fn default() -> Self {
        Self::Flat(0.0)
    }
}

/// Style used to generate a stroke
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrokeStyle {
    /// Width of the stroke
    pub width: Scalar,
    /// How to join offset segments at vertices
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "crate::utils::is_default")
    )]
    pub line_join: LineJoin,
    /// How to close offset sides at the ends of open sub-paths
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "crate::utils::is_default")
    )]
    pub line_cap: LineCap,
}

impl StrokeStyle {
    pub fn new(width: Scalar) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    pub fn with_line_join(self, line_join: LineJoin) -> Self {
        Self { line_join, ..self }
    }

    pub fn with_line_cap(self, line_cap: LineCap) -> Self {
        Self { line_cap, ..self }
    }
}

/// Dash pattern with a starting offset
///
/// Pattern entries alternate between "on" and "off" run lengths, starting
/// with "on", and repeat cyclically. Negative offsets wrap around the
/// pattern length. An empty or degenerate pattern means a solid stroke.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DashPattern {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "crate::utils::is_default")
    )]
    pub offset: Scalar,
    pub pattern: Vec<Scalar>,
}

impl DashPattern {
    pub fn new(pattern: Vec<Scalar>, offset: Scalar) -> Self {
        Self { offset, pattern }
    }

    /// Total length of one pattern period
    pub fn period(&self) -> Scalar {
        self.pattern.iter().filter(|len| **len > 0.0).sum()
    }

    /// Whether the pattern produces a solid stroke
    pub fn is_solid(&self) -> bool {
        self.pattern.is_empty() || self.period() <= EPSILON
    }
}

impl Path {
    /// Convert the path into a closed outline tracing its stroke
    ///
    /// The outline is intended to be filled with [`crate::FillRule::NonZero`].
    /// Strokes of non-positive width and sub-paths with fewer than two
    /// distinct points produce nothing.
    pub fn stroke(&self, style: StrokeStyle) -> Path {
        let mut subpaths = Vec::new();
        if style.width > EPSILON {
            for subpath in self.subpaths() {
                let closed = subpath.is_closed();
                let points = collect_polyline(
                    subpath.flatten(Transform::identity(), DEFAULT_FLATNESS, false),
                    closed,
                );
                stroke_polyline(&points, closed, style, &mut subpaths);
            }
        }
        Path::new(subpaths)
    }

    /// Split the path into "on" runs of the dash pattern
    ///
    /// Walks each sub-path by arc length through the cyclic pattern starting
    /// `offset` units into it. Every "on" run becomes a separate open path.
    /// A solid pattern returns the path itself as the single run.
    pub fn dash(&self, dash: &DashPattern) -> Vec<Path> {
        if dash.is_solid() {
            return vec![self.clone()];
        }
        let mut runs = Vec::new();
        for subpath in self.subpaths() {
            let closed = subpath.is_closed();
            let points = collect_polyline(
                subpath.flatten(Transform::identity(), DEFAULT_FLATNESS, false),
                closed,
            );
            dash_polyline(&points, closed, dash, &mut runs);
        }
        runs.into_iter().map(Path::polyline).collect()
    }
}

/// Collect flattened lines into a deduplicated polyline point list
fn collect_polyline(lines: impl Iterator<Item = Line>, closed: bool) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::new();
    for line in lines {
        if points.is_empty() {
            points.push(line.start());
        }
        if points.last().map_or(true, |last| !last.is_close_to(line.end())) {
            points.push(line.end());
        }
    }
    // a closed contour keeps the seam implicit
    if closed && points.len() > 1 {
        if points[0].is_close_to(points[points.len() - 1]) {
            points.pop();
        }
    }
    points
}

/// Produce stroke outline sub-paths for a single polyline
fn stroke_polyline(points: &[Point], closed: bool, style: StrokeStyle, out: &mut Vec<SubPath>) {
    if points.len() < 2 {
        return;
    }
    let dist = style.width / 2.0;
    if closed && points.len() > 2 {
        // two concentric rings traced in opposite directions
        let mut outer = Vec::new();
        offset_side(points, true, dist, style, &mut outer);
        out.extend(SubPath::new(outer, true));

        let reversed: Vec<Point> = points.iter().rev().copied().collect();
        let mut inner = Vec::new();
        offset_side(&reversed, true, dist, style, &mut inner);
        out.extend(SubPath::new(inner, true));
    } else {
        // single outline: forward side, end cap, backward side, start cap
        let mut outline = Vec::new();
        offset_side(points, false, dist, style, &mut outline);
        let (first, last) = match (outline.first(), outline.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return,
        };

        let reversed: Vec<Point> = points.iter().rev().copied().collect();
        let mut backward = Vec::new();
        offset_side(&reversed, false, dist, style, &mut backward);
        let (back_first, back_last) = match (backward.first(), backward.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return,
        };

        let end_dir = points[points.len() - 1] - points[points.len() - 2];
        cap_segments(
            &mut outline,
            last.end(),
            back_first.start(),
            points[points.len() - 1],
            end_dir,
            style,
        );
        outline.extend(backward.iter().copied());
        let start_dir = points[0] - points[1];
        cap_segments(
            &mut outline,
            back_last.end(),
            first.start(),
            points[0],
            start_dir,
            style,
        );
        out.extend(SubPath::new(outline, true));
    }
}

/// Offset one side of the polyline, inserting joins between segments
fn offset_side(
    points: &[Point],
    closed: bool,
    dist: Scalar,
    style: StrokeStyle,
    out: &mut Vec<Segment>,
) {
    let mut base: Vec<Line> = points
        .windows(2)
        .map(|pair| Line::new(pair[0], pair[1]))
        .collect();
    if closed {
        let seam = Line::new(points[points.len() - 1], points[0]);
        if seam.length() > EPSILON {
            base.push(seam);
        }
    }
    let mut first: Option<Line> = None;
    let mut prev: Option<Line> = None;
    for line in base {
        let offset = match line_offset(line, dist) {
            Some(offset) => offset,
            None => continue,
        };
        match prev {
            Some(prev) => join_segments(out, prev, offset, line.start(), dist, style),
            None => first = Some(offset),
        }
        out.push(offset.into());
        prev = Some(offset);
    }
    if closed {
        if let (Some(prev), Some(first)) = (prev, first) {
            join_segments(out, prev, first, points[0], dist, style);
        }
    }
}

/// Connect two adjacent offset segments around their shared vertex
///
/// When the offset segments already intersect the vertex is on the inner
/// side of the turn and a bevel keeps the outline sane; the configured join
/// only applies to the outer side.
fn join_segments(
    out: &mut Vec<Segment>,
    prev: Line,
    next: Line,
    vertex: Point,
    half_width: Scalar,
    style: StrokeStyle,
) {
    let (from, to) = (prev.end(), next.start());
    if from.is_close_to(to) {
        return;
    }
    let bevel = Line::new(from, to);
    let intersection = prev.intersect(next);
    let inner = matches!(
        intersection,
        Some((t0, t1)) if (0.0..=1.0).contains(&t0) && (0.0..=1.0).contains(&t1)
    );
    match style.line_join {
        _ if inner => out.push(bevel.into()),
        LineJoin::Bevel => out.push(bevel.into()),
        LineJoin::Miter(limit) => match intersection {
            Some((t, _)) => {
                let miter = prev.at(t);
                if miter.dist(vertex) <= limit * half_width {
                    out.push(Line::new(from, miter).into());
                    out.push(Line::new(miter, to).into());
                } else {
                    out.push(bevel.into());
                }
            }
            None => out.push(bevel.into()),
        },
        LineJoin::Round => {
            let a0 = (from - vertex).angle();
            let a1 = (to - vertex).angle();
            let mut sweep = (a1 - a0).rem_euclid(2.0 * PI);
            if sweep > PI {
                sweep -= 2.0 * PI;
            }
            if (sweep.abs() - PI).abs() < 1e-9 {
                // half turn, pick the side the path turns to
                let turn = prev.direction().cross(next.direction());
                sweep = if turn >= 0.0 { PI } else { -PI };
            }
            let arcs = arc_to_cubics(vertex, half_width, a0, sweep);
            if arcs.is_empty() {
                out.push(bevel.into());
            } else {
                out.extend(arcs.map(Segment::from));
            }
        }
    }
}

/// Close the gap between the two offset sides at an open end
fn cap_segments(
    out: &mut Vec<Segment>,
    from: Point,
    to: Point,
    vertex: Point,
    direction: Point,
    style: StrokeStyle,
) {
    if from.is_close_to(to) {
        return;
    }
    match style.line_cap {
        LineCap::Flat(extend) => {
            let tangent = match direction.normalize() {
                Some(tangent) if extend > EPSILON => tangent,
                _ => {
                    out.push(Line::new(from, to).into());
                    return;
                }
            };
            let shift = extend * tangent;
            out.push(Line::new(from, from + shift).into());
            out.push(Line::new(from + shift, to + shift).into());
            out.push(Line::new(to + shift, to).into());
        }
        LineCap::Round => {
            let radius = (from - vertex).length();
            let a0 = (from - vertex).angle();
            // semicircle bulging in the direction the path leaves the vertex
            let sweep = match direction.normalize() {
                Some(tangent) => {
                    let mid = Point::new((a0 + PI / 2.0).cos(), (a0 + PI / 2.0).sin());
                    if mid.dot(tangent) >= 0.0 {
                        PI
                    } else {
                        -PI
                    }
                }
                None => PI,
            };
            let arcs = arc_to_cubics(vertex, radius, a0, sweep);
            if arcs.is_empty() {
                out.push(Line::new(from, to).into());
            } else {
                out.extend(arcs.map(Segment::from));
            }
        }
    }
}

/// Split a polyline into dash runs
fn dash_polyline(points: &[Point], closed: bool, dash: &DashPattern, out: &mut Vec<Vec<Point>>) {
    if points.len() < 2 {
        return;
    }
    let pattern: Vec<Scalar> = dash.pattern.iter().map(|len| len.max(0.0)).collect();
    let period = dash.period();

    // locate the starting entry of the cyclic pattern
    let mut phase = dash.offset.rem_euclid(period);
    let mut index = 0;
    while phase >= pattern[index] {
        phase -= pattern[index];
        index = (index + 1) % pattern.len();
    }
    let mut on = index % 2 == 0;
    let mut remaining = pattern[index] - phase;
    let started_on = on;

    let mut segments: Vec<Line> = points
        .windows(2)
        .map(|pair| Line::new(pair[0], pair[1]))
        .collect();
    if closed {
        let seam = Line::new(points[points.len() - 1], points[0]);
        if seam.length() > EPSILON {
            segments.push(seam);
        }
    }

    let first_run = out.len();
    let mut run: Vec<Point> = Vec::new();
    if on {
        run.push(points[0]);
    }
    for line in segments {
        let length = line.length();
        let mut consumed = 0.0;
        while length - consumed > EPSILON {
            let chunk = remaining.min(length - consumed);
            consumed += chunk;
            remaining -= chunk;
            let cut = line.at(consumed / length);
            if on {
                run.push(cut);
            }
            if remaining <= EPSILON {
                // advance to the next non-empty pattern entry
                loop {
                    index = (index + 1) % pattern.len();
                    on = !on;
                    remaining = pattern[index];
                    if remaining > EPSILON {
                        break;
                    }
                }
                if on {
                    run.push(cut);
                } else if run.len() > 1 {
                    out.push(std::mem::take(&mut run));
                } else {
                    run.clear();
                }
            }
        }
    }
    if on && run.len() > 1 {
        // merge the final run with the first one across the seam of a
        // closed contour, so the dash does not break at an arbitrary point
        if closed && started_on && out.len() > first_run {
            let first = out.remove(first_run);
            if run
                .last()
                .map_or(false, |last| last.is_close_to(first[0]))
            {
                run.extend(first.into_iter().skip(1));
            } else {
                run.extend(first);
            }
        }
        out.push(run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, FillRule, Transform};

    fn outline_area(path: &Path) -> Scalar {
        // shoelace over the finely flattened outline, signed by winding
        let mut area = 0.0;
        for line in path.flatten(Transform::identity(), 0.01, true) {
            area += line.start().cross(line.end());
        }
        area.abs() / 2.0
    }

    #[test]
    fn test_stroke_line() {
        let path = Path::line((1.0, 1.0), (5.0, 1.0));
        let stroke = path.stroke(StrokeStyle::new(2.0));
        assert_eq!(stroke.subpaths().len(), 1);
        assert!(stroke.subpaths()[0].is_closed());

        let bbox = stroke.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox.x(), 1.0, 1e-6);
        assert_approx_eq!(bbox.y(), 0.0, 1e-6);
        assert_approx_eq!(bbox.width(), 4.0, 1e-6);
        assert_approx_eq!(bbox.height(), 2.0, 1e-6);
        assert_approx_eq!(outline_area(&stroke), 8.0, 1e-6);
    }

    #[test]
    fn test_stroke_flat_cap_extension() {
        let path = Path::line((1.0, 1.0), (5.0, 1.0));
        let style = StrokeStyle::new(2.0).with_line_cap(LineCap::Flat(1.0));
        let bbox = path.stroke(style).bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox.x(), 0.0, 1e-6);
        assert_approx_eq!(bbox.width(), 6.0, 1e-6);
    }

    #[test]
    fn test_stroke_round_cap() {
        let path = Path::line((2.0, 2.0), (6.0, 2.0));
        let style = StrokeStyle::new(2.0).with_line_cap(LineCap::Round);
        let stroke = path.stroke(style);
        let bbox = stroke.bbox(Transform::identity()).unwrap();
        // caps extend half width past both endpoints
        assert_approx_eq!(bbox.x(), 1.0, 1e-2);
        assert_approx_eq!(bbox.width(), 6.0, 1e-2);
        // area is rectangle plus a full disk
        assert_approx_eq!(outline_area(&stroke), 8.0 + PI, 0.1);
    }

    #[test]
    fn test_stroke_closed() {
        let path = Path::rectangle((2.0, 2.0), (8.0, 8.0));
        let stroke = path.stroke(StrokeStyle::new(2.0));
        // closed shape strokes into two rings
        assert_eq!(stroke.subpaths().len(), 2);
        assert!(stroke.subpaths().iter().all(|s| s.is_closed()));
        let bbox = stroke.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox.x(), 1.0, 1e-6);
        assert_approx_eq!(bbox.width(), 8.0, 1e-6);
    }

    #[test]
    fn test_miter_fallback_to_bevel() {
        // very sharp turn exceeds the default miter limit
        let path = Path::polyline([(0.0, 0.0), (10.0, 0.0), (0.0, 0.5)]);
        let sharp = path.stroke(StrokeStyle::new(1.0));
        let bbox = sharp.bbox(Transform::identity()).unwrap();
        // bevel fallback keeps the outline close to the geometry
        assert!(bbox.max().x() < 12.0);

        // gentle turn keeps the miter
        let path = Path::polyline([(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]);
        let mitered = path.stroke(StrokeStyle::new(1.0));
        assert!(!mitered.is_empty());
    }

    #[test]
    fn test_degenerate_strokes() {
        // zero width produces nothing
        let path = Path::line((0.0, 0.0), (5.0, 0.0));
        assert!(path.stroke(StrokeStyle::new(0.0)).is_empty());

        // single point produces nothing
        let path = Path::polyline([(1.0, 1.0)]);
        assert!(path.stroke(StrokeStyle::new(2.0)).is_empty());

        // empty path produces nothing
        assert!(Path::empty().stroke(StrokeStyle::new(2.0)).is_empty());
    }

    #[test]
    fn test_dash_simple() {
        let path = Path::line((0.0, 0.0), (10.0, 0.0));
        let dash = DashPattern::new(vec![2.0, 3.0], 0.0);
        let runs = path.dash(&dash);
        assert_eq!(runs.len(), 2);
        // runs are [0, 2] and [5, 7]
        let b0 = runs[0].bbox(Transform::identity()).unwrap();
        assert_approx_eq!(b0.x(), 0.0, 1e-6);
        assert_approx_eq!(b0.width(), 2.0, 1e-6);
        let b1 = runs[1].bbox(Transform::identity()).unwrap();
        assert_approx_eq!(b1.x(), 5.0, 1e-6);
        assert_approx_eq!(b1.width(), 2.0, 1e-6);
    }

    #[test]
    fn test_dash_offset() {
        let path = Path::line((0.0, 0.0), (10.0, 0.0));
        // offset by one unit into the first "on" entry
        let dash = DashPattern::new(vec![2.0, 3.0], 1.0);
        let runs = path.dash(&dash);
        // runs are [0, 1], [4, 6] and [9, 10]
        assert_eq!(runs.len(), 3);
        let b0 = runs[0].bbox(Transform::identity()).unwrap();
        assert_approx_eq!(b0.width(), 1.0, 1e-6);

        // negative offset wraps around the period
        let wrapped = DashPattern::new(vec![2.0, 3.0], -4.0);
        let runs_wrapped = path.dash(&wrapped);
        let direct = DashPattern::new(vec![2.0, 3.0], 1.0);
        let runs_direct = path.dash(&direct);
        assert_eq!(runs_wrapped.len(), runs_direct.len());
    }

    #[test]
    fn test_dash_totality() {
        // runs of the pattern and its complement cover the whole length
        let path = Path::line((0.0, 0.0), (10.0, 0.0));
        let dash = DashPattern::new(vec![2.0, 3.0], 0.0);
        let complement = DashPattern::new(vec![3.0, 2.0], -2.0);
        let total: Scalar = path
            .dash(&dash)
            .iter()
            .chain(path.dash(&complement).iter())
            .flat_map(|run| run.flatten(Transform::identity(), DEFAULT_FLATNESS, false))
            .map(|line| line.length())
            .sum();
        assert_approx_eq!(total, 10.0, 1e-6);
    }

    #[test]
    fn test_dash_solid() {
        let path = Path::line((0.0, 0.0), (10.0, 0.0));
        let runs = path.dash(&DashPattern::new(vec![], 0.0));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].segments_count(), 1);
    }

    #[test]
    fn test_dash_closed_seam_merge() {
        let path = Path::rectangle((0.0, 0.0), (4.0, 4.0));
        let dash = DashPattern::new(vec![3.0, 1.0], 0.0);
        let runs = path.dash(&dash);
        // perimeter 16 with period 4 gives four "on" runs; the run crossing
        // the seam is merged with the first one so still four runs
        assert_eq!(runs.len(), 4);
        let total: Scalar = runs
            .iter()
            .flat_map(|run| run.flatten(Transform::identity(), DEFAULT_FLATNESS, false))
            .map(|line| line.length())
            .sum();
        assert_approx_eq!(total, 12.0, 1e-6);
    }

    #[test]
    fn test_stroke_reversal_symmetry() {
        let style = StrokeStyle::new(2.0)
            .with_line_join(LineJoin::Round)
            .with_line_cap(LineCap::Round);
        let path = Path::polyline([(1.0, 1.0), (6.0, 3.0), (9.0, 1.0)]);
        let fwd = path.stroke(style);
        let bwd = path.reverse().stroke(style);
        let b0 = fwd.bbox(Transform::identity()).unwrap();
        let b1 = bwd.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(b0.x(), b1.x(), 1e-6);
        assert_approx_eq!(b0.y(), b1.y(), 1e-6);
        assert_approx_eq!(b0.width(), b1.width(), 1e-6);
        assert_approx_eq!(b0.height(), b1.height(), 1e-6);
        assert_approx_eq!(outline_area(&fwd), outline_area(&bwd), 1e-3);
    }

    #[test]
    fn test_stroke_fill_rule() {
        // the outline is meant for the non-zero rule
        let path = Path::line((0.0, 5.0), (10.0, 5.0));
        let stroke = path.stroke(StrokeStyle::new(4.0));
        assert_eq!(FillRule::default(), FillRule::NonZero);
        assert!(!stroke.is_empty());
    }
}
