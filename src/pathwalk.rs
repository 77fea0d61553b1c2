//! Arc-length parameterization of a path
use crate::{Path, Point, Scalar, Transform, DEFAULT_FLATNESS, EPSILON};

/// Position on a path together with the local direction
#[derive(Debug, Clone, Copy)]
pub struct PathPoint {
    /// Point on the path
    pub position: Point,
    /// Unit tangent of the path at the position
    pub tangent: Point,
}

impl PathPoint {
    /// Point at perpendicular distance `offset` from the path
    ///
    /// Positive offsets go along the 90 degree rotation of the tangent.
    pub fn offset(&self, offset: Scalar) -> Point {
        self.position + offset * self.tangent.normal()
    }
}

/// Walks a path by distance along it
///
/// The path is flattened once; lookups binary-search the cumulative
/// arc-length table and interpolate linearly inside a segment.
#[derive(Debug, Clone)]
pub struct PathWalker {
    points: Vec<Point>,
    /// cumulative arc length up to each point, starts with 0
    lengths: Vec<Scalar>,
}

impl PathWalker {
    pub fn new(path: &Path, flatness: Scalar) -> Self {
        let mut points: Vec<Point> = Vec::new();
        let mut lengths: Vec<Scalar> = Vec::new();
        for line in path.flatten(Transform::identity(), flatness, false) {
            let total = lengths.last().copied().unwrap_or(0.0);
            match points.last() {
                None => {
                    points.push(line.start());
                    lengths.push(0.0);
                }
                Some(last) if !last.is_close_to(line.start()) => {
                    // jump between sub-paths consumes no arc length
                    points.push(line.start());
                    lengths.push(total);
                }
                _ => {}
            }
            let total = lengths.last().copied().unwrap_or(0.0);
            points.push(line.end());
            lengths.push(total + line.length());
        }
        Self { points, lengths }
    }

    /// Total arc length of the path
    pub fn length(&self) -> Scalar {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Position and tangent at `distance` along the path
    ///
    /// Distances outside of `[0, length]` clamp to the corresponding end,
    /// so placements slightly past the path do not vanish. Returns `None`
    /// for paths without any usable segments.
    pub fn at(&self, distance: Scalar) -> Option<PathPoint> {
        if self.points.len() < 2 {
            return None;
        }
        let distance = crate::utils::clamp(distance, 0.0, self.length());
        // first index with cumulative length above the distance
        let index = self
            .lengths
            .partition_point(|len| *len <= distance)
            .clamp(1, self.points.len() - 1);
        let p0 = self.points[index - 1];
        let p1 = self.points[index];
        let l0 = self.lengths[index - 1];
        let l1 = self.lengths[index];
        let span = l1 - l0;
        let position = if span < EPSILON {
            p0
        } else {
            p0 + ((distance - l0) / span) * (p1 - p0)
        };
        let tangent = (p1 - p0).normalize().unwrap_or(Point::new(1.0, 0.0));
        Some(PathPoint { position, tangent })
    }
}

impl From<&Path> for PathWalker {
    fn from(path: &Path) -> Self {
        Self::new(path, DEFAULT_FLATNESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_walk_polyline() {
        let path = Path::polyline([(0.0, 0.0), (4.0, 0.0), (4.0, 3.0)]);
        let walker = PathWalker::from(&path);
        assert_approx_eq!(walker.length(), 7.0);

        let p = walker.at(2.0).unwrap();
        assert!(p.position.is_close_to(Point::new(2.0, 0.0)));
        assert!(p.tangent.is_close_to(Point::new(1.0, 0.0)));

        let p = walker.at(5.0).unwrap();
        assert!(p.position.is_close_to(Point::new(4.0, 1.0)));
        assert!(p.tangent.is_close_to(Point::new(0.0, 1.0)));

        // distances clamp to the ends
        let p = walker.at(-1.0).unwrap();
        assert!(p.position.is_close_to(Point::new(0.0, 0.0)));
        let p = walker.at(100.0).unwrap();
        assert!(p.position.is_close_to(Point::new(4.0, 3.0)));
    }

    #[test]
    fn test_walk_offset() {
        let path = Path::line((0.0, 0.0), (10.0, 0.0));
        let walker = PathWalker::from(&path);
        let p = walker.at(5.0).unwrap();
        // tangent (1, 0) has normal (0, -1) in the y-down frame
        assert!(p.offset(2.0).is_close_to(Point::new(5.0, -2.0)));
        assert!(p.offset(-2.0).is_close_to(Point::new(5.0, 2.0)));
    }

    #[test]
    fn test_walk_curve_length() {
        // circle circumference comes out close to 2 pi r; the flattened
        // polyline is always slightly shorter than the true arc
        let path = Path::circle((0.0, 0.0), 10.0);
        let walker = PathWalker::from(&path);
        let length = walker.length();
        assert!(length <= 2.0 * crate::PI * 10.0 + 1e-6);
        assert_approx_eq!(length, 2.0 * crate::PI * 10.0, 1.0);
    }

    #[test]
    fn test_walk_empty() {
        assert!(PathWalker::from(&Path::empty()).at(0.0).is_none());
        assert_approx_eq!(PathWalker::from(&Path::empty()).length(), 0.0);
    }
}
