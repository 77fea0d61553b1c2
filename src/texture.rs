//! Textures: per-pixel color sources
//!
//! A texture is a small expression tree evaluated at pixel coordinates.
//! Wrapper nodes adjust the evaluation context: `WithTransform` maps the
//! lookup point, `WithSampler` selects the out-of-range policy for the
//! nearest enclosing gradient or image, and `Modulate` multiplies a base
//! texture by a single-channel mask. `Raw` is a pre-rasterized grayscale
//! image used for clip masks.
use crate::{
    utils::clamp, Color, Image, ImageOwned, LinColor, Point, Scalar, Transform, EPSILON,
};
use std::{fmt, sync::Arc};

/// Out-of-range policy for a parameter in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Sampler {
    /// Clamp to the edge value
    #[default]
    Pad,
    /// Repeat with period one
    Repeat,
    /// Bounce back and forth with period two
    Reflect,
}

impl Sampler {
    /// Map an unbounded parameter into [0, 1]
    pub fn apply(self, t: Scalar) -> Scalar {
        match self {
            Sampler::Pad => clamp(t, 0.0, 1.0),
            Sampler::Repeat => t - t.floor(),
            Sampler::Reflect => {
                let t = t.rem_euclid(2.0);
                if t > 1.0 {
                    2.0 - t
                } else {
                    t
                }
            }
        }
    }

    /// Map a texel index into [0, n)
    fn apply_index(self, index: i64, n: usize) -> usize {
        let n = n as i64;
        let wrapped = match self {
            Sampler::Pad => clamp(index, 0, n - 1),
            Sampler::Repeat => index.rem_euclid(n),
            Sampler::Reflect => {
                let m = index.rem_euclid(2 * n);
                if m < n {
                    m
                } else {
                    2 * n - 1 - m
                }
            }
        };
        wrapped as usize
    }
}

/// Single gradient stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradStop {
    pub offset: Scalar,
    pub color: LinColor,
}

impl GradStop {
    pub fn new(offset: Scalar, color: LinColor) -> Self {
        Self { offset, color }
    }
}

/// Ordered sequence of gradient stops
///
/// Lookup interpolates between the bracketing stops. Interpolation happens
/// in premultiplied sRGB; stop colors are converted once on construction
/// and the result is converted back to linear after the lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GradStops {
    stops: Vec<GradStop>,
}

impl GradStops {
    pub fn new(mut stops: Vec<GradStop>) -> Self {
        stops.sort_by(|s0, s1| {
            s0.offset
                .partial_cmp(&s1.offset)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for stop in stops.iter_mut() {
            stop.color = stop.color.into_srgb();
        }
        Self { stops }
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Color of the gradient at the normalized offset `t`
    pub fn at(&self, t: Scalar) -> LinColor {
        let color = match self.stops.as_slice() {
            [] => return LinColor::TRANSPARENT,
            [stop] => stop.color,
            stops => {
                let index = stops.partition_point(|stop| stop.offset <= t);
                if index == 0 {
                    stops[0].color
                } else if index == stops.len() {
                    stops[stops.len() - 1].color
                } else {
                    let s0 = stops[index - 1];
                    let s1 = stops[index];
                    let span = s1.offset - s0.offset;
                    if span < EPSILON {
                        s1.color
                    } else {
                        s0.color.lerp(s1.color, ((t - s0.offset) / span) as f32)
                    }
                }
            }
        };
        color.into_linear()
    }
}

impl FromIterator<(Scalar, LinColor)> for GradStops {
    fn from_iter<T: IntoIterator<Item = (Scalar, LinColor)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(offset, color)| GradStop::new(offset, color))
                .collect(),
        )
    }
}

/// Recursive per-pixel color source
#[derive(Clone)]
pub enum Texture {
    /// Single color everywhere
    Solid(LinColor),
    /// Gradient along the line from `start` to `end`
    LinearGradient {
        stops: GradStops,
        start: Point,
        end: Point,
    },
    /// Gradient along the distance from `center`, normalized by `radius`
    RadialGradient {
        stops: GradStops,
        center: Point,
        radius: Scalar,
    },
    /// Radial gradient with a displaced focal point
    RadialGradientFocus {
        stops: GradStops,
        center: Point,
        radius: Scalar,
        focus: Point,
    },
    /// Bilinearly sampled image
    Image(Arc<ImageOwned<LinColor>>),
    /// Set sampling policy for the nearest enclosing gradient or image
    WithSampler(Sampler, Arc<Texture>),
    /// Transform lookup coordinates before evaluating the inner texture
    WithTransform(Transform, Arc<Texture>),
    /// Multiply base texture channel-wise by a single-channel mask
    Modulate(Arc<Texture>, Arc<Texture>),
    /// Pre-rasterized grayscale mask, nearest-neighbor lookup
    Raw(Arc<ImageOwned<Scalar>>),
}

impl Texture {
    pub fn solid(color: LinColor) -> Self {
        Texture::Solid(color)
    }

    pub fn linear_gradient(stops: GradStops, start: Point, end: Point) -> Self {
        Texture::LinearGradient { stops, start, end }
    }

    pub fn radial_gradient(stops: GradStops, center: Point, radius: Scalar) -> Self {
        Texture::RadialGradient {
            stops,
            center,
            radius,
        }
    }

    pub fn radial_gradient_with_focus(
        stops: GradStops,
        center: Point,
        radius: Scalar,
        focus: Point,
    ) -> Self {
        Texture::RadialGradientFocus {
            stops,
            center,
            radius,
            focus,
        }
    }

    pub fn image(img: Arc<ImageOwned<LinColor>>) -> Self {
        Texture::Image(img)
    }

    pub fn with_sampler(self, sampler: Sampler) -> Self {
        Texture::WithSampler(sampler, Arc::new(self))
    }

    /// Apply texture-space transform to lookups
    pub fn with_transform(self, tr: Transform) -> Self {
        if tr.is_identity() {
            return self;
        }
        match self {
            // solid color is position independent
            solid @ Texture::Solid(_) => solid,
            Texture::WithTransform(inner_tr, inner) => {
                Texture::WithTransform(inner_tr * tr, inner)
            }
            _ => Texture::WithTransform(tr, Arc::new(self)),
        }
    }

    pub fn modulate(self, mask: Texture) -> Self {
        Texture::Modulate(Arc::new(self), Arc::new(mask))
    }

    /// Evaluate the texture at the provided pixel coordinate
    pub fn at(&self, point: Point) -> LinColor {
        self.eval(point, Sampler::default())
    }

    fn eval(&self, point: Point, sampler: Sampler) -> LinColor {
        match self {
            Texture::Solid(color) => *color,
            Texture::WithTransform(tr, inner) => inner.eval(tr.apply(point), sampler),
            Texture::WithSampler(sampler, inner) => inner.eval(point, *sampler),
            Texture::LinearGradient { stops, start, end } => {
                let dir = *end - *start;
                let len2 = dir.dot(dir);
                let t = if len2 < EPSILON {
                    1.0
                } else {
                    (point - *start).dot(dir) / len2
                };
                stops.at(sampler.apply(t))
            }
            Texture::RadialGradient {
                stops,
                center,
                radius,
            } => {
                let t = if *radius < EPSILON {
                    // degenerate gradient collapses to the last stop
                    1.0
                } else {
                    (point - *center).length() / *radius
                };
                stops.at(sampler.apply(t))
            }
            Texture::RadialGradientFocus {
                stops,
                center,
                radius,
                focus,
            } => {
                let t = focal_offset(point, *center, *radius, *focus);
                stops.at(sampler.apply(t))
            }
            Texture::Image(img) => sample_bilinear(img.as_ref(), point, sampler),
            Texture::Modulate(base, mask) => {
                base.eval(point, sampler).modulate(mask.coverage_at(point))
            }
            Texture::Raw(img) => LinColor::WHITE.modulate(sample_nearest(img.as_ref(), point)),
        }
    }

    /// Evaluate the texture as a single-channel mask value in [0, 1]
    pub fn coverage_at(&self, point: Point) -> Scalar {
        match self {
            Texture::Solid(color) => color.alpha() as Scalar,
            Texture::WithTransform(tr, inner) => inner.coverage_at(tr.apply(point)),
            Texture::Modulate(base, mask) => base.coverage_at(point) * mask.coverage_at(point),
            Texture::Raw(img) => sample_nearest(img.as_ref(), point),
            _ => self.at(point).alpha() as Scalar,
        }
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Texture::Solid(color) => write!(f, "Solid({:?})", color),
            Texture::LinearGradient { start, end, .. } => {
                write!(f, "LinearGradient {:?} -> {:?}", start, end)
            }
            Texture::RadialGradient { center, radius, .. } => {
                write!(f, "RadialGradient {:?} r={}", center, radius)
            }
            Texture::RadialGradientFocus {
                center,
                radius,
                focus,
                ..
            } => write!(
                f,
                "RadialGradientFocus {:?} r={} f={:?}",
                center, radius, focus
            ),
            Texture::Image(img) => write!(f, "Image({:?})", img.size()),
            Texture::WithSampler(sampler, inner) => {
                write!(f, "WithSampler({:?}, {:?})", sampler, inner)
            }
            Texture::WithTransform(tr, inner) => write!(f, "WithTransform({:?}, {:?})", tr, inner),
            Texture::Modulate(base, mask) => write!(f, "Modulate({:?}, {:?})", base, mask),
            Texture::Raw(img) => write!(f, "Raw({:?})", img.size()),
        }
    }
}

impl From<LinColor> for Texture {
    fn from(color: LinColor) -> Self {
        Texture::Solid(color)
    }
}

/// Gradient offset of `point` for a focal radial gradient
///
/// The offset `t` is such that `point` lies on the line from the focus
/// through the point `q` at parameter `1/t` on the circle of `radius`
/// around `center`; equivalently `t = |p - f| / |q - f|` with the positive
/// intersection chosen. The focus is clamped strictly inside the circle.
fn focal_offset(point: Point, center: Point, radius: Scalar, focus: Point) -> Scalar {
    if radius < EPSILON {
        return 1.0;
    }
    // clamp focus inside the circle
    let offset = focus - center;
    let max_offset = radius * (1.0 - 1e-3);
    let offset = if offset.length() > max_offset {
        match offset.normalize() {
            Some(dir) => max_offset * dir,
            None => Point::new(0.0, 0.0),
        }
    } else {
        offset
    };
    let dir = point - (center + offset);
    let a = dir.dot(dir);
    if a < EPSILON {
        return 0.0;
    }
    let b = 2.0 * offset.dot(dir);
    let c = offset.dot(offset) - radius * radius;
    // focus is strictly inside, so c < 0 and the roots straddle zero
    let disc = (b * b - 4.0 * a * c).max(0.0).sqrt();
    let root = (-b + disc) / (2.0 * a);
    if root < EPSILON {
        1.0
    } else {
        1.0 / root
    }
}

/// Bilinear image lookup at pixel coordinates with texel wrapping
fn sample_bilinear(img: &ImageOwned<LinColor>, point: Point, sampler: Sampler) -> LinColor {
    let size = img.size();
    if size.is_empty() {
        return LinColor::TRANSPARENT;
    }
    let x = point.x() - 0.5;
    let y = point.y() - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let col0 = sampler.apply_index(x0 as i64, size.width);
    let col1 = sampler.apply_index(x0 as i64 + 1, size.width);
    let row0 = sampler.apply_index(y0 as i64, size.height);
    let row1 = sampler.apply_index(y0 as i64 + 1, size.height);
    let fetch = |row: usize, col: usize| -> LinColor {
        img.get(row, col).copied().unwrap_or_default()
    };
    let top = fetch(row0, col0).lerp(fetch(row0, col1), fx);
    let bot = fetch(row1, col0).lerp(fetch(row1, col1), fx);
    top.lerp(bot, fy)
}

/// Nearest-neighbor grayscale lookup with pad semantics
fn sample_nearest(img: &ImageOwned<Scalar>, point: Point) -> Scalar {
    let size = img.size();
    if size.is_empty() {
        return 0.0;
    }
    let col = clamp(point.x().floor(), 0.0, (size.width - 1) as Scalar) as usize;
    let row = clamp(point.y().floor(), 0.0, (size.height - 1) as Scalar) as usize;
    img.get(row, col).copied().unwrap_or(0.0)
}
