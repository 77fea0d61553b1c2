//! Scene based 2D vector graphics rasterizer
//!
//! `pictor` renders a declarative [`Scene`] of filled and stroked paths
//! into an in-memory image. The pipeline is:
//!  - the scene recorder composes texture, transform, clip and
//!    path-orientation scopes around fills, strokes and text
//!  - strokes (optionally dashed) are expanded into closed fill outlines
//!  - Bezier curves are flattened into line segments within a flatness
//!    tolerance
//!  - a scanline rasterizer produces analytic per-pixel coverage
//!  - a texture evaluator shades each covered pixel and composites it
//!    with source-over in premultiplied linear color
//!
//! ```no_run
//! use pictor::{LinColor, Path, Scene, Size, StrokeStyle, Texture};
//!
//! let circle = Scene::fill(Path::circle((32.0, 32.0), 24.0))
//!     .with_texture(Texture::solid("#ff8040".parse::<LinColor>().unwrap()));
//! let outline = Scene::stroke(Path::circle((32.0, 32.0), 24.0), StrokeStyle::new(2.0));
//! let img = Scene::group(vec![circle, outline]).render(Size::new(64, 64), LinColor::WHITE);
//! # let _ = img;
//! ```
#![deny(warnings)]

mod color;
mod curve;
mod geometry;
mod image;
mod path;
mod pathwalk;
mod rasterize;
mod scene;
mod stroke;
mod text;
mod texture;
pub mod utils;

pub use crate::image::{Image, ImageIter, ImageMut, ImageMutRef, ImageOwned, ImageRef, Shape, Size};
pub use color::{linear_to_srgb, srgb_to_linear, Color, ColorError, LinColor, RGBA};
pub use curve::{arc_to_cubics, Cubic, Line, Quad, Segment, SegmentFlattenIter};
pub use geometry::{Align, BBox, Point, Scalar, Transform, EPSILON, PI};
pub use path::{FillRule, Path, PathBuilder, PathFlattenIter, SubPath};
pub use pathwalk::{PathPoint, PathWalker};
pub use rasterize::{winding_to_coverage, CoverageSample, Rasterizer};
pub use scene::{DrawOrder, Scene, SceneInner};
pub use stroke::{DashPattern, LineCap, LineJoin, StrokeStyle};
pub use text::{GlyphSource, TextSpan};
pub use texture::{GradStop, GradStops, Sampler, Texture};

/// Default curve flattening tolerance: a quarter of a pixel keeps the
/// deviation from the true curve invisible at device resolution.
pub const DEFAULT_FLATNESS: Scalar = 0.25;

/// Add debug log message with time taken to execute provided function
pub fn timeit<F: FnOnce() -> R, R>(msg: &str, f: F) -> R {
    let start = std::time::Instant::now();
    let result = f();
    log::debug!("{} {:?}", msg, start.elapsed());
    result
}
