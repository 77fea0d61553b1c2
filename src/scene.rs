//! Scene recording and the rendering driver
//!
//! A [`Scene`] is an immutable tree of draw commands. Leaf nodes carry
//! geometry (fills, strokes, text), wrapper nodes adjust the ambient
//! context: texture, transform, clip and path orientation. The driver
//! walks the tree and flattens it into [`DrawOrder`]s: self-contained
//! units of device-space geometry, texture, fill rule and optional clip
//! mask, executed strictly in emission order (painter's algorithm).
use crate::{
    timeit, utils::clamp, Color, DashPattern, FillRule, GlyphSource, Image, ImageMut, ImageOwned,
    LinColor, Path, PathWalker, Point, Rasterizer, Scalar, Size, StrokeStyle, TextSpan, Texture,
    Transform, DEFAULT_FLATNESS,
};
use std::{fmt, sync::Arc};

/// Scene tree node
#[derive(Debug)]
pub enum SceneInner {
    /// Fill a path with the ambient texture
    Fill {
        fill_rule: FillRule,
        path: Arc<Path>,
    },
    /// Stroke a path with the ambient texture
    Stroke {
        style: StrokeStyle,
        path: Arc<Path>,
    },
    /// Stroke dash runs of a path
    DashedStroke {
        dash: DashPattern,
        style: StrokeStyle,
        path: Arc<Path>,
    },
    /// Fill glyph outlines of text runs
    Text {
        origin: Point,
        size: Scalar,
        source: Arc<dyn GlyphSource>,
        spans: Vec<TextSpan>,
    },
    /// Replace the ambient texture for the child
    SetTexture { texture: Texture, child: Scene },
    /// Compose a transform under the child
    WithTransform { tr: Transform, child: Scene },
    /// Restrict the child to the coverage of the clip scene
    WithClip { clip: Scene, child: Scene },
    /// Place the child along a path by arc length
    AlongPath {
        path: Arc<Path>,
        baseline: Scalar,
        child: Scene,
    },
    /// Children drawn one after another
    Group { children: Vec<Scene> },
}

/// Recorded drawing
#[derive(Clone)]
pub struct Scene {
    inner: Arc<SceneInner>,
}

impl AsRef<SceneInner> for Scene {
    fn as_ref(&self) -> &SceneInner {
        self.inner.as_ref()
    }
}

impl From<SceneInner> for Scene {
    fn from(inner: SceneInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl Scene {
    /// Fill path with the non-zero rule
    pub fn fill(path: impl Into<Arc<Path>>) -> Self {
        Self::fill_with_rule(path, FillRule::NonZero)
    }

    /// Fill path with the provided fill rule
    pub fn fill_with_rule(path: impl Into<Arc<Path>>, fill_rule: FillRule) -> Self {
        SceneInner::Fill {
            fill_rule,
            path: path.into(),
        }
        .into()
    }

    /// Stroke path
    pub fn stroke(path: impl Into<Arc<Path>>, style: StrokeStyle) -> Self {
        SceneInner::Stroke {
            style,
            path: path.into(),
        }
        .into()
    }

    /// Stroke dash runs of the path
    pub fn dashed_stroke(
        path: impl Into<Arc<Path>>,
        dash: DashPattern,
        style: StrokeStyle,
    ) -> Self {
        SceneInner::DashedStroke {
            dash,
            style,
            path: path.into(),
        }
        .into()
    }

    /// Fill text runs starting at `origin`
    pub fn text(
        source: Arc<dyn GlyphSource>,
        size: Scalar,
        origin: impl Into<Point>,
        spans: Vec<TextSpan>,
    ) -> Self {
        SceneInner::Text {
            origin: origin.into(),
            size,
            source,
            spans,
        }
        .into()
    }

    /// Group multiple sub-scenes drawn in order
    pub fn group(children: Vec<Scene>) -> Self {
        match children.as_slice() {
            [child] => child.clone(),
            _ => SceneInner::Group { children }.into(),
        }
    }

    /// Draw the scene with the provided texture
    pub fn with_texture(&self, texture: impl Into<Texture>) -> Self {
        SceneInner::SetTexture {
            texture: texture.into(),
            child: self.clone(),
        }
        .into()
    }

    /// Apply transform to the scene
    pub fn with_transform(&self, tr: Transform) -> Self {
        match self.as_ref() {
            SceneInner::WithTransform {
                child,
                tr: child_tr,
            } => SceneInner::WithTransform {
                tr: tr * *child_tr,
                child: child.clone(),
            }
            .into(),
            _ => SceneInner::WithTransform {
                tr,
                child: self.clone(),
            }
            .into(),
        }
    }

    /// Restrict the scene to the coverage of the clip scene
    pub fn with_clip(&self, clip: Scene) -> Self {
        SceneInner::WithClip {
            clip,
            child: self.clone(),
        }
        .into()
    }

    /// Place the scene along the path, offset by `baseline` perpendicular
    /// to the path direction
    pub fn along_path(&self, path: impl Into<Arc<Path>>, baseline: Scalar) -> Self {
        SceneInner::AlongPath {
            path: path.into(),
            baseline,
            child: self.clone(),
        }
        .into()
    }

    /// Flatten the scene into draw orders for a target of the given size
    ///
    /// Orders are listed in painting order; geometry is already in device
    /// space and every texture carries the matching texture-space
    /// transform.
    pub fn draw_orders(&self, size: Size) -> Vec<DrawOrder> {
        let ctx = Context {
            texture: Texture::Solid(LinColor::BLACK),
            clip: None,
            forward: Transform::identity(),
            inverse: Some(Transform::identity()),
            size,
        };
        let mut orders = Vec::new();
        emit(self, &ctx, &mut orders);
        orders
    }

    /// Render the scene onto a canvas of the given size and background
    pub fn render(&self, size: Size, background: LinColor) -> ImageOwned<LinColor> {
        let mut img = ImageOwned::new_with(size, background);
        if size.is_empty() {
            return img;
        }
        let orders = timeit("emit draw orders", || self.draw_orders(size));
        log::debug!("rendering {} draw order(s)", orders.len());
        let rasterizer = Rasterizer::default();
        let mut winding = ImageOwned::new_default(size);
        timeit("execute draw orders", || {
            for order in &orders {
                // solid textures skip the per-pixel evaluator
                let solid = match &order.texture {
                    Texture::Solid(color) => Some(*color),
                    _ => None,
                };
                execute_order(&rasterizer, order, &mut winding, &mut img, |point| {
                    match solid {
                        Some(color) => color,
                        None => order.texture.at(point),
                    }
                });
            }
        });
        img
    }
}

/// Self-contained unit of rendering work
///
/// Geometry is in final pixel coordinates; the texture already carries the
/// inverse of the ambient transform, so per-pixel lookups in device space
/// recover texture-space coordinates. The optional mask is a grayscale
/// texture multiplied into the coverage.
#[derive(Debug, Clone)]
pub struct DrawOrder {
    pub path: Arc<Path>,
    pub texture: Texture,
    pub fill_rule: FillRule,
    pub mask: Option<Texture>,
}

/// Ambient state carried down the scene tree
#[derive(Clone)]
struct Context {
    /// Texture in user space
    texture: Texture,
    /// Accumulated clip mask in device space
    clip: Option<Texture>,
    /// User to device transform
    forward: Transform,
    /// Cached inverse of `forward`, `None` when degenerate
    inverse: Option<Transform>,
    /// Size of the render target, needed for clip mask rasterization
    size: Size,
}

impl Context {
    /// Compose a transform under the current one, refreshing the cached pair
    fn compose(&self, tr: Transform) -> Self {
        let forward = self.forward * tr;
        Self {
            forward,
            inverse: forward.invert(),
            ..self.clone()
        }
    }

    /// Texture wrapped for lookups in device space
    ///
    /// A non-invertible ambient transform degrades to the identity inverse:
    /// geometry is still transformed, shading samples texture space as-is.
    fn device_texture(&self, texture: &Texture) -> Texture {
        texture
            .clone()
            .with_transform(self.inverse.unwrap_or_else(Transform::identity))
    }

    /// Path transformed into device space
    fn device_path(&self, path: &Path) -> Arc<Path> {
        if self.forward.is_identity() {
            return Arc::new(path.clone());
        }
        let mut path = path.clone();
        path.transform(self.forward);
        Arc::new(path)
    }
}

/// Recursively walk the scene emitting draw orders
fn emit(scene: &Scene, ctx: &Context, out: &mut Vec<DrawOrder>) {
    use SceneInner::*;
    match scene.as_ref() {
        Fill { fill_rule, path } => {
            out.push(DrawOrder {
                path: ctx.device_path(path),
                texture: ctx.device_texture(&ctx.texture),
                fill_rule: *fill_rule,
                mask: ctx.clip.clone(),
            });
        }
        Stroke { style, path } => {
            let outline = path.stroke(*style);
            if !outline.is_empty() {
                out.push(DrawOrder {
                    path: ctx.device_path(&outline),
                    texture: ctx.device_texture(&ctx.texture),
                    fill_rule: FillRule::NonZero,
                    mask: ctx.clip.clone(),
                });
            }
        }
        DashedStroke { dash, style, path } => {
            for run in path.dash(dash) {
                let outline = run.stroke(*style);
                if !outline.is_empty() {
                    out.push(DrawOrder {
                        path: ctx.device_path(&outline),
                        texture: ctx.device_texture(&ctx.texture),
                        fill_rule: FillRule::NonZero,
                        mask: ctx.clip.clone(),
                    });
                }
            }
        }
        Text {
            origin,
            size,
            source,
            spans,
        } => {
            let mut cursor = *origin;
            for span in spans {
                let (glyphs, advance) = source.outline(*size, cursor, &span.text);
                cursor = advance;
                let texture = span.texture.as_ref().unwrap_or(&ctx.texture);
                let texture = ctx.device_texture(texture);
                for glyph in glyphs {
                    if glyph.is_empty() {
                        continue;
                    }
                    out.push(DrawOrder {
                        path: ctx.device_path(&glyph),
                        texture: texture.clone(),
                        fill_rule: FillRule::NonZero,
                        mask: ctx.clip.clone(),
                    });
                }
            }
        }
        SetTexture { texture, child } => {
            let ctx = Context {
                texture: texture.clone(),
                ..ctx.clone()
            };
            emit(child, &ctx, out);
        }
        WithTransform { tr, child } => {
            emit(child, &ctx.compose(*tr), out);
        }
        Group { children } => {
            for child in children {
                emit(child, ctx, out);
            }
        }
        WithClip { clip, child } => {
            // one-shot nested rasterization of the clip scene into a
            // grayscale mask the size of the target
            let mask = render_mask(clip, ctx);
            let mask = Texture::Raw(Arc::new(mask));
            let mask = match &ctx.clip {
                // nested clips intersect by multiplication
                Some(outer) => mask.modulate(outer.clone()),
                None => mask,
            };
            let ctx = Context {
                clip: Some(mask),
                ..ctx.clone()
            };
            emit(child, &ctx, out);
        }
        AlongPath {
            path,
            baseline,
            child,
        } => {
            // record the child in its own frame, then place every recorded
            // order rigidly along the path
            let record_ctx = Context {
                texture: ctx.texture.clone(),
                clip: None,
                forward: Transform::identity(),
                inverse: Some(Transform::identity()),
                size: ctx.size,
            };
            let mut recorded = Vec::new();
            emit(child, &record_ctx, &mut recorded);
            let walker = PathWalker::new(path, DEFAULT_FLATNESS);
            for order in recorded {
                let bbox = match order.path.bbox(Transform::identity()) {
                    Some(bbox) => bbox,
                    None => continue,
                };
                // horizontal extent of the order selects its arc distance
                let distance = (bbox.x() + bbox.max().x()) / 2.0;
                let place = match walker.at(distance) {
                    Some(local) => {
                        let anchor = local.offset(*baseline);
                        Transform::new_translate(anchor.x(), anchor.y())
                            .pre_rotate(local.tangent.angle())
                            .pre_translate(-distance, 0.0)
                    }
                    None => continue,
                };
                let full = ctx.forward * place;
                let inverse = full.invert().unwrap_or_else(Transform::identity);
                let mut path = (*order.path).clone();
                path.transform(full);
                let mask = match (order.mask, &ctx.clip) {
                    (None, None) => None,
                    (Some(mask), None) => Some(mask.with_transform(inverse)),
                    (None, Some(clip)) => Some(clip.clone()),
                    (Some(mask), Some(clip)) => {
                        Some(mask.with_transform(inverse).modulate(clip.clone()))
                    }
                };
                out.push(DrawOrder {
                    path: Arc::new(path),
                    texture: order.texture.with_transform(inverse),
                    fill_rule: order.fill_rule,
                    mask,
                });
            }
        }
    }
}

/// Rasterize a clip scene into a grayscale mask image
///
/// The clip scene is rendered with the ambient transform, a solid white
/// texture and no outer clip; its coverage becomes the mask.
fn render_mask(scene: &Scene, ctx: &Context) -> ImageOwned<Scalar> {
    let mask_ctx = Context {
        texture: Texture::Solid(LinColor::WHITE),
        clip: None,
        forward: ctx.forward,
        inverse: ctx.inverse,
        size: ctx.size,
    };
    let mut orders = Vec::new();
    emit(scene, &mask_ctx, &mut orders);

    let rasterizer = Rasterizer::default();
    let mut img: ImageOwned<Scalar> = ImageOwned::new_default(ctx.size);
    let mut winding: ImageOwned<Scalar> = ImageOwned::new_default(ctx.size);
    for order in &orders {
        execute_order(&rasterizer, order, &mut winding, &mut img, |point| {
            order.texture.coverage_at(point)
        });
    }
    img
}

/// Rasterize one draw order and composite it onto the image
///
/// The winding buffer is a scratch image of the same size pooled across
/// orders; only the touched rows are scanned and cleared afterwards.
fn execute_order<I, F>(
    rasterizer: &Rasterizer,
    order: &DrawOrder,
    winding: &mut ImageOwned<Scalar>,
    img: &mut I,
    shade: F,
) where
    I: ImageMut,
    I::Pixel: Color,
    F: Fn(Point) -> I::Pixel,
{
    let size = img.size();
    if size.is_empty() {
        return;
    }
    let bbox = match order.path.bbox(Transform::identity()) {
        Some(bbox) => bbox,
        None => return,
    };
    let row_start = clamp(bbox.y().floor(), 0.0, size.height as Scalar) as usize;
    let row_end = clamp(bbox.max().y().ceil(), 0.0, size.height as Scalar) as usize;
    if row_start >= row_end {
        return;
    }
    // columns to scan: out-of-image geometry folds onto the borders, so
    // always include at least the two leftmost columns
    let col_end = size
        .width
        .min((bbox.max().x().ceil() + 2.0).max(2.0) as usize);

    rasterizer.deposit(&order.path, Transform::identity(), winding);

    let img_shape = img.shape();
    let img_data = img.data_mut();
    let winding_shape = winding.shape();
    let winding_data = winding.data_mut();
    for y in row_start..row_end {
        let mut acc = 0.0;
        for x in 0..col_end {
            let offset = winding_shape.offset(y, x);
            acc += winding_data[offset];
            winding_data[offset] = 0.0;
            let coverage = order.fill_rule.coverage_from_winding(acc);
            if coverage < 1e-6 {
                continue;
            }
            let point = Point::new(x as Scalar + 0.5, y as Scalar + 0.5);
            let coverage = match &order.mask {
                None => coverage,
                Some(mask) => coverage * mask.coverage_at(point),
            };
            if coverage < 1e-6 {
                continue;
            }
            let src = shade(point).modulate(coverage);
            let dst = &mut img_data[img_shape.offset(y, x)];
            *dst = dst.blend_over(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, GradStops, LineCap, LineJoin, Sampler};

    fn red() -> LinColor {
        LinColor::new(1.0, 0.0, 0.0, 1.0)
    }

    fn render_scene(scene: &Scene, width: usize, height: usize) -> ImageOwned<LinColor> {
        let _ = env_logger::builder().is_test(true).try_init();
        scene.render(Size::new(width, height), LinColor::TRANSPARENT)
    }

    #[test]
    fn test_background_only() {
        // empty scene leaves the background untouched
        let scene = Scene::group(Vec::new());
        let img = scene.render(Size::new(20, 20), LinColor::WHITE);
        for pixel in img.iter() {
            assert_eq!(*pixel, LinColor::WHITE);
        }
    }

    #[test]
    fn test_fill_rectangle() {
        let scene =
            Scene::fill(Path::rectangle((5.0, 5.0), (15.0, 15.0))).with_texture(Texture::solid(red()));
        let img = render_scene(&scene, 20, 20);
        let mut full = 0;
        let mut partial = 0;
        for y in 0..20 {
            for x in 0..20 {
                let pixel = *img.get(y, x).unwrap();
                if (5..15).contains(&x) && (5..15).contains(&y) {
                    assert_approx_eq!(pixel.red(), 1.0, 1e-6);
                    assert_approx_eq!(pixel.alpha(), 1.0, 1e-6);
                    full += 1;
                } else if pixel.alpha() > 1e-6 {
                    partial += 1;
                }
            }
        }
        assert_eq!(full, 100);
        assert_eq!(partial, 0);
    }

    #[test]
    fn test_stroke_horizontal_line() {
        let scene = Scene::stroke(
            Path::line((2.0, 10.0), (18.0, 10.0)),
            StrokeStyle::new(2.0),
        )
        .with_texture(Texture::solid(red()));
        let img = render_scene(&scene, 20, 20);
        for y in [9usize, 10] {
            for x in 2..18 {
                assert_approx_eq!(img.get(y, x).unwrap().alpha(), 1.0, 1e-6);
            }
        }
        // coverage is symmetric about y = 10
        for x in 2..18 {
            assert_approx_eq!(
                img.get(8, x).unwrap().alpha(),
                img.get(11, x).unwrap().alpha(),
                1e-6
            );
        }
        // nothing outside of the stroke
        assert_approx_eq!(img.get(5, 5).unwrap().alpha(), 0.0, 1e-6);
    }

    #[test]
    fn test_linear_gradient_strip() {
        let stops: GradStops = [(0.0, LinColor::BLACK), (1.0, LinColor::WHITE)]
            .into_iter()
            .collect();
        let texture =
            Texture::linear_gradient(stops, Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let scene = Scene::fill(Path::rectangle((0.0, 0.0), (100.0, 1.0))).with_texture(texture);
        let img = render_scene(&scene, 100, 1);
        let mut prev = -1.0;
        for x in 0..100 {
            let [value, _, _, _] = img.get(0, x).unwrap().to_rgba();
            let value = value as Scalar / 255.0;
            assert!(value + 1e-6 >= prev, "gradient must be monotone");
            prev = value;
            // intensity tracks the pixel center position
            let expected = (x as Scalar + 0.5) / 100.0;
            assert_approx_eq!(value, expected, 0.02);
        }
    }

    #[test]
    fn test_radial_gradient_alpha() {
        let stops: GradStops = [(0.0, LinColor::WHITE), (1.0, LinColor::TRANSPARENT)]
            .into_iter()
            .collect();
        let texture = Texture::radial_gradient(stops, Point::new(50.0, 50.0), 50.0);
        let scene = Scene::fill(Path::rectangle((0.0, 0.0), (100.0, 100.0))).with_texture(texture);
        let img = render_scene(&scene, 100, 100);
        let alpha = |x: usize, y: usize| img.get(y, x).unwrap().alpha() as Scalar;
        // center is fully white, corners transparent
        assert_approx_eq!(alpha(50, 50), 1.0, 0.02);
        assert_approx_eq!(alpha(0, 0), 0.0, 0.02);
        assert_approx_eq!(alpha(99, 99), 0.0, 0.02);
        // half way to the edge the alpha is about a half
        let p = Point::new(75.5, 50.5);
        let expected = 1.0 - clamp((p - Point::new(50.0, 50.0)).length() / 50.0, 0.0, 1.0);
        assert_approx_eq!(alpha(75, 50), expected, 0.02);
    }

    #[test]
    fn test_clip_circle() {
        let fill = Scene::fill(Path::rectangle((0.0, 0.0), (100.0, 100.0)))
            .with_texture(Texture::solid(red()));
        let clip = Scene::fill(Path::circle((50.0, 50.0), 40.0));
        let scene = fill.with_clip(clip);
        let img = render_scene(&scene, 100, 100);
        let center = Point::new(50.0, 50.0);
        // inside the circle the fill is intact, outside it is clipped away
        assert_approx_eq!(img.get(50, 50).unwrap().alpha(), 1.0, 1e-6);
        assert_approx_eq!(img.get(5, 5).unwrap().alpha(), 0.0, 1e-6);
        // boundary is anti-aliased like a filled circle
        let reference = render_scene(
            &Scene::fill(Path::circle((50.0, 50.0), 40.0)).with_texture(Texture::solid(red())),
            100,
            100,
        );
        for y in 0..100 {
            for x in 0..100 {
                let p = Point::new(x as Scalar + 0.5, y as Scalar + 0.5);
                if ((p - center).length() - 40.0).abs() > 2.0 {
                    continue;
                }
                assert_approx_eq!(
                    img.get(y, x).unwrap().alpha(),
                    reference.get(y, x).unwrap().alpha(),
                    0.02
                );
            }
        }
    }

    #[test]
    fn test_clip_idempotence() {
        // pixel-aligned clip produces a binary mask, so clipping twice
        // equals clipping once
        let fill = Scene::fill(Path::rectangle((0.0, 0.0), (30.0, 30.0)))
            .with_texture(Texture::solid(red()));
        let clip = || Scene::fill(Path::rectangle((5.0, 5.0), (20.0, 20.0)));
        let once = fill.with_clip(clip());
        let twice = fill.with_clip(clip()).with_clip(clip());
        let img_once = render_scene(&once, 30, 30);
        let img_twice = render_scene(&twice, 30, 30);
        for (p0, p1) in img_once.iter().zip(img_twice.iter()) {
            assert_approx_eq!(p0.alpha(), p1.alpha(), 1e-6);
            assert_approx_eq!(p0.red(), p1.red(), 1e-6);
        }
    }

    #[test]
    fn test_transform_round_trip() {
        let tr = Transform::new_rotate(0.3).pre_translate(3.0, -2.0);
        let inv = tr.invert().unwrap();
        let base = Scene::fill(Path::rectangle((10.0, 10.0), (30.0, 25.0)))
            .with_texture(Texture::solid(red()));
        let wrapped = base.with_transform(inv).with_transform(tr);
        let img0 = render_scene(&base, 40, 40);
        let img1 = render_scene(&wrapped, 40, 40);
        for (p0, p1) in img0.iter().zip(img1.iter()) {
            // within one unit of coverage per pixel
            assert_approx_eq!(p0.alpha(), p1.alpha(), 1.0 / 255.0 + 1e-3);
        }
    }

    #[test]
    fn test_translation_equivariance() {
        let base = Scene::fill(Path::circle((10.0, 10.0), 6.0)).with_texture(Texture::solid(red()));
        let moved = base.with_transform(Transform::new_translate(7.0, 5.0));
        let img0 = render_scene(&base, 40, 40);
        let img1 = render_scene(&moved, 40, 40);
        for y in 0..20 {
            for x in 0..20 {
                assert_approx_eq!(
                    img0.get(y, x).unwrap().alpha(),
                    img1.get(y + 5, x + 7).unwrap().alpha(),
                    1e-6
                );
            }
        }
    }

    #[test]
    fn test_painters_algorithm() {
        let below = Scene::fill(Path::rectangle((2.0, 2.0), (12.0, 12.0)))
            .with_texture(Texture::solid(red()));
        let above = Scene::fill(Path::rectangle((8.0, 8.0), (18.0, 18.0)))
            .with_texture(Texture::solid(LinColor::new(0.0, 0.0, 1.0, 1.0)));
        let img = render_scene(&Scene::group(vec![below, above]), 20, 20);
        // overlap is painted by the later order
        assert_approx_eq!(img.get(10, 10).unwrap().blue(), 1.0, 1e-6);
        assert_approx_eq!(img.get(10, 10).unwrap().red(), 0.0, 1e-6);
        // disjoint supports are independent
        assert_approx_eq!(img.get(4, 4).unwrap().red(), 1.0, 1e-6);
        assert_approx_eq!(img.get(16, 16).unwrap().blue(), 1.0, 1e-6);
    }

    #[test]
    fn test_draw_orders_stroke_becomes_fill() {
        let scene = Scene::stroke(Path::line((0.0, 0.0), (10.0, 0.0)), StrokeStyle::new(2.0));
        let orders = scene.draw_orders(Size::new(16, 16));
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].fill_rule, FillRule::NonZero);
        // outline is closed
        assert!(orders[0].path.subpaths().iter().all(|s| s.is_closed()));
    }

    #[test]
    fn test_draw_orders_dashes() {
        let scene = Scene::dashed_stroke(
            Path::line((0.0, 0.0), (10.0, 0.0)),
            DashPattern::new(vec![2.0, 3.0], 0.0),
            StrokeStyle::new(1.0),
        );
        let orders = scene.draw_orders(Size::new(16, 16));
        // one order per dash run
        assert_eq!(orders.len(), 2);
    }

    #[test]
    fn test_draw_orders_texture_transform() {
        // geometry is emitted in device space and the texture carries the
        // inverse, so shading in device space recovers texture space
        let stops: GradStops = [(0.0, LinColor::BLACK), (1.0, LinColor::WHITE)]
            .into_iter()
            .collect();
        let texture = Texture::linear_gradient(stops, Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let base = Scene::fill(Path::rectangle((0.0, 0.0), (10.0, 10.0))).with_texture(texture);
        let scene = base.with_transform(Transform::new_translate(20.0, 0.0));
        let orders = scene.draw_orders(Size::new(40, 16));
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        let bbox = order.path.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox.x(), 20.0, 1e-9);
        // device point (25, 5) looks up texture point (5, ...): halfway gray
        let c = order.texture.at(Point::new(25.0, 5.0));
        let reference = order.texture.at(Point::new(45.0, 5.0));
        assert!(c.red() > 0.0 && c.red() < 1.0);
        // pad clamps far to the right to white
        assert_approx_eq!(reference.red(), 1.0, 1e-5);
    }

    #[test]
    fn test_degenerate_transform() {
        // non-invertible transform: geometry collapses, shading must not
        // panic and nothing of substance is drawn
        let scene = Scene::fill(Path::rectangle((0.0, 0.0), (10.0, 10.0)))
            .with_texture(Texture::solid(red()))
            .with_transform(Transform::new_scale(0.0, 0.0));
        let img = render_scene(&scene, 20, 20);
        for pixel in img.iter() {
            assert!(pixel.alpha() < 1e-6);
        }
    }

    #[derive(Debug)]
    struct BoxGlyphs;

    impl GlyphSource for BoxGlyphs {
        fn outline(&self, size: Scalar, origin: Point, text: &str) -> (Vec<Path>, Point) {
            // every character is a filled square sitting on the baseline
            let mut glyphs = Vec::new();
            let mut cursor = origin;
            for _ in text.chars() {
                glyphs.push(Path::rectangle(
                    cursor - Point::new(0.0, size),
                    cursor + Point::new(size * 0.8, 0.0),
                ));
                cursor = cursor + Point::new(size, 0.0);
            }
            (glyphs, cursor)
        }
    }

    #[test]
    fn test_text_fill() {
        let scene = Scene::text(
            Arc::new(BoxGlyphs),
            4.0,
            (2.0, 10.0),
            vec![
                TextSpan::new("ab"),
                TextSpan::with_texture("c", Texture::solid(LinColor::new(0.0, 1.0, 0.0, 1.0))),
            ],
        )
        .with_texture(Texture::solid(red()));
        let orders = scene.draw_orders(Size::new(20, 16));
        assert_eq!(orders.len(), 3);

        let img = render_scene(&scene, 20, 16);
        // first glyph is red, third uses the span texture
        assert_approx_eq!(img.get(8, 3).unwrap().red(), 1.0, 1e-6);
        assert_approx_eq!(img.get(8, 11).unwrap().green(), 1.0, 1e-6);
    }

    #[test]
    fn test_along_path_translation() {
        // placing along a horizontal line is a pure translation
        let rect = Scene::fill(Path::rectangle((2.0, -2.0), (6.0, 0.0)))
            .with_texture(Texture::solid(red()));
        let scene = rect.along_path(Path::line((0.0, 10.0), (20.0, 10.0)), 0.0);
        let img = render_scene(&scene, 20, 20);
        let reference = render_scene(
            &Scene::fill(Path::rectangle((2.0, 8.0), (6.0, 10.0)))
                .with_texture(Texture::solid(red())),
            20,
            20,
        );
        for (p0, p1) in img.iter().zip(reference.iter()) {
            assert_approx_eq!(p0.alpha(), p1.alpha(), 1e-6);
        }
    }

    #[test]
    fn test_along_path_rotation() {
        // a square placed on a vertical path is rotated with the tangent
        let rect = Scene::fill(Path::rectangle((4.0, -2.0), (8.0, 0.0)))
            .with_texture(Texture::solid(red()));
        let scene = rect.along_path(Path::line((10.0, 0.0), (10.0, 20.0)), 0.0);
        let img = render_scene(&scene, 20, 20);
        // tangent points down, the rect sits right of the path at rows 4..8
        let covered: Vec<(usize, usize)> = (0..20usize)
            .flat_map(|y| (0..20usize).map(move |x| (x, y)))
            .filter(|&(x, y)| img.get(y, x).unwrap().alpha() > 0.5)
            .collect();
        assert!(!covered.is_empty());
        for (x, y) in covered {
            assert!((10..13).contains(&x), "x = {}", x);
            assert!((4..8).contains(&y), "y = {}", y);
        }
    }

    #[test]
    fn test_sampler_default_in_scene() {
        // sampler outside of a gradient context defaults to pad
        let stops: GradStops = [(0.0, LinColor::BLACK), (1.0, LinColor::WHITE)]
            .into_iter()
            .collect();
        let texture = Texture::linear_gradient(stops, Point::new(5.0, 0.0), Point::new(10.0, 0.0));
        let scene = Scene::fill(Path::rectangle((0.0, 0.0), (15.0, 1.0))).with_texture(texture);
        let img = render_scene(&scene, 15, 1);
        // left of the gradient start stays at the first stop
        assert_approx_eq!(img.get(0, 1).unwrap().red(), 0.0, 1e-6);
        // right of the end clamps to the last stop
        assert_approx_eq!(img.get(0, 13).unwrap().red(), 1.0, 1e-2);
    }

    #[test]
    fn test_reflect_sampler_in_scene() {
        let stops: GradStops = [(0.0, LinColor::BLACK), (1.0, LinColor::WHITE)]
            .into_iter()
            .collect();
        let texture = Texture::linear_gradient(stops, Point::new(0.0, 0.0), Point::new(5.0, 0.0))
            .with_sampler(Sampler::Reflect);
        let scene = Scene::fill(Path::rectangle((0.0, 0.0), (10.0, 1.0))).with_texture(texture);
        let img = render_scene(&scene, 10, 1);
        // reflected: pixel 7 mirrors pixel 2
        assert_approx_eq!(
            img.get(0, 7).unwrap().red(),
            img.get(0, 2).unwrap().red(),
            1e-6
        );
    }

    #[test]
    fn test_round_stroke_style() {
        let style = StrokeStyle::new(3.0)
            .with_line_join(LineJoin::Round)
            .with_line_cap(LineCap::Round);
        let scene = Scene::stroke(
            Path::polyline([(4.0, 4.0), (16.0, 4.0), (16.0, 16.0)]),
            style,
        )
        .with_texture(Texture::solid(red()));
        let img = render_scene(&scene, 20, 20);
        // on the path everything is covered
        assert_approx_eq!(img.get(4, 10).unwrap().alpha(), 1.0, 1e-6);
        assert_approx_eq!(img.get(10, 16).unwrap().alpha(), 1.0, 1e-6);
    }
}
