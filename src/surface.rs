//! Drawing backends.
//!
//! The compositor only talks to [`Surface`]. [`RasterSurface`] paints into a `raqote`
//! [`DrawTarget`]; [`RecordingSurface`] keeps an ordered log of every call so that two passes can
//! be compared exactly.

use raqote::{
    DrawOptions, DrawTarget, LineCap, LineJoin, PathBuilder, SolidSource, Source, StrokeStyle,
};

use crate::color::Rgb;
use crate::geometry::Point;
use crate::math::pi;

/// How a draw call combines with what is already on the surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
}

/// Solid color with an alpha on a 0-255 scale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Paint {
    pub color: Rgb,
    pub alpha: f64,
}

impl Paint {
    pub fn new(color: Rgb, alpha: f64) -> Self {
        Paint { color, alpha }
    }

    /// Alpha rounded and clamped into a byte; non-finite alphas are transparent.
    pub fn alpha_u8(&self) -> u8 {
        if self.alpha.is_finite() {
            self.alpha.round().clamp(0.0, 255.0) as u8
        } else {
            0
        }
    }
}

pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Replaces every pixel with an opaque `color`.
    fn background(&mut self, color: Rgb);

    /// Paints row `y` with an opaque `color`.
    fn hline(&mut self, y: u32, color: Rgb);

    fn fill_polygon(&mut self, points: &[Point], paint: Paint, blend: BlendMode);

    fn stroke_polyline(&mut self, points: &[Point], paint: Paint, width: f64, blend: BlendMode);

    fn fill_circle(&mut self, center: Point, radius: f64, paint: Paint, blend: BlendMode);
}

/// One recorded call on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Background(Rgb),
    HLine {
        y: u32,
        color: Rgb,
    },
    FillPolygon {
        points: Vec<Point>,
        paint: Paint,
        blend: BlendMode,
    },
    StrokePolyline {
        points: Vec<Point>,
        paint: Paint,
        width: f64,
        blend: BlendMode,
    },
    FillCircle {
        center: Point,
        radius: f64,
        paint: Paint,
        blend: BlendMode,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        RecordingSurface {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<DrawCall> {
        self.calls
    }

    /// The `(points, paint, blend)` of every polygon fill, in order.
    pub fn fills(&self) -> impl Iterator<Item = (&[Point], Paint, BlendMode)> + '_ {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::FillPolygon {
                points,
                paint,
                blend,
            } => Some((points.as_slice(), *paint, *blend)),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn background(&mut self, color: Rgb) {
        self.calls.push(DrawCall::Background(color));
    }
    fn hline(&mut self, y: u32, color: Rgb) {
        self.calls.push(DrawCall::HLine { y, color });
    }
    fn fill_polygon(&mut self, points: &[Point], paint: Paint, blend: BlendMode) {
        self.calls.push(DrawCall::FillPolygon {
            points: points.to_vec(),
            paint,
            blend,
        });
    }
    fn stroke_polyline(&mut self, points: &[Point], paint: Paint, width: f64, blend: BlendMode) {
        self.calls.push(DrawCall::StrokePolyline {
            points: points.to_vec(),
            paint,
            width,
            blend,
        });
    }
    fn fill_circle(&mut self, center: Point, radius: f64, paint: Paint, blend: BlendMode) {
        self.calls.push(DrawCall::FillCircle {
            center,
            radius,
            paint,
            blend,
        });
    }
}

/// A [`Surface`] backed by a `raqote` draw target.
pub struct RasterSurface {
    dt: DrawTarget,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        RasterSurface {
            dt: DrawTarget::new(width as i32, height as i32),
        }
    }

    pub fn draw_target(&self) -> &DrawTarget {
        &self.dt
    }

    pub fn into_draw_target(self) -> DrawTarget {
        self.dt
    }

    /// Color of the pixel at `(x, y)`, ignoring alpha.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let px = self.dt.get_data()[(y * self.width() + x) as usize];
        let [b, g, r, _a] = px.to_le_bytes();
        Some(Rgb::new(r, g, b))
    }
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.dt.width())
            .field("height", &self.dt.height())
            .finish()
    }
}

fn solid(paint: Paint) -> Source<'static> {
    let Rgb { r, g, b } = paint.color;
    Source::Solid(SolidSource::from_unpremultiplied_argb(paint.alpha_u8(), r, g, b))
}

fn opaque(color: Rgb) -> Source<'static> {
    solid(Paint::new(color, 255.0))
}

fn options(blend: BlendMode) -> DrawOptions {
    let mut options = DrawOptions::new();
    options.blend_mode = match blend {
        BlendMode::Normal => raqote::BlendMode::SrcOver,
        BlendMode::Multiply => raqote::BlendMode::Multiply,
    };
    options
}

fn all_finite(points: &[Point]) -> bool {
    points.iter().all(|&(x, y)| x.is_finite() && y.is_finite())
}

fn trace_path(points: &[Point], close: bool) -> raqote::Path {
    let mut pb = PathBuilder::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            pb.move_to(x as f32, y as f32);
        } else {
            pb.line_to(x as f32, y as f32);
        }
    }
    if close {
        pb.close();
    }
    pb.finish()
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.dt.width() as u32
    }

    fn height(&self) -> u32 {
        self.dt.height() as u32
    }

    fn background(&mut self, color: Rgb) {
        let Rgb { r, g, b } = color;
        self.dt
            .clear(SolidSource::from_unpremultiplied_argb(0xff, r, g, b));
    }

    fn hline(&mut self, y: u32, color: Rgb) {
        let width = self.dt.width() as f32;
        self.dt.fill_rect(
            0.0,
            y as f32,
            width,
            1.0,
            &opaque(color),
            &options(BlendMode::Normal),
        );
    }

    fn fill_polygon(&mut self, points: &[Point], paint: Paint, blend: BlendMode) {
        if points.len() < 3 || !all_finite(points) {
            return;
        }
        let path = trace_path(points, true);
        self.dt.fill(&path, &solid(paint), &options(blend));
    }

    fn stroke_polyline(&mut self, points: &[Point], paint: Paint, width: f64, blend: BlendMode) {
        if points.len() < 2 || !all_finite(points) || !(width.is_finite() && width > 0.0) {
            return;
        }
        let path = trace_path(points, false);
        let style = StrokeStyle {
            width: width as f32,
            cap: LineCap::Round,
            join: LineJoin::Round,
            ..StrokeStyle::default()
        };
        self.dt.stroke(&path, &solid(paint), &style, &options(blend));
    }

    fn fill_circle(&mut self, (x, y): Point, radius: f64, paint: Paint, blend: BlendMode) {
        if !(x.is_finite() && y.is_finite() && radius.is_finite() && radius > 0.0) {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.arc(x as f32, y as f32, radius as f32, 0.0, pi(2.0) as f32);
        pb.close();
        self.dt.fill(&pb.finish(), &solid(paint), &options(blend));
    }
}
