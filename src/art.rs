//! Layer compositor.
//!
//! A pass reseeds the generator, paints the background, scatters brushes and then draws every
//! brush once per layer, back to front by depth. [`Pass`] exposes that as explicit steps so a host
//! can regain control between batches of layers; [`Generator`] drives a pass to completion and
//! refuses to start a second one while the first is still running.

use std::cell::Cell;
use std::fmt;

use crate::brush::{create_brush, neighbors, Bounds, Brush};
use crate::color::{Palette, Rgb};
use crate::config::{BackgroundStyle, Params};
use crate::geometry::{Point, Polygon};
use crate::math::{add_polar_offset, lerp, map};
use crate::mixers::{bleed_color, wet_blend_zones};
use crate::noise_field::NoiseField;
use crate::rand::Rng;
use crate::seepage::{generate_seepage_extensions, ExtensionSettings};
use crate::shape::{
    apply_edge_texture, fallback_polygon, generate_organic_polygon, organic_polygon_or_fallback,
    random_walk_polygon, Deformation, ShapeError, MIN_FALLBACK_RADIUS,
};
use crate::surface::{BlendMode, Paint, Surface};

mod colors_used;
pub use colors_used::ColorsUsed;

/// Layers drawn between two calls to [`Observer::on_yield`].
pub const YIELD_EVERY_LAYERS: u32 = 3;

const PAPER: Rgb = Rgb::new(252, 248, 240);
const PAPER_FIBER: Rgb = Rgb::new(240, 235, 220);
const PAPER_SPECKLES: usize = 200;
const GRADIENT_BOTTOM: Rgb = Rgb::new(240, 248, 255);

const FALLBACK_SHAPES: usize = 8;
const FALLBACK_ALPHA: f64 = 25.0;
const FALLBACK_COMPLEXITY: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    /// Every brush the pass tried to create failed.
    NoBrushes { attempted: u32 },
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassError::NoBrushes { attempted } => {
                write!(f, "no valid brushes out of {} attempted", attempted)
            }
        }
    }
}

impl std::error::Error for PassError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Layers remain; call [`Pass::step`] again.
    Yielded,
    Finished,
}

/// Summary of a finished pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Requested brush count.
    pub brush_count: u32,
    /// Brushes actually created and drawn.
    pub brushes_drawn: usize,
    /// `brush_count * layers_per_brush`, from the requested counts.
    pub total_layers: u64,
    pub palette: String,
    pub colors_used: ColorsUsed,
    /// The pass could not place any brush and painted the fallback composition instead.
    pub used_fallback: bool,
}

/// Hooks called by [`Generator::generate`]. Both default to doing nothing.
pub trait Observer {
    fn on_yield(&mut self, _layers_done: u32) {}
    fn on_complete(&mut self, _completion: &Completion) {}
}

impl Observer for () {}

/// Paints the canvas background for `style`.
pub fn paint_background<S: Surface>(surface: &mut S, style: BackgroundStyle, rng: &mut Rng) {
    match style {
        BackgroundStyle::White => surface.background(Rgb::WHITE),
        BackgroundStyle::Paper => {
            surface.background(PAPER);
            let width = f64::from(surface.width());
            let height = f64::from(surface.height());
            for _ in 0..PAPER_SPECKLES {
                let alpha = rng.uniform(10.0, 30.0);
                let center = (rng.uniform(0.0, width), rng.uniform(0.0, height));
                let diameter = rng.uniform(0.5, 2.0);
                surface.fill_circle(
                    center,
                    diameter / 2.0,
                    Paint::new(PAPER_FIBER, alpha),
                    BlendMode::Normal,
                );
            }
        }
        BackgroundStyle::Gradient => {
            let height = surface.height();
            let [r1, g1, b1] = Rgb::WHITE.to_f64();
            let [r2, g2, b2] = GRADIENT_BOTTOM.to_f64();
            for y in 0..height {
                let t = map(f64::from(y), (0.0, f64::from(height)), (0.0, 1.0));
                let row = Rgb::from_f64(lerp(r1, r2, t), lerp(g1, g2, t), lerp(b1, b2, t));
                surface.hline(y, row);
            }
        }
    }
}

/// Paints a plain white canvas with a few translucent palette-colored shapes. Used when a pass
/// cannot place any brush.
pub fn paint_fallback<S: Surface>(
    surface: &mut S,
    params: &Params,
    palette: &Palette,
) -> ColorsUsed {
    surface.background(Rgb::WHITE);
    let mut rng = Rng::from_seed(params.random_seed);
    let noise = NoiseField::default();
    let width = f64::from(surface.width());
    let height = f64::from(surface.height());
    let deformation = Deformation::from_params(params);

    let mut colors_used = ColorsUsed::new();
    for _ in 0..FALLBACK_SHAPES {
        let color = match rng.choice(&palette.colors) {
            Some(&color) => {
                colors_used.insert(color);
                color
            }
            None => Rgb::NEUTRAL_GREY,
        };
        let center = (
            rng.uniform(width * 0.2, width * 0.8),
            rng.uniform(height * 0.2, height * 0.8),
        );
        let radius = rng.uniform(50.0, 100.0);
        let shape = organic_polygon_or_fallback(
            center,
            radius,
            FALLBACK_COMPLEXITY,
            deformation,
            &mut rng,
            &noise,
        );
        surface.fill_polygon(
            shape.points(),
            Paint::new(color, FALLBACK_ALPHA),
            BlendMode::Normal,
        );
    }
    colors_used
}

/// Creates up to `brush_count` brushes spread evenly over the depth buckets, deepest first.
/// Brushes that fail to build are skipped.
fn build_brushes(
    bounds: Bounds,
    params: &Params,
    palette: &Palette,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Vec<Brush> {
    let depth_layers = params.effective_depth_layers();
    let per_depth = (params.brush_count + depth_layers - 1) / depth_layers;

    let mut brushes = Vec::with_capacity(params.brush_count as usize);
    let mut attempted = 0;
    'depths: for depth in 0..depth_layers {
        for _ in 0..per_depth {
            if attempted == params.brush_count {
                break 'depths;
            }
            attempted += 1;
            match create_brush(bounds, params, palette, depth, rng, noise) {
                Ok(brush) => brushes.push(brush),
                Err(e) => log::debug!("skipping brush at depth {}: {}", depth, e),
            }
        }
    }
    brushes.sort_by(|a, b| b.depth.cmp(&a.depth));
    brushes
}

/// Per-layer outline for a brush. Degenerate sizes fall back to a regular polygon; a non-finite
/// center is returned as an error.
fn layer_polygon(
    center: Point,
    size: f64,
    params: &Params,
    layer: u32,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Result<Polygon, ShapeError> {
    let z = f64::from(layer) * 0.1;
    let shape = if params.random_walk_mode {
        random_walk_polygon(center, size, params.deform_strength, z, noise)
    } else {
        generate_organic_polygon(
            center,
            size,
            params.edge_complexity.max(3),
            Deformation::from_params(params),
            rng,
            noise,
        )
    };
    let polygon = match shape {
        Ok(polygon) => polygon,
        Err(e @ (ShapeError::DegenerateCenter | ShapeError::NonFinite)) => return Err(e),
        Err(e) => {
            log::trace!("layer shape at {:?} fell back: {}", center, e);
            fallback_polygon(center, size)
        }
    };
    if params.texture_masking {
        Ok(apply_edge_texture(
            &polygon,
            params.texture_intensity,
            params.texture_density,
            z,
            rng,
            noise,
        ))
    } else {
        Ok(polygon)
    }
}

/// One in-progress composition.
pub struct Pass<'a> {
    params: Params,
    palette: &'a Palette,
    rng: Rng,
    noise: NoiseField,
    brushes: Vec<Brush>,
    layer: u32,
    colors_used: ColorsUsed,
}

impl<'a> Pass<'a> {
    /// Snapshots `params`, paints the background and places the brushes.
    pub fn begin<S: Surface>(
        params: &Params,
        palette: &'a Palette,
        surface: &mut S,
    ) -> Result<Self, PassError> {
        let params = params.clamped();
        let mut rng = Rng::from_seed(params.random_seed);
        let noise = NoiseField::default();

        paint_background(surface, params.background_type, &mut rng);

        let bounds = Bounds {
            width: f64::from(surface.width()),
            height: f64::from(surface.height()),
        };
        let brushes = build_brushes(bounds, &params, palette, &mut rng, &noise);
        if brushes.is_empty() {
            return Err(PassError::NoBrushes {
                attempted: params.brush_count,
            });
        }
        log::debug!(
            "placed {} of {} brushes across {} depth layers",
            brushes.len(),
            params.brush_count,
            params.effective_depth_layers()
        );

        let mut colors_used = ColorsUsed::new();
        colors_used.extend(brushes.iter().map(|b| b.source_color));

        Ok(Pass {
            params,
            palette,
            rng,
            noise,
            brushes,
            layer: 0,
            colors_used,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn brushes(&self) -> &[Brush] {
        &self.brushes
    }

    pub fn layers_done(&self) -> u32 {
        self.layer
    }

    pub fn is_finished(&self) -> bool {
        self.layer >= self.params.layers_per_brush
    }

    /// Draws up to `max_layers` more layers (at least one) of every brush.
    pub fn step<S: Surface>(&mut self, surface: &mut S, max_layers: u32) -> StepOutcome {
        let mut drawn = 0;
        while drawn < max_layers.max(1) && !self.is_finished() {
            for index in 0..self.brushes.len() {
                if let Err(e) = self.draw_brush_layer(index, surface) {
                    log::warn!("brush {} failed on layer {}: {}", index, self.layer, e);
                    self.draw_fallback_circle(index, surface);
                }
            }
            self.layer += 1;
            drawn += 1;
        }
        log::trace!("drew {} layers, {} done", drawn, self.layer);
        if self.is_finished() {
            StepOutcome::Finished
        } else {
            StepOutcome::Yielded
        }
    }

    pub fn finish(self) -> Completion {
        Completion {
            brush_count: self.params.brush_count,
            brushes_drawn: self.brushes.len(),
            total_layers: u64::from(self.params.brush_count)
                * u64::from(self.params.layers_per_brush),
            palette: self.palette.name.clone(),
            colors_used: self.colors_used,
            used_fallback: false,
        }
    }

    fn draw_fallback_circle<S: Surface>(&self, index: usize, surface: &mut S) {
        let brush = &self.brushes[index];
        let radius = if brush.size.is_finite() && brush.size > 0.0 {
            brush.size / 2.0
        } else {
            MIN_FALLBACK_RADIUS
        };
        surface.fill_circle(
            brush.position(),
            radius,
            Paint::new(brush.color, self.params.opacity),
            BlendMode::Normal,
        );
    }

    fn draw_brush_layer<S: Surface>(
        &mut self,
        index: usize,
        surface: &mut S,
    ) -> Result<(), ShapeError> {
        let Pass {
            ref params,
            ref mut rng,
            ref noise,
            ref brushes,
            layer,
            ..
        } = *self;
        let brush = &brushes[index];
        brush.validate()?;

        let chaos = params.chaos_seepage_intensity;
        let layers = f64::from(params.layers_per_brush);
        let progress = f64::from(layer);

        let near = neighbors(index, brushes, params.max_bleed_distance());
        let color = bleed_color(brush.position(), brush.source_color, &near, params, rng);

        let variation = map(progress, (0.0, layers), (1.2, 0.4));
        let jitter = variation * 15.0 * chaos;
        let center = (brush.x + rng.jitter(jitter), brush.y + rng.jitter(jitter));
        let size = brush.size * rng.uniform(0.6 + variation * 0.3, 1.3 + variation * 0.3);
        let polygon = layer_polygon(center, size, params, layer, rng, noise)?;

        let mut alpha = params.opacity * (0.8 + rng.uniform(0.0, 0.4) * chaos);
        if params.texture_masking {
            alpha *= rng.uniform(0.5, 1.3) * (0.5 + chaos * 0.8);
            alpha *= map(progress, (0.0, layers), (1.4, 0.6));
        }
        surface.fill_polygon(polygon.points(), Paint::new(color, alpha), BlendMode::Multiply);

        if params.edge_complexity > 3 && rng.odds(0.7 * chaos) {
            let settings = ExtensionSettings::from_params(params);
            for extension in
                generate_seepage_extensions(brush.position(), brush.size, settings, rng, noise)
            {
                if extension.len() < 2 {
                    continue;
                }
                let extension_alpha = alpha * rng.uniform(0.3, 0.8) * chaos;
                let width = rng.uniform(1.0, 4.0) * (0.5 + chaos * 0.5);
                surface.stroke_polyline(
                    extension.points(),
                    Paint::new(color, extension_alpha),
                    width,
                    BlendMode::Multiply,
                );
            }
        }

        for zone in wet_blend_zones(brush, &near, layer, params, rng, noise) {
            if zone.spawns_seepage {
                let settings = ExtensionSettings::mini(params);
                let stroke = Paint::new(zone.color, zone.opacity * 0.6);
                let extensions = generate_seepage_extensions(
                    zone.position(),
                    zone.size * 0.5,
                    settings,
                    rng,
                    noise,
                );
                for extension in extensions.iter().filter(|e| e.len() >= 2) {
                    surface.stroke_polyline(extension.points(), stroke, 1.0, BlendMode::Multiply);
                }
            } else {
                let shape = organic_polygon_or_fallback(
                    zone.position(),
                    zone.size,
                    2,
                    Deformation::from_params(params),
                    rng,
                    noise,
                );
                surface.fill_polygon(
                    shape.points(),
                    Paint::new(zone.color, zone.opacity),
                    BlendMode::Multiply,
                );
            }
        }

        if params.texture_masking && rng.odds(0.25 * chaos) {
            let count = (rng.int_range(2, 6) as f64 * (0.5 + chaos * 0.5)).floor() as u32;
            let displacement = 30.0 * chaos;
            for _ in 0..count {
                let theta = rng.angle();
                let reach = rng.uniform(brush.size * 0.2, brush.size * 1.2) * (0.8 + chaos * 0.4);
                let (mut x, mut y) = add_polar_offset(brush.position(), theta, reach);
                x += (noise.turbulence(x, y, 4) - 0.5) * displacement;
                y += (noise.turbulence(x + 1000.0, y, 4) - 0.5) * displacement;
                let diameter = rng.uniform(0.5, 3.0) * (0.7 + chaos * 0.6);
                let dot_alpha = alpha * rng.uniform(0.2, 0.7) * chaos;
                surface.fill_circle(
                    (x, y),
                    diameter / 2.0,
                    Paint::new(color, dot_alpha),
                    BlendMode::Multiply,
                );
            }
        }
        Ok(())
    }
}

/// Clears its flag when dropped, including during unwinding.
struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Runs passes one at a time.
#[derive(Debug, Default)]
pub struct Generator {
    in_flight: Cell<bool>,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.get()
    }

    /// Paints a full composition onto `surface`.
    ///
    /// Returns `None` without touching `surface` if another pass is already running on this
    /// generator, for example one started from inside an observer callback.
    ///
    /// Degenerate geometry and failed brushes are absorbed by the pass, so nothing the generator
    /// computes can abort it. `surface` and `observer` implementations must not panic: a panic in
    /// either unwinds out of this call. The in-flight flag is still cleared on unwind, so the
    /// generator stays usable.
    pub fn generate<S: Surface, O: Observer>(
        &self,
        params: &Params,
        palette: &Palette,
        surface: &mut S,
        observer: &mut O,
    ) -> Option<Completion> {
        if self.in_flight.replace(true) {
            log::debug!("generation already in progress; ignoring request");
            return None;
        }
        let _in_flight = InFlight(&self.in_flight);

        let params = params.clamped();
        log::info!(
            "generating {} brushes x {} layers, palette {}, seed {}, chaos {:.0}%, {:?} seepage",
            params.brush_count,
            params.layers_per_brush,
            palette.name,
            params.random_seed,
            params.chaos_seepage_intensity * 100.0,
            params.seepage_method
        );

        let completion = match Pass::begin(&params, palette, surface) {
            Ok(mut pass) => {
                while pass.step(surface, YIELD_EVERY_LAYERS) == StepOutcome::Yielded {
                    observer.on_yield(pass.layers_done());
                }
                pass.finish()
            }
            Err(e) => {
                log::error!("generation failed: {}; painting fallback", e);
                let colors_used = paint_fallback(surface, &params, palette);
                Completion {
                    brush_count: params.brush_count,
                    brushes_drawn: 0,
                    total_layers: u64::from(params.brush_count)
                        * u64::from(params.layers_per_brush),
                    palette: palette.name.clone(),
                    colors_used,
                    used_fallback: true,
                }
            }
        };

        log::info!(
            "finished with {} brushes, {} colors",
            completion.brushes_drawn,
            completion.colors_used.len()
        );
        observer.on_complete(&completion);
        Some(completion)
    }
}
