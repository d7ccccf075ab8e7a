use std::fmt;

use crate::color::{Palette, Rgb};
use crate::config::Params;
use crate::geometry::{Point, Polygon};
use crate::math::dist;
use crate::mixers::depth_shade;
use crate::noise_field::NoiseField;
use crate::rand::Rng;
use crate::shape::{generate_organic_polygon, Deformation, ShapeError};

/// Size of the area brushes are scattered over.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

/// One persistent unit of composition, reused across every layer of a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// Depth-shaded and jittered color; used for fallback drawing.
    pub color: Rgb,
    /// The palette entry as sampled. Bleed is always re-derived from this.
    pub source_color: Rgb,
    pub depth: u32,
    pub base_polygon: Polygon,
}

impl Brush {
    pub fn position(&self) -> Point {
        (self.x, self.y)
    }

    /// Checks that the brush can be drawn as an organic shape at all.
    pub fn validate(&self) -> Result<(), ShapeError> {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(ShapeError::DegenerateCenter);
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(ShapeError::DegenerateRadius(self.size));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BrushError {
    EmptyPalette,
    Shape(ShapeError),
}

impl fmt::Display for BrushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrushError::EmptyPalette => f.write_str("palette has no colors"),
            BrushError::Shape(e) => write!(f, "brush outline: {}", e),
        }
    }
}

impl std::error::Error for BrushError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrushError::Shape(e) => Some(e),
            BrushError::EmptyPalette => None,
        }
    }
}

impl From<ShapeError> for BrushError {
    fn from(e: ShapeError) -> Self {
        BrushError::Shape(e)
    }
}

/// Samples a brush somewhere over (and slightly beyond) `bounds`.
///
/// With more chaos the scatter area grows past the canvas edges so that seepage can bleed in from
/// off-canvas brushes.
pub fn create_brush(
    bounds: Bounds,
    params: &Params,
    palette: &Palette,
    depth: u32,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Result<Brush, BrushError> {
    let chaos = params.chaos_seepage_intensity;
    let buffer = params.brush_size * (0.5 + chaos * 0.5);
    let x = rng.uniform(-buffer, bounds.width + buffer);
    let y = rng.uniform(-buffer, bounds.height + buffer);
    let size = rng.uniform(params.brush_size * 0.7, params.brush_size * 1.3);

    let source_color = *rng.choice(&palette.colors).ok_or(BrushError::EmptyPalette)?;
    let shaded = if params.depth_effect {
        depth_shade(source_color, x, y, depth, noise)
    } else {
        source_color
    };
    let color_jitter = 25.0 * chaos;
    let [r, g, b] = shaded.to_f64();
    let color = Rgb::from_f64(
        r + rng.jitter(color_jitter),
        g + rng.jitter(color_jitter),
        b + rng.jitter(color_jitter),
    );

    let base_polygon = generate_organic_polygon(
        (x, y),
        size,
        params.edge_complexity,
        Deformation::from_params(params),
        rng,
        noise,
    )?;

    Ok(Brush {
        x,
        y,
        size,
        color,
        source_color,
        depth,
        base_polygon,
    })
}

/// All brushes other than `brushes[index]` strictly closer than `max_distance`.
///
/// A plain linear scan: passes hold tens of brushes, not thousands.
pub fn neighbors(index: usize, brushes: &[Brush], max_distance: f64) -> Vec<&Brush> {
    let Some(brush) = brushes.get(index) else {
        return Vec::new();
    };
    brushes
        .iter()
        .enumerate()
        .filter(|&(i, other)| i != index && dist(brush.position(), other.position()) < max_distance)
        .map(|(_, other)| other)
        .collect()
}
