//! Organic polygon generation.
//!
//! A shape starts as a small irregular polygon whose angles and radii are perturbed by coherent
//! noise, and is then refined by repeated edge subdivision: every round keeps each vertex and
//! inserts a displaced midpoint after it. Round count and displacement scale are independent, so
//! complexity and chaos can be tuned separately. Because each round displaces at its own scale,
//! the silhouette reads as a blob rather than as jitter.

use std::fmt;

use crate::config::Params;
use crate::geometry::{Point, Polygon};
use crate::math::{add_polar_offset, angle, dist, lerp, map, pi};
use crate::noise_field::NoiseField;
use crate::rand::Rng;

/// Vertex count of the regular polygon substituted for degenerate shapes.
pub const FALLBACK_SIDES: usize = 12;

/// Circumradius used by [`fallback_polygon`] when the requested radius is not positive.
pub const MIN_FALLBACK_RADIUS: f64 = 1.0;

const MIN_BASE_SIDES: i64 = 6;
const MAX_BASE_SIDES: i64 = 10;

const RANDOM_WALK_STEPS: usize = 40;
const MAX_TEXTURE_POINTS_PER_EDGE: usize = 64;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ShapeError {
    /// The base radius was zero, negative or not finite.
    DegenerateRadius(f64),
    /// The center had a non-finite coordinate.
    DegenerateCenter,
    /// Generation produced fewer than three points.
    TooFewPoints(usize),
    /// Generation produced a non-finite vertex.
    NonFinite,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::DegenerateRadius(r) => write!(f, "degenerate shape radius {}", r),
            ShapeError::DegenerateCenter => f.write_str("shape center is not finite"),
            ShapeError::TooFewPoints(n) => write!(f, "shape has only {} points", n),
            ShapeError::NonFinite => f.write_str("shape has a non-finite vertex"),
        }
    }
}

impl std::error::Error for ShapeError {}

/// How strongly subdivided vertices are displaced.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Deformation {
    pub strength: f64,
    pub chaos: f64,
}

impl Deformation {
    pub fn from_params(params: &Params) -> Self {
        Deformation {
            strength: params.deform_strength,
            chaos: params.chaos_seepage_intensity,
        }
    }
}

/// Number of subdivision rounds actually run for a requested complexity.
///
/// Zero stays zero; anything else runs at least two rounds, more as chaos rises.
pub fn effective_rounds(complexity: u32, chaos: f64) -> u32 {
    if complexity == 0 {
        return 0;
    }
    let scaled = (f64::from(complexity) * (0.5 + chaos * 0.5)).floor() as u32;
    scaled.max(2)
}

/// Builds an irregular closed polygon around `center`.
pub fn generate_organic_polygon(
    center: Point,
    base_radius: f64,
    complexity: u32,
    deformation: Deformation,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Result<Polygon, ShapeError> {
    if !(base_radius.is_finite() && base_radius > 0.0) {
        return Err(ShapeError::DegenerateRadius(base_radius));
    }
    let (cx, cy) = center;
    if !(cx.is_finite() && cy.is_finite()) {
        return Err(ShapeError::DegenerateCenter);
    }
    let chaos = deformation.chaos;

    let sides = rng.int_range(MIN_BASE_SIDES, MAX_BASE_SIDES) as usize;
    let mut vertices: Vec<Point> = (0..sides)
        .map(|i| {
            let fi = i as f64;
            let n1 = noise.sample(fi * 0.5, cx * 0.001, cy * 0.001);
            let n2 = noise.turbulence(cx + fi * 50.0, cy + fi * 50.0, 4);
            let variation = (n1 - 0.5) * 1.2 + (n2 - 0.5) * 0.8;
            let theta = (pi(2.0) / sides as f64) * fi + variation * chaos;

            let radius_noise = noise.turbulence(fi * 100.0 + cx, fi * 100.0 + cy, 3);
            let radius = base_radius * (0.7 + (0.3 + radius_noise * 1.2) * chaos * 0.3);
            add_polar_offset(center, theta, radius)
        })
        .collect();

    for round in 0..effective_rounds(complexity, chaos) {
        vertices = subdivide(&vertices, center, round, deformation, noise);
    }

    let polygon = Polygon(vertices);
    if polygon.len() < 3 {
        return Err(ShapeError::TooFewPoints(polygon.len()));
    }
    if !polygon.is_finite() {
        return Err(ShapeError::NonFinite);
    }
    Ok(polygon)
}

/// One subdivision round: keep every vertex and follow it with its displaced edge midpoint.
fn subdivide(
    vertices: &[Point],
    center: Point,
    round: u32,
    deformation: Deformation,
    noise: &NoiseField,
) -> Vec<Point> {
    let Deformation { strength, chaos } = deformation;
    let r = f64::from(round);
    let n = vertices.len();
    let mut out = Vec::with_capacity(n * 2);
    for i in 0..n {
        let current = vertices[i];
        let next = vertices[(i + 1) % n];
        out.push(current);

        let mid_x = (current.0 + next.0) / 2.0;
        let mid_y = (current.1 + next.1) / 2.0;

        let nx1 = noise.turbulence(mid_x * 0.005, mid_y * 0.005, round + 1);
        let ny1 = noise.turbulence(mid_x * 0.005 + 1000.0, mid_y * 0.005, round + 1);
        let nx2 = noise.sample(mid_x * 0.02, mid_y * 0.02, r * 0.1);
        let ny2 = noise.sample(mid_x * 0.02 + 2000.0, mid_y * 0.02, r * 0.1);

        let magnitude = strength * 60.0 * (1.0 + r * 0.3) * chaos;
        let mut dx = (nx1 - 0.5) * magnitude + (nx2 - 0.5) * magnitude * 0.5;
        let mut dy = (ny1 - 0.5) * magnitude + (ny2 - 0.5) * magnitude * 0.5;

        // Outward flow bias: seepage spreads away from the center rather than symmetrically.
        let flow =
            angle(center, (mid_x, mid_y)) + noise.sample2(mid_x * 0.01, mid_y * 0.01) * pi(1.0);
        let flow_strength = strength * 20.0 * chaos;
        dx += flow.cos() * flow_strength;
        dy += flow.sin() * flow_strength;

        out.push((mid_x + dx, mid_y + dy));
    }
    out
}

/// Regular [`FALLBACK_SIDES`]-gon inscribed at `radius` around `center`.
pub fn fallback_polygon(center: Point, radius: f64) -> Polygon {
    let radius = if radius.is_finite() && radius > 0.0 {
        radius
    } else {
        MIN_FALLBACK_RADIUS
    };
    Polygon(
        (0..FALLBACK_SIDES)
            .map(|i| add_polar_offset(center, (pi(2.0) / FALLBACK_SIDES as f64) * i as f64, radius))
            .collect(),
    )
}

/// Like [`generate_organic_polygon`], substituting [`fallback_polygon`] on failure.
pub fn organic_polygon_or_fallback(
    center: Point,
    base_radius: f64,
    complexity: u32,
    deformation: Deformation,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Polygon {
    match generate_organic_polygon(center, base_radius, complexity, deformation, rng, noise) {
        Ok(polygon) => polygon,
        Err(e) => {
            log::trace!("shape at {:?} fell back: {}", center, e);
            fallback_polygon(center, base_radius)
        }
    }
}

/// Builds a shape by walking away from `center` along a noise-steered heading. Points that wander
/// beyond `1.3 * base_radius` are dropped.
pub fn random_walk_polygon(
    center: Point,
    base_radius: f64,
    deform_strength: f64,
    z: f64,
    noise: &NoiseField,
) -> Result<Polygon, ShapeError> {
    if !(base_radius.is_finite() && base_radius > 0.0) {
        return Err(ShapeError::DegenerateRadius(base_radius));
    }
    let mut position = center;
    let mut heading = 0.0;
    let mut vertices = Vec::with_capacity(RANDOM_WALK_STEPS);
    for i in 0..RANDOM_WALK_STEPS {
        let fi = i as f64;
        heading += (noise.sample2(fi * 0.1, z) - 0.5) * deform_strength * 1.5;
        let step = base_radius / RANDOM_WALK_STEPS as f64 * (0.8 + noise.sample1(fi * 0.05) * 0.4);
        position = add_polar_offset(position, heading, step);
        if dist(position, center) < base_radius * 1.3 {
            vertices.push(position);
        }
    }
    let polygon = Polygon(vertices);
    if polygon.len() < 3 {
        return Err(ShapeError::TooFewPoints(polygon.len()));
    }
    if !polygon.is_finite() {
        return Err(ShapeError::NonFinite);
    }
    Ok(polygon)
}

/// Roughens edges to imitate paper absorption: long edges get extra points pushed off the edge
/// line, occasionally inward.
pub fn apply_edge_texture(
    polygon: &Polygon,
    intensity: f64,
    density: f64,
    z: f64,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Polygon {
    let mut out = Vec::with_capacity(polygon.len() * 2);
    for (current, next) in polygon.edges() {
        out.push(current);

        let edge_length = dist(current, next);
        let count = map(edge_length, (10.0, 100.0), (1.0, density / 300.0));
        let count = if count.is_finite() && count > 0.0 {
            (count as usize).min(MAX_TEXTURE_POINTS_PER_EDGE)
        } else {
            0
        };
        let perpendicular = angle(current, next) + pi(0.5);
        for t in 1..count {
            let progress = t as f64 / count as f64;
            let edge_x = lerp(current.0, next.0, progress);
            let edge_y = lerp(current.1, next.1, progress);
            let n = noise.sample(edge_x * 0.01, edge_y * 0.01, z);
            let mut displacement = (n - 0.5) * intensity * 30.0;
            if rng.odds(intensity * 0.4) {
                displacement = -displacement;
            }
            out.push(add_polar_offset((edge_x, edge_y), perpendicular, displacement));
        }
    }
    Polygon(out)
}
