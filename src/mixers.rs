//! Pure color mixers: depth shading, neighbor bleed and wet-on-wet blend zones.

use crate::brush::Brush;
use crate::color::Rgb;
use crate::config::Params;
use crate::geometry::Point;
use crate::math::{dist, lerp, map};
use crate::noise_field::NoiseField;
use crate::rand::Rng;

/// Bleed influence of a neighbor sitting exactly on top of the brush.
const MAX_BLEED_INFLUENCE: f64 = 0.4;

/// Scales `color` by a noise-driven factor in `[0.7, 1.3]`. Darkened regions also shift toward
/// blue, as light does through deeper water.
pub fn depth_shade(color: Rgb, x: f64, y: f64, depth: u32, noise: &NoiseField) -> Rgb {
    let n = noise.sample(x * 0.003, y * 0.003, f64::from(depth) * 0.1);
    let factor = map(n, (0.0, 1.0), (0.7, 1.3));

    let [r, g, b] = color.to_f64();
    let mut r = (r * factor).clamp(0.0, 255.0);
    let g = (g * factor).clamp(0.0, 255.0);
    let mut b = (b * factor).clamp(0.0, 255.0);

    if factor < 1.0 {
        let tint = (1.0 - factor) * 20.0;
        b = (b + tint).clamp(0.0, 255.0);
        r = (r - tint * 0.3).clamp(0.0, 255.0);
    }
    Rgb::from_f64(r, g, b)
}

/// Pulls `base` toward the colors of nearby brushes.
///
/// Neighbors are applied one after another, so later neighbors partially override earlier ones.
/// Returns `base` untouched when bleeding is off or nothing is in range.
pub fn bleed_color(
    position: Point,
    base: Rgb,
    neighbors: &[&Brush],
    params: &Params,
    rng: &mut Rng,
) -> Rgb {
    if !params.color_bleeding {
        return base;
    }
    let max_bleed = params.max_bleed_distance();
    let [mut r, mut g, mut b] = base.to_f64();
    let mut bled = false;
    for neighbor in neighbors {
        let d = dist(position, neighbor.position());
        if d < max_bleed {
            bled = true;
            let influence =
                map(d, (0.0, max_bleed), (MAX_BLEED_INFLUENCE, 0.0)) * params.bleeding_intensity;
            let [nr, ng, nb] = neighbor.color.to_f64();
            r = lerp(r, nr, influence);
            g = lerp(g, ng, influence);
            b = lerp(b, nb, influence);
        }
    }
    if !bled {
        return base;
    }

    let variation = params.chaos_seepage_intensity * 15.0;
    Rgb::from_f64(
        r + rng.jitter(variation),
        g + rng.jitter(variation),
        b + rng.jitter(variation),
    )
}

/// A patch of color between two nearby brushes, drawn for one layer only.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendZone {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: Rgb,
    /// Fill alpha on a 0-255 scale.
    pub opacity: f64,
    /// Draw as miniature seepage strokes instead of a filled shape.
    pub spawns_seepage: bool,
}

impl BlendZone {
    pub fn position(&self) -> Point {
        (self.x, self.y)
    }
}

/// Distance under which two brushes blend wet-on-wet.
pub fn wet_distance(params: &Params) -> f64 {
    let chaos = params.chaos_seepage_intensity;
    params.wet_blend_radius * params.bleeding_intensity * (1.0 + chaos * 0.5)
}

/// Lays a trail of blend zones from `brush` toward each neighbor close enough to still be wet.
pub fn wet_blend_zones(
    brush: &Brush,
    neighbors: &[&Brush],
    layer: u32,
    params: &Params,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Vec<BlendZone> {
    if !params.wet_on_wet || neighbors.is_empty() {
        return Vec::new();
    }
    let chaos = params.chaos_seepage_intensity;
    let deform = params.deform_strength;
    let wet = wet_distance(params);

    let mut zones = Vec::new();
    for neighbor in neighbors {
        let d = dist(brush.position(), neighbor.position());
        if !(d > 0.0 && d < wet) {
            continue;
        }
        let segments = (rng.int_range(8, 16) as f64 * (0.5 + chaos * 0.5)).floor() as u32;
        let [br, bg, bb] = brush.color.to_f64();
        let [nr, ng, nb] = neighbor.color.to_f64();
        for step in 1..=segments {
            let t = f64::from(step) / f64::from(segments + 1);
            let base_x = lerp(brush.x, neighbor.x, t);
            let base_y = lerp(brush.y, neighbor.y, t);

            let turbulence = noise.turbulence(base_x, base_y, 4) * 50.0 * chaos;
            let flow =
                noise.sample(base_x * 0.005, base_y * 0.005, f64::from(layer) * 0.1) * 80.0 * chaos;
            let x = base_x + (turbulence - 25.0 * chaos) * deform;
            let y = base_y + (flow - 40.0 * chaos) * deform;

            let size = lerp(brush.size, neighbor.size, t) * (0.4 + rng.uniform(0.0, 0.4));

            let color_chaos = 20.0 * chaos;
            let color = Rgb::from_f64(
                lerp(br, nr, t * 0.8) + rng.jitter(color_chaos),
                lerp(bg, ng, t * 0.8) + rng.jitter(color_chaos),
                lerp(bb, nb, t * 0.8) + rng.jitter(color_chaos),
            );

            zones.push(BlendZone {
                x,
                y,
                size,
                color,
                opacity: params.opacity * 0.3 * (1.0 - t * 0.3),
                spawns_seepage: rng.odds(0.4 * chaos),
            });
        }
    }
    zones
}
