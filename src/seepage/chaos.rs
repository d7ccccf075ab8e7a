//! Alternative seepage generators built on classic chaotic and self-similar systems.
//!
//! Each generator grows a handful of open polylines around `center`, scaled by `base_radius`.
//! None of them read the chaos dial directly: the compositor already gates how often extensions
//! are drawn and how strongly they are stroked.

use crate::geometry::{Point, Polyline};
use crate::math::{add_polar_offset, dist, map, pi};
use crate::noise_field::NoiseField;
use crate::rand::Rng;

/// Euler-integrated Lorenz system with the classic `σ = 10, ρ = 28, β = 8/3` parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LorenzAttractor {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
    pub dt: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for LorenzAttractor {
    fn default() -> Self {
        LorenzAttractor {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
            dt: 0.01,
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

impl LorenzAttractor {
    /// Advances one time step and returns the new `(x, y, z)`.
    pub fn step(&mut self) -> (f64, f64, f64) {
        let LorenzAttractor {
            sigma,
            rho,
            beta,
            dt,
            x,
            y,
            z,
        } = *self;
        self.x += sigma * (y - x) * dt;
        self.y += (x * (rho - z) - y) * dt;
        self.z += (x * y - beta * z) * dt;
        (self.x, self.y, self.z)
    }
}

const LORENZ_STEPS: usize = 50;

/// Streams traced by a Lorenz attractor restarted near its upper lobe, projected onto the
/// canvas at a tenth of `base_radius` per unit.
pub fn lorenz_streams(
    center: Point,
    base_radius: f64,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Vec<Polyline> {
    let (cx, cy) = center;
    let scale = base_radius * 0.1;
    let mut attractor = LorenzAttractor::default();
    let streams = rng.int_range(3, 8);

    (0..streams)
        .map(|s| {
            let s = s as f64;
            attractor.x = rng.uniform(-2.0, 2.0);
            attractor.y = rng.uniform(-2.0, 2.0);
            attractor.z = rng.uniform(20.0, 30.0);
            let points = (0..LORENZ_STEPS)
                .map(|i| {
                    let (ax, ay, _) = attractor.step();
                    let i = i as f64;
                    let wobble_x = noise.sample2(i * 0.3, s * 100.0) * 20.0 - 10.0;
                    let wobble_y = noise.sample2(i * 0.3 + 1000.0, s * 100.0) * 20.0 - 10.0;
                    (cx + ax * scale + wobble_x, cy + ay * scale + wobble_y)
                })
                .collect();
            Polyline(points)
        })
        .collect()
}

/// Grid of flow angles built from three octaves of noise at different scales.
#[derive(Debug, Clone, PartialEq)]
pub struct ChaosFlowField {
    origin: Point,
    resolution: f64,
    cols: usize,
    rows: usize,
    angles: Vec<f64>,
}

impl ChaosFlowField {
    /// Covers the `extent`-sized square whose top-left corner is `origin`.
    pub fn new(origin: Point, extent: f64, resolution: f64, noise: &NoiseField) -> Self {
        let cells = (extent.max(0.0) / resolution).floor() as usize + 1;
        let (cols, rows) = (cells, cells);
        let mut angles = Vec::with_capacity(cols * rows);
        for col in 0..cols {
            for row in 0..rows {
                let (c, r) = (col as f64, row as f64);
                let angle = noise.sample2(c * 0.1, r * 0.1) * pi(8.0)
                    + noise.sample2(c * 0.02, r * 0.02) * pi(4.0)
                    + noise.sample2(c * 0.5, r * 0.5) * pi(1.0);
                angles.push(angle);
            }
        }
        ChaosFlowField {
            origin,
            resolution,
            cols,
            rows,
            angles,
        }
    }

    /// Flow angle of the cell containing `(x, y)`. Points outside the grid use the nearest edge
    /// cell.
    pub fn flow(&self, (x, y): Point) -> f64 {
        let cell = |v: f64, len: usize| -> usize {
            let max = (len - 1) as f64;
            let v = v / self.resolution;
            if v.is_nan() {
                0
            } else {
                v.clamp(0.0, max).floor() as usize
            }
        };
        let col = cell(x - self.origin.0, self.cols);
        let row = cell(y - self.origin.1, self.rows);
        self.angles[col * self.rows + row]
    }
}

const FLOW_RESOLUTION: f64 = 15.0;

/// Particles dropped near `center` that drift along a [`ChaosFlowField`] until they stray more
/// than `2 * base_radius` away.
pub fn flow_field_followers(
    center: Point,
    base_radius: f64,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Vec<Polyline> {
    let reach = base_radius * 2.0;
    let origin = (center.0 - reach, center.1 - reach);
    let field = ChaosFlowField::new(origin, reach * 2.0, FLOW_RESOLUTION, noise);
    let followers = rng.int_range(5, 12);

    (0..followers)
        .map(|f| {
            let f = f as f64;
            let spread = base_radius * 0.3;
            let mut current = (
                center.0 + rng.jitter(spread),
                center.1 + rng.jitter(spread),
            );
            let mut trail = vec![current];
            let steps = rng.int_range(20, 60);
            for step in 0..steps {
                let (x, y) = current;
                let speed = 1.0 + noise.sample2(step as f64 * 0.2, f * 50.0) * 2.0;
                let swirl = noise.sample2(x * 0.01, y * 0.01) * pi(0.4);
                current = add_polar_offset(current, field.flow(current) + swirl, speed);
                trail.push(current);
                if dist(current, center) > reach {
                    break;
                }
            }
            Polyline(trail)
        })
        .collect()
}

/// One limb of a recursive branching network.
#[derive(Debug, Clone, PartialEq)]
pub struct FractalBranch {
    /// Starts at the branch origin.
    pub points: Vec<Point>,
    pub children: Vec<FractalBranch>,
}

impl FractalBranch {
    /// Grows a branch of total path length `length`, then up to three children from points
    /// along it, until `max_generation` is reached or branches get shorter than five pixels.
    pub fn grow(
        origin: Point,
        heading: f64,
        length: f64,
        generation: u32,
        max_generation: u32,
        rng: &mut Rng,
        noise: &NoiseField,
    ) -> Self {
        let segments = (length / 3.0).floor().max(0.0) as usize;
        let step = if segments > 0 {
            length / segments as f64
        } else {
            0.0
        };

        let mut points = Vec::with_capacity(segments + 1);
        points.push(origin);
        let mut current = origin;
        let mut angle = heading;
        for _ in 0..segments {
            let (x, y) = current;
            let pull = noise.sample(x * 0.01, y * 0.01, f64::from(generation) * 0.5) * pi(0.3);
            let turbulence = noise.sample2(x * 0.05, y * 0.05) * 0.4;
            angle += pull + (turbulence - 0.2);
            current = add_polar_offset(current, angle, step);
            points.push(current);
        }

        let mut children = Vec::new();
        if generation < max_generation && length > 5.0 && segments > 0 {
            for _ in 0..rng.int_range(1, 4) {
                let child_heading = heading + rng.uniform(-pi(0.5), pi(0.5));
                let child_length = length * rng.uniform(0.4, 0.8);
                // Skip the origin so children sprout from the grown part.
                let at = 1 + (segments as f64 * rng.uniform(0.3, 0.9)) as usize;
                if let Some(&fork) = points.get(at) {
                    children.push(FractalBranch::grow(
                        fork,
                        child_heading,
                        child_length,
                        generation + 1,
                        max_generation,
                        rng,
                        noise,
                    ));
                }
            }
        }
        FractalBranch { points, children }
    }

    /// Flattens the tree depth-first, one polyline per branch. Branches too short to draw are
    /// dropped.
    pub fn into_polylines(self, out: &mut Vec<Polyline>) {
        if self.points.len() >= 2 {
            out.push(Polyline(self.points));
        }
        for child in self.children {
            child.into_polylines(out);
        }
    }
}

const FRACTAL_MAX_GENERATION: u32 = 3;

/// Two to five branching trees fanned evenly around `center`.
pub fn fractal_branches(
    center: Point,
    base_radius: f64,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Vec<Polyline> {
    let roots = rng.int_range(2, 6);
    let mut out = Vec::new();
    for b in 0..roots {
        let heading = pi(2.0) / roots as f64 * b as f64 + rng.uniform(-pi(0.25), pi(0.25));
        let length = base_radius * rng.uniform(0.5, 1.2);
        let origin = add_polar_offset(center, heading, base_radius * 0.2);
        FractalBranch::grow(
            origin,
            heading,
            length,
            0,
            FRACTAL_MAX_GENERATION,
            rng,
            noise,
        )
        .into_polylines(&mut out);
    }
    out
}

pub const CELL_SIZE: f64 = 5.0;
const CELLULAR_GENERATIONS: u32 = 3;

/// A disk of live cells grown outward by a noisy automaton. Cells never die; each generation a
/// dead interior cell comes alive with a probability rising with its live neighborhood.
///
/// Every vertical run of at least two live cells becomes one polyline, so the result reads as
/// closely spaced vertical hatching.
pub fn cellular_growth(
    center: Point,
    base_radius: f64,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Vec<Polyline> {
    let n = (base_radius * 2.0 / CELL_SIZE).floor().max(0.0) as usize;
    if n == 0 {
        return Vec::new();
    }
    let half = n as f64 * CELL_SIZE / 2.0;
    let mut grid: Vec<bool> = (0..n * n)
        .map(|i| {
            let (x, y) = ((i / n) as f64 * CELL_SIZE, (i % n) as f64 * CELL_SIZE);
            dist((x, y), (half, half)) < base_radius * 0.8
        })
        .collect();

    for generation in 0..CELLULAR_GENERATIONS {
        let mut next = grid.clone();
        for x in 1..n.saturating_sub(1) {
            for y in 1..n - 1 {
                let live = (x - 1..=x + 1)
                    .flat_map(|nx| (y - 1..=y + 1).map(move |ny| (nx, ny)))
                    .filter(|&(nx, ny)| grid[nx * n + ny])
                    .count();
                let growth = map(live as f64, (0.0, 9.0), (0.1, 0.8))
                    * noise.sample(x as f64 * 0.3, y as f64 * 0.3, f64::from(generation) * 0.5);
                if rng.rnd() < growth {
                    next[x * n + y] = true;
                }
            }
        }
        grid = next;
    }

    let (left, top) = (center.0 - half, center.1 - half);
    let mut out = Vec::new();
    for x in 0..n {
        let mut run = Vec::new();
        for y in 0..=n {
            if y < n && grid[x * n + y] {
                run.push((left + x as f64 * CELL_SIZE, top + y as f64 * CELL_SIZE));
            } else if run.len() >= 2 {
                out.push(Polyline(std::mem::take(&mut run)));
            } else {
                run.clear();
            }
        }
    }
    out
}

/// Sunflower spirals: point `i` sits at radius `√i` and turns by the golden angle, with noise
/// nudging both.
pub fn fibonacci_spirals(
    center: Point,
    base_radius: f64,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Vec<Polyline> {
    let golden_angle = pi(3.0 - 5f64.sqrt());
    let spirals = rng.int_range(2, 5);
    (0..spirals)
        .map(|s| {
            let s = s as f64;
            let count = rng.int_range(30, 80);
            let points = (0..count)
                .map(|i| {
                    let i = i as f64;
                    let swell = 1.0 + noise.sample2(i * 0.1, s * 50.0) * 0.8;
                    let r = i.sqrt() * base_radius * 0.1 * swell;
                    let theta =
                        i * golden_angle + s * pi(0.5) + noise.sample2(i * 0.2, s * 50.0) * 0.4;
                    add_polar_offset(center, theta, r)
                })
                .collect();
            Polyline(points)
        })
        .collect()
}

const WAVE_POINTS: usize = 60;

/// Rings whose radius beats between a product of sines and a noise term, like the
/// fronts of a reaction-diffusion system.
pub fn reaction_diffusion_waves(
    center: Point,
    base_radius: f64,
    rng: &mut Rng,
    noise: &NoiseField,
) -> Vec<Polyline> {
    let waves = rng.int_range(3, 7);
    (0..waves)
        .map(|w| {
            let w = w as f64;
            let start = rng.angle();
            let amplitude = base_radius * rng.uniform(0.2, 0.6);
            let points = (0..WAVE_POINTS)
                .map(|i| {
                    let t = i as f64 / WAVE_POINTS as f64;
                    let i = i as f64;
                    let reaction = (i * 0.5).sin() * (i * 0.3).cos();
                    let diffusion = noise.sample2(i * 0.2, w * 100.0) * 2.0 - 1.0;
                    let r = base_radius * 0.3 + amplitude * (reaction + diffusion * 0.5);
                    add_polar_offset(center, start + t * pi(2.0), r)
                })
                .collect();
            Polyline(points)
        })
        .collect()
}
