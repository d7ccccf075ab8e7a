use ::noise::{NoiseFn, Perlin};

const OCTAVES: usize = 4;
const FALLOFF: f64 = 0.5;

/// Base frequency of [`NoiseField::turbulence`]; tuned for canvas pixel coordinates.
const TURBULENCE_FREQUENCY: f64 = 0.003;

/// Coherent noise over 1-3 dimensions, returning values in `[0, 1]`.
///
/// This is a pure function of its coordinates and the field seed. It is not tied to the pass
/// [`Rng`][crate::rand::Rng], so reseeding a pass changes brush placement but not the shape of
/// the field itself.
#[derive(Clone)]
pub struct NoiseField {
    perlin: Perlin,
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").finish_non_exhaustive()
    }
}

impl Default for NoiseField {
    fn default() -> Self {
        NoiseField::new(Perlin::DEFAULT_SEED)
    }
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        NoiseField {
            perlin: Perlin::new(seed),
        }
    }

    /// Octave-summed Perlin noise at `(x, y, z)`, remapped to `[0, 1]`.
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let mut sum = 0.0;
        let mut amplitude = FALLOFF;
        let mut frequency = 1.0;
        for _ in 0..OCTAVES {
            sum += amplitude * self.perlin.get([x * frequency, y * frequency, z * frequency]);
            amplitude *= FALLOFF;
            frequency *= 2.0;
        }
        (0.5 + 0.5 * sum).clamp(0.0, 1.0)
    }

    pub fn sample2(&self, x: f64, y: f64) -> f64 {
        self.sample(x, y, 0.0)
    }

    pub fn sample1(&self, x: f64) -> f64 {
        self.sample(x, 0.0, 0.0)
    }

    /// Sum of `octaves` samples starting at a low frequency, doubling frequency and halving
    /// amplitude each octave. The result lies in `[0, 2)`.
    pub fn turbulence(&self, x: f64, y: f64, octaves: u32) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = TURBULENCE_FREQUENCY;
        for _ in 0..octaves {
            value += self.sample2(x * frequency, y * frequency) * amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        value
    }
}
