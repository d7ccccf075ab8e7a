use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundStyle {
    #[default]
    White,
    Paper,
    Gradient,
}

/// Generator used for the seepage extensions radiating from brushes.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SeepageMethod {
    /// Noise-steered walks with short side branches.
    #[default]
    Capillary,
    /// Streams traced by a Lorenz attractor.
    Lorenz,
    /// Particles following a multi-scale noise flow field.
    FlowField,
    /// Recursive branching trees.
    Fractal,
    /// Hatching over a disk grown by a noisy cellular automaton.
    Cellular,
    /// Golden-angle spirals.
    Fibonacci,
    /// Rings with beating sine and noise radii.
    ReactionDiffusion,
    /// Three randomly chosen methods from the list above, excluding capillary walks.
    Hybrid,
}

/// Generation parameters for one pass.
///
/// Doubles as a CLI argument group and as a JSON document; field names in JSON are camelCase
/// (`brushCount`, `chaosSeepageIntensity`, ...) and any missing field takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, clap::Args)]
#[serde(default, rename_all = "camelCase")]
pub struct Params {
    /// Number of brushes to place.
    #[clap(long, default_value_t = 12)]
    pub brush_count: u32,

    /// Number of translucent layers painted per brush.
    #[clap(long, default_value_t = 25)]
    pub layers_per_brush: u32,

    /// Nominal brush radius, in pixels.
    #[clap(long, default_value_t = 90.0)]
    pub brush_size: f64,

    /// Number of midpoint-subdivision rounds applied to each shape.
    #[clap(long, default_value_t = 4)]
    pub edge_complexity: u32,

    /// Displacement magnitude of subdivided vertices.
    #[clap(long, default_value_t = 0.3)]
    pub deform_strength: f64,

    /// Base fill alpha, on a 0-255 scale.
    #[clap(long, default_value_t = 8.0)]
    pub opacity: f64,

    #[clap(long = "seed", default_value_t = 42)]
    pub random_seed: u32,

    #[clap(long = "background", value_enum, default_value_t = BackgroundStyle::White)]
    pub background_type: BackgroundStyle,

    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub texture_masking: bool,

    #[clap(long, default_value_t = 0.7)]
    pub texture_intensity: f64,

    #[clap(long, default_value_t = 800.0)]
    pub texture_density: f64,

    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub color_bleeding: bool,

    #[clap(long, default_value_t = 0.6)]
    pub bleeding_intensity: f64,

    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub wet_on_wet: bool,

    #[clap(long, default_value_t = 40.0)]
    pub wet_blend_radius: f64,

    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub depth_effect: bool,

    #[clap(long, default_value_t = 3)]
    pub depth_layers: u32,

    /// Build per-layer shapes by a noise-steered walk instead of subdivision.
    #[clap(long)]
    pub random_walk_mode: bool,

    /// Global 0-1 dial scaling the magnitude and probability of nearly every stochastic effect.
    #[clap(long = "chaos", default_value_t = 0.7)]
    pub chaos_seepage_intensity: f64,

    #[clap(long, value_enum, default_value_t = SeepageMethod::Capillary)]
    pub seepage_method: SeepageMethod,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            brush_count: 12,
            layers_per_brush: 25,
            brush_size: 90.0,
            edge_complexity: 4,
            deform_strength: 0.3,
            opacity: 8.0,
            random_seed: 42,
            background_type: BackgroundStyle::White,
            texture_masking: true,
            texture_intensity: 0.7,
            texture_density: 800.0,
            color_bleeding: true,
            bleeding_intensity: 0.6,
            wet_on_wet: true,
            wet_blend_radius: 40.0,
            depth_effect: true,
            depth_layers: 3,
            random_walk_mode: false,
            chaos_seepage_intensity: 0.7,
            seepage_method: SeepageMethod::Capillary,
        }
    }
}

fn clamp_f64(v: f64, min: f64, max: f64, default: f64) -> f64 {
    if v.is_nan() {
        default
    } else {
        v.clamp(min, max)
    }
}

impl Params {
    /// Parses a JSON parameter document and clamps it into range.
    pub fn from_json(json: &str) -> Result<Params, serde_json::Error> {
        let params: Params = serde_json::from_str(json)?;
        Ok(params.clamped())
    }

    /// Returns a copy with every numeric field forced into its supported range. NaN falls back to
    /// the field's default.
    pub fn clamped(&self) -> Params {
        let d = Params::default();
        Params {
            brush_count: self.brush_count.clamp(1, 200),
            layers_per_brush: self.layers_per_brush.clamp(1, 200),
            brush_size: clamp_f64(self.brush_size, 5.0, 400.0, d.brush_size),
            edge_complexity: self.edge_complexity.min(10),
            deform_strength: clamp_f64(self.deform_strength, 0.0, 2.0, d.deform_strength),
            opacity: clamp_f64(self.opacity, 0.0, 255.0, d.opacity),
            random_seed: self.random_seed,
            background_type: self.background_type,
            texture_masking: self.texture_masking,
            texture_intensity: clamp_f64(self.texture_intensity, 0.0, 1.0, d.texture_intensity),
            texture_density: clamp_f64(self.texture_density, 100.0, 3000.0, d.texture_density),
            color_bleeding: self.color_bleeding,
            bleeding_intensity: clamp_f64(self.bleeding_intensity, 0.0, 1.0, d.bleeding_intensity),
            wet_on_wet: self.wet_on_wet,
            wet_blend_radius: clamp_f64(self.wet_blend_radius, 0.0, 300.0, d.wet_blend_radius),
            depth_effect: self.depth_effect,
            depth_layers: self.depth_layers.clamp(1, 10),
            random_walk_mode: self.random_walk_mode,
            chaos_seepage_intensity: clamp_f64(
                self.chaos_seepage_intensity,
                0.0,
                1.0,
                d.chaos_seepage_intensity,
            ),
            seepage_method: self.seepage_method,
        }
    }

    /// Distance within which brushes bleed color into each other.
    pub fn max_bleed_distance(&self) -> f64 {
        self.brush_size * 2.0 * self.bleeding_intensity
    }

    /// Number of depth buckets brushes are spread across.
    pub fn effective_depth_layers(&self) -> u32 {
        if self.depth_effect {
            self.depth_layers.max(1)
        } else {
            1
        }
    }
}
