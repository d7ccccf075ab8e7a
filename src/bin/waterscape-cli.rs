use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::Parser;

use waterscape::art::{Completion, Generator, Observer};
use waterscape::color::PaletteDb;
use waterscape::config::Params;
use waterscape::logging::{init_logging, LoggingConfig};
use waterscape::surface::RasterSurface;

#[derive(Parser)]
struct Opts {
    /// JSON parameter document (camelCase keys). Fields it sets override the flags below.
    #[clap(long)]
    config: Option<PathBuf>,
    #[clap(long, default_value = "vibrant")]
    palette: String,
    #[clap(short, long, default_value_t = 800)]
    width: u32,
    #[clap(long, default_value_t = 600)]
    height: u32,
    /// Output path; defaults to `waterscape-<seed>-<palette>.png`.
    #[clap(short, long)]
    output: Option<PathBuf>,
    /// Log filter, in `env_logger` syntax.
    #[clap(long)]
    log: Option<String>,
    #[clap(flatten)]
    params: Params,
}

/// Overlays the fields present in the JSON document at `path` onto `params`.
fn merge_config(params: &Params, path: &Path) -> anyhow::Result<Params> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let doc: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    let overrides = doc
        .as_object()
        .ok_or_else(|| anyhow!("config {} is not a JSON object", path.display()))?;

    let mut merged = serde_json::to_value(params)?;
    if let Some(fields) = merged.as_object_mut() {
        for (key, value) in overrides {
            fields.insert(key.clone(), value.clone());
        }
    }
    let params: Params = serde_json::from_value(merged)
        .with_context(|| format!("Invalid parameters in {}", path.display()))?;
    Ok(params.clamped())
}

struct Progress {
    layers: u32,
}

impl Observer for Progress {
    fn on_yield(&mut self, layers_done: u32) {
        log::debug!("layer {}/{}", layers_done, self.layers);
    }

    fn on_complete(&mut self, completion: &Completion) {
        let colors: Vec<String> = completion.colors_used.iter().map(|c| c.to_hex()).collect();
        log::info!(
            "{} brushes, {} layers, palette {}: {}",
            completion.brushes_drawn,
            completion.total_layers,
            completion.palette,
            colors.join(" ")
        );
    }
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(LoggingConfig {
        filter: opts.log.clone(),
        ..LoggingConfig::default()
    });

    let params = match &opts.config {
        Some(path) => merge_config(&opts.params, path)?,
        None => opts.params.clamped(),
    };

    let palettes = PaletteDb::from_bundle();
    let palette = palettes.palette(&opts.palette).ok_or_else(|| {
        anyhow!(
            "unknown palette {:?}; expected one of: {}",
            opts.palette,
            palettes.names().collect::<Vec<_>>().join(", ")
        )
    })?;

    let mut surface = RasterSurface::new(opts.width.max(1), opts.height.max(1));
    let mut progress = Progress {
        layers: params.layers_per_brush,
    };
    let completion = Generator::new()
        .generate(&params, palette, &mut surface, &mut progress)
        .ok_or_else(|| anyhow!("generator is busy"))?;
    if completion.used_fallback {
        log::warn!("no brushes could be placed; wrote the fallback composition");
    }

    let output = opts.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "waterscape-{}-{}.png",
            params.random_seed, palette.name
        ))
    });
    surface
        .draw_target()
        .write_png(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("wrote png: {}", output.display());
    Ok(())
}
