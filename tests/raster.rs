use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use image::ImageFormat;

use waterscape::art::Generator;
use waterscape::color::{PaletteDb, Rgb};
use waterscape::config::{BackgroundStyle, Params};
use waterscape::surface::{RasterSurface, Surface};

const WIDTH: u32 = 240;
const HEIGHT: u32 = 180;

fn render(params: &Params) -> anyhow::Result<RasterSurface> {
    let db = PaletteDb::from_bundle();
    let palette = db.palette("ocean").context("missing bundled palette")?;
    let mut surface = RasterSurface::new(WIDTH, HEIGHT);
    Generator::new()
        .generate(params, palette, &mut surface, &mut ())
        .context("generator refused to run")?;
    Ok(surface)
}

fn params() -> Params {
    Params {
        brush_count: 5,
        layers_per_brush: 6,
        brush_size: 50.0,
        ..Params::default()
    }
}

#[test]
fn exported_png_round_trips() -> anyhow::Result<()> {
    let surface = render(&params())?;
    let path: PathBuf =
        std::env::temp_dir().join(format!("waterscape-test-{}.png", std::process::id()));
    surface
        .draw_target()
        .write_png(&path)
        .context("Failed to write PNG")?;

    let reader = BufReader::new(File::open(&path).context("Failed to reopen PNG")?);
    let decoded = image::io::Reader::with_format(reader, ImageFormat::Png)
        .decode()
        .context("Failed to decode image")?
        .into_rgba8();
    std::fs::remove_file(&path).ok();

    assert_eq!((decoded.width(), decoded.height()), (WIDTH, HEIGHT));
    let painted = decoded
        .pixels()
        .filter(|px| px.0[..3] != [255, 255, 255])
        .count();
    assert!(painted > 0, "nothing was painted");
    for (x, y, px) in decoded.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        assert_eq!(a, 255, "transparent pixel at ({}, {})", x, y);
        assert_eq!(surface.pixel(x, y), Some(Rgb::new(r, g, b)));
    }
    Ok(())
}

#[test]
fn multiply_layers_only_darken_white() -> anyhow::Result<()> {
    let surface = render(&params())?;
    let data = surface.draw_target().get_data();
    assert_eq!(data.len(), (surface.width() * surface.height()) as usize);
    let darkest = data
        .iter()
        .map(|px| {
            let [b, g, r, _] = px.to_le_bytes();
            u32::from(r) + u32::from(g) + u32::from(b)
        })
        .min()
        .unwrap_or(765);
    assert!(darkest < 765);
    Ok(())
}

#[test]
fn gradient_background_top_to_bottom() -> anyhow::Result<()> {
    let surface = render(&Params {
        background_type: BackgroundStyle::Gradient,
        brush_count: 1,
        layers_per_brush: 1,
        brush_size: 5.0,
        chaos_seepage_intensity: 0.0,
        ..Params::default()
    })?;
    // The single small brush lands somewhere; sample a column at both edges and keep the one
    // it did not touch.
    let column = [0, WIDTH - 1]
        .into_iter()
        .find(|&x| {
            (0..HEIGHT).all(|y| {
                surface
                    .pixel(x, y)
                    .map_or(false, |px| px.b == 255 && px.r >= 240)
            })
        })
        .context("both edge columns were painted over")?;
    assert_eq!(surface.pixel(column, 0), Some(Rgb::WHITE));
    let bottom = surface.pixel(column, HEIGHT - 1).context("out of bounds")?;
    assert_eq!(bottom, Rgb::new(240, 248, 255));
    Ok(())
}
