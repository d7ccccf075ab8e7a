use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};

use waterscape::art::{Completion, Generator, Observer};
use waterscape::color::{Palette, PaletteDb, Rgb};
use waterscape::config::{BackgroundStyle, Params, SeepageMethod};
use waterscape::geometry::Point;
use waterscape::surface::{BlendMode, DrawCall, Paint, RecordingSurface, Surface};

const WIDTH: u32 = 400;
const HEIGHT: u32 = 300;

fn vibrant() -> anyhow::Result<Palette> {
    let db = PaletteDb::from_bundle();
    db.palette("vibrant")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("missing bundled palette"))
}

fn small_params() -> Params {
    Params {
        brush_count: 6,
        layers_per_brush: 8,
        ..Params::default()
    }
}

fn record(params: &Params, palette: &Palette) -> anyhow::Result<(Vec<DrawCall>, Completion)> {
    let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
    let completion = Generator::new()
        .generate(params, palette, &mut surface, &mut ())
        .ok_or_else(|| anyhow::anyhow!("generator refused to run"))?;
    Ok((surface.into_calls(), completion))
}

#[test]
fn same_seed_same_draw_calls() -> anyhow::Result<()> {
    let palette = vibrant()?;
    for background in [
        BackgroundStyle::White,
        BackgroundStyle::Paper,
        BackgroundStyle::Gradient,
    ] {
        let params = Params {
            background_type: background,
            ..small_params()
        };
        let (first, first_completion) = record(&params, &palette)?;
        let (second, second_completion) = record(&params, &palette)?;
        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert_eq!(first_completion, second_completion);
    }
    Ok(())
}

#[test]
fn default_seed_regenerates_identically() -> anyhow::Result<()> {
    let palette = vibrant()?;
    let params = Params {
        layers_per_brush: 4,
        ..Params::default()
    };
    assert_eq!(params.random_seed, 42);
    let generator = Generator::new();
    let mut first = RecordingSurface::new(WIDTH, HEIGHT);
    let mut second = RecordingSurface::new(WIDTH, HEIGHT);
    generator.generate(&params, &palette, &mut first, &mut ());
    generator.generate(&params, &palette, &mut second, &mut ());
    assert_eq!(first.calls(), second.calls());
    Ok(())
}

#[test]
fn different_seeds_differ() -> anyhow::Result<()> {
    let palette = vibrant()?;
    let (a, _) = record(&small_params(), &palette)?;
    let (b, _) = record(
        &Params {
            random_seed: 43,
            ..small_params()
        },
        &palette,
    )?;
    assert_ne!(a, b);
    Ok(())
}

#[test]
fn minimal_pass_is_one_plain_fill() -> anyhow::Result<()> {
    let palette = vibrant()?;
    let params = Params {
        brush_count: 1,
        layers_per_brush: 1,
        chaos_seepage_intensity: 0.0,
        ..Params::default()
    };
    let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
    let completion = Generator::new()
        .generate(&params, &palette, &mut surface, &mut ())
        .ok_or_else(|| anyhow::anyhow!("generator refused to run"))?;

    let fills: Vec<(&[Point], Paint, BlendMode)> = surface.fills().collect();
    assert_eq!(fills.len(), 1);
    let (points, paint, blend) = fills[0];
    assert!(points.len() >= 3);
    assert_eq!(blend, BlendMode::Multiply);
    assert!(palette.colors.contains(&paint.color));
    assert_eq!(completion.colors_used.as_slice(), &[paint.color]);
    assert!(surface
        .calls()
        .iter()
        .all(|call| matches!(call, DrawCall::Background(_) | DrawCall::FillPolygon { .. })));

    assert_eq!(completion.brush_count, 1);
    assert_eq!(completion.brushes_drawn, 1);
    assert_eq!(completion.total_layers, 1);
    assert!(!completion.used_fallback);
    Ok(())
}

#[derive(Default)]
struct Counting {
    yields: Vec<u32>,
    completions: usize,
}

impl Observer for Counting {
    fn on_yield(&mut self, layers_done: u32) {
        self.yields.push(layers_done);
    }
    fn on_complete(&mut self, _completion: &Completion) {
        self.completions += 1;
    }
}

#[test]
fn yields_every_three_layers() -> anyhow::Result<()> {
    let palette = vibrant()?;
    let params = Params {
        brush_count: 2,
        layers_per_brush: 10,
        ..Params::default()
    };
    let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
    let mut observer = Counting::default();
    Generator::new().generate(&params, &palette, &mut surface, &mut observer);
    assert_eq!(observer.yields, vec![3, 6, 9]);
    assert_eq!(observer.completions, 1);
    Ok(())
}

#[test]
fn zero_brushes_paints_fallback_once() -> anyhow::Result<()> {
    let empty = Palette::new("empty", vec![]);
    let generator = Generator::new();
    let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
    let mut observer = Counting::default();
    let completion = generator
        .generate(&small_params(), &empty, &mut surface, &mut observer)
        .ok_or_else(|| anyhow::anyhow!("generator refused to run"))?;

    assert!(completion.used_fallback);
    assert_eq!(completion.brushes_drawn, 0);
    assert_eq!(completion.brush_count, 6);
    assert_eq!(completion.total_layers, 48);
    assert!(completion.colors_used.is_empty());
    assert_eq!(observer.completions, 1);
    assert!(observer.yields.is_empty());

    let fills: Vec<_> = surface.fills().collect();
    assert_eq!(fills.len(), 8);
    for (_, paint, _) in &fills {
        assert_eq!(paint.alpha, 25.0);
        assert_eq!(paint.color, Rgb::NEUTRAL_GREY);
    }
    let backgrounds = surface
        .calls()
        .iter()
        .filter(|call| matches!(call, DrawCall::Background(Rgb::WHITE)))
        .count();
    assert_eq!(backgrounds, 2);

    assert!(!generator.is_generating());
    let palette = vibrant()?;
    let mut again = RecordingSurface::new(WIDTH, HEIGHT);
    assert!(generator
        .generate(&small_params(), &palette, &mut again, &mut ())
        .is_some());
    Ok(())
}

struct Reentrant<'a> {
    generator: &'a Generator,
    palette: &'a Palette,
    nested: Vec<Option<Completion>>,
}

impl Observer for Reentrant<'_> {
    fn on_yield(&mut self, _layers_done: u32) {
        assert!(self.generator.is_generating());
        let mut scratch = RecordingSurface::new(10, 10);
        let result = self
            .generator
            .generate(&small_params(), self.palette, &mut scratch, &mut ());
        assert!(scratch.calls().is_empty());
        self.nested.push(result);
    }
}

#[test]
fn nested_request_is_ignored() -> anyhow::Result<()> {
    let palette = vibrant()?;
    let generator = Generator::new();
    let mut observer = Reentrant {
        generator: &generator,
        palette: &palette,
        nested: Vec::new(),
    };
    let mut surface = RecordingSurface::new(WIDTH, HEIGHT);
    let outer = generator.generate(&small_params(), &palette, &mut surface, &mut observer);

    assert!(outer.is_some());
    assert!(!observer.nested.is_empty());
    assert!(observer.nested.iter().all(Option::is_none));
    assert!(!generator.is_generating());
    Ok(())
}

/// Panics on the first polygon fill.
struct Exploding {
    fills: Cell<usize>,
}

impl Surface for Exploding {
    fn width(&self) -> u32 {
        WIDTH
    }
    fn height(&self) -> u32 {
        HEIGHT
    }
    fn background(&mut self, _color: Rgb) {}
    fn hline(&mut self, _y: u32, _color: Rgb) {}
    fn fill_polygon(&mut self, _points: &[Point], _paint: Paint, _blend: BlendMode) {
        self.fills.set(self.fills.get() + 1);
        panic!("surface failure");
    }
    fn stroke_polyline(&mut self, _points: &[Point], _paint: Paint, _w: f64, _blend: BlendMode) {}
    fn fill_circle(&mut self, _center: Point, _radius: f64, _paint: Paint, _blend: BlendMode) {}
}

#[test]
fn guard_cleared_after_panic() -> anyhow::Result<()> {
    let palette = vibrant()?;
    let generator = Generator::new();
    let mut surface = Exploding {
        fills: Cell::new(0),
    };
    let result = catch_unwind(AssertUnwindSafe(|| {
        generator.generate(&small_params(), &palette, &mut surface, &mut ())
    }));
    assert!(result.is_err());
    assert_eq!(surface.fills.get(), 1);
    assert!(!generator.is_generating());

    let mut recording = RecordingSurface::new(WIDTH, HEIGHT);
    assert!(generator
        .generate(&small_params(), &palette, &mut recording, &mut ())
        .is_some());
    Ok(())
}

#[test]
fn higher_chaos_draws_more() -> anyhow::Result<()> {
    let palette = vibrant()?;
    let count = |chaos: f64| -> anyhow::Result<usize> {
        let params = Params {
            chaos_seepage_intensity: chaos,
            ..small_params()
        };
        Ok(record(&params, &palette)?.0.len())
    };
    let calm = count(0.0)?;
    let wild = count(1.0)?;
    assert!(wild > calm, "{} <= {}", wild, calm);
    Ok(())
}

#[test]
fn every_seepage_method_renders_deterministically() -> anyhow::Result<()> {
    let palette = vibrant()?;
    let strokes = |calls: &[DrawCall]| {
        calls
            .iter()
            .filter(|call| matches!(call, DrawCall::StrokePolyline { .. }))
            .count()
    };
    let with_method = |method: SeepageMethod| Params {
        chaos_seepage_intensity: 1.0,
        seepage_method: method,
        ..small_params()
    };
    let (capillary, _) = record(&with_method(SeepageMethod::Capillary), &palette)?;
    assert!(strokes(&capillary) > 0);

    for method in [
        SeepageMethod::Lorenz,
        SeepageMethod::FlowField,
        SeepageMethod::Fractal,
        SeepageMethod::Cellular,
        SeepageMethod::Fibonacci,
        SeepageMethod::ReactionDiffusion,
        SeepageMethod::Hybrid,
    ] {
        let params = with_method(method);
        let (first, completion) = record(&params, &palette)?;
        let (second, _) = record(&params, &palette)?;
        assert_eq!(first, second, "{:?}", method);
        assert!(strokes(&first) > 0, "{:?}", method);
        assert_ne!(first, capillary, "{:?}", method);
        assert!(!completion.used_fallback);
    }
    Ok(())
}
