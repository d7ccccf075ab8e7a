//! Seeded watercolor compositions: organic polygons painted in many translucent layers, with
//! color bleed between neighboring brushes and thin seepage strokes.

pub mod art;
pub mod brush;
pub mod color;
pub mod config;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod mixers;
pub mod noise_field;
pub mod rand;
pub mod seepage;
pub mod shape;
pub mod surface;
