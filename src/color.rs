use std::collections::{hash_map::Entry::*, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

const PALETTES_JSON: &str = include_str!("palettes.json");

/// An RGB color with 8-bit channels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const NEUTRAL_GREY: Rgb = Rgb::new(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Builds a color from unbounded channel values, clamping each into `[0, 255]` and rounding.
    /// Infinities saturate; NaN channels become zero.
    pub fn from_f64(r: f64, g: f64, b: f64) -> Self {
        fn channel(v: f64) -> u8 {
            if v.is_nan() {
                0
            } else {
                v.round().clamp(0.0, 255.0) as u8
            }
        }
        Rgb {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        }
    }

    pub fn to_f64(self) -> [f64; 3] {
        [f64::from(self.r), f64::from(self.g), f64::from(self.b)]
    }

    /// Parses a `#rrggbb` (or bare `rrggbb`) hex string.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        let mut buf = [0u8; 3];
        hex::decode_to_slice(digits, &mut buf).map_err(|_| ColorParseError {
            input: s.to_string(),
        })?;
        let [r, g, b] = buf;
        Ok(Rgb { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{}", hex::encode_upper([self.r, self.g, self.b]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError {
    pub input: String,
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex color {:?}", self.input)
    }
}

impl std::error::Error for ColorParseError {}

#[derive(Debug, Deserialize, Serialize)]
pub struct WirePaletteSpec {
    name: String,
    colors: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WirePaletteDb {
    palettes: Vec<WirePaletteSpec>,
}

/// A named set of colors that brushes sample from.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub name: String,
    pub colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(name: impl Into<String>, colors: Vec<Rgb>) -> Self {
        Palette {
            name: name.into(),
            colors,
        }
    }
}

#[derive(Debug)]
pub struct PaletteDb {
    palettes: Vec<Palette>,
    palettes_by_name: HashMap<String, usize>,
}

#[derive(Debug)]
pub enum WireFormatError {
    DuplicatePalette {
        name: String,
    },
    EmptyPalette {
        name: String,
    },
    InvalidColor {
        palette: String,
        source: ColorParseError,
    },
}

impl fmt::Display for WireFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormatError::DuplicatePalette { name } => {
                write!(f, "palette {:?} is defined more than once", name)
            }
            WireFormatError::EmptyPalette { name } => write!(f, "palette {:?} has no colors", name),
            WireFormatError::InvalidColor { palette, source } => {
                write!(f, "in palette {:?}: {}", palette, source)
            }
        }
    }
}

impl std::error::Error for WireFormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WireFormatError::InvalidColor { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl PaletteDb {
    /// Loads the palettes bundled with the crate.
    pub fn from_bundle() -> Self {
        let wire: WirePaletteDb =
            serde_json::from_str(PALETTES_JSON).expect("bundled data is invalid JSON");
        PaletteDb::from_wire(wire).expect("bundled data is not a valid database")
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let wire: WirePaletteDb = serde_json::from_str(json)?;
        Ok(PaletteDb::from_wire(wire)?)
    }

    pub fn from_wire(wire: WirePaletteDb) -> Result<Self, WireFormatError> {
        let mut db = PaletteDb {
            palettes: Vec::with_capacity(wire.palettes.len()),
            palettes_by_name: HashMap::with_capacity(wire.palettes.len()),
        };

        for palette in wire.palettes {
            if palette.colors.is_empty() {
                return Err(WireFormatError::EmptyPalette { name: palette.name });
            }
            let colors = palette
                .colors
                .iter()
                .map(|c| Rgb::from_hex(c))
                .collect::<Result<Vec<Rgb>, ColorParseError>>()
                .map_err(|source| WireFormatError::InvalidColor {
                    palette: palette.name.clone(),
                    source,
                })?;
            match db.palettes_by_name.entry(palette.name) {
                Occupied(o) => {
                    let name = o.remove_entry().0;
                    return Err(WireFormatError::DuplicatePalette { name });
                }
                Vacant(v) => {
                    let name = v.key().clone();
                    v.insert(db.palettes.len());
                    db.palettes.push(Palette { name, colors });
                }
            };
        }

        Ok(db)
    }

    pub fn palette(&self, name: &str) -> Option<&Palette> {
        self.palettes.get(*self.palettes_by_name.get(name)?)
    }

    /// Palette names in the order they were defined.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.iter().map(|p| p.name.as_str())
    }
}
