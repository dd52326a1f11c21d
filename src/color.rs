//! Color module (Gray, RGB or CMYK) for the graphics state.

use serde_derive::{Deserialize, Serialize};

use crate::object::Name;

/// A color space, tracked so color-setting operators know how many
/// components to consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    Indexed,
    Separation,
    Pattern,
    IccBased,
    /// Any color space this reader does not model further.
    Other(String),
}

impl ColorSpace {
    /// The color space named by a `CS` / `cs` operand.
    pub fn from_name(name: &Name) -> ColorSpace {
        match name.0.as_slice() {
            b"DeviceGray" | b"G" | b"CalGray" => ColorSpace::DeviceGray,
            b"DeviceRGB" | b"RGB" | b"CalRGB" | b"Lab" => ColorSpace::DeviceRgb,
            b"DeviceCMYK" | b"CMYK" => ColorSpace::DeviceCmyk,
            b"Indexed" | b"I" => ColorSpace::Indexed,
            b"Separation" => ColorSpace::Separation,
            b"Pattern" => ColorSpace::Pattern,
            b"ICCBased" => ColorSpace::IccBased,
            _ => ColorSpace::Other(name.as_str().into_owned()),
        }
    }

    /// How many numeric operands a color in this space takes.
    pub fn components(&self) -> usize {
        match self {
            ColorSpace::DeviceGray | ColorSpace::Indexed | ColorSpace::Separation => 1,
            ColorSpace::DeviceRgb => 3,
            ColorSpace::DeviceCmyk => 4,
            // ICC and pattern spaces vary; the dispatcher falls back to
            // consuming the whole operand stack for these
            ColorSpace::Pattern | ColorSpace::IccBased | ColorSpace::Other(_) => 0,
        }
    }

    /// The initial color of this space: black, or zero for the exotic ones.
    pub fn default_color(&self) -> Color {
        match self {
            ColorSpace::DeviceRgb => Color::Rgb(Rgb {
                r: 0.0,
                g: 0.0,
                b: 0.0,
            }),
            ColorSpace::DeviceCmyk => Color::Cmyk(Cmyk {
                c: 0.0,
                m: 0.0,
                y: 0.0,
                k: 1.0,
            }),
            _ => Color::Greyscale(Greyscale { percent: 0.0 }),
        }
    }
}

impl From<&ColorSpace> for &'static str {
    fn from(val: &ColorSpace) -> Self {
        use self::ColorSpace::*;
        match val {
            DeviceGray => "DeviceGray",
            DeviceRgb => "DeviceRGB",
            DeviceCmyk => "DeviceCMYK",
            Indexed => "Indexed",
            Separation => "Separation",
            Pattern => "Pattern",
            IccBased => "ICCBased",
            Other(_) => "Unknown",
        }
    }
}

/// Wrapper for Rgb, Cmyk and other color types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "data")]
pub enum Color {
    Rgb(Rgb),
    Cmyk(Cmyk),
    Greyscale(Greyscale),
}

impl Color {
    /// Consumes the color and converts it into a vector of components.
    pub fn into_vec(self) -> Vec<f32> {
        match self {
            Color::Rgb(rgb) => vec![rgb.r, rgb.g, rgb.b],
            Color::Cmyk(cmyk) => vec![cmyk.c, cmyk.m, cmyk.y, cmyk.k],
            Color::Greyscale(gs) => vec![gs.percent],
        }
    }

    /// Build a color from the operand components of a color-setting
    /// operator, guessing the space from the component count when needed.
    pub fn from_components(components: &[f32]) -> Option<Color> {
        match components {
            [gray] => Some(Color::Greyscale(Greyscale { percent: *gray })),
            [r, g, b] => Some(Color::Rgb(Rgb {
                r: *r,
                g: *g,
                b: *b,
            })),
            [c, m, y, k] => Some(Color::Cmyk(Cmyk {
                c: *c,
                m: *m,
                y: *y,
                k: *k,
            })),
            _ => None,
        }
    }

    /// The initial graphics-state color: black in DeviceRGB.
    pub fn black() -> Color {
        Color::Rgb(Rgb {
            r: 0.0,
            g: 0.0,
            b: 0.0,
        })
    }
}

/// RGB color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// CMYK color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cmyk {
    pub c: f32,
    pub m: f32,
    pub y: f32,
    pub k: f32,
}

/// Greyscale color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Greyscale {
    pub percent: f32,
}
