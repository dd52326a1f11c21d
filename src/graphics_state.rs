//! The canvas graphics state: the internal data structure a conforming
//! reader maintains while executing a content stream. Holds the current
//! transformation and text matrices, text state, color state and line state.

use std::sync::Arc;

use serde_derive::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::color::{Color, ColorSpace};
use crate::font::Font;
use crate::matrix::Matrix;
use crate::rectangle::Rect;

/// __See PDF Reference Page 216__ - Line cap (ending) style
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineCapStyle {
    /// Butt cap. The stroke is squared off at the endpoint of the path.
    Butt,
    /// Round cap. A semicircular arc is drawn around the endpoint.
    Round,
    /// Projecting square cap. The stroke continues half a line width past
    /// the endpoint.
    ProjectingSquare,
}

impl LineCapStyle {
    pub fn from_id(i: i64) -> Self {
        match i {
            1 => LineCapStyle::Round,
            2 => LineCapStyle::ProjectingSquare,
            _ => LineCapStyle::Butt,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            LineCapStyle::Butt => 0,
            LineCapStyle::Round => 1,
            LineCapStyle::ProjectingSquare => 2,
        }
    }
}

/// __See PDF Reference Page 216__ - Line join style
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineJoinStyle {
    /// Miter join: outer edges extended until they meet.
    Miter,
    /// Round join: a pie slice around the meeting point.
    Round,
    /// Bevel join: butt caps with the notch filled.
    Bevel,
}

impl LineJoinStyle {
    pub fn from_id(i: i64) -> Self {
        match i {
            1 => LineJoinStyle::Round,
            2 => LineJoinStyle::Bevel,
            _ => LineJoinStyle::Miter,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            LineJoinStyle::Miter => 0,
            LineJoinStyle::Round => 1,
            LineJoinStyle::Bevel => 2,
        }
    }
}

/// Dash pattern: alternating on/off lengths plus the phase offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDashPattern {
    /// Offset at which the dashing pattern starts, measured from the
    /// beginning of the line. Default: 0.
    pub offset: f32,
    /// Dash, gap, dash, gap, … An empty pattern is a solid line.
    pub pattern: SmallVec<[f32; 6]>,
}

/// The text rendering mode set by `Tr`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextRenderingMode {
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextRenderingMode {
    pub fn from_id(i: i64) -> Self {
        match i {
            1 => TextRenderingMode::Stroke,
            2 => TextRenderingMode::FillStroke,
            3 => TextRenderingMode::Invisible,
            4 => TextRenderingMode::FillClip,
            5 => TextRenderingMode::StrokeClip,
            6 => TextRenderingMode::FillStrokeClip,
            7 => TextRenderingMode::Clip,
            _ => TextRenderingMode::Fill,
        }
    }
}

/// Rendering intent (PDF 1.1), set by `ri` or an ExtGState.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderingIntent {
    AbsoluteColorimetric,
    RelativeColorimetric,
    Saturation,
    Perceptual,
}

impl RenderingIntent {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AbsoluteColorimetric" => Some(RenderingIntent::AbsoluteColorimetric),
            "RelativeColorimetric" => Some(RenderingIntent::RelativeColorimetric),
            "Saturation" => Some(RenderingIntent::Saturation),
            "Perceptual" => Some(RenderingIntent::Perceptual),
            _ => None,
        }
    }
}

/// Blend mode, as named in an ExtGState `BM` entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub fn from_name(name: &str) -> Option<Self> {
        use self::BlendMode::*;
        match name {
            "Normal" | "Compatible" => Some(Normal),
            "Multiply" => Some(Multiply),
            "Screen" => Some(Screen),
            "Overlay" => Some(Overlay),
            "Darken" => Some(Darken),
            "Lighten" => Some(Lighten),
            "ColorDodge" => Some(ColorDodge),
            "ColorBurn" => Some(ColorBurn),
            "HardLight" => Some(HardLight),
            "SoftLight" => Some(SoftLight),
            "Difference" => Some(Difference),
            "Exclusion" => Some(Exclusion),
            "Hue" => Some(Hue),
            "Saturation" => Some(Saturation),
            "Color" => Some(Color),
            "Luminosity" => Some(Luminosity),
            _ => None,
        }
    }
}

/// The full graphics state, initialized to the PDF defaults at the start of
/// every page.
///
/// Snapshots are plain [`Clone`]s: the struct is value-like throughout, the
/// font is shared through an [`Arc`], and the clipping path is shared
/// immutable, so a clone behaves like the deep copy `q` requires.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    pub ctm: Matrix,
    pub text_matrix: Matrix,
    pub text_line_matrix: Matrix,
    pub text_rise: f32,
    pub character_spacing: f32,
    pub word_spacing: f32,
    /// In percent; 100 is unscaled.
    pub horizontal_scaling: f32,
    pub leading: f32,
    pub font: Option<Arc<Font>>,
    pub font_size: f32,
    pub text_rendering_mode: TextRenderingMode,
    pub clipping_path: Option<Arc<Vec<Rect>>>,
    pub stroke_color_space: ColorSpace,
    pub stroke_color: Color,
    pub non_stroke_color_space: ColorSpace,
    pub non_stroke_color: Color,
    pub line_width: f32,
    pub line_cap: LineCapStyle,
    pub line_join: LineJoinStyle,
    pub miter_limit: f32,
    pub dash_pattern: LineDashPattern,
    pub rendering_intent: RenderingIntent,
    pub blend_mode: BlendMode,
    pub alpha_constant: f32,
    pub alpha_source: bool,
}

impl Default for GraphicsState {
    fn default() -> Self {
        GraphicsState {
            ctm: Matrix::identity(),
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
            text_rise: 0.0,
            character_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            text_rendering_mode: TextRenderingMode::Fill,
            clipping_path: None,
            stroke_color_space: ColorSpace::DeviceRgb,
            stroke_color: Color::black(),
            non_stroke_color_space: ColorSpace::DeviceRgb,
            non_stroke_color: Color::black(),
            line_width: 1.0,
            line_cap: LineCapStyle::Butt,
            line_join: LineJoinStyle::Miter,
            miter_limit: 10.0,
            dash_pattern: LineDashPattern::default(),
            rendering_intent: RenderingIntent::RelativeColorimetric,
            blend_mode: BlendMode::Normal,
            alpha_constant: 1.0,
            alpha_source: false,
        }
    }
}
