//! The standard content-stream operator set.
//!
//! Each handler mutates the [`Canvas`] it is invoked on; the registry wires
//! mnemonics to handlers with their operand counts.

use std::sync::Arc;

use log::warn;

use crate::color::{Cmyk, Color, ColorSpace, Greyscale, Rgb};
use crate::errors::PdfError;
use crate::events::{Event, ImageRenderEvent};
use crate::filters::decoded_bytes;
use crate::graphics_state::{
    BlendMode, LineCapStyle, LineDashPattern, LineJoinStyle, RenderingIntent, TextRenderingMode,
};
use crate::interpreter::{interpret_content, Canvas};
use crate::matrix::Matrix;
use crate::object::{Name, Object};
use crate::operator::{OperandCount, OperatorRegistry};
use crate::rectangle::Rect;

/// Build the registry of all supported operators.
pub fn standard_registry() -> OperatorRegistry {
    use OperandCount::{Fixed, NonStrokeColorComponents, StrokeColorComponents};

    let mut registry = OperatorRegistry::new();

    // graphics state
    registry.register("q", Fixed(0), save_state);
    registry.register("Q", Fixed(0), restore_state);
    registry.register("cm", Fixed(6), concat_matrix);
    registry.register("w", Fixed(1), set_line_width);
    registry.register("J", Fixed(1), set_line_cap);
    registry.register("j", Fixed(1), set_line_join);
    registry.register("M", Fixed(1), set_miter_limit);
    registry.register("d", Fixed(2), set_dash_pattern);
    registry.register("ri", Fixed(1), set_rendering_intent);
    registry.register("i", Fixed(1), set_flatness);
    registry.register("gs", Fixed(1), set_ext_gstate);

    // text object and state
    registry.register("BT", Fixed(0), begin_text);
    registry.register("ET", Fixed(0), end_text);
    registry.register("Tc", Fixed(1), set_character_spacing);
    registry.register("Tw", Fixed(1), set_word_spacing);
    registry.register("Tz", Fixed(1), set_horizontal_scaling);
    registry.register("TL", Fixed(1), set_leading);
    registry.register("Tf", Fixed(2), set_font);
    registry.register("Tr", Fixed(1), set_text_rendering_mode);
    registry.register("Ts", Fixed(1), set_text_rise);

    // text positioning
    registry.register("Td", Fixed(2), move_text_position);
    registry.register("TD", Fixed(2), move_text_position_set_leading);
    registry.register("Tm", Fixed(6), set_text_matrix);
    registry.register("T*", Fixed(0), move_to_next_line);

    // text showing
    registry.register("Tj", Fixed(1), show_text);
    registry.register("TJ", Fixed(1), show_text_adjusted);
    registry.register("'", Fixed(1), next_line_show_text);
    registry.register("\"", Fixed(3), next_line_show_text_with_spacing);

    // color
    registry.register("CS", Fixed(1), set_stroke_color_space);
    registry.register("cs", Fixed(1), set_non_stroke_color_space);
    registry.register("SC", StrokeColorComponents, set_stroke_color);
    registry.register("SCN", StrokeColorComponents, set_stroke_color);
    registry.register("sc", NonStrokeColorComponents, set_non_stroke_color);
    registry.register("scn", NonStrokeColorComponents, set_non_stroke_color);
    registry.register("G", Fixed(1), set_stroke_gray);
    registry.register("g", Fixed(1), set_non_stroke_gray);
    registry.register("RG", Fixed(3), set_stroke_rgb);
    registry.register("rg", Fixed(3), set_non_stroke_rgb);
    registry.register("K", Fixed(4), set_stroke_cmyk);
    registry.register("k", Fixed(4), set_non_stroke_cmyk);

    // path construction
    registry.register("m", Fixed(2), move_to);
    registry.register("l", Fixed(2), line_to);
    registry.register("c", Fixed(6), curve_to);
    registry.register("v", Fixed(4), curve_to_initial);
    registry.register("y", Fixed(4), curve_to_final);
    registry.register("h", Fixed(0), close_subpath);
    registry.register("re", Fixed(4), append_rectangle);

    // path painting
    for op in ["S", "s", "f", "F", "f*", "B", "B*", "b", "b*", "n"] {
        registry.register(op, Fixed(0), paint_path);
    }
    registry.register("W", Fixed(0), clip_nonzero);
    registry.register("W*", Fixed(0), clip_evenodd);

    // marked content
    registry.register("MP", Fixed(1), marked_content_point);
    registry.register("DP", Fixed(2), marked_content_point_with_properties);
    registry.register("BMC", Fixed(1), begin_marked_content);
    registry.register("BDC", Fixed(2), begin_marked_content_with_properties);
    registry.register("EMC", Fixed(0), end_marked_content);

    // compatibility
    registry.register("BX", Fixed(0), begin_compatibility_section);
    registry.register("EX", Fixed(0), end_compatibility_section);

    // XObjects, Type 3 glyph metrics, shading
    registry.register("Do", Fixed(1), invoke_xobject);
    registry.register("d0", Fixed(2), type3_width);
    registry.register("d1", Fixed(6), type3_width_and_bbox);
    registry.register("sh", Fixed(1), shading_fill);

    registry
}

fn number(operand: &Object) -> Result<f32, PdfError> {
    operand.expect_f64().map(|v| v as f32)
}

fn numbers(operands: &[Object]) -> Result<Vec<f32>, PdfError> {
    operands.iter().map(number).collect()
}

fn name(operand: &Object) -> Result<&Name, PdfError> {
    operand.expect_name()
}

// --- graphics state ---

fn save_state(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.save_graphics_state();
    Ok(())
}

fn restore_state(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.restore_graphics_state();
    Ok(())
}

fn concat_matrix(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let m = numbers(&operands)?;
    let matrix = Matrix::from_array([m[0], m[1], m[2], m[3], m[4], m[5]]);
    canvas.graphics_state.ctm = matrix.mul(&canvas.graphics_state.ctm);
    Ok(())
}

fn set_line_width(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.graphics_state.line_width = number(&operands[0])?;
    Ok(())
}

fn set_line_cap(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let id = operands[0].as_i64().unwrap_or(0);
    canvas.graphics_state.line_cap = LineCapStyle::from_id(id);
    Ok(())
}

fn set_line_join(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let id = operands[0].as_i64().unwrap_or(0);
    canvas.graphics_state.line_join = LineJoinStyle::from_id(id);
    Ok(())
}

fn set_miter_limit(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.graphics_state.miter_limit = number(&operands[0])?;
    Ok(())
}

fn set_dash_pattern(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let pattern = operands[0]
        .as_array()
        .ok_or(PdfError::Type {
            expected: "dash array",
            received: operands[0].type_name(),
        })?
        .iter()
        .filter_map(|o| o.as_f64().map(|v| v as f32))
        .collect();
    let offset = number(&operands[1])?;
    canvas.graphics_state.dash_pattern = LineDashPattern { offset, pattern };
    Ok(())
}

fn set_rendering_intent(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    if let Some(intent) = RenderingIntent::from_name(&name(&operands[0])?.as_str()) {
        canvas.graphics_state.rendering_intent = intent;
    }
    Ok(())
}

fn set_flatness(_canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    // flatness tolerance only matters when rasterizing
    Ok(())
}

fn set_ext_gstate(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let gs_name = name(&operands[0])?.as_str().into_owned();
    let dict = match canvas.ext_gstate_resource(&gs_name) {
        Some(d) => d,
        None => {
            return Err(PdfError::Type {
                expected: "ExtGState resource",
                received: "null",
            })
        }
    };

    let state = &mut canvas.graphics_state;
    if let Some(w) = dict.get("LW").and_then(Object::as_f64) {
        state.line_width = w as f32;
    }
    if let Some(c) = dict.get_i64("LC") {
        state.line_cap = LineCapStyle::from_id(c);
    }
    if let Some(j) = dict.get_i64("LJ") {
        state.line_join = LineJoinStyle::from_id(j);
    }
    if let Some(ml) = dict.get("ML").and_then(Object::as_f64) {
        state.miter_limit = ml as f32;
    }
    if let Some(Object::Array(d)) = dict.get("D") {
        if let (Some(Object::Array(pattern)), Some(offset)) =
            (d.first(), d.get(1).and_then(Object::as_f64))
        {
            state.dash_pattern = LineDashPattern {
                offset: offset as f32,
                pattern: pattern
                    .iter()
                    .filter_map(|o| o.as_f64().map(|v| v as f32))
                    .collect(),
            };
        }
    }
    if let Some(ri) = dict.get_name("RI").and_then(|n| RenderingIntent::from_name(&n.as_str())) {
        state.rendering_intent = ri;
    }
    if let Some(bm) = dict.get_name("BM").and_then(|n| BlendMode::from_name(&n.as_str())) {
        state.blend_mode = bm;
    }
    if let Some(Object::Array(bm)) = dict.get("BM") {
        if let Some(mode) = bm
            .first()
            .and_then(Object::as_name)
            .and_then(|n| BlendMode::from_name(&n.as_str()))
        {
            state.blend_mode = mode;
        }
    }
    if let Some(ca) = dict.get("ca").and_then(Object::as_f64) {
        state.alpha_constant = ca as f32;
    } else if let Some(ca) = dict.get("CA").and_then(Object::as_f64) {
        state.alpha_constant = ca as f32;
    }
    if let Some(ais) = dict.get("AIS").and_then(|o| o.as_bool()) {
        state.alpha_source = ais;
    }
    if let Some(Object::Array(font)) = dict.get("Font") {
        if let (Some(Object::Dictionary(fd)), Some(size)) =
            (font.first(), font.get(1).and_then(Object::as_f64))
        {
            match crate::font::Font::from_dict(fd) {
                Ok(f) => {
                    state.font = Some(Arc::new(f));
                    state.font_size = size as f32;
                }
                Err(e) => warn!("ExtGState font unusable: {}", e),
            }
        }
    }
    Ok(())
}

// --- text object and state ---

fn begin_text(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.graphics_state.text_matrix = Matrix::identity();
    canvas.graphics_state.text_line_matrix = Matrix::identity();
    Ok(())
}

fn end_text(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.graphics_state.text_matrix = Matrix::identity();
    canvas.graphics_state.text_line_matrix = Matrix::identity();
    Ok(())
}

fn set_character_spacing(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.graphics_state.character_spacing = number(&operands[0])?;
    Ok(())
}

fn set_word_spacing(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.graphics_state.word_spacing = number(&operands[0])?;
    Ok(())
}

fn set_horizontal_scaling(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.graphics_state.horizontal_scaling = number(&operands[0])?;
    Ok(())
}

fn set_leading(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.graphics_state.leading = number(&operands[0])?;
    Ok(())
}

fn set_font(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let font_name = name(&operands[0])?.as_str().into_owned();
    let size = number(&operands[1])?;
    match canvas.font_resource(&font_name) {
        Some(font) => canvas.graphics_state.font = Some(font),
        None => {
            warn!("font resource {} not found in page resources", font_name);
            canvas.graphics_state.font = None;
        }
    }
    canvas.graphics_state.font_size = size;
    Ok(())
}

fn set_text_rendering_mode(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let id = operands[0].as_i64().unwrap_or(0);
    canvas.graphics_state.text_rendering_mode = TextRenderingMode::from_id(id);
    Ok(())
}

fn set_text_rise(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.graphics_state.text_rise = number(&operands[0])?;
    Ok(())
}

// --- text positioning ---

/// `Td`: `Tm = Tlm = translate(tx, ty) · Tlm`.
fn move_text_position(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let tx = number(&operands[0])?;
    let ty = number(&operands[1])?;
    let state = &mut canvas.graphics_state;
    state.text_matrix = Matrix::translate(tx, ty).mul(&state.text_line_matrix);
    state.text_line_matrix = state.text_matrix;
    Ok(())
}

/// `TD`: set the leading to `-ty`, then `Td`.
fn move_text_position_set_leading(
    canvas: &mut Canvas,
    operands: Vec<Object>,
) -> Result<(), PdfError> {
    canvas.graphics_state.leading = -number(&operands[1])?;
    move_text_position(canvas, operands)
}

fn set_text_matrix(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let m = numbers(&operands)?;
    let matrix = Matrix::from_array([m[0], m[1], m[2], m[3], m[4], m[5]]);
    canvas.graphics_state.text_matrix = matrix;
    canvas.graphics_state.text_line_matrix = matrix;
    Ok(())
}

/// `T*`: `Td(0, -leading)`.
fn move_to_next_line(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    let leading = canvas.graphics_state.leading;
    move_text_position(
        canvas,
        vec![Object::Real(0.0), Object::Real(-leading as f64)],
    )
}

// --- text showing ---

fn show_text(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let string = operands[0].as_string().ok_or(PdfError::Type {
        expected: "string",
        received: operands[0].type_name(),
    })?;
    let bytes = string.bytes.clone();
    canvas.show_text(&bytes)
}

/// `TJ`: strings alternate with kerning adjustments in thousandths of a
/// text-space unit, subtracted from the x-advance.
fn show_text_adjusted(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let elements = match operands.into_iter().next() {
        Some(Object::Array(a)) => a,
        Some(other) => {
            return Err(PdfError::Type {
                expected: "array",
                received: other.type_name(),
            })
        }
        None => return Ok(()),
    };
    fn kern(canvas: &mut Canvas, adjust: f32) {
        let gs = &mut canvas.graphics_state;
        let tx = -adjust / 1000.0 * gs.font_size * (gs.horizontal_scaling / 100.0);
        gs.text_matrix = Matrix::translate(tx, 0.0).mul(&gs.text_matrix);
    }

    for element in elements {
        match element {
            Object::String(s) => canvas.show_text(&s.bytes)?,
            Object::Integer(i) => kern(canvas, i as f32),
            Object::Real(r) => kern(canvas, r as f32),
            other => {
                return Err(PdfError::Type {
                    expected: "string or number",
                    received: other.type_name(),
                })
            }
        }
    }
    Ok(())
}

/// `'`: move to the next line, then show the string.
fn next_line_show_text(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    move_to_next_line(canvas, Vec::new())?;
    show_text(canvas, operands)
}

/// `"`: set word and character spacing, then `'`.
fn next_line_show_text_with_spacing(
    canvas: &mut Canvas,
    operands: Vec<Object>,
) -> Result<(), PdfError> {
    canvas.graphics_state.word_spacing = number(&operands[0])?;
    canvas.graphics_state.character_spacing = number(&operands[1])?;
    next_line_show_text(canvas, vec![operands[2].clone()])
}

// --- color ---

fn set_stroke_color_space(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let space = ColorSpace::from_name(name(&operands[0])?);
    canvas.graphics_state.stroke_color = space.default_color();
    canvas.graphics_state.stroke_color_space = space;
    Ok(())
}

fn set_non_stroke_color_space(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let space = ColorSpace::from_name(name(&operands[0])?);
    canvas.graphics_state.non_stroke_color = space.default_color();
    canvas.graphics_state.non_stroke_color_space = space;
    Ok(())
}

/// `SC` / `SCN`: pattern operands may trail a name; only the numeric
/// components select the color.
fn set_stroke_color(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let components: Vec<f32> = operands.iter().filter_map(|o| o.as_f64()).map(|v| v as f32).collect();
    if let Some(color) = Color::from_components(&components) {
        canvas.graphics_state.stroke_color = color;
    }
    Ok(())
}

fn set_non_stroke_color(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let components: Vec<f32> = operands.iter().filter_map(|o| o.as_f64()).map(|v| v as f32).collect();
    if let Some(color) = Color::from_components(&components) {
        canvas.graphics_state.non_stroke_color = color;
    }
    Ok(())
}

fn set_stroke_gray(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let gray = number(&operands[0])?;
    canvas.graphics_state.stroke_color_space = ColorSpace::DeviceGray;
    canvas.graphics_state.stroke_color = Color::Greyscale(Greyscale { percent: gray });
    Ok(())
}

fn set_non_stroke_gray(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let gray = number(&operands[0])?;
    canvas.graphics_state.non_stroke_color_space = ColorSpace::DeviceGray;
    canvas.graphics_state.non_stroke_color = Color::Greyscale(Greyscale { percent: gray });
    Ok(())
}

fn set_stroke_rgb(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let c = numbers(&operands)?;
    canvas.graphics_state.stroke_color_space = ColorSpace::DeviceRgb;
    canvas.graphics_state.stroke_color = Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
    });
    Ok(())
}

fn set_non_stroke_rgb(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let c = numbers(&operands)?;
    canvas.graphics_state.non_stroke_color_space = ColorSpace::DeviceRgb;
    canvas.graphics_state.non_stroke_color = Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
    });
    Ok(())
}

fn set_stroke_cmyk(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let c = numbers(&operands)?;
    canvas.graphics_state.stroke_color_space = ColorSpace::DeviceCmyk;
    canvas.graphics_state.stroke_color = Color::Cmyk(Cmyk {
        c: c[0],
        m: c[1],
        y: c[2],
        k: c[3],
    });
    Ok(())
}

fn set_non_stroke_cmyk(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let c = numbers(&operands)?;
    canvas.graphics_state.non_stroke_color_space = ColorSpace::DeviceCmyk;
    canvas.graphics_state.non_stroke_color = Color::Cmyk(Cmyk {
        c: c[0],
        m: c[1],
        y: c[2],
        k: c[3],
    });
    Ok(())
}

// --- path construction ---

fn move_to(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let x = number(&operands[0])?;
    let y = number(&operands[1])?;
    if !canvas.current_subpath.is_empty() {
        let subpath = std::mem::take(&mut canvas.current_subpath);
        canvas.subpaths.push(subpath);
    }
    canvas.current_subpath.push((x, y));
    Ok(())
}

fn line_to(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let x = number(&operands[0])?;
    let y = number(&operands[1])?;
    canvas.current_subpath.push((x, y));
    Ok(())
}

fn curve_to(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let p = numbers(&operands)?;
    canvas.current_subpath.push((p[0], p[1]));
    canvas.current_subpath.push((p[2], p[3]));
    canvas.current_subpath.push((p[4], p[5]));
    Ok(())
}

fn curve_to_initial(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let p = numbers(&operands)?;
    canvas.current_subpath.push((p[0], p[1]));
    canvas.current_subpath.push((p[2], p[3]));
    Ok(())
}

fn curve_to_final(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let p = numbers(&operands)?;
    canvas.current_subpath.push((p[0], p[1]));
    canvas.current_subpath.push((p[2], p[3]));
    Ok(())
}

fn close_subpath(_canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    Ok(())
}

/// `re`: append a rectangle as a complete subpath.
fn append_rectangle(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let p = numbers(&operands)?;
    let (x, y, w, h) = (p[0], p[1], p[2], p[3]);
    if !canvas.current_subpath.is_empty() {
        let subpath = std::mem::take(&mut canvas.current_subpath);
        canvas.subpaths.push(subpath);
    }
    canvas
        .subpaths
        .push(vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h)]);
    Ok(())
}

// --- path painting and clipping ---

fn paint_path(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.finish_path();
    Ok(())
}

fn clip_nonzero(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.pending_clip = true;
    Ok(())
}

fn clip_evenodd(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.pending_clip = true;
    Ok(())
}

// --- marked content ---

fn marked_content_point(_canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    name(&operands[0])?;
    Ok(())
}

fn marked_content_point_with_properties(
    _canvas: &mut Canvas,
    operands: Vec<Object>,
) -> Result<(), PdfError> {
    name(&operands[0])?;
    Ok(())
}

fn begin_marked_content(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let tag = name(&operands[0])?.clone();
    canvas.marked_content_stack.push(tag);
    Ok(())
}

/// `BDC`: the tag plus an inline property list or a name into the
/// `Properties` subdictionary.
fn begin_marked_content_with_properties(
    canvas: &mut Canvas,
    operands: Vec<Object>,
) -> Result<(), PdfError> {
    let tag = name(&operands[0])?.clone();
    canvas.marked_content_stack.push(tag);
    Ok(())
}

fn end_marked_content(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    if canvas.marked_content_stack.pop().is_none() {
        warn!("'EMC' with empty marked content stack");
    }
    Ok(())
}

// --- compatibility sections ---

fn begin_compatibility_section(
    canvas: &mut Canvas,
    _operands: Vec<Object>,
) -> Result<(), PdfError> {
    canvas.compatibility_depth += 1;
    Ok(())
}

fn end_compatibility_section(canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    canvas.compatibility_depth = canvas.compatibility_depth.saturating_sub(1);
    Ok(())
}

// --- XObjects ---

/// `Do`: forms are interpreted recursively with a saved graphics state;
/// images emit a render event with the CTM-mapped unit square.
fn invoke_xobject(canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    let xobject_name = name(&operands[0])?.as_str().into_owned();
    let stream = match canvas.xobject_resource(&xobject_name) {
        Some(s) => s,
        None => {
            return Err(PdfError::Type {
                expected: "XObject resource",
                received: "null",
            })
        }
    };

    match stream.dict.get_name("Subtype").map(|n| n.0.clone()) {
        Some(subtype) if subtype == b"Form" => {
            canvas.save_graphics_state();
            if let Some(Object::Array(m)) = stream.dict.get("Matrix") {
                let m: Vec<f32> = m.iter().filter_map(|o| o.as_f64()).map(|v| v as f32).collect();
                if m.len() == 6 {
                    let matrix = Matrix::from_array([m[0], m[1], m[2], m[3], m[4], m[5]]);
                    canvas.graphics_state.ctm = matrix.mul(&canvas.graphics_state.ctm);
                }
            }
            let own_resources = stream.dict.get("Resources").and_then(Object::as_dict).cloned();
            if let Some(resources) = own_resources {
                canvas.push_resources(resources);
            }
            let content = decoded_bytes(&stream).to_vec();
            let result = interpret_content(&content, canvas);
            if stream.dict.contains_key("Resources") {
                canvas.pop_resources();
            }
            canvas.restore_graphics_state();
            result
        }
        Some(subtype) if subtype == b"Image" => {
            let ctm = &canvas.graphics_state.ctm;
            let corners = [
                ctm.transform_point(0.0, 0.0),
                ctm.transform_point(1.0, 0.0),
                ctm.transform_point(0.0, 1.0),
                ctm.transform_point(1.0, 1.0),
            ];
            let min_x = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
            let max_x = corners.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
            let min_y = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
            let max_y = corners.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);
            canvas.emit(Event::ImageRender(ImageRenderEvent {
                name: xobject_name,
                bbox: Rect::from_corners(min_x, min_y, max_x, max_y),
            }));
            Ok(())
        }
        _ => Err(PdfError::Type {
            expected: "Form or Image XObject",
            received: "dictionary",
        }),
    }
}

// --- Type 3 glyph metrics and shading ---

fn type3_width(_canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    Ok(())
}

fn type3_width_and_bbox(_canvas: &mut Canvas, _operands: Vec<Object>) -> Result<(), PdfError> {
    Ok(())
}

fn shading_fill(_canvas: &mut Canvas, operands: Vec<Object>) -> Result<(), PdfError> {
    name(&operands[0])?;
    Ok(())
}
