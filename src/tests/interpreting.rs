//! Interpreter-level behavior: state stack discipline, text positioning,
//! compatibility sections, XObjects.

use pretty_assertions::assert_eq;

use crate::events::{Event, EventBus, EventListener};
use crate::interpreter::{interpret_content, Canvas};
use crate::matrix::Matrix;
use crate::object::{Dictionary, Name, Object, Stream};
use crate::rectangle::Rect;
use crate::tests::support::RecordingListener;

fn run(content: &[u8], resources: Dictionary) -> (Vec<Event>, Matrix, Matrix, usize) {
    let (recorder, events) = RecordingListener::new();
    let mut listeners: Vec<Box<dyn EventListener>> = vec![Box::new(recorder)];
    let mut bus = EventBus::new(&mut listeners);
    let mut canvas = Canvas::new(resources, 0, &mut bus);
    interpret_content(content, &mut canvas).unwrap();
    let tm = canvas.graphics_state.text_matrix;
    let tlm = canvas.graphics_state.text_line_matrix;
    let depth = canvas.state_stack.len();
    let events = events.borrow().clone();
    (events, tm, tlm, depth)
}

fn helvetica_resources() -> Dictionary {
    let mut widths = vec![Object::Integer(0); 34];
    widths[0] = Object::Integer(722); // H
    widths[33] = Object::Integer(222); // i
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(Name::from("Font")));
    font.set("Subtype", Object::Name(Name::from("Type1")));
    font.set("BaseFont", Object::Name(Name::from("Helvetica")));
    font.set("FirstChar", Object::Integer(72));
    font.set("LastChar", Object::Integer(105));
    font.set("Widths", Object::Array(widths));
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Dictionary(font));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    resources
}

#[test]
fn test_state_stack_depth_balances() {
    let (_, _, _, depth) = run(b"q q q Q Q Q", Dictionary::new());
    assert_eq!(depth, 0);

    let (_, _, _, depth) = run(b"q q Q", Dictionary::new());
    assert_eq!(depth, 1);
}

#[test]
fn test_td_zero_is_noop() {
    let (_, tm_once, tlm_once, _) = run(b"BT 5 3 Td", Dictionary::new());
    let (_, tm_twice, tlm_twice, _) = run(b"BT 5 3 Td 0 0 Td", Dictionary::new());
    assert_eq!(tm_once, tm_twice);
    assert_eq!(tlm_once, tlm_twice);
}

#[test]
fn test_text_line_matrix_follows_positioning() {
    // after Td, Tm and Tlm agree
    let (_, tm, tlm, _) = run(b"BT 10 20 Td", Dictionary::new());
    assert_eq!(tm, tlm);
    assert_eq!(tm.e, 10.0);
    assert_eq!(tm.f, 20.0);

    // TD also sets the leading; T* then advances by it
    let (_, tm, tlm, _) = run(b"BT 0 -14 TD T*", Dictionary::new());
    assert_eq!(tm, tlm);
    assert_eq!(tm.f, -28.0);
}

#[test]
fn test_tm_sets_both_matrices() {
    let (_, tm, tlm, _) = run(b"BT 2 0 0 2 50 60 Tm", Dictionary::new());
    let expected = Matrix::from_array([2.0, 0.0, 0.0, 2.0, 50.0, 60.0]);
    assert_eq!(tm, expected);
    assert_eq!(tlm, expected);
}

#[test]
fn test_tj_kerning_subtracts_from_advance() {
    let (events, tm, _, _) = run(b"BT /F1 12 Tf [(H) 500 (H)] TJ", helvetica_resources());
    let glyphs = events
        .iter()
        .filter(|e| matches!(e, Event::GlyphRender(_)))
        .count();
    assert_eq!(glyphs, 2);
    // two H advances minus the 500/1000 adjustment at size 12
    let expected = 2.0 * 722.0 * 12.0 / 1000.0 - 0.5 * 12.0;
    assert!((tm.e - expected).abs() < 1e-3);
}

#[test]
fn test_zero_width_glyph_advances_zero() {
    let mut descriptor = Dictionary::new();
    descriptor.set("MissingWidth", Object::Integer(250));
    let mut font = Dictionary::new();
    font.set("Subtype", Object::Name(Name::from("Type1")));
    font.set("BaseFont", Object::Name(Name::from("Widths-Demo")));
    font.set("FirstChar", Object::Integer(65));
    font.set("LastChar", Object::Integer(66));
    font.set(
        "Widths",
        Object::Array(vec![Object::Integer(0), Object::Integer(500)]),
    );
    font.set("FontDescriptor", Object::Dictionary(descriptor));
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Dictionary(font));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let (events, tm, _, _) = run(b"BT /F1 10 Tf (AB) Tj", resources);
    let glyphs = events
        .iter()
        .filter(|e| matches!(e, Event::GlyphRender(_)))
        .count();
    assert_eq!(glyphs, 2);
    // 'A' has an explicit zero advance; MissingWidth must not leak in
    let expected = (0.0 + 500.0) * 10.0 / 1000.0;
    assert!((tm.e - expected).abs() < 1e-4);
}

#[test]
fn test_word_spacing_applies_to_space_code() {
    let mut resources = helvetica_resources();
    // widen the font range so the space code 0x20 resolves to a width
    let fonts = resources.get_mut("Font").unwrap();
    if let Object::Dictionary(fonts) = fonts {
        if let Some(Object::Dictionary(font)) = fonts.get_mut("F1") {
            font.set("FirstChar", Object::Integer(32));
            font.set("LastChar", Object::Integer(32));
            font.set("Widths", Object::Array(vec![Object::Integer(250)]));
        }
    }
    let (_, tm_plain, _, _) = run(b"BT /F1 10 Tf ( ) Tj", resources.clone());
    let (_, tm_spaced, _, _) = run(b"BT /F1 10 Tf 7 Tw ( ) Tj", resources);
    // per the displacement rule, word spacing shifts the advance by -Tw*Tfs
    assert!((tm_plain.e - 2.5).abs() < 1e-4);
    assert!(((tm_spaced.e) - (2.5 - 7.0 * 10.0)).abs() < 1e-3);
}

#[test]
fn test_unknown_operator_clears_operands() {
    // the bogus operator swallows its operands; the rectangle still lands
    let (_, _, _, _) = run(b"1 2 frobnicate", Dictionary::new());

    let (recorder, _) = RecordingListener::new();
    let mut listeners: Vec<Box<dyn EventListener>> = vec![Box::new(recorder)];
    let mut bus = EventBus::new(&mut listeners);
    let mut canvas = Canvas::new(Dictionary::new(), 0, &mut bus);
    interpret_content(b"9 9 frobnicate 0 0 10 10 re S", &mut canvas).unwrap();
    assert!(canvas.subpaths.is_empty());
    assert!(canvas.current_subpath.is_empty());
}

#[test]
fn test_compatibility_section_swallows_unknowns() {
    // unknown operators and type errors inside BX..EX are silent
    let (_, _, _, depth) = run(b"BX 1 2 frobnicate (a) (b) Tf EX q", Dictionary::new());
    assert_eq!(depth, 1);
}

#[test]
fn test_form_xobject_restores_state() {
    let mut form_dict = Dictionary::new();
    form_dict.set("Subtype", Object::Name(Name::from("Form")));
    form_dict.set(
        "Matrix",
        Object::Array(vec![
            Object::Integer(2),
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(2),
            Object::Integer(0),
            Object::Integer(0),
        ]),
    );
    let mut form = Stream::new(form_dict, b"5 w".to_vec());
    form.decoded_bytes = Some(b"5 w".to_vec());

    let mut xobjects = Dictionary::new();
    xobjects.set("Fm1", Object::Stream(form));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let (recorder, _) = RecordingListener::new();
    let mut listeners: Vec<Box<dyn EventListener>> = vec![Box::new(recorder)];
    let mut bus = EventBus::new(&mut listeners);
    let mut canvas = Canvas::new(resources, 0, &mut bus);
    interpret_content(b"/Fm1 Do", &mut canvas).unwrap();

    // the form's line width and matrix died with its saved state
    assert_eq!(canvas.graphics_state.line_width, 1.0);
    assert_eq!(canvas.graphics_state.ctm, Matrix::identity());
    assert!(canvas.state_stack.is_empty());
}

#[test]
fn test_image_xobject_emits_ctm_mapped_box() {
    let mut image_dict = Dictionary::new();
    image_dict.set("Subtype", Object::Name(Name::from("Image")));
    let mut image = Stream::new(image_dict, Vec::new());
    image.decoded_bytes = Some(Vec::new());

    let mut xobjects = Dictionary::new();
    xobjects.set("Im1", Object::Stream(image));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let (events, _, _, _) = run(b"q 100 0 0 50 10 20 cm /Im1 Do Q", resources);
    let image_events: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::ImageRender(i) => Some(i),
            _ => None,
        })
        .collect();
    assert_eq!(image_events.len(), 1);
    assert_eq!(image_events[0].name, "Im1");
    assert_eq!(image_events[0].bbox, Rect::new(10.0, 20.0, 100.0, 50.0));
}

#[test]
fn test_ext_gstate_applies_parameters() {
    let mut gs1 = Dictionary::new();
    gs1.set("LW", Object::Integer(4));
    gs1.set("ca", Object::Real(0.5));
    let mut ext = Dictionary::new();
    ext.set("GS1", Object::Dictionary(gs1));
    let mut resources = Dictionary::new();
    resources.set("ExtGState", Object::Dictionary(ext));

    let (recorder, _) = RecordingListener::new();
    let mut listeners: Vec<Box<dyn EventListener>> = vec![Box::new(recorder)];
    let mut bus = EventBus::new(&mut listeners);
    let mut canvas = Canvas::new(resources, 0, &mut bus);
    interpret_content(b"/GS1 gs", &mut canvas).unwrap();
    assert_eq!(canvas.graphics_state.line_width, 4.0);
    assert_eq!(canvas.graphics_state.alpha_constant, 0.5);
}

#[test]
fn test_marked_content_stack() {
    let (recorder, _) = RecordingListener::new();
    let mut listeners: Vec<Box<dyn EventListener>> = vec![Box::new(recorder)];
    let mut bus = EventBus::new(&mut listeners);
    let mut canvas = Canvas::new(Dictionary::new(), 0, &mut bus);
    interpret_content(b"/Span BMC /OC <</MCID 0>> BDC EMC", &mut canvas).unwrap();
    assert_eq!(canvas.marked_content_stack, vec![Name::from("Span")]);
}

#[test]
fn test_color_space_reset_on_cs() {
    use crate::color::{Color, ColorSpace, Greyscale};

    let (recorder, _) = RecordingListener::new();
    let mut listeners: Vec<Box<dyn EventListener>> = vec![Box::new(recorder)];
    let mut bus = EventBus::new(&mut listeners);
    let mut canvas = Canvas::new(Dictionary::new(), 0, &mut bus);
    interpret_content(b"1 0 0 RG /DeviceGray CS", &mut canvas).unwrap();

    // CS resets the stroking color to the new space's default
    assert_eq!(
        canvas.graphics_state.stroke_color_space,
        ColorSpace::DeviceGray
    );
    assert_eq!(
        canvas.graphics_state.stroke_color,
        Color::Greyscale(Greyscale { percent: 0.0 })
    );
    // the non-stroking side is untouched
    assert_eq!(canvas.graphics_state.non_stroke_color, Color::black());
}

#[test]
fn test_scn_arity_follows_color_space() {
    use crate::color::{Color, Cmyk};

    let (recorder, _) = RecordingListener::new();
    let mut listeners: Vec<Box<dyn EventListener>> = vec![Box::new(recorder)];
    let mut bus = EventBus::new(&mut listeners);
    let mut canvas = Canvas::new(Dictionary::new(), 0, &mut bus);
    interpret_content(b"/DeviceCMYK CS 0 0.1 0.2 0.3 SCN", &mut canvas).unwrap();
    assert_eq!(
        canvas.graphics_state.stroke_color,
        Color::Cmyk(Cmyk {
            c: 0.0,
            m: 0.1,
            y: 0.2,
            k: 0.3
        })
    );
}
