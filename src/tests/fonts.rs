//! Font hydration: AFM fallbacks, ToUnicode, and the extraction listener.

use pretty_assertions::assert_eq;

use crate::afm;
use crate::events::{Event, EventListener};
use crate::font::Font;
use crate::listeners::{FontExtraction, TextExtraction};
use crate::object::{Dictionary, Name, Object, Stream};

const MINI_HELVETICA: &str = "StartFontMetrics 4.1\n\
FontName Helvetica\n\
FamilyName Helvetica\n\
Ascender 718\n\
Descender -207\n\
StartCharMetrics 3\n\
C 32 ; WX 278 ; N space ;\n\
C 72 ; WX 722 ; N H ;\n\
C 105 ; WX 222 ; N i ;\n\
EndCharMetrics\n\
EndFontMetrics\n";

#[test]
fn test_widthless_font_borrows_afm_metrics() {
    afm::register_afm(MINI_HELVETICA).unwrap();

    let mut dict = Dictionary::new();
    dict.set("Subtype", Object::Name(Name::from("Type1")));
    dict.set("BaseFont", Object::Name(Name::from("Helvetica")));
    let font = Font::from_dict(&dict).unwrap();

    assert_eq!(font.first_char, 32);
    assert_eq!(font.last_char, 105);
    assert_eq!(font.glyph_width(72), 722.0);
    assert_eq!(font.glyph_width(105), 222.0);
    let descriptor = font.descriptor.as_ref().unwrap();
    assert_eq!(descriptor.ascent, Some(718.0));
}

#[test]
fn test_explicit_zero_width_survives_missing_width() {
    let mut descriptor = Dictionary::new();
    descriptor.set("MissingWidth", Object::Integer(250));

    let mut dict = Dictionary::new();
    dict.set("Subtype", Object::Name(Name::from("Type1")));
    dict.set("BaseFont", Object::Name(Name::from("Widths-Demo")));
    dict.set("FirstChar", Object::Integer(65));
    dict.set("LastChar", Object::Integer(66));
    dict.set(
        "Widths",
        Object::Array(vec![Object::Integer(0), Object::Integer(500)]),
    );
    dict.set("FontDescriptor", Object::Dictionary(descriptor));

    let font = Font::from_dict(&dict).unwrap();
    assert_eq!(font.glyph_width(65), 0.0);
    assert_eq!(font.glyph_width(66), 500.0);
    // only codes without any entry fall back to MissingWidth
    assert_eq!(font.glyph_width(64), 250.0);
}

#[test]
fn test_to_unicode_overrides_latin1() {
    let mut cmap_stream = Stream::new(
        Dictionary::new(),
        b"1 beginbfchar\n<0041> <20AC>\nendbfchar".to_vec(),
    );
    cmap_stream.decoded_bytes = Some(cmap_stream.data.clone());

    let mut dict = Dictionary::new();
    dict.set("Subtype", Object::Name(Name::from("Type1")));
    dict.set("BaseFont", Object::Name(Name::from("Custom")));
    dict.set("FirstChar", Object::Integer(65));
    dict.set("LastChar", Object::Integer(65));
    dict.set("Widths", Object::Array(vec![Object::Integer(500)]));
    dict.set("ToUnicode", Object::Stream(cmap_stream));

    let font = Font::from_dict(&dict).unwrap();
    assert_eq!(font.unicode(0x41).as_deref(), Some("\u{20AC}"));
    // unmapped codes fall back to Latin-1
    assert_eq!(font.unicode(0x42).as_deref(), Some("B"));
}

#[test]
fn test_font_extraction_listener_keys_by_page() {
    let mut font = Dictionary::new();
    font.set("BaseFont", Object::Name(Name::from("Helvetica")));
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Dictionary(font));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    let mut page = Dictionary::new();
    page.set("Resources", Object::Dictionary(resources));

    let mut listener = FontExtraction::new();
    listener
        .event_occurred(&Event::BeginPage {
            page_number: 0,
            page: page.clone(),
        })
        .unwrap();
    listener
        .event_occurred(&Event::BeginPage {
            page_number: 1,
            page: Dictionary::new(),
        })
        .unwrap();

    assert_eq!(listener.font_names_on_page(0), vec!["Helvetica".to_string()]);
    assert!(listener.font_names_on_page(1).is_empty());
    assert!(listener.fonts_on_page(7).is_empty());
}

#[test]
fn test_text_extraction_listener_collects_glyphs() {
    use crate::events::GlyphRenderEvent;
    use crate::rectangle::Rect;

    let mut listener = TextExtraction::new();
    listener
        .event_occurred(&Event::BeginPage {
            page_number: 0,
            page: Dictionary::new(),
        })
        .unwrap();
    for (i, ch) in ["H", "i"].iter().enumerate() {
        listener
            .event_occurred(&Event::GlyphRender(GlyphRenderEvent {
                text: ch.to_string(),
                code: 72 + i as u32,
                font_name: "Helvetica".to_string(),
                font_size: 12.0,
                bbox: Rect::new(i as f32, 0.0, 1.0, 1.0),
                baseline: Rect::new(i as f32, 0.0, 1.0, 0.0),
            }))
            .unwrap();
    }
    listener
        .event_occurred(&Event::EndPage { page_number: 0 })
        .unwrap();
    assert_eq!(listener.text_on_page(0), "Hi");
    assert_eq!(listener.text_on_page(3), "");
}
