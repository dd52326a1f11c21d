//! End-to-end: a compressed multi-object document through parsing,
//! interpretation and the event listeners.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use readpdf::*;

/// Assemble a classical-xref file from raw object bodies, object 1 first.
fn build_pdf(objects: &[Vec<u8>], trailer_extra: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(bytes.len());
        bytes.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        bytes.extend_from_slice(body);
        bytes.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = bytes.len();
    bytes.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    bytes.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        bytes.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    bytes.extend_from_slice(
        format!(
            "trailer<</Size {} /Root 1 0 R{}>>\nstartxref\n{}\n%%EOF",
            objects.len() + 1,
            trailer_extra,
            xref_offset
        )
        .as_bytes(),
    );
    bytes
}

fn flate(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn sample_document() -> Vec<u8> {
    let content = b"BT /F1 12 Tf 72 720 Td (Hi) Tj ET";
    let compressed = flate(content);
    let mut content_obj = format!(
        "<</Length {}/Filter/FlateDecode>>\nstream\n",
        compressed.len()
    )
    .into_bytes();
    content_obj.extend_from_slice(&compressed);
    content_obj.extend_from_slice(b"\nendstream");

    let mut widths = vec![0i64; 34];
    widths[0] = 722;
    widths[33] = 222;
    let widths: Vec<String> = widths.iter().map(|w| w.to_string()).collect();
    let font_obj = format!(
        "<</Type/Font/Subtype/Type1/BaseFont/Helvetica/FirstChar 72/LastChar 105/Widths[{}]>>",
        widths.join(" ")
    );

    build_pdf(
        &[
            b"<</Type/Catalog/Pages 2 0 R/Lang(en-US)>>".to_vec(),
            b"<</Type/Pages/Kids[3 0 R]/Count 1/Resources<</Font<</F1 5 0 R>>>>/MediaBox[0 0 612 792]>>"
                .to_vec(),
            b"<</Type/Page/Parent 2 0 R/Contents 4 0 R>>".to_vec(),
            content_obj,
            font_obj.into_bytes(),
            b"<</Title(Sample)/Author(readpdf)/CreationDate(D:20240102030405Z)>>".to_vec(),
        ],
        " /Info 6 0 R",
    )
}

/// Collects glyph text through a handle that survives the listener hand-off.
struct SharedText(Rc<RefCell<String>>);

impl EventListener for SharedText {
    fn event_occurred(&mut self, event: &Event) -> Result<(), PdfError> {
        if let Event::GlyphRender(glyph) = event {
            self.0.borrow_mut().push_str(&glyph.text);
        }
        Ok(())
    }
}

#[test]
fn test_reads_compressed_document_and_extracts_text() {
    let bytes = sample_document();
    let text = Rc::new(RefCell::new(String::new()));
    let mut listeners: Vec<Box<dyn EventListener>> = vec![
        Box::new(SharedText(text.clone())),
        Box::new(FontExtraction::new()),
    ];
    let doc = read_pdf_from_bytes(&bytes, &mut listeners).unwrap();

    assert_eq!(doc.pages.len(), 1);
    assert_eq!(doc.number_of_pages(), 1);
    // the page inherited its MediaBox and resources from the pages node
    assert_eq!(doc.pages[0].media_box, Rect::new(0.0, 0.0, 612.0, 792.0));
    assert_eq!(
        doc.pages[0].content,
        b"BT /F1 12 Tf 72 720 Td (Hi) Tj ET".to_vec()
    );
    assert_eq!(text.borrow().as_str(), "Hi");
}

#[test]
fn test_document_info_accessors() {
    let bytes = sample_document();
    let mut listeners: Vec<Box<dyn EventListener>> = Vec::new();
    let doc = read_pdf_from_bytes(&bytes, &mut listeners).unwrap();

    let info = doc.info();
    assert_eq!(info.title().as_deref(), Some("Sample"));
    assert_eq!(info.author().as_deref(), Some("readpdf"));
    assert_eq!(info.language().as_deref(), Some("en-US"));
    assert_eq!(info.subject(), None);
    assert_eq!(info.number_of_pages(), 1);
    assert_eq!(info.file_size(), bytes.len());
    let created = info.creation_date_parsed().unwrap();
    assert_eq!(created.year(), 2024);

    // missing paths resolve to None, never panic
    assert!(doc.get_path(&["Trailer", "Nope", "Deeper"]).is_none());
    assert!(doc.get_path(&["Elsewhere"]).is_none());
}

#[test]
fn test_resolution_is_stable_across_lookups() {
    let bytes = sample_document();
    let mut listeners: Vec<Box<dyn EventListener>> = Vec::new();
    let doc = read_pdf_from_bytes(&bytes, &mut listeners).unwrap();

    // the hydrated catalog and a fresh resolution agree
    let mut parser = readpdf::parser::ObjectParser::new(&bytes);
    let root_once = doc.xref.get(1, &mut parser).unwrap().unwrap();
    let root_twice = doc.xref.get(1, &mut parser).unwrap().unwrap();
    assert_eq!(root_once, root_twice);
}
