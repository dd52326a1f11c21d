//! Document assembly: reads the xref, materializes the catalog and page
//! tree, and drives the interpreter over every page.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::errors::PdfError;
use crate::events::{EventBus, EventListener};
use crate::filters::decoded_bytes;
use crate::interpreter::interpret_page;
use crate::object::{Dictionary, Object};
use crate::parser::ObjectParser;
use crate::rectangle::Rect;
use crate::transform::{TransformContext, TransformerPipeline};
use crate::xref::XRef;

/// One page, fully resolved: its dictionary, effective (inherited)
/// resources, boxes and concatenated content stream.
#[derive(Debug, Clone)]
pub struct PdfPage {
    pub dict: Dictionary,
    pub resources: Dictionary,
    pub media_box: Rect,
    pub trim_box: Rect,
    pub crop_box: Rect,
    pub content: Vec<u8>,
}

/// The navigable object graph of a document.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    /// The trailer, with `Root` and `Info` hydrated in place.
    pub trailer: Dictionary,
    pub xref: XRef,
    pub catalog: Dictionary,
    pub pages: Vec<PdfPage>,
    pub file_size: usize,
}

impl PdfDocument {
    /// Normalized property lookup: walk `path` through nested dictionaries
    /// starting at the virtual document root, `None` on any missing step.
    ///
    /// The first component is `"Trailer"`; e.g.
    /// `doc.get_path(&["Trailer", "Info", "Title"])`.
    pub fn get_path(&self, path: &[&str]) -> Option<&Object> {
        let (first, rest) = path.split_first()?;
        if *first != "Trailer" {
            return None;
        }
        let mut dict = &self.trailer;
        let (last, middle) = rest.split_last()?;
        for key in middle {
            dict = dict.get(key)?.as_dict()?;
        }
        dict.get(last)
    }

    /// The number of pages, preferring the page tree's own `Count`.
    pub fn number_of_pages(&self) -> usize {
        self.get_path(&["Trailer", "Root", "Pages", "Count"])
            .and_then(Object::as_i64)
            .map(|c| c.max(0) as usize)
            .unwrap_or(self.pages.len())
    }
}

/// Read a document from bytes, delivering rendering events to `listeners`
/// while each page is interpreted.
pub fn read_pdf_from_bytes(
    bytes: &[u8],
    listeners: &mut [Box<dyn EventListener>],
) -> Result<PdfDocument, PdfError> {
    let mut parser = ObjectParser::new(bytes);
    let xref = XRef::read(&mut parser)?;

    let pipeline = TransformerPipeline::standard();
    let mut cache = HashMap::new();
    let mut in_progress = HashSet::new();
    let mut ctx = TransformContext {
        parser: &mut parser,
        xref: &xref,
        cache: &mut cache,
        in_progress: &mut in_progress,
    };

    // hydrate Root and Info into the trailer
    let mut trailer = xref.trailer.clone();
    let catalog = match pipeline.apply_entry(&xref.trailer, "Root", &mut ctx)? {
        Some(Object::Dictionary(d)) => d,
        Some(other) => {
            return Err(PdfError::Type {
                expected: "catalog dictionary",
                received: other.type_name(),
            })
        }
        None => Dictionary::new(),
    };
    trailer.set("Root", Object::Dictionary(catalog.clone()));
    if let Some(info) = pipeline.apply_entry(&xref.trailer, "Info", &mut ctx)? {
        trailer.set("Info", info);
    }
    if let Some(id) = pipeline.apply_entry(&xref.trailer, "ID", &mut ctx)? {
        trailer.set("ID", id);
    }

    // flatten the page tree, carrying inheritable attributes down
    let mut pages = Vec::new();
    if let Some(root_node) = catalog.get("Pages").and_then(Object::as_dict) {
        collect_pages(root_node, &Inherited::default(), &mut pages, 0);
    }

    // interpret every page in order, fanning events out to the listeners
    let mut bus = EventBus::new(listeners);
    for (page_number, page) in pages.iter().enumerate() {
        // listeners see the page with its effective resources filled in
        let mut page_dict = page.dict.clone();
        if !page_dict.contains_key("Resources") {
            page_dict.set("Resources", Object::Dictionary(page.resources.clone()));
        }
        interpret_page(
            &page_dict,
            page.resources.clone(),
            &page.content,
            page_number,
            &mut bus,
        )?;
    }

    Ok(PdfDocument {
        trailer,
        xref,
        catalog,
        pages,
        file_size: bytes.len(),
    })
}

/// Attributes a Pages node passes down to its kids.
#[derive(Debug, Clone, Default)]
struct Inherited {
    resources: Option<Dictionary>,
    media_box: Option<Rect>,
    crop_box: Option<Rect>,
}

fn collect_pages(node: &Dictionary, inherited: &Inherited, out: &mut Vec<PdfPage>, depth: usize) {
    if depth > 64 {
        warn!("page tree deeper than 64 levels, truncating");
        return;
    }

    let mut inherited = inherited.clone();
    if let Some(resources) = node.get("Resources").and_then(Object::as_dict) {
        inherited.resources = Some(resources.clone());
    }
    if let Some(media_box) = node.get("MediaBox").and_then(parse_rect) {
        inherited.media_box = Some(media_box);
    }
    if let Some(crop_box) = node.get("CropBox").and_then(parse_rect) {
        inherited.crop_box = Some(crop_box);
    }

    let node_type = node.get_name("Type").map(|n| n.0.clone());
    match node_type.as_deref() {
        Some(b"Pages") => {
            if let Some(kids) = node.get("Kids").and_then(Object::as_array) {
                for kid in kids {
                    match kid.as_dict() {
                        Some(kid_dict) => collect_pages(kid_dict, &inherited, out, depth + 1),
                        None => warn!("page tree kid is not a dictionary, skipping"),
                    }
                }
            }
        }
        Some(b"Page") => {
            out.push(build_page(node, &inherited));
        }
        _ => warn!("page tree node without a Page/Pages type, skipping"),
    }
}

fn build_page(dict: &Dictionary, inherited: &Inherited) -> PdfPage {
    // US Letter, the common fallback when no MediaBox is inherited at all
    let media_box = dict
        .get("MediaBox")
        .and_then(parse_rect)
        .or(inherited.media_box)
        .unwrap_or(Rect::new(0.0, 0.0, 612.0, 792.0));
    let crop_box = dict
        .get("CropBox")
        .and_then(parse_rect)
        .or(inherited.crop_box)
        .unwrap_or(media_box);
    let trim_box = dict.get("TrimBox").and_then(parse_rect).unwrap_or(media_box);
    let resources = dict
        .get("Resources")
        .and_then(Object::as_dict)
        .cloned()
        .or_else(|| inherited.resources.clone())
        .unwrap_or_default();

    PdfPage {
        dict: dict.clone(),
        resources,
        media_box,
        trim_box,
        crop_box,
        content: gather_content(dict),
    }
}

/// Concatenate the page's content streams in array order, with a single
/// space separator byte between them.
fn gather_content(page: &Dictionary) -> Vec<u8> {
    let mut content = Vec::new();
    match page.get("Contents") {
        Some(Object::Stream(stream)) => {
            content.extend_from_slice(decoded_bytes(stream));
        }
        Some(Object::Array(streams)) => {
            for (i, element) in streams.iter().enumerate() {
                match element {
                    Object::Stream(stream) => {
                        if i > 0 {
                            content.push(b' ');
                        }
                        content.extend_from_slice(decoded_bytes(stream));
                    }
                    other => {
                        warn!("content array element is a {}, skipping", other.type_name())
                    }
                }
            }
        }
        Some(other) => warn!("page Contents is a {}, skipping", other.type_name()),
        None => {}
    }
    content
}

/// A PDF rectangle: an array of four numbers `[llx lly urx ury]`.
fn parse_rect(obj: &Object) -> Option<Rect> {
    let arr = obj.as_array()?;
    if arr.len() != 4 {
        return None;
    }
    let nums: Vec<f32> = arr.iter().filter_map(|o| o.as_f64()).map(|v| v as f32).collect();
    if nums.len() != 4 {
        return None;
    }
    Some(Rect::from_corners(nums[0], nums[1], nums[2], nums[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Name;

    #[test]
    fn test_parse_rect() {
        let obj = Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]);
        assert_eq!(parse_rect(&obj), Some(Rect::new(0.0, 0.0, 612.0, 792.0)));
        assert_eq!(parse_rect(&Object::Integer(1)), None);
    }

    #[test]
    fn test_gather_content_joins_with_space() {
        let make_stream = |text: &[u8]| {
            let mut s = crate::object::Stream::new(Dictionary::new(), text.to_vec());
            s.decoded_bytes = Some(text.to_vec());
            Object::Stream(s)
        };
        let mut page = Dictionary::new();
        page.set(
            "Contents",
            Object::Array(vec![make_stream(b"BT"), make_stream(b"ET")]),
        );
        assert_eq!(gather_content(&page), b"BT ET");
    }

    #[test]
    fn test_collect_pages_inherits_attributes() {
        let mut resources = Dictionary::new();
        resources.set("ProcSet", Object::Array(vec![]));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(Name::from("Page")));

        let mut node = Dictionary::new();
        node.set("Type", Object::Name(Name::from("Pages")));
        node.set("Resources", Object::Dictionary(resources.clone()));
        node.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(200),
                Object::Integer(100),
            ]),
        );
        node.set("Kids", Object::Array(vec![Object::Dictionary(page)]));

        let mut pages = Vec::new();
        collect_pages(&node, &Inherited::default(), &mut pages, 0);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].media_box, Rect::new(0.0, 0.0, 200.0, 100.0));
        assert!(pages[0].resources.contains_key("ProcSet"));
    }
}
