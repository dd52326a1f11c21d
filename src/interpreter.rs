//! The page interpreter: drives the tokenizer over a content stream,
//! dispatching operators against the canvas and emitting rendering events.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use smallvec::SmallVec;

use crate::errors::PdfError;
use crate::events::{Event, EventBus, GlyphRenderEvent};
use crate::font::Font;
use crate::graphics_state::GraphicsState;
use crate::matrix::Matrix;
use crate::object::{Dictionary, Name, Object, Stream};
use crate::operators;
use crate::parser::{ContentItem, ObjectParser};
use crate::rectangle::Rect;

/// The canvas: all mutable state of one page interpretation.
pub struct Canvas<'a, 'b> {
    pub graphics_state: GraphicsState,
    pub state_stack: Vec<GraphicsState>,
    pub marked_content_stack: Vec<Name>,
    pub compatibility_depth: usize,
    pub resources: Dictionary,
    pub resources_stack: Vec<Dictionary>,
    pub page_number: usize,
    pub bus: &'a mut EventBus<'b>,
    font_cache: HashMap<String, Arc<Font>>,
    // current path, as bare points per subpath; enough for clip bounds
    pub subpaths: Vec<Vec<(f32, f32)>>,
    pub current_subpath: Vec<(f32, f32)>,
    pub pending_clip: bool,
}

impl<'a, 'b> Canvas<'a, 'b> {
    pub fn new(resources: Dictionary, page_number: usize, bus: &'a mut EventBus<'b>) -> Self {
        Canvas {
            graphics_state: GraphicsState::default(),
            state_stack: Vec::new(),
            marked_content_stack: Vec::new(),
            compatibility_depth: 0,
            resources,
            resources_stack: Vec::new(),
            page_number,
            bus,
            font_cache: HashMap::new(),
            subpaths: Vec::new(),
            current_subpath: Vec::new(),
            pending_clip: false,
        }
    }

    pub fn in_compatibility_section(&self) -> bool {
        self.compatibility_depth > 0
    }

    /// Push a deep snapshot of the graphics state (`q`).
    pub fn save_graphics_state(&mut self) {
        self.state_stack.push(self.graphics_state.clone());
    }

    /// Pop the topmost snapshot (`Q`); an unbalanced pop is tolerated.
    pub fn restore_graphics_state(&mut self) {
        match self.state_stack.pop() {
            Some(state) => self.graphics_state = state,
            None => warn!("'Q' with empty graphics state stack"),
        }
    }

    /// A font from the current resource dictionary, hydrated once per name.
    pub fn font_resource(&mut self, name: &str) -> Option<Arc<Font>> {
        if let Some(font) = self.font_cache.get(name) {
            return Some(font.clone());
        }
        let dict = self
            .resources
            .get("Font")?
            .as_dict()?
            .get(name)?
            .as_dict()?;
        let font = match Font::from_dict(dict) {
            Ok(f) => Arc::new(f),
            Err(e) => {
                warn!("font resource {} unusable: {}", name, e);
                return None;
            }
        };
        self.font_cache.insert(name.to_string(), font.clone());
        Some(font)
    }

    /// An XObject stream from the current resource dictionary.
    pub fn xobject_resource(&self, name: &str) -> Option<Stream> {
        self.resources
            .get("XObject")?
            .as_dict()?
            .get(name)?
            .as_stream()
            .cloned()
    }

    /// An ExtGState dictionary from the current resource dictionary.
    pub fn ext_gstate_resource(&self, name: &str) -> Option<Dictionary> {
        self.resources
            .get("ExtGState")?
            .as_dict()?
            .get(name)?
            .as_dict()
            .cloned()
    }

    /// Swap in the resources of a form XObject for the duration of its body.
    pub fn push_resources(&mut self, resources: Dictionary) {
        self.resources_stack
            .push(std::mem::replace(&mut self.resources, resources));
        self.font_cache.clear();
    }

    pub fn pop_resources(&mut self) {
        if let Some(resources) = self.resources_stack.pop() {
            self.resources = resources;
            self.font_cache.clear();
        }
    }

    /// Broadcast an event, dropping boxes that are not finite.
    pub fn emit(&mut self, event: Event) {
        let bbox = match &event {
            Event::GlyphRender(g) => Some(g.bbox),
            Event::ImageRender(i) => Some(i.bbox),
            _ => None,
        };
        if let Some(bbox) = bbox {
            if !bbox.is_finite() {
                warn!("dropping rendering event with non-finite bounds");
                return;
            }
        }
        self.bus.broadcast(&event);
    }

    /// Show a string: emit one glyph event per character code and advance
    /// the text matrix by each glyph's displacement.
    pub fn show_text(&mut self, bytes: &[u8]) -> Result<(), PdfError> {
        let font = match self.graphics_state.font.clone() {
            Some(f) => f,
            None => {
                return Err(PdfError::Type {
                    expected: "font",
                    received: "null",
                })
            }
        };
        let font_name = if font.base_font.is_empty() {
            "unknown".to_string()
        } else {
            font.base_font.clone()
        };

        for &code in bytes {
            let font_size = self.graphics_state.font_size;
            let scaling = self.graphics_state.horizontal_scaling / 100.0;
            let character_spacing = self.graphics_state.character_spacing;
            let word_spacing = if code == 0x20 {
                self.graphics_state.word_spacing
            } else {
                0.0
            };

            // glyph metrics in text space (em units)
            let w0 = font.glyph_width(code as u32) / 1000.0;
            let ascent = font.ascent() / 1000.0;
            let descent = font.descent() / 1000.0;

            // text rendering matrix: parameters, then Tm, then CTM
            let trm = Matrix {
                a: font_size * scaling,
                b: 0.0,
                c: 0.0,
                d: font_size,
                e: 0.0,
                f: self.graphics_state.text_rise,
            }
            .mul(&self.graphics_state.text_matrix)
            .mul(&self.graphics_state.ctm);

            let corners = [
                trm.transform_point(0.0, descent),
                trm.transform_point(w0, descent),
                trm.transform_point(0.0, ascent),
                trm.transform_point(w0, ascent),
            ];
            let min_x = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
            let max_x = corners
                .iter()
                .map(|p| p.0)
                .fold(f32::NEG_INFINITY, f32::max);
            let min_y = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
            let max_y = corners
                .iter()
                .map(|p| p.1)
                .fold(f32::NEG_INFINITY, f32::max);

            let (bx0, by0) = trm.transform_point(0.0, 0.0);
            let (bx1, _) = trm.transform_point(w0, 0.0);

            let event = GlyphRenderEvent {
                text: font.unicode(code as u32).unwrap_or_default(),
                code: code as u32,
                font_name: font_name.clone(),
                font_size,
                bbox: Rect::from_corners(min_x, min_y, max_x, max_y),
                baseline: Rect::new(bx0.min(bx1), by0, (bx1 - bx0).abs(), 0.0),
            };
            self.emit(Event::GlyphRender(event));

            // glyph displacement along the baseline
            let displacement =
                ((w0 - character_spacing - word_spacing) * font_size + character_spacing) * scaling;
            self.graphics_state.text_matrix =
                Matrix::translate(displacement, 0.0).mul(&self.graphics_state.text_matrix);
        }
        Ok(())
    }

    /// The device-space bounds of the current path, used when a pending
    /// clip is applied by a painting operator.
    pub fn current_path_bounds(&self) -> Option<Rect> {
        let mut points = self
            .subpaths
            .iter()
            .flatten()
            .chain(self.current_subpath.iter());
        let first = points.next()?;
        let ctm = &self.graphics_state.ctm;
        let (mut min_x, mut min_y) = ctm.transform_point(first.0, first.1);
        let (mut max_x, mut max_y) = (min_x, min_y);
        for &(x, y) in points {
            let (dx, dy) = ctm.transform_point(x, y);
            min_x = min_x.min(dx);
            min_y = min_y.min(dy);
            max_x = max_x.max(dx);
            max_y = max_y.max(dy);
        }
        Some(Rect::from_corners(min_x, min_y, max_x, max_y))
    }

    /// End the current path: apply a pending clip, then discard it.
    pub fn finish_path(&mut self) {
        if self.pending_clip {
            if let Some(bounds) = self.current_path_bounds() {
                self.graphics_state.clipping_path = Some(Arc::new(vec![bounds]));
            }
            self.pending_clip = false;
        }
        self.subpaths.clear();
        self.current_subpath.clear();
    }
}

/// Interpret a whole page: BeginPage, the operator loop, EndPage.
pub fn interpret_page(
    page: &Dictionary,
    resources: Dictionary,
    content: &[u8],
    page_number: usize,
    bus: &mut EventBus,
) -> Result<(), PdfError> {
    bus.broadcast(&Event::BeginPage {
        page_number,
        page: page.clone(),
    });
    let mut canvas = Canvas::new(resources, page_number, bus);
    interpret_content(content, &mut canvas)?;
    bus.broadcast(&Event::EndPage { page_number });
    Ok(())
}

/// The operand/operator loop over one content buffer. Re-entered by the
/// `Do` operator for form XObjects.
pub fn interpret_content(content: &[u8], canvas: &mut Canvas) -> Result<(), PdfError> {
    let registry = operators::standard_registry();
    let mut parser = ObjectParser::new(content);
    let mut stack: SmallVec<[Object; 8]> = SmallVec::new();

    while let Some(item) = parser.read_content_item()? {
        match item {
            ContentItem::Operand(object) => stack.push(object),
            ContentItem::Operator { mnemonic, .. } => {
                registry.dispatch(&mnemonic, &mut stack, canvas)?;
                stack.clear();
            }
        }
    }
    Ok(())
}
