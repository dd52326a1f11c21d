//! Rendering events and the listener bus.
//!
//! The interpreter broadcasts an event per page boundary and per glyph;
//! structural consumers (line, paragraph and list builders) layer their own
//! groupings on top using the composite event kinds defined here.

use log::warn;
use serde_derive::{Deserialize, Serialize};

use crate::errors::PdfError;
use crate::object::Dictionary;
use crate::rectangle::Rect;

/// One rendered glyph: its text, position and the font that drew it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphRenderEvent {
    /// The Unicode rendering of the character code.
    pub text: String,
    /// The raw character code from the content stream.
    pub code: u32,
    pub font_name: String,
    pub font_size: f32,
    /// Device-space bounding box.
    pub bbox: Rect,
    /// Zero-height device-space segment along the baseline.
    pub baseline: Rect,
}

/// A run of glyphs sharing a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRenderEvent {
    pub glyphs: Vec<GlyphRenderEvent>,
    pub bbox: Rect,
}

impl LineRenderEvent {
    pub fn new(glyphs: Vec<GlyphRenderEvent>) -> Self {
        let bbox = glyphs
            .iter()
            .map(|g| g.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        LineRenderEvent { glyphs, bbox }
    }

    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.text.as_str()).collect()
    }
}

/// Consecutive lines forming a paragraph, ordered top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphRenderEvent {
    pub lines: Vec<LineRenderEvent>,
    pub bbox: Rect,
}

impl ParagraphRenderEvent {
    /// The paragraph box spans from the top of the first line to the bottom
    /// of the last, and from the leftmost to the rightmost line edge.
    pub fn new(lines: Vec<LineRenderEvent>) -> Self {
        let bbox = match (lines.first(), lines.last()) {
            (Some(first), Some(last)) => {
                let top = first.bbox.top();
                let bottom = last.bbox.bottom();
                let left = lines
                    .iter()
                    .map(|l| l.bbox.left())
                    .fold(f32::INFINITY, f32::min);
                let right = lines
                    .iter()
                    .map(|l| l.bbox.right())
                    .fold(f32::NEG_INFINITY, f32::max);
                Rect::new(left, bottom, right - left, top - bottom)
            }
            _ => Rect::default(),
        };
        ParagraphRenderEvent { lines, bbox }
    }

    pub fn text(&self) -> String {
        self.lines.iter().map(|l| l.text() + "\n").collect()
    }
}

/// A bulleted list of paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletListRenderEvent {
    pub paragraphs: Vec<ParagraphRenderEvent>,
}

impl BulletListRenderEvent {
    pub fn text(&self) -> String {
        self.paragraphs.iter().map(|p| p.text()).collect()
    }

    pub fn bbox(&self) -> Rect {
        self.paragraphs
            .iter()
            .map(|p| p.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }
}

/// A numbered list of paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedListRenderEvent {
    pub paragraphs: Vec<ParagraphRenderEvent>,
}

impl OrderedListRenderEvent {
    pub fn text(&self) -> String {
        self.paragraphs.iter().map(|p| p.text()).collect()
    }

    pub fn bbox(&self) -> Rect {
        self.paragraphs
            .iter()
            .map(|p| p.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }
}

/// An image XObject placed by `Do`; the box is the CTM-mapped unit square.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRenderEvent {
    pub name: String,
    pub bbox: Rect,
}

/// Everything a listener can observe, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BeginPage {
        page_number: usize,
        page: Dictionary,
    },
    EndPage {
        page_number: usize,
    },
    GlyphRender(GlyphRenderEvent),
    ImageRender(ImageRenderEvent),
    LineRender(LineRenderEvent),
    ParagraphRender(ParagraphRenderEvent),
    BulletListRender(BulletListRenderEvent),
    OrderedListRender(OrderedListRenderEvent),
}

/// The external collaborator contract: events are delivered synchronously,
/// on the parsing thread, in registration order.
pub trait EventListener {
    fn event_occurred(&mut self, event: &Event) -> Result<(), PdfError>;
}

/// Fans events out to the registered listeners. A failing listener is
/// logged and isolated; the bus and the other listeners are undisturbed.
pub struct EventBus<'a> {
    listeners: &'a mut [Box<dyn EventListener>],
}

impl<'a> EventBus<'a> {
    pub fn new(listeners: &'a mut [Box<dyn EventListener>]) -> Self {
        EventBus { listeners }
    }

    pub fn broadcast(&mut self, event: &Event) {
        for listener in self.listeners.iter_mut() {
            if let Err(e) = listener.event_occurred(event) {
                warn!("event listener failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(x: f32, y: f32, w: f32, h: f32, text: &str) -> GlyphRenderEvent {
        GlyphRenderEvent {
            text: text.to_string(),
            code: text.bytes().next().unwrap_or(0) as u32,
            font_name: "Helvetica".to_string(),
            font_size: 12.0,
            bbox: Rect::new(x, y, w, h),
            baseline: Rect::new(x, y, w, 0.0),
        }
    }

    #[test]
    fn test_line_bbox_is_union() {
        let line = LineRenderEvent::new(vec![
            glyph(0.0, 0.0, 5.0, 10.0, "H"),
            glyph(5.0, 0.0, 3.0, 10.0, "i"),
        ]);
        assert_eq!(line.bbox, Rect::new(0.0, 0.0, 8.0, 10.0));
        assert_eq!(line.text(), "Hi");
    }

    #[test]
    fn test_paragraph_bbox_spans_first_to_last_line() {
        let top_line = LineRenderEvent::new(vec![glyph(10.0, 20.0, 30.0, 10.0, "a")]);
        let bottom_line = LineRenderEvent::new(vec![glyph(5.0, 5.0, 20.0, 10.0, "b")]);
        let paragraph = ParagraphRenderEvent::new(vec![top_line.clone(), bottom_line.clone()]);
        assert_eq!(paragraph.bbox.top(), top_line.bbox.top());
        assert_eq!(paragraph.bbox.bottom(), bottom_line.bbox.bottom());
        assert_eq!(paragraph.bbox.left(), 5.0);
        assert_eq!(paragraph.bbox.right(), 40.0);
        assert_eq!(paragraph.text(), "a\nb\n");
    }

    struct Failing;
    struct Counting(std::rc::Rc<std::cell::Cell<usize>>);

    impl EventListener for Failing {
        fn event_occurred(&mut self, _event: &Event) -> Result<(), PdfError> {
            Err(PdfError::Listener("always fails".to_string()))
        }
    }

    impl EventListener for Counting {
        fn event_occurred(&mut self, _event: &Event) -> Result<(), PdfError> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_failing_listener_is_isolated() {
        let seen = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut listeners: Vec<Box<dyn EventListener>> =
            vec![Box::new(Failing), Box::new(Counting(seen.clone()))];
        let mut bus = EventBus::new(&mut listeners);
        bus.broadcast(&Event::EndPage { page_number: 0 });
        bus.broadcast(&Event::EndPage { page_number: 0 });
        // the second listener saw both events despite the first failing
        assert_eq!(seen.get(), 2);
    }
}
