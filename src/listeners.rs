//! Ready-made event listeners for the common extraction tasks.

use std::collections::BTreeMap;

use crate::errors::PdfError;
use crate::events::{Event, EventListener};
use crate::object::{Dictionary, Object};

/// Records, per page, the fonts named in the page resources.
#[derive(Debug, Default)]
pub struct FontExtraction {
    fonts_per_page: BTreeMap<usize, Vec<Dictionary>>,
}

impl FontExtraction {
    pub fn new() -> Self {
        FontExtraction::default()
    }

    fn begin_page(&mut self, page_number: usize, page: &Dictionary) {
        let fonts = self.fonts_per_page.entry(page_number).or_default();
        let font_dict = page
            .get("Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get("Font"))
            .and_then(Object::as_dict);
        if let Some(font_dict) = font_dict {
            for (_, font) in font_dict.iter() {
                if let Some(d) = font.as_dict() {
                    fonts.push(d.clone());
                }
            }
        }
    }

    pub fn fonts_on_page(&self, page_number: usize) -> &[Dictionary] {
        self.fonts_per_page
            .get(&page_number)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn font_names_on_page(&self, page_number: usize) -> Vec<String> {
        self.fonts_on_page(page_number)
            .iter()
            .filter_map(|d| d.get_name("BaseFont"))
            .map(|n| n.as_str().into_owned())
            .collect()
    }
}

impl EventListener for FontExtraction {
    fn event_occurred(&mut self, event: &Event) -> Result<(), PdfError> {
        if let Event::BeginPage { page_number, page } = event {
            self.begin_page(*page_number, page);
        }
        Ok(())
    }
}

/// Concatenates glyph renderings into plain text, one buffer per page.
#[derive(Debug, Default)]
pub struct TextExtraction {
    text_per_page: BTreeMap<usize, String>,
    current_page: usize,
}

impl TextExtraction {
    pub fn new() -> Self {
        TextExtraction::default()
    }

    pub fn text_on_page(&self, page_number: usize) -> &str {
        self.text_per_page
            .get(&page_number)
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl EventListener for TextExtraction {
    fn event_occurred(&mut self, event: &Event) -> Result<(), PdfError> {
        match event {
            Event::BeginPage { page_number, .. } => {
                self.current_page = *page_number;
                self.text_per_page.entry(*page_number).or_default();
            }
            Event::GlyphRender(glyph) => {
                self.text_per_page
                    .entry(self.current_page)
                    .or_default()
                    .push_str(&glyph.text);
            }
            _ => {}
        }
        Ok(())
    }
}
