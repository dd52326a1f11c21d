//! Shared helpers for the in-crate test suite.

use crate::errors::PdfError;
use crate::events::{Event, EventListener};

/// Assembles a classical-xref PDF from numbered object bodies.
///
/// Objects are written in order starting at object number 1; the trailer
/// points `Root` at object 1.
pub fn build_pdf(objects: &[&[u8]]) -> Vec<u8> {
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
            "trailer<</Size {} /Root 1 0 R>>\nstartxref\n{}\n%%EOF",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    bytes
}

/// Records every event it observes, for asserting emission order.
#[derive(Default)]
pub struct RecordingListener {
    events: std::rc::Rc<std::cell::RefCell<Vec<Event>>>,
}

impl RecordingListener {
    pub fn new() -> (Self, std::rc::Rc<std::cell::RefCell<Vec<Event>>>) {
        let events = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        (
            RecordingListener {
                events: events.clone(),
            },
            events,
        )
    }
}

impl EventListener for RecordingListener {
    fn event_occurred(&mut self, event: &Event) -> Result<(), PdfError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}
