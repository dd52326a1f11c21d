//! Info dictionary accessors of a parsed PDF document.

use time::{Date, Month, OffsetDateTime, Time, UtcOffset};

use crate::document::PdfDocument;
use crate::object::Object;

/// Read-only view over the document information dictionary and a few
/// catalog-level properties. Every accessor goes through
/// [`PdfDocument::get_path`] and yields `None` when any step of the path is
/// missing.
pub struct DocumentInfo<'a> {
    document: &'a PdfDocument,
}

impl<'a> DocumentInfo<'a> {
    pub fn new(document: &'a PdfDocument) -> Self {
        DocumentInfo { document }
    }

    fn info_string(&self, key: &str) -> Option<String> {
        match self.document.get_path(&["Trailer", "Info", key])? {
            Object::String(s) => Some(s.as_str().into_owned()),
            Object::Name(n) => Some(n.as_str().into_owned()),
            _ => None,
        }
    }

    /// (Optional; PDF 1.1) The document's title.
    pub fn title(&self) -> Option<String> {
        self.info_string("Title")
    }

    /// (Optional; PDF 1.1) The name of the person who created the document.
    pub fn author(&self) -> Option<String> {
        self.info_string("Author")
    }

    /// (Optional; PDF 1.1) The subject of the document.
    pub fn subject(&self) -> Option<String> {
        self.info_string("Subject")
    }

    /// (Optional; PDF 1.1) Keywords associated with the document.
    pub fn keywords(&self) -> Option<String> {
        self.info_string("Keywords")
    }

    /// (Optional) The product that created the original document.
    pub fn creator(&self) -> Option<String> {
        self.info_string("Creator")
    }

    /// (Optional) The product that converted the document to PDF.
    pub fn producer(&self) -> Option<String> {
        self.info_string("Producer")
    }

    /// The raw `CreationDate` string, e.g. `D:20170505150224+02'00'`.
    pub fn creation_date(&self) -> Option<String> {
        self.info_string("CreationDate")
    }

    /// The raw `ModDate` string.
    pub fn modification_date(&self) -> Option<String> {
        self.info_string("ModDate")
    }

    /// `CreationDate`, parsed.
    pub fn creation_date_parsed(&self) -> Option<OffsetDateTime> {
        parse_pdf_date(&self.creation_date()?).ok()
    }

    /// `ModDate`, parsed.
    pub fn modification_date_parsed(&self) -> Option<OffsetDateTime> {
        parse_pdf_date(&self.modification_date()?).ok()
    }

    /// (Optional; PDF 1.4) The document's natural language.
    pub fn language(&self) -> Option<String> {
        match self.document.get_path(&["Trailer", "Root", "Lang"])? {
            Object::String(s) => Some(s.as_str().into_owned()),
            _ => None,
        }
    }

    /// The two file identifiers from the trailer `ID` entry.
    pub fn ids(&self) -> Option<Vec<Vec<u8>>> {
        let arr = self.document.get_path(&["Trailer", "ID"])?.as_array()?;
        Some(
            arr.iter()
                .filter_map(|o| o.as_string().map(|s| s.bytes.clone()))
                .collect(),
        )
    }

    pub fn number_of_pages(&self) -> usize {
        self.document.number_of_pages()
    }

    pub fn file_size(&self) -> usize {
        self.document.file_size
    }
}

impl PdfDocument {
    /// The information view of this document.
    pub fn info(&self) -> DocumentInfo<'_> {
        DocumentInfo::new(self)
    }
}

/// A simple parser for PDF date strings (e.g. "D:20170505150224+02'00'").
/// The timezone suffix is tolerated but not applied.
pub fn parse_pdf_date(s: &str) -> Result<OffsetDateTime, String> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    if s.len() < 14 {
        return Err("date string too short".to_string());
    }
    let year: i32 = s[0..4].parse::<i32>().map_err(|e| e.to_string())?;
    let month: u8 = s[4..6].parse::<u8>().map_err(|e| e.to_string())?;
    let day: u8 = s[6..8].parse::<u8>().map_err(|e| e.to_string())?;
    let hour: u8 = s[8..10].parse::<u8>().map_err(|e| e.to_string())?;
    let minute: u8 = s[10..12].parse::<u8>().map_err(|e| e.to_string())?;
    let second: u8 = s[12..14].parse::<u8>().map_err(|e| e.to_string())?;
    let month = Month::try_from(month).unwrap_or(Month::January);

    Ok(OffsetDateTime::new_in_offset(
        Date::from_calendar_date(year, month, day).map_err(|e| e.to_string())?,
        Time::from_hms(hour, minute, second).map_err(|e| e.to_string())?,
        UtcOffset::UTC,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pdf_date() {
        let dt = parse_pdf_date("D:20170505150224+02'00'").unwrap();
        assert_eq!(dt.year(), 2017);
        assert_eq!(dt.month(), Month::May);
        assert_eq!(dt.day(), 5);
        assert_eq!(dt.hour(), 15);
        assert!(parse_pdf_date("D:2017").is_err());
    }
}
