//! The font model the interpreter consumes: character codes to advance
//! widths and Unicode.

use log::warn;

use crate::cmap::ToUnicodeCMap;
use crate::errors::PdfError;
use crate::filters::decoded_bytes;
use crate::object::{Dictionary, Object};

/// Standard built-in PDF fonts
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuiltinFont {
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
    CourierOblique,
    CourierBold,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl BuiltinFont {
    pub fn get_id(&self) -> &'static str {
        use self::BuiltinFont::*;
        match self {
            TimesRoman => "Times-Roman",
            TimesBold => "Times-Bold",
            TimesItalic => "Times-Italic",
            TimesBoldItalic => "Times-BoldItalic",
            Helvetica => "Helvetica",
            HelveticaBold => "Helvetica-Bold",
            HelveticaOblique => "Helvetica-Oblique",
            HelveticaBoldOblique => "Helvetica-BoldOblique",
            Courier => "Courier",
            CourierOblique => "Courier-Oblique",
            CourierBold => "Courier-Bold",
            CourierBoldOblique => "Courier-BoldOblique",
            Symbol => "Symbol",
            ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Match a base-font name against the standard 14, ignoring case,
    /// separators and subset prefixes (`ABCDEF+Helvetica`).
    pub fn from_name(name: &str) -> Option<BuiltinFont> {
        use self::BuiltinFont::*;
        let name = name.rsplit('+').next().unwrap_or(name);
        let key = crate::afm::normalize_font_name(name);
        match key.as_str() {
            "TIMESROMAN" | "TIMESNEWROMAN" => Some(TimesRoman),
            "TIMESBOLD" | "TIMESNEWROMANBOLD" => Some(TimesBold),
            "TIMESITALIC" | "TIMESNEWROMANITALIC" => Some(TimesItalic),
            "TIMESBOLDITALIC" | "TIMESNEWROMANBOLDITALIC" => Some(TimesBoldItalic),
            "HELVETICA" | "ARIAL" => Some(Helvetica),
            "HELVETICABOLD" | "ARIALBOLD" => Some(HelveticaBold),
            "HELVETICAOBLIQUE" | "ARIALITALIC" => Some(HelveticaOblique),
            "HELVETICABOLDOBLIQUE" | "ARIALBOLDITALIC" => Some(HelveticaBoldOblique),
            "COURIER" | "COURIERNEW" => Some(Courier),
            "COURIEROBLIQUE" => Some(CourierOblique),
            "COURIERBOLD" => Some(CourierBold),
            "COURIERBOLDOBLIQUE" => Some(CourierBoldOblique),
            "SYMBOL" => Some(Symbol),
            "ZAPFDINGBATS" => Some(ZapfDingbats),
            _ => None,
        }
    }
}

/// Descriptor-level metrics, from a `FontDescriptor` dictionary or an AFM
/// header. All values are in thousandths of an em.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontDescriptor {
    pub font_name: String,
    pub font_family: Option<String>,
    pub ascent: Option<f32>,
    pub descent: Option<f32>,
    pub cap_height: Option<f32>,
    pub x_height: Option<f32>,
    pub stem_v: Option<f32>,
    pub stem_h: Option<f32>,
    pub avg_width: Option<f32>,
    pub max_width: Option<f32>,
    pub missing_width: Option<f32>,
}

impl FontDescriptor {
    pub fn from_dict(dict: &Dictionary) -> FontDescriptor {
        let get = |key: &str| dict.get(key).and_then(Object::as_f64).map(|v| v as f32);
        FontDescriptor {
            font_name: dict
                .get_name("FontName")
                .map(|n| n.as_str().into_owned())
                .unwrap_or_default(),
            font_family: dict
                .get("FontFamily")
                .and_then(Object::as_string)
                .map(|s| s.as_str().into_owned()),
            ascent: get("Ascent"),
            descent: get("Descent"),
            cap_height: get("CapHeight"),
            x_height: get("XHeight"),
            stem_v: get("StemV"),
            stem_h: get("StemH"),
            avg_width: get("AvgWidth"),
            max_width: get("MaxWidth"),
            missing_width: get("MissingWidth"),
        }
    }
}

/// A font as the interpreter sees it: enough metrics to advance the text
/// matrix and recover Unicode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    pub subtype: String,
    pub base_font: String,
    pub first_char: u32,
    pub last_char: u32,
    /// Advance widths indexed by `code - first_char`, in thousandths.
    pub widths: Vec<f32>,
    pub descriptor: Option<FontDescriptor>,
    pub to_unicode: Option<ToUnicodeCMap>,
}

impl Font {
    /// Hydrate a font from a resolved `/Font` resource dictionary.
    ///
    /// Fonts without width arrays (the standard 14 may omit them) fall back
    /// to AFM metrics registered in the process-wide cache.
    pub fn from_dict(dict: &Dictionary) -> Result<Font, PdfError> {
        let base_font = dict
            .get_name("BaseFont")
            .map(|n| n.as_str().into_owned())
            .unwrap_or_default();

        let mut font = Font {
            subtype: dict
                .get_name("Subtype")
                .map(|n| n.as_str().into_owned())
                .unwrap_or_default(),
            base_font,
            first_char: dict.get_i64("FirstChar").unwrap_or(0).max(0) as u32,
            last_char: dict.get_i64("LastChar").unwrap_or(0).max(0) as u32,
            widths: dict
                .get("Widths")
                .and_then(Object::as_array)
                .map(|a| {
                    a.iter()
                        .map(|o| o.as_f64().unwrap_or(0.0) as f32)
                        .collect()
                })
                .unwrap_or_default(),
            descriptor: dict
                .get("FontDescriptor")
                .and_then(Object::as_dict)
                .map(FontDescriptor::from_dict),
            to_unicode: None,
        };

        if let Some(Object::Stream(stream)) = dict.get("ToUnicode") {
            let text = String::from_utf8_lossy(decoded_bytes(stream)).into_owned();
            match ToUnicodeCMap::parse(&text) {
                Ok(cmap) => font.to_unicode = Some(cmap),
                Err(e) => warn!("ignoring malformed ToUnicode CMap for {}: {}", font.base_font, e),
            }
        }

        // widthless standard fonts borrow their metrics from the AFM cache
        if font.widths.is_empty() {
            if let Some(metrics) = crate::afm::lookup(&font.base_font) {
                font.first_char = metrics.first_char;
                font.last_char = metrics.last_char;
                font.widths = metrics.widths.clone();
                if font.descriptor.is_none() {
                    font.descriptor = metrics.descriptor.clone();
                }
            }
        }
        Ok(font)
    }

    /// The advance width of a character code, in thousandths of an em.
    ///
    /// `MissingWidth` only stands in for codes with no entry at all; an
    /// entry that encodes an explicit zero advance stays zero.
    pub fn glyph_width(&self, code: u32) -> f32 {
        let missing = self
            .descriptor
            .as_ref()
            .and_then(|d| d.missing_width)
            .unwrap_or(0.0);
        if code < self.first_char || code > self.last_char {
            return missing;
        }
        self.widths
            .get((code - self.first_char) as usize)
            .copied()
            .unwrap_or(missing)
    }

    /// The Unicode rendering of a character code: the ToUnicode mapping when
    /// present, Latin-1 otherwise.
    pub fn unicode(&self, code: u32) -> Option<String> {
        if let Some(cmap) = &self.to_unicode {
            if let Some(text) = cmap.map(code) {
                return Some(text);
            }
        }
        char::from_u32(code).map(String::from)
    }

    /// Ascent in thousandths; a common default when the descriptor is silent.
    pub fn ascent(&self) -> f32 {
        self.descriptor
            .as_ref()
            .and_then(|d| d.ascent)
            .unwrap_or(800.0)
    }

    /// Descent in thousandths (negative below the baseline).
    pub fn descent(&self) -> f32 {
        self.descriptor
            .as_ref()
            .and_then(|d| d.descent)
            .unwrap_or(-200.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Name;

    #[test]
    fn test_builtin_font_names() {
        assert_eq!(
            BuiltinFont::from_name("Helvetica-Bold"),
            Some(BuiltinFont::HelveticaBold)
        );
        assert_eq!(
            BuiltinFont::from_name("ABCDEF+Helvetica"),
            Some(BuiltinFont::Helvetica)
        );
        assert_eq!(BuiltinFont::from_name("ComicSans"), None);
        assert_eq!(BuiltinFont::HelveticaBold.get_id(), "Helvetica-Bold");
    }

    #[test]
    fn test_glyph_width_lookup() {
        let font = Font {
            first_char: 65,
            last_char: 67,
            widths: vec![722.0, 0.0, 667.0],
            descriptor: Some(FontDescriptor {
                missing_width: Some(250.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(font.glyph_width(65), 722.0);
        assert_eq!(font.glyph_width(67), 667.0);
        // an explicit zero advance is not replaced by MissingWidth
        assert_eq!(font.glyph_width(66), 0.0);
        // out-of-range codes fall back to MissingWidth
        assert_eq!(font.glyph_width(90), 250.0);
    }

    #[test]
    fn test_from_dict() {
        let mut dict = Dictionary::new();
        dict.set("Subtype", Object::Name(Name::from("Type1")));
        dict.set("BaseFont", Object::Name(Name::from("Foo-Font")));
        dict.set("FirstChar", Object::Integer(32));
        dict.set("LastChar", Object::Integer(33));
        dict.set(
            "Widths",
            Object::Array(vec![Object::Integer(250), Object::Integer(333)]),
        );
        let font = Font::from_dict(&dict).unwrap();
        assert_eq!(font.base_font, "Foo-Font");
        assert_eq!(font.glyph_width(33), 333.0);
        assert_eq!(font.unicode(0x41).as_deref(), Some("A"));
    }
}
