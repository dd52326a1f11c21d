//! Adobe font metrics: the ASCII text format that carries the measurements
//! of the Type 1 standard fonts. Parsed line by line and cached process-wide
//! under normalized names.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use log::warn;

use crate::font::{Font, FontDescriptor};

static FONT_CACHE: OnceLock<Mutex<HashMap<String, Arc<Font>>>> = OnceLock::new();

fn cache() -> &'static Mutex<HashMap<String, Arc<Font>>> {
    FONT_CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Cache key normalization: uppercase, alphabetics only. Idempotent, so
/// `"Helvetica-Bold"`, `"HELVETICABOLD"` and `"helvetica bold"` collide.
pub fn normalize_font_name(name: &str) -> String {
    name.chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase())
        .collect()
}

/// Parse AFM text and register the font under its normalized `FontName`.
pub fn register_afm(text: &str) -> Option<Arc<Font>> {
    let font = parse_afm(text)?;
    let key = normalize_font_name(&font.base_font);
    let font = Arc::new(font);
    cache().lock().ok()?.insert(key, font.clone());
    Some(font)
}

/// Register every `*.afm` file in a directory. Returns how many loaded.
pub fn load_directory(dir: &Path) -> std::io::Result<usize> {
    let mut loaded = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e.eq_ignore_ascii_case("afm")) != Some(true) {
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        if register_afm(&text).is_some() {
            loaded += 1;
        } else {
            warn!("skipping malformed font metrics file {}", path.display());
        }
    }
    Ok(loaded)
}

/// Look up registered metrics by font name (normalized before lookup).
pub fn lookup(name: &str) -> Option<Arc<Font>> {
    let key = normalize_font_name(name);
    cache().lock().ok()?.get(&key).cloned()
}

/// Parse an AFM file: `StartFontMetrics` … `EndFontMetrics`, with the
/// character metrics block between `StartCharMetrics` and `EndCharMetrics`.
///
/// Returns `None` when the framing is missing or no metrics block exists.
pub fn parse_afm(text: &str) -> Option<Font> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.starts_with("Comment"))
        .collect();
    let first = lines.first()?;
    let last = lines.iter().rev().find(|l| !l.trim().is_empty())?;
    if !first.starts_with("StartFontMetrics") || !last.starts_with("EndFontMetrics") {
        return None;
    }

    let font_name = find_string(&lines, "FontName")?;
    let descriptor = FontDescriptor {
        font_name: font_name.clone(),
        font_family: find_string(&lines, "FamilyName"),
        ascent: find_f32(&lines, "Ascender"),
        descent: find_f32(&lines, "Descender"),
        cap_height: find_f32(&lines, "CapHeight"),
        x_height: find_f32(&lines, "XHeight"),
        stem_v: find_f32(&lines, "StemV"),
        stem_h: find_f32(&lines, "StemH"),
        avg_width: find_f32(&lines, "AvgWidth"),
        max_width: find_f32(&lines, "MaxWidth"),
        missing_width: find_f32(&lines, "MissingWidth"),
    };

    let start = lines.iter().position(|l| l.starts_with("StartCharMetrics"))?;
    let end = lines.iter().position(|l| l.starts_with("EndCharMetrics"))?;
    if end <= start {
        return None;
    }

    let mut glyphs: Vec<(i64, f32)> = Vec::new();
    for line in &lines[start + 1..end] {
        let fields: HashMap<&str, &str> = line
            .split(';')
            .map(str::trim)
            .filter_map(|field| field.split_once(' '))
            .map(|(k, v)| (k, v.trim()))
            .collect();

        // C gives a decimal code, CH a hex code, -1 means unassigned
        let mut code: i64 = -1;
        if let Some(c) = fields.get("C").and_then(|v| v.parse::<i64>().ok()) {
            code = c;
        }
        if let Some(ch) = fields.get("CH") {
            let inner = ch.trim_start_matches('<').trim_end_matches('>');
            if let Ok(c) = i64::from_str_radix(inner, 16) {
                code = c;
            }
        }
        let width = fields
            .get("WX")
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.0);
        glyphs.push((code, width));
    }

    let assigned: Vec<(i64, f32)> = glyphs.iter().copied().filter(|(c, _)| *c >= 0).collect();
    let first_char = assigned.iter().map(|(c, _)| *c).min().unwrap_or(0);
    let last_char = assigned.iter().map(|(c, _)| *c).max().unwrap_or(0);

    let mut widths = vec![0.0f32; (last_char - first_char + 1).max(0) as usize];
    for (code, width) in &assigned {
        widths[(code - first_char) as usize] = *width;
    }

    let mut descriptor = descriptor;
    if descriptor.avg_width.is_none() {
        let non_zero: Vec<f32> = assigned
            .iter()
            .map(|(_, w)| *w)
            .filter(|w| *w != 0.0)
            .collect();
        if !non_zero.is_empty() {
            let avg = non_zero.iter().sum::<f32>() / non_zero.len() as f32;
            descriptor.avg_width = Some((avg * 100.0).round() / 100.0);
        }
    }
    if descriptor.max_width.is_none() {
        descriptor.max_width = widths.iter().copied().fold(None, |acc: Option<f32>, w| {
            Some(acc.map_or(w, |a| a.max(w)))
        });
    }

    Some(Font {
        subtype: "Type1".to_string(),
        base_font: font_name,
        first_char: first_char as u32,
        last_char: last_char as u32,
        widths,
        descriptor: Some(descriptor),
        to_unicode: None,
    })
}

fn find_line<'a>(lines: &[&'a str], key: &str) -> Option<&'a str> {
    lines
        .iter()
        .find(|l| l.starts_with(key))
        .map(|l| l[key.len()..].trim_start_matches(|c| c == ' ' || c == '\t'))
}

fn find_string(lines: &[&str], key: &str) -> Option<String> {
    find_line(lines, key).map(|s| s.trim_end().to_string())
}

fn find_f32(lines: &[&str], key: &str) -> Option<f32> {
    find_line(lines, key)?.trim().parse::<f32>().ok()
}
