//! Stream filter decoding: Flate, LZW, ASCII85, ASCIIHex, RunLength, plus
//! the PNG/TIFF predictor post-step.

use std::io::Read;

use crate::errors::PdfError;
use crate::object::{Dictionary, Object, Stream};

fn filter_error(filter: &str, message: impl Into<String>) -> PdfError {
    PdfError::FilterDecode {
        filter: filter.to_string(),
        message: message.into(),
    }
}

/// Decode a stream in place according to its `Filter` chain, caching the
/// result in [`Stream::decoded_bytes`].
///
/// Decoding is idempotent: a second call is a no-op. On failure the stream
/// is marked undecoded with an empty payload and the error is returned.
pub fn decode_stream(stream: &mut Stream) -> Result<(), PdfError> {
    if stream.decoded_bytes.is_some() {
        return Ok(());
    }
    match run_filter_chain(&stream.dict, &stream.data) {
        Ok(decoded) => {
            stream.decoded_bytes = Some(decoded);
            Ok(())
        }
        Err(e) => {
            stream.decoded_bytes = Some(Vec::new());
            Err(e)
        }
    }
}

/// The decoded payload of a stream, empty until [`decode_stream`] ran (or
/// when it failed).
pub fn decoded_bytes(stream: &Stream) -> &[u8] {
    stream.decoded_bytes.as_deref().unwrap_or(&[])
}

fn run_filter_chain(dict: &Dictionary, data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let filters: Vec<String> = match dict.get("Filter") {
        None | Some(Object::Null) => Vec::new(),
        Some(Object::Name(n)) => vec![n.as_str().into_owned()],
        Some(Object::Array(a)) => a
            .iter()
            .map(|o| {
                o.as_name()
                    .map(|n| n.as_str().into_owned())
                    .ok_or(PdfError::Type {
                        expected: "name",
                        received: o.type_name(),
                    })
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(PdfError::Type {
                expected: "name or array",
                received: other.type_name(),
            })
        }
    };

    let parms_entry = dict.get("DecodeParms").or_else(|| dict.get("DP"));
    let parms_at = |i: usize| -> Option<&Dictionary> {
        match parms_entry {
            Some(Object::Dictionary(d)) if i == 0 => Some(d),
            Some(Object::Array(a)) => a.get(i).and_then(Object::as_dict),
            _ => None,
        }
    };

    let mut bytes = data.to_vec();
    for (i, filter) in filters.iter().enumerate() {
        let parms = parms_at(i);
        bytes = match filter.as_str() {
            "FlateDecode" | "Fl" => apply_predictor(flate_decode(&bytes)?, parms)?,
            "LZWDecode" | "LZW" => apply_predictor(lzw_decode(&bytes, parms)?, parms)?,
            "ASCII85Decode" | "A85" => ascii85_decode(&bytes)?,
            "ASCIIHexDecode" | "AHx" => ascii_hex_decode(&bytes)?,
            "RunLengthDecode" | "RL" => run_length_decode(&bytes)?,
            other => {
                return Err(filter_error(other, "unsupported filter"));
            }
        };
    }
    Ok(bytes)
}

pub fn flate_decode(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| filter_error("FlateDecode", e.to_string()))?;
    Ok(out)
}

pub fn lzw_decode(data: &[u8], parms: Option<&Dictionary>) -> Result<Vec<u8>, PdfError> {
    let early_change = parms
        .and_then(|p| p.get_i64("EarlyChange"))
        .unwrap_or(1);
    let mut decoder = if early_change != 0 {
        weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
    } else {
        weezl::decode::Decoder::new(weezl::BitOrder::Msb, 8)
    };
    decoder
        .decode(data)
        .map_err(|e| filter_error("LZWDecode", e.to_string()))
}

pub fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut out = Vec::new();
    let mut group = [0u8; 5];
    let mut group_len = 0usize;

    // an optional <~ prefix is tolerated
    let mut input = data;
    if input.starts_with(b"<~") {
        input = &input[2..];
    }

    let mut iter = input.iter().copied();
    while let Some(b) = iter.next() {
        match b {
            b'~' => break,
            b if crate::lexer::is_whitespace(b) => continue,
            b'z' if group_len == 0 => out.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                group[group_len] = b - b'!';
                group_len += 1;
                if group_len == 5 {
                    let value = group.iter().fold(0u32, |acc, &d| {
                        acc.wrapping_mul(85).wrapping_add(d as u32)
                    });
                    out.extend_from_slice(&value.to_be_bytes());
                    group_len = 0;
                }
            }
            other => {
                return Err(filter_error(
                    "ASCII85Decode",
                    format!("invalid character 0x{:02X}", other),
                ))
            }
        }
    }

    if group_len == 1 {
        return Err(filter_error("ASCII85Decode", "truncated final group"));
    }
    if group_len >= 2 {
        // pad with 'u' and keep group_len - 1 bytes
        for slot in group.iter_mut().take(5).skip(group_len) {
            *slot = 84;
        }
        let value = group
            .iter()
            .fold(0u32, |acc, &d| acc.wrapping_mul(85).wrapping_add(d as u32));
        out.extend_from_slice(&value.to_be_bytes()[..group_len - 1]);
    }
    Ok(out)
}

pub fn ascii_hex_decode(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut nibbles = Vec::new();
    for &b in data {
        match b {
            b'>' => break,
            b if crate::lexer::is_whitespace(b) => continue,
            b'0'..=b'9' => nibbles.push(b - b'0'),
            b'a'..=b'f' => nibbles.push(b - b'a' + 10),
            b'A'..=b'F' => nibbles.push(b - b'A' + 10),
            other => {
                return Err(filter_error(
                    "ASCIIHexDecode",
                    format!("invalid hex digit 0x{:02X}", other),
                ))
            }
        }
    }
    if nibbles.len() % 2 == 1 {
        nibbles.push(0);
    }
    Ok(nibbles.chunks(2).map(|c| c[0] << 4 | c[1]).collect())
}

pub fn run_length_decode(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < data.len() {
        let length = data[i];
        i += 1;
        match length {
            0..=127 => {
                let count = length as usize + 1;
                if i + count > data.len() {
                    return Err(filter_error("RunLengthDecode", "truncated literal run"));
                }
                out.extend_from_slice(&data[i..i + count]);
                i += count;
            }
            128 => break, // EOD
            129..=255 => {
                let count = 257 - length as usize;
                let byte = *data
                    .get(i)
                    .ok_or_else(|| filter_error("RunLengthDecode", "truncated repeat run"))?;
                i += 1;
                out.extend(std::iter::repeat(byte).take(count));
            }
        }
    }
    Ok(out)
}

/// PNG predictors 10–14 and TIFF predictor 2, run after Flate/LZW when the
/// decode parameters request them.
fn apply_predictor(data: Vec<u8>, parms: Option<&Dictionary>) -> Result<Vec<u8>, PdfError> {
    let parms = match parms {
        Some(p) => p,
        None => return Ok(data),
    };
    let predictor = parms.get_i64("Predictor").unwrap_or(1);
    if predictor <= 1 {
        return Ok(data);
    }
    let colors = parms.get_i64("Colors").unwrap_or(1).max(1) as usize;
    let bpc = parms.get_i64("BitsPerComponent").unwrap_or(8).max(1) as usize;
    let columns = parms.get_i64("Columns").unwrap_or(1).max(1) as usize;
    let bpp = (colors * bpc + 7) / 8;
    let row_len = (columns * colors * bpc + 7) / 8;

    match predictor {
        2 => tiff_predictor(data, colors, bpc, row_len),
        10..=14 => png_predictor(data, bpp, row_len),
        other => Err(filter_error(
            "Predictor",
            format!("unsupported predictor {}", other),
        )),
    }
}

fn tiff_predictor(
    mut data: Vec<u8>,
    colors: usize,
    bpc: usize,
    row_len: usize,
) -> Result<Vec<u8>, PdfError> {
    if bpc != 8 {
        return Err(filter_error(
            "Predictor",
            format!("TIFF predictor with {} bits per component", bpc),
        ));
    }
    for row in data.chunks_mut(row_len) {
        for i in colors..row.len() {
            row[i] = row[i].wrapping_add(row[i - colors]);
        }
    }
    Ok(data)
}

fn png_predictor(data: Vec<u8>, bpp: usize, row_len: usize) -> Result<Vec<u8>, PdfError> {
    let stride = row_len + 1; // one filter-type byte per row
    if stride == 1 || data.len() % stride != 0 {
        return Err(filter_error("Predictor", "payload is not a whole number of rows"));
    }
    let rows = data.len() / stride;
    let mut out = vec![0u8; rows * row_len];
    let mut prev_row = vec![0u8; row_len];

    for r in 0..rows {
        let src = &data[r * stride..(r + 1) * stride];
        let filter_type = src[0];
        let row = &mut out[r * row_len..(r + 1) * row_len];
        row.copy_from_slice(&src[1..]);

        match filter_type {
            0 => {}
            1 => {
                for i in bpp..row_len {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            }
            2 => {
                for i in 0..row_len {
                    row[i] = row[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                    let up = prev_row[i] as u16;
                    row[i] = row[i].wrapping_add(((left + up) / 2) as u8);
                }
            }
            4 => {
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] as i16 } else { 0 };
                    let up = prev_row[i] as i16;
                    let up_left = if i >= bpp { prev_row[i - bpp] as i16 } else { 0 };
                    row[i] = row[i].wrapping_add(paeth(left, up, up_left));
                }
            }
            other => {
                return Err(filter_error(
                    "Predictor",
                    format!("unknown PNG filter type {}", other),
                ))
            }
        }
        prev_row.copy_from_slice(row);
    }
    Ok(out)
}

fn paeth(a: i16, b: i16, c: i16) -> u8 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}
