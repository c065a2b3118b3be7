//! Tile layer payload decoding.
//!
//! TMX stores a layer's grid as little-endian `u32` GIDs, row-major, top row first.
//! The canonical form is base64 text over a zlib stream; gzip, raw base64 and CSV are
//! accepted as well.

use std::io::{Read, Write};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression as ZlibLevel;

use crate::error::DecodeError;

/// Encoding/compression pair of a `<data>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEncoding {
    /// `encoding="base64" compression="zlib"`.
    Base64Zlib,
    /// `encoding="base64" compression="gzip"`.
    Base64Gzip,
    /// `encoding="base64"` without compression.
    Base64,
    /// `encoding="csv"`.
    Csv,
}

impl DataEncoding {
    /// Maps the raw attribute values. `compression` is `None` when the attribute is absent.
    pub fn from_attributes(
        encoding: Option<&str>,
        compression: Option<&str>,
    ) -> Result<Self, DecodeError> {
        match (encoding, compression) {
            (Some("base64"), Some("zlib")) => Ok(DataEncoding::Base64Zlib),
            (Some("base64"), Some("gzip")) => Ok(DataEncoding::Base64Gzip),
            (Some("base64"), None | Some("")) => Ok(DataEncoding::Base64),
            (Some("csv"), None | Some("")) => Ok(DataEncoding::Csv),
            (enc, comp) => Err(DecodeError::UnsupportedEncoding {
                encoding: enc.unwrap_or("xml").to_owned(),
                compression: comp.unwrap_or_default().to_owned(),
            }),
        }
    }
}

/// Decodes a base64 + zlib payload into `width * height` raw tile values.
///
/// The decompressed stream must be exactly `width * height * 4` bytes. On any error
/// nothing is returned; there is no partial grid.
pub fn decode_tile_data(encoded: &str, width: u32, height: u32) -> Result<Vec<u32>, DecodeError> {
    decode_layer_data(encoded, DataEncoding::Base64Zlib, width, height)
}

/// Decodes a `<data>` payload with an explicit encoding.
pub fn decode_layer_data(
    text: &str,
    encoding: DataEncoding,
    width: u32,
    height: u32,
) -> Result<Vec<u32>, DecodeError> {
    let count = width as usize * height as usize;
    let expected = count * 4;

    let bytes = match encoding {
        DataEncoding::Csv => return decode_csv(text, count),
        DataEncoding::Base64 => decode_base64(text)?,
        DataEncoding::Base64Zlib => {
            inflate(ZlibDecoder::new(decode_base64(text)?.as_slice()), expected)?
        }
        DataEncoding::Base64Gzip => {
            inflate(GzDecoder::new(decode_base64(text)?.as_slice()), expected)?
        }
    };

    if bytes.len() != expected {
        return Err(DecodeError::SizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() % 4 != 0 {
        return Err(DecodeError::Misaligned { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Encodes raw tile values as base64 over zlib, the inverse of [`decode_tile_data`].
pub fn encode_tile_data(tiles: &[u32]) -> String {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(tiles.len() * 4), ZlibLevel::default());
    let bytes: Vec<u8> = tiles.iter().flat_map(|t| t.to_le_bytes()).collect();
    // Writing into a Vec cannot fail.
    let compressed = encoder
        .write_all(&bytes)
        .and_then(|_| encoder.finish())
        .unwrap_or_default();
    BASE64_STANDARD.encode(compressed)
}

fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(BASE64_STANDARD.decode(compact)?)
}

/// Inflates at most one byte past `expected`, enough for the size check to fail.
fn inflate<R: Read>(decoder: R, expected: usize) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    decoder
        .take(expected as u64 + 1)
        .read_to_end(&mut out)
        .map_err(DecodeError::Decompress)?;
    Ok(out)
}

fn decode_csv(text: &str, count: usize) -> Result<Vec<u32>, DecodeError> {
    let tiles = text
        .split(',')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(|cell| {
            cell.parse::<u32>()
                .map_err(|_| DecodeError::InvalidCsv(cell.to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if tiles.len() != count {
        return Err(DecodeError::SizeMismatch {
            expected: count * 4,
            actual: tiles.len() * 4,
        });
    }
    Ok(tiles)
}
