use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while decoding a tile layer payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The layer text is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The compressed stream is corrupt or truncated.
    #[error("failed to decompress tile data: {0}")]
    Decompress(#[source] io::Error),
    /// Decoded byte count does not match `width * height * 4`.
    #[error("tile data is {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Bytes required by the layer dimensions.
        expected: usize,
        /// Bytes actually produced.
        actual: usize,
    },
    /// Decoded byte count is not a multiple of four.
    #[error("tile data length {len} is not a multiple of 4")]
    Misaligned {
        /// Bytes actually produced.
        len: usize,
    },
    /// A CSV cell is not an unsigned 32-bit integer.
    #[error("invalid csv tile value '{0}'")]
    InvalidCsv(String),
    /// Encoding/compression pair the decoder does not handle.
    #[error("unsupported tile data encoding '{encoding}' with compression '{compression}'")]
    UnsupportedEncoding {
        /// Value of the `encoding` attribute.
        encoding: String,
        /// Value of the `compression` attribute, empty when absent.
        compression: String,
    },
}

/// Error type for the map loader.
///
/// Everything here is fatal for the document being parsed. Recoverable data anomalies
/// (bad colors, duplicate tilesets, out-of-range GIDs) are logged instead.
#[derive(Debug, Error)]
pub enum MapError {
    /// File I/O error.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The document is not well-formed XML.
    #[error("malformed XML in {path}: {source}")]
    Xml {
        /// Document path as given by the caller.
        path: String,
        /// Parser error with position.
        #[source]
        source: roxmltree::Error,
    },
    /// The root element is not the one expected.
    #[error("{path}: expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        /// Document path as given by the caller.
        path: String,
        /// Expected tag.
        expected: &'static str,
        /// Actual tag.
        found: String,
    },
    /// A required attribute is missing.
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Element tag.
        element: String,
        /// Attribute name.
        attribute: &'static str,
    },
    /// A required attribute could not be parsed.
    #[error("<{element}> attribute '{attribute}' has invalid value '{value}'")]
    InvalidAttribute {
        /// Element tag.
        element: String,
        /// Attribute name.
        attribute: &'static str,
        /// Raw attribute text.
        value: String,
    },
    /// A required child element is missing.
    #[error("<{element}> is missing required child <{child}>")]
    MissingElement {
        /// Parent tag.
        element: String,
        /// Child tag.
        child: &'static str,
    },
    /// A tile layer payload failed to decode.
    #[error("layer '{layer}': {source}")]
    Decode {
        /// Layer name.
        layer: String,
        /// Decoder failure.
        #[source]
        source: DecodeError,
    },
    /// Tileset references are not in ascending firstgid order.
    #[error("tileset '{path}' has firstgid {first_gid}, not above previous firstgid {previous}")]
    TilesetOrder {
        /// Registry key of the offending tileset.
        path: String,
        /// Its firstgid.
        first_gid: u32,
        /// The firstgid of the reference before it.
        previous: u32,
    },
    /// The sprite loader could not produce sprites for a tileset image.
    #[error("failed to load sprites from {}: {message}", path.display())]
    Sprites {
        /// Image path.
        path: PathBuf,
        /// Loader message.
        message: String,
    },
    /// Loader options could not be read.
    #[error("invalid loader options: {0}")]
    Config(#[from] serde_json::Error),
}

impl MapError {
    pub(crate) fn missing_attribute(element: &str, attribute: &'static str) -> Self {
        MapError::MissingAttribute {
            element: element.to_owned(),
            attribute,
        }
    }

    pub(crate) fn invalid_attribute(element: &str, attribute: &'static str, value: &str) -> Self {
        MapError::InvalidAttribute {
            element: element.to_owned(),
            attribute,
            value: value.to_owned(),
        }
    }
}
