//! TSX tileset parsing, for external files and tilesets embedded in a map.

use std::path::Path;

use macroquad::math::uvec2;
use roxmltree::{Document, Node};
use tracing::warn;

use super::attrs::{self, optional, required};
use crate::error::MapError;
use crate::tileset::Tileset;

/// Reads and parses an external `.tsx` file.
pub fn load_tileset_file(path: &Path) -> Result<Tileset, MapError> {
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tileset_document(&txt, &path.to_string_lossy())
}

/// Parses a TSX document whose root is `<tileset>`. `path` is only used in errors.
pub fn parse_tileset_document(text: &str, path: &str) -> Result<Tileset, MapError> {
    let doc = Document::parse(text).map_err(|source| MapError::Xml {
        path: path.to_owned(),
        source,
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "tileset" {
        return Err(MapError::UnexpectedRoot {
            path: path.to_owned(),
            expected: "tileset",
            found: root.tag_name().name().to_owned(),
        });
    }
    parse_tileset_node(root)
}

/// Parses a `<tileset>` element, either a TSX root or an embedded map child.
pub fn parse_tileset_node(node: Node<'_, '_>) -> Result<Tileset, MapError> {
    let mut tileset = Tileset::new(
        attrs::string(node, "name"),
        required(node, "tilewidth")?,
        required(node, "tileheight")?,
    );
    tileset.tile_count = optional(node, "tilecount");
    tileset.columns = optional(node, "columns");
    tileset.spacing = optional(node, "spacing").unwrap_or(0);
    tileset.margin = optional(node, "margin").unwrap_or(0);
    tileset.properties = attrs::properties(node);

    if let Some(image) = attrs::child(node, "image") {
        tileset.image = attrs::string(image, "source");
        if let (Some(w), Some(h)) = (optional(image, "width"), optional(image, "height")) {
            tileset.image_size = Some(uvec2(w, h));
        }
    }

    for tile in attrs::elements(node).filter(|n| n.tag_name().name() == "tile") {
        let Some(id) = optional::<u32>(tile, "id") else {
            warn!(tileset = %tileset.name, "skipping <tile> without a valid id");
            continue;
        };
        let props = attrs::properties(tile);
        if !props.is_empty() {
            tileset.tile_properties.insert(id, props);
        }
    }

    Ok(tileset)
}
