use std::collections::BTreeMap;

use macroquad::math::UVec2;

use crate::properties::Properties;

mod registry;
mod resolver;

pub use registry::{TileInfo, TilesetRegistry};
pub use resolver::{check_tileset_order, resolve_tiles};

/// A tileset definition, created once per backing file.
///
/// Everything is fixed at parse time except the UUID array, which the registry fills
/// in exactly once when the tileset is registered.
#[derive(Debug, Clone, Default)]
pub struct Tileset {
    /// Tileset name; embedded tilesets are keyed by it.
    pub name: String,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// Image path relative to the tileset's own file.
    pub image: String,
    /// Image pixel size when the document records it.
    pub image_size: Option<UVec2>,
    /// The `tilecount` attribute.
    pub tile_count: Option<u32>,
    /// The `columns` attribute.
    pub columns: Option<u32>,
    /// Pixels between tiles.
    pub spacing: u32,
    /// Pixels around the tile grid.
    pub margin: u32,
    /// Custom tileset properties.
    pub properties: Properties,
    /// Per-tile properties keyed by local tile index.
    pub tile_properties: BTreeMap<u32, Properties>,
    uuids: Vec<u32>,
}

impl Tileset {
    /// An unregistered tileset with the given tile size.
    pub fn new(name: impl Into<String>, tile_width: u32, tile_height: u32) -> Self {
        Tileset {
            name: name.into(),
            tile_width,
            tile_height,
            ..Tileset::default()
        }
    }

    /// Registry UUIDs indexed by local tile index. Empty until registered.
    pub fn uuids(&self) -> &[u32] {
        &self.uuids
    }

    /// Whether the registry has assigned UUIDs.
    pub fn is_registered(&self) -> bool {
        !self.uuids.is_empty()
    }

    /// Properties of local tile `local`, if it has any.
    pub fn tile_properties(&self, local: u32) -> Option<&Properties> {
        self.tile_properties.get(&local)
    }
}

/// A tileset as referenced by one map document.
///
/// `path` is the registry key, so several maps can point at the same [`Tileset`] with
/// different `first_gid` offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetRef {
    /// Registry key of the tileset.
    pub path: String,
    /// First global tile ID the document assigns to it.
    pub first_gid: u32,
}

impl TilesetRef {
    /// A reference to the tileset registered under `path`.
    pub fn new(path: impl Into<String>, first_gid: u32) -> Self {
        TilesetRef {
            path: path.into(),
            first_gid,
        }
    }
}
