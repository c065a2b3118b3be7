#![warn(missing_docs)]

//! Tiled TMX/TSX loader for Macroquad.
//!
//! Parses maps and tilesets into a renderer-ready [`TileMap`], assigns every sprite of
//! every tileset a session-wide UUID through a [`TilesetRegistry`], and answers
//! line-of-sight queries with a recursive shadow caster.

mod config;
mod error;
mod fov;
mod layer;
mod loader {
    pub mod attrs;
    pub mod tile_data;
    pub mod tmx_loader;
    pub mod tsx_loader;
}
mod map;
mod properties;
mod spatial;
mod sprite;
mod tile_map;
mod tileset;

pub use config::LoadOptions;
pub use error::{DecodeError, MapError};
pub use fov::{ShadowCaster, OCTANT_TRANSFORMS};
pub use layer::{Layer, LayerInfo, MapObject, ObjectLayer, TileLayer};
pub use loader::tile_data::{decode_layer_data, decode_tile_data, encode_tile_data, DataEncoding};
pub use loader::tmx_loader::{load_map_file, parse_map_document};
pub use loader::tsx_loader::{load_tileset_file, parse_tileset_document};
pub use map::Map;
pub use properties::Properties;
pub use spatial::{TileId, FLIP_D, FLIP_H, FLIP_MASK, FLIP_V, GID_MASK};
pub use sprite::{order_atlas_sprites, slice_atlas, AtlasSprite, AtlasSpriteLoader, SpriteLoader};
pub use tile_map::TileMap;
pub use tileset::{
    check_tileset_order, resolve_tiles, TileInfo, Tileset, TilesetRef, TilesetRegistry,
};
