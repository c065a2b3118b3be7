use macroquad::color::Color;
use macroquad::math::UVec2;

use crate::layer::{Layer, MapObject, ObjectLayer, TileLayer};
use crate::properties::Properties;
use crate::tileset::TilesetRef;

/// A parsed map, ready to hand to a renderer.
///
/// Built once per parse and not mutated afterwards. Tile UUIDs index into the
/// [`TilesetRegistry`](crate::TilesetRegistry) the map was parsed against.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    /// Grid size in tiles.
    pub size: UVec2,
    /// Tile size in pixels.
    pub tile_size: UVec2,
    /// The `backgroundcolor` attribute; white when absent or malformed.
    pub background: Color,
    /// Tileset references in document order.
    pub tilesets: Vec<TilesetRef>,
    /// Custom map properties.
    pub properties: Properties,
    /// Tile and object layers in document order.
    pub layers: Vec<Layer>,
    /// Index into [`TileMap::tile_layers`] of the midground layer, 0 when none is named.
    pub midground_layer_index: usize,
}

impl TileMap {
    /// Tile layers in document order.
    pub fn tile_layers(&self) -> impl Iterator<Item = &TileLayer> {
        self.layers.iter().filter_map(Layer::as_tiles)
    }

    /// Object layers in document order.
    pub fn object_layers(&self) -> impl Iterator<Item = &ObjectLayer> {
        self.layers.iter().filter_map(Layer::as_objects)
    }

    /// Every object of every object layer.
    pub fn objects(&self) -> impl Iterator<Item = &MapObject> {
        self.object_layers().flat_map(|l| l.objects.iter())
    }

    /// First layer of either kind with this name.
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// The midground tile layer, `None` when the map has no tile layers.
    pub fn midground(&self) -> Option<&TileLayer> {
        self.tile_layers().nth(self.midground_layer_index)
    }

    /// Opacity oracle for field-of-view queries: a cell is opaque when the midground
    /// layer has a tile there. Maps without tile layers are fully open.
    pub fn occluder(&self) -> impl Fn(i32, i32) -> bool + '_ {
        let midground = self.midground();
        move |x, y| {
            let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
                return false;
            };
            midground
                .and_then(|l| l.get(x, y))
                .is_some_and(|t| !t.is_empty())
        }
    }
}
