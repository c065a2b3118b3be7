use macroquad::math::Rect;

use crate::properties::Properties;
use crate::spatial::TileId;

/// Metadata shared by every layer kind.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    /// Layer name as written in the document.
    pub name: String,
    /// 0.0 to 1.0.
    pub opacity: f32,
    /// The `visible` attribute; defaults to true.
    pub visible: bool,
    /// Custom layer properties.
    pub properties: Properties,
}

impl Default for LayerInfo {
    fn default() -> Self {
        LayerInfo {
            name: String::new(),
            opacity: 1.0,
            visible: true,
            properties: Properties::new(),
        }
    }
}

/// A grid of resolved tiles.
///
/// Row-major, `width * height`, row 0 at the bottom of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Shared layer metadata.
    pub info: LayerInfo,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Resolved tiles, row-major with row 0 at the bottom.
    pub tiles: Vec<TileId>,
}

impl TileLayer {
    /// Tile at `(x, y)`, bottom-up rows. `None` outside the layer.
    pub fn get(&self, x: u32, y: u32) -> Option<TileId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Non-empty tiles with their grid coordinates.
    pub fn iter_tiles(&self) -> impl Iterator<Item = (u32, u32, TileId)> + '_ {
        let w = self.width.max(1) as usize;
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_empty())
            .map(move |(i, t)| ((i % w) as u32, (i / w) as u32, *t))
    }
}

/// One object of an object group.
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    /// Object id, 0 when absent.
    pub id: u32,
    /// Object name.
    pub name: String,
    /// The object's `class` (or legacy `type`).
    pub kind: String,
    /// Pixel bounds as written in the document.
    pub bounds: Rect,
    /// The `visible` attribute; defaults to true.
    pub visible: bool,
    /// Custom object properties.
    pub properties: Properties,
}

/// An `<objectgroup>` and its objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLayer {
    /// Shared layer metadata.
    pub info: LayerInfo,
    /// Objects in document order.
    pub objects: Vec<MapObject>,
}

/// A map layer; tile and object layers interleave in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// A `<layer>` of tiles.
    Tiles(TileLayer),
    /// An `<objectgroup>`.
    Objects(ObjectLayer),
}

impl Layer {
    /// Metadata of either layer kind.
    pub fn info(&self) -> &LayerInfo {
        match self {
            Layer::Tiles(l) => &l.info,
            Layer::Objects(l) => &l.info,
        }
    }

    /// Layer name.
    pub fn name(&self) -> &str {
        &self.info().name
    }

    /// The tile layer, if this is one.
    pub fn as_tiles(&self) -> Option<&TileLayer> {
        match self {
            Layer::Tiles(l) => Some(l),
            Layer::Objects(_) => None,
        }
    }

    /// The object layer, if this is one.
    pub fn as_objects(&self) -> Option<&ObjectLayer> {
        match self {
            Layer::Objects(l) => Some(l),
            Layer::Tiles(_) => None,
        }
    }
}
