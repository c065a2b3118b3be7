use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use macroquad::math::{ivec2, IVec2};

use crate::config::LoadOptions;
use crate::fov::ShadowCaster;
use crate::loader::tmx_loader::load_map_file;
use crate::sprite::{AtlasSprite, AtlasSpriteLoader};
use crate::tile_map::TileMap;
use crate::tileset::{TileInfo, TilesetRegistry};

/// A loaded map together with the registry its tile UUIDs point into.
pub struct Map {
    /// The parsed map.
    pub tile_map: TileMap,
    /// Tilesets and sprites the map's tile UUIDs point into.
    pub registry: TilesetRegistry<AtlasSprite>,
}

impl Map {
    /// Loads a `.tmx` file with default [`LoadOptions`].
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_with(path, &LoadOptions::default())
    }

    /// Loads a `.tmx` file with explicit options.
    pub fn load_with(path: impl AsRef<Path>, options: &LoadOptions) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.extension().and_then(|e| e.to_str()) != Some("tmx") {
            anyhow::bail!("Map file must be a TMX file: {}", path.display());
        }

        let mut registry = TilesetRegistry::new();
        let tile_map = load_map_file(path, &mut registry, &mut AtlasSpriteLoader, options)
            .with_context(|| format!("Loading map {}", path.display()))?;

        Ok(Self { tile_map, registry })
    }

    /// Loads another map into this map's registry, sharing already registered tilesets.
    pub fn load_sibling(
        &mut self,
        path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> anyhow::Result<TileMap> {
        let path = path.as_ref();
        load_map_file(path, &mut self.registry, &mut AtlasSpriteLoader, options)
            .with_context(|| format!("Loading map {}", path.display()))
    }

    /// Tile record under `(x, y)` of the `layer`-th tile layer, bottom-up rows.
    /// Empty cells return `None`.
    pub fn tile_info_at(&self, layer: usize, x: u32, y: u32) -> Option<&TileInfo<AtlasSprite>> {
        let tile = self.tile_map.tile_layers().nth(layer)?.get(x, y)?;
        if tile.is_empty() {
            return None;
        }
        self.registry.tile_info(tile.uuid())
    }

    /// Cells visible from `origin` within `radius`, walls of the midground layer blocking
    /// sight. The origin is included when it lies on the map.
    pub fn visible_from(&self, origin: IVec2, radius: u32) -> HashSet<IVec2> {
        let size = self.tile_map.size;
        let mut seen = HashSet::new();
        let on_map = origin.x >= 0
            && origin.y >= 0
            && (origin.x as u32) < size.x
            && (origin.y as u32) < size.y;
        if on_map {
            seen.insert(origin);
        }

        let opaque = self.tile_map.occluder();
        ShadowCaster::new(origin, radius, size).compute(opaque, |x, y| {
            seen.insert(ivec2(x, y));
        });
        seen
    }
}
