//! Session-scoped tileset table and global UUID allocation.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, error, warn};

use super::Tileset;
use crate::error::MapError;
use crate::properties::Properties;
use crate::spatial::GID_MASK;
use crate::sprite::SpriteLoader;

/// One registered tile: its sprite, its UUID and the tile's properties.
#[derive(Debug, Clone)]
pub struct TileInfo<S> {
    /// `None` only for the reserved empty entry at UUID 0.
    pub sprite: Option<S>,
    /// The allocated UUID.
    pub uuid: u32,
    /// Properties of the tile.
    pub properties: Properties,
}

impl<S> TileInfo<S> {
    fn empty() -> Self {
        TileInfo {
            sprite: None,
            uuid: 0,
            properties: Properties::new(),
        }
    }
}

/// Tilesets keyed by file path, plus a flat tile table indexed by UUID.
///
/// UUIDs start at 1, grow monotonically and are never reused; entry 0 is the empty
/// tile and always present. A registry lives for one loading session and is handed by
/// `&mut` to every parse that needs it, which keeps mutation single-writer.
#[derive(Debug)]
pub struct TilesetRegistry<S> {
    tilesets: HashMap<String, Tileset>,
    tiles: Vec<TileInfo<S>>,
    next_uuid: u32,
}

impl<S> Default for TilesetRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TilesetRegistry<S> {
    /// An empty registry; the first UUID handed out is 1.
    pub fn new() -> Self {
        TilesetRegistry {
            tilesets: HashMap::new(),
            tiles: vec![TileInfo::empty()],
            next_uuid: 1,
        }
    }

    /// Exact lookup; no path normalization happens here.
    pub fn get_by_path(&self, path: &str) -> Option<&Tileset> {
        self.tilesets.get(path)
    }

    /// Whether a tileset is registered under `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.tilesets.contains_key(path)
    }

    /// Registers `tileset` under `path`, allocating one UUID per sprite.
    ///
    /// Returns `Ok(false)` without touching the registry when the name or path is empty,
    /// or when `path` is already registered (the existing entry wins). Sprite loader
    /// failures are returned as errors.
    pub fn register<L>(
        &mut self,
        mut tileset: Tileset,
        path: &str,
        loader: &mut L,
    ) -> Result<bool, MapError>
    where
        L: SpriteLoader<Sprite = S>,
    {
        if tileset.name.is_empty() || path.is_empty() {
            error!(name = %tileset.name, path, "cannot register tileset without a name and path");
            return Ok(false);
        }
        if self.tilesets.contains_key(path) {
            error!(name = %tileset.name, path, "tileset already registered, keeping the existing entry");
            return Ok(false);
        }

        let image_path = Path::new(path)
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&tileset.image);
        let sprites = loader.load_sprites(&tileset, &image_path)?;

        let available = GID_MASK - (self.next_uuid - 1);
        if sprites.len() as u64 > available as u64 {
            return Err(MapError::Sprites {
                path: image_path,
                message: format!(
                    "{} sprites exceed the {available} remaining tile UUIDs",
                    sprites.len()
                ),
            });
        }
        if sprites.is_empty() {
            warn!(name = %tileset.name, path, "tileset image produced no sprites");
        }

        let mut uuids = Vec::with_capacity(sprites.len());
        for (local, sprite) in sprites.into_iter().enumerate() {
            let uuid = self.next_uuid;
            self.next_uuid += 1;
            self.tiles.push(TileInfo {
                sprite: Some(sprite),
                uuid,
                properties: tileset
                    .tile_properties(local as u32)
                    .cloned()
                    .unwrap_or_default(),
            });
            uuids.push(uuid);
        }

        debug!(
            name = %tileset.name,
            path,
            first_uuid = uuids.first().copied().unwrap_or(0),
            count = uuids.len(),
            "registered tileset"
        );
        tileset.uuids = uuids;
        self.tilesets.insert(path.to_owned(), tileset);
        Ok(true)
    }

    /// Tile record for a resolved UUID (flag bits are ignored).
    pub fn tile_info(&self, uuid: u32) -> Option<&TileInfo<S>> {
        self.tiles.get((uuid & GID_MASK) as usize)
    }

    /// All tile records, indexed by UUID.
    pub fn tiles(&self) -> &[TileInfo<S>] {
        &self.tiles
    }

    /// Registered tilesets with their keys, in no particular order.
    pub fn tilesets(&self) -> impl Iterator<Item = (&str, &Tileset)> {
        self.tilesets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered tilesets.
    pub fn len(&self) -> usize {
        self.tilesets.len()
    }

    /// Whether no tileset has been registered.
    pub fn is_empty(&self) -> bool {
        self.tilesets.is_empty()
    }

    /// The UUID the next registered sprite will receive.
    pub fn next_uuid(&self) -> u32 {
        self.next_uuid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tileset(name: &str) -> Tileset {
        Tileset {
            name: name.into(),
            tile_width: 16,
            tile_height: 16,
            image: "tiles.png".into(),
            ..Tileset::default()
        }
    }

    fn sprites(count: usize) -> impl FnMut(&Tileset, &Path) -> Result<Vec<usize>, MapError> {
        move |_, _| Ok((0..count).collect())
    }

    #[test]
    fn empty_entry_is_reserved() {
        let reg: TilesetRegistry<usize> = TilesetRegistry::new();
        assert_eq!(reg.tiles().len(), 1);
        assert_eq!(reg.tile_info(0).map(|t| t.uuid), Some(0));
        assert!(reg.tile_info(0).is_some_and(|t| t.sprite.is_none()));
        assert_eq!(reg.next_uuid(), 1);
    }

    #[test]
    fn allocates_monotonic_uuids_across_tilesets() {
        let mut reg = TilesetRegistry::new();
        assert!(reg.register(tileset("a"), "/maps/a.tsx", &mut sprites(3)).expect("a"));
        assert!(reg.register(tileset("b"), "/maps/b.tsx", &mut sprites(2)).expect("b"));

        assert_eq!(reg.get_by_path("/maps/a.tsx").map(Tileset::uuids), Some(&[1, 2, 3][..]));
        assert_eq!(reg.get_by_path("/maps/b.tsx").map(Tileset::uuids), Some(&[4, 5][..]));
        assert_eq!(reg.next_uuid(), 6);
        for (i, info) in reg.tiles().iter().enumerate() {
            assert_eq!(info.uuid as usize, i);
        }
        assert_eq!(reg.tile_info(5).and_then(|t| t.sprite), Some(1));
    }

    #[test]
    fn duplicate_path_keeps_original_and_counter() {
        let mut reg = TilesetRegistry::new();
        reg.register(tileset("a"), "/maps/a.tsx", &mut sprites(3)).expect("first");
        let counter = reg.next_uuid();

        let registered = reg
            .register(tileset("other"), "/maps/a.tsx", &mut sprites(10))
            .expect("second");
        assert!(!registered);
        assert_eq!(reg.next_uuid(), counter);
        let kept = reg.get_by_path("/maps/a.tsx").expect("kept");
        assert_eq!(kept.name, "a");
        assert_eq!(kept.uuids(), &[1, 2, 3]);
        assert_eq!(reg.tiles().len(), 4);
    }

    #[test]
    fn skips_empty_name_or_path() {
        let mut reg = TilesetRegistry::new();
        assert!(!reg.register(tileset(""), "/maps/a.tsx", &mut sprites(2)).expect("name"));
        assert!(!reg.register(tileset("a"), "", &mut sprites(2)).expect("path"));
        assert!(reg.is_empty());
        assert_eq!(reg.next_uuid(), 1);
    }

    #[test]
    fn attaches_tile_properties_by_local_index() {
        let mut ts = tileset("a");
        ts.tile_properties
            .insert(1, [("solid", "true")].into_iter().collect());
        let mut reg = TilesetRegistry::new();
        reg.register(ts, "/maps/a.tsx", &mut sprites(2)).expect("register");

        assert_eq!(reg.tile_info(1).and_then(|t| t.properties.get_bool("solid")), None);
        assert_eq!(reg.tile_info(2).and_then(|t| t.properties.get_bool("solid")), Some(true));
    }

    #[test]
    fn image_path_is_relative_to_tileset_file() {
        let mut seen = Vec::new();
        let mut loader = |_: &Tileset, image: &Path| -> Result<Vec<u8>, MapError> {
            seen.push(image.to_path_buf());
            Ok(vec![0])
        };
        let mut reg = TilesetRegistry::new();
        reg.register(tileset("a"), "/maps/sets/a.tsx", &mut loader).expect("register");
        assert_eq!(seen, vec![PathBuf::from("/maps/sets/tiles.png")]);
    }

    #[test]
    fn loader_failure_leaves_registry_untouched() {
        let mut failing = |_: &Tileset, image: &Path| -> Result<Vec<u8>, MapError> {
            Err(MapError::Sprites {
                path: image.to_path_buf(),
                message: "boom".into(),
            })
        };
        let mut reg = TilesetRegistry::new();
        let err = reg
            .register(tileset("a"), "/maps/a.tsx", &mut failing)
            .expect_err("loader error");
        assert!(matches!(err, MapError::Sprites { .. }));
        assert!(reg.get_by_path("/maps/a.tsx").is_none());
        assert_eq!(reg.next_uuid(), 1);
    }
}
