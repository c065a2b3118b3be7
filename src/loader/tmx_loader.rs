//! TMX map parsing: map attributes, tilesets, tile layers and object groups.

use std::path::{Path, PathBuf};

use macroquad::color::{Color, WHITE};
use macroquad::math::{uvec2, Rect};
use roxmltree::{Document, Node};
use tracing::{debug, error, info, warn};

use super::attrs::{self, optional, required};
use super::tile_data::{decode_layer_data, DataEncoding};
use super::tsx_loader::{load_tileset_file, parse_tileset_node};
use crate::config::LoadOptions;
use crate::error::MapError;
use crate::layer::{Layer, LayerInfo, MapObject, ObjectLayer, TileLayer};
use crate::properties::Properties;
use crate::sprite::SpriteLoader;
use crate::tile_map::TileMap;
use crate::tileset::{check_tileset_order, resolve_tiles, TilesetRef, TilesetRegistry};

/// Reads and parses a `.tmx` file. External tilesets resolve relative to its directory.
pub fn load_map_file<L: SpriteLoader>(
    path: impl AsRef<Path>,
    registry: &mut TilesetRegistry<L::Sprite>,
    sprites: &mut L,
    options: &LoadOptions,
) -> Result<TileMap, MapError> {
    let p = path.as_ref();
    let txt = std::fs::read_to_string(p).map_err(|source| MapError::Io {
        path: p.to_path_buf(),
        source,
    })?;
    parse_map_document(&txt, &p.to_string_lossy(), registry, sprites, options)
}

/// Parses one TMX document into a [`TileMap`].
///
/// `doc_path` locates external tilesets (relative to its directory) and keys embedded
/// ones. Tilesets are registered into `registry` as they are met, and each tile layer
/// resolves against the tilesets seen before it.
pub fn parse_map_document<L: SpriteLoader>(
    text: &str,
    doc_path: &str,
    registry: &mut TilesetRegistry<L::Sprite>,
    sprites: &mut L,
    options: &LoadOptions,
) -> Result<TileMap, MapError> {
    let doc = Document::parse(text).map_err(|source| MapError::Xml {
        path: doc_path.to_owned(),
        source,
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "map" {
        return Err(MapError::UnexpectedRoot {
            path: doc_path.to_owned(),
            expected: "map",
            found: root.tag_name().name().to_owned(),
        });
    }

    let size = uvec2(required(root, "width")?, required(root, "height")?);
    let tile_size = uvec2(required(root, "tilewidth")?, required(root, "tileheight")?);
    let background = background_color(root.attribute("backgroundcolor"));

    let map_dir = Path::new(doc_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut tilesets: Vec<TilesetRef> = Vec::new();
    let mut layers = Vec::new();
    let mut properties = Properties::new();
    let mut midground = None;
    let mut tile_layer_count = 0usize;

    for node in attrs::elements(root) {
        match node.tag_name().name() {
            "properties" => properties = attrs::properties(root),
            "tileset" => {
                let tileset_ref =
                    tileset_reference(node, doc_path, &map_dir, registry, sprites, options)?;
                push_tileset_ref(&mut tilesets, tileset_ref, options)?;
            }
            "layer" => {
                let layer = tile_layer(node, size.x, size.y, &tilesets, registry)?;
                if midground.is_none() && layer.info.name == options.midground_layer {
                    midground = Some(tile_layer_count);
                }
                tile_layer_count += 1;
                layers.push(Layer::Tiles(layer));
            }
            "objectgroup" => layers.push(Layer::Objects(object_layer(node))),
            other => debug!(element = other, "skipping unsupported map element"),
        }
    }

    info!(
        path = doc_path,
        width = size.x,
        height = size.y,
        tilesets = tilesets.len(),
        layers = layers.len(),
        "loaded map"
    );

    Ok(TileMap {
        size,
        tile_size,
        background,
        tilesets,
        properties,
        layers,
        midground_layer_index: midground.unwrap_or(0),
    })
}

fn tileset_reference<L: SpriteLoader>(
    node: Node<'_, '_>,
    doc_path: &str,
    map_dir: &Path,
    registry: &mut TilesetRegistry<L::Sprite>,
    sprites: &mut L,
    options: &LoadOptions,
) -> Result<TilesetRef, MapError> {
    let first_gid: u32 = required(node, "firstgid")?;

    let key = match node.attribute("source") {
        Some(source) => {
            let key = absolute_key(&map_dir.join(source))?;
            if registry.contains(&key) {
                debug!(path = %key, "reusing registered tileset");
            } else {
                let tileset = load_tileset_file(Path::new(&key))?;
                registry.register(tileset, &key, sprites)?;
            }
            key
        }
        None => {
            let tileset = parse_tileset_node(node)?;
            let key = format!("{doc_path}.{}{}", tileset.name, options.embedded_suffix);
            if registry.contains(&key) {
                debug!(path = %key, "reusing registered embedded tileset");
            } else {
                registry.register(tileset, &key, sprites)?;
            }
            key
        }
    };

    Ok(TilesetRef::new(key, first_gid))
}

fn absolute_key(path: &Path) -> Result<String, MapError> {
    let abs: PathBuf = std::path::absolute(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(abs.to_string_lossy().into_owned())
}

/// Appends a reference, enforcing (or warning about) ascending `firstgid` order.
fn push_tileset_ref(
    tilesets: &mut Vec<TilesetRef>,
    next: TilesetRef,
    options: &LoadOptions,
) -> Result<(), MapError> {
    tilesets.push(next);
    if let Err(err) = check_tileset_order(&tilesets[tilesets.len().saturating_sub(2)..]) {
        if options.strict_tileset_order {
            return Err(err);
        }
        warn!(%err, "tilesets out of firstgid order, gid attribution may be wrong");
    }
    Ok(())
}

fn tile_layer<S>(
    node: Node<'_, '_>,
    width: u32,
    height: u32,
    tilesets: &[TilesetRef],
    registry: &TilesetRegistry<S>,
) -> Result<TileLayer, MapError> {
    let info = layer_info(node);
    let data = attrs::child(node, "data").ok_or_else(|| MapError::MissingElement {
        element: format!("layer '{}'", info.name),
        child: "data",
    })?;

    let decode_err = |source| MapError::Decode {
        layer: info.name.clone(),
        source,
    };
    let encoding = DataEncoding::from_attributes(
        data.attribute("encoding"),
        data.attribute("compression"),
    )
    .map_err(decode_err)?;
    let raw = decode_layer_data(data.text().unwrap_or_default(), encoding, width, height)
        .map_err(decode_err)?;

    let tiles = resolve_tiles(&raw, width, height, tilesets, registry);
    Ok(TileLayer {
        info,
        width,
        height,
        tiles,
    })
}

fn object_layer(node: Node<'_, '_>) -> ObjectLayer {
    ObjectLayer {
        info: layer_info(node),
        objects: attrs::elements(node)
            .filter(|n| n.tag_name().name() == "object")
            .map(map_object)
            .collect(),
    }
}

fn map_object(node: Node<'_, '_>) -> MapObject {
    let class = attrs::string(node, "class");
    let kind = if !class.is_empty() {
        class
    } else {
        attrs::string(node, "type")
    };
    let coord = |name| optional::<f32>(node, name).unwrap_or(0.0);

    MapObject {
        id: optional(node, "id").unwrap_or(0),
        name: attrs::string(node, "name"),
        kind,
        bounds: Rect::new(coord("x"), coord("y"), coord("width"), coord("height")),
        visible: attrs::visible(node),
        properties: attrs::properties(node),
    }
}

fn layer_info(node: Node<'_, '_>) -> LayerInfo {
    LayerInfo {
        name: attrs::string(node, "name"),
        opacity: optional::<f32>(node, "opacity")
            .unwrap_or(1.0)
            .clamp(0.0, 1.0),
        visible: attrs::visible(node),
        properties: attrs::properties(node),
    }
}

/// `#RRGGBB` or `#AARRGGBB`; absent or malformed gives white.
fn background_color(raw: Option<&str>) -> Color {
    let Some(raw) = raw else {
        return WHITE;
    };
    match parse_hex_color(raw) {
        Some(color) => color,
        None => {
            error!(value = raw, "malformed map background color, using white");
            WHITE
        }
    }
}

fn parse_hex_color(raw: &str) -> Option<Color> {
    let hex = raw.trim().strip_prefix('#').unwrap_or(raw.trim());
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color::from_rgba(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Color::from_rgba(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tile_data::encode_tile_data;
    use crate::spatial::{TileId, FLIP_H};
    use crate::tileset::Tileset;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mq_tmx_loader_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    /// One sprite per local tile index, sprite value = local index.
    fn grid_sprites(ts: &Tileset, _: &Path) -> Result<Vec<u32>, MapError> {
        let count = ts.tile_count.unwrap_or(4);
        Ok((0..count).collect())
    }

    fn parse(text: &str) -> Result<(TileMap, TilesetRegistry<u32>), MapError> {
        let mut reg = TilesetRegistry::new();
        let map = parse_map_document(
            text,
            "/levels/test.tmx",
            &mut reg,
            &mut grid_sprites,
            &LoadOptions::default(),
        )?;
        Ok((map, reg))
    }

    fn embedded_map(layers: &str) -> String {
        format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="2" height="2" tilewidth="16" tileheight="16" backgroundcolor="#336699">
  <properties>
    <property name="theme" value="forest"/>
  </properties>
  <tileset firstgid="1" name="terrain" tilewidth="16" tileheight="16" tilecount="2" columns="2">
    <image source="terrain.png" width="32" height="16"/>
  </tileset>
  {layers}
</map>"##
        )
    }

    fn layer(name: &str, tiles: &[u32]) -> String {
        format!(
            r#"<layer id="1" name="{name}" width="2" height="2">
    <data encoding="base64" compression="zlib">
      {}
    </data>
  </layer>"#,
            encode_tile_data(tiles)
        )
    }

    #[test]
    fn parses_embedded_tileset_and_flips_rows() {
        let (map, reg) = parse(&embedded_map(&layer("Ground", &[1, 2, 0, 1]))).expect("parse");

        assert_eq!(map.size, uvec2(2, 2));
        assert_eq!(map.tile_size, uvec2(16, 16));
        assert_eq!(map.properties.get("theme"), Some("forest"));
        assert_eq!(map.background, Color::from_rgba(0x33, 0x66, 0x99, 255));
        assert_eq!(
            map.tilesets,
            vec![TilesetRef::new("/levels/test.tmx.terrain.embedded", 1)]
        );

        let ts = reg
            .get_by_path("/levels/test.tmx.terrain.embedded")
            .expect("registered");
        assert_eq!(ts.uuids(), &[1, 2]);

        let ground = map.tile_layers().next().expect("tile layer");
        // Storage rows [1,2] / [0,1] become bottom-up rows [0,1] / [1,2].
        assert_eq!(
            ground.tiles,
            vec![TileId(0), TileId(1), TileId(1), TileId(2)]
        );
        assert_eq!(map.midground_layer_index, 0);
    }

    #[test]
    fn reparsing_reuses_embedded_tileset() {
        let text = embedded_map(&layer("Ground", &[1, 2, 0, 1]));
        let opts = LoadOptions::default();
        let mut reg = TilesetRegistry::new();
        let mut calls = 0;
        let mut counting = |ts: &Tileset, path: &Path| {
            calls += 1;
            grid_sprites(ts, path)
        };

        let first = parse_map_document(&text, "/levels/test.tmx", &mut reg, &mut counting, &opts)
            .expect("first");
        let counter = reg.next_uuid();
        let second = parse_map_document(&text, "/levels/test.tmx", &mut reg, &mut counting, &opts)
            .expect("second");

        assert_eq!(calls, 1);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.next_uuid(), counter);
        assert_eq!(first.layers, second.layers);
    }

    #[test]
    fn picks_first_layer_named_midground() {
        let layers = [
            layer("Background", &[1, 1, 1, 1]),
            r#"<objectgroup name="Spawns"/>"#.to_owned(),
            layer("Midground", &[2, 0, 0, 0]),
            layer("Midground", &[0, 0, 0, 2]),
        ]
        .join("\n");
        let (map, _) = parse(&embedded_map(&layers)).expect("parse");
        assert_eq!(map.layers.len(), 4);
        assert_eq!(map.midground_layer_index, 1);
        let mid = map.midground().expect("midground");
        assert_eq!(mid.get(0, 1), Some(TileId(2)));
    }

    #[test]
    fn keeps_flip_flags_through_resolution() {
        let (map, _) = parse(&embedded_map(&layer("L", &[2 | FLIP_H, 0, 0, 0]))).expect("parse");
        let tile = map.tile_layers().next().and_then(|l| l.get(0, 1)).expect("tile");
        assert_eq!(tile.uuid(), 2);
        assert!(tile.flipped_horizontal());
    }

    #[test]
    fn out_of_range_gid_is_empty_not_an_error() {
        let (map, _) = parse(&embedded_map(&layer("L", &[1, 7, 0, 0]))).expect("parse");
        let l = map.tile_layers().next().expect("layer");
        assert_eq!(l.get(0, 1), Some(TileId(1)));
        assert_eq!(l.get(1, 1), Some(TileId::EMPTY));
    }

    #[test]
    fn parses_objects_with_defaults() {
        let objects = r#"<objectgroup name="Things" opacity="0.5" visible="0">
    <properties><property name="enabled" value="true"/></properties>
    <object id="7" name="door" type="portal" x="16" y="32" width="16">
      <properties><property name="target" value="level2"/></properties>
    </object>
    <object id="8" name="chest" class="loot" type="ignored" x="4" y="5" visible="0"/>
  </objectgroup>"#;
        let (map, _) = parse(&embedded_map(objects)).expect("parse");
        let group = map.object_layers().next().expect("objects");
        assert_eq!(group.info.name, "Things");
        assert_eq!(group.info.opacity, 0.5);
        assert!(!group.info.visible);
        assert_eq!(group.info.properties.get_bool("enabled"), Some(true));

        let door = &group.objects[0];
        assert_eq!((door.id, door.name.as_str(), door.kind.as_str()), (7, "door", "portal"));
        assert_eq!(door.bounds, Rect::new(16.0, 32.0, 16.0, 0.0));
        assert!(door.visible);
        assert_eq!(door.properties.get("target"), Some("level2"));

        let chest = &group.objects[1];
        assert_eq!(chest.kind, "loot");
        assert!(!chest.visible);
        assert_eq!(chest.bounds, Rect::new(4.0, 5.0, 0.0, 0.0));
    }

    #[test]
    fn missing_map_size_is_fatal() {
        let err = parse(r#"<map width="2" tilewidth="16" tileheight="16"/>"#).expect_err("height");
        assert!(matches!(
            err,
            MapError::MissingAttribute { attribute: "height", .. }
        ));
    }

    #[test]
    fn corrupt_layer_payload_is_fatal() {
        let bad = r#"<layer name="Broken"><data encoding="base64" compression="zlib">eJz//w==</data></layer>"#;
        let err = parse(&embedded_map(bad)).expect_err("decode");
        assert!(matches!(err, MapError::Decode { layer, .. } if layer == "Broken"));
    }

    #[test]
    fn layer_without_data_is_fatal() {
        let err = parse(&embedded_map(r#"<layer name="Empty"/>"#)).expect_err("data");
        assert!(matches!(err, MapError::MissingElement { child: "data", .. }));
    }

    #[test]
    fn malformed_background_defaults_to_white() {
        assert_eq!(background_color(None), WHITE);
        assert_eq!(background_color(Some("#zz0000")), WHITE);
        assert_eq!(background_color(Some("#12345")), WHITE);
        assert_eq!(
            background_color(Some("#80ff0000")),
            Color::from_rgba(255, 0, 0, 0x80)
        );
    }

    #[test]
    fn external_tileset_is_loaded_once_and_reused() {
        let dir = temp_dir();
        fs::write(
            dir.join("terrain.tsx"),
            r#"<tileset name="terrain" tilewidth="16" tileheight="16" tilecount="3" columns="3">
  <image source="terrain.png" width="48" height="16"/>
</tileset>"#,
        )
        .expect("write tsx");

        let map_text = |first_gid: u32, data: &[u32]| {
            format!(
                r#"<map width="2" height="1" tilewidth="16" tileheight="16">
  <tileset firstgid="{first_gid}" source="terrain.tsx"/>
  <layer name="L"><data encoding="base64" compression="zlib">{}</data></layer>
</map>"#,
                encode_tile_data(data)
            )
        };
        fs::write(dir.join("a.tmx"), map_text(1, &[1, 3])).expect("write a");
        fs::write(dir.join("b.tmx"), map_text(10, &[10, 12])).expect("write b");

        let mut reg = TilesetRegistry::new();
        let opts = LoadOptions::default();
        let a = load_map_file(dir.join("a.tmx"), &mut reg, &mut grid_sprites, &opts).expect("a");
        let counter = reg.next_uuid();
        let b = load_map_file(dir.join("b.tmx"), &mut reg, &mut grid_sprites, &opts).expect("b");

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.next_uuid(), counter);
        assert_eq!(a.tilesets[0].path, b.tilesets[0].path);
        assert_eq!(a.tilesets[0].first_gid, 1);
        assert_eq!(b.tilesets[0].first_gid, 10);

        let a_tiles = &a.tile_layers().next().expect("a layer").tiles;
        let b_tiles = &b.tile_layers().next().expect("b layer").tiles;
        assert_eq!(a_tiles, b_tiles);
        assert_eq!(a_tiles, &vec![TileId(1), TileId(3)]);
    }

    #[test]
    fn missing_external_tileset_is_an_io_error() {
        let dir = temp_dir();
        let path = dir.join("map.tmx");
        fs::write(
            &path,
            r#"<map width="1" height="1" tilewidth="16" tileheight="16">
  <tileset firstgid="1" source="missing.tsx"/>
</map>"#,
        )
        .expect("write map");
        let mut reg = TilesetRegistry::new();
        let err = load_map_file(&path, &mut reg, &mut grid_sprites, &LoadOptions::default())
            .expect_err("missing tileset");
        assert!(matches!(err, MapError::Io { .. }));
    }

    #[test]
    fn out_of_order_tilesets_warn_or_fail() {
        let text = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
  <tileset firstgid="5" name="b" tilewidth="16" tileheight="16" tilecount="2"/>
  <tileset firstgid="1" name="a" tilewidth="16" tileheight="16" tilecount="2"/>
  <layer name="L"><data encoding="csv">6</data></layer>
</map>"#;

        let (map, _) = parse(text).expect("lenient");
        // Reverse scan finds "a" (firstgid 1) first, so gid 6 lands past its end.
        assert_eq!(map.tile_layers().next().and_then(|l| l.get(0, 0)), Some(TileId::EMPTY));

        let strict = LoadOptions {
            strict_tileset_order: true,
            ..LoadOptions::default()
        };
        let mut reg = TilesetRegistry::new();
        let err = parse_map_document(text, "/levels/test.tmx", &mut reg, &mut grid_sprites, &strict)
            .expect_err("strict");
        assert!(matches!(err, MapError::TilesetOrder { first_gid: 1, previous: 5, .. }));
    }

    #[test]
    fn wrong_root_is_rejected() {
        assert!(matches!(
            parse("<tileset/>"),
            Err(MapError::UnexpectedRoot { expected: "map", .. })
        ));
    }
}
