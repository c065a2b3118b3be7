//! Sprite loading collaborator.
//!
//! The registry asks a [`SpriteLoader`] for the ordered sprites behind a tileset image
//! and allocates one UUID per sprite. The loader decides what a sprite handle is; the
//! bundled [`AtlasSpriteLoader`] yields source rectangles into the atlas image.

use std::cmp::Reverse;
use std::path::Path;

use macroquad::math::{uvec2, Rect, UVec2};
use macroquad::texture::Image;
use tracing::warn;

use crate::error::MapError;
use crate::spatial::GID_MASK;
use crate::tileset::Tileset;

/// Produces the ordered sprite handles for one tileset image.
///
/// The returned order must match the tileset's local tile index order: sprite `i`
/// is local tile `i`.
pub trait SpriteLoader {
    /// Opaque sprite handle stored in the registry.
    type Sprite;

    /// Loads the sprites for `tileset`, whose image resolves to `image_path`.
    fn load_sprites(
        &mut self,
        tileset: &Tileset,
        image_path: &Path,
    ) -> Result<Vec<Self::Sprite>, MapError>;
}

impl<S, F> SpriteLoader for F
where
    F: FnMut(&Tileset, &Path) -> Result<Vec<S>, MapError>,
{
    type Sprite = S;

    fn load_sprites(&mut self, tileset: &Tileset, image_path: &Path) -> Result<Vec<S>, MapError> {
        self(tileset, image_path)
    }
}

/// One tile cut out of an atlas image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasSprite {
    /// Local tile index inside the tileset.
    pub index: u32,
    /// Source rectangle in image pixels, top-left origin (what `draw_texture_ex` takes).
    pub source: Rect,
}

/// Slices tileset images into a regular grid of [`AtlasSprite`]s.
///
/// Uses the `<image width height>` recorded in the tileset when present, and otherwise
/// reads the image header from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtlasSpriteLoader;

impl SpriteLoader for AtlasSpriteLoader {
    type Sprite = AtlasSprite;

    fn load_sprites(
        &mut self,
        tileset: &Tileset,
        image_path: &Path,
    ) -> Result<Vec<AtlasSprite>, MapError> {
        let size = match tileset.image_size {
            Some(size) => size,
            None => read_image_size(image_path)?,
        };
        Ok(slice_atlas(tileset, size))
    }
}

fn read_image_size(path: &Path) -> Result<UVec2, MapError> {
    let bytes = std::fs::read(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = Image::from_file_with_format(&bytes, None).map_err(|e| MapError::Sprites {
        path: path.to_path_buf(),
        message: format!("{e:?}"),
    })?;
    Ok(uvec2(image.width() as u32, image.height() as u32))
}

/// Cuts `atlas_size` into tiles honoring margin and spacing, in local tile index order.
///
/// A `columns` attribute wider than the image is clamped to what fits, and no more than
/// `tile_count` sprites are produced.
pub fn slice_atlas(tileset: &Tileset, atlas_size: UVec2) -> Vec<AtlasSprite> {
    let (tw, th) = (tileset.tile_width, tileset.tile_height);
    if tw == 0 || th == 0 {
        warn!(tileset = %tileset.name, "tileset has a zero tile size, no sprites sliced");
        return Vec::new();
    }

    let (margin, spacing) = (tileset.margin, tileset.spacing);
    let fit = |extent: u32, tile: u32| {
        extent
            .saturating_sub(margin.saturating_mul(2))
            .saturating_add(spacing)
            / tile.saturating_add(spacing)
    };
    let fitting = fit(atlas_size.x, tw);
    let cols = match tileset.columns {
        Some(cols) if cols > fitting => {
            warn!(
                tileset = %tileset.name,
                columns = cols,
                fitting,
                "tileset columns exceed the image width, clamping"
            );
            fitting
        }
        Some(cols) => cols,
        None => fitting,
    };
    let rows = fit(atlas_size.y, th);

    let Some(cells) = cols.checked_mul(rows) else {
        warn!(tileset = %tileset.name, cols, rows, "atlas grid too large, no sprites sliced");
        return Vec::new();
    };
    let limit = match tileset.tile_count {
        Some(count) => cells.min(count),
        None => cells.min(GID_MASK),
    };

    // Row-major generation is already top-to-bottom, left-to-right, so stopping at
    // `limit` keeps the same sprites as sorting everything and truncating.
    let mut rects = Vec::with_capacity(limit as usize);
    'rows: for row in 0..rows {
        for col in 0..cols {
            if rects.len() == limit as usize {
                break 'rows;
            }
            rects.push(Rect::new(
                margin.saturating_add(col.saturating_mul(tw.saturating_add(spacing))) as f32,
                margin.saturating_add(row.saturating_mul(th.saturating_add(spacing))) as f32,
                tw as f32,
                th as f32,
            ));
        }
    }

    order_atlas_sprites(&mut rects, atlas_size.x, atlas_size.y);

    rects
        .into_iter()
        .enumerate()
        .map(|(index, source)| AtlasSprite {
            index: index as u32,
            source,
        })
        .collect()
}

/// Sorts atlas rectangles into local tile index order.
///
/// Atlas sprite coordinates put the origin at the bottom-left, so each rectangle is
/// keyed on `atlas_width - x + y * atlas_width` with `y` measured bottom-up, sorted
/// descending. In image space that reads top-to-bottom, left-to-right.
pub fn order_atlas_sprites(rects: &mut [Rect], atlas_width: u32, atlas_height: u32) {
    let w = atlas_width as i64;
    let h = atlas_height as i64;
    rects.sort_by_key(|r| {
        let x = r.x as i64;
        let y_up = h - (r.y as i64 + r.h as i64);
        Reverse(w - x + y_up * w)
    });
}
