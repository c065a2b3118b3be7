//! Raw GID to registry UUID resolution.

use tracing::{debug, warn};

use super::{TilesetRef, TilesetRegistry};
use crate::error::MapError;
use crate::spatial::TileId;

/// Resolves a decoded layer grid into registry UUIDs.
///
/// Each raw GID is attributed to the last reference (in document order) whose
/// `first_gid` does not exceed it, which is correct as long as references ascend by
/// `first_gid`. Flip flags carry over unchanged. Rows are written bottom-up: source row
/// `y` lands on row `height - 1 - y`.
///
/// GIDs past the end of a tileset, GIDs below every `first_gid` and references whose
/// tileset never got registered all resolve to the empty tile.
pub fn resolve_tiles<S>(
    raw: &[u32],
    width: u32,
    height: u32,
    refs: &[TilesetRef],
    registry: &TilesetRegistry<S>,
) -> Vec<TileId> {
    let (w, h) = (width as usize, height as usize);
    let mut out = vec![TileId::EMPTY; raw.len()];

    for (idx, &value) in raw.iter().enumerate() {
        let resolved = resolve_one(TileId(value), refs, registry);
        let (x, y) = match w {
            0 => (0, idx),
            _ => (idx % w, idx / w),
        };
        let dest = match h.checked_sub(1 + y) {
            Some(flipped) => flipped * w + x,
            // Only reachable when `raw` is longer than the grid; keep storage order.
            None => idx,
        };
        if let Some(slot) = out.get_mut(dest) {
            *slot = resolved;
        }
    }
    out
}

fn resolve_one<S>(tile: TileId, refs: &[TilesetRef], registry: &TilesetRegistry<S>) -> TileId {
    let gid = tile.uuid();
    if gid == 0 {
        return TileId::EMPTY;
    }

    let Some(owner) = refs.iter().rev().find(|r| r.first_gid <= gid) else {
        warn!(gid, "no tileset covers gid, using empty tile");
        return TileId::EMPTY;
    };
    let Some(tileset) = registry.get_by_path(&owner.path) else {
        warn!(gid, path = %owner.path, "tileset for gid is not registered, using empty tile");
        return TileId::EMPTY;
    };

    let local = (gid - owner.first_gid) as usize;
    match tileset.uuids().get(local) {
        Some(&uuid) => TileId(tile.flags() | uuid),
        None => {
            debug!(
                gid,
                local,
                tileset = %tileset.name,
                available = tileset.uuids().len(),
                "gid past the end of its tileset, using empty tile"
            );
            TileId::EMPTY
        }
    }
}

/// Fails on the first reference whose `first_gid` is not strictly above the previous one.
pub fn check_tileset_order(refs: &[TilesetRef]) -> Result<(), MapError> {
    for pair in refs.windows(2) {
        if pair[1].first_gid <= pair[0].first_gid {
            return Err(MapError::TilesetOrder {
                path: pair[1].path.clone(),
                first_gid: pair[1].first_gid,
                previous: pair[0].first_gid,
            });
        }
    }
    Ok(())
}
