mod tile_id;

pub use tile_id::{TileId, FLIP_D, FLIP_H, FLIP_MASK, FLIP_V, GID_MASK};
