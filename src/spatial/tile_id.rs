/// Horizontal flip flag.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Vertical flip flag.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Diagonal (anti-diagonal transpose) flip flag.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// All three flip flags.
pub const FLIP_MASK: u32 = FLIP_H | FLIP_V | FLIP_D;
/// Keeps the lower 29 bits, the UUID/GID payload.
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// A packed 32-bit tile identifier.
///
/// The three high bits carry flip flags, the remaining 29 bits carry either a raw
/// GID (before resolution) or a registry UUID (after resolution). The packing is the
/// on-disk TMX layout, so the value stays a single `u32`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

impl TileId {
    /// The empty tile.
    pub const EMPTY: TileId = TileId(0);

    /// The packed value, flags included.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Payload without flag bits.
    #[inline]
    pub const fn uuid(self) -> u32 {
        self.0 & GID_MASK
    }

    /// Flag bits only.
    #[inline]
    pub const fn flags(self) -> u32 {
        self.0 & FLIP_MASK
    }

    /// Whether this is the empty tile (flags ignored).
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.uuid() == 0
    }

    /// Whether the horizontal flip flag is set.
    #[inline]
    pub const fn flipped_horizontal(self) -> bool {
        (self.0 & FLIP_H) != 0
    }

    /// Whether the vertical flip flag is set.
    #[inline]
    pub const fn flipped_vertical(self) -> bool {
        (self.0 & FLIP_V) != 0
    }

    /// Whether the diagonal flip flag is set.
    #[inline]
    pub const fn flipped_diagonal(self) -> bool {
        (self.0 & FLIP_D) != 0
    }

    /// Sets or clears the horizontal flip flag.
    #[inline]
    pub const fn set_flipped_horizontal(self, on: bool) -> TileId {
        self.with_flag(FLIP_H, on)
    }

    /// Sets or clears the vertical flip flag.
    #[inline]
    pub const fn set_flipped_vertical(self, on: bool) -> TileId {
        self.with_flag(FLIP_V, on)
    }

    /// Sets or clears the diagonal flip flag.
    #[inline]
    pub const fn set_flipped_diagonal(self, on: bool) -> TileId {
        self.with_flag(FLIP_D, on)
    }

    /// Replaces the payload, keeping the current flags. Bits above the payload in
    /// `uuid` are discarded.
    #[inline]
    pub const fn with_uuid(self, uuid: u32) -> TileId {
        TileId(self.flags() | (uuid & GID_MASK))
    }

    #[inline]
    const fn with_flag(self, flag: u32, on: bool) -> TileId {
        if on {
            TileId(self.0 | flag)
        } else {
            TileId(self.0 & !flag)
        }
    }
}

impl From<u32> for TileId {
    fn from(raw: u32) -> Self {
        TileId(raw)
    }
}

impl From<TileId> for u32 {
    fn from(id: TileId) -> Self {
        id.0
    }
}
