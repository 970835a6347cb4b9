use bitflags::bitflags;

/// Size of a minimap block edge in tiles. Part of the OTMM format.
pub const BLOCK_SIZE: usize = 32;
/// Number of tiles per block
pub const BLOCK_TILES: usize = BLOCK_SIZE * BLOCK_SIZE;
/// Serialized size of one tile record
pub const TILE_BYTES: usize = 3;
/// Uncompressed block payload size
pub const BLOCK_BYTES: usize = BLOCK_TILES * TILE_BYTES;

/// Color index meaning "transparent / never seen"
pub const TRANSPARENT_COLOR: u8 = 255;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u8 {
        const WAS_SEEN = 1;
        const NOT_WALKABLE = 2;
        const NOT_PATHABLE = 4;
        const EMPTY = 8;
    }
}

/// Attributes of a world tile, as supplied by the map model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInfo {
    pub minimap_color: u8,
    pub walkable: bool,
    pub pathable: bool,
    /// Ground speed in the world model's unit (ten per stored speed step)
    pub ground_speed: u16,
}

/// One minimap cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinimapTile {
    pub flags: TileFlags,
    pub color: u8,
    pub speed: u8,
}

impl Default for MinimapTile {
    fn default() -> Self {
        Self {
            flags: TileFlags::empty(),
            color: TRANSPARENT_COLOR,
            speed: 0,
        }
    }
}

impl MinimapTile {
    /// Derive the record for a world tile, or for a position known to hold no tile
    pub fn from_tile(tile: Option<&TileInfo>) -> Self {
        match tile {
            Some(info) => {
                let mut flags = TileFlags::WAS_SEEN;
                if !info.walkable {
                    flags |= TileFlags::NOT_WALKABLE;
                }
                if !info.pathable {
                    flags |= TileFlags::NOT_PATHABLE;
                }
                Self {
                    flags,
                    color: info.minimap_color,
                    speed: info.ground_speed.div_ceil(10).min(255) as u8,
                }
            }
            None => Self {
                flags: TileFlags::EMPTY,
                color: TRANSPARENT_COLOR,
                speed: 1,
            },
        }
    }

    pub fn has_flag(&self, flag: TileFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn was_seen(&self) -> bool {
        self.has_flag(TileFlags::WAS_SEEN)
    }

    pub fn is_walkable(&self) -> bool {
        !self.has_flag(TileFlags::NOT_WALKABLE)
    }

    pub fn is_pathable(&self) -> bool {
        !self.has_flag(TileFlags::NOT_PATHABLE)
    }

    pub fn is_transparent(&self) -> bool {
        self.color == TRANSPARENT_COLOR
    }

    /// Ground speed back in world units
    pub fn ground_speed(&self) -> u16 {
        self.speed as u16 * 10
    }

    pub fn to_bytes(self) -> [u8; TILE_BYTES] {
        [self.flags.bits(), self.color, self.speed]
    }

    pub fn from_bytes(b: [u8; TILE_BYTES]) -> Self {
        Self {
            flags: TileFlags::from_bits_retain(b[0]),
            color: b[1],
            speed: b[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unseen_sentinel() {
        let tile = MinimapTile::default();
        assert_eq!(tile, MinimapTile::default());
        assert_eq!(tile.color, 255);
        assert!(tile.flags.is_empty());
        assert_eq!(tile.speed, 0);
        assert!(!tile.was_seen());
        assert!(tile.is_transparent());
    }

    #[test]
    fn test_from_walkable_tile() {
        let info = TileInfo { minimap_color: 42, walkable: true, pathable: true, ground_speed: 55 };
        let tile = MinimapTile::from_tile(Some(&info));
        assert_eq!(tile, MinimapTile { flags: TileFlags::WAS_SEEN, color: 42, speed: 6 });
        assert_eq!(tile.ground_speed(), 60);
    }

    #[test]
    fn test_from_blocked_tile() {
        let info = TileInfo { minimap_color: 7, walkable: false, pathable: false, ground_speed: 9999 };
        let tile = MinimapTile::from_tile(Some(&info));
        assert!(tile.was_seen());
        assert!(!tile.is_walkable());
        assert!(!tile.is_pathable());
        assert_eq!(tile.speed, 255);
    }

    #[test]
    fn test_from_missing_tile() {
        let tile = MinimapTile::from_tile(None);
        assert_eq!(tile.flags, TileFlags::EMPTY);
        assert_eq!(tile.color, 255);
        assert_eq!(tile.speed, 1);
        assert_ne!(tile, MinimapTile::default());
    }

    #[test]
    fn test_bytes_keep_unknown_flags() {
        let tile = MinimapTile::from_bytes([0x81, 12, 3]);
        assert!(tile.was_seen());
        assert_eq!(tile.to_bytes(), [0x81, 12, 3]);
    }
}
