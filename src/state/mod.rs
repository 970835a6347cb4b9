pub mod tile;
pub mod block;
pub mod index;
pub mod marker;
pub mod minimap;
#[cfg(feature = "image-import")]
pub mod import;

pub use tile::{
    MinimapTile, TileFlags, TileInfo,
    BLOCK_SIZE, BLOCK_TILES, BLOCK_BYTES, TILE_BYTES, TRANSPARENT_COLOR,
};
pub use block::{BlockKey, MinimapBlock, local_offset};
pub use index::{SharedBlock, SpatialIndex};
pub use marker::{Marker, MarkerStore, marker_key, parse_icon, DEFAULT_ICON, DEFAULT_DESCRIPTION};
pub use minimap::{LoadReport, Minimap};
