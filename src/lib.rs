//! OTMM minimap cache
//!
//! A sparse, block-partitioned cache of what has been seen of a tile map,
//! persisted in the compressed OTMM format and drawn as a zoomable overlay
//! through a pluggable render backend.

pub mod codec;
pub mod config;
pub mod error;
pub mod renderer;
pub mod state;

pub use error::{Error, Result};
pub use config::MinimapConfig;
pub use codec::{
    Position, Point, Size, Rect, Color,
    OtmmReader, OtmmWriter, OtmmHeader,
    MAX_Z, LAYER_COUNT,
};
pub use renderer::{
    DrawQueue, TextureCache, TextureHandle,
    MinimapCamera, Canvas, DrawList, SoftwareTextures,
};
pub use state::{
    Minimap, LoadReport, MinimapTile, TileFlags, TileInfo,
    Marker, MarkerStore,
};
