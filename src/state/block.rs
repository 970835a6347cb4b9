use crate::codec::{Color, Position, Size};
use crate::error::{Error, Result};
use crate::renderer::{TextureCache, TextureHandle};
use super::tile::{MinimapTile, BLOCK_BYTES, BLOCK_SIZE, BLOCK_TILES, TILE_BYTES};

/// Block coordinates: map x/y divided by `BLOCK_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    pub x: u16,
    pub y: u16,
}

impl BlockKey {
    pub fn from_position(pos: Position) -> Self {
        Self {
            x: pos.x / BLOCK_SIZE as u16,
            y: pos.y / BLOCK_SIZE as u16,
        }
    }

    /// Map position of the block's top-left tile
    pub fn origin(self, z: u8) -> Position {
        Position::new(self.x * BLOCK_SIZE as u16, self.y * BLOCK_SIZE as u16, z)
    }
}

/// Offset of `pos` inside its block
pub fn local_offset(pos: Position) -> (usize, usize) {
    (pos.x as usize % BLOCK_SIZE, pos.y as usize % BLOCK_SIZE)
}

/// A BLOCK_SIZE x BLOCK_SIZE grid of minimap tiles on one layer
#[derive(Debug)]
pub struct MinimapBlock {
    tiles: Vec<MinimapTile>,
    texture: Option<TextureHandle>,
    must_update: bool,
    was_seen: bool,
}

impl Default for MinimapBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl MinimapBlock {
    pub fn new() -> Self {
        Self {
            tiles: vec![MinimapTile::default(); BLOCK_TILES],
            texture: None,
            must_update: false,
            was_seen: false,
        }
    }

    fn index(x: usize, y: usize) -> usize {
        debug_assert!(x < BLOCK_SIZE && y < BLOCK_SIZE);
        y * BLOCK_SIZE + x
    }

    pub fn tile(&self, x: usize, y: usize) -> MinimapTile {
        self.tiles[Self::index(x, y)]
    }

    /// Direct access; callers that change the color must call `mark_dirty`
    pub fn tile_mut(&mut self, x: usize, y: usize) -> &mut MinimapTile {
        &mut self.tiles[Self::index(x, y)]
    }

    pub fn tiles(&self) -> &[MinimapTile] {
        &self.tiles
    }

    /// Store a tile. Only a color change invalidates the texture.
    pub fn update_tile(&mut self, x: usize, y: usize, tile: MinimapTile) {
        let slot = &mut self.tiles[Self::index(x, y)];
        if slot.color != tile.color {
            self.must_update = true;
        }
        *slot = tile;
        self.was_seen = true;
    }

    pub fn mark_dirty(&mut self) {
        self.must_update = true;
    }

    pub fn just_saw(&mut self) {
        self.was_seen = true;
    }

    pub fn was_seen(&self) -> bool {
        self.was_seen
    }

    pub fn must_update(&self) -> bool {
        self.must_update
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Row-major RGBA image of the block
    pub fn pixels(&self) -> Vec<Color> {
        self.tiles
            .iter()
            .map(|t| if t.is_transparent() { Color::ALPHA } else { Color::from_8bit(t.color) })
            .collect()
    }

    /// Rebuild the texture if any color changed since the last rebuild.
    /// A block with no visible tile keeps no texture at all.
    pub fn update(&mut self, textures: &mut dyn TextureCache) {
        if !self.must_update {
            return;
        }

        if let Some(old) = self.texture.take() {
            textures.release_texture(old);
        }

        let visible = self.tiles.iter().any(|t| !t.is_transparent());
        if visible {
            let size = Size::new(BLOCK_SIZE as i32, BLOCK_SIZE as i32);
            self.texture = Some(textures.new_texture(size, &self.pixels()));
        }

        self.must_update = false;
    }

    /// Reset to a fresh unseen block, releasing the texture
    pub fn clean(&mut self, textures: &mut dyn TextureCache) {
        self.tiles.fill(MinimapTile::default());
        if let Some(old) = self.texture.take() {
            textures.release_texture(old);
        }
        self.must_update = false;
        self.was_seen = false;
    }

    /// Raw tile payload as stored in OTMM files
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BLOCK_BYTES);
        for tile in &self.tiles {
            out.extend_from_slice(&tile.to_bytes());
        }
        out
    }

    /// Replace every tile from a raw payload of exactly `BLOCK_BYTES`
    pub fn load_bytes(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != BLOCK_BYTES {
            return Err(Error::BlockSizeMismatch { expected: BLOCK_BYTES, actual: data.len() });
        }
        for (tile, raw) in self.tiles.iter_mut().zip(data.chunks_exact(TILE_BYTES)) {
            *tile = MinimapTile::from_bytes([raw[0], raw[1], raw[2]]);
        }
        Ok(())
    }
}
