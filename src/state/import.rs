//! Seeding the minimap from a reference image.

use std::path::Path;

use image::RgbaImage;

use crate::codec::{Color, Position};
use crate::error::{Error, Result};
use super::block::local_offset;
use super::minimap::{write_block, Minimap};
use super::tile::TileFlags;

/// Palette index of water (#3300cc); treated as transparent
const WATER_COLOR: Color = Color::rgb(0x33, 0x00, 0xcc);

const NOT_WALKABLE_COLORS: [Color; 7] = [
    Color::rgb(0x00, 0x00, 0x00), // oil
    Color::rgb(0x00, 0x66, 0x00), // trees
    Color::rgb(0xff, 0x33, 0x00), // walls
    Color::rgb(0x66, 0x66, 0x66), // mountain
    Color::rgb(0xff, 0x66, 0x00), // lava
    Color::rgb(0x00, 0xff, 0x00), // position
    Color::rgb(0xcc, 0xff, 0xff), // ice
];

const NOT_PATHABLE_COLORS: [Color; 1] = [
    Color::rgb(0xff, 0xff, 0x00),
];

fn classify(pixel: Color) -> TileFlags {
    let mut flags = TileFlags::empty();
    if NOT_WALKABLE_COLORS.iter().any(|c| c.same_rgb(pixel)) {
        flags |= TileFlags::NOT_WALKABLE;
    }
    if NOT_PATHABLE_COLORS.iter().any(|c| c.same_rgb(pixel)) {
        flags |= TileFlags::NOT_PATHABLE;
    }
    flags
}

impl Minimap {
    /// Write an image into the cache with its top-left pixel at `top_left`.
    ///
    /// Tiles already explored are left alone. Water and fully transparent
    /// pixels are skipped. Returns the number of tiles written.
    pub fn import_rgba(&self, image: &RgbaImage, top_left: Position, color_factor: f32) -> usize {
        let factor = if color_factor <= 0.01 { 1.0 } else { color_factor };
        let water = WATER_COLOR.to_8bit();
        let mut written = 0;

        for (x, y, pixel) in image.enumerate_pixels() {
            let color = Color::from(pixel.0);
            let c = color.scaled(factor).to_8bit();
            if c == water || color.a == 0 {
                continue;
            }

            let (Ok(px), Ok(py)) = (
                u16::try_from(top_left.x as u32 + x),
                u16::try_from(top_left.y as u32 + y),
            ) else {
                continue;
            };
            let pos = Position::new(px, py, top_left.z);
            let Some(block) = self.get_or_create_block(pos) else {
                return written;
            };

            let (bx, by) = local_offset(pos);
            let mut block = write_block(&block);
            let tile = block.tile_mut(bx, by);
            if tile.was_seen() {
                continue;
            }
            tile.color = c;
            tile.flags = classify(color);
            block.mark_dirty();
            written += 1;
        }

        written
    }

    /// Load an image file and import it with [`Minimap::import_rgba`]
    pub fn load_image(&self, path: impl AsRef<Path>, top_left: Position, color_factor: f32) -> Result<usize> {
        let path = path.as_ref();
        let result = image::open(path)
            .map(|img| img.to_rgba8())
            .map_err(|e| Error::Image(e.to_string()))
            .map(|img| self.import_rgba(&img, top_left, color_factor));
        match &result {
            Ok(tiles) => tracing::info!(path = %path.display(), tiles, "imported minimap image"),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to import minimap image"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use crate::state::minimap::tests::{info, temp_path};
    use crate::state::tile::MinimapTile;

    fn image(pixels: &[[u8; 4]], width: u32) -> RgbaImage {
        let height = pixels.len() as u32 / width;
        RgbaImage::from_fn(width, height, |x, y| Rgba(pixels[(y * width + x) as usize]))
    }

    #[test]
    fn test_import_writes_and_classifies() {
        let minimap = Minimap::default();
        let img = image(
            &[
                [0xff, 0x33, 0x00, 255], // walls
                [0xff, 0xff, 0x00, 255], // not pathable
                [0x33, 0x00, 0xcc, 255], // water
                [0x99, 0x99, 0x99, 0],   // transparent
                [0x99, 0x99, 0x99, 255], // plain ground
                [0x00, 0x00, 0x00, 255], // oil
            ],
            3,
        );
        let written = minimap.import_rgba(&img, Position::new(30, 40, 7), 1.0);
        assert_eq!(written, 4);

        let wall = minimap.get_tile(Position::new(30, 40, 7));
        assert_eq!(wall.color, Color::rgb(0xff, 0x33, 0x00).to_8bit());
        assert_eq!(wall.flags, TileFlags::NOT_WALKABLE);
        assert!(!wall.was_seen());
        assert_eq!(wall.speed, MinimapTile::default().speed);

        assert_eq!(minimap.get_tile(Position::new(31, 40, 7)).flags, TileFlags::NOT_PATHABLE);
        assert_eq!(minimap.get_tile(Position::new(32, 40, 7)), MinimapTile::default());
        assert_eq!(minimap.get_tile(Position::new(30, 41, 7)), MinimapTile::default());
        assert_eq!(minimap.get_tile(Position::new(31, 41, 7)).flags, TileFlags::empty());
        assert_eq!(minimap.get_tile(Position::new(32, 41, 7)).flags, TileFlags::NOT_WALKABLE);

        // Imported data is not exploration, so nothing is saved.
        assert_eq!(minimap.block_count(), 2);
        assert_eq!(minimap.seen_block_count(), 0);
        let block = minimap.get_block(Position::new(30, 40, 7)).unwrap();
        assert!(crate::state::minimap::read_block(&block).must_update());
    }

    #[test]
    fn test_import_keeps_seen_tiles() {
        let minimap = Minimap::default();
        let seen = Position::new(0, 0, 7);
        minimap.update_tile(seen, Some(&info(17)));
        let before = minimap.get_tile(seen);

        let img = image(&[[0xff, 0xff, 0xff, 255], [0xff, 0xff, 0xff, 255]], 2);
        assert_eq!(minimap.import_rgba(&img, seen, 1.0), 1);
        assert_eq!(minimap.get_tile(seen), before);
        assert_eq!(minimap.get_tile(Position::new(1, 0, 7)).color, 215);
    }

    #[test]
    fn test_import_color_factor() {
        let minimap = Minimap::default();
        let img = image(&[[0xcc, 0xcc, 0xcc, 255]], 1);

        minimap.import_rgba(&img, Position::new(0, 0, 7), 0.5);
        assert_eq!(minimap.get_tile(Position::new(0, 0, 7)).color, Color::rgb(0x66, 0x66, 0x66).to_8bit());

        // A non-positive factor means "unchanged".
        minimap.import_rgba(&img, Position::new(1, 0, 7), 0.0);
        assert_eq!(minimap.get_tile(Position::new(1, 0, 7)).color, Color::rgb(0xcc, 0xcc, 0xcc).to_8bit());
    }

    #[test]
    fn test_import_clips_at_map_edge() {
        let minimap = Minimap::default();
        let img = image(&[[0x99, 0x99, 0x99, 255]; 4], 2);
        assert_eq!(minimap.import_rgba(&img, Position::new(65535, 65535, 7), 1.0), 1);
        assert_eq!(minimap.import_rgba(&img, Position::new(0, 0, 16), 1.0), 0);
        assert_eq!(minimap.block_count(), 1);
    }

    #[test]
    fn test_load_image_errors() {
        let minimap = Minimap::default();
        assert!(matches!(
            minimap.load_image(temp_path("missing.png"), Position::new(0, 0, 7), 1.0),
            Err(Error::Image(_))
        ));

        let path = temp_path("seed.png");
        image(&[[0x99, 0x99, 0x99, 255]; 4], 2).save(&path).unwrap();
        assert_eq!(minimap.load_image(&path, Position::new(10, 10, 7), 1.0).unwrap(), 4);
        std::fs::remove_file(&path).unwrap();
    }
}
