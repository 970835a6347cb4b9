use crate::codec::{Color, Position, Rect};
use crate::state::minimap::{write_block, Minimap};
use crate::state::{BlockKey, SharedBlock, BLOCK_SIZE};
use super::camera::{MinimapCamera, Projection};
use super::{DrawQueue, TextureCache};

const MAP_EDGE: i32 = u16::MAX as i32 + 1;

impl Minimap {
    /// Queue the minimap for `screen`, centered on `center`, with `scale`
    /// pixels per tile. Everything queued is clipped to `screen`.
    pub fn draw(
        &self,
        queue: &mut dyn DrawQueue,
        textures: &mut dyn TextureCache,
        screen: Rect,
        center: Position,
        scale: f32,
        color: Color,
    ) {
        let camera = MinimapCamera::new(center, scale);
        if screen.is_empty() || camera.is_degenerate() || !center.is_map_position() {
            return;
        }

        queue.add_filled_rect(screen, color);
        let start = queue.len();
        let projection = camera.projection(screen);

        for (rect, block) in self.visible_blocks(&projection, center.z) {
            let mut block = write_block(&block);
            block.update(textures);
            if let Some(texture) = block.texture() {
                queue.add_textured_rect(rect, texture, Rect::new(0, 0, BLOCK_SIZE as i32, BLOCK_SIZE as i32));
            }
        }

        self.draw_markers(queue, textures, &camera, &projection);
        queue.set_clip(start, screen);
    }

    /// Existing blocks covering the screen with their destination rects.
    /// The cache lock is released before the caller touches any block.
    fn visible_blocks(&self, projection: &Projection, z: u8) -> Vec<(Rect, SharedBlock)> {
        let block = BLOCK_SIZE as i32;
        let screen = projection.screen;
        let (first_x, first_y) = projection.tile_at(screen.top_left());
        let origin_x = first_x.div_euclid(block) * block;
        let origin_y = first_y.div_euclid(block) * block;

        let layers = self.layers();
        let Some(layer) = layers.get(z as usize) else {
            return Vec::new();
        };

        let mut visible = Vec::new();
        let mut by = origin_y;
        while projection.screen_y(by) < screen.bottom() {
            let mut bx = origin_x;
            while projection.screen_x(bx) < screen.right() {
                if (0..MAP_EDGE).contains(&bx) && (0..MAP_EDGE).contains(&by) {
                    let key = BlockKey { x: (bx / block) as u16, y: (by / block) as u16 };
                    if let Some(shared) = layer.get(key) {
                        visible.push((projection.span(bx, by, block, block), SharedBlock::clone(shared)));
                    }
                }
                bx += block;
            }
            by += block;
        }
        visible
    }

    fn draw_markers(
        &self,
        queue: &mut dyn DrawQueue,
        textures: &mut dyn TextureCache,
        camera: &MinimapCamera,
        projection: &Projection,
    ) {
        let markers: Vec<_> = self.markers().iter().filter(|m| m.pos.z == camera.center.z).cloned().collect();
        if markers.is_empty() {
            return;
        }

        let icon_size = self.config().marker_icon_size;
        let Some(atlas) = textures.load_texture(&self.config().marker_atlas) else {
            tracing::debug!(atlas = %self.config().marker_atlas, "marker atlas unavailable");
            return;
        };
        let Some(atlas_size) = textures.texture_size(atlas) else {
            return;
        };
        if icon_size <= 0 {
            return;
        }
        let per_row = atlas_size.width / icon_size;
        if per_row == 0 {
            return;
        }

        let map = projection.map;
        let reach_x = (map.width + 2) / 2;
        let reach_y = (map.height + 2) / 2;
        for marker in markers {
            let dx = marker.pos.x as i32 - camera.center.x as i32;
            let dy = marker.pos.y as i32 - camera.center.y as i32;
            if dx.abs() > reach_x || dy.abs() > reach_y {
                continue;
            }
            let Some(anchor) = camera.map_to_screen(marker.pos, projection.screen) else {
                continue;
            };

            let icon = marker.icon as i32;
            let src = Rect::new((icon % per_row) * icon_size, (icon / per_row) * icon_size, icon_size, icon_size);
            let mut dest = Rect::new(0, 0, icon_size, icon_size);
            dest.move_center(anchor);
            queue.add_textured_rect(dest, atlas, src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Point, Size};
    use crate::renderer::{Canvas, DrawCommand, DrawList, SoftwareTextures};
    use crate::state::minimap::tests::info;

    const BACKGROUND: Color = Color::rgb(1, 2, 3);

    fn draw(minimap: &Minimap, textures: &mut SoftwareTextures, screen: Rect, center: Position, scale: f32) -> DrawList {
        let mut list = DrawList::new();
        minimap.draw(&mut list, textures, screen, center, scale, BACKGROUND);
        list
    }

    #[test]
    fn test_early_outs() {
        let minimap = Minimap::default();
        let mut textures = SoftwareTextures::new();
        let center = Position::new(100, 100, 7);
        assert!(draw(&minimap, &mut textures, Rect::default(), center, 1.0).is_empty());
        assert!(draw(&minimap, &mut textures, Rect::new(0, 0, 64, 64), center, 1.0 / 64.0).is_empty());
        assert!(draw(&minimap, &mut textures, Rect::new(0, 0, 64, 64), Position::INVALID, 1.0).is_empty());
    }

    #[test]
    fn test_draws_background_and_blocks() {
        let minimap = Minimap::default();
        let mut textures = SoftwareTextures::new();
        minimap.update_tile(Position::new(100, 100, 7), Some(&info(40)));
        minimap.update_tile(Position::new(100, 100, 6), Some(&info(41)));
        // Created but never written: no texture, nothing drawn.
        minimap.get_or_create_block(Position::new(140, 100, 7));

        let screen = Rect::new(10, 20, 64, 48);
        let list = draw(&minimap, &mut textures, screen, Position::new(100, 100, 7), 1.0);
        let commands = list.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], DrawCommand::FilledRect { dest: screen, color: BACKGROUND, clip: None });
        match commands[1] {
            DrawCommand::TexturedRect { dest, src, clip, .. } => {
                assert_eq!(dest.size(), Size::new(32, 32));
                assert_eq!(src, Rect::new(0, 0, 32, 32));
                assert_eq!(clip, Some(screen));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(textures.live_count(), 1);
    }

    #[test]
    fn test_rendered_tile_lands_on_anchor() {
        let minimap = Minimap::default();
        let mut textures = SoftwareTextures::new();
        let tile = Position::new(1000, 1003, 7);
        minimap.update_tile(tile, Some(&info(40)));

        let screen = Rect::new(0, 0, 90, 70);
        let center = Position::new(1010, 1000, 7);
        for scale in [1.0f32, 2.0, 3.0, 2.5] {
            let list = draw(&minimap, &mut textures, screen, center, scale);
            let mut canvas = Canvas::new(screen.size(), Color::WHITE);
            canvas.render(&list, &textures);

            let camera = MinimapCamera::new(center, scale);
            let anchor = camera.map_to_screen(tile, screen).unwrap();
            assert_eq!(canvas.pixel(anchor.x, anchor.y), Some(Color::from_8bit(40)), "scale {}", scale);
            assert_eq!(camera.screen_to_map(anchor, screen), Some(tile));

            let beside = camera.map_to_screen(Position::new(1001, 1003, 7), screen).unwrap();
            assert_eq!(canvas.pixel(beside.x, beside.y), Some(BACKGROUND));
        }
    }

    #[test]
    fn test_blocks_at_map_edges() {
        let minimap = Minimap::default();
        let mut textures = SoftwareTextures::new();
        minimap.update_tile(Position::new(0, 0, 7), Some(&info(1)));
        minimap.update_tile(Position::new(65535, 65535, 7), Some(&info(2)));

        let screen = Rect::new(0, 0, 100, 100);
        let top_left = draw(&minimap, &mut textures, screen, Position::new(2, 2, 7), 2.0);
        assert_eq!(top_left.len(), 2);
        let bottom_right = draw(&minimap, &mut textures, screen, Position::new(65533, 65533, 7), 2.0);
        assert_eq!(bottom_right.len(), 2);
    }

    #[test]
    fn test_markers() {
        let config = crate::config::MinimapConfig::new().marker_atlas("flags", 4);
        let minimap = Minimap::new(config);
        let mut textures = SoftwareTextures::new();
        textures.insert_named("flags", Size::new(12, 8), &[Color::WHITE; 96]);

        let center = Position::new(500, 500, 7);
        minimap.add_marker(Position::new(504, 500, 7), 4, "visible");
        minimap.add_marker(Position::new(504, 500, 6), 4, "other floor");
        minimap.add_marker(Position::new(900, 500, 7), 4, "far away");

        let screen = Rect::new(0, 0, 64, 64);
        let list = draw(&minimap, &mut textures, screen, center, 2.0);
        let icons: Vec<_> = list
            .commands()
            .iter()
            .filter_map(|c| match *c {
                DrawCommand::TexturedRect { dest, src, clip, .. } => Some((dest, src, clip)),
                _ => None,
            })
            .collect();
        assert_eq!(icons.len(), 1);

        let (dest, src, clip) = icons[0];
        assert_eq!(src, Rect::new(4, 4, 4, 4));
        let anchor = MinimapCamera::new(center, 2.0).map_to_screen(Position::new(504, 500, 7), screen).unwrap();
        assert_eq!(dest.center(), anchor);
        assert_eq!(dest.size(), Size::new(4, 4));
        assert_eq!(clip, Some(screen));
        assert!(dest.contains(Point::new(anchor.x, anchor.y)));
    }

    #[test]
    fn test_markers_without_atlas() {
        let minimap = Minimap::default();
        let mut textures = SoftwareTextures::new();
        minimap.add_marker(Position::new(100, 100, 7), 1, "x");
        let list = draw(&minimap, &mut textures, Rect::new(0, 0, 32, 32), Position::new(100, 100, 7), 1.0);
        assert_eq!(list.len(), 1);
    }
}
