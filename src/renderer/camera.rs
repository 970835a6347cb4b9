use crate::codec::{Point, Position, Rect};
use crate::state::BLOCK_SIZE;

const EPSILON: f64 = 1e-6;

/// Maps minimap tiles to screen pixels and back.
///
/// `scale` is the edge of one tile in pixels. Tile `d` tiles right of the
/// visible map rect starts at pixel `ceil(d * scale)`; drawing, picking and
/// marker placement all go through that one function so they agree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapCamera {
    pub center: Position,
    pub scale: f32,
}

impl MinimapCamera {
    pub fn new(center: Position, scale: f32) -> Self {
        Self { center, scale }
    }

    /// A block would be one pixel or less; nothing useful can be drawn
    pub fn is_degenerate(&self) -> bool {
        BLOCK_SIZE as f32 * self.scale <= 1.0
    }

    /// Tiles visible in `screen`, centered on `center`
    pub fn map_rect(&self, screen: Rect) -> Rect {
        let scale = self.scale as f64;
        let width = (screen.width as f64 / scale).floor() as i32;
        let height = (screen.height as f64 / scale).ceil() as i32;
        let mut rect = Rect::new(0, 0, width, height);
        rect.move_center(Point::new(self.center.x as i32, self.center.y as i32));
        rect
    }

    /// Per-frame mapping state for one screen rectangle
    pub fn projection(&self, screen: Rect) -> Projection {
        let map = self.map_rect(screen);
        let mut projection = Projection {
            screen,
            map,
            scale: self.scale as f64,
            offset: Point::default(),
        };
        projection.offset = Point::new(
            (projection.pixels(map.width) - screen.width) / 2,
            (projection.pixels(map.height) - screen.height) / 2,
        );
        projection
    }

    /// Anchor pixel of a tile; `None` when it is on another floor
    pub fn map_to_screen(&self, pos: Position, screen: Rect) -> Option<Point> {
        if screen.is_empty() || pos.z != self.center.z {
            return None;
        }
        let projection = self.projection(screen);
        let half = self.scale.trunc() as i32 / 2;
        Some(Point::new(
            projection.screen_x(pos.x as i32) + half,
            projection.screen_y(pos.y as i32) + half,
        ))
    }

    /// Tile under a screen pixel, on the camera's floor.
    ///
    /// Every pixel of a tile maps back to that tile, so `map_to_screen`
    /// of the result is the tile's anchor. For an anchor pixel the round
    /// trip is exact when `scale >= 1` and within one pixel below that.
    /// For any other pixel it lands within one pixel for `scale <= 3`, and
    /// within `ceil(scale) / 2` pixels for larger scales: at most half a
    /// tile, the distance from the tile's edge to its anchor.
    pub fn screen_to_map(&self, point: Point, screen: Rect) -> Option<Position> {
        if screen.is_empty() {
            return None;
        }
        let (x, y) = self.projection(screen).tile_at(point);
        Some(Position::new(u16::try_from(x).ok()?, u16::try_from(y).ok()?, self.center.z))
    }

    /// Every pixel covered by one tile; empty when the tile is on another floor
    pub fn tile_rect(&self, pos: Position, screen: Rect) -> Rect {
        if screen.is_empty() || pos.z != self.center.z {
            return Rect::default();
        }
        self.projection(screen).span(pos.x as i32, pos.y as i32, 1, 1)
    }
}

/// Tile/pixel mapping for a fixed camera and screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub screen: Rect,
    pub map: Rect,
    scale: f64,
    offset: Point,
}

impl Projection {
    /// First pixel of the tile `d` tiles from the map rect edge
    fn pixels(&self, d: i32) -> i32 {
        (d as f64 * self.scale - EPSILON).ceil() as i32
    }

    pub fn screen_x(&self, map_x: i32) -> i32 {
        self.screen.x - self.offset.x + self.pixels(map_x - self.map.x)
    }

    pub fn screen_y(&self, map_y: i32) -> i32 {
        self.screen.y - self.offset.y + self.pixels(map_y - self.map.y)
    }

    /// Pixels covered by a `width` x `height` tile area starting at `(x, y)`
    pub fn span(&self, x: i32, y: i32, width: i32, height: i32) -> Rect {
        let left = self.screen_x(x);
        let top = self.screen_y(y);
        Rect::new(left, top, self.screen_x(x + width) - left, self.screen_y(y + height) - top)
    }

    /// Unclamped tile coordinates under a pixel
    pub fn tile_at(&self, point: Point) -> (i32, i32) {
        let qx = (point.x - self.screen.x + self.offset.x) as f64;
        let qy = (point.y - self.screen.y + self.offset.y) as f64;
        (
            (qx / self.scale + 1e-9).floor() as i32 + self.map.x,
            (qy / self.scale + 1e-9).floor() as i32 + self.map.y,
        )
    }
}
