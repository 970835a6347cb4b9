use std::ops::{Add, Sub};

/// Highest elevation layer (inclusive)
pub const MAX_Z: u8 = 15;

/// Number of elevation layers
pub const LAYER_COUNT: usize = MAX_Z as usize + 1;

/// Map position: 16-bit x/y plus an elevation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u16,
    pub y: u16,
    pub z: u8,
}

impl Position {
    /// End-of-stream / null sentinel
    pub const INVALID: Self = Self { x: u16::MAX, y: u16::MAX, z: MAX_Z + 1 };

    pub const fn new(x: u16, y: u16, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Layer is within `[0, MAX_Z]`
    pub fn is_valid(self) -> bool {
        self.z <= MAX_Z
    }

    /// Usable as a view center: valid and not on the reserved 65535 edge
    pub fn is_map_position(self) -> bool {
        self.is_valid() && self.x < u16::MAX && self.y < u16::MAX
    }

    /// Offset in the same layer, `None` if it leaves the 16-bit map
    pub fn translated(self, dx: i32, dy: i32) -> Option<Self> {
        let x = u16::try_from(self.x as i32 + dx).ok()?;
        let y = u16::try_from(self.y as i32 + dy).ok()?;
        Some(Self { x, y, z: self.z })
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Integer 2D point (screen or map space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<Position> for Point {
    fn from(pos: Position) -> Self {
        Point::new(pos.x as i32, pos.y as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }
}

/// Axis-aligned integer rectangle; `right()`/`bottom()` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Center pixel; for even sizes this is the upper-left of the middle four
    pub fn center(&self) -> Point {
        Point::new(self.x + (self.width - 1) / 2, self.y + (self.height - 1) / 2)
    }

    /// Same size, moved so that `center()` returns `p`
    pub fn move_center(&mut self, p: Point) {
        self.x = p.x - (self.width - 1) / 2;
        self.y = p.y - (self.height - 1) / 2;
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());
        if r <= x || b <= y {
            return Rect::default();
        }
        Rect::new(x, y, r - x, b - y)
    }
}

/// Color (RGBA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const ALPHA: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Decode an index of the 6x6x6 minimap palette. Indices past the cube
    /// (216..) decode to black.
    pub fn from_8bit(c: u8) -> Self {
        if c >= 216 {
            return Self::BLACK;
        }
        let r = (c / 36) % 6 * 51;
        let g = (c / 6) % 6 * 51;
        let b = c % 6 * 51;
        Self::rgb(r, g, b)
    }

    /// Nearest-below palette index, ignoring alpha
    pub fn to_8bit(self) -> u8 {
        (self.r / 51) * 36 + (self.g / 51) * 6 + self.b / 51
    }

    /// Multiply the color channels by `factor`, clamped; alpha is kept
    pub fn scaled(self, factor: f32) -> Self {
        let scale = |v: u8| (v as f32 * factor).clamp(0.0, 255.0) as u8;
        Self::rgba(scale(self.r), scale(self.g), scale(self.b), self.a)
    }

    pub fn same_rgb(self, other: Self) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color {
    fn from(v: [u8; 4]) -> Self {
        Self::rgba(v[0], v[1], v[2], v[3])
    }
}
