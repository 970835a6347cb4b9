//! CPU render backend: a texture table, a recorded draw list and a canvas
//! that rasterizes it.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::codec::{Color, Point, Rect, Size};
use super::{DrawQueue, TextureCache, TextureHandle};

#[derive(Debug, Clone)]
struct Texture {
    size: Size,
    pixels: Vec<Color>,
}

/// In-memory texture table. Handles are never reused.
#[derive(Debug, Default)]
pub struct SoftwareTextures {
    textures: HashMap<u32, Texture, ahash::RandomState>,
    named: HashMap<String, TextureHandle, ahash::RandomState>,
    next_id: u32,
    root: Option<PathBuf>,
}

impl SoftwareTextures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve named textures as PNG files below `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()), ..Self::default() }
    }

    /// Register a texture under a name, as if loaded from disk
    pub fn insert_named(&mut self, name: &str, size: Size, pixels: &[Color]) -> TextureHandle {
        let handle = self.new_texture(size, pixels);
        self.named.insert(name.to_string(), handle);
        handle
    }

    /// Textures created and not yet released, named ones included
    pub fn live_count(&self) -> usize {
        self.textures.len()
    }

    /// Color at a texel, `None` outside the texture
    pub fn texel(&self, handle: TextureHandle, x: i32, y: i32) -> Option<Color> {
        let texture = self.textures.get(&handle.0)?;
        if x < 0 || y < 0 || x >= texture.size.width || y >= texture.size.height {
            return None;
        }
        texture.pixels.get((y * texture.size.width + x) as usize).copied()
    }

    #[cfg(feature = "image-import")]
    fn load_file(&mut self, name: &str) -> Option<TextureHandle> {
        let root = self.root.as_ref()?;
        let base = root.join(name.trim_start_matches('/'));
        let candidates = [base.with_extension("png"), base];
        let image = candidates.iter().find_map(|path| match image::open(path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "texture not loaded");
                None
            }
        })?;
        let size = Size::new(image.width() as i32, image.height() as i32);
        let pixels: Vec<Color> = image.pixels().map(|p| Color::from(p.0)).collect();
        Some(self.insert_named(name, size, &pixels))
    }

    #[cfg(not(feature = "image-import"))]
    fn load_file(&mut self, _name: &str) -> Option<TextureHandle> {
        self.root.as_ref()?;
        None
    }
}

impl TextureCache for SoftwareTextures {
    fn new_texture(&mut self, size: Size, pixels: &[Color]) -> TextureHandle {
        let mut data = pixels.to_vec();
        data.resize(size.area(), Color::ALPHA);
        self.next_id += 1;
        self.textures.insert(self.next_id, Texture { size, pixels: data });
        TextureHandle(self.next_id)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle.0);
        self.named.retain(|_, h| *h != handle);
    }

    fn texture_size(&self, handle: TextureHandle) -> Option<Size> {
        self.textures.get(&handle.0).map(|t| t.size)
    }

    fn load_texture(&mut self, path: &str) -> Option<TextureHandle> {
        if let Some(handle) = self.named.get(path) {
            return Some(*handle);
        }
        self.load_file(path)
    }
}

/// One recorded draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    FilledRect {
        dest: Rect,
        color: Color,
        clip: Option<Rect>,
    },
    TexturedRect {
        dest: Rect,
        texture: TextureHandle,
        src: Rect,
        clip: Option<Rect>,
    },
}

impl DrawCommand {
    pub fn dest(&self) -> Rect {
        match self {
            DrawCommand::FilledRect { dest, .. } | DrawCommand::TexturedRect { dest, .. } => *dest,
        }
    }

    pub fn clip(&self) -> Option<Rect> {
        match self {
            DrawCommand::FilledRect { clip, .. } | DrawCommand::TexturedRect { clip, .. } => *clip,
        }
    }

    fn clip_mut(&mut self) -> &mut Option<Rect> {
        match self {
            DrawCommand::FilledRect { clip, .. } | DrawCommand::TexturedRect { clip, .. } => clip,
        }
    }
}

/// Draw calls recorded in order
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DrawQueue for DrawList {
    fn len(&self) -> usize {
        self.commands.len()
    }

    fn add_filled_rect(&mut self, dest: Rect, color: Color) {
        self.commands.push(DrawCommand::FilledRect { dest, color, clip: None });
    }

    fn add_textured_rect(&mut self, dest: Rect, texture: TextureHandle, src: Rect) {
        self.commands.push(DrawCommand::TexturedRect { dest, texture, src, clip: None });
    }

    fn set_clip(&mut self, start: usize, clip: Rect) {
        for command in self.commands.iter_mut().skip(start) {
            let slot = command.clip_mut();
            *slot = Some(match slot {
                Some(existing) => existing.intersection(&clip),
                None => clip,
            });
        }
    }
}

/// RGBA pixel buffer that a [`DrawList`] is rasterized into
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    size: Size,
    pixels: Vec<Color>,
}

impl Canvas {
    /// Negative dimensions are treated as zero
    pub fn new(size: Size, background: Color) -> Self {
        let size = Size::new(size.width.max(0), size.height.max(0));
        Self { size, pixels: vec![background; size.area()] }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if !Rect::from_size(self.size).contains(Point::new(x, y)) {
            return None;
        }
        self.pixels.get((y * self.size.width + x) as usize).copied()
    }

    fn blend(&mut self, x: i32, y: i32, src: Color) {
        let idx = (y * self.size.width + x) as usize;
        let Some(dst) = self.pixels.get_mut(idx) else {
            return;
        };
        match src.a {
            0 => {}
            255 => *dst = src,
            a => {
                let a = a as u32;
                let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
                *dst = Color::rgba(
                    mix(src.r, dst.r),
                    mix(src.g, dst.g),
                    mix(src.b, dst.b),
                    (a + dst.a as u32 * (255 - a) / 255) as u8,
                );
            }
        }
    }

    /// Rasterize every command in order, sampling textures nearest-neighbour
    pub fn render(&mut self, list: &DrawList, textures: &SoftwareTextures) {
        let bounds = Rect::from_size(self.size);
        for command in list.commands() {
            let mut area = command.dest().intersection(&bounds);
            if let Some(clip) = command.clip() {
                area = area.intersection(&clip);
            }
            if area.is_empty() {
                continue;
            }

            match *command {
                DrawCommand::FilledRect { color, .. } => {
                    for y in area.top()..area.bottom() {
                        for x in area.left()..area.right() {
                            self.blend(x, y, color);
                        }
                    }
                }
                DrawCommand::TexturedRect { dest, texture, src, .. } => {
                    for y in area.top()..area.bottom() {
                        let ty = src.y + (y - dest.y) * src.height / dest.height;
                        for x in area.left()..area.right() {
                            let tx = src.x + (x - dest.x) * src.width / dest.width;
                            if let Some(texel) = textures.texel(texture, tx, ty) {
                                self.blend(x, y, texel);
                            }
                        }
                    }
                }
            }
        }
    }

    #[cfg(feature = "image-import")]
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.size.width as u32, self.size.height as u32, |x, y| {
            let color = self.pixels[(y * self.size.width as u32 + x) as usize];
            image::Rgba(color.to_array())
        })
    }

    #[cfg(feature = "image-import")]
    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> crate::error::Result<()> {
        self.to_rgba_image()
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| crate::error::Error::Image(e.to_string()))
    }
}
