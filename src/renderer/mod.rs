//! Render collaborator seam.
//!
//! The minimap never talks to a graphics API. It builds textures through a
//! [`TextureCache`] and emits rectangles into a [`DrawQueue`]; a backend
//! implements both. [`software`] is an in-process backend used by the CLI
//! and the tests.

pub mod camera;
pub mod overlay;
pub mod software;

pub use camera::MinimapCamera;
pub use software::{Canvas, DrawCommand, DrawList, SoftwareTextures};

use crate::codec::{Color, Rect, Size};

/// Opaque texture id handed out by a [`TextureCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

pub trait TextureCache {
    /// Build a texture from `size.area()` row-major RGBA pixels
    fn new_texture(&mut self, size: Size, pixels: &[Color]) -> TextureHandle;

    fn release_texture(&mut self, handle: TextureHandle);

    fn texture_size(&self, handle: TextureHandle) -> Option<Size>;

    /// Look up (and cache) a named texture such as a sprite atlas
    fn load_texture(&mut self, path: &str) -> Option<TextureHandle>;
}

pub trait DrawQueue {
    /// Number of draw calls queued so far
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add_filled_rect(&mut self, dest: Rect, color: Color);

    fn add_textured_rect(&mut self, dest: Rect, texture: TextureHandle, src: Rect);

    /// Clip every draw call queued from index `start` onwards to `clip`
    fn set_clip(&mut self, start: usize, clip: Rect);
}
