//! Rendering module
//!
//! The compositor core does not rasterize anything itself. It walks the
//! scene and issues one textured-quad draw per visible surface through the
//! [`Renderer`] contract; a GPU backend implements that contract.

pub mod frame;
pub mod matrix;

pub use frame::{render_frame, FrameStats, MAX_TREE_DEPTH};
pub use matrix::{rotated_bounds, surface_matrix, surface_transform};

use kurbo::Affine;

use crate::compositor::{Output, Surface, SurfaceId};

/// Handle to the GPU texture holding a surface's current buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    pub surface: SurfaceId,
    /// Buffer size in pixels
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Texture for a surface's current buffer, if it has one
    pub fn for_surface(surface: &Surface) -> Option<Self> {
        let buffer = surface.buffer.as_ref()?;
        Some(Self {
            surface: surface.id,
            width: buffer.width,
            height: buffer.height,
        })
    }
}

/// Rendering backend contract.
///
/// Calls arrive as `begin`, any number of `render_with_matrix`, `end`,
/// then `swap_buffers`, all for the same output.
pub trait Renderer {
    /// Start drawing a frame on `output`
    fn begin(&mut self, output: &Output);

    /// Draw `texture` as the unit square mapped through `matrix` into
    /// normalized device coordinates
    fn render_with_matrix(&mut self, texture: &Texture, matrix: &Affine);

    /// Finish the frame
    fn end(&mut self);

    /// Present the finished frame
    fn swap_buffers(&mut self, output: &Output);
}
