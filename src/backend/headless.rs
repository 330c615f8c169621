//! Headless backend
//!
//! Virtual outputs, a renderer that records draw calls instead of
//! touching a GPU, and a cursor theme that needs no installed icons.
//! Used by the binary when no display hardware is driven and by tests.

use kurbo::Affine;
use log::trace;

use super::BackendOutput;
use crate::compositor::{Output, OutputMode};
use crate::input::{CursorError, CursorImage, CursorTheme, DEFAULT_SIZE};
use crate::renderer::{Renderer, Texture};

/// One recorded `render_with_matrix` call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture: Texture,
    pub matrix: Affine,
}

/// Renderer recording every draw call of the current frame
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    draws: Vec<DrawCall>,
    frames_begun: u64,
    frames_presented: u64,
    in_frame: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw calls of the most recent frame
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn frames_begun(&self) -> u64 {
        self.frames_begun
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Whether `begin` was called without a matching `end`
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }
}

impl Renderer for RecordingRenderer {
    fn begin(&mut self, output: &Output) {
        trace!("Begin frame on {}", output.name);
        self.draws.clear();
        self.frames_begun += 1;
        self.in_frame = true;
    }

    fn render_with_matrix(&mut self, texture: &Texture, matrix: &Affine) {
        trace!("Draw {:?} with {:?}", texture.surface, matrix.as_coeffs());
        self.draws.push(DrawCall {
            texture: *texture,
            matrix: *matrix,
        });
    }

    fn end(&mut self) {
        self.in_frame = false;
    }

    fn swap_buffers(&mut self, output: &Output) {
        trace!("Present {} draw calls on {}", self.draws.len(), output.name);
        self.frames_presented += 1;
    }
}

/// Describe a virtual output with a single preferred 60Hz mode
pub fn virtual_output(name: impl Into<String>, width: i32, height: i32) -> BackendOutput {
    let mut output = BackendOutput::new(name, width, height);
    output.make = "trellis".to_string();
    output.model = "headless".to_string();
    output.with_mode(OutputMode::new(width, height, 60000).preferred())
}

/// Cursor theme with square, opaque images at a fixed list of sizes
#[derive(Debug, Clone)]
pub struct FixedCursorTheme {
    name: String,
    sizes: Vec<u32>,
    /// Hotspot at the default size, scaled with the image
    hotspot: (u32, u32),
}

impl FixedCursorTheme {
    pub fn new(name: impl Into<String>, sizes: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            sizes,
            hotspot: (4, 4),
        }
    }

    pub fn with_hotspot(mut self, x: u32, y: u32) -> Self {
        self.hotspot = (x, y);
        self
    }
}

impl Default for FixedCursorTheme {
    fn default() -> Self {
        Self::new("headless", vec![24, 48, 72, 96])
    }
}

impl CursorTheme for FixedCursorTheme {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_icon(&self, icon: &str) -> Result<Vec<CursorImage>, CursorError> {
        Ok(self
            .sizes
            .iter()
            .map(|&size| CursorImage {
                name: icon.to_string(),
                scale: 1.0,
                size,
                width: size,
                height: size,
                hotspot_x: self.hotspot.0 * size / DEFAULT_SIZE,
                hotspot_y: self.hotspot.1 * size / DEFAULT_SIZE,
                pixels: vec![0xff; (size * size * 4) as usize],
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::SurfaceId;

    #[test]
    fn test_virtual_output() {
        let output = virtual_output("HEADLESS-1", 1280, 720);
        assert_eq!(output.name, "HEADLESS-1");
        assert_eq!(output.modes.len(), 1);
        assert_eq!((output.modes[0].width, output.modes[0].refresh), (1280, 60000));
    }

    #[test]
    fn test_recording_renderer_resets_per_frame() {
        let output = Output::new("HEADLESS-1".to_string());
        let texture = Texture {
            surface: SurfaceId(1),
            width: 4,
            height: 4,
        };

        let mut renderer = RecordingRenderer::new();
        renderer.begin(&output);
        renderer.render_with_matrix(&texture, &Affine::IDENTITY);
        assert!(renderer.in_frame());
        renderer.end();
        renderer.swap_buffers(&output);
        assert_eq!(renderer.draws().len(), 1);

        renderer.begin(&output);
        assert!(renderer.draws().is_empty());
        assert_eq!(renderer.frames_begun(), 2);
        assert_eq!(renderer.frames_presented(), 1);
    }

    #[test]
    fn test_fixed_cursor_theme_sizes() {
        let theme = FixedCursorTheme::default();
        let images = theme.load_icon("left_ptr").unwrap();
        assert_eq!(images.len(), 4);
        assert_eq!(images[1].size, 48);
        assert_eq!((images[1].hotspot_x, images[1].hotspot_y), (8, 8));
        assert_eq!(images[1].pixels.len(), 48 * 48 * 4);
    }
}
