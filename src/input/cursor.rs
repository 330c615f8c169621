//! Cursor position and xcursor theme handling

use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;

/// Name of the default pointer image
pub const DEFAULT_CURSOR: &str = "left_ptr";

/// Theme used when `XCURSOR_THEME` is unset
pub const DEFAULT_THEME: &str = "default";

/// Nominal cursor size used when `XCURSOR_SIZE` is unset
pub const DEFAULT_SIZE: u32 = 24;

/// Errors from loading cursor themes
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    #[error("Cursor theme {theme} has no {icon} image (scale {scale})")]
    ThemeUnavailable {
        theme: String,
        icon: String,
        scale: f64,
    },
    #[error("Invalid cursor scale {0}")]
    InvalidScale(f64),
    #[error("Failed to read cursor file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed cursor file {0:?}")]
    Malformed(PathBuf),
}

/// One cursor image at a nominal size
#[derive(Debug, Clone, PartialEq)]
pub struct CursorImage {
    pub name: String,
    /// Output scale the image was picked for
    pub scale: f64,
    /// Nominal size the theme lists the image under
    pub size: u32,
    pub width: u32,
    pub height: u32,
    pub hotspot_x: u32,
    pub hotspot_y: u32,
    /// RGBA pixels, row-major
    pub pixels: Vec<u8>,
}

impl CursorImage {
    fn from_xcursor(name: &str, image: xcursor::parser::Image) -> Self {
        Self {
            name: name.to_string(),
            scale: 1.0,
            size: image.size,
            width: image.width,
            height: image.height,
            hotspot_x: image.xhot,
            hotspot_y: image.yhot,
            pixels: image.pixels_rgba,
        }
    }
}

/// Source of cursor images
pub trait CursorTheme: fmt::Debug {
    /// Theme name
    fn name(&self) -> &str;

    /// Every image of `icon` the theme ships, across its nominal sizes.
    /// An empty list means the theme lacks the icon.
    fn load_icon(&self, icon: &str) -> Result<Vec<CursorImage>, CursorError>;
}

/// An installed xcursor theme, looked up in the XCURSOR_PATH directories
#[derive(Debug, Clone)]
pub struct XcursorTheme {
    name: String,
}

impl XcursorTheme {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Theme named by `XCURSOR_THEME`, else the default theme
    pub fn from_env() -> Self {
        Self::new(std::env::var("XCURSOR_THEME").unwrap_or_else(|_| DEFAULT_THEME.to_string()))
    }
}

impl CursorTheme for XcursorTheme {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_icon(&self, icon: &str) -> Result<Vec<CursorImage>, CursorError> {
        let theme = xcursor::CursorTheme::load(&self.name);
        let Some(path) = theme.load_icon(icon) else {
            return Ok(Vec::new());
        };

        let data = std::fs::read(&path).map_err(|source| CursorError::Io {
            path: path.clone(),
            source,
        })?;
        parse_icon(icon, &path, &data)
    }
}

fn parse_icon(icon: &str, path: &Path, data: &[u8]) -> Result<Vec<CursorImage>, CursorError> {
    let images = xcursor::parser::parse_xcursor(data)
        .ok_or_else(|| CursorError::Malformed(path.to_path_buf()))?;
    Ok(images
        .into_iter()
        .map(|image| CursorImage::from_xcursor(icon, image))
        .collect())
}

/// Loads a cursor theme at the scales of the outputs it is shown on.
///
/// At each scale the image closest to `size * scale` is used.
#[derive(Debug)]
pub struct XcursorManager {
    theme: Box<dyn CursorTheme>,
    size: u32,
    /// Default image per loaded scale
    loaded: Vec<CursorImage>,
}

impl XcursorManager {
    /// Create a manager for `theme` at nominal size `size`
    pub fn new(theme: impl CursorTheme + 'static, size: u32) -> Self {
        Self {
            theme: Box::new(theme),
            size,
            loaded: Vec::new(),
        }
    }

    /// Theme and size from `XCURSOR_THEME` and `XCURSOR_SIZE`
    pub fn from_env() -> Self {
        let size = std::env::var("XCURSOR_SIZE")
            .ok()
            .and_then(|size| size.parse().ok())
            .unwrap_or(DEFAULT_SIZE);
        Self::new(XcursorTheme::from_env(), size)
    }

    /// Theme name
    pub fn theme(&self) -> &str {
        self.theme.name()
    }

    fn nominal_size(&self, scale: f64) -> u32 {
        (f64::from(self.size) * scale).round() as u32
    }

    /// Load the theme at `scale`. Loading an already loaded scale is a no-op.
    pub fn load(&mut self, scale: f64) -> Result<(), CursorError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CursorError::InvalidScale(scale));
        }
        if self.loaded.iter().any(|image| image.scale == scale) {
            return Ok(());
        }

        let image = self.image(DEFAULT_CURSOR, scale)?;
        debug!(
            "Loaded cursor theme {} at scale {} (size {})",
            self.theme.name(),
            scale,
            image.size
        );
        self.loaded.push(image);
        Ok(())
    }

    /// Scales the theme is loaded at
    pub fn loaded_scales(&self) -> Vec<f64> {
        self.loaded.iter().map(|image| image.scale).collect()
    }

    /// Default cursor image for every loaded scale
    pub fn loaded_images(&self) -> &[CursorImage] {
        &self.loaded
    }

    /// Resolve a cursor image for `scale`, picking the nominal size
    /// closest to the scaled theme size
    pub fn image(&self, name: &str, scale: f64) -> Result<CursorImage, CursorError> {
        let size = self.nominal_size(scale);
        let images = self.theme.load_icon(name)?;

        let mut image = images
            .into_iter()
            .min_by_key(|image| image.size.abs_diff(size))
            .ok_or_else(|| CursorError::ThemeUnavailable {
                theme: self.theme.name().to_string(),
                icon: name.to_string(),
                scale,
            })?;
        image.scale = scale;
        Ok(image)
    }
}

impl Default for XcursorManager {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Seat cursor
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    /// Position in layout space
    x: f64,
    y: f64,
    /// Image per loaded scale
    images: Vec<CursorImage>,
}

impl Cursor {
    /// Create a cursor at the layout origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to an absolute layout position
    pub fn warp(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Get current position
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Replace the images shown for each scale
    pub fn set_images(&mut self, images: Vec<CursorImage>) {
        self.images = images;
    }

    /// Image to show on an output of the given scale
    pub fn image_for_scale(&self, scale: f64) -> Option<&CursorImage> {
        self.images.iter().find(|image| image.scale == scale)
    }
}
