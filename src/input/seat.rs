//! Input seat: cursor, cursor theme and drag icons

use log::debug;

use super::cursor::{Cursor, CursorError, XcursorManager};
use crate::compositor::{OutputLayout, SurfaceId};

/// Icon surface following the cursor during drag-and-drop
#[derive(Debug, Clone, Copy)]
pub struct DragIcon {
    pub surface: SurfaceId,
    /// Offset from the cursor position
    pub sx: f64,
    pub sy: f64,
    /// Only mapped icons are drawn
    pub mapped: bool,
}

/// An input seat
#[derive(Debug)]
pub struct Seat {
    /// Seat name
    name: String,
    /// Pointer cursor
    cursor: Cursor,
    /// Cursor theme
    xcursor: XcursorManager,
    /// Active drag-and-drop icons
    drag_icons: Vec<DragIcon>,
}

impl Seat {
    /// Create a new seat
    pub fn new() -> Self {
        Self::with_name("seat0".to_string())
    }

    /// Create a seat with a specific name
    pub fn with_name(name: String) -> Self {
        Self {
            name,
            cursor: Cursor::new(),
            xcursor: XcursorManager::default(),
            drag_icons: Vec::new(),
        }
    }

    /// Use a different cursor theme
    pub fn with_xcursor(mut self, xcursor: XcursorManager) -> Self {
        self.xcursor = xcursor;
        self
    }

    /// Get the seat name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get cursor reference
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Get mutable cursor reference
    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    /// Get the cursor theme
    pub fn xcursor(&self) -> &XcursorManager {
        &self.xcursor
    }

    /// Load the cursor theme for an output scale
    pub fn reload_cursor_theme(&mut self, scale: f64) -> Result<(), CursorError> {
        self.xcursor.load(scale)
    }

    /// Keep the cursor inside the layout
    pub fn configure_cursor(&mut self, layout: &OutputLayout) {
        if layout.is_empty() {
            return;
        }
        let (x, y) = self.cursor.position();
        let (cx, cy) = layout.closest_point(None, x, y);
        if (cx, cy) != (x, y) {
            debug!("Seat {}: cursor clamped to {}x{}", self.name, cx, cy);
        }
        self.cursor.warp(cx, cy);
    }

    /// Re-apply the default cursor image at every loaded scale
    pub fn configure_xcursor(&mut self) {
        self.cursor.set_images(self.xcursor.loaded_images().to_vec());
    }

    /// Start showing a drag icon
    pub fn add_drag_icon(&mut self, icon: DragIcon) {
        self.drag_icons.push(icon);
    }

    /// Stop showing the drag icon for a surface
    pub fn remove_drag_icon(&mut self, surface: SurfaceId) {
        self.drag_icons.retain(|icon| icon.surface != surface);
    }

    /// Drag icons in stacking order
    pub fn drag_icons(&self) -> &[DragIcon] {
        &self.drag_icons
    }
}

impl Default for Seat {
    fn default() -> Self {
        Self::new()
    }
}
