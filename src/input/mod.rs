//! Input handling module
//!
//! This module provides seats, cursors and cursor themes.

pub mod cursor;
pub mod seat;

pub use cursor::{
    Cursor, CursorError, CursorImage, CursorTheme, XcursorManager, XcursorTheme, DEFAULT_CURSOR,
    DEFAULT_SIZE,
};
pub use seat::{DragIcon, Seat};
