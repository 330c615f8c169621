//! Compositor core module
//!
//! This module contains the core compositor logic including:
//! - Global compositor state and the output registry
//! - Output modes, transforms and the shared layout
//! - Surface trees and frame callbacks
//! - Views and their popup trees

pub mod geometry;
pub mod layout;
pub mod output;
pub mod state;
pub mod surface;
pub mod view;

pub use geometry::Rect;
pub use layout::OutputLayout;
pub use output::{
    ModeFlags, Output, OutputError, OutputId, OutputManager, OutputMode, OutputTransform,
};
pub use state::{CompositorState, ViewHit};
pub use surface::{
    BufferInfo, FrameCallback, Surface, SurfaceError, SurfaceId, SurfaceManager, SurfaceRole,
};
pub use view::{View, ViewId, ViewKind};
