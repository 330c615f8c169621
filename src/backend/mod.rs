//! Backend module
//!
//! Hardware backends report hotplug and frame-ready notifications as
//! [`BackendEvent`]s. This module contains:
//! - Event loop integration with calloop
//! - A headless backend for running without display hardware

pub mod event_loop;
pub mod headless;

pub use event_loop::{EventLoop, Server};

use crate::compositor::OutputMode;

/// An output as reported by the backend on hotplug
#[derive(Debug, Clone, Default)]
pub struct BackendOutput {
    /// Connector name, the stable identity of the output
    pub name: String,
    pub make: String,
    pub model: String,
    pub serial: String,
    /// Physical size in millimeters
    pub physical_width: i32,
    pub physical_height: i32,
    /// Native size in pixels
    pub width: i32,
    pub height: i32,
    /// Modes in the order the display reported them
    pub modes: Vec<OutputMode>,
}

impl BackendOutput {
    /// Output with a name and native size and no modes
    pub fn new(name: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            ..Default::default()
        }
    }

    /// Add a reported mode
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.modes.push(mode);
        self
    }
}

/// Notifications from the backend
#[derive(Debug, Clone)]
pub enum BackendEvent {
    /// An output was plugged in
    OutputAdded(BackendOutput),
    /// An output was unplugged
    OutputRemoved { name: String },
    /// An output is ready for its next frame
    Frame { name: String },
}
