//! Output/display management
//!
//! This module tracks hot-plugged displays, their available modes and the
//! device-space transform used to draw onto them.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bitflags::bitflags;
use kurbo::Affine;
use log::{debug, warn};
use wayland_server::protocol::wl_output;

use crate::backend::BackendOutput;

/// Unique identifier for outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(pub u64);

impl OutputId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        OutputId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Output transform (rotation/flip)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputTransform {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
    Flipped,
    Flipped90,
    Flipped180,
    Flipped270,
}

impl OutputTransform {
    /// Whether width and height trade places under this transform
    pub fn is_rotated_90(&self) -> bool {
        matches!(
            self,
            OutputTransform::Rotate90
                | OutputTransform::Rotate270
                | OutputTransform::Flipped90
                | OutputTransform::Flipped270
        )
    }

    /// Apply the transform to a size
    pub fn transform_size(&self, width: i32, height: i32) -> (i32, i32) {
        if self.is_rotated_90() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Rotation/flip in normalized device coordinates
    pub fn matrix(&self) -> Affine {
        match self {
            OutputTransform::Normal => Affine::IDENTITY,
            OutputTransform::Rotate90 => Affine::rotate(FRAC_PI_2),
            OutputTransform::Rotate180 => Affine::rotate(PI),
            OutputTransform::Rotate270 => Affine::rotate(3.0 * FRAC_PI_2),
            OutputTransform::Flipped => Affine::FLIP_X,
            OutputTransform::Flipped90 => Affine::rotate(FRAC_PI_2) * Affine::FLIP_X,
            OutputTransform::Flipped180 => Affine::rotate(PI) * Affine::FLIP_X,
            OutputTransform::Flipped270 => Affine::rotate(3.0 * FRAC_PI_2) * Affine::FLIP_X,
        }
    }
}

impl From<OutputTransform> for wl_output::Transform {
    fn from(transform: OutputTransform) -> Self {
        match transform {
            OutputTransform::Normal => wl_output::Transform::Normal,
            OutputTransform::Rotate90 => wl_output::Transform::_90,
            OutputTransform::Rotate180 => wl_output::Transform::_180,
            OutputTransform::Rotate270 => wl_output::Transform::_270,
            OutputTransform::Flipped => wl_output::Transform::Flipped,
            OutputTransform::Flipped90 => wl_output::Transform::Flipped90,
            OutputTransform::Flipped180 => wl_output::Transform::Flipped180,
            OutputTransform::Flipped270 => wl_output::Transform::Flipped270,
        }
    }
}

bitflags! {
    /// Mode flags, as advertised through wl_output::mode
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModeFlags: u32 {
        const CURRENT = 1;
        const PREFERRED = 2;
    }
}

impl From<ModeFlags> for wl_output::Mode {
    fn from(flags: ModeFlags) -> Self {
        wl_output::Mode::from_bits_truncate(flags.bits())
    }
}

/// An output mode (resolution + refresh rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMode {
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
    /// Refresh rate in mHz (e.g., 60000 for 60Hz)
    pub refresh: i32,
    pub flags: ModeFlags,
}

impl OutputMode {
    /// Create a mode with no flags set
    pub fn new(width: i32, height: i32, refresh: i32) -> Self {
        Self {
            width,
            height,
            refresh,
            flags: ModeFlags::empty(),
        }
    }

    /// Mark this mode as preferred by the display
    pub fn preferred(mut self) -> Self {
        self.flags |= ModeFlags::PREFERRED;
        self
    }
}

/// Outcome of searching the mode list for a configured mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeMatch {
    /// Resolution and refresh rate both matched
    Exact(usize),
    /// Only the resolution matched
    Resolution(usize),
}

impl ModeMatch {
    pub fn index(&self) -> usize {
        match *self {
            ModeMatch::Exact(i) | ModeMatch::Resolution(i) => i,
        }
    }
}

/// Errors raised while configuring an output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
    #[error("Configured mode {width}x{height}@{refresh}mHz for {output} not available")]
    ModeUnavailable {
        output: String,
        width: i32,
        height: i32,
        refresh: i32,
    },
    #[error("Mode index {0} out of range")]
    InvalidMode(usize),
}

/// Software cursor registration on an output
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutputCursor {
    /// Output-local position in device pixels
    pub x: f64,
    pub y: f64,
    /// Cursor lies within this output
    pub visible: bool,
}

/// A display output (monitor)
#[derive(Debug)]
pub struct Output {
    /// Unique identifier
    pub id: OutputId,
    /// Output name (e.g., "DP-1"); the stable identity used for configuration
    pub name: String,
    /// Manufacturer name
    pub make: String,
    /// Model name
    pub model: String,
    /// Serial number
    pub serial: String,
    /// Physical size in millimeters
    pub physical_width: i32,
    pub physical_height: i32,
    /// Native size in pixels (follows the current mode)
    pub width: i32,
    pub height: i32,
    /// Position in layout space
    pub lx: i32,
    pub ly: i32,
    /// Transform applied to output
    pub transform: OutputTransform,
    /// Available modes
    pub modes: Vec<OutputMode>,
    /// Current mode index
    pub current_mode: Option<usize>,
    /// Scale factor
    pub scale: f64,
    /// Cursor state on this output
    pub cursor: OutputCursor,
    /// Time of the last rendered frame
    pub last_frame: Duration,
}

impl Output {
    /// Create a new output
    pub fn new(name: String) -> Self {
        Self {
            id: OutputId::new(),
            name,
            make: String::new(),
            model: String::new(),
            serial: String::new(),
            physical_width: 0,
            physical_height: 0,
            width: 0,
            height: 0,
            lx: 0,
            ly: 0,
            transform: OutputTransform::Normal,
            modes: Vec::new(),
            current_mode: None,
            scale: 1.0,
            cursor: OutputCursor::default(),
            last_frame: Duration::ZERO,
        }
    }

    /// Create the record for an output reported by the backend
    pub fn from_backend(backend: &BackendOutput, now: Duration) -> Self {
        let mut output = Self::new(backend.name.clone());
        output.make = backend.make.clone();
        output.model = backend.model.clone();
        output.serial = backend.serial.clone();
        output.physical_width = backend.physical_width;
        output.physical_height = backend.physical_height;
        output.width = backend.width;
        output.height = backend.height;
        output.modes = backend.modes.clone();
        for mode in &mut output.modes {
            mode.flags.remove(ModeFlags::CURRENT);
        }
        output.last_frame = now;
        output
    }

    /// Get the current mode
    pub fn current_mode(&self) -> Option<&OutputMode> {
        self.current_mode.and_then(|i| self.modes.get(i))
    }

    /// Add a mode
    pub fn add_mode(&mut self, mode: OutputMode) {
        self.modes.push(mode);
    }

    /// The mode to use when nothing is configured: the last mode the
    /// display flagged as preferred, else the last one reported.
    pub fn preferred_mode(&self) -> Option<usize> {
        self.modes
            .iter()
            .rposition(|m| m.flags.contains(ModeFlags::PREFERRED))
            .or_else(|| self.modes.len().checked_sub(1))
    }

    /// Switch to the mode at `index`
    pub fn set_mode(&mut self, index: usize) -> Result<(), OutputError> {
        let mode = *self.modes.get(index).ok_or(OutputError::InvalidMode(index))?;

        if let Some(prev) = self.current_mode.and_then(|i| self.modes.get_mut(i)) {
            prev.flags.remove(ModeFlags::CURRENT);
        }
        self.modes[index].flags.insert(ModeFlags::CURRENT);
        self.current_mode = Some(index);
        self.width = mode.width;
        self.height = mode.height;

        debug!(
            "Output {} mode set to {}x{}@{}mHz",
            self.name, mode.width, mode.height, mode.refresh
        );
        Ok(())
    }

    /// Search for a mode of the given resolution.
    ///
    /// The first mode matching resolution and refresh rate wins; otherwise
    /// the last mode with the right resolution is returned.
    pub fn find_mode(
        &self,
        width: i32,
        height: i32,
        refresh: i32,
    ) -> Result<ModeMatch, OutputError> {
        let mut best = None;
        for (i, mode) in self.modes.iter().enumerate() {
            if mode.width == width && mode.height == height {
                if mode.refresh == refresh {
                    return Ok(ModeMatch::Exact(i));
                }
                best = Some(ModeMatch::Resolution(i));
            }
        }

        best.ok_or_else(|| OutputError::ModeUnavailable {
            output: self.name.clone(),
            width,
            height,
            refresh,
        })
    }

    /// Apply a configured mode; falls back to any mode of the same resolution.
    pub fn set_configured_mode(
        &mut self,
        width: i32,
        height: i32,
        refresh: i32,
    ) -> Result<ModeMatch, OutputError> {
        let found = self.find_mode(width, height, refresh)?;
        if let ModeMatch::Resolution(i) = found {
            warn!(
                "No {}x{}@{}mHz mode for {}, using {}mHz",
                width, height, refresh, self.name, self.modes[i].refresh
            );
        }
        self.set_mode(found.index())?;
        Ok(found)
    }

    /// Set the scale factor
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        } else {
            warn!("Ignoring invalid scale {} for {}", scale, self.name);
        }
    }

    /// Set the output transform
    pub fn set_transform(&mut self, transform: OutputTransform) {
        self.transform = transform;
    }

    /// Set the position reported to clients
    pub fn set_position(&mut self, lx: i32, ly: i32) {
        self.lx = lx;
        self.ly = ly;
    }

    /// Size in device pixels after the output transform
    pub fn transformed_resolution(&self) -> (i32, i32) {
        self.transform.transform_size(self.width, self.height)
    }

    /// Size in layout space: transformed resolution divided by scale
    pub fn effective_resolution(&self) -> (i32, i32) {
        let (width, height) = self.transformed_resolution();
        (
            (f64::from(width) / self.scale) as i32,
            (f64::from(height) / self.scale) as i32,
        )
    }

    /// Maps device pixels of this output to normalized device coordinates,
    /// including the output's rotation/flip.
    pub fn transform_matrix(&self) -> Affine {
        let (width, height) = self.transformed_resolution();
        if width <= 0 || height <= 0 {
            return self.transform.matrix();
        }

        let projection = Affine::new([
            2.0 / f64::from(width),
            0.0,
            0.0,
            -2.0 / f64::from(height),
            -1.0,
            1.0,
        ]);
        self.transform.matrix() * projection
    }
}

/// Manager for all outputs
#[derive(Debug)]
pub struct OutputManager {
    outputs: HashMap<OutputId, Output>,
}

impl OutputManager {
    /// Create a new output manager
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
        }
    }

    /// Add an output
    pub fn add(&mut self, output: Output) -> OutputId {
        let id = output.id;
        self.outputs.insert(id, output);
        id
    }

    /// Get an output by ID
    pub fn get(&self, id: OutputId) -> Option<&Output> {
        self.outputs.get(&id)
    }

    /// Get a mutable output by ID
    pub fn get_mut(&mut self, id: OutputId) -> Option<&mut Output> {
        self.outputs.get_mut(&id)
    }

    /// Find an output by its backend name
    pub fn find_by_name(&self, name: &str) -> Option<OutputId> {
        self.outputs
            .values()
            .find(|output| output.name == name)
            .map(|output| output.id)
    }

    /// Remove an output
    pub fn remove(&mut self, id: OutputId) -> Option<Output> {
        self.outputs.remove(&id)
    }

    /// Get all outputs
    pub fn iter(&self) -> impl Iterator<Item = (&OutputId, &Output)> {
        self.outputs.iter()
    }

    /// Get count of outputs
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}
