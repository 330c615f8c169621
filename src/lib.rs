//! Trellis - a Wayland compositing core
//!
//! Trellis tracks hot-plugged outputs in a shared layout and composites
//! client surface trees onto them, one textured quad per surface. It
//! drives a pluggable renderer and delivers frame callbacks for every
//! surface it draws.
//!
//! # Architecture
//!
//! - **Compositor Core**: Output registry and layout, surfaces, views
//! - **Renderer**: Transform builder and per-output frame composition
//! - **Input**: Seats, cursors and cursor themes
//! - **Backend**: calloop event loop and a headless backend
//!
//! # Example
//!
//! ```no_run
//! use trellis::backend::headless::{virtual_output, RecordingRenderer};
//! use trellis::compositor::CompositorState;
//! use trellis::config::Config;
//!
//! let mut state = CompositorState::new(Config::default());
//! let output = state.output_added(&virtual_output("HEADLESS-1", 1920, 1080));
//! state.render_output(output, &mut RecordingRenderer::new());
//! ```

pub mod backend;
pub mod compositor;
pub mod config;
pub mod input;
pub mod renderer;
