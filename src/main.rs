//! Trellis - a Wayland compositing core
//!
//! This entry point runs the compositor headless: one virtual output,
//! one test window and a frame timer, for a fixed number of frames.

use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use log::info;
use trellis::backend::headless::{virtual_output, RecordingRenderer};
use trellis::backend::{BackendEvent, EventLoop, Server};
use trellis::compositor::{BufferInfo, CompositorState, View, ViewKind};
use trellis::config::Config;

/// Frame interval of the virtual output
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const OUTPUT_NAME: &str = "HEADLESS-1";

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let frames: u32 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 60,
    };

    info!("Starting Trellis compositor");

    let mut state = CompositorState::new(Config::default());
    let surface = state.surfaces.create_surface();
    if let Some(window) = state.surfaces.get_mut(surface) {
        window.attach(Some(BufferInfo::new(640, 480)));
        window.commit();
    }
    state.add_view(View::new(ViewKind::Xwayland { surface }).at(100.0, 100.0));

    let mut server = Server::new(state, RecordingRenderer::new());
    let mut event_loop = EventLoop::new()?;

    let sender = event_loop.sender();
    sender.send(BackendEvent::OutputAdded(virtual_output(OUTPUT_NAME, 1920, 1080)))?;

    let signal = event_loop.signal();
    let mut remaining = frames;
    event_loop
        .handle()
        .insert_source(Timer::from_duration(FRAME_INTERVAL), move |_, _, _| {
            if remaining == 0 {
                signal.stop();
                return TimeoutAction::Drop;
            }
            remaining -= 1;
            if sender
                .send(BackendEvent::Frame {
                    name: OUTPUT_NAME.to_string(),
                })
                .is_err()
            {
                signal.stop();
                return TimeoutAction::Drop;
            }
            TimeoutAction::ToDuration(FRAME_INTERVAL)
        })
        .map_err(|e| anyhow::anyhow!("Failed to register frame timer: {}", e.error))?;

    event_loop.run(&mut server)?;

    info!(
        "Presented {} frames, last at {:?}",
        server.renderer.frames_presented(),
        server.state.last_frame
    );
    Ok(())
}
