//! Event loop integration
//!
//! Backend events reach the compositor through a calloop channel and are
//! handled one at a time, each running to completion.

use std::time::Duration;

use calloop::channel::{self, Sender};
use calloop::{EventLoop as CalLoop, LoopHandle, LoopSignal};
use log::{debug, error, trace};

use super::BackendEvent;
use crate::compositor::CompositorState;
use crate::renderer::Renderer;

/// Loop state: the compositor and the renderer drawing its outputs
pub struct Server<R> {
    pub state: CompositorState,
    pub renderer: R,
}

impl<R: Renderer> Server<R> {
    pub fn new(state: CompositorState, renderer: R) -> Self {
        Self { state, renderer }
    }

    /// Apply one backend event
    pub fn handle_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::OutputAdded(output) => {
                self.state.output_added(&output);
            }
            BackendEvent::OutputRemoved { name } => {
                self.state.output_removed(&name);
            }
            BackendEvent::Frame { name } => match self.state.outputs.find_by_name(&name) {
                Some(id) => {
                    if let Some(stats) = self.state.render_output(id, &mut self.renderer) {
                        trace!("{}: {:?}", name, stats);
                    }
                }
                None => debug!("Frame for unknown output {}", name),
            },
        }
    }
}

/// Trellis event loop wrapper
pub struct EventLoop<R: 'static> {
    /// Calloop event loop
    event_loop: CalLoop<'static, Server<R>>,
    /// Loop signal for waking/stopping
    signal: LoopSignal,
    /// Sending half of the backend event channel
    sender: Sender<BackendEvent>,
}

impl<R: Renderer + 'static> EventLoop<R> {
    /// Create a new event loop
    pub fn new() -> anyhow::Result<Self> {
        let event_loop = CalLoop::try_new()?;
        let signal = event_loop.get_signal();

        let (sender, events) = channel::channel();
        event_loop
            .handle()
            .insert_source(events, |event, _, server: &mut Server<R>| {
                if let channel::Event::Msg(event) = event {
                    server.handle_event(event);
                }
            })
            .map_err(|e| anyhow::anyhow!("Failed to register backend events: {}", e.error))?;

        Ok(Self {
            event_loop,
            signal,
            sender,
        })
    }

    /// Get a handle to register event sources
    pub fn handle(&self) -> LoopHandle<'static, Server<R>> {
        self.event_loop.handle()
    }

    /// Sender for backend events
    pub fn sender(&self) -> Sender<BackendEvent> {
        self.sender.clone()
    }

    /// Get the loop signal for waking
    pub fn signal(&self) -> LoopSignal {
        self.signal.clone()
    }

    /// Run one iteration of the event loop
    pub fn dispatch(
        &mut self,
        timeout: Option<Duration>,
        server: &mut Server<R>,
    ) -> anyhow::Result<()> {
        self.event_loop.dispatch(timeout, server)?;
        Ok(())
    }

    /// Run the event loop until stopped
    pub fn run(&mut self, server: &mut Server<R>) -> anyhow::Result<()> {
        debug!("Starting event loop");

        if let Err(e) = self.event_loop.run(None, server, |_| {}) {
            error!("Event loop error: {}", e);
            return Err(e.into());
        }
        debug!("Event loop stopped");
        Ok(())
    }

    /// Stop the event loop
    pub fn stop(&self) {
        self.signal.stop();
    }

    /// Wake the event loop from another thread
    pub fn wake(&self) {
        self.signal.wakeup();
    }
}
