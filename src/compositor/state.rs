//! Global compositor state
//!
//! This module contains the desktop: the output registry and layout, the
//! surface arena, the view stack and the seats. Backend events are applied
//! here and frames are rendered from here.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::backend::BackendOutput;
use crate::compositor::geometry::Rect;
use crate::compositor::view::{
    View, ViewId, ViewKind, WlShellSurface, WlShellSurfaceState, XdgSurfaceV6,
};
use crate::compositor::{Output, OutputId, OutputLayout, OutputManager, SurfaceId, SurfaceManager};
use crate::config::Config;
use crate::input::Seat;
use crate::renderer::{render_frame, FrameStats, Renderer, MAX_TREE_DEPTH};

/// A hit from [`CompositorState::view_at`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewHit {
    pub view: ViewId,
    pub surface: SurfaceId,
    /// Point in the surface's local coordinates
    pub sx: f64,
    pub sy: f64,
}

/// The global compositor state
pub struct CompositorState {
    /// User output settings
    pub config: Config,

    /// Output manager - tracks displays/monitors
    pub outputs: OutputManager,

    /// Output positions in layout space
    pub layout: OutputLayout,

    /// Surface manager - tracks all wl_surfaces
    pub surfaces: SurfaceManager,

    /// Views in stacking order, back to front
    pub views: Vec<View>,

    /// Input seats
    pub seats: Vec<Seat>,

    /// Time of the most recent frame on any output
    pub last_frame: Duration,

    /// Zero point of the compositor clock
    clock: Instant,
}

impl CompositorState {
    /// Create a new compositor state with one default seat
    pub fn new(config: Config) -> Self {
        Self {
            config,
            outputs: OutputManager::new(),
            layout: OutputLayout::new(),
            surfaces: SurfaceManager::new(),
            views: Vec::new(),
            seats: vec![Seat::new()],
            last_frame: Duration::ZERO,
            clock: Instant::now(),
        }
    }

    /// Time since the compositor started, on a monotonic clock
    pub fn now(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Register a hot-plugged output.
    ///
    /// Picks the preferred mode, applies any configuration for the output's
    /// name, places it in the layout and reloads every seat's cursor theme
    /// at the output's scale. Configuration that cannot be honored is
    /// logged and skipped. An output already registered under the same
    /// name is replaced.
    pub fn output_added(&mut self, backend: &BackendOutput) -> OutputId {
        if self.outputs.find_by_name(&backend.name).is_some() {
            warn!("Output {} added again, replacing its record", backend.name);
            self.output_removed(&backend.name);
        }

        let mut output = Output::from_backend(backend, self.now());
        info!("Output {} added", output.name);
        debug!(
            "'{} {} {}' {}mm x {}mm",
            output.make, output.model, output.serial, output.physical_width, output.physical_height
        );

        if let Some(index) = output.preferred_mode() {
            if let Err(err) = output.set_mode(index) {
                error!("Failed to set default mode on {}: {}", output.name, err);
            }
        }

        let mut position = None;
        if let Some(config) = self.config.output(&output.name) {
            if let Some(mode) = &config.mode {
                let refresh = mode.refresh_mhz();
                if let Err(err) = output.set_configured_mode(mode.width, mode.height, refresh) {
                    error!("Configured mode for {} not available: {}", output.name, err);
                }
            }
            if let Some(scale) = config.scale {
                info!("Set {} scale to {}", output.name, scale);
                output.set_scale(scale);
            }
            if let Some(transform) = config.transform {
                output.set_transform(transform);
            }
            position = config.position;
        }

        let scale = output.scale;
        let size = output.effective_resolution();
        let id = self.outputs.add(output);
        match position {
            Some((x, y)) => self.layout.add(id, x, y, size),
            None => self.layout.add_auto(id, size),
        }
        self.sync_output_positions();

        for seat in &mut self.seats {
            if let Err(err) = seat.reload_cursor_theme(scale) {
                error!("Failed to load cursor theme for seat {}: {}", seat.name(), err);
            }
            seat.configure_cursor(&self.layout);
            seat.configure_xcursor();
        }
        self.update_output_cursors();

        id
    }

    /// Unregister an unplugged output. Unknown names are ignored.
    ///
    /// Returns whether an output was removed.
    pub fn output_removed(&mut self, name: &str) -> bool {
        let Some(id) = self.outputs.find_by_name(name) else {
            debug!("Ignoring removal of unknown output {}", name);
            return false;
        };

        self.layout.remove(id);
        self.outputs.remove(id);
        info!("Output {} removed", name);

        self.sync_output_positions();
        for seat in &mut self.seats {
            seat.configure_cursor(&self.layout);
        }
        self.update_output_cursors();
        true
    }

    /// Render a frame on an output at the current time
    pub fn render_output<R: Renderer>(
        &mut self,
        id: OutputId,
        renderer: &mut R,
    ) -> Option<FrameStats> {
        let when = self.now();
        self.render_output_at(id, renderer, when)
    }

    /// Render a frame on an output, stamping frame callbacks with `when`
    pub fn render_output_at<R: Renderer>(
        &mut self,
        id: OutputId,
        renderer: &mut R,
        when: Duration,
    ) -> Option<FrameStats> {
        let Some(output) = self.outputs.get(id) else {
            debug!("Frame for unknown output {:?}", id);
            return None;
        };

        let stats = render_frame(
            renderer,
            output,
            &self.layout,
            &mut self.surfaces,
            &self.views,
            &self.seats,
            when,
        );

        if let Some(output) = self.outputs.get_mut(id) {
            output.last_frame = when;
        }
        self.last_frame = when;
        Some(stats)
    }

    /// Add a view on top of the stack. Its root surface takes the role of
    /// the view's shell.
    pub fn add_view(&mut self, view: View) -> ViewId {
        let id = view.id;
        let surface = view.surface();
        if let Some(root) = self.surfaces.get_mut(surface) {
            if let Err(err) = root.set_role(view.role()) {
                warn!("View {:?}: surface {:?} keeps role {:?}: {}", id, surface, root.role, err);
            }
        }
        self.views.push(view);
        id
    }

    /// Remove a view from the stack
    pub fn remove_view(&mut self, id: ViewId) -> Option<View> {
        let index = self.views.iter().position(|view| view.id == id)?;
        Some(self.views.remove(index))
    }

    /// Topmost view with a surface under a layout-space point
    pub fn view_at(&self, lx: f64, ly: f64) -> Option<ViewHit> {
        self.views.iter().rev().find_map(|view| self.hit_view(view, lx, ly))
    }

    fn hit_view(&self, view: &View, lx: f64, ly: f64) -> Option<ViewHit> {
        // Drawn as a child of its parent, never on its own
        if let ViewKind::WlShell(shell) = &view.kind {
            if shell.state == WlShellSurfaceState::Popup {
                return None;
            }
        }
        let (width, height) = self.surfaces.get(view.surface())?.size();
        let mut sx = lx - view.x;
        let mut sy = ly - view.y;

        if view.rotation != 0.0 {
            // Undo the rotation about the view centre
            let ox = sx - width / 2.0;
            let oy = sy - height / 2.0;
            let (sin, cos) = f64::from(-view.rotation).sin_cos();
            sx = cos * ox - sin * oy + width / 2.0;
            sy = cos * oy + sin * ox + height / 2.0;
        }

        let popup_hit = match &view.kind {
            ViewKind::XdgShellV6(xdg) => self.xdg_popup_at(xdg, sx, sy),
            ViewKind::WlShell(shell) => self.wl_shell_popup_at(shell, sx, sy),
            ViewKind::Xwayland { .. } => None,
        };
        let (surface, sx, sy) =
            popup_hit.or_else(|| self.surfaces.surface_at(view.surface(), sx, sy))?;

        Some(ViewHit {
            view: view.id,
            surface,
            sx,
            sy,
        })
    }

    /// Topmost configured popup under a point local to `root`
    fn xdg_popup_at(&self, root: &XdgSurfaceV6, sx: f64, sy: f64) -> Option<(SurfaceId, f64, f64)> {
        // Front-most popups come last; collect pre-order and test in reverse
        let mut order = Vec::new();
        let mut stack: Vec<_> = root.popups.iter().rev().map(|p| (root, p, 0.0, 0.0, 0)).collect();
        while let Some((parent, popup, base_x, base_y, depth)) = stack.pop() {
            if !popup.configured {
                continue;
            }
            let x = base_x + f64::from(parent.geometry.x) + f64::from(popup.popup_geometry.x)
                - f64::from(popup.xdg.geometry.x);
            let y = base_y + f64::from(parent.geometry.y) + f64::from(popup.popup_geometry.y)
                - f64::from(popup.xdg.geometry.y);
            order.push((popup.xdg.surface, x, y));
            if depth < MAX_TREE_DEPTH {
                let children = popup.xdg.popups.iter().rev();
                stack.extend(children.map(|p| (&popup.xdg, p, x, y, depth + 1)));
            }
        }

        order
            .into_iter()
            .rev()
            .find_map(|(surface, x, y)| self.surfaces.surface_at(surface, sx - x, sy - y))
    }

    fn wl_shell_popup_at(
        &self,
        root: &WlShellSurface,
        sx: f64,
        sy: f64,
    ) -> Option<(SurfaceId, f64, f64)> {
        let mut order = Vec::new();
        let mut stack: Vec<_> = root.popups.iter().rev().map(|p| (p, 0.0, 0.0, 0)).collect();
        while let Some((shell, base_x, base_y, depth)) = stack.pop() {
            let (dx, dy) = shell.transient_offset();
            let x = base_x + f64::from(dx);
            let y = base_y + f64::from(dy);
            order.push((shell.surface, x, y));
            if depth < MAX_TREE_DEPTH {
                stack.extend(shell.popups.iter().rev().map(|p| (p, x, y, depth + 1)));
            }
        }

        order
            .into_iter()
            .rev()
            .find_map(|(surface, x, y)| self.surfaces.surface_at(surface, sx - x, sy - y))
    }

    /// Mirror layout positions into the output records
    fn sync_output_positions(&mut self) {
        for (id, rect) in self.layout.iter() {
            if let Some(output) = self.outputs.get_mut(id) {
                output.set_position(rect.x, rect.y);
            }
        }
    }

    /// Register the primary seat's cursor on every output
    fn update_output_cursors(&mut self) {
        let position = self.seats.first().map(|seat| seat.cursor().position());

        for (id, rect) in self.layout.iter() {
            let Some(output) = self.outputs.get_mut(id) else {
                continue;
            };
            match position {
                Some((x, y)) => {
                    output.cursor.x = (x - f64::from(rect.x)) * output.scale;
                    output.cursor.y = (y - f64::from(rect.y)) * output.scale;
                    output.cursor.visible = rect.contains_point(x, y);
                }
                None => output.cursor.visible = false,
            }
        }
    }

    /// Layout rectangles of all outputs
    pub fn output_boxes(&self) -> Vec<(OutputId, Rect)> {
        self.layout.iter().collect()
    }
}

impl Default for CompositorState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use kurbo::Point;

    use super::*;
    use crate::backend::headless::{virtual_output, FixedCursorTheme, RecordingRenderer};
    use crate::compositor::surface::testing::{DoneLog, RecordingCallback};
    use crate::compositor::view::{TransientState, XdgPopupV6};
    use crate::compositor::{BufferInfo, OutputMode, OutputTransform, SurfaceError, SurfaceRole};
    use crate::config::OutputConfig;
    use crate::input::XcursorManager;

    fn dual_refresh_output(name: &str) -> BackendOutput {
        BackendOutput::new(name, 1920, 1080)
            .with_mode(OutputMode::new(1920, 1080, 60000).preferred())
            .with_mode(OutputMode::new(1920, 1080, 144000))
    }

    fn state_with(config: OutputConfig) -> CompositorState {
        CompositorState::new(Config::new().with_output(config))
    }

    fn mapped_surface(state: &mut CompositorState, width: u32, height: u32) -> SurfaceId {
        let id = state.surfaces.create_surface();
        let surface = state.surfaces.get_mut(id).unwrap();
        surface.attach(Some(BufferInfo::new(width, height)));
        surface.commit();
        id
    }

    #[test]
    fn test_preferred_mode_by_default() {
        let mut state = CompositorState::default();
        let backend = BackendOutput::new("DP-1", 2560, 1440)
            .with_mode(OutputMode::new(1280, 720, 60000))
            .with_mode(OutputMode::new(2560, 1440, 60000).preferred())
            .with_mode(OutputMode::new(1920, 1080, 60000));
        let id = state.output_added(&backend);

        let output = state.outputs.get(id).unwrap();
        assert_eq!(output.current_mode().map(|m| m.width), Some(2560));
        assert_eq!(state.layout.get_box(id), Some(Rect::new(0, 0, 2560, 1440)));
    }

    #[test]
    fn test_last_reported_mode_without_preferred() {
        let mut state = CompositorState::default();
        let backend = BackendOutput::new("DP-1", 1920, 1080)
            .with_mode(OutputMode::new(1920, 1080, 60000))
            .with_mode(OutputMode::new(1280, 720, 60000));
        let id = state.output_added(&backend);

        let output = state.outputs.get(id).unwrap();
        assert_eq!(output.current_mode, Some(1));
        assert_eq!((output.width, output.height), (1280, 720));
    }

    #[test]
    fn test_configured_exact_refresh() {
        let mut state = state_with(OutputConfig::new("DP-1").with_mode(1920, 1080, 144.0));
        let id = state.output_added(&dual_refresh_output("DP-1"));

        let mode = state.outputs.get(id).unwrap().current_mode().copied().unwrap();
        assert_eq!(mode.refresh, 144000);
    }

    #[test]
    fn test_configured_refresh_falls_back_to_resolution() {
        let mut state = state_with(OutputConfig::new("DP-1").with_mode(1920, 1080, 75.0));
        let id = state.output_added(&dual_refresh_output("DP-1"));

        let mode = state.outputs.get(id).unwrap().current_mode().copied().unwrap();
        assert_eq!((mode.width, mode.height), (1920, 1080));
    }

    #[test]
    fn test_configured_missing_resolution_keeps_default() {
        let mut state = state_with(OutputConfig::new("DP-1").with_mode(800, 600, 60.0));
        let id = state.output_added(&dual_refresh_output("DP-1"));

        let mode = state.outputs.get(id).unwrap().current_mode().copied().unwrap();
        assert_eq!((mode.width, mode.refresh), (1920, 60000));
    }

    #[test]
    fn test_configured_scale_transform_position() {
        let mut state = state_with(
            OutputConfig::new("DP-1")
                .with_scale(2.0)
                .with_transform(OutputTransform::Rotate90)
                .with_position(100, 50),
        );
        let id = state.output_added(&dual_refresh_output("DP-1"));

        let output = state.outputs.get(id).unwrap();
        assert_eq!(output.scale, 2.0);
        assert_eq!(output.transform, OutputTransform::Rotate90);
        assert_eq!((output.lx, output.ly), (100, 50));
        assert_eq!(state.layout.get_box(id), Some(Rect::new(100, 50, 540, 960)));
    }

    #[test]
    fn test_auto_placed_outputs_do_not_overlap() {
        let mut state = state_with(OutputConfig::new("DP-1").with_position(0, 0));
        state.output_added(&virtual_output("DP-1", 1920, 1080));
        state.output_added(&virtual_output("DP-2", 1280, 1024));
        state.output_added(&virtual_output("DP-3", 2560, 1440));

        let boxes = state.output_boxes();
        assert_eq!(boxes.len(), 3);
        for (i, (_, a)) in boxes.iter().enumerate() {
            for (_, b) in &boxes[i + 1..] {
                assert!(a.intersection(b).is_none(), "{a:?} overlaps {b:?}");
            }
        }
        assert_eq!(boxes[1].1, Rect::new(1920, 0, 1280, 1024));
        assert_eq!(boxes[2].1.x, 3200);
    }

    #[test]
    fn test_config_without_position_is_auto_placed() {
        let mut state = state_with(OutputConfig::new("DP-2").with_scale(1.0));
        state.output_added(&virtual_output("DP-1", 1920, 1080));
        let id = state.output_added(&virtual_output("DP-2", 1920, 1080));
        assert_eq!(state.layout.get_box(id).map(|b| b.x), Some(1920));
    }

    #[test]
    fn test_readded_output_replaces_record() {
        let mut state = CompositorState::default();
        let old = state.output_added(&virtual_output("DP-1", 1920, 1080));
        state.output_added(&virtual_output("DP-2", 800, 600));
        let new = state.output_added(&virtual_output("DP-1", 1280, 720));

        assert_ne!(old, new);
        assert_eq!(state.outputs.len(), 2);
        assert_eq!(state.layout.len(), 2);
        assert!(state.outputs.get(old).is_none());
        assert!(state.layout.get_box(old).is_none());
        assert_eq!(state.outputs.find_by_name("DP-1"), Some(new));
        assert_eq!(state.layout.get_box(new), Some(Rect::new(800, 0, 1280, 720)));

        assert!(state.output_removed("DP-1"));
        assert!(state.outputs.find_by_name("DP-1").is_none());
    }

    #[test]
    fn test_remove_unknown_output_is_noop() {
        let mut state = CompositorState::default();
        let id = state.output_added(&virtual_output("DP-1", 1920, 1080));
        state.seats[0].cursor_mut().warp(300.0, 200.0);

        assert!(!state.output_removed("HDMI-A-1"));
        assert_eq!(state.layout.len(), 1);
        assert_eq!(state.outputs.len(), 1);
        assert!(state.layout.get_box(id).is_some());
        assert_eq!(state.seats[0].cursor().position(), (300.0, 200.0));
    }

    #[test]
    fn test_remove_repacks_layout() {
        let mut state = CompositorState::default();
        let first = state.output_added(&virtual_output("DP-1", 1920, 1080));
        let second = state.output_added(&virtual_output("DP-2", 1280, 720));
        state.seats[0].cursor_mut().warp(2500.0, 100.0);

        assert!(state.output_removed("DP-1"));
        assert!(state.outputs.get(first).is_none());
        assert!(state.layout.get_box(first).is_none());
        assert_eq!(state.layout.get_box(second), Some(Rect::new(0, 0, 1280, 720)));
        assert_eq!(state.outputs.get(second).map(|o| o.lx), Some(0));
        assert_eq!(state.seats[0].cursor().position(), (1280.0, 100.0));
    }

    #[test]
    fn test_cursor_theme_reloaded_per_scale() {
        let mut state = state_with(OutputConfig::new("DP-2").with_scale(2.0));
        let xcursor = XcursorManager::new(FixedCursorTheme::default(), 24);
        state.seats = vec![Seat::new().with_xcursor(xcursor)];
        state.output_added(&virtual_output("DP-1", 1920, 1080));
        state.output_added(&virtual_output("DP-2", 3840, 2160));

        let seat = &state.seats[0];
        assert_eq!(seat.xcursor().loaded_scales(), vec![1.0, 2.0]);
        assert!(seat.cursor().image_for_scale(2.0).is_some());
    }

    #[test]
    fn test_cursor_theme_failure_is_not_fatal() {
        let mut state = state_with(OutputConfig::new("DP-1").with_scale(3.0));
        let xcursor = XcursorManager::new(FixedCursorTheme::new("empty", Vec::new()), 24);
        state.seats = vec![Seat::new().with_xcursor(xcursor)];
        let id = state.output_added(&virtual_output("DP-1", 1920, 1080));

        assert!(state.outputs.get(id).is_some());
        assert!(state.seats[0].xcursor().loaded_scales().is_empty());
    }

    #[test]
    fn test_output_cursor_registration() {
        let mut state = CompositorState::default();
        let first = state.output_added(&virtual_output("DP-1", 1000, 1000));
        state.seats[0].cursor_mut().warp(1500.0, 10.0);
        let second = state.output_added(&virtual_output("DP-2", 1000, 1000));

        assert!(!state.outputs.get(first).unwrap().cursor.visible);
        let cursor = state.outputs.get(second).unwrap().cursor;
        assert!(cursor.visible);
        assert_eq!((cursor.x, cursor.y), (500.0, 10.0));
    }

    #[test]
    fn test_render_output_updates_frame_times() {
        let log = DoneLog::default();
        let mut state = CompositorState::default();
        let id = state.output_added(&virtual_output("DP-1", 800, 600));
        let surface = mapped_surface(&mut state, 100, 100);
        {
            let s = state.surfaces.get_mut(surface).unwrap();
            s.frame(RecordingCallback::boxed(1, &log));
            s.commit();
        }
        state.add_view(View::new(ViewKind::Xwayland { surface }));

        let mut renderer = RecordingRenderer::new();
        let when = Duration::from_millis(4242);
        let stats = state.render_output_at(id, &mut renderer, when).unwrap();

        assert_eq!(stats.surfaces_drawn, 1);
        assert_eq!(*log.borrow(), vec![(1, 4242)]);
        assert_eq!(state.outputs.get(id).unwrap().last_frame, when);
        assert_eq!(state.last_frame, when);
    }

    #[test]
    fn test_render_unknown_output() {
        let mut state = CompositorState::default();
        let id = state.output_added(&virtual_output("DP-1", 800, 600));
        state.output_removed("DP-1");

        let mut renderer = RecordingRenderer::new();
        assert!(state.render_output(id, &mut renderer).is_none());
        assert_eq!(renderer.frames_begun(), 0);
    }

    #[test]
    fn test_view_at_topmost() {
        let mut state = CompositorState::default();
        let below = mapped_surface(&mut state, 100, 100);
        let above = mapped_surface(&mut state, 100, 100);
        state.add_view(View::new(ViewKind::Xwayland { surface: below }).at(0.0, 0.0));
        let top = state.add_view(View::new(ViewKind::Xwayland { surface: above }).at(50.0, 50.0));

        let hit = state.view_at(75.0, 80.0).unwrap();
        assert_eq!((hit.view, hit.surface), (top, above));
        assert_eq!((hit.sx, hit.sy), (25.0, 30.0));

        assert_eq!(state.view_at(10.0, 10.0).map(|h| h.surface), Some(below));
        assert!(state.view_at(500.0, 500.0).is_none());
    }

    #[test]
    fn test_view_at_rotated() {
        let mut state = CompositorState::default();
        let surface = mapped_surface(&mut state, 100, 50);
        state.add_view(View::new(ViewKind::Xwayland { surface }).rotated(PI));

        // Half a turn maps the bottom-right corner region onto the top-left.
        let hit = state.view_at(90.0, 40.0).unwrap();
        assert!((hit.sx - 10.0).abs() < 1e-4);
        assert!((hit.sy - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_view_at_finds_rotated_subsurface_where_drawn() {
        let mut state = CompositorState::default();
        let id = state.output_added(&virtual_output("DP-1", 1000, 1000));
        let root = mapped_surface(&mut state, 100, 100);
        let child = mapped_surface(&mut state, 20, 20);
        state.surfaces.add_subsurface(root, child, 0, 0).unwrap();
        state.add_view(View::new(ViewKind::Xwayland { surface: root }).rotated(FRAC_PI_2));

        let mut renderer = RecordingRenderer::new();
        state.render_output_at(id, &mut renderer, Duration::ZERO).unwrap();
        let output = state.outputs.get(id).unwrap();
        let drawn = renderer.draws()[1].matrix * Point::new(0.5, 0.5);
        let expected = output.transform_matrix() * Point::new(90.0, 10.0);
        assert!((drawn.x - expected.x).abs() < 1e-4 && (drawn.y - expected.y).abs() < 1e-4);

        let hit = state.view_at(90.0, 10.0).unwrap();
        assert_eq!(hit.surface, child);
        assert!((hit.sx - 10.0).abs() < 1e-4 && (hit.sy - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_view_at_subsurface_and_popup() {
        let mut state = CompositorState::default();
        let root = mapped_surface(&mut state, 200, 200);
        let child = mapped_surface(&mut state, 20, 20);
        let popup_surface = mapped_surface(&mut state, 50, 50);
        state.surfaces.add_subsurface(root, child, 10, 10).unwrap();

        let mut xdg = XdgSurfaceV6::new(root);
        xdg.popups.push(XdgPopupV6 {
            xdg: XdgSurfaceV6::new(popup_surface),
            popup_geometry: Rect::new(180, 180, 50, 50),
            configured: true,
        });
        state.add_view(View::new(ViewKind::XdgShellV6(xdg)));

        assert_eq!(state.view_at(15.0, 15.0).map(|h| h.surface), Some(child));
        assert_eq!(state.view_at(100.0, 100.0).map(|h| h.surface), Some(root));
        let hit = state.view_at(220.0, 220.0).unwrap();
        assert_eq!((hit.surface, hit.sx, hit.sy), (popup_surface, 40.0, 40.0));
    }

    #[test]
    fn test_view_at_wl_shell_popup() {
        let mut state = CompositorState::default();
        let root = mapped_surface(&mut state, 100, 100);
        let popup_surface = mapped_surface(&mut state, 30, 30);

        let mut popup = WlShellSurface::new(popup_surface, WlShellSurfaceState::Popup);
        popup.transient_state = Some(TransientState { x: 90, y: 90 });
        let mut shell = WlShellSurface::new(root, WlShellSurfaceState::Toplevel);
        shell.popups.push(popup);
        state.add_view(View::new(ViewKind::WlShell(shell)));

        assert_eq!(state.view_at(110.0, 110.0).map(|h| h.surface), Some(popup_surface));
    }

    #[test]
    fn test_view_surface_takes_shell_role() {
        let mut state = CompositorState::default();
        let root = mapped_surface(&mut state, 100, 100);
        let child = mapped_surface(&mut state, 10, 10);
        state.surfaces.add_subsurface(root, child, 0, 0).unwrap();
        state.add_view(View::new(ViewKind::Xwayland { surface: root }));
        assert_eq!(state.surfaces.get(root).unwrap().role, SurfaceRole::Xwayland);

        // A view surface cannot also become a subsurface
        let other = mapped_surface(&mut state, 10, 10);
        assert_eq!(
            state.surfaces.add_subsurface(other, root, 0, 0),
            Err(SurfaceError::RoleAlreadySet)
        );

        // A subsurface keeps its role when shown as a view
        state.add_view(View::new(ViewKind::Xwayland { surface: child }));
        assert_eq!(state.surfaces.get(child).unwrap().role, SurfaceRole::Subsurface);
    }

    #[test]
    fn test_remove_view() {
        let mut state = CompositorState::default();
        let surface = mapped_surface(&mut state, 10, 10);
        let id = state.add_view(View::new(ViewKind::Xwayland { surface }));
        assert!(state.remove_view(id).is_some());
        assert!(state.remove_view(id).is_none());
        assert!(state.view_at(5.0, 5.0).is_none());
    }
}
