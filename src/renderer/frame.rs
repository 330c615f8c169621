//! Per-output frame composition
//!
//! Walks the view list back to front and draws every surface tree, popup
//! chain and drag icon that lands on the output. Frame callbacks of a
//! surface fire only when that surface is actually drawn.

use std::time::Duration;

use log::{trace, warn};

use super::matrix::{rotated_bounds, surface_transform};
use super::{Renderer, Texture};
use crate::compositor::view::{
    View, ViewKind, WlShellSurface, WlShellSurfaceState, XdgPopupV6, XdgSurfaceV6,
};
use crate::compositor::{Output, OutputLayout, SurfaceId, SurfaceManager};
use crate::input::Seat;

/// Deepest subsurface or popup nesting that is drawn
pub const MAX_TREE_DEPTH: usize = 32;

/// Counters for one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Surfaces submitted to the renderer
    pub surfaces_drawn: usize,
    /// Surfaces with content that fell outside the output
    pub surfaces_culled: usize,
    /// Frame callbacks delivered
    pub callbacks_done: usize,
}

/// Render one frame of `output`.
///
/// `views` is in stacking order, back to front. `when` is the frame time
/// on the compositor's monotonic clock.
pub fn render_frame<R: Renderer>(
    renderer: &mut R,
    output: &Output,
    layout: &OutputLayout,
    surfaces: &mut SurfaceManager,
    views: &[View],
    seats: &[Seat],
    when: Duration,
) -> FrameStats {
    renderer.begin(output);

    let mut pass = FramePass {
        renderer: &mut *renderer,
        output,
        layout,
        surfaces,
        time_ms: when.as_millis() as u32,
        stats: FrameStats::default(),
    };

    for view in views {
        pass.render_view(view);
    }

    for seat in seats {
        let (cursor_x, cursor_y) = seat.cursor().position();
        for icon in seat.drag_icons().iter().filter(|icon| icon.mapped) {
            pass.render_surface_tree(icon.surface, cursor_x + icon.sx, cursor_y + icon.sy, 0.0);
        }
    }

    let stats = pass.stats;
    renderer.end();
    renderer.swap_buffers(output);

    trace!("Frame on {}: {:?}", output.name, stats);
    stats
}

struct FramePass<'a, R> {
    renderer: &'a mut R,
    output: &'a Output,
    layout: &'a OutputLayout,
    surfaces: &'a mut SurfaceManager,
    time_ms: u32,
    stats: FrameStats,
}

impl<R: Renderer> FramePass<'_, R> {
    fn render_view(&mut self, view: &View) {
        match &view.kind {
            ViewKind::XdgShellV6(xdg) => {
                self.render_surface_tree(xdg.surface, view.x, view.y, view.rotation);
                self.render_xdg_popups(xdg, view.x, view.y, view.rotation);
            }
            ViewKind::WlShell(shell) => {
                self.render_wl_shell_surface(shell, view.x, view.y, view.rotation);
            }
            ViewKind::Xwayland { surface } => {
                self.render_surface_tree(*surface, view.x, view.y, view.rotation);
            }
        }
    }

    /// Draw a single surface if it has content on this output, then
    /// deliver its frame callbacks.
    fn render_surface(&mut self, id: SurfaceId, lx: f64, ly: f64, rotation: f32) {
        let Some(surface) = self.surfaces.get_mut(id) else {
            return;
        };
        if !surface.has_buffer() {
            return;
        }
        let Some(texture) = Texture::for_surface(surface) else {
            return;
        };

        let (width, height) = surface.size();
        let bounds = rotated_bounds(lx, ly, width, height, rotation);
        if !self.layout.intersects(self.output.id, &bounds) {
            self.stats.surfaces_culled += 1;
            return;
        }

        let matrix = surface_transform(self.output, self.layout, lx, ly, width, height, rotation);
        self.renderer.render_with_matrix(&texture, &matrix);
        self.stats.surfaces_drawn += 1;
        self.stats.callbacks_done += surface.send_frame_done(self.time_ms);
    }

    /// Draw a surface and its subsurfaces, bottom to top.
    ///
    /// Under view rotation each subsurface offset is rotated about the
    /// parent's centre so the child stays attached to the rotated parent.
    fn render_surface_tree(&mut self, root: SurfaceId, lx: f64, ly: f64, rotation: f32) {
        let mut stack = vec![(root, lx, ly, 0usize)];

        while let Some((id, lx, ly, depth)) = stack.pop() {
            self.render_surface(id, lx, ly, rotation);

            let Some(surface) = self.surfaces.get(id) else {
                continue;
            };
            if surface.subsurfaces.is_empty() {
                continue;
            }
            if depth >= MAX_TREE_DEPTH {
                warn!("Subsurfaces of {:?} nested too deeply, not drawing", id);
                continue;
            }

            let (width, height) = surface.size();
            for &child in surface.subsurfaces.iter().rev() {
                let Some(sub) = self.surfaces.get(child) else {
                    continue;
                };
                let mut sx = f64::from(sub.subsurface_position.0);
                let mut sy = f64::from(sub.subsurface_position.1);

                if rotation != 0.0 {
                    let (sw, sh) = sub.size();
                    // Offset of the child centre from the parent centre
                    let ox = sx - width / 2.0 + sw / 2.0;
                    let oy = sy - height / 2.0 + sh / 2.0;
                    let (sin, cos) = f64::from(rotation).sin_cos();
                    let rx = cos * ox - sin * oy;
                    let ry = cos * oy + sin * ox;
                    sx = rx + width / 2.0 - sw / 2.0;
                    sy = ry + height / 2.0 - sh / 2.0;
                }

                stack.push((child, lx + sx, ly + sy, depth + 1));
            }
        }
    }

    /// Draw the configured popups of an xdg-shell-v6 surface, recursively
    fn render_xdg_popups(&mut self, root: &XdgSurfaceV6, base_x: f64, base_y: f64, rotation: f32) {
        let mut stack: Vec<(&XdgSurfaceV6, &XdgPopupV6, f64, f64, usize)> = root
            .popups
            .iter()
            .rev()
            .map(|popup| (root, popup, base_x, base_y, 0))
            .collect();

        while let Some((parent, popup, base_x, base_y, depth)) = stack.pop() {
            if !popup.configured {
                continue;
            }

            let popup_x = base_x + f64::from(parent.geometry.x) + f64::from(popup.popup_geometry.x)
                - f64::from(popup.xdg.geometry.x);
            let popup_y = base_y + f64::from(parent.geometry.y) + f64::from(popup.popup_geometry.y)
                - f64::from(popup.xdg.geometry.y);
            self.render_surface_tree(popup.xdg.surface, popup_x, popup_y, rotation);

            if depth >= MAX_TREE_DEPTH {
                warn!("Popups of {:?} nested too deeply, not drawing", popup.xdg.surface);
                continue;
            }
            for child in popup.xdg.popups.iter().rev() {
                stack.push((&popup.xdg, child, popup_x, popup_y, depth + 1));
            }
        }
    }

    /// Draw a wl_shell surface with its transient popups. A top-level
    /// surface in the popup state is skipped here; it is drawn as the
    /// child of the surface it belongs to.
    fn render_wl_shell_surface(&mut self, root: &WlShellSurface, lx: f64, ly: f64, rotation: f32) {
        let mut stack = vec![(root, lx, ly, false, 0usize)];

        while let Some((shell, lx, ly, is_child, depth)) = stack.pop() {
            if !is_child && shell.state == WlShellSurfaceState::Popup {
                continue;
            }
            self.render_surface_tree(shell.surface, lx, ly, rotation);

            if shell.popups.is_empty() {
                continue;
            }
            if depth >= MAX_TREE_DEPTH {
                warn!("wl_shell popups of {:?} nested too deeply, not drawing", shell.surface);
                continue;
            }
            for popup in shell.popups.iter().rev() {
                let (x, y) = popup.transient_offset();
                stack.push((popup, lx + f64::from(x), ly + f64::from(y), true, depth + 1));
            }
        }
    }
}
