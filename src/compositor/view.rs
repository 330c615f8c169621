//! Views
//!
//! A view is the on-screen representation of one client window. Its
//! popup structure depends on the shell protocol that created it, so the
//! view carries a per-protocol payload.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::compositor::geometry::Rect;
use crate::compositor::{SurfaceId, SurfaceRole};

/// Unique identifier for views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u64);

impl ViewId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        ViewId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// An xdg-shell-v6 surface: a toplevel or a popup, with nested popups
#[derive(Debug, Clone)]
pub struct XdgSurfaceV6 {
    pub surface: SurfaceId,
    /// Window geometry the client set on its xdg_surface
    pub geometry: Rect,
    /// Popups anchored to this surface
    pub popups: Vec<XdgPopupV6>,
}

/// A popup anchored to an xdg-shell-v6 surface
#[derive(Debug, Clone)]
pub struct XdgPopupV6 {
    /// The popup's own xdg surface
    pub xdg: XdgSurfaceV6,
    /// Position granted by the shell, relative to the parent geometry
    pub popup_geometry: Rect,
    /// Only configured popups are drawn
    pub configured: bool,
}

impl XdgSurfaceV6 {
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            geometry: Rect::default(),
            popups: Vec::new(),
        }
    }
}

/// wl_shell surface state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WlShellSurfaceState {
    #[default]
    None,
    Toplevel,
    Maximized,
    Fullscreen,
    Transient,
    Popup,
}

/// Offset of a transient or popup wl_shell surface from its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransientState {
    pub x: i32,
    pub y: i32,
}

/// A legacy wl_shell surface and its transient children
#[derive(Debug, Clone)]
pub struct WlShellSurface {
    pub surface: SurfaceId,
    pub state: WlShellSurfaceState,
    pub transient_state: Option<TransientState>,
    pub popups: Vec<WlShellSurface>,
}

impl WlShellSurface {
    pub fn new(surface: SurfaceId, state: WlShellSurfaceState) -> Self {
        Self {
            surface,
            state,
            transient_state: None,
            popups: Vec::new(),
        }
    }

    /// Offset from the parent surface
    pub fn transient_offset(&self) -> (i32, i32) {
        self.transient_state.map_or((0, 0), |t| (t.x, t.y))
    }
}

/// Per-protocol payload of a view
#[derive(Debug, Clone)]
pub enum ViewKind {
    XdgShellV6(XdgSurfaceV6),
    WlShell(WlShellSurface),
    /// Xwayland windows have no popup tree
    Xwayland { surface: SurfaceId },
}

/// A positioned, rotatable window
#[derive(Debug, Clone)]
pub struct View {
    /// Unique identifier
    pub id: ViewId,
    /// Position in layout space
    pub x: f64,
    pub y: f64,
    /// Rotation in radians around the view centre
    pub rotation: f32,
    pub kind: ViewKind,
}

impl View {
    /// Create an unrotated view at the layout origin
    pub fn new(kind: ViewKind) -> Self {
        Self {
            id: ViewId::new(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            kind,
        }
    }

    /// Builder-style position setter
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Builder-style rotation setter
    pub fn rotated(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Root surface of the view
    pub fn surface(&self) -> SurfaceId {
        match &self.kind {
            ViewKind::XdgShellV6(xdg) => xdg.surface,
            ViewKind::WlShell(shell) => shell.surface,
            ViewKind::Xwayland { surface } => *surface,
        }
    }

    /// Role the root surface takes while it backs this view
    pub fn role(&self) -> SurfaceRole {
        match &self.kind {
            ViewKind::XdgShellV6(_) => SurfaceRole::XdgSurfaceV6,
            ViewKind::WlShell(_) => SurfaceRole::WlShellSurface,
            ViewKind::Xwayland { .. } => SurfaceRole::Xwayland,
        }
    }
}
