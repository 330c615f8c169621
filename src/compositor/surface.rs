//! Surface management
//!
//! Surfaces live in an arena keyed by [`SurfaceId`]. Ids are never reused,
//! so a stale id simply fails to resolve. Subsurfaces hold their parent's
//! id as a non-owning back-reference.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use wayland_server::protocol::wl_callback::WlCallback;

use crate::compositor::geometry::Rect;

/// Unique identifier for surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        SurfaceId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A client's request to be told when its content has been presented
pub trait FrameCallback: fmt::Debug {
    /// Deliver the callback with the presentation time in milliseconds.
    /// The callback is consumed.
    fn send_done(self: Box<Self>, time_ms: u32);
}

impl FrameCallback for WlCallback {
    fn send_done(self: Box<Self>, time_ms: u32) {
        self.done(time_ms);
    }
}

/// Buffer information attached to a surface
#[derive(Debug, Clone)]
pub struct BufferInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl BufferInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Pending state for a surface (not yet committed)
#[derive(Debug, Default)]
pub struct SurfacePendingState {
    /// Pending buffer attachment; `Some(None)` detaches the buffer
    pub buffer: Option<Option<BufferInfo>>,
    /// Buffer scale factor
    pub scale: Option<i32>,
    /// Pending subsurface position
    pub subsurface_position: Option<(i32, i32)>,
    /// Frame callbacks to be queued on commit
    pub frame_callbacks: Vec<Box<dyn FrameCallback>>,
}

/// Surface role determines how the surface is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceRole {
    /// No role assigned yet
    #[default]
    None,
    /// xdg-shell-v6 toplevel or popup
    XdgSurfaceV6,
    /// Legacy wl_shell surface
    WlShellSurface,
    /// Xwayland window
    Xwayland,
    /// Subsurface
    Subsurface,
}

/// Errors from surface tree manipulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("Unknown surface {0:?}")]
    UnknownSurface(SurfaceId),
    #[error("Surface already has a role")]
    RoleAlreadySet,
    #[error("Subsurface would become its own ancestor")]
    CyclicSubsurface,
}

/// A Wayland surface
#[derive(Debug)]
pub struct Surface {
    /// Unique identifier
    pub id: SurfaceId,
    /// Current buffer info
    pub buffer: Option<BufferInfo>,
    /// Buffer scale factor (default 1)
    pub scale: i32,
    /// Frame callbacks awaiting presentation, in commit order
    frame_callbacks: Vec<Box<dyn FrameCallback>>,
    /// Pending state (not yet committed)
    pub pending: SurfacePendingState,
    /// Role-specific data (e.g., xdg_surface role)
    pub role: SurfaceRole,
    /// Parent surface (for subsurfaces)
    pub parent: Option<SurfaceId>,
    /// Offset from the parent surface, for subsurfaces
    pub subsurface_position: (i32, i32),
    /// Child subsurfaces, bottom to top
    pub subsurfaces: Vec<SurfaceId>,
}

impl Surface {
    /// Create a new surface
    pub fn new() -> Self {
        Self {
            id: SurfaceId::new(),
            buffer: None,
            scale: 1,
            frame_callbacks: Vec::new(),
            pending: SurfacePendingState::default(),
            role: SurfaceRole::None,
            parent: None,
            subsurface_position: (0, 0),
            subsurfaces: Vec::new(),
        }
    }

    /// Attach a buffer to the pending state
    pub fn attach(&mut self, buffer: Option<BufferInfo>) {
        self.pending.buffer = Some(buffer);
    }

    /// Add a frame callback
    pub fn frame(&mut self, callback: Box<dyn FrameCallback>) {
        self.pending.frame_callbacks.push(callback);
    }

    /// Set the buffer scale
    pub fn set_scale(&mut self, scale: i32) {
        self.pending.scale = Some(scale);
    }

    /// Commit pending state to current state
    pub fn commit(&mut self) {
        if let Some(buffer) = self.pending.buffer.take() {
            self.buffer = buffer;
        }

        if let Some(scale) = self.pending.scale.take() {
            if scale > 0 {
                self.scale = scale;
            }
        }

        if let Some(position) = self.pending.subsurface_position.take() {
            self.subsurface_position = position;
        }

        self.frame_callbacks.append(&mut self.pending.frame_callbacks);
    }

    /// Set the surface role
    pub fn set_role(&mut self, role: SurfaceRole) -> Result<(), SurfaceError> {
        if self.role != SurfaceRole::None && self.role != role {
            return Err(SurfaceError::RoleAlreadySet);
        }
        self.role = role;
        Ok(())
    }

    /// Whether the surface has content that can be drawn
    pub fn has_buffer(&self) -> bool {
        self.buffer
            .as_ref()
            .is_some_and(|buffer| buffer.width > 0 && buffer.height > 0)
    }

    /// Size in surface-local coordinates: buffer size divided by buffer scale
    pub fn size(&self) -> (f64, f64) {
        match &self.buffer {
            Some(buffer) => {
                let scale = f64::from(self.scale.max(1));
                (f64::from(buffer.width) / scale, f64::from(buffer.height) / scale)
            }
            None => (0.0, 0.0),
        }
    }

    /// Number of frame callbacks waiting for presentation
    pub fn pending_frame_callbacks(&self) -> usize {
        self.frame_callbacks.len()
    }

    /// Deliver every queued frame callback, in order. Returns how many fired.
    pub fn send_frame_done(&mut self, time_ms: u32) -> usize {
        let count = self.frame_callbacks.len();
        for callback in self.frame_callbacks.drain(..) {
            callback.send_done(time_ms);
        }
        count
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

/// Manager for all surfaces
#[derive(Debug)]
pub struct SurfaceManager {
    surfaces: HashMap<SurfaceId, Surface>,
}

impl SurfaceManager {
    /// Create a new surface manager
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
        }
    }

    /// Create a new surface and return its ID
    pub fn create_surface(&mut self) -> SurfaceId {
        let surface = Surface::new();
        let id = surface.id;
        self.surfaces.insert(id, surface);
        id
    }

    /// Get a surface by ID
    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    /// Get a mutable surface by ID
    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.get_mut(&id)
    }

    /// Make `child` a subsurface of `parent` at the given offset, stacked on top
    pub fn add_subsurface(
        &mut self,
        parent: SurfaceId,
        child: SurfaceId,
        x: i32,
        y: i32,
    ) -> Result<(), SurfaceError> {
        if !self.surfaces.contains_key(&parent) {
            return Err(SurfaceError::UnknownSurface(parent));
        }

        // Walk up from the parent; meeting the child means a cycle.
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(SurfaceError::CyclicSubsurface);
            }
            ancestor = self.surfaces.get(&id).and_then(|s| s.parent);
        }

        let surface = self
            .surfaces
            .get_mut(&child)
            .ok_or(SurfaceError::UnknownSurface(child))?;
        if surface.parent.is_some() {
            return Err(SurfaceError::RoleAlreadySet);
        }
        surface.set_role(SurfaceRole::Subsurface)?;
        surface.parent = Some(parent);
        surface.subsurface_position = (x, y);

        if let Some(parent) = self.surfaces.get_mut(&parent) {
            parent.subsurfaces.push(child);
        }
        debug!("Surface {:?} is now a subsurface of {:?}", child, parent);
        Ok(())
    }

    /// Schedule a new subsurface offset; applied on the child's next commit
    pub fn set_subsurface_position(
        &mut self,
        child: SurfaceId,
        x: i32,
        y: i32,
    ) -> Result<(), SurfaceError> {
        let surface = self
            .surfaces
            .get_mut(&child)
            .ok_or(SurfaceError::UnknownSurface(child))?;
        surface.pending.subsurface_position = Some((x, y));
        Ok(())
    }

    /// Remove a surface, detaching it from its parent and orphaning its
    /// subsurfaces.
    pub fn remove(&mut self, id: SurfaceId) -> Option<Surface> {
        let surface = self.surfaces.remove(&id)?;

        if let Some(parent) = surface.parent.and_then(|p| self.surfaces.get_mut(&p)) {
            parent.subsurfaces.retain(|&child| child != id);
        }
        for child in &surface.subsurfaces {
            if let Some(child) = self.surfaces.get_mut(child) {
                child.parent = None;
            }
        }

        Some(surface)
    }

    /// Topmost surface of the tree rooted at `root` containing the
    /// surface-local point. Returns the surface and the point in its
    /// coordinates.
    pub fn surface_at(&self, root: SurfaceId, sx: f64, sy: f64) -> Option<(SurfaceId, f64, f64)> {
        let surface = self.surfaces.get(&root)?;

        for &child in surface.subsurfaces.iter().rev() {
            let Some(sub) = self.surfaces.get(&child) else {
                continue;
            };
            let (x, y) = sub.subsurface_position;
            if let Some(hit) = self.surface_at(child, sx - f64::from(x), sy - f64::from(y)) {
                return Some(hit);
            }
        }

        let (width, height) = surface.size();
        let bounds = Rect::new(0, 0, width as i32, height as i32);
        if surface.has_buffer() && bounds.contains_point(sx, sy) {
            Some((root, sx, sy))
        } else {
            None
        }
    }

    /// Get all surfaces
    pub fn iter(&self) -> impl Iterator<Item = (&SurfaceId, &Surface)> {
        self.surfaces.iter()
    }

    /// Get count of surfaces
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl Default for SurfaceManager {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{DoneLog, RecordingCallback};
    use super::*;

    #[test]
    fn test_surface_id_unique() {
        let id1 = SurfaceId::new();
        let id2 = SurfaceId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_surface_new() {
        let surface = Surface::new();
        assert!(surface.buffer.is_none());
        assert!(!surface.has_buffer());
        assert_eq!(surface.scale, 1);
        assert_eq!(surface.role, SurfaceRole::None);
    }

    #[test]
    fn test_commit_applies_buffer_and_scale() {
        let mut surface = Surface::new();
        surface.attach(Some(BufferInfo::new(200, 100)));
        surface.set_scale(2);
        assert!(surface.buffer.is_none());
        surface.commit();
        assert!(surface.has_buffer());
        assert_eq!(surface.size(), (100.0, 50.0));

        // A commit without a new attach keeps the buffer.
        surface.commit();
        assert!(surface.has_buffer());

        surface.attach(None);
        surface.commit();
        assert!(!surface.has_buffer());
    }

    #[test]
    fn test_frame_callbacks_queue_on_commit() {
        let log = DoneLog::default();
        let mut surface = Surface::new();
        surface.frame(RecordingCallback::boxed(1, &log));
        surface.frame(RecordingCallback::boxed(2, &log));
        assert_eq!(surface.pending_frame_callbacks(), 0);

        surface.commit();
        assert_eq!(surface.pending_frame_callbacks(), 2);

        assert_eq!(surface.send_frame_done(1234), 2);
        assert_eq!(*log.borrow(), vec![(1, 1234), (2, 1234)]);
        assert_eq!(surface.pending_frame_callbacks(), 0);
        assert_eq!(surface.send_frame_done(1300), 0);
    }

    #[test]
    fn test_surface_role() {
        let mut surface = Surface::new();
        assert!(surface.set_role(SurfaceRole::XdgSurfaceV6).is_ok());
        assert!(surface.set_role(SurfaceRole::XdgSurfaceV6).is_ok()); // Same role is OK
        assert_eq!(
            surface.set_role(SurfaceRole::Subsurface),
            Err(SurfaceError::RoleAlreadySet)
        );
    }

    #[test]
    fn test_subsurface_links() {
        let mut manager = SurfaceManager::new();
        let parent = manager.create_surface();
        let child = manager.create_surface();
        let grandchild = manager.create_surface();

        manager.add_subsurface(parent, child, 10, 20).unwrap();
        manager.add_subsurface(child, grandchild, 1, 2).unwrap();
        assert_eq!(manager.get(child).unwrap().parent, Some(parent));
        assert_eq!(manager.get(parent).unwrap().subsurfaces, vec![child]);
        assert_eq!(manager.get(child).unwrap().subsurface_position, (10, 20));

        assert_eq!(
            manager.add_subsurface(grandchild, parent, 0, 0),
            Err(SurfaceError::CyclicSubsurface)
        );
        assert_eq!(
            manager.add_subsurface(parent, SurfaceId(u64::MAX), 0, 0),
            Err(SurfaceError::UnknownSurface(SurfaceId(u64::MAX)))
        );
    }

    #[test]
    fn test_subsurface_position_is_double_buffered() {
        let mut manager = SurfaceManager::new();
        let parent = manager.create_surface();
        let child = manager.create_surface();
        manager.add_subsurface(parent, child, 0, 0).unwrap();

        manager.set_subsurface_position(child, 5, 6).unwrap();
        assert_eq!(manager.get(child).unwrap().subsurface_position, (0, 0));
        manager.get_mut(child).unwrap().commit();
        assert_eq!(manager.get(child).unwrap().subsurface_position, (5, 6));
    }

    #[test]
    fn test_remove_detaches_tree() {
        let mut manager = SurfaceManager::new();
        let parent = manager.create_surface();
        let child = manager.create_surface();
        let grandchild = manager.create_surface();
        manager.add_subsurface(parent, child, 0, 0).unwrap();
        manager.add_subsurface(child, grandchild, 0, 0).unwrap();

        assert!(manager.remove(child).is_some());
        assert!(manager.get(parent).unwrap().subsurfaces.is_empty());
        assert_eq!(manager.get(grandchild).unwrap().parent, None);
        assert!(manager.remove(child).is_none());
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_surface_at_prefers_topmost_subsurface() {
        let mut manager = SurfaceManager::new();
        let root = manager.create_surface();
        let child = manager.create_surface();
        for (id, w, h) in [(root, 100, 100), (child, 20, 20)] {
            let surface = manager.get_mut(id).unwrap();
            surface.attach(Some(BufferInfo::new(w, h)));
            surface.commit();
        }
        manager.add_subsurface(root, child, 50, 50).unwrap();

        assert_eq!(manager.surface_at(root, 55.0, 60.0), Some((child, 5.0, 10.0)));
        assert_eq!(manager.surface_at(root, 10.0, 10.0), Some((root, 10.0, 10.0)));
        assert_eq!(manager.surface_at(root, 200.0, 10.0), None);
    }
}
