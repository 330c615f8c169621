//! Output layout
//!
//! Maps every active output to a rectangle in the shared layout space.
//! Outputs placed without an explicit position are packed left-to-right
//! after the rightmost explicitly placed output.

use log::debug;

use crate::compositor::geometry::Rect;
use crate::compositor::OutputId;

#[derive(Debug, Clone, Copy)]
struct LayoutEntry {
    output: OutputId,
    rect: Rect,
    auto: bool,
}

/// Ordered collection of outputs and their layout rectangles
#[derive(Debug, Default)]
pub struct OutputLayout {
    entries: Vec<LayoutEntry>,
}

impl OutputLayout {
    /// Create an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an output at a fixed position. `size` is the output's
    /// effective resolution.
    pub fn add(&mut self, output: OutputId, x: i32, y: i32, size: (i32, i32)) {
        self.upsert(LayoutEntry {
            output,
            rect: Rect::new(x, y, size.0, size.1),
            auto: false,
        });
        self.reconfigure();
    }

    /// Place an output automatically to the right of the existing outputs
    pub fn add_auto(&mut self, output: OutputId, size: (i32, i32)) {
        self.upsert(LayoutEntry {
            output,
            rect: Rect::new(0, 0, size.0, size.1),
            auto: true,
        });
        self.reconfigure();
    }

    /// Remove an output. Returns false if it was not in the layout.
    pub fn remove(&mut self, output: OutputId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.output != output);
        if self.entries.len() == before {
            return false;
        }
        self.reconfigure();
        true
    }

    /// Update an output's size after a mode, scale or transform change
    pub fn resize(&mut self, output: OutputId, size: (i32, i32)) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.output == output) {
            entry.rect.width = size.0;
            entry.rect.height = size.1;
            self.reconfigure();
        }
    }

    fn upsert(&mut self, entry: LayoutEntry) {
        match self.entries.iter_mut().find(|e| e.output == entry.output) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Re-pack the auto-placed outputs after the rightmost fixed output
    fn reconfigure(&mut self) {
        let mut next_x = self
            .entries
            .iter()
            .filter(|entry| !entry.auto)
            .map(|entry| entry.rect.right())
            .max()
            .unwrap_or(0);

        for entry in self.entries.iter_mut().filter(|entry| entry.auto) {
            entry.rect.x = next_x;
            entry.rect.y = 0;
            next_x = next_x.saturating_add(entry.rect.width);
            debug!("Auto-placed output {:?} at {}x{}", entry.output, entry.rect.x, entry.rect.y);
        }
    }

    /// Layout rectangle of an output
    pub fn get_box(&self, output: OutputId) -> Option<Rect> {
        self.entries
            .iter()
            .find(|entry| entry.output == output)
            .map(|entry| entry.rect)
    }

    /// Bounding box of all outputs
    pub fn extents(&self) -> Rect {
        let mut iter = self.entries.iter().map(|entry| entry.rect);
        let Some(first) = iter.next() else {
            return Rect::default();
        };
        let (mut x1, mut y1) = (first.x, first.y);
        let (mut x2, mut y2) = (first.right(), first.bottom());
        for rect in iter {
            x1 = x1.min(rect.x);
            y1 = y1.min(rect.y);
            x2 = x2.max(rect.right());
            y2 = y2.max(rect.bottom());
        }
        Rect::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }

    /// Convert layout coordinates to output-local coordinates
    pub fn output_coords(&self, output: OutputId, lx: f64, ly: f64) -> (f64, f64) {
        match self.get_box(output) {
            Some(rect) => (lx - f64::from(rect.x), ly - f64::from(rect.y)),
            None => (lx, ly),
        }
    }

    /// Whether a layout-space rectangle overlaps the output
    pub fn intersects(&self, output: OutputId, target: &Rect) -> bool {
        self.get_box(output)
            .is_some_and(|rect| rect.intersect(target).1)
    }

    /// Whether a layout-space point lies on the output
    pub fn contains_point(&self, output: OutputId, lx: f64, ly: f64) -> bool {
        self.get_box(output)
            .is_some_and(|rect| rect.contains_point(lx, ly))
    }

    /// First output containing the point
    pub fn output_at(&self, lx: f64, ly: f64) -> Option<OutputId> {
        self.entries
            .iter()
            .find(|entry| entry.rect.contains_point(lx, ly))
            .map(|entry| entry.output)
    }

    /// Closest point on `reference`, or on any output when `reference` is None
    pub fn closest_point(&self, reference: Option<OutputId>, lx: f64, ly: f64) -> (f64, f64) {
        let mut best = (lx, ly);
        let mut best_distance = f64::MAX;

        for entry in &self.entries {
            if reference.is_some_and(|output| output != entry.output) {
                continue;
            }
            let (x, y) = entry.rect.closest_point(lx, ly);
            let distance = (x - lx).powi(2) + (y - ly).powi(2);
            if distance < best_distance {
                best = (x, y);
                best_distance = distance;
            }
        }

        best
    }

    /// Outputs with their layout rectangles, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (OutputId, Rect)> + '_ {
        self.entries.iter().map(|entry| (entry.output, entry.rect))
    }

    /// Get count of outputs in the layout
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
