//! Axis-aligned rectangle primitives
//!
//! Used for output-space culling and input hit-testing. A rectangle with a
//! non-positive width or height is empty and never intersects anything.

/// An axis-aligned rectangle in layout or buffer space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Result written by [`Rect::intersect`] when either input is empty.
pub const NO_INTERSECTION: Rect = Rect {
    x: 0,
    y: 0,
    width: -100,
    height: -100,
};

/// Returns true if `rect` is absent or has a non-positive dimension
pub fn is_empty(rect: Option<&Rect>) -> bool {
    rect.map_or(true, Rect::is_empty)
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the rectangle has a non-positive width or height
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Right edge, saturating at the coordinate range
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge, saturating at the coordinate range
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Clamp a point to the rectangle's extent, independently per axis.
    pub fn closest_point(&self, x: f64, y: f64) -> (f64, f64) {
        let right = f64::from(self.x) + f64::from(self.width);
        let bottom = f64::from(self.y) + f64::from(self.height);

        let cx = if x < f64::from(self.x) {
            f64::from(self.x)
        } else if x > right {
            right
        } else {
            x
        };

        let cy = if y < f64::from(self.y) {
            f64::from(self.y)
        } else if y > bottom {
            bottom
        } else {
            y
        };

        (cx, cy)
    }

    /// Compute the overlap of two rectangles.
    ///
    /// Returns the overlap and whether it is non-empty. If either input is
    /// empty the overlap is [`NO_INTERSECTION`]. Disjoint inputs yield a
    /// rectangle with a non-positive dimension.
    pub fn intersect(&self, other: &Rect) -> (Rect, bool) {
        if self.is_empty() || other.is_empty() {
            return (NO_INTERSECTION, false);
        }

        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        let dest = Rect::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1));
        (dest, !dest.is_empty())
    }

    /// Overlap of two rectangles, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        match self.intersect(other) {
            (rect, true) => Some(rect),
            _ => None,
        }
    }

    /// Inclusive point test: points on any edge are contained.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        if self.is_empty() {
            return false;
        }
        x >= f64::from(self.x)
            && x <= f64::from(self.x) + f64::from(self.width)
            && y >= f64::from(self.y)
            && y <= f64::from(self.y) + f64::from(self.height)
    }

    /// Smallest integer rectangle covering the given floating-point extent
    pub fn from_extent(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let x = x1.floor() as i32;
        let y = y1.floor() as i32;
        Self::new(
            x,
            y,
            (x2.ceil() as i32).saturating_sub(x),
            (y2.ceil() as i32).saturating_sub(y),
        )
    }
}
