//! Press-and-hold gesture with drag-to-cancel.
//!
//! The hold starts at a fixed origin.  Every move recomputes the distance
//! from that origin; beyond `radius` the gesture is pending cancel, and
//! moving back inside clears it again.  Release applies whatever the flag
//! says at that moment.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// What a release means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldRelease {
    Analyze,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct HoldGesture {
    radius: f64,
    origin: Option<Point>,
    pending_cancel: bool,
}

impl HoldGesture {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            origin: None,
            pending_cancel: false,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn begin(&mut self, origin: Point) {
        self.origin = Some(origin);
        self.pending_cancel = false;
    }

    /// Track the pointer; returns the updated pending-cancel flag.
    pub fn track(&mut self, point: Point) -> bool {
        if let Some(origin) = self.origin {
            self.pending_cancel = origin.distance_to(point) > self.radius;
        }
        self.pending_cancel
    }

    pub fn is_holding(&self) -> bool {
        self.origin.is_some()
    }

    pub fn pending_cancel(&self) -> bool {
        self.pending_cancel
    }

    /// End the hold.  `None` when no hold was in progress.
    pub fn release(&mut self) -> Option<HoldRelease> {
        self.origin.take()?;
        let release = if std::mem::take(&mut self.pending_cancel) {
            HoldRelease::Cancel
        } else {
            HoldRelease::Analyze
        };
        Some(release)
    }
}
