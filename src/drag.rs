//! Turning pointer gestures into widget offsets.

use serde::Deserialize;

use crate::position::{PositionStore, WidgetPosition};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// A pointer location in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[cfg(test)]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

fn clamp_axis(value: i32, viewport: i32, widget: i32) -> i32 {
    // A widget larger than the viewport is pinned at 0
    value.clamp(0, viewport.saturating_sub(widget).max(0))
}

/// Constrain `position` so the whole widget box stays inside the viewport.
#[must_use]
pub fn clamp(position: WidgetPosition, viewport: Size, widget: Size) -> WidgetPosition {
    WidgetPosition::new(
        clamp_axis(position.offset_x, viewport.width, widget.width),
        clamp_axis(position.offset_y, viewport.height, widget.height),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Idle,
    /// Pointer went down on the widget at `origin` while it sat at `baseline`
    Claimed {
        origin: Point,
        baseline: WidgetPosition,
    },
}

/// Owns the widget offset and keeps it inside the viewport.
pub struct DragController<S> {
    store: S,
    viewport: Size,
    widget: Size,
    offset: WidgetPosition,
    gesture: Gesture,
}

impl<S: PositionStore> DragController<S> {
    /// Start from the saved position, re-clamped against the current viewport.
    pub fn restore(store: S, viewport: Size, widget: Size) -> Self {
        let saved = store
            .load()
            .inspect_err(|e| tracing::warn!(?e, "Failed to load widget position"))
            .ok()
            .flatten()
            .unwrap_or_default();
        tracing::debug!(?saved, "Restoring widget position");
        let mut controller = Self {
            store,
            viewport,
            widget,
            offset: WidgetPosition::default(),
            gesture: Gesture::Idle,
        };
        controller.clamp_and_set(saved);
        controller
    }

    #[must_use]
    pub const fn offset(&self) -> WidgetPosition {
        self.offset
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Claimed { .. })
    }

    #[cfg(test)]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Whether `point` lies on the widget at its current offset.
    #[must_use]
    pub fn hit(&self, point: Point) -> bool {
        let dx = point.x.saturating_sub(self.offset.offset_x);
        let dy = point.y.saturating_sub(self.offset.offset_y);
        dx >= 0 && dy >= 0 && dx < self.widget.width && dy < self.widget.height
    }

    /// Claim a gesture if the pointer went down on the widget.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if self.is_dragging() || !self.hit(point) {
            return false;
        }
        self.gesture = Gesture::Claimed {
            origin: point,
            baseline: self.offset,
        };
        true
    }

    /// Follow the pointer. Returns the new offset if it moved.
    pub fn pointer_move(&mut self, point: Point) -> Option<WidgetPosition> {
        let Gesture::Claimed { origin, baseline } = self.gesture else {
            return None;
        };
        let candidate = WidgetPosition::new(
            baseline
                .offset_x
                .saturating_add(point.x.saturating_sub(origin.x)),
            baseline
                .offset_y
                .saturating_add(point.y.saturating_sub(origin.y)),
        );
        self.clamp_and_set(candidate).then_some(self.offset)
    }

    /// End the gesture and save where the widget landed. Returns whether a gesture was active.
    pub fn pointer_up(&mut self) -> bool {
        if !self.is_dragging() {
            return false;
        }
        self.gesture = Gesture::Idle;
        self.persist();
        true
    }

    /// The viewport changed size. Returns the new offset if it moved.
    pub fn resize_viewport(&mut self, viewport: Size) -> Option<WidgetPosition> {
        self.viewport = viewport;
        self.reclamp()
    }

    /// The widget box changed size. Returns the new offset if it moved.
    pub fn resize_widget(&mut self, widget: Size) -> Option<WidgetPosition> {
        self.widget = widget;
        self.reclamp()
    }

    fn reclamp(&mut self) -> Option<WidgetPosition> {
        // A running gesture clamps on its next move and saves on release
        if self.is_dragging() {
            return None;
        }
        let moved = self.clamp_and_set(self.offset);
        self.persist();
        moved.then_some(self.offset)
    }

    /// The only place the offset is written.
    fn clamp_and_set(&mut self, candidate: WidgetPosition) -> bool {
        let clamped = clamp(candidate, self.viewport, self.widget);
        let moved = clamped != self.offset;
        self.offset = clamped;
        moved
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(self.offset) {
            tracing::warn!(?e, "Failed to save widget position");
        }
    }
}
