//! Interactive selection state machine.
//!
//! The controller owns a [`CropSelection`] and the drag state. Every
//! mutation clamps its result so the selection circle never leaves the
//! display area; no caller can construct an out-of-bounds selection through
//! this type.

use tracing::trace;

use super::{CropSelection, PointerPosition};
use crate::config::SelectionLimits;

/// Drag gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// A drag started inside the circle; the offset is pointer minus center
    /// at the moment the drag began.
    Dragging { offset_x: f64, offset_y: f64 },
}

/// Owns the selection and applies pointer, slider and keyboard input.
#[derive(Debug, Clone, PartialEq)]
pub struct CropController {
    selection: CropSelection,
    drag: DragState,
    limits: SelectionLimits,
}

impl Default for CropController {
    fn default() -> Self {
        Self::new(SelectionLimits::default())
    }
}

impl CropController {
    /// Create a controller with the default selection.
    pub fn new(limits: SelectionLimits) -> Self {
        let limits = limits.normalized();
        Self {
            selection: CropSelection::initial(&limits),
            drag: DragState::Idle,
            limits,
        }
    }

    /// Create a controller starting from an arbitrary selection.
    ///
    /// The selection is repaired into the limits first: size and scale are
    /// clamped, then the center is pulled inside the display area.
    pub fn with_selection(selection: CropSelection, limits: SelectionLimits) -> Self {
        let mut controller = Self::new(limits);
        let defaults = controller.selection;
        let limits = controller.limits;

        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        let size = finite_or(selection.size, defaults.size)
            .max(limits.min_size)
            .min(limits.max_size);
        let scale = finite_or(selection.scale, defaults.scale)
            .max(limits.min_zoom)
            .min(limits.max_zoom);

        controller.selection = CropSelection {
            center_x: clamp_axis(finite_or(selection.center_x, 50.0), size),
            center_y: clamp_axis(finite_or(selection.center_y, 50.0), size),
            size,
            scale,
        };
        controller
    }

    pub fn selection(&self) -> &CropSelection {
        &self.selection
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn limits(&self) -> &SelectionLimits {
        &self.limits
    }

    /// Start a drag if the pointer is inside the selection circle.
    ///
    /// Returns `true` if a drag started. Pointers outside the circle leave
    /// the controller idle.
    pub fn begin_drag(&mut self, pointer: PointerPosition) -> bool {
        if !pointer.is_finite() || !self.selection.contains(pointer.x, pointer.y) {
            return false;
        }

        self.drag = DragState::Dragging {
            offset_x: pointer.x - self.selection.center_x,
            offset_y: pointer.y - self.selection.center_y,
        };
        trace!(x = pointer.x, y = pointer.y, "drag started");
        true
    }

    /// Move the selection with the pointer while a drag is active.
    ///
    /// Returns `true` if the selection was updated. Idle controllers ignore
    /// the call.
    pub fn continue_drag(&mut self, pointer: PointerPosition) -> bool {
        let DragState::Dragging { offset_x, offset_y } = self.drag else {
            return false;
        };
        if !pointer.is_finite() {
            return false;
        }

        self.move_center_to(pointer.x - offset_x, pointer.y - offset_y);
        true
    }

    /// Finish the current drag. Safe to call when idle.
    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Move the center by a delta (keyboard input), clamped to the display
    /// area. Does not affect drag state.
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.move_center_to(self.selection.center_x + dx, self.selection.center_y + dy);
    }

    /// Resize the selection around its current center.
    ///
    /// The size is limited first by the space available around the center,
    /// then by the configured minimum, so the circle always stays in bounds.
    /// Returns the resulting size.
    pub fn set_size(&mut self, requested: f64) -> f64 {
        if requested.is_nan() {
            return self.selection.size;
        }

        let max_allowed = self
            .selection
            .max_size_at_center()
            .min(self.limits.max_size);
        self.selection.size = requested.max(self.limits.min_size).min(max_allowed);
        self.selection.size
    }

    /// Set the preview zoom factor. Returns the resulting scale.
    pub fn set_zoom(&mut self, requested: f64) -> f64 {
        if requested.is_nan() {
            return self.selection.scale;
        }

        self.selection.scale = requested
            .max(self.limits.min_zoom)
            .min(self.limits.max_zoom);
        self.selection.scale
    }

    /// Restore the default selection and stop any drag.
    pub fn reset(&mut self) {
        self.selection = CropSelection::initial(&self.limits);
        self.drag = DragState::Idle;
    }

    fn move_center_to(&mut self, x: f64, y: f64) {
        let size = self.selection.size;
        self.selection.center_x = clamp_axis(x, size);
        self.selection.center_y = clamp_axis(y, size);
    }
}

/// Clamp one center coordinate to `[size/2, 100 - size/2]`.
#[inline]
fn clamp_axis(value: f64, size: f64) -> f64 {
    let r = size / 2.0;
    value.max(r).min(100.0 - r)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64) -> PointerPosition {
        PointerPosition::new(x, y)
    }

    #[test]
    fn test_defaults() {
        let ctl = CropController::default();
        assert_eq!(*ctl.selection(), CropSelection::default());
        assert_eq!(ctl.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_begin_drag_inside_captures_offset() {
        let mut ctl = CropController::default();
        assert!(ctl.begin_drag(at(60.0, 45.0)));
        assert_eq!(
            ctl.drag_state(),
            DragState::Dragging {
                offset_x: 10.0,
                offset_y: -5.0
            }
        );
    }

    #[test]
    fn test_begin_drag_outside_circle_is_ignored() {
        let mut ctl = CropController::default();
        ctl.set_size(40.0);

        // distance from (50,50) to (80,80) is ~42.4 > 20
        assert!(!ctl.begin_drag(at(80.0, 80.0)));
        assert!(!ctl.is_dragging());

        let before = *ctl.selection();
        assert!(!ctl.continue_drag(at(10.0, 10.0)));
        assert_eq!(*ctl.selection(), before);
    }

    #[test]
    fn test_drag_moves_by_pointer_delta() {
        let mut ctl = CropController::default();
        ctl.set_size(40.0);
        assert!(ctl.begin_drag(at(55.0, 50.0)));
        assert!(ctl.continue_drag(at(45.0, 40.0)));

        let sel = ctl.selection();
        assert!((sel.center_x - 40.0).abs() < 1e-9);
        assert!((sel.center_y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_clamps_to_bounds() {
        let mut ctl = CropController::default();
        ctl.set_size(40.0);
        ctl.begin_drag(at(50.0, 50.0));
        ctl.continue_drag(at(-500.0, 500.0));

        let sel = ctl.selection();
        assert_eq!(sel.center_x, 20.0);
        assert_eq!(sel.center_y, 80.0);
        assert!(sel.is_within_bounds());
    }

    #[test]
    fn test_end_drag_is_idempotent() {
        let mut ctl = CropController::default();
        ctl.end_drag();
        assert!(ctl.begin_drag(at(50.0, 50.0)));
        ctl.end_drag();
        ctl.end_drag();
        assert_eq!(ctl.drag_state(), DragState::Idle);
        assert!(!ctl.continue_drag(at(10.0, 10.0)));
    }

    #[test]
    fn test_set_size_clamps_to_hard_bounds() {
        let mut ctl = CropController::default();
        assert_eq!(ctl.set_size(150.0), 90.0);

        let mut ctl = CropController::default();
        assert_eq!(ctl.set_size(5.0), 20.0);
    }

    #[test]
    fn test_set_size_limited_by_center() {
        let mut ctl = CropController::default();
        ctl.set_size(20.0);
        ctl.begin_drag(at(50.0, 50.0));
        ctl.continue_drag(at(15.0, 50.0));
        ctl.end_drag();

        // center_x = 15 leaves room for a 30% circle
        assert_eq!(ctl.set_size(80.0), 30.0);
        assert!(ctl.selection().is_within_bounds());
    }

    #[test]
    fn test_set_size_ignores_nan() {
        let mut ctl = CropController::default();
        assert_eq!(ctl.set_size(f64::NAN), 80.0);
    }

    #[test]
    fn test_set_zoom_clamps() {
        let mut ctl = CropController::default();
        assert_eq!(ctl.set_zoom(10.0), 3.0);
        assert_eq!(ctl.set_zoom(0.1), 0.5);
        assert_eq!(ctl.set_zoom(1.75), 1.75);
        assert_eq!(ctl.set_zoom(f64::NAN), 1.75);
    }

    #[test]
    fn test_zoom_does_not_move_selection() {
        let mut ctl = CropController::default();
        let before = *ctl.selection();
        ctl.set_zoom(2.5);
        let after = ctl.selection();
        assert_eq!(after.center_x, before.center_x);
        assert_eq!(after.center_y, before.center_y);
        assert_eq!(after.size, before.size);
    }

    #[test]
    fn test_reset() {
        let mut ctl = CropController::default();
        ctl.set_size(30.0);
        ctl.set_zoom(2.0);
        ctl.begin_drag(at(50.0, 50.0));
        ctl.continue_drag(at(20.0, 20.0));

        ctl.reset();
        assert_eq!(*ctl.selection(), CropSelection::default());
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_nudge() {
        let mut ctl = CropController::default();
        ctl.set_size(20.0);
        ctl.nudge(5.0, -3.0);
        assert_eq!(ctl.selection().center_x, 55.0);
        assert_eq!(ctl.selection().center_y, 47.0);

        ctl.nudge(1000.0, 0.0);
        assert_eq!(ctl.selection().center_x, 90.0);
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_with_selection_repairs_input() {
        let sel = CropSelection {
            center_x: 95.0,
            center_y: -4.0,
            size: 120.0,
            scale: 9.0,
        };
        let ctl = CropController::with_selection(sel, SelectionLimits::default());
        let sel = ctl.selection();
        assert_eq!(sel.size, 90.0);
        assert_eq!(sel.scale, 3.0);
        assert_eq!(sel.center_x, 55.0);
        assert_eq!(sel.center_y, 45.0);
        assert!(sel.is_within_bounds());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
