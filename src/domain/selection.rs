//! Region selection state machine
//!
//! Drives the drag gesture over the full-screen selection surface: arm, press
//! to anchor, drag to grow the candidate, release to emit. At most one region
//! is emitted per gesture. The overlay that renders the dimmed surface, the
//! crosshair cursor and the exclusive pointer grab keys those effects off
//! [`RegionSelector::is_active`]; this machine owns only the gesture state.

use super::geometry::{Point, Region};

/// Gesture state for the selection surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectorState {
    /// No selection in progress
    #[default]
    Inactive,
    /// Surface shown, waiting for the first press
    Armed,
    /// Primary button held, candidate tracking the pointer
    Dragging,
}

/// Drag-selection state machine producing one normalized [`Region`] per gesture
#[derive(Debug, Default)]
pub struct RegionSelector {
    state: SelectorState,
    anchor: Option<Point>,
    candidate: Option<Region>,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate the selector, dropping any leftover state from a prior gesture
    pub fn arm(&mut self) {
        self.anchor = None;
        self.candidate = None;
        self.state = SelectorState::Armed;
    }

    /// Abort the gesture without emitting anything
    pub fn disarm(&mut self) {
        self.anchor = None;
        self.candidate = None;
        self.state = SelectorState::Inactive;
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    /// True while the selection surface should hold exclusive pointer input
    pub fn is_active(&self) -> bool {
        self.state != SelectorState::Inactive
    }

    /// Candidate rectangle for the overlay cut-out, if a drag is in progress
    pub fn candidate(&self) -> Option<Region> {
        self.candidate
    }

    /// Primary button press: anchors the drag
    ///
    /// Ignored unless the selector is armed, so stray presses while inactive
    /// never start a gesture.
    pub fn pointer_pressed(&mut self, position: Point) {
        if self.state != SelectorState::Armed {
            return;
        }
        self.anchor = Some(position);
        self.candidate = Some(Region::from_corners(position, position));
        self.state = SelectorState::Dragging;
    }

    /// Pointer motion: recomputes the candidate and returns it for redraw
    pub fn pointer_moved(&mut self, position: Point) -> Option<Region> {
        let anchor = match (self.state, self.anchor) {
            (SelectorState::Dragging, Some(anchor)) => anchor,
            _ => return None,
        };
        let candidate = Region::from_corners(anchor, position);
        self.candidate = Some(candidate);
        Some(candidate)
    }

    /// Primary button release: ends the gesture
    ///
    /// Returns the final region iff it has nonzero area; a click without a
    /// drag emits nothing. All gesture state is cleared on exit regardless of
    /// outcome, so a second release cannot emit again.
    pub fn pointer_released(&mut self, position: Point) -> Option<Region> {
        if self.state != SelectorState::Dragging {
            return None;
        }
        let final_region = self
            .anchor
            .map(|anchor| Region::from_corners(anchor, position));
        self.disarm();
        final_region.filter(|region| !region.is_empty())
    }
}
