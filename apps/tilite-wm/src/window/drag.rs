//! Pointer gestures: move, resize and swap.
//!
//! Everything here is pure; the manager owns the X side (grabs, cursors,
//! configure requests) and feeds pointer positions in.

use x11rb::protocol::xproto::{Timestamp, Window};

use crate::window::geometry::{clamp, snap_coordinate, Rect, MIN_WINDOW_SIZE};
use crate::window::keys::SHIFT;

pub const BUTTON_LEFT: u8 = 1;
pub const BUTTON_RIGHT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragOrigin {
    pub start_pointer_x: i32,
    pub start_pointer_y: i32,
    pub start_geometry: Rect,
}

impl DragOrigin {
    pub fn new(pointer: (i32, i32), geometry: Rect) -> Self {
        Self {
            start_pointer_x: pointer.0,
            start_pointer_y: pointer.1,
            start_geometry: geometry,
        }
    }

    fn delta(&self, pointer: (i32, i32)) -> (i32, i32) {
        (pointer.0 - self.start_pointer_x, pointer.1 - self.start_pointer_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Moving {
        window: Window,
        origin: DragOrigin,
    },
    Resizing {
        window: Window,
        origin: DragOrigin,
    },
    Swapping {
        window: Window,
        target: Option<Window>,
    },
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    /// The client being dragged, if any.
    pub fn subject(&self) -> Option<Window> {
        match *self {
            DragState::Idle => None,
            DragState::Moving { window, .. }
            | DragState::Resizing { window, .. }
            | DragState::Swapping { window, .. } => Some(window),
        }
    }
}

/// What a button press on a managed client turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    /// mod+shift+left on a tiled client.
    Swap,
    /// Plain left click.
    Focus,
    /// Start a move or resize. `tear_off` first turns the tiled client floating.
    Drag { tear_off: bool, resize: bool },
    /// mod+right on a tiled fixed-size client: it floats but cannot be resized.
    FloatOnly,
    Ignore,
}

pub fn classify_press(
    state: u16,
    button: u8,
    modkey: u16,
    floating: bool,
    fixed: bool,
) -> Press {
    let has_mod = state & modkey != 0;
    let left = button == BUTTON_LEFT;
    let right = button == BUTTON_RIGHT;

    if !left && !right {
        return Press::Ignore;
    }
    if has_mod && state & SHIFT != 0 && left && !floating {
        return Press::Swap;
    }
    if !has_mod {
        return if left { Press::Focus } else { Press::Ignore };
    }

    let tear_off = !floating;
    if fixed && right {
        return if tear_off { Press::FloatOnly } else { Press::Ignore };
    }
    Press::Drag { tear_off, resize: right }
}

/// Drops motion events that arrive too soon after the last accepted one.
#[derive(Debug, Clone, Copy)]
pub struct MotionThrottle {
    interval: Timestamp,
    last: Option<Timestamp>,
}

impl MotionThrottle {
    /// `rate` is in events per second and must not be zero.
    pub fn new(rate: u32) -> Self {
        Self {
            interval: 1000 / rate.max(1),
            last: None,
        }
    }

    pub fn accept(&mut self, time: Timestamp) -> bool {
        if let Some(last) = self.last {
            if time.wrapping_sub(last) < self.interval {
                return false;
            }
        }
        self.last = Some(time);
        true
    }
}

/// New top-left corner while moving, snapped against the screen edges using
/// the outer size.
pub fn move_position(
    origin: &DragOrigin,
    pointer: (i32, i32),
    border: i32,
    screen: (i32, i32),
    snap: i32,
) -> (i32, i32) {
    let (dx, dy) = origin.delta(pointer);
    let g = origin.start_geometry;
    let outer_w = g.width + 2 * border;
    let outer_h = g.height + 2 * border;
    (
        snap_coordinate(g.x + dx, outer_w, screen.0, snap),
        snap_coordinate(g.y + dy, outer_h, screen.1, snap),
    )
}

/// New size while resizing from the bottom-right corner. The window never
/// shrinks below `MIN_WINDOW_SIZE` nor grows past the screen edge.
pub fn resize_size(
    origin: &DragOrigin,
    pointer: (i32, i32),
    position: (i32, i32),
    screen: (i32, i32),
) -> (i32, i32) {
    let (dx, dy) = origin.delta(pointer);
    let g = origin.start_geometry;
    (
        clamp(g.width + dx, MIN_WINDOW_SIZE, screen.0 - position.0),
        clamp(g.height + dy, MIN_WINDOW_SIZE, screen.1 - position.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOD4: u16 = 1 << 6;

    #[test]
    fn test_press_classification() {
        let ms = MOD4 | SHIFT;
        assert_eq!(classify_press(ms, BUTTON_LEFT, MOD4, false, false), Press::Swap);
        // Swap needs a tiled client; a floating one is simply moved.
        assert_eq!(
            classify_press(ms, BUTTON_LEFT, MOD4, true, false),
            Press::Drag { tear_off: false, resize: false }
        );
        assert_eq!(classify_press(0, BUTTON_LEFT, MOD4, false, false), Press::Focus);
        assert_eq!(classify_press(0, BUTTON_RIGHT, MOD4, false, false), Press::Ignore);
        assert_eq!(
            classify_press(MOD4, BUTTON_LEFT, MOD4, false, false),
            Press::Drag { tear_off: true, resize: false }
        );
        assert_eq!(
            classify_press(MOD4, BUTTON_RIGHT, MOD4, true, false),
            Press::Drag { tear_off: false, resize: true }
        );
        assert_eq!(classify_press(MOD4, BUTTON_RIGHT, MOD4, true, true), Press::Ignore);
        assert_eq!(classify_press(MOD4, BUTTON_RIGHT, MOD4, false, true), Press::FloatOnly);
        assert_eq!(classify_press(MOD4, 2, MOD4, true, false), Press::Ignore);
    }

    #[test]
    fn test_throttle_drops_early_events() {
        let mut t = MotionThrottle::new(60);
        assert!(t.accept(1000));
        assert!(!t.accept(1010));
        assert!(!t.accept(1015));
        assert!(t.accept(1016));
        assert!(!t.accept(1020));
    }

    #[test]
    fn test_throttle_survives_timestamp_wrap() {
        let mut t = MotionThrottle::new(100);
        assert!(t.accept(u32::MAX - 5));
        assert!(!t.accept(2));
        assert!(t.accept(4));
    }

    #[test]
    fn test_move_snaps_to_left_edge() {
        let origin = DragOrigin::new((500, 300), Rect::new(100, 100, 200, 150));
        // Dragged 97px left: x would be 3, within the 5px snap distance.
        let (x, y) = move_position(&origin, (403, 300), 2, (1000, 600), 5);
        assert_eq!((x, y), (0, 100));
    }

    #[test]
    fn test_move_snaps_to_far_edge_with_border() {
        let origin = DragOrigin::new((0, 0), Rect::new(100, 100, 200, 150));
        // outer width 204; right edge lands at 998
        let (x, _) = move_position(&origin, (694, 0), 2, (1000, 600), 5);
        assert_eq!(x, 1000 - 204);

        let (x, _) = move_position(&origin, (300, 0), 2, (1000, 600), 5);
        assert_eq!(x, 400);
    }

    #[test]
    fn test_resize_clamped() {
        let origin = DragOrigin::new((0, 0), Rect::new(700, 400, 200, 100));
        assert_eq!(resize_size(&origin, (50, 20), (700, 400), (1000, 600)), (250, 120));
        assert_eq!(resize_size(&origin, (500, 500), (700, 400), (1000, 600)), (300, 200));
        assert_eq!(
            resize_size(&origin, (-500, -500), (700, 400), (1000, 600)),
            (MIN_WINDOW_SIZE, MIN_WINDOW_SIZE)
        );
    }

    #[test]
    fn test_subject() {
        assert_eq!(DragState::Idle.subject(), None);
        let s = DragState::Swapping { window: 4, target: Some(5) };
        assert_eq!(s.subject(), Some(4));
        assert!(!s.is_idle());
    }
}
