//! Platform-neutral input events handed to a [`crate::app::FrameApp`].
//!
//! Coordinates are logical pixels (physical position divided by the window scale factor), so the
//! same hit boxes work on every display density.

use winit::event::{TouchPhase, VirtualKeyCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u64);

impl PointerId {
    pub const MOUSE: PointerId = PointerId(1);

    /// Touch ids live above the mouse id range so they never collide with it.
    pub fn touch(finger: u64) -> Self {
        PointerId(finger.wrapping_add(1 << 32))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PointerKind::Mouse => "mouse",
            PointerKind::Touch => "touch",
            PointerKind::Pen => "pen",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

impl PointerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PointerPhase::Down => "pointerdown",
            PointerPhase::Move => "pointermove",
            PointerPhase::Up => "pointerup",
            PointerPhase::Cancel => "pointercancel",
        }
    }
}

impl From<TouchPhase> for PointerPhase {
    fn from(phase: TouchPhase) -> Self {
        match phase {
            TouchPhase::Started => PointerPhase::Down,
            TouchPhase::Moved => PointerPhase::Move,
            TouchPhase::Ended => PointerPhase::Up,
            TouchPhase::Cancelled => PointerPhase::Cancel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub kind: PointerKind,
    pub phase: PointerPhase,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn mouse(phase: PointerPhase, x: f32, y: f32) -> Self {
        Self {
            id: PointerId::MOUSE,
            kind: PointerKind::Mouse,
            phase,
            x,
            y,
        }
    }

    pub fn touch(id: PointerId, phase: PointerPhase, x: f32, y: f32) -> Self {
        Self {
            id,
            kind: PointerKind::Touch,
            phase,
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    /// Positive `delta_y` scrolls the content down (towards the next scene).
    Wheel { delta_y: f32 },
    /// The window lost focus.
    Blur,
    Key(VirtualKeyCode),
}

/// Pixels per wheel "line" when the platform reports line deltas.
pub const WHEEL_LINE_PX: f32 = 40.0;
