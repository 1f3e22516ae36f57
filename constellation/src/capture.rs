use std::collections::BTreeSet;

use engine::input::PointerId;

/// Pointer capture: while held, every event for that pointer id is routed to the capturing
/// control regardless of where the pointer goes.
pub trait PointerCapture {
    fn set_capture(&mut self, id: PointerId);
    fn release_capture(&mut self, id: PointerId);
    fn has_capture(&self, id: PointerId) -> bool;
}

/// In-process capture bookkeeping. The window already delivers all pointer events to the app, so
/// tracking which ids are captured is all there is to do.
#[derive(Debug, Default, Clone)]
pub struct CaptureRegistry {
    held: BTreeSet<PointerId>,
}

impl CaptureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }
}

impl PointerCapture for CaptureRegistry {
    fn set_capture(&mut self, id: PointerId) {
        self.held.insert(id);
    }

    fn release_capture(&mut self, id: PointerId) {
        self.held.remove(&id);
    }

    fn has_capture(&self, id: PointerId) -> bool {
        self.held.contains(&id)
    }
}
