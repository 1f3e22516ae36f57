use engine::input::PointerId;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SwipeSession {
    owner: PointerId,
    start_x: f32,
    dx: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    Reset,
    SnapBack,
}

/// Horizontal drag on the resolved scene. The offset follows the pointer 1:1 and fades with
/// distance; letting go past the threshold resets the story.
#[derive(Debug)]
pub struct SwipeTracker {
    reset_threshold: f32,
    fade_distance: f32,
    session: Option<SwipeSession>,
}

impl SwipeTracker {
    pub fn new(reset_threshold: f32, fade_distance: f32) -> Self {
        Self {
            reset_threshold,
            fade_distance: fade_distance.max(1.0),
            session: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn begin(&mut self, id: PointerId, x: f32) -> bool {
        if self.session.is_some() {
            return false;
        }
        self.session = Some(SwipeSession {
            owner: id,
            start_x: x,
            dx: 0.0,
        });
        true
    }

    /// Tracks the owner's position; other pointers are ignored.
    pub fn update(&mut self, id: PointerId, x: f32) -> Option<f32> {
        let session = self.session.as_mut().filter(|s| s.owner == id)?;
        session.dx = x - session.start_x;
        Some(session.dx)
    }

    pub fn finish(&mut self, id: PointerId, x: f32) -> Option<SwipeOutcome> {
        self.update(id, x)?;
        let session = self.session.take()?;
        Some(if session.dx.abs() > self.reset_threshold {
            SwipeOutcome::Reset
        } else {
            SwipeOutcome::SnapBack
        })
    }

    pub fn cancel(&mut self) -> bool {
        self.session.take().is_some()
    }

    pub fn offset(&self) -> f32 {
        self.session.map_or(0.0, |s| s.dx)
    }

    pub fn opacity(&self) -> f32 {
        (1.0 - self.offset().abs() / self.fade_distance).clamp(0.0, 1.0)
    }
}
