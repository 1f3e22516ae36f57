use std::time::{Duration, Instant};

use engine::input::{PointerId, PointerKind};

use crate::capture::PointerCapture;

/// Why an armed hold ended without completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldCancel {
    PointerUp,
    PointerCancel,
    LeftTarget,
    Blur,
}

impl HoldCancel {
    pub fn as_str(self) -> &'static str {
        match self {
            HoldCancel::PointerUp => "pointerup",
            HoldCancel::PointerCancel => "pointercancel",
            HoldCancel::LeftTarget => "pointermove",
            HoldCancel::Blur => "blur",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldSession {
    pub owner: PointerId,
    pub kind: PointerKind,
    pub started: Instant,
}

/// `idle → armed → {completed | cancelled} → idle`.
///
/// Capture is acquired on arm and released on every way out of the armed state.
#[derive(Debug)]
pub struct HoldTracker {
    duration: Duration,
    session: Option<HoldSession>,
}

impl HoldTracker {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            session: None,
        }
    }

    pub fn session(&self) -> Option<HoldSession> {
        self.session
    }

    pub fn is_armed(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_owner(&self, id: PointerId) -> bool {
        self.session.is_some_and(|s| s.owner == id)
    }

    /// Starts a session. A second pointer-down while armed is ignored.
    pub fn arm<C: PointerCapture + ?Sized>(
        &mut self,
        id: PointerId,
        kind: PointerKind,
        now: Instant,
        capture: &mut C,
    ) -> bool {
        if self.session.is_some() {
            return false;
        }
        capture.set_capture(id);
        self.session = Some(HoldSession {
            owner: id,
            kind,
            started: now,
        });
        true
    }

    /// `min(elapsed / duration, 1)`; 0 while idle.
    pub fn progress(&self, now: Instant) -> f32 {
        let Some(session) = self.session else {
            return 0.0;
        };
        let elapsed = now.saturating_duration_since(session.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Completes the session once progress reaches 1. Returns the finished session exactly once.
    pub fn poll<C: PointerCapture + ?Sized>(
        &mut self,
        now: Instant,
        capture: &mut C,
    ) -> Option<HoldSession> {
        if self.progress(now) < 1.0 {
            return None;
        }
        let session = self.session.take()?;
        capture.release_capture(session.owner);
        Some(session)
    }

    /// Drops the session and releases its capture. Returns the cancelled session, if any.
    pub fn cancel<C: PointerCapture + ?Sized>(&mut self, capture: &mut C) -> Option<HoldSession> {
        let session = self.session.take()?;
        if capture.has_capture(session.owner) {
            capture.release_capture(session.owner);
        }
        Some(session)
    }
}
