//! Turns raw pointer, wheel, key and focus events into narrative intents.
//!
//! The recognizer never draws and never touches the story directly: it reads layout geometry for
//! hit tests, tracks in-flight hold and swipe sessions, and returns [`Intent`]s for the caller to
//! apply. Every observed gesture is also written to the telemetry log.

mod hold;
mod swipe;
mod trace;

use std::time::{Duration, Instant};

use engine::input::{PointerEvent, PointerId, PointerPhase};
use winit::event::VirtualKeyCode;

pub use hold::{HoldCancel, HoldSession, HoldTracker};
pub use swipe::{SwipeOutcome, SwipeTracker};
pub use trace::{TraceProgress, TraceStep, bob, trace_positions};

use crate::assets::Vec2;
use crate::capture::PointerCapture;
use crate::config::Tunables;
use crate::layout::{HitFlags, HitTarget, SceneLayout};
use crate::scene::{SceneId, SceneKind, TransitionCause};
use crate::telemetry::{GestureTelemetry, TelemetryLog};

pub const WHEEL_TARGET: &str = "scene-scroll";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    Advance(TransitionCause),
    PointSelect(usize),
    HoldStart,
    HoldProgress(f32),
    HoldComplete,
    HoldCancel(HoldCancel),
    SwipeMove(f32),
    SwipeReset,
    SwipeSnapBack,
    Ripple { x: f32, y: f32 },
    ActivateLight,
    Replay,
    ToggleDebug,
}

/// What the recognizer needs to know about the current frame.
#[derive(Debug, Clone, Copy)]
pub struct GestureContext<'a> {
    pub scene: SceneId,
    pub kind: SceneKind,
    pub layout: &'a SceneLayout,
    pub flags: HitFlags,
    /// Background taps spawn ripples on this scene.
    pub ripples: bool,
    /// Trace stars in logical px, drift included.
    pub trace_points: &'a [Vec2],
}

/// Capture capability and telemetry sink the recognizer writes through.
pub struct GestureSinks<'a, C: PointerCapture + ?Sized> {
    pub capture: &'a mut C,
    pub telemetry: &'a mut TelemetryLog,
}

impl<C: PointerCapture + ?Sized> GestureSinks<'_, C> {
    fn note(
        &mut self,
        ctx: &GestureContext<'_>,
        event: &str,
        pointer_type: &str,
        target: &str,
        capture: bool,
    ) {
        self.telemetry.record(GestureTelemetry {
            event: event.to_string(),
            pointer_type: pointer_type.to_string(),
            target: target.to_string(),
            capture,
            scene: ctx.scene.index(),
        });
    }
}

#[derive(Debug)]
pub struct GestureRecognizer {
    wheel_delta_threshold: f32,
    wheel_debounce: Duration,
    snap_radius: f32,
    wheel_locked_until: Option<Instant>,
    hold: HoldTracker,
    swipe: SwipeTracker,
    trace: TraceProgress,
}

impl GestureRecognizer {
    pub fn new(tunables: &Tunables) -> Self {
        Self {
            wheel_delta_threshold: tunables.wheel_delta_threshold,
            wheel_debounce: tunables.wheel_debounce,
            snap_radius: tunables.snap_radius,
            wheel_locked_until: None,
            hold: HoldTracker::new(tunables.hold_duration),
            swipe: SwipeTracker::new(
                tunables.swipe_reset_threshold,
                tunables.swipe_fade_distance,
            ),
            trace: TraceProgress::default(),
        }
    }

    pub fn hold(&self) -> &HoldTracker {
        &self.hold
    }

    pub fn swipe(&self) -> &SwipeTracker {
        &self.swipe
    }

    pub fn trace(&self) -> &TraceProgress {
        &self.trace
    }

    pub fn hold_progress(&self, now: Instant) -> f32 {
        self.hold.progress(now)
    }

    pub fn handle_pointer<C: PointerCapture + ?Sized>(
        &mut self,
        ev: PointerEvent,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
        now: Instant,
    ) -> Vec<Intent> {
        match ev.phase {
            PointerPhase::Down => self.pointer_down(ev, ctx, sinks, now),
            PointerPhase::Move => self.pointer_move(ev, ctx, sinks),
            PointerPhase::Up | PointerPhase::Cancel => self.pointer_end(ev, ctx, sinks),
        }
    }

    fn pointer_down<C: PointerCapture + ?Sized>(
        &mut self,
        ev: PointerEvent,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
        now: Instant,
    ) -> Vec<Intent> {
        let pointer_type = ev.kind.as_str();
        if let Some(session) = self.hold.session() {
            let captured = sinks.capture.has_capture(session.owner);
            sinks.note(ctx, "pointerdown", pointer_type, &HitTarget::Hold.name(), captured);
            return Vec::new();
        }

        let target = ctx.layout.hit_test(ctx.kind, ev.x, ev.y, ctx.flags);
        if ctx.kind == SceneKind::Trace && target != HitTarget::DebugToggle {
            return self.trace_select(ev, ctx, sinks);
        }

        let name = target.name();
        match target {
            HitTarget::DebugToggle => {
                sinks.note(ctx, "pointerdown", pointer_type, &name, false);
                vec![Intent::ToggleDebug]
            }
            HitTarget::Continue(_) => {
                sinks.note(ctx, "advance", pointer_type, &name, false);
                vec![Intent::Advance(TransitionCause::Tap)]
            }
            HitTarget::CenterLight => {
                sinks.note(ctx, "pointerdown", pointer_type, &name, false);
                vec![Intent::ActivateLight]
            }
            HitTarget::Hold => {
                self.hold.arm(ev.id, ev.kind, now, &mut *sinks.capture);
                let captured = sinks.capture.has_capture(ev.id);
                sinks.note(ctx, "pointerdown", pointer_type, &name, captured);
                vec![Intent::HoldStart]
            }
            HitTarget::Replay => {
                sinks.note(ctx, "pointerdown", pointer_type, &name, false);
                vec![Intent::Replay]
            }
            HitTarget::Background => {
                sinks.note(ctx, "pointerdown", pointer_type, &name, false);
                let mut intents = Vec::new();
                if ctx.kind == SceneKind::Resolved && self.swipe.begin(ev.id, ev.x) {
                    intents.push(Intent::SwipeMove(0.0));
                }
                if ctx.ripples {
                    intents.push(Intent::Ripple { x: ev.x, y: ev.y });
                }
                intents
            }
        }
    }

    fn trace_select<C: PointerCapture + ?Sized>(
        &mut self,
        ev: PointerEvent,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
    ) -> Vec<Intent> {
        let pointer_type = ev.kind.as_str();
        let expected = self.trace.expected();
        match self
            .trace
            .select(ctx.trace_points, Vec2::new(ev.x, ev.y), self.snap_radius)
        {
            Some(TraceStep::Point(index)) => {
                sinks.note(ctx, "pointerdown", pointer_type, &format!("trace-star-{index}"), false);
                vec![Intent::PointSelect(index)]
            }
            Some(TraceStep::Complete(index)) => {
                sinks.note(ctx, "advance", pointer_type, &format!("trace-star-{index}"), false);
                vec![
                    Intent::PointSelect(index),
                    Intent::Advance(TransitionCause::TraceComplete),
                ]
            }
            None => {
                tracing::debug!(expected, x = ev.x, y = ev.y, "trace tap missed");
                sinks.note(ctx, "pointerdown", pointer_type, "background", false);
                Vec::new()
            }
        }
    }

    fn pointer_move<C: PointerCapture + ?Sized>(
        &mut self,
        ev: PointerEvent,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
    ) -> Vec<Intent> {
        if self.hold.is_owner(ev.id) {
            let hold_target = HitTarget::Hold.name();
            if ctx.layout.hold_button.contains_point(ev.x, ev.y) {
                let captured = sinks.capture.has_capture(ev.id);
                sinks.note(ctx, "pointermove", ev.kind.as_str(), &hold_target, captured);
                return Vec::new();
            }
            return self.cancel_hold(HoldCancel::LeftTarget, ev.kind.as_str(), ctx, sinks);
        }

        match self.swipe.update(ev.id, ev.x) {
            Some(dx) => vec![Intent::SwipeMove(dx)],
            None => Vec::new(),
        }
    }

    fn pointer_end<C: PointerCapture + ?Sized>(
        &mut self,
        ev: PointerEvent,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
    ) -> Vec<Intent> {
        if self.hold.is_owner(ev.id) {
            let reason = if ev.phase == PointerPhase::Cancel {
                HoldCancel::PointerCancel
            } else {
                HoldCancel::PointerUp
            };
            return self.cancel_hold(reason, ev.kind.as_str(), ctx, sinks);
        }

        if ev.phase == PointerPhase::Cancel {
            return match self.swipe.update(ev.id, ev.x) {
                Some(_) => {
                    self.swipe.cancel();
                    vec![Intent::SwipeSnapBack]
                }
                None => Vec::new(),
            };
        }

        match self.swipe.finish(ev.id, ev.x) {
            Some(SwipeOutcome::Reset) => {
                sinks.note(ctx, "swipe", ev.kind.as_str(), "background", false);
                vec![Intent::SwipeReset]
            }
            Some(SwipeOutcome::SnapBack) => vec![Intent::SwipeSnapBack],
            None => Vec::new(),
        }
    }

    fn cancel_hold<C: PointerCapture + ?Sized>(
        &mut self,
        reason: HoldCancel,
        pointer_type: &str,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
    ) -> Vec<Intent> {
        if self.hold.cancel(&mut *sinks.capture).is_none() {
            return Vec::new();
        }
        sinks.note(ctx, reason.as_str(), pointer_type, &HitTarget::Hold.name(), false);
        vec![Intent::HoldCancel(reason)]
    }

    /// Wheel advance: only on scenes with a Continue control, only past the delta threshold and
    /// only outside the debounce window.
    pub fn handle_wheel<C: PointerCapture + ?Sized>(
        &mut self,
        delta_y: f32,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
        now: Instant,
    ) -> Option<Intent> {
        if !ctx.kind.shows_continue() || !(delta_y.abs() >= self.wheel_delta_threshold) {
            return None;
        }
        if self.wheel_locked_until.is_some_and(|until| now < until) {
            return None;
        }
        self.wheel_locked_until = Some(now + self.wheel_debounce);
        sinks.note(ctx, "advance", "wheel", WHEEL_TARGET, false);
        Some(Intent::Advance(TransitionCause::Wheel))
    }

    pub fn handle_key<C: PointerCapture + ?Sized>(
        &mut self,
        key: VirtualKeyCode,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
    ) -> Option<Intent> {
        match key {
            VirtualKeyCode::Space
            | VirtualKeyCode::Return
            | VirtualKeyCode::Right
            | VirtualKeyCode::Down
                if ctx.kind.shows_continue() =>
            {
                let target = HitTarget::Continue(ctx.kind.ordinal()).name();
                sinks.note(ctx, "advance", "keyboard", &target, false);
                Some(Intent::Advance(TransitionCause::Key))
            }
            VirtualKeyCode::F3 if ctx.flags.debug_toggle => Some(Intent::ToggleDebug),
            _ => None,
        }
    }

    /// Window focus loss: cancels an armed hold and snaps back an in-flight swipe.
    pub fn handle_blur<C: PointerCapture + ?Sized>(
        &mut self,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
    ) -> Vec<Intent> {
        let pointer_type = self
            .hold
            .session()
            .map_or("-", |s| s.kind.as_str());
        let mut intents = self.cancel_hold(HoldCancel::Blur, pointer_type, ctx, sinks);
        if self.swipe.cancel() {
            intents.push(Intent::SwipeSnapBack);
        }
        intents
    }

    /// Per-frame hold check. Completion releases capture and is reported exactly once.
    pub fn poll_hold<C: PointerCapture + ?Sized>(
        &mut self,
        ctx: &GestureContext<'_>,
        sinks: &mut GestureSinks<'_, C>,
        now: Instant,
    ) -> Option<Intent> {
        let session = self.hold.session()?;
        match self.hold.poll(now, &mut *sinks.capture) {
            Some(_) => {
                sinks.note(ctx, "hold-complete", session.kind.as_str(), &HitTarget::Hold.name(), false);
                Some(Intent::HoldComplete)
            }
            None => Some(Intent::HoldProgress(self.hold.progress(now))),
        }
    }

    /// Drops every session (releasing capture) and the trace progress.
    pub fn reset<C: PointerCapture + ?Sized>(&mut self, capture: &mut C) {
        if let Some(session) = self.hold.cancel(capture) {
            tracing::debug!(owner = session.owner.0, "hold dropped on reset");
        }
        self.swipe.cancel();
        self.trace.reset();
        self.wheel_locked_until = None;
    }

    pub fn owns_pointer(&self, id: PointerId) -> bool {
        self.hold.is_owner(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureRegistry;
    use engine::input::PointerKind;
    use engine::surface::Viewport;

    struct Harness {
        layout: SceneLayout,
        capture: CaptureRegistry,
        log: TelemetryLog,
        rec: GestureRecognizer,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                layout: SceneLayout::new(Viewport::new(800.0, 600.0, 1.0)),
                capture: CaptureRegistry::new(),
                log: TelemetryLog::new(32),
                rec: GestureRecognizer::new(&Tunables::default()),
            }
        }

        fn pointer(&mut self, kind: SceneKind, ev: PointerEvent, now: Instant) -> Vec<Intent> {
            let ctx = GestureContext {
                scene: SceneId(kind.ordinal() as usize),
                kind,
                layout: &self.layout,
                flags: HitFlags::default(),
                ripples: true,
                trace_points: &[],
            };
            let mut sinks = GestureSinks {
                capture: &mut self.capture,
                telemetry: &mut self.log,
            };
            self.rec.handle_pointer(ev, &ctx, &mut sinks, now)
        }

        fn wheel(&mut self, kind: SceneKind, delta_y: f32, now: Instant) -> Option<Intent> {
            let ctx = GestureContext {
                scene: SceneId(0),
                kind,
                layout: &self.layout,
                flags: HitFlags::default(),
                ripples: false,
                trace_points: &[],
            };
            let mut sinks = GestureSinks {
                capture: &mut self.capture,
                telemetry: &mut self.log,
            };
            self.rec.handle_wheel(delta_y, &ctx, &mut sinks, now)
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn wheel_needs_threshold_and_respects_debounce() {
        let t0 = Instant::now();
        let mut h = Harness::new();
        assert_eq!(h.wheel(SceneKind::Intro, 10.0, t0), None);
        assert_eq!(
            h.wheel(SceneKind::Intro, 40.0, t0),
            Some(Intent::Advance(TransitionCause::Wheel))
        );
        assert_eq!(h.wheel(SceneKind::Intro, 40.0, t0 + ms(379)), None);
        assert!(h.wheel(SceneKind::Intro, -40.0, t0 + ms(380)).is_some());
        assert_eq!(h.wheel(SceneKind::Hold, 400.0, t0 + ms(2000)), None);
        assert_eq!(h.log.last().map(|e| e.target.as_str()), Some(WHEEL_TARGET));
    }

    #[test]
    fn hold_cancels_when_owner_leaves_target() {
        let t0 = Instant::now();
        let mut h = Harness::new();
        let (x, y) = h.layout.hold_button.center();

        let down = PointerEvent::mouse(PointerPhase::Down, x, y);
        assert_eq!(h.pointer(SceneKind::Hold, down, t0), vec![Intent::HoldStart]);
        assert!(h.capture.has_capture(PointerId::MOUSE));
        assert!(h.log.last().is_some_and(|e| e.capture));

        let foreign = PointerEvent::touch(PointerId::touch(7), PointerPhase::Move, 0.0, 0.0);
        assert!(h.pointer(SceneKind::Hold, foreign, t0 + ms(100)).is_empty());
        assert!(h.rec.hold().is_armed());

        let away = PointerEvent::mouse(PointerPhase::Move, 5.0, 5.0);
        assert_eq!(
            h.pointer(SceneKind::Hold, away, t0 + ms(800)),
            vec![Intent::HoldCancel(HoldCancel::LeftTarget)]
        );
        assert_eq!(h.capture.held_count(), 0);
        assert_eq!(h.rec.hold_progress(t0 + ms(900)), 0.0);
    }

    #[test]
    fn background_tap_on_resolved_starts_swipe() {
        let t0 = Instant::now();
        let mut h = Harness::new();
        let down = PointerEvent {
            id: PointerId::touch(1),
            kind: PointerKind::Touch,
            phase: PointerPhase::Down,
            x: 400.0,
            y: 200.0,
        };
        let intents = h.pointer(SceneKind::Resolved, down, t0);
        assert_eq!(intents[0], Intent::SwipeMove(0.0));

        let up = PointerEvent { phase: PointerPhase::Up, x: 250.0, ..down };
        assert_eq!(h.pointer(SceneKind::Resolved, up, t0 + ms(300)), vec![Intent::SwipeReset]);
    }

    #[test]
    fn continue_tap_is_reported_as_advance() {
        let t0 = Instant::now();
        let mut h = Harness::new();
        let (x, y) = h.layout.continue_button.center();
        let intents = h.pointer(SceneKind::Intro, PointerEvent::mouse(PointerPhase::Down, x, y), t0);
        assert_eq!(intents, vec![Intent::Advance(TransitionCause::Tap)]);
        let last = h.log.last().cloned().unwrap();
        assert_eq!(last.event, "advance");
        assert_eq!(last.target, "scene-1-next");
        assert_eq!(last.pointer_type, "mouse");
    }
}
