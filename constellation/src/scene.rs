//! The narrative state machine.
//!
//! A [`ScenePlan`] is an ordered, validated list of [`SceneKind`]s; [`Story`] walks it. Ordinary
//! advancement stops at the `Hold` scene (the advance ceiling); only hold completion jumps to the
//! final `Resolved` scene and only replay goes back to the start. Every transition refreshes the
//! entry timestamp that scene-relative animation is computed from.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timers::OneShotTimers;

/// Lines revealed one after another on the memory scene.
pub const MEMORY_LINE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Trace,
    Intro,
    Glow,
    Memory,
    Question,
    Hold,
    Resolved,
}

impl SceneKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SceneKind::Trace => "trace",
            SceneKind::Intro => "intro",
            SceneKind::Glow => "glow",
            SceneKind::Memory => "memory",
            SceneKind::Question => "question",
            SceneKind::Hold => "hold",
            SceneKind::Resolved => "resolved",
        }
    }

    /// Position in the full narrative arc, independent of which scenes a plan includes. Visual
    /// intensity (star reveal, path drawing, warm grade) keys off this.
    pub fn ordinal(self) -> u32 {
        match self {
            SceneKind::Trace => 0,
            SceneKind::Intro => 1,
            SceneKind::Glow => 2,
            SceneKind::Memory => 3,
            SceneKind::Question => 4,
            SceneKind::Hold => 5,
            SceneKind::Resolved => 6,
        }
    }

    /// Scenes with a Continue control; these are also the only scenes the wheel advances.
    pub fn shows_continue(self) -> bool {
        matches!(
            self,
            SceneKind::Intro | SceneKind::Glow | SceneKind::Memory | SceneKind::Question
        )
    }

    pub fn reveals_path(self) -> bool {
        self.ordinal() >= SceneKind::Question.ordinal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneId(pub usize);

impl SceneId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("scene plan is empty")]
    Empty,
    #[error("scene plan must end with `resolved`")]
    MissingResolved,
    #[error("the scene before `resolved` must be `hold`")]
    HoldNotBeforeResolved,
    #[error("`trace` may only be the first scene")]
    TraceNotFirst,
    #[error("scene `{}` appears more than once", .0.as_str())]
    Duplicate(SceneKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SceneKind>", into = "Vec<SceneKind>")]
pub struct ScenePlan {
    scenes: Vec<SceneKind>,
}

impl ScenePlan {
    pub fn new(scenes: Vec<SceneKind>) -> Result<Self, PlanError> {
        let Some(&last) = scenes.last() else {
            return Err(PlanError::Empty);
        };
        if last != SceneKind::Resolved {
            return Err(PlanError::MissingResolved);
        }
        if scenes.len() < 2 || scenes[scenes.len() - 2] != SceneKind::Hold {
            return Err(PlanError::HoldNotBeforeResolved);
        }
        for (i, kind) in scenes.iter().enumerate() {
            if *kind == SceneKind::Trace && i != 0 {
                return Err(PlanError::TraceNotFirst);
            }
            if scenes[..i].contains(kind) {
                return Err(PlanError::Duplicate(*kind));
            }
        }
        Ok(Self { scenes })
    }

    /// `Intro → Glow → Memory → Question → Hold → Resolved`.
    pub fn standard() -> Self {
        Self {
            scenes: vec![
                SceneKind::Intro,
                SceneKind::Glow,
                SceneKind::Memory,
                SceneKind::Question,
                SceneKind::Hold,
                SceneKind::Resolved,
            ],
        }
    }

    /// `Intro → Hold → Resolved`.
    pub fn short() -> Self {
        Self {
            scenes: vec![SceneKind::Intro, SceneKind::Hold, SceneKind::Resolved],
        }
    }

    /// Prefixes the plan with the `Trace` pre-stage.
    pub fn with_trace(self) -> Result<Self, PlanError> {
        if self.has_trace() {
            return Err(PlanError::Duplicate(SceneKind::Trace));
        }
        let mut scenes = Vec::with_capacity(self.scenes.len() + 1);
        scenes.push(SceneKind::Trace);
        scenes.extend(self.scenes);
        Self::new(scenes)
    }

    /// Drops a leading `Trace` pre-stage, if any.
    pub fn without_trace(mut self) -> Self {
        if self.has_trace() {
            self.scenes.remove(0);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn kinds(&self) -> &[SceneKind] {
        &self.scenes
    }

    pub fn kind(&self, scene: SceneId) -> Option<SceneKind> {
        self.scenes.get(scene.0).copied()
    }

    pub fn index_of(&self, kind: SceneKind) -> Option<SceneId> {
        self.scenes.iter().position(|k| *k == kind).map(SceneId)
    }

    pub fn has_trace(&self) -> bool {
        self.scenes.first() == Some(&SceneKind::Trace)
    }

    pub fn initial(&self) -> SceneId {
        SceneId(0)
    }

    /// The advance ceiling.
    pub fn hold(&self) -> SceneId {
        SceneId(self.scenes.len() - 2)
    }

    pub fn resolved(&self) -> SceneId {
        SceneId(self.scenes.len() - 1)
    }
}

impl Default for ScenePlan {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<SceneKind>> for ScenePlan {
    type Error = PlanError;

    fn try_from(scenes: Vec<SceneKind>) -> Result<Self, Self::Error> {
        Self::new(scenes)
    }
}

impl From<ScenePlan> for Vec<SceneKind> {
    fn from(plan: ScenePlan) -> Self {
        plan.scenes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    Tap,
    Wheel,
    Key,
    TraceComplete,
    HoldComplete,
    Replay,
}

impl TransitionCause {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionCause::Tap => "tap",
            TransitionCause::Wheel => "wheel",
            TransitionCause::Key => "key",
            TransitionCause::TraceComplete => "trace-complete",
            TransitionCause::HoldComplete => "hold-complete",
            TransitionCause::Replay => "replay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SceneId,
    pub to: SceneId,
    pub cause: TransitionCause,
    pub at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneTimer {
    RevealMemoryLine(usize),
}

/// Timing knobs the story needs; built from the experience tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryTiming {
    pub transition_lock: Duration,
    pub memory_line_step: Duration,
}

#[derive(Debug)]
pub struct Story {
    plan: ScenePlan,
    timing: StoryTiming,
    current: SceneId,
    entered_at: Instant,
    last_transition_at: Option<Instant>,
    memory_lines: usize,
    timers: OneShotTimers<SceneTimer>,
}

impl Story {
    pub fn new(plan: ScenePlan, timing: StoryTiming, now: Instant) -> Self {
        let mut story = Self {
            current: plan.initial(),
            plan,
            timing,
            entered_at: now,
            last_transition_at: None,
            memory_lines: 0,
            timers: OneShotTimers::new(),
        };
        story.enter(story.current, now);
        story
    }

    pub fn plan(&self) -> &ScenePlan {
        &self.plan
    }

    pub fn current(&self) -> SceneId {
        self.current
    }

    pub fn kind(&self) -> SceneKind {
        self.plan.kinds()[self.current.0]
    }

    pub fn entered_at(&self) -> Instant {
        self.entered_at
    }

    pub fn scene_age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }

    pub fn is_resolved(&self) -> bool {
        self.current == self.plan.resolved()
    }

    /// True while advance is suppressed after the most recent transition. Mounting is not a
    /// transition, so the first scene is never locked.
    pub fn is_locked(&self, now: Instant) -> bool {
        self.last_transition_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.timing.transition_lock)
    }

    /// Moves one scene forward. No-op at (or past) the `Hold` ceiling and inside the transition
    /// lock window.
    pub fn advance(&mut self, cause: TransitionCause, now: Instant) -> Option<Transition> {
        if self.current >= self.plan.hold() || self.is_locked(now) {
            return None;
        }
        let to = SceneId(self.current.0 + 1);
        Some(self.transition(to, cause, now))
    }

    /// Unconditional move, used by hold completion and replay. Out-of-range targets are ignored.
    pub fn jump_to(&mut self, to: SceneId, cause: TransitionCause, now: Instant) -> Option<Transition> {
        if to.0 >= self.plan.len() {
            return None;
        }
        Some(self.transition(to, cause, now))
    }

    pub fn reset(&mut self, now: Instant) -> Transition {
        self.transition(self.plan.initial(), TransitionCause::Replay, now)
    }

    /// Fires due scene timers.
    pub fn tick(&mut self, now: Instant) {
        for timer in self.timers.drain_due(now) {
            match timer {
                SceneTimer::RevealMemoryLine(n) => {
                    self.memory_lines = self.memory_lines.max(n);
                }
            }
        }
    }

    /// Memory lines currently shown; 0 outside the memory scene.
    pub fn memory_lines_visible(&self) -> usize {
        self.memory_lines
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Drops all scheduled timers (teardown).
    pub fn cancel_timers(&mut self) {
        self.timers.cancel_all();
    }

    fn transition(&mut self, to: SceneId, cause: TransitionCause, now: Instant) -> Transition {
        let from = self.current;
        self.enter(to, now);
        self.last_transition_at = Some(now);
        tracing::debug!(
            from = from.0,
            to = to.0,
            scene = self.kind().as_str(),
            cause = cause.as_str(),
            "scene transition"
        );
        Transition {
            from,
            to,
            cause,
            at: now,
        }
    }

    fn enter(&mut self, to: SceneId, now: Instant) {
        self.current = to;
        self.entered_at = now;
        self.timers.cancel_all();
        self.memory_lines = 0;

        if self.kind() == SceneKind::Memory {
            self.memory_lines = 1;
            for n in 2..=MEMORY_LINE_COUNT {
                let delay = self.timing.memory_line_step * (n as u32 - 1);
                self.timers.schedule(now + delay, SceneTimer::RevealMemoryLine(n));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMING: StoryTiming = StoryTiming {
        transition_lock: Duration::from_millis(260),
        memory_line_step: Duration::from_millis(1450),
    };

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn without_trace_drops_only_the_pre_stage() {
        let traced = ScenePlan::short().with_trace().unwrap();
        assert_eq!(traced.without_trace(), ScenePlan::short());
        assert_eq!(ScenePlan::standard().without_trace(), ScenePlan::standard());
    }

    #[test]
    fn plan_validation_rejects_malformed_orders() {
        use SceneKind::*;
        assert_eq!(ScenePlan::new(vec![]), Err(PlanError::Empty));
        assert_eq!(
            ScenePlan::new(vec![Intro, Hold]),
            Err(PlanError::MissingResolved)
        );
        assert_eq!(
            ScenePlan::new(vec![Intro, Resolved]),
            Err(PlanError::HoldNotBeforeResolved)
        );
        assert_eq!(
            ScenePlan::new(vec![Intro, Trace, Hold, Resolved]),
            Err(PlanError::TraceNotFirst)
        );
        assert_eq!(
            ScenePlan::new(vec![Intro, Intro, Hold, Resolved]),
            Err(PlanError::Duplicate(Intro))
        );
        assert!(ScenePlan::short().with_trace().is_ok());
        assert!(
            ScenePlan::short()
                .with_trace()
                .and_then(ScenePlan::with_trace)
                .is_err()
        );
    }

    #[test]
    fn plan_deserializes_from_snake_case_names() {
        let plan: ScenePlan =
            serde_json::from_str(r#"["trace","intro","hold","resolved"]"#).unwrap();
        assert!(plan.has_trace());
        assert_eq!(plan.hold(), SceneId(2));
        assert!(serde_json::from_str::<ScenePlan>(r#"["intro","resolved"]"#).is_err());
    }

    #[test]
    fn advance_clamps_at_hold_scene() {
        let t0 = Instant::now();
        let mut story = Story::new(ScenePlan::standard(), TIMING, t0);
        let mut now = t0;
        for _ in 0..10 {
            now += ms(400);
            story.advance(TransitionCause::Tap, now);
        }
        assert_eq!(story.kind(), SceneKind::Hold);
        assert_eq!(story.current(), ScenePlan::standard().hold());
    }

    #[test]
    fn transition_lock_swallows_rapid_advances() {
        let t0 = Instant::now();
        let mut story = Story::new(ScenePlan::standard(), TIMING, t0);
        assert!(story.advance(TransitionCause::Tap, t0).is_some());
        assert!(story.advance(TransitionCause::Wheel, t0 + ms(10)).is_none());
        assert_eq!(story.current(), SceneId(1));
        assert!(story.advance(TransitionCause::Tap, t0 + ms(260)).is_some());
    }

    #[test]
    fn jump_to_ignores_lock_and_refreshes_entry() {
        let t0 = Instant::now();
        let mut story = Story::new(ScenePlan::short(), TIMING, t0);
        let resolved = story.plan().resolved();
        let tr = story
            .jump_to(resolved, TransitionCause::HoldComplete, t0 + ms(10))
            .unwrap();
        assert_eq!(tr.to, resolved);
        assert_eq!(story.entered_at(), t0 + ms(10));
        assert!(story.jump_to(SceneId(99), TransitionCause::Replay, t0).is_none());
    }

    #[test]
    fn memory_lines_are_staggered_and_cancelled_on_exit() {
        let t0 = Instant::now();
        let mut story = Story::new(ScenePlan::standard(), TIMING, t0);
        story.jump_to(SceneId(2), TransitionCause::Tap, t0);
        assert_eq!(story.kind(), SceneKind::Memory);
        assert_eq!(story.memory_lines_visible(), 1);

        story.tick(t0 + ms(1449));
        assert_eq!(story.memory_lines_visible(), 1);
        story.tick(t0 + ms(1450));
        assert_eq!(story.memory_lines_visible(), 2);
        story.tick(t0 + ms(2900));
        assert_eq!(story.memory_lines_visible(), 3);

        story.jump_to(SceneId(2), TransitionCause::Replay, t0 + ms(3000));
        story.advance(TransitionCause::Tap, t0 + ms(3400));
        assert_eq!(story.pending_timers(), 0);
        assert_eq!(story.memory_lines_visible(), 0);
    }
}
