//! The one type the frame loop talks to.
//!
//! Owns the story, the gesture recognizer, pointer capture, telemetry, transient effects, the
//! painter and the decorative text. Input is applied as it is drained; `frame` fires due timers,
//! polls the hold session and only then paints, so a hold that completes during a frame shows up
//! in that frame.

use std::time::Instant;

use engine::app::FrameApp;
use engine::graphics::Renderer2d;
use engine::input::{InputEvent, PointerPhase};
use engine::surface::{SurfaceSize, Viewport};

use crate::assets::{PointSets, Vec2};
use crate::capture::{CaptureRegistry, PointerCapture};
use crate::config::ExperienceConfig;
use crate::effects::Effects;
use crate::gesture::{GestureContext, GestureRecognizer, GestureSinks, Intent, trace_positions};
use crate::layout::{HitFlags, SceneLayout};
use crate::overlay::{self, DebugPanel, OverlayView};
use crate::quote::{DecorativeText, TextProvider};
use crate::render::{FrameView, SceneRenderer};
use crate::scene::{PlanError, SceneId, SceneKind, Story, StoryTiming, Transition, TransitionCause};
use crate::telemetry::TelemetryLog;

pub struct Experience<C: PointerCapture = CaptureRegistry> {
    config: ExperienceConfig,
    story: Story,
    gestures: GestureRecognizer,
    capture: C,
    telemetry: TelemetryLog,
    effects: Effects,
    renderer: SceneRenderer,
    quote: DecorativeText,
    viewport: Viewport,
    layout: SceneLayout,
    backing: SurfaceSize,
    mounted_at: Instant,
    hold_ratio: f32,
    light_on: bool,
    debug_open: bool,
    transitions: Vec<Transition>,
    mounted: bool,
}

impl Experience<CaptureRegistry> {
    pub fn mount(
        config: ExperienceConfig,
        points: PointSets,
        now: Instant,
    ) -> Result<Self, PlanError> {
        Self::mount_with_capture(config, points, CaptureRegistry::new(), now)
    }
}

impl<C: PointerCapture> Experience<C> {
    pub fn mount_with_capture(
        config: ExperienceConfig,
        points: PointSets,
        capture: C,
        now: Instant,
    ) -> Result<Self, PlanError> {
        let mut config = config.sanitized();
        if points.trace.is_empty() && (config.trace_stage || config.scenes.has_trace()) {
            tracing::warn!("no trace stars configured; skipping the trace stage");
            config.trace_stage = false;
            config.scenes = config.scenes.without_trace();
        }
        let plan = config.plan()?;
        let tunables = config.tunables;
        let timing = StoryTiming {
            transition_lock: tunables.transition_lock,
            memory_line_step: config.motion.memory_line_step(&tunables),
        };
        let viewport = Viewport::new(0.0, 0.0, 1.0);

        tracing::info!(
            scenes = plan.len(),
            reduced_motion = config.motion.reduced_motion,
            low_power = config.motion.low_power,
            "experience mounted"
        );

        Ok(Self {
            story: Story::new(plan, timing, now),
            gestures: GestureRecognizer::new(&tunables),
            capture,
            telemetry: TelemetryLog::new(tunables.telemetry_capacity),
            effects: Effects::new(&tunables),
            renderer: SceneRenderer::new(points, config.motion, tunables, config.ambient),
            quote: DecorativeText::new(config.text.fallback_quote.clone()),
            viewport,
            layout: SceneLayout::new(viewport),
            backing: SurfaceSize::new(0, 0),
            mounted_at: now,
            hold_ratio: 0.0,
            light_on: false,
            debug_open: false,
            transitions: Vec::new(),
            mounted: true,
            config,
        })
    }

    /// Starts fetching the decorative quote; the fallback shows until it arrives.
    pub fn with_quote_provider(mut self, provider: &dyn TextProvider) -> Self {
        self.quote =
            DecorativeText::with_provider(self.config.text.fallback_quote.clone(), provider);
        self
    }

    pub fn config(&self) -> &ExperienceConfig {
        &self.config
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn scene(&self) -> SceneId {
        self.story.current()
    }

    pub fn kind(&self) -> SceneKind {
        self.story.kind()
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn backing_size(&self) -> SurfaceSize {
        self.backing
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn telemetry(&self) -> &TelemetryLog {
        &self.telemetry
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn gestures(&self) -> &GestureRecognizer {
        &self.gestures
    }

    /// Hold progress as of the last input or frame.
    pub fn hold_ratio(&self) -> f32 {
        self.hold_ratio
    }

    pub fn light_on(&self) -> bool {
        self.light_on
    }

    pub fn debug_open(&self) -> bool {
        self.debug_open
    }

    /// The input debug panel, when the debug overlay is enabled.
    pub fn debug_panel(&self) -> Option<DebugPanel<'_>> {
        self.config.debug_overlay.then(|| DebugPanel {
            label: &self.config.text.debug_label,
            open: self.debug_open,
            last: self.telemetry.last(),
            scene: self.story.current().index(),
            light_on: self.light_on,
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn quote_text(&self) -> &str {
        self.quote.text()
    }

    pub fn path_reveal(&self, now: Instant) -> f32 {
        self.renderer
            .path_reveal(self.story.kind(), self.story.scene_age(now))
    }

    /// Transitions since the last call, oldest first.
    pub fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    pub fn static_content(&self) -> String {
        overlay::static_content(&self.config)
    }

    /// Applies a new viewport. Returns the backing-store size to draw at, or `None` for a
    /// zero-sized viewport (which is ignored). Narrative state is untouched.
    pub fn resize(&mut self, viewport: Viewport) -> Option<SurfaceSize> {
        if !self.mounted || viewport.is_empty() {
            return None;
        }
        let max_dpr = self
            .config
            .motion
            .max_device_pixel_ratio(&self.config.tunables);
        self.viewport = viewport;
        self.layout = SceneLayout::new(viewport);
        self.backing = viewport.backing_size(max_dpr);
        tracing::info!(
            width = viewport.width,
            height = viewport.height,
            dpr = viewport.device_pixel_ratio,
            backing_w = self.backing.width,
            backing_h = self.backing.height,
            "viewport resized"
        );
        Some(self.backing)
    }

    fn time_ms(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.mounted_at).as_secs_f32() * 1000.0
    }

    fn hit_flags(&self) -> HitFlags {
        HitFlags {
            debug_toggle: self.config.debug_overlay,
            center_light: self.config.ambient.center_light,
        }
    }

    /// Trace stars in logical px at `now`, drift included.
    pub fn trace_points(&self, now: Instant) -> Vec<Vec2> {
        if self.story.kind() != SceneKind::Trace {
            return Vec::new();
        }
        trace_positions(
            &self.renderer.points().trace,
            self.viewport.width,
            self.viewport.height,
            self.time_ms(now),
            self.config.motion.reduced_motion,
        )
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        if !self.mounted {
            return;
        }
        if let InputEvent::Pointer(ev) = event {
            if matches!(ev.phase, PointerPhase::Down | PointerPhase::Move) {
                self.renderer.track_pointer(
                    ev.x,
                    ev.y,
                    self.viewport.width,
                    self.viewport.height,
                );
            }
        }

        let kind = self.story.kind();
        let trace_points = self.trace_points(now);
        let ctx = GestureContext {
            scene: self.story.current(),
            kind,
            layout: &self.layout,
            flags: self.hit_flags(),
            ripples: self.config.ambient.ripples_on(kind),
            trace_points: &trace_points,
        };
        let mut sinks = GestureSinks {
            capture: &mut self.capture,
            telemetry: &mut self.telemetry,
        };

        let intents = match event {
            InputEvent::Pointer(ev) => self.gestures.handle_pointer(ev, &ctx, &mut sinks, now),
            InputEvent::Wheel { delta_y } => self
                .gestures
                .handle_wheel(delta_y, &ctx, &mut sinks, now)
                .into_iter()
                .collect(),
            InputEvent::Key(key) => self
                .gestures
                .handle_key(key, &ctx, &mut sinks)
                .into_iter()
                .collect(),
            InputEvent::Blur => self.gestures.handle_blur(&ctx, &mut sinks),
        };
        for intent in intents {
            self.apply(intent, now);
        }
    }

    /// Fires due scene timers and polls the hold session. Called at the top of every frame.
    pub fn tick(&mut self, now: Instant) {
        if !self.mounted {
            return;
        }
        self.story.tick(now);

        let kind = self.story.kind();
        let ctx = GestureContext {
            scene: self.story.current(),
            kind,
            layout: &self.layout,
            flags: self.hit_flags(),
            ripples: false,
            trace_points: &[],
        };
        let mut sinks = GestureSinks {
            capture: &mut self.capture,
            telemetry: &mut self.telemetry,
        };
        if let Some(intent) = self.gestures.poll_hold(&ctx, &mut sinks, now) {
            self.apply(intent, now);
        }

        self.effects.prune(now);
        self.quote.poll();
    }

    pub fn frame(&mut self, gfx: &mut dyn Renderer2d, now: Instant) {
        if !self.mounted {
            return;
        }
        self.tick(now);

        let scene_age = self.story.scene_age(now);
        let trace_points = self.trace_points(now);
        let view = FrameView {
            width: self.viewport.width,
            height: self.viewport.height,
            kind: self.story.kind(),
            scene_age,
            time_ms: self.time_ms(now),
            hold_progress: self.hold_ratio,
            light_on: self.light_on,
            trace_points: &trace_points,
            trace_next: self.gestures.trace().expected(),
            effects: &self.effects,
            layout: &self.layout,
            now,
        };
        self.renderer.draw(gfx, &view);

        if self.viewport.is_empty() {
            return;
        }
        let s = gfx.size().width as f32 / self.viewport.width;
        let swipe = self.gestures.swipe();
        let debug = self.debug_panel();
        let overlay_view = OverlayView {
            kind: self.story.kind(),
            scene_age,
            layout: &self.layout,
            text: &self.config.text,
            memory_lines: self.story.memory_lines_visible(),
            quote: self.quote.text(),
            swipe_offset: swipe.offset(),
            swipe_opacity: swipe.opacity(),
            reduced_motion: self.config.motion.reduced_motion,
            debug,
        };
        overlay::draw_overlay(gfx, &overlay_view, s);
    }

    /// Programmatic advance, subject to the same rules as a Continue tap.
    pub fn advance(&mut self, cause: TransitionCause, now: Instant) -> bool {
        if !self.mounted || self.gestures.hold().is_armed() {
            return false;
        }
        match self.story.advance(cause, now) {
            Some(t) => {
                self.transitions.push(t);
                true
            }
            None => false,
        }
    }

    /// Back to the initial scene with every gesture, effect and presentation flag cleared.
    pub fn replay(&mut self, now: Instant) {
        if !self.mounted {
            return;
        }
        self.gestures.reset(&mut self.capture);
        self.effects.clear();
        self.renderer.reset();
        self.hold_ratio = 0.0;
        self.light_on = false;
        let t = self.story.reset(now);
        self.transitions.push(t);
    }

    /// Releases capture, cancels timers and drops the quote request. Later input and frames are
    /// ignored.
    pub fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.gestures.reset(&mut self.capture);
        self.story.cancel_timers();
        self.effects.clear();
        self.quote.abandon();
        self.hold_ratio = 0.0;
        self.mounted = false;
        tracing::info!(
            scene = self.story.kind().as_str(),
            gestures = self.telemetry.len(),
            "experience torn down"
        );
    }

    fn apply(&mut self, intent: Intent, now: Instant) {
        match intent {
            Intent::Advance(TransitionCause::TraceComplete) => {
                let next = SceneId(self.story.current().index() + 1);
                if let Some(t) = self.story.jump_to(next, TransitionCause::TraceComplete, now) {
                    self.transitions.push(t);
                }
            }
            Intent::Advance(cause) => {
                self.advance(cause, now);
            }
            Intent::PointSelect(index) => {
                tracing::debug!(index, "trace star committed");
            }
            Intent::HoldStart => self.hold_ratio = 0.0,
            Intent::HoldProgress(ratio) => self.hold_ratio = ratio,
            Intent::HoldCancel(reason) => {
                tracing::debug!(reason = reason.as_str(), "hold cancelled");
                self.hold_ratio = 0.0;
            }
            Intent::HoldComplete => {
                self.hold_ratio = 0.0;
                let resolved = self.story.plan().resolved();
                if let Some(t) = self.story.jump_to(resolved, TransitionCause::HoldComplete, now) {
                    self.transitions.push(t);
                }
                let (x, y) = self.layout.hold_button.center();
                self.effects.celebrate(x, y, now);
            }
            Intent::SwipeMove(_) | Intent::SwipeSnapBack => {}
            Intent::SwipeReset | Intent::Replay => self.replay(now),
            Intent::Ripple { x, y } => self.effects.spawn_ripple(x, y, now),
            Intent::ActivateLight => {
                self.light_on = true;
                self.effects.beam.fire(now);
            }
            Intent::ToggleDebug => self.debug_open = !self.debug_open,
        }
    }
}

impl<C: PointerCapture> FrameApp for Experience<C> {
    fn resize(&mut self, viewport: Viewport) -> Option<SurfaceSize> {
        Experience::resize(self, viewport)
    }

    fn input(&mut self, event: InputEvent, now: Instant) {
        self.handle_input(event, now);
    }

    fn frame(&mut self, gfx: &mut dyn Renderer2d, now: Instant) {
        Experience::frame(self, gfx, now);
    }

    fn teardown(&mut self) {
        Experience::teardown(self);
    }
}
