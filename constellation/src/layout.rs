use engine::surface::Viewport;
use engine::ui::{Anchor, Insets, Rect, Size};

use crate::scene::SceneKind;

pub const CONTROL_SIZE: Size = Size { w: 180, h: 44 };
pub const HOLD_SIZE: Size = Size { w: 112, h: 112 };
pub const CENTER_LIGHT_SIZE: Size = Size { w: 96, h: 96 };
pub const DEBUG_TOGGLE_SIZE: Size = Size { w: 128, h: 28 };
pub const HOLD_RING_RADIUS: f32 = 22.0;
const CONTROL_BOTTOM_GAP: f32 = 72.0;
const MARGIN: u32 = 12;

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Continue control of the scene with this narrative ordinal.
    Continue(u32),
    CenterLight,
    Hold,
    Replay,
    DebugToggle,
    Background,
}

impl HitTarget {
    pub fn name(self) -> String {
        match self {
            HitTarget::Continue(ordinal) => format!("scene-{ordinal}-next"),
            HitTarget::CenterLight => "center-glow".into(),
            HitTarget::Hold => "hold-make-ours".into(),
            HitTarget::Replay => "begin-again".into(),
            HitTarget::DebugToggle => "debug-toggle".into(),
            HitTarget::Background => "background".into(),
        }
    }
}

/// Control geometry in logical px for one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLayout {
    pub width: f32,
    pub height: f32,
    pub continue_button: Rect,
    pub hold_button: Rect,
    pub replay_button: Rect,
    pub center_light: Rect,
    pub debug_toggle: Rect,
    /// Area scene text is wrapped into.
    pub text_column: Rect,
}

impl SceneLayout {
    pub fn new(viewport: Viewport) -> Self {
        let width = viewport.width.max(0.0);
        let height = viewport.height.max(0.0);
        let screen = Rect::from_size(width.round() as u32, height.round() as u32);
        let bottom = (height - CONTROL_BOTTOM_GAP).max(CONTROL_SIZE.h as f32 / 2.0);

        let column_w = (width * 0.86).min(720.0).max(0.0) as u32;
        let text_column = Rect::new(
            ((width - column_w as f32) / 2.0).max(0.0) as u32,
            (height * 0.16) as u32,
            column_w,
            (height * 0.5) as u32,
        );

        Self {
            width,
            height,
            continue_button: Rect::centered_at(width / 2.0, bottom, CONTROL_SIZE.w, CONTROL_SIZE.h),
            hold_button: Rect::centered_at(width / 2.0, height * 0.68, HOLD_SIZE.w, HOLD_SIZE.h),
            replay_button: Rect::centered_at(width / 2.0, bottom, CONTROL_SIZE.w, CONTROL_SIZE.h),
            center_light: Rect::centered_at(
                width / 2.0,
                height * 0.42,
                CENTER_LIGHT_SIZE.w,
                CENTER_LIGHT_SIZE.h,
            ),
            debug_toggle: screen
                .inset(Insets::all(MARGIN))
                .place(DEBUG_TOGGLE_SIZE, Anchor::TopRight),
            text_column,
        }
    }

    /// Topmost control under `(x, y)` for a scene of `kind`.
    pub fn hit_test(&self, kind: SceneKind, x: f32, y: f32, flags: HitFlags) -> HitTarget {
        if flags.debug_toggle && self.debug_toggle.contains_point(x, y) {
            return HitTarget::DebugToggle;
        }
        if kind.shows_continue() && self.continue_button.contains_point(x, y) {
            return HitTarget::Continue(kind.ordinal());
        }
        match kind {
            SceneKind::Glow if flags.center_light && self.center_light.contains_point(x, y) => {
                HitTarget::CenterLight
            }
            SceneKind::Hold if self.hold_button.contains_point(x, y) => HitTarget::Hold,
            SceneKind::Resolved if self.replay_button.contains_point(x, y) => HitTarget::Replay,
            _ => HitTarget::Background,
        }
    }
}

/// Optional controls that take part in hit testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitFlags {
    pub debug_toggle: bool,
    pub center_light: bool,
}
