//! Text and controls drawn over the sky: scene copy, Continue / Hold / Begin again controls and
//! the optional input debug panel. Also renders the narrative as plain text for the no-canvas
//! fallback.

use std::time::Duration;

use engine::graphics::{Color, Renderer2d, glyph_advance_x, line_advance_y, text_width};
use engine::ui::Rect;

use crate::assets::NarrativeText;
use crate::config::ExperienceConfig;
use crate::layout::SceneLayout;
use crate::render::{BG_TOP, lerp_color};
use crate::scene::{SceneKind, ScenePlan};
use crate::telemetry::GestureTelemetry;

const TEXT: Color = [240, 234, 250, 255];
const DIM: Color = [178, 170, 206, 255];
const ACCENT: Color = [251, 226, 180, 255];
const PANEL: Color = [12, 12, 28, 255];

const LINE_FADE: Duration = Duration::from_millis(600);
const LINE_STAGGER: Duration = Duration::from_millis(700);

/// Maps typographic punctuation onto the block font's ASCII set.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2026}' => out.push_str("..."),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{00A0}' => out.push(' '),
            c if c.is_ascii() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap to `max_width` px at `scale`. Words longer than a line are hard-split.
pub fn wrap(text: &str, max_width: u32, scale: u32) -> Vec<String> {
    let max_chars = ((max_width + scale.max(1)) / glyph_advance_x(scale)).max(1) as usize;
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            lines.push(head);
        }
        let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
        if needed > max_chars && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Input debug panel contents.
#[derive(Debug, Clone, Copy)]
pub struct DebugPanel<'a> {
    pub label: &'a str,
    pub open: bool,
    pub last: Option<&'a GestureTelemetry>,
    /// Index of the scene on screen now, not the one the last gesture was recorded on.
    pub scene: usize,
    pub light_on: bool,
}

impl DebugPanel<'_> {
    pub fn lines(&self) -> Vec<String> {
        let Some(last) = self.last else {
            return vec![
                "event: -".into(),
                format!("scene: {}", self.scene),
                format!("light: {}", on_off(self.light_on)),
            ];
        };
        vec![
            format!("event: {}", last.event),
            format!("pointerType: {}", last.pointer_type),
            format!("target: {}", last.target),
            format!("capture: {}", if last.capture { "yes" } else { "no" }),
            format!("scene: {}", self.scene),
            format!("light: {}", on_off(self.light_on)),
        ]
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

#[derive(Debug, Clone, Copy)]
pub struct OverlayView<'a> {
    pub kind: SceneKind,
    pub scene_age: Duration,
    pub layout: &'a SceneLayout,
    pub text: &'a NarrativeText,
    pub memory_lines: usize,
    pub quote: &'a str,
    pub swipe_offset: f32,
    pub swipe_opacity: f32,
    pub reduced_motion: bool,
    pub debug: Option<DebugPanel<'a>>,
}

/// Paints the overlay. `s` is the logical-to-backing scale.
pub fn draw_overlay(gfx: &mut dyn Renderer2d, view: &OverlayView<'_>, s: f32) {
    let mut pen = Pen::new(gfx, view, s);
    let kind = view.kind;
    let t = view.text;

    match kind {
        SceneKind::Trace => pen.paragraph(&t.trace_hint, 0, DIM),
        SceneKind::Intro => pen.staggered(&t.intro),
        SceneKind::Glow => pen.staggered(&t.glow),
        SceneKind::Memory => {
            for line in t.memory.iter().take(view.memory_lines) {
                pen.paragraph(line, 0, TEXT);
                pen.gap();
            }
        }
        SceneKind::Question => {
            pen.staggered(&t.question);
            pen.gap();
            pen.paragraph(&t.ask, 1, ACCENT);
        }
        SceneKind::Hold => {
            pen.paragraph(&t.ask, 1, ACCENT);
            let hold = view.layout.hold_button;
            pen.label_in(hold, &t.hold_button, TEXT);
            let below = hold.y + hold.h + 14;
            pen.at_y(below);
            pen.paragraph(&t.hold_label, 0, DIM);
        }
        SceneKind::Resolved => {
            pen.dx = view.swipe_offset * s;
            pen.opacity = view.swipe_opacity;
            pen.paragraph(&t.resolved_heading, 2, ACCENT);
            pen.gap();
            for promise in &t.promises {
                pen.paragraph(promise, 0, TEXT);
            }
            pen.gap();
            pen.paragraph(view.quote, 0, DIM);
            pen.dx = 0.0;
            pen.opacity = 1.0;
            pen.button(view.layout.replay_button, &t.replay_label);
        }
    }

    if kind.shows_continue() {
        pen.button(view.layout.continue_button, &t.continue_label);
    }
    if let Some(debug) = view.debug {
        pen.debug(view.layout, &debug);
    }
}

struct Pen<'g, 'v> {
    gfx: &'g mut dyn Renderer2d,
    view: &'v OverlayView<'v>,
    s: f32,
    body: u32,
    y: u32,
    dx: f32,
    opacity: f32,
}

impl<'g, 'v> Pen<'g, 'v> {
    fn new(gfx: &'g mut dyn Renderer2d, view: &'v OverlayView<'v>, s: f32) -> Self {
        let body = ((2.0 * s).round() as u32).max(1);
        Self {
            y: (view.layout.text_column.y as f32 * s) as u32,
            gfx,
            view,
            s,
            body,
            dx: 0.0,
            opacity: 1.0,
        }
    }

    fn px(&self, logical: u32) -> u32 {
        (logical as f32 * self.s) as u32
    }

    fn at_y(&mut self, logical_y: u32) {
        self.y = self.px(logical_y);
    }

    fn gap(&mut self) {
        self.y += line_advance_y(self.body);
    }

    /// Wrapped, centered paragraph. `emphasis` bumps the glyph scale.
    fn paragraph(&mut self, text: &str, emphasis: u32, color: Color) {
        self.faded_paragraph(text, emphasis, color, 1.0);
    }

    fn faded_paragraph(&mut self, text: &str, emphasis: u32, color: Color, fade: f32) {
        let scale = self.body + emphasis;
        let column = self.view.layout.text_column;
        let width = self.px(column.w);
        let cx = (column.x as f32 + column.w as f32 / 2.0) * self.s + self.dx;
        let color = lerp_color(BG_TOP, color, fade * self.opacity);
        for line in wrap(&normalize_text(text), width, scale) {
            let x = cx - text_width(&line, scale) as f32 / 2.0;
            if x >= 0.0 && fade * self.opacity > 0.0 {
                self.gfx.draw_text_scaled(x as u32, self.y, &line, color, scale);
            }
            self.y += line_advance_y(scale) + scale;
        }
    }

    /// Lines that fade in one after another after the scene is entered.
    fn staggered(&mut self, lines: &[String]) {
        for (i, line) in lines.iter().enumerate() {
            let fade = if self.view.reduced_motion {
                1.0
            } else {
                let start = LINE_STAGGER * i as u32;
                let age = self.view.scene_age.saturating_sub(start);
                (age.as_secs_f32() / LINE_FADE.as_secs_f32()).min(1.0)
            };
            self.faded_paragraph(line, 0, TEXT, fade);
        }
    }

    fn scaled_rect(&self, r: Rect) -> Rect {
        r.scaled(self.s)
    }

    fn label_in(&mut self, rect: Rect, label: &str, color: Color) {
        let r = self.scaled_rect(rect);
        let label = normalize_text(label);
        let tw = text_width(&label, self.body);
        let th = line_advance_y(self.body).saturating_sub(self.body);
        let x = r.x + r.w.saturating_sub(tw) / 2;
        let y = r.y + r.h.saturating_sub(th) / 2;
        self.gfx.draw_text_scaled(x, y, &label, color, self.body);
    }

    fn button(&mut self, rect: Rect, label: &str) {
        let r = self.scaled_rect(rect);
        self.gfx.blend_rect(r, PANEL, 150);
        self.gfx.rect_outline(r, DIM);
        self.label_in(rect, label, TEXT);
    }

    fn debug(&mut self, layout: &SceneLayout, debug: &DebugPanel<'_>) {
        self.button(layout.debug_toggle, debug.label);
        if !debug.open {
            return;
        }
        let scale = self.body.saturating_sub(1).max(1);
        let lines = debug.lines();
        let toggle = self.scaled_rect(layout.debug_toggle);
        let line_h = line_advance_y(scale) + scale;
        let widest = lines.iter().map(|l| text_width(l, scale)).max().unwrap_or(0);
        let pad = self.px(6);
        let w = widest + pad * 2;
        let panel = Rect::new(
            (toggle.x + toggle.w).saturating_sub(w),
            toggle.y + toggle.h + pad,
            w,
            line_h * lines.len() as u32 + pad * 2,
        );
        self.gfx.blend_rect(panel, PANEL, 210);
        self.gfx.rect_outline(panel, DIM);
        let mut y = panel.y + pad;
        for line in &lines {
            self.gfx.draw_text_scaled(panel.x + pad, y, line, TEXT, scale);
            y += line_h;
        }
    }
}

/// The narrative as plain text, in plan order. Shown when no drawing surface is available.
pub fn static_content(config: &ExperienceConfig) -> String {
    let plan = config.plan().unwrap_or_else(|_| ScenePlan::standard());
    let t = &config.text;
    let mut out = Vec::new();
    for kind in plan.kinds() {
        match kind {
            SceneKind::Trace => {}
            SceneKind::Intro => out.extend(t.intro.iter().cloned()),
            SceneKind::Glow => out.extend(t.glow.iter().cloned()),
            SceneKind::Memory => out.extend(t.memory.iter().cloned()),
            SceneKind::Question => {
                out.extend(t.question.iter().cloned());
                out.push(t.ask.clone());
            }
            SceneKind::Hold => {
                if !plan.kinds().contains(&SceneKind::Question) {
                    out.push(t.ask.clone());
                }
            }
            SceneKind::Resolved => {
                out.push(t.resolved_heading.clone());
                out.extend(t.promises.iter().cloned());
                out.push(t.fallback_quote.clone());
            }
        }
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::graphics::CpuRenderer;
    use engine::surface::{SurfaceSize, Viewport};

    #[test]
    fn ellipsis_and_quotes_become_ascii() {
        assert_eq!(normalize_text("Before you\u{2026}"), "Before you...");
        assert_eq!(normalize_text("it\u{2019}s \u{201C}ok\u{201D}"), "it's \"ok\"");
        assert_eq!(normalize_text("\u{2764}"), "?");
    }

    #[test]
    fn wrap_respects_width() {
        // Scale 1: 4 px per glyph, so 40 px fits 10 chars.
        let lines = wrap("the world felt bigger than before", 40, 1);
        assert_eq!(lines, vec!["the world", "felt", "bigger", "than", "before"]);
        for line in &lines {
            assert!(text_width(line, 1) <= 40);
        }
        assert_eq!(wrap("abcdefghijklmno", 20, 1), vec!["abcde", "fghij", "klmno"]);
        assert!(wrap("   ", 40, 1).is_empty());
    }

    #[test]
    fn static_content_walks_plan_order() {
        let text = static_content(&ExperienceConfig::default());
        let intro = text.find("Before you").unwrap();
        let ask = text.find("will you be my Valentine").unwrap();
        let promise = text.find("I choose you.").unwrap();
        assert!(intro < ask && ask < promise);
        assert_eq!(text.matches("will you be my Valentine").count(), 1);
    }

    #[test]
    fn debug_panel_lists_last_gesture() {
        let entry = GestureTelemetry {
            event: "pointerdown".into(),
            pointer_type: "touch".into(),
            target: "hold-make-ours".into(),
            capture: true,
            scene: 3,
        };
        let panel = DebugPanel {
            label: "Input Debug",
            open: true,
            last: Some(&entry),
            scene: 4,
            light_on: false,
        };
        let lines = panel.lines();
        assert_eq!(lines[0], "event: pointerdown");
        assert_eq!(lines[1], "pointerType: touch");
        assert_eq!(lines[3], "capture: yes");
        assert_eq!(lines[4], "scene: 4");
    }

    #[test]
    fn memory_scene_draws_only_visible_lines() {
        let layout = SceneLayout::new(Viewport::new(320.0, 240.0, 1.0));
        let text = NarrativeText::default();
        let size = SurfaceSize::new(320, 240);
        let draw = |memory_lines: usize| {
            let mut buf = vec![0u8; size.rgba_len()];
            let mut gfx = CpuRenderer::new(&mut buf, size);
            let view = OverlayView {
                kind: SceneKind::Memory,
                scene_age: Duration::ZERO,
                layout: &layout,
                text: &text,
                memory_lines,
                quote: "",
                swipe_offset: 0.0,
                swipe_opacity: 1.0,
                reduced_motion: true,
                debug: None,
            };
            draw_overlay(&mut gfx, &view, 1.0);
            buf
        };
        let one = draw(1);
        let two = draw(2);
        assert_ne!(one, two);
        assert_ne!(draw(0), one);
    }
}
