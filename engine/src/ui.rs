//! Layout primitives: an integer `Rect` in logical pixels plus insets and anchored placement.
//!
//! Hit-testing runs on float pointer coordinates, so `contains_point` is the boundary-inclusive
//! float counterpart of `contains`.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.w,
            h: self.h,
        }
    }

    /// Rect of `w`x`h` centred on (`cx`, `cy`), saturating at the origin.
    pub fn centered_at(cx: f32, cy: f32, w: u32, h: u32) -> Self {
        let x = (cx - w as f32 / 2.0).round().max(0.0) as u32;
        let y = (cy - h as f32 / 2.0).round().max(0.0) as u32;
        Self { x, y, w, h }
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x
            && px < self.x.saturating_add(self.w)
            && py >= self.y
            && py < self.y.saturating_add(self.h)
    }

    /// Inclusive on all four edges, matching client-rect hit tests.
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        let left = self.x as f32;
        let top = self.y as f32;
        px >= left && px <= left + self.w as f32 && py >= top && py <= top + self.h as f32
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.w as f32 / 2.0,
            self.y as f32 + self.h as f32 / 2.0,
        )
    }

    pub fn scaled(&self, scale: f32) -> Self {
        let s = scale.max(0.0);
        Self {
            x: (self.x as f32 * s).round() as u32,
            y: (self.y as f32 * s).round() as u32,
            w: (self.w as f32 * s).round() as u32,
            h: (self.h as f32 * s).round() as u32,
        }
    }

    /// Returns the rectangle inset by `insets` (i.e. the inner content area).
    ///
    /// If insets exceed the rect size, the resulting width/height will saturate to 0.
    pub fn inset(&self, insets: Insets) -> Self {
        let w = self
            .w
            .saturating_sub(insets.left.saturating_add(insets.right));
        let h = self
            .h
            .saturating_sub(insets.top.saturating_add(insets.bottom));
        Self {
            x: self.x.saturating_add(insets.left),
            y: self.y.saturating_add(insets.top),
            w,
            h,
        }
    }

    /// Places a child of `size` inside this rect using the requested `anchor`.
    ///
    /// If `size` exceeds this rect, it is clamped to fit.
    pub fn place(&self, size: Size, anchor: Anchor) -> Self {
        let w = size.w.min(self.w);
        let h = size.h.min(self.h);

        let x = match anchor {
            Anchor::TopLeft | Anchor::CenterLeft | Anchor::BottomLeft => self.x,
            Anchor::TopCenter | Anchor::Center | Anchor::BottomCenter => {
                self.x.saturating_add(self.w.saturating_sub(w) / 2)
            }
            Anchor::TopRight | Anchor::CenterRight | Anchor::BottomRight => {
                self.x.saturating_add(self.w.saturating_sub(w))
            }
        };

        let y = match anchor {
            Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => self.y,
            Anchor::CenterLeft | Anchor::Center | Anchor::CenterRight => {
                self.y.saturating_add(self.h.saturating_sub(h) / 2)
            }
            Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => {
                self.y.saturating_add(self.h.saturating_sub(h))
            }
        };

        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn clamp_max(self, max: Size) -> Self {
        Self {
            w: self.w.min(max.w),
            h: self.h.min(max.h),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Insets {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Insets {
    pub const ZERO: Insets = Insets {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub fn all(v: u32) -> Self {
        Self {
            left: v,
            top: v,
            right: v,
            bottom: v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inset_shrinks_rect_and_moves_origin() {
        let r = Rect::from_size(100, 80);
        let inner = r.inset(Insets::all(10));
        assert_eq!(inner, Rect::new(10, 10, 80, 60));
    }

    #[test]
    fn place_center_positions_child_in_parent() {
        let parent = Rect::from_size(100, 100);
        let child = parent.place(Size::new(20, 10), Anchor::Center);
        assert_eq!(child, Rect::new(40, 45, 20, 10));
    }

    #[test]
    fn place_bottom_center_positions_child_at_bottom() {
        let parent = Rect::from_size(100, 100);
        let child = parent.place(Size::new(20, 10), Anchor::BottomCenter);
        assert_eq!(child, Rect::new(40, 90, 20, 10));
    }

    #[test]
    fn contains_point_is_edge_inclusive() {
        let r = Rect::new(10, 10, 20, 20);
        assert!(r.contains_point(10.0, 10.0));
        assert!(r.contains_point(30.0, 30.0));
        assert!(!r.contains_point(30.5, 20.0));
        assert!(!r.contains_point(9.9, 20.0));
    }

    #[test]
    fn centered_at_places_rect_around_point() {
        let r = Rect::centered_at(50.0, 40.0, 20, 10);
        assert_eq!(r, Rect::new(40, 35, 20, 10));
        assert_eq!(r.center(), (50.0, 40.0));
        assert_eq!(Rect::centered_at(2.0, 2.0, 20, 10).x, 0);
    }

    #[test]
    fn place_clamps_size_to_parent() {
        let parent = Rect::from_size(50, 40);
        let child = parent.place(Size::new(999, 999), Anchor::TopLeft);
        assert_eq!(child, Rect::new(0, 0, 50, 40));
    }
}
