//! Drawing Primitive Library
//!
//! Line, rectangle and circle rasterizers plus the small chrome helpers
//! (`change_color`, `border_radius`). Everything here mutates one
//! surface's own buffer through the bounds-checked [`PixelBuffer`]
//! accessors; nothing touches compositor state.
//!
//! Lines use 10-bit fixed-point incremental stepping with an exact fast
//! path for horizontal/vertical segments. Circles share one midpoint
//! stepping routine; even-diameter coverage is asymmetric on the
//! right/bottom edge (`x - 1`).

use bitflags::bitflags;

use crate::color::{gradient, TRANSPARENT};
use crate::geometry::{Circle, Line, Point, Rect};
use crate::surface::Surface;

/// Gradient axis for [`Surface::grad_line`] and [`Surface::grad_rect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientDirection {
    LeftToRight,
    TopToBottom,
}

bitflags! {
    /// Corner selection for [`Surface::border_radius`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Corners: u8 {
        const TOP_LEFT = 1 << 0;
        const TOP_RIGHT = 1 << 1;
        const BOTTOM_LEFT = 1 << 2;
        const BOTTOM_RIGHT = 1 << 3;
    }
}

const FIXED_SHIFT: i32 = 10;
const FIXED_ONE: i32 = 1 << FIXED_SHIFT;

/// Fixed-point stepping setup shared by the line rasterizers:
/// start coordinates in 26.10, per-step deltas, and the step count.
fn line_steps(line: Line) -> (i32, i32, i32, i32, i32) {
    let adx = (line.end.x - line.start.x).abs();
    let ady = (line.end.y - line.start.y).abs();
    let x = line.start.x << FIXED_SHIFT;
    let y = line.start.y << FIXED_SHIFT;

    if adx >= ady {
        let len = adx + 1;
        let dx = if line.end.x < line.start.x {
            -FIXED_ONE
        } else {
            FIXED_ONE
        };
        let dy = if line.end.y >= line.start.y {
            ((line.end.y - line.start.y + 1) << FIXED_SHIFT) / len
        } else {
            ((line.end.y - line.start.y - 1) << FIXED_SHIFT) / len
        };
        (x, y, dx, dy, len)
    } else {
        let len = ady + 1;
        let dy = if line.end.y < line.start.y {
            -FIXED_ONE
        } else {
            FIXED_ONE
        };
        let dx = if line.end.x >= line.start.x {
            ((line.end.x - line.start.x + 1) << FIXED_SHIFT) / len
        } else {
            ((line.end.x - line.start.x - 1) << FIXED_SHIFT) / len
        };
        (x, y, dx, dy, len)
    }
}

/// Midpoint circle stepping. Calls `visit` once per step with the
/// current octant coordinates; the decision variable needs no
/// trigonometry or floating point.
fn midpoint_steps(radius: i32, mut visit: impl FnMut(i32, i32)) {
    let mut x = radius;
    let mut y = 0;
    let mut f = -2 * radius + 3;
    while x >= y {
        visit(x, y);
        if f >= 0 {
            x -= 1;
            f -= 4 * x;
        }
        y += 1;
        f += 4 * y + 2;
    }
}

impl Surface {
    /// Draw a solid line. Horizontal and vertical segments take an
    /// exact span fast path with no fixed-point rounding.
    pub fn draw_line(&mut self, line: Line, color: u32) {
        if line.start.y == line.end.y {
            self.buffer_mut()
                .fill_span(line.start.y, line.start.x, line.end.x + 1, color);
            return;
        }
        if line.start.x == line.end.x {
            for y in line.start.y..=line.end.y {
                self.buffer_mut().put(line.start.x, y, color);
            }
            return;
        }

        let (mut x, mut y, dx, dy, len) = line_steps(line);
        for _ in 0..len {
            self.buffer_mut().put(x >> FIXED_SHIFT, y >> FIXED_SHIFT, color);
            x += dx;
            y += dy;
        }
    }

    /// Draw a line whose color interpolates between `c0` and `c1` along
    /// the gradient axis. A segment perpendicular to that axis still
    /// steps incrementally but writes the constant endpoint color.
    pub fn grad_line(&mut self, line: Line, c0: u32, c1: u32, direction: GradientDirection) {
        let (mut x, mut y, dx, dy, len) = line_steps(line);
        match direction {
            GradientDirection::LeftToRight => {
                if line.start.x == line.end.x {
                    for _ in 0..len {
                        self.buffer_mut().put(x >> FIXED_SHIFT, y >> FIXED_SHIFT, c0);
                        x += dx;
                        y += dy;
                    }
                } else {
                    for _ in 0..len {
                        let color = gradient(line.start.x, line.end.x, x >> FIXED_SHIFT, c0, c1);
                        self.buffer_mut().put(x >> FIXED_SHIFT, y >> FIXED_SHIFT, color);
                        x += dx;
                        y += dy;
                    }
                }
            }
            GradientDirection::TopToBottom => {
                if line.start.y == line.end.y {
                    for _ in 0..len {
                        self.buffer_mut().put(x >> FIXED_SHIFT, y >> FIXED_SHIFT, c0);
                        x += dx;
                        y += dy;
                    }
                } else {
                    for _ in 0..len {
                        let color = gradient(line.start.y, line.end.y, y >> FIXED_SHIFT, c0, c1);
                        self.buffer_mut().put(x >> FIXED_SHIFT, y >> FIXED_SHIFT, color);
                        x += dx;
                        y += dy;
                    }
                }
            }
        }
    }

    /// Outline-only rectangle.
    pub fn draw_rect(&mut self, rect: Rect, color: u32) {
        let end = rect.end_point();
        for x in 0..rect.size.width {
            self.buffer_mut().put(rect.offset.x + x, rect.offset.y, color);
            self.buffer_mut().put(rect.offset.x + x, end.y - 1, color);
        }
        for y in 1..rect.size.height - 1 {
            self.buffer_mut().put(rect.offset.x, rect.offset.y + y, color);
            self.buffer_mut().put(end.x - 1, rect.offset.y + y, color);
        }
    }

    /// Solid-filled rectangle.
    pub fn fill_rect(&mut self, rect: Rect, color: u32) {
        for y in 0..rect.size.height {
            self.buffer_mut().fill_span(
                rect.offset.y + y,
                rect.offset.x,
                rect.offset.x + rect.size.width,
                color,
            );
        }
    }

    /// Gradient-filled rectangle: per column for left-to-right, per row
    /// for top-to-bottom.
    pub fn grad_rect(&mut self, rect: Rect, c0: u32, c1: u32, direction: GradientDirection) {
        match direction {
            GradientDirection::LeftToRight => {
                for x in 0..rect.size.width {
                    let color = gradient(0, rect.size.width - 1, x, c0, c1);
                    for y in 0..rect.size.height {
                        self.buffer_mut().put(rect.offset.x + x, rect.offset.y + y, color);
                    }
                }
            }
            GradientDirection::TopToBottom => {
                for y in 0..rect.size.height {
                    let color = gradient(0, rect.size.height - 1, y, c0, c1);
                    self.buffer_mut().fill_span(
                        rect.offset.y + y,
                        rect.offset.x,
                        rect.offset.x + rect.size.width,
                        color,
                    );
                }
            }
        }
    }

    /// Outline-only circle. Radius 0 degenerates to a single pixel.
    pub fn draw_circle(&mut self, cir: Circle, color: u32) {
        if cir.radius <= 0 {
            self.buffer_mut().put(cir.center.x, cir.center.y, color);
            return;
        }
        let (cx, cy) = (cir.center.x, cir.center.y);
        let this = &mut *self;
        midpoint_steps(cir.radius, move |x, y| {
            let buf = this.buffer_mut();
            buf.put(cx + x - 1, cy + y, color);
            buf.put(cx - x, cy + y, color);
            buf.put(cx + x - 1, cy - y, color);
            buf.put(cx - x, cy - y, color);
            buf.put(cx + y, cy + x - 1, color);
            buf.put(cx - y, cy + x - 1, color);
            buf.put(cx + y, cy - x, color);
            buf.put(cx - y, cy - x, color);
        });
    }

    /// Solid-filled circle. Radius 0 degenerates to a single pixel.
    pub fn fill_circle(&mut self, cir: Circle, color: u32) {
        if cir.radius <= 0 {
            self.buffer_mut().put(cir.center.x, cir.center.y, color);
            return;
        }
        let (cx, cy) = (cir.center.x, cir.center.y);
        let this = &mut *self;
        midpoint_steps(cir.radius, move |x, y| {
            let buf = this.buffer_mut();
            buf.fill_span(cy + y, cx - x, cx + x, color);
            buf.fill_span(cy - y, cx - x, cx + x, color);
            buf.fill_span(cy + x - 1, cx - y, cx + y, color);
            buf.fill_span(cy - x, cx - y, cx + y, color);
        });
    }

    /// Circle filled with a top-to-bottom gradient; each span's color is
    /// interpolated by its vertical offset from the center.
    pub fn grad_circle(&mut self, cir: Circle, c0: u32, c1: u32) {
        if cir.radius <= 0 {
            self.buffer_mut().put(cir.center.x, cir.center.y, c0);
            return;
        }
        let (cx, cy, r) = (cir.center.x, cir.center.y, cir.radius);
        let this = &mut *self;
        midpoint_steps(r, move |x, y| {
            let buf = this.buffer_mut();
            buf.fill_span(cy + y, cx - x, cx + x, gradient(-r, r, y, c0, c1));
            buf.fill_span(cy - y, cx - x, cx + x, gradient(-r, r, -y, c0, c1));
            buf.fill_span(cy + x - 1, cx - y, cx + y, gradient(-r, r, x - 1, c0, c1));
            buf.fill_span(cy - x, cx - y, cx + y, gradient(-r, r, -x, c0, c1));
        });
    }

    /// Exact-match color substitution within a sub-rectangle. UI chrome
    /// uses this to flip highlight states in place.
    pub fn change_color(&mut self, rect: Rect, from: u32, to: u32) {
        for y in 0..rect.size.height {
            for x in 0..rect.size.width {
                let (px, py) = (rect.offset.x + x, rect.offset.y + y);
                if self.buffer().get(px, py) == Some(from) {
                    self.buffer_mut().put(px, py, to);
                }
            }
        }
    }

    /// Punch 3-pixel staircase transparency notches into the selected
    /// corners to fake rounded corners.
    pub fn border_radius(&mut self, corners: Corners) {
        let w = self.size().width;
        let h = self.size().height;
        if corners.contains(Corners::TOP_LEFT) {
            self.draw_line(Line::new(0, 0, 2, 0), TRANSPARENT);
            self.draw_line(Line::new(0, 1, 1, 1), TRANSPARENT);
            self.draw_line(Line::new(0, 2, 0, 2), TRANSPARENT);
        }
        if corners.contains(Corners::TOP_RIGHT) {
            self.draw_line(Line::new(w - 3, 0, w - 1, 0), TRANSPARENT);
            self.draw_line(Line::new(w - 2, 1, w - 1, 1), TRANSPARENT);
            self.draw_line(Line::new(w - 1, 2, w - 1, 2), TRANSPARENT);
        }
        if corners.contains(Corners::BOTTOM_LEFT) {
            self.draw_line(Line::new(0, h - 3, 0, h - 3), TRANSPARENT);
            self.draw_line(Line::new(0, h - 2, 1, h - 2), TRANSPARENT);
            self.draw_line(Line::new(0, h - 1, 2, h - 1), TRANSPARENT);
        }
        if corners.contains(Corners::BOTTOM_RIGHT) {
            self.draw_line(Line::new(w - 1, h - 3, w - 1, h - 3), TRANSPARENT);
            self.draw_line(Line::new(w - 2, h - 2, w - 1, h - 2), TRANSPARENT);
            self.draw_line(Line::new(w - 3, h - 1, w - 1, h - 1), TRANSPARENT);
        }
    }
}
