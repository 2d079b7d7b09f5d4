//! Input Dispatch
//!
//! Routes integer-coded mouse events against the compositor's stack.
//! The topmost stack position is reserved for the cursor layer, so
//! click scans start one below it and stop at the first surface that
//! both covers the cursor and carries a click capability.

use alloc::boxed::Box;

use crate::compositor::{Compositor, SurfaceId};
use crate::geometry::Point;
use crate::platform::{MOUSE_LEFT_CLICK, MOUSE_MOVE, MOUSE_RIGHT_CLICK, SCROLL_DOWN, SCROLL_UP};
use crate::surface::{Surface, HIDDEN_Z};

/// Hot spot offset of the cursor bitmap relative to the pointer tip.
const CURSOR_HOT_SPOT: Point = Point { x: -8, y: -8 };

/// Click capability installed on a surface. Receives the screen-space
/// cursor position and mutable access to the clicked surface.
pub trait ClickHandler {
    fn on_click(&mut self, pos: Point, surface: &mut Surface);
}

impl<F: FnMut(Point, &mut Surface)> ClickHandler for F {
    fn on_click(&mut self, pos: Point, surface: &mut Surface) {
        self(pos, surface)
    }
}

/// Mouse-event router bound to the two special surfaces it manages:
/// the always-topmost cursor layer and the modal context menu.
#[derive(Debug, Clone, Copy)]
pub struct InputRouter {
    cursor: SurfaceId,
    menu: SurfaceId,
}

impl InputRouter {
    pub fn new(cursor: SurfaceId, menu: SurfaceId) -> Self {
        Self { cursor, menu }
    }

    /// Handle one mouse gesture code. `pos` is the shared cursor
    /// position the driver updated before enqueuing. Unknown codes
    /// are ignored.
    pub fn handle(&self, compositor: &mut Compositor, event: i32, pos: Point) {
        match event {
            MOUSE_MOVE => {
                compositor.move_to(self.cursor, pos + CURSOR_HOT_SPOT);
            }
            MOUSE_LEFT_CLICK => self.dispatch_click(compositor, pos),
            MOUSE_RIGHT_CLICK => self.open_context_menu(compositor, pos),
            SCROLL_UP | SCROLL_DOWN => {}
            _ => {}
        }
    }

    /// Left click: an open context menu always closes first, then the
    /// stack is scanned top-down (cursor layer excluded) for the first
    /// covering surface with a click capability.
    pub fn dispatch_click(&self, compositor: &mut Compositor, pos: Point) {
        if compositor
            .surface(self.menu)
            .is_some_and(|menu| menu.z() > 0)
        {
            compositor.set_z(self.menu, HIDDEN_Z);
        }

        let below_cursor = compositor.visible_count().saturating_sub(1);
        for stack_pos in (0..below_cursor).rev() {
            let Some(id) = compositor.stack_id(stack_pos) else {
                continue;
            };
            let covered = compositor
                .surface(id)
                .is_some_and(|s| s.on_click.is_some() && s.frame().contains(pos));
            if !covered {
                continue;
            }
            let mut damage = None;
            if let Some(surface) = compositor.surface_mut(id) {
                // The handler gets the surface mutably, so it is taken
                // out for the call and restored unless it replaced
                // itself.
                if let Some(mut handler) = surface.on_click.take() {
                    handler.on_click(pos, surface);
                    if surface.on_click.is_none() {
                        surface.on_click = Some(handler);
                    }
                    damage = Some(crate::geometry::Rect::of_size(surface.size()));
                }
            }
            if let Some(damage) = damage {
                compositor.refresh(id, damage);
            }
            break;
        }
    }

    /// Right click: opens the context menu centered on the cursor,
    /// directly beneath the cursor layer. A second right click while
    /// open does nothing.
    pub fn open_context_menu(&self, compositor: &mut Compositor, pos: Point) {
        let Some(menu) = compositor.surface(self.menu) else {
            return;
        };
        if menu.z() >= 0 {
            return;
        }
        let size = menu.size();
        compositor.move_to(
            self.menu,
            Point::new(pos.x - size.width / 2, pos.y - size.height / 2),
        );
        let top = compositor.visible_count() as i32 - 1;
        compositor.set_z(self.menu, top.max(0));
    }
}

/// Convenience for installing a closure as a surface's click handler.
pub fn click_handler<F: FnMut(Point, &mut Surface) + 'static>(f: F) -> Box<dyn ClickHandler> {
    Box::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::rgb;
    use crate::framebuffer::ColorDepth;
    use crate::geometry::Size;
    use crate::platform::MOUSE_LEFT_CLICK;
    use crate::surface::SurfaceFlags;
    use core::sync::atomic::{AtomicI32, Ordering};

    fn setup() -> (Compositor, InputRouter, SurfaceId) {
        let mut c = Compositor::new(Size::new(100, 100), ColorDepth::Argb32).unwrap();
        let back = c.create_surface(Size::new(100, 100), SurfaceFlags::empty());
        c.set_z(back, 0);
        let menu = c.create_surface(Size::new(30, 30), SurfaceFlags::IRREGULAR);
        let cursor = c.create_surface(Size::new(16, 16), SurfaceFlags::IRREGULAR);
        c.set_z(cursor, 1);
        (c, InputRouter::new(cursor, menu), back)
    }

    #[test]
    fn test_move_applies_hot_spot() {
        let (mut c, router, _) = setup();
        router.handle(&mut c, MOUSE_MOVE, Point::new(50, 40));
        let cursor_id = c.stack_id(c.visible_count() - 1).unwrap();
        assert_eq!(c.surface(cursor_id).unwrap().frame().offset, Point::new(42, 32));
    }

    #[test]
    fn test_click_reaches_covering_surface() {
        static HITS: AtomicI32 = AtomicI32::new(0);
        let (mut c, router, back) = setup();
        c.surface_mut(back)
            .unwrap()
            .set_click_handler(click_handler(|pos, _surface| {
                HITS.fetch_add(pos.x, Ordering::SeqCst);
            }));
        router.handle(&mut c, MOUSE_LEFT_CLICK, Point::new(7, 3));
        assert_eq!(HITS.load(Ordering::SeqCst), 7);
        // The handler survives the call.
        router.handle(&mut c, MOUSE_LEFT_CLICK, Point::new(7, 3));
        assert_eq!(HITS.load(Ordering::SeqCst), 14);
    }

    #[test]
    fn test_click_prefers_topmost_covering_surface() {
        static WINNER: AtomicI32 = AtomicI32::new(0);
        let (mut c, router, back) = setup();
        c.surface_mut(back)
            .unwrap()
            .set_click_handler(click_handler(|_, _| {
                WINNER.store(1, Ordering::SeqCst);
            }));
        let panel = c.create_surface(Size::new(20, 20), SurfaceFlags::empty());
        c.surface_mut(panel)
            .unwrap()
            .set_click_handler(click_handler(|_, _| {
                WINNER.store(2, Ordering::SeqCst);
            }));
        c.set_z(panel, 1); // beneath the cursor layer
        router.dispatch_click(&mut c, Point::new(5, 5));
        assert_eq!(WINNER.load(Ordering::SeqCst), 2);
        // Outside the panel the background wins.
        router.dispatch_click(&mut c, Point::new(50, 50));
        assert_eq!(WINNER.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_right_click_opens_menu_below_cursor() {
        let (mut c, router, _) = setup();
        router.handle(&mut c, MOUSE_RIGHT_CLICK, Point::new(50, 50));
        let menu_id = c.stack_id(c.visible_count() - 2).unwrap();
        let menu = c.surface(menu_id).unwrap();
        assert_eq!(menu.frame().offset, Point::new(35, 35)); // centered
        // Cursor layer sits back on top.
        assert_eq!(
            c.surface(router.cursor).unwrap().z(),
            c.visible_count() as i32 - 1
        );
    }

    #[test]
    fn test_left_click_closes_open_menu() {
        let (mut c, router, _) = setup();
        router.handle(&mut c, MOUSE_RIGHT_CLICK, Point::new(50, 50));
        assert!(c.surface(router.menu).unwrap().z() > 0);
        router.handle(&mut c, MOUSE_LEFT_CLICK, Point::new(90, 90));
        assert_eq!(c.surface(router.menu).unwrap().z(), HIDDEN_Z);
    }

    #[test]
    fn test_handler_can_draw_into_surface() {
        let (mut c, router, back) = setup();
        c.surface_mut(back)
            .unwrap()
            .set_click_handler(click_handler(|pos, surface: &mut Surface| {
                surface.buffer_mut().put(pos.x, pos.y, rgb(9, 9, 9));
            }));
        router.dispatch_click(&mut c, Point::new(12, 13));
        assert_eq!(
            c.surface(back).unwrap().buffer().get(12, 13),
            Some(rgb(9, 9, 9))
        );
    }
}
