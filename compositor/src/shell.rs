//! Shell Task
//!
//! The single mutator of the compositor registry. Builds the sidebar
//! chrome, the cursor layer and the ring context menu, then drains the
//! shared event queue: key codes feed the address text box, the caret
//! timer drives the blink, mouse codes go through the input router.
//!
//! Other tasks never touch the registry directly; they push events or
//! draw into their own surfaces and name damage through the shell.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;

use crate::color::{rgb, rgba, TRANSPARENT};
use crate::compositor::{Compositor, SurfaceId};
use crate::draw::GradientDirection;
use crate::framebuffer::ColorDepth;
use crate::geometry::{Circle, Line, Point, Rect, Size};
use crate::input::{click_handler, InputRouter};
use crate::picture::PicturePipeline;
use crate::platform::{
    CodePointMap, Scheduler, SharedPoint, SharedQueue, TickTimer, EVENT_CARET_TICK,
};
use crate::surface::SurfaceFlags;
use crate::text::{Encoding, GlyphAtlas};
use crate::CompositorError;

/// Width of the sidebar column holding the controls and text box.
pub const SIDEBAR_WIDTH: i32 = 150;
/// Caret blink period in scheduler ticks.
const CARET_INTERVAL: u32 = 50;

const KEY_BACKSPACE: i32 = 0x08;
const KEY_ENTER: i32 = 0x0a;

const BLACK: u32 = rgb(0, 0, 0);
const WHITE: u32 = rgb(255, 255, 255);
/// Near-white used for inactive keymap labels so the exact-match color
/// flip cannot catch real white pixels.
const PASSIVE_TEXT: u32 = rgb(255, 255, 254);
const BACKGROUND: u32 = rgb(0, 84, 255);

/// Cursor ring and body coverage, one bit per pixel, column 0 at the
/// high bit.
const CURSOR_RING: [u16; 16] = [
    0x07e0, 0x1ff8, 0x3ffc, 0x781e, 0x700e, 0xe007, 0xe007, 0xe007, 0xe007, 0xe007, 0xe007,
    0x700e, 0x781e, 0x3ffc, 0x1ff8, 0x07e0,
];
const CURSOR_BODY: [u16; 16] = [
    0x0000, 0x0000, 0x0000, 0x07e0, 0x0ff0, 0x1ff8, 0x1ff8, 0x1ff8, 0x1ff8, 0x1ff8, 0x1ff8,
    0x0ff0, 0x07e0, 0x0000, 0x0000, 0x0000,
];

/// The compositor-owning event-loop task.
pub struct Shell {
    compositor: Compositor,
    queue: Arc<SharedQueue>,
    cursor_pos: Arc<SharedPoint>,
    timer: Box<dyn TickTimer>,
    atlas: GlyphAtlas,
    code_points: Box<dyn CodePointMap>,
    router: InputRouter,
    back: SurfaceId,
    menu: SurfaceId,
    caret_position: i32,
    caret_color: u32,
    text_box: String,
    on_navigate: Option<Box<dyn FnMut(&str)>>,
}

impl Shell {
    /// Build the registry and the chrome, show the sidebar and the
    /// cursor, and arm the caret timer.
    pub fn new(
        resolution: Size,
        depth: ColorDepth,
        atlas: GlyphAtlas,
        code_points: Box<dyn CodePointMap>,
        queue: Arc<SharedQueue>,
        cursor_pos: Arc<SharedPoint>,
        timer: Box<dyn TickTimer>,
    ) -> Result<Self, CompositorError> {
        let mut compositor = Compositor::new(resolution, depth)?;

        let back = compositor.create_surface(resolution, SurfaceFlags::empty());
        let menu = compositor.create_surface(Size::new(150, 150), SurfaceFlags::IRREGULAR);
        let cursor = compositor.create_surface(Size::new(16, 16), SurfaceFlags::IRREGULAR);

        let mut shell = Self {
            compositor,
            queue,
            cursor_pos,
            timer,
            atlas,
            code_points,
            router: InputRouter::new(cursor, menu),
            back,
            menu,
            caret_position: 2,
            caret_color: BLACK,
            text_box: String::new(),
            on_navigate: None,
        };

        shell.build_back_chrome();
        shell.build_cursor(cursor);
        shell.build_menu_chrome();

        shell.compositor.set_z(back, 0);
        shell
            .compositor
            .move_to(cursor, Point::new(resolution.width / 2, resolution.height / 2));
        let top = shell.compositor.visible_count() as i32;
        shell.compositor.set_z(cursor, top);

        shell.draw_caret();
        shell.caret_color = WHITE;
        shell.timer.arm(CARET_INTERVAL);
        Ok(shell)
    }

    /// Register the callback fired when the text box is submitted.
    pub fn set_navigate_handler(&mut self, handler: Box<dyn FnMut(&str)>) {
        self.on_navigate = Some(handler);
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut Compositor {
        &mut self.compositor
    }

    pub fn text(&self) -> &str {
        &self.text_box
    }

    /// Drain-and-handle one event. Returns `false` when the queue was
    /// empty, which is the caller's cue to block.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.queue.pop() else {
            return false;
        };
        if event < EVENT_CARET_TICK {
            self.handle_key(event);
        } else if event == EVENT_CARET_TICK {
            self.blink_caret();
        } else {
            let pos = self.cursor_pos.get();
            self.router.handle(&mut self.compositor, event, pos);
        }
        true
    }

    /// Park on the scheduler whenever the queue runs dry.
    pub fn run(&mut self, scheduler: &dyn Scheduler) -> ! {
        loop {
            while self.step() {}
            scheduler.sleep();
        }
    }

    fn handle_key(&mut self, key: i32) {
        match key {
            KEY_BACKSPACE => self.erase_char(),
            KEY_ENTER => self.submit(),
            _ => {
                if let Ok(byte) = u8::try_from(key) {
                    self.type_char(byte);
                }
            }
        }
    }

    fn text_box_top(&self) -> i32 {
        self.compositor.resolution().height - 20 - 22
    }

    fn caret_line(&self) -> Line {
        let y = self.text_box_top() + 2;
        Line::new(
            self.caret_position + 2,
            y,
            self.caret_position + 2,
            y + 18,
        )
    }

    fn draw_caret(&mut self) {
        let line = self.caret_line();
        let color = self.caret_color;
        if let Some(surface) = self.compositor.surface_mut(self.back) {
            surface.draw_line(line, color);
        }
        self.compositor.refresh(
            self.back,
            Rect::new(line.start.x, line.start.y, 1, 18),
        );
    }

    fn blink_caret(&mut self) {
        self.draw_caret();
        self.caret_color ^= 0x00ff_ffff;
        self.timer.arm(CARET_INTERVAL);
    }

    fn type_char(&mut self, byte: u8) {
        let y = self.text_box_top();
        let old_line = self.caret_line();
        let glyph_pos = Point::new(self.caret_position + 2, y + 3);
        self.caret_position += 8;
        self.caret_color = BLACK;
        let new_line = self.caret_line();
        if let Some(surface) = self.compositor.surface_mut(self.back) {
            surface.draw_line(old_line, WHITE);
            surface.draw_string(
                &[byte],
                glyph_pos,
                BLACK,
                Encoding::Utf8,
                &self.atlas,
                &*self.code_points,
            );
            surface.draw_line(new_line, BLACK);
        }
        self.compositor.refresh(
            self.back,
            Rect::new(self.caret_position - 8 + 2, y + 2, 9, 18),
        );
        self.timer.cancel();
        self.timer.arm(CARET_INTERVAL);
        self.text_box.push(byte as char);
    }

    fn erase_char(&mut self) {
        if self.caret_position <= 2 {
            return;
        }
        self.caret_position -= 8;
        self.caret_color = BLACK;
        let clear = Rect::new(self.caret_position + 2, self.text_box_top() + 2, 9, 18);
        let line = self.caret_line();
        if let Some(surface) = self.compositor.surface_mut(self.back) {
            surface.fill_rect(clear, WHITE);
            surface.draw_line(line, BLACK);
        }
        self.compositor.refresh(self.back, clear);
        self.timer.cancel();
        self.timer.arm(CARET_INTERVAL);
        self.text_box.pop();
    }

    fn submit(&mut self) {
        if self.text_box.is_empty() {
            return;
        }
        let url = core::mem::take(&mut self.text_box);
        if let Some(on_navigate) = self.on_navigate.as_mut() {
            on_navigate(&url);
        }
        self.caret_position = 2;
        let clear = Rect::new(2, self.text_box_top(), SIDEBAR_WIDTH - 4, 22);
        if let Some(surface) = self.compositor.surface_mut(self.back) {
            surface.fill_rect(clear, WHITE);
        }
        self.compositor.refresh(self.back, clear);
    }

    /// Sidebar background, keymap switch and search box.
    fn build_back_chrome(&mut self) {
        let res = self.compositor.resolution();
        let h = res.height;
        let Some(surface) = self.compositor.surface_mut(self.back) else {
            return;
        };

        surface.fill_rect(Rect::new(0, 0, SIDEBAR_WIDTH, h), BACKGROUND);
        surface.grad_rect(
            Rect::new(SIDEBAR_WIDTH, 0, res.width - SIDEBAR_WIDTH, h / 2),
            rgb(0x0d, 0x2c, 0x51),
            rgb(0x68, 0xa3, 0xc3),
            GradientDirection::TopToBottom,
        );
        surface.grad_rect(
            Rect::new(SIDEBAR_WIDTH, h / 2, res.width - SIDEBAR_WIDTH, h / 2),
            rgb(0x68, 0xa3, 0xc3),
            rgb(0xff, 0xab, 0x5b),
            GradientDirection::TopToBottom,
        );

        // Keymap switch, JIS layout active initially.
        surface.draw_rect(Rect::new(42, h - 20 - 46, 66, 22), WHITE);
        surface.fill_rect(Rect::new(43, h - 20 - 45, 32, 20), WHITE);
        surface.draw_string(
            b"JP",
            Point::new(50, h - 20 - 43),
            BLACK,
            Encoding::Utf8,
            &self.atlas,
            &*self.code_points,
        );
        surface.draw_string(
            b"US",
            Point::new(50 + 32, h - 20 - 43),
            PASSIVE_TEXT,
            Encoding::Utf8,
            &self.atlas,
            &*self.code_points,
        );

        // Search box.
        surface.fill_rect(Rect::new(2, h - 20 - 22, SIDEBAR_WIDTH - 4, 22), WHITE);

        surface.set_click_handler(click_handler(|pos, surface| {
            let h = surface.size().height;
            let jp = Rect::new(43, h - 20 - 45, 32, 20);
            let us = Rect::new(74, h - 20 - 45, 33, 20);
            if jp.contains(pos) {
                surface.change_color(jp, PASSIVE_TEXT, BLACK);
                surface.change_color(jp, BACKGROUND, WHITE);
                surface.change_color(us, BLACK, PASSIVE_TEXT);
                surface.change_color(us, WHITE, BACKGROUND);
            } else if us.contains(pos) {
                surface.change_color(us, PASSIVE_TEXT, BLACK);
                surface.change_color(us, BACKGROUND, WHITE);
                surface.change_color(jp, BLACK, PASSIVE_TEXT);
                surface.change_color(jp, WHITE, BACKGROUND);
            }
        }));
    }

    /// Translucent ring cursor from the two bitmask layers.
    fn build_cursor(&mut self, cursor: SurfaceId) {
        let Some(surface) = self.compositor.surface_mut(cursor) else {
            return;
        };
        let ring = rgba(12, 69, 255, 155);
        let body = rgba(0, 182, 200, 155);
        for y in 0..16 {
            for x in 0..16 {
                let bit = 0x8000u16 >> x;
                let color = if CURSOR_RING[y as usize] & bit != 0 {
                    ring
                } else if CURSOR_BODY[y as usize] & bit != 0 {
                    body
                } else {
                    TRANSPARENT
                };
                surface.buffer_mut().put(x, y, color);
            }
        }
    }

    /// Translucent ring with a punched-out center.
    fn build_menu_chrome(&mut self) {
        let Some(surface) = self.compositor.surface_mut(self.menu) else {
            return;
        };
        let frame = Rect::of_size(surface.size());
        surface.fill_rect(frame, TRANSPARENT);
        surface.fill_circle(Circle::new(Point::new(75, 75), 75), rgba(224, 224, 224, 230));
        surface.fill_circle(Circle::new(Point::new(75, 75), 35), TRANSPARENT);
    }

    /// Draw the navigation button frames from the resource pack.
    pub fn decorate_back(&mut self, pictures: &PicturePipeline<'_>) {
        let key = rgb(255, 0, 255);
        if let Some(surface) = self.compositor.surface_mut(self.back) {
            pictures.draw(surface, "b_f.bmp", Point::new(4, 4), key, 1);
            pictures.draw(surface, "btn_r.bmp", Point::new(59, 4), key, 1);
        }
        self.compositor
            .refresh(self.back, Rect::new(0, 0, SIDEBAR_WIDTH, 64));
    }

    /// Draw the four action icons onto the context menu ring.
    pub fn decorate_menu(&mut self, pictures: &PicturePipeline<'_>) {
        let key = rgb(255, 0, 255);
        if let Some(surface) = self.compositor.surface_mut(self.menu) {
            let size = surface.size();
            pictures.draw(surface, "copy.bmp", Point::new(size.width / 2 - 16, 3), key, 1);
            pictures.draw(
                surface,
                "source.bmp",
                Point::new(size.width / 2 + 38, size.height / 2 - 16),
                key,
                1,
            );
            pictures.draw(
                surface,
                "search.bmp",
                Point::new(size.width / 2 - 16, size.height - 32 - 3),
                key,
                1,
            );
            pictures.draw(
                surface,
                "refresh.bmp",
                Point::new(size.width / 2 - 38 - 32, size.height / 2 - 16),
                key,
                1,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MOUSE_MOVE, MOUSE_RIGHT_CLICK};
    use alloc::vec;
    use core::sync::atomic::{AtomicU32, Ordering};

    struct CountingTimer(Arc<AtomicU32>);
    impl TickTimer for CountingTimer {
        fn arm(&self, _ticks: u32) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn cancel(&self) {}
    }

    fn shell() -> (Shell, Arc<SharedQueue>, Arc<SharedPoint>, Arc<AtomicU32>) {
        let atlas = GlyphAtlas::new(vec![0x80u8; 256 * 16]).unwrap();
        let queue = Arc::new(SharedQueue::default());
        let cursor_pos = Arc::new(SharedPoint::new(Point::new(100, 75)));
        let arms = Arc::new(AtomicU32::new(0));
        let shell = Shell::new(
            Size::new(200, 150),
            ColorDepth::Argb32,
            atlas,
            Box::new(crate::platform::NoCodePoints),
            Arc::clone(&queue),
            Arc::clone(&cursor_pos),
            Box::new(CountingTimer(Arc::clone(&arms))),
        )
        .unwrap();
        (shell, queue, cursor_pos, arms)
    }

    #[test]
    fn test_new_arms_caret_timer() {
        let (_shell, _q, _p, arms) = shell();
        assert_eq!(arms.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_step_on_empty_queue_yields() {
        let (mut shell, _q, _p, _a) = shell();
        assert!(!shell.step());
    }

    #[test]
    fn test_caret_blinks_on_tick() {
        let (mut shell, q, _p, arms) = shell();
        // Construction drew the caret black and left white pending.
        let x = 4;
        let y = shell.text_box_top() + 5;
        let back = shell.back;
        assert_eq!(
            shell.compositor().surface(back).unwrap().buffer().get(x, y),
            Some(BLACK)
        );
        q.push(EVENT_CARET_TICK);
        assert!(shell.step());
        assert_eq!(
            shell.compositor().surface(back).unwrap().buffer().get(x, y),
            Some(WHITE)
        );
        q.push(EVENT_CARET_TICK);
        shell.step();
        assert_eq!(
            shell.compositor().surface(back).unwrap().buffer().get(x, y),
            Some(BLACK)
        );
        // Each tick re-arms the timer.
        assert_eq!(arms.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_typing_advances_caret_and_buffers_text() {
        let (mut shell, q, _p, _a) = shell();
        q.push(b'h' as i32);
        q.push(b'i' as i32);
        shell.step();
        shell.step();
        assert_eq!(shell.text(), "hi");
        assert_eq!(shell.caret_position, 18);
    }

    #[test]
    fn test_backspace_stops_at_origin() {
        let (mut shell, q, _p, _a) = shell();
        q.push(KEY_BACKSPACE);
        shell.step();
        assert_eq!(shell.caret_position, 2);
        q.push(b'x' as i32);
        q.push(KEY_BACKSPACE);
        shell.step();
        shell.step();
        assert_eq!(shell.caret_position, 2);
        assert_eq!(shell.text(), "");
    }

    #[test]
    fn test_enter_submits_and_clears() {
        use alloc::string::ToString;
        use spin::Mutex;
        let seen: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
        let (mut shell, q, _p, _a) = shell();
        let sink = Arc::clone(&seen);
        shell.set_navigate_handler(Box::new(move |url| {
            *sink.lock() = url.to_string();
        }));
        for b in b"a.html" {
            q.push(*b as i32);
        }
        q.push(KEY_ENTER);
        while shell.step() {}
        assert_eq!(&*seen.lock(), "a.html");
        assert_eq!(shell.text(), "");
        assert_eq!(shell.caret_position, 2);
    }

    #[test]
    fn test_enter_on_empty_text_does_nothing() {
        let (mut shell, q, _p, _a) = shell();
        let called = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&called);
        shell.set_navigate_handler(Box::new(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));
        q.push(KEY_ENTER);
        shell.step();
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mouse_events_route_through_registry() {
        let (mut shell, q, p, _a) = shell();
        p.set(Point::new(60, 60));
        q.push(MOUSE_MOVE);
        shell.step();
        let cursor_id = shell
            .compositor()
            .stack_id(shell.compositor().visible_count() - 1)
            .unwrap();
        assert_eq!(
            shell.compositor().surface(cursor_id).unwrap().frame().offset,
            Point::new(52, 52)
        );
        q.push(MOUSE_RIGHT_CLICK);
        shell.step();
        let menu = shell.menu;
        assert!(shell.compositor().surface(menu).unwrap().z() > 0);
    }

    #[test]
    fn test_keymap_switch_flips_zones() {
        let (mut shell, _q, _p, _a) = shell();
        let h = 150;
        let back = shell.back;
        // US zone background starts as the sidebar color.
        let probe = Point::new(100, h - 50);
        assert_eq!(
            shell.compositor().surface(back).unwrap().buffer().get(probe.x, probe.y),
            Some(BACKGROUND)
        );
        let router = shell.router;
        router.dispatch_click(shell.compositor_mut(), probe);
        assert_eq!(
            shell.compositor().surface(back).unwrap().buffer().get(probe.x, probe.y),
            Some(WHITE)
        );
        // JP zone background flipped back to the sidebar color.
        assert_eq!(
            shell.compositor().surface(back).unwrap().buffer().get(60, h - 50),
            Some(BACKGROUND)
        );
    }
}
