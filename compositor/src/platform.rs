//! Platform Collaborators
//!
//! The seams between the compositor and the rest of the system: the
//! scheduler, timers, input drivers, the font/image resource pipeline
//! and the code-point lookup table. Everything here is a trait plus at
//! most one in-crate implementation; the host wires in the real
//! drivers.
//!
//! Input events are plain integers pushed into a [`SharedQueue`]:
//! values below [`EVENT_CARET_TICK`] are raw key codes, the tick value
//! itself is the caret-blink timer wake, and [`MOUSE_MOVE`] through
//! [`SCROLL_DOWN`] are mouse gestures. A mouse driver updates the
//! [`SharedPoint`] cursor position before enqueuing a move event.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use hashbrown::HashMap;
use spin::Mutex;

use crate::geometry::{Point, Size};

/// Caret-blink timer wake value; key codes stay below it.
pub const EVENT_CARET_TICK: i32 = 0x80;
/// Mouse gesture codes delivered by the input driver.
pub const MOUSE_MOVE: i32 = 256;
pub const MOUSE_LEFT_CLICK: i32 = 257;
pub const MOUSE_RIGHT_CLICK: i32 = 258;
pub const SCROLL_UP: i32 = 259;
pub const SCROLL_DOWN: i32 = 260;

/// Default capacity of the shell task's event queue.
pub const EVENT_QUEUE_CAP: usize = 64;

/// Lock-protected FIFO of integer events. Drivers push from interrupt
/// or foreign-task context; the shell task drains it.
#[derive(Debug)]
pub struct SharedQueue {
    events: Mutex<VecDeque<i32>>,
    cap: usize,
}

impl SharedQueue {
    pub fn new(cap: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(cap)),
            cap,
        }
    }

    /// Enqueue one event. A full queue drops the event rather than
    /// grow without bound.
    pub fn push(&self, event: i32) {
        let mut events = self.events.lock();
        if events.len() >= self.cap {
            log::warn!("event queue full, dropping event {event}");
            return;
        }
        events.push_back(event);
    }

    /// Dequeue the oldest event, or `None` if the queue is empty.
    pub fn pop(&self) -> Option<i32> {
        self.events.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Default for SharedQueue {
    fn default() -> Self {
        Self::new(EVENT_QUEUE_CAP)
    }
}

/// Cursor position shared between the mouse driver and the shell task.
#[derive(Debug, Default)]
pub struct SharedPoint {
    point: Mutex<Point>,
}

impl SharedPoint {
    pub fn new(point: Point) -> Self {
        Self {
            point: Mutex::new(point),
        }
    }

    pub fn get(&self) -> Point {
        *self.point.lock()
    }

    pub fn set(&self, point: Point) {
        *self.point.lock() = point;
    }
}

/// Blocking primitive of the task scheduler. The shell loop parks
/// itself here whenever its queue runs dry; the driver side wakes the
/// task again after pushing.
pub trait Scheduler {
    fn sleep(&self);
}

/// Periodic wake source feeding [`EVENT_CARET_TICK`] into the queue.
/// The shell re-arms it after every caret toggle.
pub trait TickTimer {
    fn arm(&self, ticks: u32);
    fn cancel(&self);
}

/// Named byte-blob loader for fonts and pictures.
pub trait ResourceLoader {
    fn load(&self, path: &str) -> Option<Vec<u8>>;
}

/// Decoded image dimensions reported by [`ImageDecoder::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub size: Size,
}

/// Bitmap/JPEG decoding, supplied by the host. `decode` yields a
/// tightly packed RGB buffer of `size.area() * 3` bytes.
pub trait ImageDecoder {
    fn probe(&self, bytes: &[u8]) -> Option<ImageInfo>;
    fn decode(&self, bytes: &[u8]) -> Option<Vec<u8>>;
}

/// Maps a packed multi-byte UTF-8 sequence to a wide-glyph index in
/// the atlas. `None` means the glyph is not in the font.
pub trait CodePointMap {
    fn glyph_index(&self, code: u32) -> Option<usize>;
}

/// Empty mapping: every multi-byte code point is unmapped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCodePoints;

impl CodePointMap for NoCodePoints {
    fn glyph_index(&self, _code: u32) -> Option<usize> {
        None
    }
}

/// Table-backed code-point mapping loaded from the font package.
#[derive(Debug, Default)]
pub struct CodePointTable {
    entries: HashMap<u32, usize>,
}

impl CodePointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: u32, index: usize) {
        self.entries.insert(code, index);
    }
}

impl CodePointMap for CodePointTable {
    fn glyph_index(&self, code: u32) -> Option<usize> {
        self.entries.get(&code).copied()
    }
}
