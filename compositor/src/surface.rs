//! Surface - independently drawn pixel layer
//!
//! A surface owns a rectangular buffer of packed `0xAARRGGBB` cells and
//! a placement rectangle in screen space. All drawing operations mutate
//! only the surface's own buffer; the compositor decides what reaches
//! the framebuffer.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use bitflags::bitflags;

use crate::geometry::{Point, Rect, Size};
use crate::input::ClickHandler;

/// Z position of a surface that is not in the visible stack.
pub const HIDDEN_Z: i32 = -1;

bitflags! {
    /// Surface creation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SurfaceFlags: u8 {
        /// The buffer may contain per-pixel transparency. Without this
        /// flag the whole placement rectangle is treated as opaque,
        /// which enables the fast ownership-stamping path.
        const IRREGULAR = 1 << 0;
    }
}

/// A bounds-checked 2D buffer of packed pixels. Hides the stride
/// arithmetic; out-of-range accesses are clipped, never undefined.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: i32,
    height: i32,
    cells: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            cells: vec![0u32; size.area()],
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Read one pixel; `None` outside the buffer.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        if self.in_bounds(x, y) {
            Some(self.cells[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Write one pixel. Writes outside the buffer are dropped.
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, color: u32) {
        if self.in_bounds(x, y) {
            self.cells[(y * self.width + x) as usize] = color;
        }
    }

    /// One full scanline.
    #[inline]
    pub fn row(&self, y: i32) -> &[u32] {
        let start = (y * self.width) as usize;
        &self.cells[start..start + self.width as usize]
    }

    /// Batch write of a clipped horizontal span. This is the fast path
    /// the solid-fill primitives use instead of per-pixel stores.
    pub fn fill_span(&mut self, y: i32, x0: i32, x1: i32, color: u32) {
        if y < 0 || y >= self.height {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.width);
        if x0 >= x1 {
            return;
        }
        let start = (y * self.width + x0) as usize;
        self.cells[start..start + (x1 - x0) as usize].fill(color);
    }

    /// Fill the whole buffer.
    pub fn fill(&mut self, color: u32) {
        self.cells.fill(color);
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.cells
    }
}

/// An independently owned drawable layer.
pub struct Surface {
    buffer: PixelBuffer,
    frame: Rect,
    flags: SurfaceFlags,
    z: i32,
    pub(crate) on_click: Option<Box<dyn ClickHandler>>,
    pub(crate) on_closed: Option<Box<dyn FnOnce()>>,
}

impl Surface {
    /// Create a hidden surface of the given size. It joins the visible
    /// stack only once the compositor assigns it a z position.
    pub fn new(size: Size, flags: SurfaceFlags) -> Self {
        Self {
            buffer: PixelBuffer::new(size),
            frame: Rect::of_size(size),
            flags,
            z: HIDDEN_Z,
            on_click: None,
            on_closed: None,
        }
    }

    #[inline]
    pub fn frame(&self) -> Rect {
        self.frame
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.frame.size
    }

    #[inline]
    pub fn is_irregular(&self) -> bool {
        self.flags.contains(SurfaceFlags::IRREGULAR)
    }

    /// Current stack position, [`HIDDEN_Z`] when not visible.
    #[inline]
    pub fn z(&self) -> i32 {
        self.z
    }

    pub(crate) fn set_z(&mut self, z: i32) {
        self.z = z;
    }

    pub(crate) fn set_origin(&mut self, pos: Point) {
        self.frame.offset = pos;
    }

    /// Install the click capability for this surface.
    pub fn set_click_handler(&mut self, handler: Box<dyn ClickHandler>) {
        self.on_click = Some(handler);
    }

    /// Register a callback run once when the surface is removed from
    /// the registry.
    pub fn set_close_handler(&mut self, handler: Box<dyn FnOnce()>) {
        self.on_closed = Some(handler);
    }

    #[inline]
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    #[inline]
    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }
}

impl core::fmt::Debug for Surface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Surface")
            .field("frame", &self.frame)
            .field("flags", &self.flags)
            .field("z", &self.z)
            .field("has_click_handler", &self.on_click.is_some())
            .field("has_close_handler", &self.on_closed.is_some())
            .finish()
    }
}
