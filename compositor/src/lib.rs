//! Lamina Compositor
//!
//! Software display compositor for the Lamina OS shell: a z-ordered
//! stack of surfaces flattened through a per-pixel ownership map into
//! a 16/24/32-bit framebuffer, plus the drawing and text primitives
//! surfaces paint themselves with and the input dispatch that routes
//! mouse and key events.
//!
//! The crate is organized into:
//!
//! - `geometry`, `color`: value types and pure pixel math
//! - `surface`: owned pixel layers and their lifecycle
//! - `draw`, `text`, `picture`: primitives that paint one surface
//! - `compositor`: the stack, the ownership map and recomposition
//! - `framebuffer`: depth-specific output packing
//! - `input`, `shell`, `platform`: the event loop and its seams to
//!   the scheduler, drivers and resource loaders

#![no_std]

extern crate alloc;

pub mod color;
pub mod compositor;
pub mod draw;
pub mod framebuffer;
pub mod geometry;
pub mod input;
pub mod picture;
pub mod platform;
pub mod shell;
pub mod surface;
pub mod text;


pub use compositor::{Compositor, SurfaceId, MAX_VISIBLE, OWNER_NONE};
pub use framebuffer::{ColorDepth, Framebuffer};
pub use geometry::{Circle, Line, Point, Rect, Size};
pub use input::{ClickHandler, InputRouter};
pub use shell::Shell;
pub use surface::{PixelBuffer, Surface, SurfaceFlags, HIDDEN_Z};
pub use text::{Encoding, GlyphAtlas};

/// Construction-time failures. Runtime drawing and compositing never
/// fail; out-of-range work degrades to doing nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositorError {
    /// The requested screen resolution has no pixels.
    ZeroResolution,
    /// The font blob is shorter than the single-byte glyph block.
    AtlasTruncated { len: usize, need: usize },
}

impl core::fmt::Display for CompositorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CompositorError::ZeroResolution => write!(f, "screen resolution has zero area"),
            CompositorError::AtlasTruncated { len, need } => {
                write!(f, "glyph atlas is {len} bytes, need at least {need}")
            }
        }
    }
}
