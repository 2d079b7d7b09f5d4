//! Output Framebuffer
//!
//! Byte-addressed target the compositor flushes into. Three pixel
//! depths are supported; the compositor picks the store/load pair for
//! the active depth, this module only does the packing. 24-bit pixels
//! are stored low byte first ([B, G, R]), 16-bit pixels are 5-6-5.

use alloc::vec;
use alloc::vec::Vec;

use crate::geometry::Size;

/// Pixel layout of the output framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    Rgb16,
    Rgb24,
    Argb32,
}

impl ColorDepth {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorDepth::Rgb16 => 2,
            ColorDepth::Rgb24 => 3,
            ColorDepth::Argb32 => 4,
        }
    }
}

#[derive(Debug)]
pub struct Framebuffer {
    size: Size,
    depth: ColorDepth,
    data: Vec<u8>,
}

impl Framebuffer {
    pub fn new(size: Size, depth: ColorDepth) -> Self {
        Self {
            size,
            depth,
            data: vec![0; size.area() * depth.bytes_per_pixel()],
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn depth(&self) -> ColorDepth {
        self.depth
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        (y * self.size.width + x) as usize * self.depth.bytes_per_pixel()
    }

    /// 32-bit store; the caller guarantees in-bounds coordinates and
    /// the Argb32 depth.
    pub fn store32(&mut self, x: i32, y: i32, color: u32) {
        let at = self.offset(x, y);
        self.data[at..at + 4].copy_from_slice(&color.to_le_bytes());
    }

    pub fn load32(&self, x: i32, y: i32) -> u32 {
        let at = self.offset(x, y);
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[at..at + 4]);
        u32::from_le_bytes(bytes)
    }

    /// 24-bit store of a full color value, alpha discarded.
    pub fn store24(&mut self, x: i32, y: i32, color: u32) {
        let at = self.offset(x, y);
        self.data[at] = color as u8;
        self.data[at + 1] = (color >> 8) as u8;
        self.data[at + 2] = (color >> 16) as u8;
    }

    /// 24-bit load back into a full color value with zero alpha.
    pub fn load24(&self, x: i32, y: i32) -> u32 {
        let at = self.offset(x, y);
        (self.data[at] as u32)
            | ((self.data[at + 1] as u32) << 8)
            | ((self.data[at + 2] as u32) << 16)
    }

    /// 16-bit store of an already quantized 5-6-5 value.
    pub fn store16(&mut self, x: i32, y: i32, packed: u16) {
        let at = self.offset(x, y);
        self.data[at..at + 2].copy_from_slice(&packed.to_le_bytes());
    }

    pub fn load16(&self, x: i32, y: i32) -> u16 {
        let at = self.offset(x, y);
        u16::from_le_bytes([self.data[at], self.data[at + 1]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{quantize_565, rgb};

    #[test]
    fn test_depth_strides() {
        assert_eq!(ColorDepth::Rgb16.bytes_per_pixel(), 2);
        assert_eq!(ColorDepth::Rgb24.bytes_per_pixel(), 3);
        assert_eq!(ColorDepth::Argb32.bytes_per_pixel(), 4);
    }

    #[test]
    fn test_store24_low_byte_first() {
        let mut fb = Framebuffer::new(Size::new(2, 1), ColorDepth::Rgb24);
        fb.store24(1, 0, rgb(0x11, 0x22, 0x33));
        assert_eq!(&fb.as_bytes()[3..6], &[0x33, 0x22, 0x11]); // B, G, R
        assert_eq!(fb.load24(1, 0) & 0x00ff_ffff, 0x0011_2233);
    }

    #[test]
    fn test_store16_roundtrip() {
        let mut fb = Framebuffer::new(Size::new(2, 2), ColorDepth::Rgb16);
        let packed = quantize_565(rgb(255, 128, 0));
        fb.store16(1, 1, packed);
        assert_eq!(fb.load16(1, 1), packed);
        assert_eq!(fb.load16(0, 0), 0);
    }

    #[test]
    fn test_store32_roundtrip() {
        let mut fb = Framebuffer::new(Size::new(3, 1), ColorDepth::Argb32);
        fb.store32(2, 0, 0xff11_2233);
        assert_eq!(fb.load32(2, 0), 0xff11_2233);
    }
}
