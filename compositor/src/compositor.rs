//! Surface Compositor
//!
//! The registry owning the z-ordered surface stack, the per-pixel
//! ownership map and the output framebuffer. Damage flows through two
//! stages: ownership recomputation for the affected rectangle, then
//! recomposition of that rectangle into the framebuffer.
//!
//! The ownership map holds one byte per screen pixel: the stack
//! position of the topmost surface with visible coverage there, or
//! [`OWNER_NONE`] where no surface reaches. Recomposition walks the
//! stack bottom-to-top; a pixel whose map entry matches the current
//! position is written to the framebuffer (blended over the backing
//! accumulator when translucent layers sit beneath), any other visible
//! pixel folds into the backing accumulator instead of the output.

use alloc::vec;
use alloc::vec::Vec;

use crate::color::{alpha_of, blue_of, green_of, mix, mix_channel, quantize_565, red_of, rgb};
use crate::framebuffer::{ColorDepth, Framebuffer};
use crate::geometry::{Point, Rect, Size};
use crate::surface::{Surface, SurfaceFlags, HIDDEN_Z};
use crate::text::GlyphAtlas;
use crate::CompositorError;

/// Ownership-map sentinel for pixels no surface covers.
pub const OWNER_NONE: u8 = 0xff;

/// Upper bound on simultaneously visible surfaces; stack positions
/// must stay representable in the one-byte ownership map below the
/// sentinel.
pub const MAX_VISIBLE: usize = 255;

/// Stable handle to a surface in the registry. Slots are reused after
/// removal, so holders must not cache handles past `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(usize);

pub struct Compositor {
    resolution: Size,
    framebuffer: Framebuffer,
    surfaces: Vec<Option<Surface>>,
    /// Visible surfaces bottom-to-top; index is the stack position
    /// recorded in the ownership map.
    stack: Vec<SurfaceId>,
    map: Vec<u8>,
}

impl Compositor {
    pub fn new(resolution: Size, depth: ColorDepth) -> Result<Self, CompositorError> {
        if resolution.area() == 0 {
            return Err(CompositorError::ZeroResolution);
        }
        Ok(Self {
            resolution,
            framebuffer: Framebuffer::new(resolution, depth),
            surfaces: Vec::new(),
            stack: Vec::new(),
            map: vec![OWNER_NONE; resolution.area()],
        })
    }

    pub fn resolution(&self) -> Size {
        self.resolution
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Number of surfaces currently in the visible stack.
    pub fn visible_count(&self) -> usize {
        self.stack.len()
    }

    /// Handle of the surface at the given stack position.
    pub fn stack_id(&self, pos: usize) -> Option<SurfaceId> {
        self.stack.get(pos).copied()
    }

    /// Ownership-map entry for a screen pixel; `None` off screen.
    pub fn owner(&self, p: Point) -> Option<u8> {
        if p.x < 0 || p.x >= self.resolution.width || p.y < 0 || p.y >= self.resolution.height {
            return None;
        }
        Some(self.map[(p.y * self.resolution.width + p.x) as usize])
    }

    /// Register a new hidden surface and return its handle. Freed
    /// slots are reused before the arena grows.
    pub fn create_surface(&mut self, size: Size, flags: SurfaceFlags) -> SurfaceId {
        let surface = Surface::new(size, flags);
        if let Some(slot) = self.surfaces.iter().position(Option::is_none) {
            self.surfaces[slot] = Some(surface);
            return SurfaceId(slot);
        }
        self.surfaces.push(Some(surface));
        SurfaceId(self.surfaces.len() - 1)
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(id.0).and_then(Option::as_ref)
    }

    pub fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Remove a surface entirely: hide it (compacting the stack), run
    /// its close callback and free the slot.
    pub fn remove(&mut self, id: SurfaceId) {
        if self.surface(id).is_none() {
            return;
        }
        self.set_z(id, HIDDEN_Z);
        if let Some(mut surface) = self.surfaces[id.0].take() {
            if let Some(on_closed) = surface.on_closed.take() {
                on_closed();
            }
        }
    }

    /// Move a surface to stack position `z`, shifting its neighbors.
    ///
    /// `z` is clamped to `[-1, top + 1]`; −1 hides the surface and the
    /// stack compacts around it. Raising a hidden surface when the
    /// stack is already at capacity is ignored. Every visibility or
    /// position change recomputes ownership for the surface's frame
    /// and recomposites it.
    pub fn set_z(&mut self, id: SurfaceId, z: i32) {
        let top = self.stack.len() as i32 - 1;
        let Some(surface) = self.surface(id) else {
            log::warn!("set_z on unknown surface {id:?}");
            return;
        };
        let old = surface.z();
        let frame = surface.frame();
        let z = z.clamp(HIDDEN_Z, top + 1);
        if old == z {
            return;
        }

        if old > z {
            // Lowered. Position indices above the landing point shift
            // up by one; hiding compacts instead.
            let pos = self
                .stack
                .iter()
                .position(|&s| s == id)
                .unwrap_or(self.stack.len());
            self.stack.remove(pos);
            if z >= 0 {
                self.stack.insert(z as usize, id);
                self.resync_positions(z as usize);
                self.refresh_map(frame, z as usize);
            } else {
                self.resync_positions(pos);
                if let Some(surface) = self.surface_mut(id) {
                    surface.set_z(HIDDEN_Z);
                }
                self.refresh_map(frame, 0);
            }
            self.composite(frame);
        } else {
            // Raised, possibly from hidden.
            if old >= 0 {
                self.stack.remove(old as usize);
            } else if self.stack.len() >= MAX_VISIBLE {
                log::warn!("surface stack full, ignoring show of {id:?}");
                return;
            }
            let at = (z as usize).min(self.stack.len());
            self.stack.insert(at, id);
            self.resync_positions(if old >= 0 { (old as usize).min(at) } else { at });
            self.refresh_map(frame, at);
            self.composite(frame);
        }
    }

    /// Re-composite a sub-rectangle of one surface's content after
    /// in-place drawing. `rect` is in surface-local coordinates.
    /// Hidden surfaces are skipped.
    pub fn refresh(&mut self, id: SurfaceId, rect: Rect) {
        let Some(surface) = self.surface(id) else {
            return;
        };
        let z = surface.z();
        if z < 0 {
            return;
        }
        let screen_rect = rect.translated(surface.frame().offset);
        self.refresh_map(screen_rect, z as usize);
        self.composite(screen_rect);
    }

    /// Reposition a surface. Old and new frames are refreshed
    /// independently rather than as one bounding box.
    pub fn move_to(&mut self, id: SurfaceId, pos: Point) {
        let Some(surface) = self.surface_mut(id) else {
            return;
        };
        let old_frame = surface.frame();
        surface.set_origin(pos);
        let z = surface.z();
        if z < 0 {
            return;
        }
        let new_frame = self.surface(id).map(Surface::frame).unwrap_or(old_frame);
        self.refresh_map(old_frame, 0);
        self.refresh_map(new_frame, z as usize);
        self.composite(old_frame);
        self.composite(new_frame);
    }

    fn resync_positions(&mut self, from: usize) {
        for pos in from..self.stack.len() {
            let id = self.stack[pos];
            if let Some(surface) = self.surfaces[id.0].as_mut() {
                surface.set_z(pos as i32);
            }
        }
    }

    /// Recompute ownership inside `range` for every stack position at
    /// or above `from`. Later positions overwrite earlier stamps, so
    /// the final entry is always the topmost visible owner. Opaque
    /// surfaces stamp whole rows at once; irregular surfaces test each
    /// source pixel's alpha.
    pub fn refresh_map(&mut self, range: Rect, from: usize) {
        let vx0 = range.offset.x.max(0);
        let vy0 = range.offset.y.max(0);
        let vx1 = range.end_point().x.min(self.resolution.width);
        let vy1 = range.end_point().y.min(self.resolution.height);
        let stride = self.resolution.width;

        // A full recompute starts from the sentinel so pixels no
        // surface covers anymore do not keep a stale owner.
        if from == 0 && vx0 < vx1 {
            for vy in vy0..vy1 {
                let row = (vy * stride) as usize;
                self.map[row + vx0 as usize..row + vx1 as usize].fill(OWNER_NONE);
            }
        }

        for pos in from..self.stack.len() {
            let Some(surface) = self.surfaces[self.stack[pos].0].as_ref() else {
                continue;
            };
            let frame = surface.frame();
            let bx0 = (vx0 - frame.offset.x).max(0);
            let by0 = (vy0 - frame.offset.y).max(0);
            let bx1 = (vx1 - frame.offset.x).min(frame.size.width);
            let by1 = (vy1 - frame.offset.y).min(frame.size.height);
            if bx0 >= bx1 || by0 >= by1 {
                continue;
            }
            // Index arithmetic stays signed until the clipped x is
            // folded in; a frame hanging off the top/left edge has a
            // negative offset and must not wrap through usize.
            if !surface.is_irregular() {
                for by in by0..by1 {
                    let row = ((frame.offset.y + by) * stride + frame.offset.x + bx0) as usize;
                    self.map[row..row + (bx1 - bx0) as usize].fill(pos as u8);
                }
            } else {
                for by in by0..by1 {
                    let src = surface.buffer().row(by);
                    let row = (frame.offset.y + by) * stride + frame.offset.x;
                    for bx in bx0..bx1 {
                        if alpha_of(src[bx as usize]) != 0 {
                            self.map[(row + bx) as usize] = pos as u8;
                        }
                    }
                }
            }
        }
    }

    /// Recomposite `range` into the framebuffer from the current stack
    /// and ownership map. Visible non-winner pixels accumulate into a
    /// backing buffer scoped to `range` so a translucent winner blends
    /// over everything beneath it in a single pass.
    pub fn composite(&mut self, range: Rect) {
        let vx0 = range.offset.x.max(0);
        let vy0 = range.offset.y.max(0);
        let vx1 = range.end_point().x.min(self.resolution.width);
        let vy1 = range.end_point().y.min(self.resolution.height);
        if vx0 >= vx1 || vy0 >= vy1 {
            return;
        }
        let bw = vx1 - vx0;
        let stride = self.resolution.width;
        let mut backing = vec![0u32; (bw * (vy1 - vy0)) as usize];

        for pos in 0..self.stack.len() {
            let Some(surface) = self.surfaces[self.stack[pos].0].as_ref() else {
                continue;
            };
            let frame = surface.frame();
            let bx0 = (vx0 - frame.offset.x).max(0);
            let by0 = (vy0 - frame.offset.y).max(0);
            let bx1 = (vx1 - frame.offset.x).min(frame.size.width);
            let by1 = (vy1 - frame.offset.y).min(frame.size.height);
            for by in by0..by1 {
                let src = surface.buffer().row(by);
                let sy = frame.offset.y + by;
                for bx in bx0..bx1 {
                    let sx = frame.offset.x + bx;
                    let color = src[bx as usize];
                    let back_at = ((sy - vy0) * bw + (sx - vx0)) as usize;
                    if self.map[(sy * stride + sx) as usize] == pos as u8 {
                        match self.framebuffer.depth() {
                            ColorDepth::Argb32 => {
                                let out = if pos == 0 {
                                    color
                                } else {
                                    mix(color, backing[back_at])
                                };
                                self.framebuffer.store32(sx, sy, out);
                            }
                            ColorDepth::Rgb24 => {
                                let out = if pos > 1 {
                                    mix(color, backing[back_at])
                                } else {
                                    color
                                };
                                self.framebuffer.store24(sx, sy, out);
                            }
                            ColorDepth::Rgb16 => {
                                let packed = if pos <= 1 {
                                    quantize_565(color)
                                } else {
                                    // Inline 5-6-5 blend: each channel
                                    // mixed over the backing value then
                                    // narrowed, no 32-bit repack.
                                    let back = backing[back_at];
                                    let a = alpha_of(color);
                                    let r = mix_channel(red_of(color), red_of(back), a);
                                    let g = mix_channel(green_of(color), green_of(back), a);
                                    let b = mix_channel(blue_of(color), blue_of(back), a);
                                    (((r as u16) << 8) & 0xf800)
                                        | (((g as u16) << 3) & 0x07e0)
                                        | ((b as u16) >> 3)
                                };
                                self.framebuffer.store16(sx, sy, packed);
                            }
                        }
                    } else if alpha_of(color) != 0 {
                        backing[back_at] = if pos == 0 {
                            color
                        } else {
                            mix(color, backing[back_at])
                        };
                    }
                }
            }
        }
    }

    /// Last-resort panic display: paint the whole framebuffer blue and
    /// render the message directly, bypassing the surface stack, which
    /// may be the thing that is broken.
    pub fn blue_screen(&mut self, atlas: &GlyphAtlas, message: &[u8]) {
        let blue = rgb(0, 0, 255);
        for y in 0..self.resolution.height {
            for x in 0..self.resolution.width {
                self.store_direct(x, y, blue);
            }
        }
        let white = rgb(255, 255, 255);
        let mut pen = Point::new(0, 0);
        for &code in message {
            let glyph = atlas.single(code);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..8 {
                    if bits & (0x80 >> col) != 0 {
                        let x = pen.x + col;
                        let y = pen.y + row as i32;
                        if x < self.resolution.width && y < self.resolution.height {
                            self.store_direct(x, y, white);
                        }
                    }
                }
            }
            pen.x += 8;
        }
    }

    fn store_direct(&mut self, x: i32, y: i32, color: u32) {
        match self.framebuffer.depth() {
            ColorDepth::Argb32 => self.framebuffer.store32(x, y, color),
            ColorDepth::Rgb24 => self.framebuffer.store24(x, y, color),
            ColorDepth::Rgb16 => self.framebuffer.store16(x, y, quantize_565(color)),
        }
    }
}
