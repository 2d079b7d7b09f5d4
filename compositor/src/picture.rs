//! Picture Blitting
//!
//! Loads a named image resource, decodes it through the host's
//! decoder and copies the pixels into a surface with color-key
//! transparency and integer scaling. Every failure path (missing
//! resource, unknown format, decode error, image larger than the
//! output limit) degrades to drawing nothing.

use crate::color::rgb;
use crate::geometry::{Point, Size};
use crate::platform::{ImageDecoder, ResourceLoader};
use crate::surface::Surface;

/// Resource loader + decoder pair with the output size limit applied
/// to every decoded image.
pub struct PicturePipeline<'a> {
    loader: &'a dyn ResourceLoader,
    decoder: &'a dyn ImageDecoder,
    limit: Size,
}

impl<'a> PicturePipeline<'a> {
    /// `limit` is normally the screen resolution; decoded images
    /// larger than it are rejected.
    pub fn new(loader: &'a dyn ResourceLoader, decoder: &'a dyn ImageDecoder, limit: Size) -> Self {
        Self {
            loader,
            decoder,
            limit,
        }
    }

    /// Blit the named image into `surface` at `pos`. Pixels equal to
    /// `transparent` are skipped, as are pixels already holding the
    /// decoded color. `scale` spreads the image over an N-times grid
    /// by multiplying each destination coordinate.
    pub fn draw(
        &self,
        surface: &mut Surface,
        name: &str,
        pos: Point,
        transparent: u32,
        scale: i32,
    ) {
        let scale = scale.max(1);
        let Some(bytes) = self.loader.load(name) else {
            log::warn!("picture resource missing: {name}");
            return;
        };
        let Some(info) = self.decoder.probe(&bytes) else {
            log::warn!("picture format not recognized: {name}");
            return;
        };
        if info.size.width > self.limit.width || info.size.height > self.limit.height {
            log::warn!(
                "picture {name} exceeds output limit: {}x{}",
                info.size.width,
                info.size.height
            );
            return;
        }
        let Some(pixels) = self.decoder.decode(&bytes) else {
            log::warn!("picture decode failed: {name}");
            return;
        };
        if pixels.len() < info.size.area() * 3 {
            log::warn!("picture decode truncated: {name}");
            return;
        }

        for yy in 0..info.size.height {
            for xx in 0..info.size.width {
                let at = (yy * info.size.width + xx) as usize * 3;
                let color = rgb(pixels[at], pixels[at + 1], pixels[at + 2]);
                if color == transparent {
                    continue;
                }
                let dest = Point::new((xx + pos.x) * scale, (yy + pos.y) * scale);
                if surface.buffer().get(dest.x, dest.y) != Some(color) {
                    surface.buffer_mut().put(dest.x, dest.y, color);
                }
            }
        }
    }
}
