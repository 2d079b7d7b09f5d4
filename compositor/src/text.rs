//! Text Rendering
//!
//! Bitmap glyph blits plus the streaming multi-encoding string decoder.
//! Glyphs come from a [`GlyphAtlas`]: a raw byte blob whose first
//! 256×16 bytes are single-byte-code-point bitmaps (one byte per
//! scanline) followed by 32-byte records (two stacked 16-byte halves)
//! for double-width glyphs.
//!
//! The decoder is a one-byte-lookahead state machine. Shift_JIS and
//! EUC-JP compute the wide-glyph index from lead/trail arithmetic;
//! UTF-8 resolves a few fixed halfwidth/fullwidth fallbacks inline and
//! hands every other multi-byte sequence to an external
//! [`CodePointMap`]. Out-of-range indices and unmapped code points are
//! skipped silently; the pen still advances so surrounding text keeps
//! its layout.

use alloc::vec::Vec;

use crate::geometry::Point;
use crate::platform::CodePointMap;
use crate::surface::Surface;
use crate::CompositorError;

/// Size of the single-byte glyph block at the front of the atlas.
const SINGLE_BLOCK: usize = 256 * 16;

/// Cell advance in pixels per decoded input cell.
const CELL_WIDTH: i32 = 8;

/// Byte-stream encodings understood by [`Surface::draw_string`].
/// Bytes that do not start a multi-byte sequence always fall back to
/// the single-byte glyph block, whatever the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    ShiftJis,
    Utf8,
    EucJp,
}

/// Raw font blob wrapper with bounds-checked glyph access.
#[derive(Debug)]
pub struct GlyphAtlas {
    data: Vec<u8>,
}

impl GlyphAtlas {
    /// Wrap a loaded font blob. The blob must at least hold the full
    /// single-byte block; the wide block may be any length including
    /// empty.
    pub fn new(data: Vec<u8>) -> Result<Self, CompositorError> {
        if data.len() < SINGLE_BLOCK {
            return Err(CompositorError::AtlasTruncated {
                len: data.len(),
                need: SINGLE_BLOCK,
            });
        }
        Ok(Self { data })
    }

    /// 16-byte bitmap for a single-byte code point. Always in range.
    pub fn single(&self, code: u8) -> &[u8] {
        let off = code as usize * 16;
        &self.data[off..off + 16]
    }

    /// 32-byte record (left half then right half) for a wide glyph, or
    /// `None` if the index falls past the end of the blob.
    pub fn wide(&self, index: usize) -> Option<&[u8]> {
        let off = SINGLE_BLOCK + index * 32;
        self.data.get(off..off + 32)
    }
}

/// True for a byte that can start a two-byte UTF-8 pair the decoder
/// tracks (the ranges covering the glyphs the atlas maps).
fn utf8_wide_lead(b: u8) -> bool {
    matches!(b, 0xe2..=0xef | 0xc2..=0xd1)
}

/// Row/column arithmetic for a Shift_JIS lead/trail pair. Returns a
/// negative index for bytes outside the trail ranges; the caller skips
/// those.
fn sjis_index(lead: u16, trail: u8) -> i32 {
    let mut row = if (0x81..=0x9f).contains(&lead) {
        (lead as i32 - 0x81) * 2
    } else {
        (lead as i32 - 0xe0) * 2 + 62
    };
    let col = match trail {
        0x40..=0x7e => trail as i32 - 0x40,
        0x80..=0x9e => trail as i32 - 0x80 + 63,
        _ => {
            row += 1;
            trail as i32 - 0x9f
        }
    };
    row * 94 + col
}

impl Surface {
    /// Blit one 8×16 bitmap glyph in a solid color. Each scanline byte
    /// is tested high bit first against columns 0..7; clear bits leave
    /// the destination untouched.
    pub fn draw_char(&mut self, glyph: &[u8], pos: Point, color: u32) {
        for (row, &bits) in glyph.iter().take(16).enumerate() {
            for col in 0..8 {
                if bits & (0x80 >> col) != 0 {
                    self.buffer_mut().put(pos.x + col, pos.y + row as i32, color);
                }
            }
        }
    }

    /// Render an encoded byte string, advancing the pen 8 px per input
    /// cell. Double-width glyphs are drawn as two stacked 16-byte
    /// halves with the left half offset 8 px back, so they occupy two
    /// consecutive cells.
    pub fn draw_string(
        &mut self,
        text: &[u8],
        pos: Point,
        color: u32,
        encoding: Encoding,
        atlas: &GlyphAtlas,
        map: &dyn CodePointMap,
    ) {
        let mut pen = pos;
        let mut lead: u16 = 0;
        let mut i = 0;
        while i < text.len() {
            let b = text[i];
            let mut consumed = 1usize;
            if lead == 0 {
                match encoding {
                    Encoding::ShiftJis if matches!(b, 0x81..=0x9f | 0xe0..=0xfc) => {
                        lead = b as u16;
                    }
                    Encoding::EucJp if matches!(b, 0x81..=0xfe) => {
                        lead = b as u16;
                    }
                    Encoding::Utf8 => {
                        let trail = text.get(i + 1).copied().unwrap_or(0);
                        if utf8_wide_lead(b) && (0x80..=0xbf).contains(&trail) {
                            let pair = ((b as u16) << 8) | trail as u16;
                            match pair {
                                // Halfwidth katakana blocks resolve to
                                // single-byte glyphs by the third byte.
                                0xefbd => {
                                    if let Some(&c) = text.get(i + 2) {
                                        self.draw_char(atlas.single(c), pen, color);
                                    }
                                    consumed = 3;
                                }
                                0xefbe => {
                                    if let Some(&c) = text.get(i + 2) {
                                        self.draw_char(atlas.single(c.wrapping_add(0x40)), pen, color);
                                    }
                                    consumed = 3;
                                }
                                // Wave dash renders as ASCII tilde.
                                0xe280 if text.get(i + 2) == Some(&0xbe) => {
                                    self.draw_char(atlas.single(0x7e), pen, color);
                                    consumed = 3;
                                }
                                // Yen sign renders as backslash.
                                0xc2a5 => {
                                    self.draw_char(atlas.single(0x5c), pen, color);
                                    consumed = 2;
                                }
                                _ => {
                                    lead = pair;
                                    consumed = 2;
                                }
                            }
                        } else {
                            self.draw_char(atlas.single(b), pen, color);
                        }
                    }
                    _ => {
                        self.draw_char(atlas.single(b), pen, color);
                    }
                }
            } else {
                let index = match encoding {
                    Encoding::ShiftJis => {
                        let idx = sjis_index(lead, b);
                        if idx >= 0 {
                            Some(idx as usize)
                        } else {
                            None
                        }
                    }
                    Encoding::EucJp => {
                        let idx = (lead as i32 - 0xa1) * 94 + (b as i32 - 0xa1);
                        if idx >= 0 {
                            Some(idx as usize)
                        } else {
                            None
                        }
                    }
                    Encoding::Utf8 => {
                        // A two-byte lead pair is already complete; the
                        // current byte belongs to the next cell and is
                        // reprocessed. Three-byte sequences fold the
                        // current byte in.
                        let code = if lead >> 12 == 0xc || lead >> 12 == 0xd {
                            consumed = 0;
                            lead as u32
                        } else {
                            ((lead as u32) << 8) | b as u32
                        };
                        map.glyph_index(code)
                    }
                };
                lead = 0;
                if let Some(glyph) = index.and_then(|idx| atlas.wide(idx)) {
                    self.draw_char(&glyph[..16], Point::new(pen.x - CELL_WIDTH, pen.y), color);
                    self.draw_char(&glyph[16..], pen, color);
                }
            }
            i += consumed;
            pen.x += CELL_WIDTH;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::platform::NoCodePoints;
    use crate::surface::SurfaceFlags;
    use alloc::vec;

    /// Atlas with recognizable bitmaps: single-byte glyph for code `c`
    /// is 16 rows of `0x80` shifted so the lit column equals `c % 8`;
    /// wide glyph `i` lights its full left half only.
    fn test_atlas(wide_count: usize) -> GlyphAtlas {
        let mut data = vec![0u8; 256 * 16 + wide_count * 32];
        for c in 0..256 {
            for row in 0..16 {
                data[c * 16 + row] = 0x80 >> (c % 8);
            }
        }
        for i in 0..wide_count {
            let off = 256 * 16 + i * 32;
            for row in 0..16 {
                data[off + row] = 0xff;
            }
        }
        GlyphAtlas::new(data).unwrap()
    }

    fn surface() -> Surface {
        Surface::new(Size::new(64, 32), SurfaceFlags::empty())
    }

    #[test]
    fn test_atlas_rejects_truncated_blob() {
        assert!(matches!(
            GlyphAtlas::new(vec![0u8; 100]),
            Err(CompositorError::AtlasTruncated { len: 100, .. })
        ));
    }

    #[test]
    fn test_wide_out_of_range_is_none() {
        let atlas = test_atlas(2);
        assert!(atlas.wide(1).is_some());
        assert!(atlas.wide(2).is_none());
    }

    #[test]
    fn test_draw_char_bit_to_column() {
        let mut s = surface();
        let glyph = [0b1000_0001u8; 16];
        s.draw_char(&glyph, Point::new(4, 2), 9);
        assert_eq!(s.buffer().get(4, 2), Some(9)); // bit 7 -> column 0
        assert_eq!(s.buffer().get(11, 2), Some(9)); // bit 0 -> column 7
        assert_eq!(s.buffer().get(5, 2), Some(0));
        assert_eq!(s.buffer().get(4, 17), Some(9)); // last of the 16 rows
        assert_eq!(s.buffer().get(4, 18), Some(0)); // nothing past row 15
    }

    #[test]
    fn test_single_byte_cells_advance_by_eight() {
        let atlas = test_atlas(0);
        let mut s = surface();
        // Codes 0x41 ('A', col 1) and 0x42 ('B', col 2).
        s.draw_string(b"AB", Point::new(0, 0), 5, Encoding::Utf8, &atlas, &NoCodePoints);
        assert_eq!(s.buffer().get(1, 0), Some(5));
        assert_eq!(s.buffer().get(8 + 2, 0), Some(5));
    }

    #[test]
    fn test_sjis_index_formulas() {
        // Lead 0x81 is row 0; trail ranges map to the three column bands.
        assert_eq!(sjis_index(0x81, 0x40), 0);
        assert_eq!(sjis_index(0x81, 0x7e), 62);
        assert_eq!(sjis_index(0x81, 0x80), 63);
        assert_eq!(sjis_index(0x81, 0x9e), 93);
        assert_eq!(sjis_index(0x81, 0x9f), 94); // row + 1, col 0
        assert_eq!(sjis_index(0xe0, 0x40), 62 * 94);
    }

    #[test]
    fn test_sjis_wide_glyph_occupies_two_cells() {
        let atlas = test_atlas(1);
        let mut s = surface();
        // 0x81 0x40 -> wide index 0; left half is solid in the atlas.
        s.draw_string(&[0x81, 0x40], Point::new(8, 0), 7, Encoding::ShiftJis, &atlas, &NoCodePoints);
        // Left half sits at the original pen position.
        for x in 8..16 {
            assert_eq!(s.buffer().get(x, 0), Some(7), "left half column {x}");
        }
        // Right half record is blank in the test atlas.
        assert_eq!(s.buffer().get(16, 0), Some(0));
    }

    #[test]
    fn test_sjis_out_of_range_index_skipped() {
        let atlas = test_atlas(1);
        let mut s = surface();
        // Index past the wide block: nothing drawn, no panic.
        s.draw_string(&[0xfc, 0xfc], Point::new(8, 0), 7, Encoding::ShiftJis, &atlas, &NoCodePoints);
        assert!(s.buffer().as_slice().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_eucjp_index() {
        let atlas = test_atlas(100);
        let mut s = surface();
        // 0xa1 0xa1 -> index 0: wide glyph drawn.
        s.draw_string(&[0xa1, 0xa1], Point::new(8, 0), 3, Encoding::EucJp, &atlas, &NoCodePoints);
        assert_eq!(s.buffer().get(8, 0), Some(3));
    }

    #[test]
    fn test_utf8_yen_sign_fallback() {
        let atlas = test_atlas(0);
        let mut s = surface();
        // U+00A5 draws the backslash glyph (0x5c % 8 = column 4).
        s.draw_string(&[0xc2, 0xa5], Point::new(0, 0), 6, Encoding::Utf8, &atlas, &NoCodePoints);
        assert_eq!(s.buffer().get(4, 0), Some(6));
    }

    #[test]
    fn test_utf8_halfwidth_block_direct() {
        let atlas = test_atlas(0);
        let mut s = surface();
        // EF BD xx draws glyph xx directly; EF BE xx draws xx + 0x40.
        s.draw_string(&[0xef, 0xbd, 0xb1], Point::new(0, 0), 2, Encoding::Utf8, &atlas, &NoCodePoints);
        assert_eq!(s.buffer().get((0xb1 % 8) as i32, 0), Some(2));
        let mut s2 = surface();
        s2.draw_string(&[0xef, 0xbe, 0x80], Point::new(0, 0), 2, Encoding::Utf8, &atlas, &NoCodePoints);
        assert_eq!(s2.buffer().get((0xc0 % 8) as i32, 0), Some(2));
    }

    #[test]
    fn test_utf8_three_byte_sequence_via_map() {
        struct One;
        impl CodePointMap for One {
            fn glyph_index(&self, code: u32) -> Option<usize> {
                (code == 0xe38182).then_some(0)
            }
        }
        let atlas = test_atlas(1);
        let mut s = surface();
        // E3 81 82 spans two cells; left solid half at the start pen.
        s.draw_string(&[0xe3, 0x81, 0x82], Point::new(8, 0), 4, Encoding::Utf8, &atlas, &One);
        assert_eq!(s.buffer().get(8, 0), Some(4));
        assert_eq!(s.buffer().get(15, 0), Some(4));
    }

    #[test]
    fn test_utf8_two_byte_lead_reprocesses_next_cell() {
        struct Two;
        impl CodePointMap for Two {
            fn glyph_index(&self, code: u32) -> Option<usize> {
                (code == 0xc390).then_some(0)
            }
        }
        let atlas = test_atlas(1);
        let mut s = surface();
        // C3 90 then 'A': the wide glyph takes two cells, then the
        // ASCII byte renders in the cell after them.
        s.draw_string(&[0xc3, 0x90, 0x41], Point::new(8, 0), 4, Encoding::Utf8, &atlas, &Two);
        assert_eq!(s.buffer().get(8, 0), Some(4)); // left half
        assert_eq!(s.buffer().get(24 + 1, 0), Some(4)); // 'A' col 1 in third cell
    }

    #[test]
    fn test_unmapped_code_point_skipped() {
        let atlas = test_atlas(4);
        let mut s = surface();
        s.draw_string(&[0xe3, 0x81, 0x82], Point::new(8, 0), 4, Encoding::Utf8, &atlas, &NoCodePoints);
        assert!(s.buffer().as_slice().iter().all(|&c| c == 0));
    }
}
