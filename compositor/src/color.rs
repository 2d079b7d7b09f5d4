//! Color Kernel
//!
//! Packed `0xAARRGGBB` colors and the pure blending functions every
//! compositing path shares. All arithmetic is integer-only with
//! truncating division; test fixtures depend on the exact channel
//! values, so none of these may round differently.
//!
//! Alpha convention: 255 is fully opaque, 0 is fully transparent.

/// Fully transparent black. Surfaces in per-pixel-alpha mode use this
/// to punch holes.
pub const TRANSPARENT: u32 = 0x0000_0000;

/// Pack an opaque color.
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    rgba(r, g, b, 255)
}

/// Pack a color with explicit alpha in the top byte.
#[inline]
pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub const fn alpha_of(c: u32) -> u8 {
    (c >> 24) as u8
}

#[inline]
pub const fn red_of(c: u32) -> u8 {
    (c >> 16) as u8
}

#[inline]
pub const fn green_of(c: u32) -> u8 {
    (c >> 8) as u8
}

#[inline]
pub const fn blue_of(c: u32) -> u8 {
    c as u8
}

#[inline]
pub const fn is_opaque(c: u32) -> bool {
    (c >> 24) as u8 == 255
}

/// Interpolate one channel of `front` over `back` by `front`'s alpha.
/// Widened to i32 so the difference may go negative; `/` truncates
/// toward zero exactly like the reference arithmetic.
#[inline]
pub(crate) const fn mix_channel(front: u8, back: u8, a: u8) -> u8 {
    (back as i32 + (front as i32 - back as i32) * a as i32 / 255) as u8
}

/// Alpha-composite `front` over `back`. The result carries `front`'s
/// alpha; with `front` fully opaque the result is `front`, bit-exact.
pub const fn mix(front: u32, back: u32) -> u32 {
    let a = alpha_of(front);
    rgba(
        mix_channel(red_of(front), red_of(back), a),
        mix_channel(green_of(front), green_of(back), a),
        mix_channel(blue_of(front), blue_of(back), a),
        a,
    )
}

/// Linear per-channel interpolation between `c0` at `p0` and `c1` at
/// `p1`, evaluated at `p`. Multiplies before the truncating divide so
/// both endpoints reproduce exactly. The alpha channel is copied from
/// `c0`.
pub const fn gradient(p0: i32, p1: i32, p: i32, c0: u32, c1: u32) -> u32 {
    if p1 == p0 {
        return c0;
    }
    let span = p1 - p0;
    let t = p - p0;
    rgba(
        (red_of(c0) as i32 + (red_of(c1) as i32 - red_of(c0) as i32) * t / span) as u8,
        (green_of(c0) as i32 + (green_of(c1) as i32 - green_of(c0) as i32) * t / span) as u8,
        (blue_of(c0) as i32 + (blue_of(c1) as i32 - blue_of(c0) as i32) * t / span) as u8,
        alpha_of(c0),
    )
}

/// Quantize a packed color to 5-6-5 RGB for 16-bit targets.
#[inline]
pub const fn quantize_565(c: u32) -> u16 {
    (((red_of(c) as u16) << 8) & 0xf800)
        | (((green_of(c) as u16) << 3) & 0x07e0)
        | ((blue_of(c) as u16) >> 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let c = rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c, 0x7812_3456);
        assert_eq!(red_of(c), 0x12);
        assert_eq!(green_of(c), 0x34);
        assert_eq!(blue_of(c), 0x56);
        assert_eq!(alpha_of(c), 0x78);
    }

    #[test]
    fn test_rgb_defaults_opaque() {
        assert!(is_opaque(rgb(1, 2, 3)));
        assert_eq!(rgb(255, 0, 0), 0xffff_0000);
    }

    #[test]
    fn test_mix_full_alpha_is_exact() {
        // An opaque front must come through unchanged for every channel.
        let front = rgba(13, 77, 201, 255);
        assert_eq!(mix(front, 0x0000_0000), front);
        assert_eq!(mix(front, 0xffff_ffff), front);
        assert_eq!(mix(front, rgba(200, 1, 99, 3)), front);
    }

    #[test]
    fn test_mix_zero_alpha_keeps_back_channels() {
        let back = rgb(10, 20, 30);
        let out = mix(rgba(200, 200, 200, 0), back);
        assert_eq!(red_of(out), 10);
        assert_eq!(green_of(out), 20);
        assert_eq!(blue_of(out), 30);
        // Result alpha is the front's alpha.
        assert_eq!(alpha_of(out), 0);
    }

    #[test]
    fn test_mix_truncates() {
        // (back + (front - back) * a / 255) with truncating division:
        // 0 + (255 - 0) * 128 / 255 = 128 exactly, 0 + 255*1/255 = 1.
        let half = mix(rgba(255, 255, 255, 128), rgba(0, 0, 0, 255));
        assert_eq!(red_of(half), 128);
        let faint = mix(rgba(255, 255, 255, 1), rgba(0, 0, 0, 255));
        assert_eq!(red_of(faint), 1);
    }

    #[test]
    fn test_gradient_endpoints_exact() {
        let c0 = rgba(10, 250, 0, 200);
        let c1 = rgba(250, 10, 255, 7);
        assert_eq!(gradient(3, 40, 3, c0, c1), c0);
        let at_end = gradient(3, 40, 40, c0, c1);
        assert_eq!(red_of(at_end), 250);
        assert_eq!(green_of(at_end), 10);
        assert_eq!(blue_of(at_end), 255);
        // Alpha comes from c0, not c1.
        assert_eq!(alpha_of(at_end), 200);
    }

    #[test]
    fn test_gradient_degenerate_span() {
        let c0 = rgb(1, 2, 3);
        assert_eq!(gradient(5, 5, 5, c0, rgb(9, 9, 9)), c0);
    }

    #[test]
    fn test_quantize_565() {
        assert_eq!(quantize_565(rgb(255, 255, 255)), 0xffff);
        assert_eq!(quantize_565(rgb(0, 0, 0)), 0x0000);
        assert_eq!(quantize_565(rgb(255, 0, 0)), 0xf800);
        assert_eq!(quantize_565(rgb(0, 255, 0)), 0x07e0);
        assert_eq!(quantize_565(rgb(0, 0, 255)), 0x001f);
    }
}
