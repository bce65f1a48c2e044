use crate::layout::{Bitfield, SurfaceLayout};

/// Copy an RGBA8 frame into a framebuffer laid out as `layout`.
///
/// `src` rows run bottom to top (GL readback order); destination rows run
/// top to bottom, so destination row `y` reads source row `src_height - 1 - y`.
/// The copied region is `min(src, layout)` in each dimension. Writes that
/// would land outside `dst` are dropped, as are source pixels missing from a
/// short `src`. Depths other than 16, 24 or 32 bits leave `dst` untouched.
pub fn blit(src: &[u8], src_width: u32, src_height: u32, layout: &SurfaceLayout, dst: &mut [u8]) {
    if !layout.is_supported() {
        return;
    }
    let draw_w = src_width.min(layout.width) as usize;
    let draw_h = src_height.min(layout.height) as usize;
    let bpp = layout.bytes_per_pixel();
    let line = layout.line_length as usize;
    let src_w = src_width as usize;
    let src_h = src_height as usize;

    for y in 0..draw_h {
        let src_row = (src_h - 1 - y) * src_w * 4;
        for x in 0..draw_w {
            let s = src_row + x * 4;
            let Some(px) = src.get(s..s + 4) else {
                continue;
            };
            let (r, g, b, a) = (px[0], px[1], px[2], px[3]);
            let d = y * line + x * bpp;

            match layout.bits_per_pixel {
                32 => {
                    put(dst, d, layout.red, r);
                    put(dst, d, layout.green, g);
                    put(dst, d, layout.blue, b);
                    if layout.transp.length > 0 {
                        put(dst, d, layout.transp, a);
                    }
                }
                24 => {
                    put(dst, d, layout.red, r);
                    put(dst, d, layout.green, g);
                    put(dst, d, layout.blue, b);
                }
                16 => {
                    let packed = pack(r, layout.red) | pack(g, layout.green) | pack(b, layout.blue);
                    if let Some(out) = dst.get_mut(d..d + 2) {
                        out.copy_from_slice(&(packed as u16).to_ne_bytes());
                    }
                }
                _ => {}
            }
        }
    }
}

/// Byte-aligned channel store.
fn put(dst: &mut [u8], pixel: usize, field: Bitfield, value: u8) {
    if let Some(byte) = dst.get_mut(pixel + (field.offset / 8) as usize) {
        *byte = value;
    }
}

/// Reduce an 8-bit channel to `field.length` bits and move it into place.
fn pack(value: u8, field: Bitfield) -> u32 {
    let len = field.length.min(8);
    let reduced = u32::from(value) >> (8 - len);
    reduced.checked_shl(field.offset).unwrap_or(0)
}
