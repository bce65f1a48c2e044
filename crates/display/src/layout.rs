/// Position of one colour channel inside a pixel, in bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bitfield {
    pub offset: u32,
    pub length: u32,
}

impl Bitfield {
    pub const fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }
}

/// Framebuffer geometry and channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceLayout {
    /// Visible width in pixels.
    pub width: u32,
    /// Visible height in pixels.
    pub height: u32,
    /// Height of the whole mapped buffer, including off-screen pages.
    pub virtual_height: u32,
    pub bits_per_pixel: u32,
    /// Bytes per row, including any padding.
    pub line_length: u32,
    pub red: Bitfield,
    pub green: Bitfield,
    pub blue: Bitfield,
    pub transp: Bitfield,
}

impl SurfaceLayout {
    /// 32-bit little-endian XRGB/ARGB, the common fbdev default.
    pub fn argb8888(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            virtual_height: height,
            bits_per_pixel: 32,
            line_length: width * 4,
            red: Bitfield::new(16, 8),
            green: Bitfield::new(8, 8),
            blue: Bitfield::new(0, 8),
            transp: Bitfield::new(24, 8),
        }
    }

    pub fn rgb565(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            virtual_height: height,
            bits_per_pixel: 16,
            line_length: width * 2,
            red: Bitfield::new(11, 5),
            green: Bitfield::new(5, 6),
            blue: Bitfield::new(0, 5),
            transp: Bitfield::default(),
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel / 8) as usize
    }

    pub fn is_supported(&self) -> bool {
        matches!(self.bits_per_pixel, 16 | 24 | 32)
    }

    /// Size of the region to map: every virtual row.
    pub fn mapping_len(&self) -> usize {
        self.virtual_height as usize * self.line_length as usize
    }
}
