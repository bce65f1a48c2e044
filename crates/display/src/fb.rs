use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};

use crate::blit::blit;
use crate::layout::{Bitfield, SurfaceLayout};

const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;
const FBIOGET_FSCREENINFO: libc::c_ulong = 0x4602;

/// Errors from the framebuffer device.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to open framebuffer {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{request} failed: {source}")]
    Query {
        request: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("unsupported framebuffer depth: {0} bits per pixel (need 16, 24 or 32)")]
    UnsupportedDepth(u32),
    #[error("framebuffer reports an empty mapping ({height} rows of {line_length} bytes)")]
    EmptyMapping { height: u32, line_length: u32 },
    #[error("failed to map framebuffer: {0}")]
    Map(#[source] io::Error),
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// `struct fb_var_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbFixScreeninfo {
    id: [u8; 16],
    smem_start: libc::c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: libc::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

impl From<FbBitfield> for Bitfield {
    fn from(f: FbBitfield) -> Self {
        Bitfield::new(f.offset, f.length)
    }
}

/// A memory-mapped fbdev device. Unmapped and closed on drop.
pub struct Framebuffer {
    map: MmapMut,
    layout: SurfaceLayout,
    id: String,
    _file: File,
}

impl Framebuffer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DisplayError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| DisplayError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let mut var = FbVarScreeninfo::default();
        ioctl(&file, FBIOGET_VSCREENINFO, &mut var, "FBIOGET_VSCREENINFO")?;
        let mut fix = FbFixScreeninfo::default();
        ioctl(&file, FBIOGET_FSCREENINFO, &mut fix, "FBIOGET_FSCREENINFO")?;

        let layout = SurfaceLayout {
            width: var.xres,
            height: var.yres,
            virtual_height: var.yres_virtual,
            bits_per_pixel: var.bits_per_pixel,
            line_length: fix.line_length,
            red: var.red.into(),
            green: var.green.into(),
            blue: var.blue.into(),
            transp: var.transp.into(),
        };
        if !layout.is_supported() {
            return Err(DisplayError::UnsupportedDepth(layout.bits_per_pixel));
        }
        if layout.mapping_len() == 0 {
            return Err(DisplayError::EmptyMapping {
                height: layout.virtual_height,
                line_length: layout.line_length,
            });
        }

        // SAFETY: the mapping covers `yres_virtual * line_length` bytes, the
        // size the driver reports for this device. `file` is kept alive for
        // as long as the mapping. Other writers (the console) may scribble on
        // the same pages; that only affects what is shown, not memory safety
        // of our byte-level writes.
        let map = unsafe {
            MmapOptions::new()
                .len(layout.mapping_len())
                .map_mut(&file)
                .map_err(DisplayError::Map)?
        };

        let id = String::from_utf8_lossy(&fix.id)
            .trim_end_matches('\0')
            .to_string();
        tracing::info!(
            id = %id,
            width = layout.width,
            height = layout.height,
            bpp = layout.bits_per_pixel,
            line_length = layout.line_length,
            red = ?layout.red,
            green = ?layout.green,
            blue = ?layout.blue,
            transp = ?layout.transp,
            "opened framebuffer"
        );

        Ok(Self {
            map,
            layout,
            id,
            _file: file,
        })
    }

    pub fn layout(&self) -> &SurfaceLayout {
        &self.layout
    }

    pub fn width(&self) -> u32 {
        self.layout.width
    }

    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// Driver identification string, e.g. `"EFI VGA"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Write an RGBA8 bottom-up frame onto the screen.
    pub fn present(&mut self, rgba: &[u8], width: u32, height: u32) {
        blit(rgba, width, height, &self.layout, &mut self.map[..]);
    }
}

fn ioctl<T>(file: &File, request: libc::c_ulong, out: &mut T, name: &'static str) -> Result<(), DisplayError> {
    // SAFETY: `out` is a live, writable repr(C) struct matching the layout the
    // kernel expects for `request`.
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), request as _, out as *mut T) };
    if rc < 0 {
        return Err(DisplayError::Query {
            request: name,
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}
