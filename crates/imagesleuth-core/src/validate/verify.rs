/// Structural verification: the final, independent integrity pass.
///
/// Re-reads the file from disk and walks its container structure without
/// decoding any pixels: JPEG marker segments, PNG chunk framing, GIF blocks,
/// and the BMP declared size. This catches damage a pixel decoder can
/// tolerate silently (lost trailing segments, chopped chunk streams).
///
/// Formats without a walker here pass unconditionally.
use crate::error::VerifyError;
use image::ImageFormat;
use std::path::Path;

use super::sniff::{GIF87A, GIF89A, JPEG_SOI, PNG_SIGNATURE};

/// Re-open `path` and verify its structure as `format`.
pub fn verify_file(path: &Path, format: ImageFormat) -> Result<(), VerifyError> {
    let data = std::fs::read(path)?;
    verify_bytes(&data, format)
}

/// Verify an in-memory image as `format`.
pub fn verify_bytes(data: &[u8], format: ImageFormat) -> Result<(), VerifyError> {
    match format {
        ImageFormat::Jpeg => verify_jpeg(data),
        ImageFormat::Png => verify_png(data),
        ImageFormat::Gif => verify_gif(data),
        ImageFormat::Bmp => verify_bmp(data),
        _ => Ok(()),
    }
}

/// Bounds-checked little cursor over the file bytes.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    format: &'static str,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], format: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            format,
        }
    }

    fn premature_end(&self) -> VerifyError {
        VerifyError::PrematureEnd {
            format: self.format,
            offset: self.pos,
        }
    }

    fn u8(&mut self) -> Result<u8, VerifyError> {
        let b = *self.data.get(self.pos).ok_or_else(|| self.premature_end())?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], VerifyError> {
        let end = self.pos.checked_add(n).ok_or_else(|| self.premature_end())?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| self.premature_end())?;
        self.pos = end;
        Ok(slice)
    }

    fn u16_be(&mut self) -> Result<u16, VerifyError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32_be(&mut self) -> Result<u32, VerifyError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

// ── JPEG ──────────────────────────────────────────────────────────────────────

const SOF_MARKERS: [u8; 13] = [
    0xC0, 0xC1, 0xC2, 0xC3, 0xC5, 0xC6, 0xC7, 0xC9, 0xCA, 0xCB, 0xCD, 0xCE, 0xCF,
];
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

/// Markers that carry no length field.
fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0x01 | 0xD0..=0xD7)
}

fn verify_jpeg(data: &[u8]) -> Result<(), VerifyError> {
    let mut cur = Cursor::new(data, "JPEG");
    if cur.take(2)? != JPEG_SOI {
        return Err(VerifyError::BadSignature { format: "JPEG" });
    }

    let mut seen_frame = false;
    loop {
        let offset = cur.pos;
        if cur.u8()? != 0xFF {
            return Err(VerifyError::InvalidMarker {
                marker: data[offset],
                offset,
            });
        }
        let mut marker = cur.u8()?;
        while marker == 0xFF {
            marker = cur.u8()?;
        }

        match marker {
            EOI => return Ok(()),
            m if is_standalone(m) => continue,
            0x00 | 0xD8 => {
                return Err(VerifyError::InvalidMarker {
                    marker,
                    offset: cur.pos - 1,
                })
            }
            _ => {}
        }

        let len = cur.u16_be()? as usize;
        if len < 2 {
            return Err(VerifyError::InvalidMarker {
                marker,
                offset: cur.pos - 2,
            });
        }
        cur.take(len - 2)?;

        if SOF_MARKERS.contains(&marker) {
            seen_frame = true;
        } else if marker == SOS {
            if !seen_frame {
                return Err(VerifyError::ScanBeforeFrame);
            }
            skip_entropy_data(&mut cur)?;
        }
    }
}

/// Advance past entropy-coded data to the next real marker (left unread).
fn skip_entropy_data(cur: &mut Cursor<'_>) -> Result<(), VerifyError> {
    loop {
        let Some(&b) = cur.data.get(cur.pos) else {
            return Err(VerifyError::MissingEndOfImage);
        };
        if b != 0xFF {
            cur.pos += 1;
            continue;
        }
        match cur.data.get(cur.pos + 1) {
            None => return Err(VerifyError::MissingEndOfImage),
            // Stuffed zero byte or restart marker: still inside the scan.
            Some(0x00) | Some(0xD0..=0xD7) | Some(0xFF) => cur.pos += 1,
            Some(_) => return Ok(()),
        }
    }
}

// ── PNG ───────────────────────────────────────────────────────────────────────

fn verify_png(data: &[u8]) -> Result<(), VerifyError> {
    let mut cur = Cursor::new(data, "PNG");
    if cur.take(8)? != PNG_SIGNATURE {
        return Err(VerifyError::BadSignature { format: "PNG" });
    }

    let mut first = true;
    let mut seen_idat = false;
    loop {
        let len = cur.u32_be()? as usize;
        let kind: [u8; 4] = cur
            .take(4)?
            .try_into()
            .map_err(|_| VerifyError::InvalidHeader)?;
        if !kind.iter().all(u8::is_ascii_alphabetic) {
            return Err(VerifyError::InvalidChunkType(kind));
        }
        if first && (&kind != b"IHDR" || len != 13) {
            return Err(VerifyError::InvalidHeader);
        }
        first = false;

        cur.take(len)?;
        let _crc = cur.u32_be()?;

        match &kind {
            b"IDAT" => seen_idat = true,
            b"IEND" => {
                return if seen_idat {
                    Ok(())
                } else {
                    Err(VerifyError::MissingImageData)
                }
            }
            _ => {}
        }
    }
}

// ── GIF ───────────────────────────────────────────────────────────────────────

fn verify_gif(data: &[u8]) -> Result<(), VerifyError> {
    let mut cur = Cursor::new(data, "GIF");
    let sig = cur.take(6)?;
    if sig != GIF87A && sig != GIF89A {
        return Err(VerifyError::BadSignature { format: "GIF" });
    }

    // Logical screen descriptor: width, height, packed, bg index, aspect.
    let screen = cur.take(7)?;
    skip_color_table(&mut cur, screen[4])?;

    loop {
        let offset = cur.pos;
        match cur.u8()? {
            0x3B => return Ok(()),
            0x21 => {
                cur.u8()?; // label
                skip_sub_blocks(&mut cur)?;
            }
            0x2C => {
                let descriptor = cur.take(9)?;
                skip_color_table(&mut cur, descriptor[8])?;
                cur.u8()?; // LZW minimum code size
                skip_sub_blocks(&mut cur)?;
            }
            introducer => return Err(VerifyError::InvalidBlock { introducer, offset }),
        }
    }
}

/// Skip a global or local colour table if the packed flags declare one.
fn skip_color_table(cur: &mut Cursor<'_>, packed: u8) -> Result<(), VerifyError> {
    if packed & 0x80 != 0 {
        let entries = 1usize << ((packed & 0x07) + 1);
        cur.take(entries * 3)?;
    }
    Ok(())
}

fn skip_sub_blocks(cur: &mut Cursor<'_>) -> Result<(), VerifyError> {
    loop {
        let size = cur.u8()? as usize;
        if size == 0 {
            return Ok(());
        }
        cur.take(size)?;
    }
}

// ── BMP ───────────────────────────────────────────────────────────────────────

fn verify_bmp(data: &[u8]) -> Result<(), VerifyError> {
    let mut cur = Cursor::new(data, "BMP");
    if cur.take(2)? != b"BM" {
        return Err(VerifyError::BadSignature { format: "BMP" });
    }
    let header = cur.take(12)?;
    let declared = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as u64;
    let pixel_offset = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as u64;
    let actual = data.len() as u64;

    // Some writers leave the size field zero; only a larger claim is damage.
    if declared > actual {
        return Err(VerifyError::TruncatedBitmap { declared, actual });
    }
    if pixel_offset >= actual {
        return Err(VerifyError::InvalidPixelOffset(pixel_offset));
    }
    Ok(())
}
