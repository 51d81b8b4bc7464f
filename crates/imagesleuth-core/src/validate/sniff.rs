/// Header sniffing: a cheap structural check run before any decode.
///
/// Looks only at the file size, the first 12 bytes, and (for JPEG) the last
/// two bytes. No heap allocation. A large share of corrupt files in practice
/// are empty, cut short, or missing their JPEG trailer, and are rejected here
/// without paying for a full decode.
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
pub const GIF87A: &[u8; 6] = b"GIF87a";
pub const GIF89A: &[u8; 6] = b"GIF89a";

/// Bytes read from the start of the file.
const HEADER_LEN: usize = 12;
/// Fewer readable header bytes than this and the file cannot be an image.
const MIN_HEADER_LEN: usize = 4;

const MIN_JPEG_SIZE: u64 = 100;
const MIN_PNG_SIZE: u64 = 50;
const MIN_GIF_SIZE: u64 = 20;

/// Return `true` if the file is certainly not a valid image.
///
/// Never fails: a file that cannot be opened or read is "not determinable"
/// and returns `false`, leaving the verdict to later stages.
pub fn is_structurally_invalid(path: &Path) -> bool {
    match sniff(path) {
        Ok(invalid) => invalid,
        Err(err) => {
            debug!("header sniff skipped for {}: {err}", path.display());
            false
        }
    }
}

fn sniff(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size == 0 {
        return Ok(true);
    }

    let mut header = [0u8; HEADER_LEN];
    let read = read_up_to(&mut file, &mut header)?;
    if read < MIN_HEADER_LEN {
        return Ok(true);
    }

    if header[..2] == JPEG_SOI {
        if size < MIN_JPEG_SIZE {
            return Ok(true);
        }
        let mut tail = [0u8; 2];
        file.seek(SeekFrom::End(-2))?;
        file.read_exact(&mut tail)?;
        return Ok(tail != JPEG_EOI);
    }

    if read >= PNG_SIGNATURE.len() && header[..8] == PNG_SIGNATURE {
        return Ok(size < MIN_PNG_SIZE);
    }

    if read >= GIF87A.len() && (&header[..6] == GIF87A || &header[..6] == GIF89A) {
        return Ok(size < MIN_GIF_SIZE);
    }

    Ok(false)
}

/// Fill as much of `buf` as the file allows, tolerating short reads.
fn read_up_to(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
