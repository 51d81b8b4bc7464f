/// Image validation: decides whether a single file is corrupt.
///
/// A file is declared intact only after it survives every stage:
///
/// 1. [`sniff`]: size, magic bytes, JPEG trailer. No decode.
/// 2. Container header: the format must be recognisable from content and
///    the reported dimensions non-zero.
/// 3. Forced full decode of the pixel data.
/// 4. Pixel probes at the corners, the centre, and a few random points.
/// 5. [`verify`]: an independent structural walk of a freshly read copy.
///
/// Failures in stages 3 and 5 are classified by [`keywords`]; errors that
/// match no corruption signal leave the file marked intact. Files that
/// cannot be read at all are reported as [`Verdict::Inaccessible`], never as
/// corrupt.
pub mod keywords;
pub mod sampler;
pub mod sniff;
pub mod verify;

use crate::error::VerifyError;
use image::{DynamicImage, ImageDecoder, ImageReader, ImageResult};
use keywords::{
    classify_image_error, classify_io, classify_message, ErrorClass, DECODE_CORRUPTION_KEYWORDS,
    FALLBACK_CORRUPTION_KEYWORDS, VERIFY_CORRUPTION_KEYWORDS,
};
use rand::rngs::StdRng;
use sampler::CoordinateSource;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Outcome of validating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Intact,
    /// Corrupt, with a short description of the failing check.
    Corrupt(String),
    /// Could not be read (permissions, vanished file). Not flagged.
    Inaccessible,
}

impl Verdict {
    #[inline]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Verdict::Corrupt(_))
    }

    fn from_class(class: ErrorClass, detail: impl Into<String>) -> Self {
        match class {
            ErrorClass::Corrupt => Verdict::Corrupt(detail.into()),
            ErrorClass::Inaccessible => Verdict::Inaccessible,
            ErrorClass::Benign => Verdict::Intact,
        }
    }
}

/// Runs the staged checks. Holds the coordinate source for the random pixel
/// probes, so one validator is created per batch and reused for its files.
pub struct ImageValidator<S = StdRng> {
    source: S,
    random_samples: usize,
}

impl ImageValidator<StdRng> {
    /// Validator for batch `batch_index`; deterministic when `seed` is set.
    pub fn for_batch(seed: Option<u64>, batch_index: usize, random_samples: usize) -> Self {
        Self::with_source(sampler::batch_rng(seed, batch_index), random_samples)
    }
}

impl<S: CoordinateSource> ImageValidator<S> {
    pub fn with_source(source: S, random_samples: usize) -> Self {
        Self {
            source,
            random_samples,
        }
    }

    /// `true` if `path` is classified corrupt.
    pub fn is_corrupt(&mut self, path: &Path) -> bool {
        self.check(path).is_corrupt()
    }

    /// Run every stage against `path`.
    pub fn check(&mut self, path: &Path) -> Verdict {
        if sniff::is_structurally_invalid(path) {
            return Verdict::Corrupt("failed header check".into());
        }

        let verdict = match self.inspect(path) {
            Ok(verdict) => verdict,
            Err(err) => Verdict::from_class(
                classify_image_error(&err, FALLBACK_CORRUPTION_KEYWORDS),
                err.to_string(),
            ),
        };
        match &verdict {
            Verdict::Corrupt(reason) => debug!("corrupt: {} ({reason})", path.display()),
            Verdict::Inaccessible => debug!("skipped unreadable file {}", path.display()),
            Verdict::Intact => {}
        }
        verdict
    }

    /// Stages 2–5. Errors returned here escaped stage-specific handling and
    /// are classified with the fallback keyword set.
    fn inspect(&mut self, path: &Path) -> ImageResult<Verdict> {
        // Format comes from content only; the extension is not trusted.
        let reader = ImageReader::new(BufReader::new(File::open(path)?)).with_guessed_format()?;
        let Some(format) = reader.format() else {
            return Ok(Verdict::Corrupt("unrecognised image format".into()));
        };

        let decoder = reader.into_decoder()?;
        let (width, height) = decoder.dimensions();
        if width == 0 || height == 0 {
            return Ok(Verdict::Corrupt(format!(
                "invalid dimensions {width}x{height}"
            )));
        }

        let image = match DynamicImage::from_decoder(decoder) {
            Ok(image) => image,
            Err(err) => {
                return Ok(Verdict::from_class(
                    classify_image_error(&err, DECODE_CORRUPTION_KEYWORDS),
                    err.to_string(),
                ))
            }
        };

        if let Some(reason) = self.probe_pixels(&image, width, height) {
            return Ok(Verdict::Corrupt(reason));
        }

        Ok(match verify::verify_file(path, format) {
            Ok(()) => Verdict::Intact,
            Err(VerifyError::Io(err)) => {
                Verdict::from_class(classify_io(&err, VERIFY_CORRUPTION_KEYWORDS), err.to_string())
            }
            Err(err) => {
                let msg = err.to_string();
                Verdict::from_class(classify_message(&msg, VERIFY_CORRUPTION_KEYWORDS), msg)
            }
        })
    }

    /// Materialise canonical RGBA pixels and read every probe point.
    /// Returns a reason if any probe fails.
    fn probe_pixels(&mut self, image: &DynamicImage, width: u32, height: u32) -> Option<String> {
        if image.width() != width || image.height() != height {
            return Some(format!(
                "decoded size {}x{} differs from header {width}x{height}",
                image.width(),
                image.height()
            ));
        }

        let rgba = image.to_rgba8();
        let expected = width as usize * height as usize * 4;
        if rgba.as_raw().len() != expected {
            return Some("pixel buffer incomplete".into());
        }

        let points = sampler::sample_points(width, height, self.random_samples, &mut self.source);
        points
            .into_iter()
            .find(|&(x, y)| rgba.get_pixel_checked(x, y).is_none())
            .map(|(x, y)| format!("pixel ({x}, {y}) unreadable"))
    }
}

/// Classify one file with an OS-seeded validator.
pub fn is_corrupt(path: &Path) -> bool {
    ImageValidator::for_batch(None, 0, crate::config::DEFAULT_RANDOM_SAMPLES).is_corrupt(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    fn save(dir: &TempDir, name: &str, format: ImageFormat) -> PathBuf {
        let path = dir.path().join(name);
        gradient(64, 48).save_with_format(&path, format).unwrap();
        path
    }

    fn seeded() -> ImageValidator {
        ImageValidator::for_batch(Some(0x5EED), 0, 3)
    }

    // ── Valid fixtures ──────────────────────────────────────────────────────

    #[test]
    fn well_formed_images_are_intact() {
        let dir = TempDir::new().unwrap();
        for (name, format) in [
            ("ok.jpg", ImageFormat::Jpeg),
            ("ok.png", ImageFormat::Png),
            ("ok.gif", ImageFormat::Gif),
            ("ok.bmp", ImageFormat::Bmp),
        ] {
            let path = save(&dir, name, format);
            assert_eq!(seeded().check(&path), Verdict::Intact, "{name}");
        }
    }

    #[test]
    fn rgba_png_is_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alpha.png");
        let img: RgbaImage = ImageBuffer::from_pixel(5, 3, Rgba([1, 2, 3, 4]));
        img.save(&path).unwrap();
        assert!(!seeded().is_corrupt(&path));
    }

    /// Repeated checks with fresh OS-seeded probes never flag a valid file.
    #[test]
    fn random_probes_never_flag_valid_image() {
        let dir = TempDir::new().unwrap();
        let path = save(&dir, "repeat.png", ImageFormat::Png);
        for i in 0..50 {
            assert!(!is_corrupt(&path), "run {i} flagged a valid image");
        }
    }

    /// A 1×1 image puts every probe on the same pixel.
    #[test]
    fn single_pixel_image_is_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dot.png");
        let img: RgbImage = ImageBuffer::from_pixel(1, 1, Rgb([9, 9, 9]));
        img.save(&path).unwrap();
        assert!(!seeded().is_corrupt(&path));
    }

    // ── Corrupt fixtures ────────────────────────────────────────────────────

    #[test]
    fn zero_byte_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.png");
        fs::write(&path, b"").unwrap();
        assert!(seeded().is_corrupt(&path));
    }

    #[test]
    fn jpeg_missing_end_marker_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = save(&dir, "cut.jpg", ImageFormat::Jpeg);
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 2);
        fs::write(&path, &bytes).unwrap();
        assert!(seeded().is_corrupt(&path));
    }

    #[test]
    fn png_below_minimum_size_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = save(&dir, "tiny.png", ImageFormat::Png);
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(40);
        fs::write(&path, &bytes).unwrap();
        assert!(seeded().is_corrupt(&path));
    }

    /// Large enough to pass the header check, but the chunk stream stops
    /// halfway through the image data.
    #[test]
    fn png_truncated_mid_stream_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = save(&dir, "half.png", ImageFormat::Png);
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() / 2);
        fs::write(&path, &bytes).unwrap();
        assert!(seeded().is_corrupt(&path));
    }

    #[test]
    fn gif_missing_trailer_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = save(&dir, "cut.gif", ImageFormat::Gif);
        let mut bytes = fs::read(&path).unwrap();
        bytes.pop();
        fs::write(&path, &bytes).unwrap();
        assert!(seeded().is_corrupt(&path));
    }

    #[test]
    fn unrecognised_content_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.jpg");
        fs::write(&path, b"this is plainly not an image at all").unwrap();
        assert!(matches!(seeded().check(&path), Verdict::Corrupt(_)));
    }

    // ── Indeterminate ───────────────────────────────────────────────────────

    #[test]
    fn missing_file_is_inaccessible_not_corrupt() {
        let dir = TempDir::new().unwrap();
        let verdict = seeded().check(&dir.path().join("gone.png"));
        assert_eq!(verdict, Verdict::Inaccessible);
    }

    #[test]
    fn idempotent_on_unmodified_file() {
        let dir = TempDir::new().unwrap();
        let good = save(&dir, "a.jpg", ImageFormat::Jpeg);
        let bad = dir.path().join("b.png");
        fs::write(&bad, b"").unwrap();
        for _ in 0..5 {
            assert!(!seeded().is_corrupt(&good));
            assert!(seeded().is_corrupt(&bad));
        }
    }
}
