/// Pixel-probe coordinates: four corners, the centre, and a few random
/// points.
///
/// The random points come from a [`CoordinateSource`] so tests can pin them
/// with a seed. Every coordinate produced here is inside `0..width` ×
/// `0..height`; an out-of-range probe on a valid image would be a false
/// positive.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies random in-bounds coordinates.
pub trait CoordinateSource {
    /// A point with `x < width` and `y < height`. Both dimensions are > 0.
    fn pick(&mut self, width: u32, height: u32) -> (u32, u32);
}

/// Any RNG is a coordinate source.
impl<R: Rng> CoordinateSource for R {
    fn pick(&mut self, width: u32, height: u32) -> (u32, u32) {
        (self.random_range(0..width), self.random_range(0..height))
    }
}

/// RNG for one batch: deterministic when a seed is given, OS-seeded otherwise.
pub fn batch_rng(seed: Option<u64>, batch_index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(batch_index as u64)),
        None => StdRng::from_os_rng(),
    }
}

/// The fixed probes: four corners then the exact centre.
pub fn fixed_points(width: u32, height: u32) -> [(u32, u32); 5] {
    let (right, bottom) = (width - 1, height - 1);
    [
        (0, 0),
        (right, 0),
        (0, bottom),
        (right, bottom),
        (width / 2, height / 2),
    ]
}

/// Fixed probes followed by `random` points drawn from `source`.
///
/// Returns an empty list for a zero-sized image.
pub fn sample_points(
    width: u32,
    height: u32,
    random: usize,
    source: &mut dyn CoordinateSource,
) -> Vec<(u32, u32)> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let mut points = Vec::with_capacity(5 + random);
    points.extend_from_slice(&fixed_points(width, height));
    points.extend((0..random).map(|_| source.pick(width, height)));
    points
}
