//! Perceptual hashing.
//!
//! The database never looks at pixels itself: it asks an injected
//! [`Hasher`] for a fingerprint and indexes that. The default
//! [`DifferenceHasher`] computes a difference hash: the image is
//! box-filtered down to a 9x8 luminance grid and each of the 64 horizontally
//! adjacent pairs contributes one bit, set when the left cell is brighter.
//!
//! The hash is deterministic for identical pixel content, and small visual
//! changes flip few bits, which is what makes Hamming distance a useful
//! similarity measure.

use crate::error::HashError;
use crate::index::types::Fingerprint;

/// Turns encoded image bytes into a fingerprint
pub trait Hasher: Send + Sync {
    fn hash(&self, data: &[u8]) -> Result<Fingerprint, HashError>;
}

impl<F> Hasher for F
where
    F: Fn(&[u8]) -> Result<Fingerprint, HashError> + Send + Sync,
{
    fn hash(&self, data: &[u8]) -> Result<Fingerprint, HashError> {
        self(data)
    }
}

/// 8-bit luminance image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl GrayImage {
    /// Wrap a row-major pixel buffer
    pub fn from_raw(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, HashError> {
        if width == 0 || height == 0 {
            return Err(HashError::EmptyImage);
        }
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| HashError::Decode(format!("{}x{} image is too large", width, height)))?;
        if pixels.len() != expected {
            return Err(HashError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Decode an encoded image (PNG, JPEG, GIF, BMP, WebP, TIFF or netpbm)
    /// and reduce it to luminance
    pub fn decode(data: &[u8]) -> Result<Self, HashError> {
        let luma = image::load_from_memory(data)?.to_luma8();
        let (width, height) = luma.dimensions();
        Self::from_raw(width as usize, height as usize, luma.into_raw())
    }

    /// Build an image by evaluating `f(x, y)` for every pixel
    pub fn from_fn(
        width: usize,
        height: usize,
        f: impl Fn(usize, usize) -> u8,
    ) -> Result<Self, HashError> {
        let mut pixels = Vec::with_capacity(width.saturating_mul(height));
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::from_raw(width, height, pixels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// Average each cell of a `columns` x `rows` grid laid over the image.
    ///
    /// Cells always cover at least one source pixel, so images smaller than
    /// the grid repeat pixels instead of leaving gaps.
    pub fn box_downsample(&self, columns: usize, rows: usize) -> Vec<u8> {
        let mut grid = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            let (y0, y1) = cell_span(row, rows, self.height);
            for column in 0..columns {
                let (x0, x1) = cell_span(column, columns, self.width);
                let mut sum = 0u64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += self.pixel(x, y) as u64;
                    }
                }
                let count = ((y1 - y0) * (x1 - x0)) as u64;
                grid.push((sum / count) as u8);
            }
        }
        grid
    }
}

/// Source pixel range covered by grid cell `index` of `cells`
fn cell_span(index: usize, cells: usize, size: usize) -> (usize, usize) {
    let start = (index * size / cells).min(size - 1);
    let end = ((index + 1) * size / cells).clamp(start + 1, size);
    (start, end)
}

/// Difference hash over a 9x8 luminance grid
#[derive(Debug, Clone, Copy, Default)]
pub struct DifferenceHasher;

impl DifferenceHasher {
    pub const COLUMNS: usize = 9;
    pub const ROWS: usize = 8;

    pub fn new() -> Self {
        Self
    }

    pub fn hash_image(&self, image: &GrayImage) -> Fingerprint {
        let grid = image.box_downsample(Self::COLUMNS, Self::ROWS);
        let mut hash = 0u64;
        for row in grid.chunks_exact(Self::COLUMNS) {
            for pair in row.windows(2) {
                hash <<= 1;
                if pair[0] > pair[1] {
                    hash |= 1;
                }
            }
        }
        Fingerprint(hash)
    }
}

impl Hasher for DifferenceHasher {
    /// Decode any supported image format and hash its luminance
    fn hash(&self, data: &[u8]) -> Result<Fingerprint, HashError> {
        let image = GrayImage::decode(data)?;
        Ok(self.hash_image(&image))
    }
}
