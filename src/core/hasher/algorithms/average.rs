//! Average Hash (aHash) implementation.
//!
//! aHash works by:
//! 1. Converting to grayscale and downsampling to grid_size x grid_size
//! 2. Computing the mean brightness of the grid
//! 3. For each cell: if brighter than the mean, set bit to 1, else 0
//!
//! Cheap and stable for re-encodes of the same picture, which is all the
//! strict-equality duplicate test needs.

use super::super::fast_resize::downsample_luma;
use super::super::traits::{Fingerprint, HashAlgorithm};
use super::super::DEFAULT_GRID_SIZE;
use crate::error::HashError;
use image::DynamicImage;

/// Average Hash (aHash) implementation
pub struct AverageHasher {
    /// Edge of the luminance grid
    grid_size: u32,
}

impl AverageHasher {
    /// Create a new aHash hasher
    pub fn new(grid_size: u32) -> Self {
        Self { grid_size }
    }
}

impl Default for AverageHasher {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}

impl HashAlgorithm for AverageHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        if self.grid_size == 0 {
            return Err(HashError::ComputationFailed(
                "grid size must be greater than zero".to_string(),
            ));
        }

        let gray = downsample_luma(image, self.grid_size, self.grid_size)?;

        let cells = (self.grid_size * self.grid_size) as usize;
        let total: u64 = gray.pixels().map(|p| p[0] as u64).sum();
        let mean = total as f64 / cells as f64;

        let mut bytes = Vec::with_capacity(cells.div_ceil(8));
        let mut current_byte: u8 = 0;
        let mut bit_position = 0;

        for pixel in gray.pixels() {
            if pixel[0] as f64 > mean {
                current_byte |= 1 << (7 - bit_position);
            }

            bit_position += 1;

            if bit_position == 8 {
                bytes.push(current_byte);
                current_byte = 0;
                bit_position = 0;
            }
        }

        if bit_position > 0 {
            bytes.push(current_byte);
        }

        Ok(Fingerprint::from_bytes(bytes))
    }
}
