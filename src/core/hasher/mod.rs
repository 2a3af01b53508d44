//! # Hasher Module
//!
//! Computes perceptual fingerprints and tracks which ones a run has seen.
//!
//! ## How It Works
//! 1. Convert to grayscale
//! 2. Downsample to a coarse grid (8x8 by default)
//! 3. One bit per cell: brighter than the grid mean or not
//!
//! Two images are suspect duplicates only when their fingerprints are
//! equal. There is no distance threshold.
//!
//! ## Performance Optimizations
//! - Uses `zune-jpeg` for 1.5-2x faster JPEG decoding
//! - Uses `fast_image_resize` for SIMD-accelerated downsampling
//!
//! ## Example
//! ```rust,ignore
//! use media_sorter::core::hasher::fast_decode::FastDecoder;
//! use media_sorter::core::hasher::{AverageHasher, HashAlgorithm, SeenFingerprints};
//!
//! let hasher = AverageHasher::default();
//! let mut seen = SeenFingerprints::new();
//! let image = FastDecoder::decode(&path)?;
//! let fp = hasher.hash_image(&image)?;
//! if !seen.is_duplicate(&fp) {
//!     seen.record(fp);
//! }
//! ```

mod algorithms;
pub mod fast_decode;
pub mod fast_resize;
mod seen;
mod traits;

pub use algorithms::AverageHasher;
pub use seen::SeenFingerprints;
pub use traits::{Fingerprint, HashAlgorithm};

use crate::error::HashError;
use image::DynamicImage;

/// Default grid edge: 8x8 cells, 64-bit fingerprints
pub const DEFAULT_GRID_SIZE: u32 = 8;

/// Fingerprint an already-decoded image with the default hasher
pub fn fingerprint(image: &DynamicImage) -> Result<Fingerprint, HashError> {
    AverageHasher::default().hash_image(image)
}
