//! Camera RAW decoding (CR2 and generic `.raw`).
//!
//! Sensor data is decoded with rawloader and developed with a 2x2
//! superpixel demosaic: every Bayer quad becomes one RGB pixel, so the
//! output is half the sensor resolution in each direction. When the
//! sensor data can't be decoded, the largest JPEG preview embedded in the
//! file is used instead.

use crate::error::ConversionError;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::decoders::FormatDecoder;

/// Display gamma applied after white balance
const GAMMA: f32 = 1.0 / 2.2;

/// Embedded previews tried before giving up
const MAX_PREVIEW_CANDIDATES: usize = 16;

const JPEG_SOI: &[u8] = b"\xff\xd8\xff";

#[derive(Debug, Default)]
pub struct RawDecoder;

impl RawDecoder {
    pub fn new() -> Self {
        Self
    }

    fn develop(path: &Path) -> Result<DynamicImage, String> {
        let loader = rawloader::RawLoader::new();
        let raw = loader
            .decode_file(path)
            .map_err(|e| format!("{:?}", e))?;

        let samples = normalize_samples(&raw.data, &raw.blacklevels, &raw.whitelevels);
        let wb = white_balance(&raw.wb_coeffs);

        let rgb = if raw.cpp == 3 {
            develop_rgb(raw.width, raw.height, &samples, &wb)
        } else {
            demosaic_superpixel(raw.width, raw.height, &samples, &wb, |row, col| {
                raw.cfa.color_at(row, col)
            })
        };

        rgb.map(DynamicImage::ImageRgb8)
            .ok_or_else(|| format!("unusable sensor geometry {}x{}", raw.width, raw.height))
    }
}

impl FormatDecoder for RawDecoder {
    fn decode(&self, path: &Path) -> Result<DynamicImage, ConversionError> {
        let reason = match Self::develop(path) {
            Ok(image) => return Ok(image),
            Err(reason) => reason,
        };

        debug!(path = %path.display(), %reason, "sensor decode failed, trying embedded preview");

        let bytes = fs::read(path).map_err(|e| ConversionError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        match largest_embedded_jpeg(&bytes) {
            Some(preview) => {
                warn!(
                    path = %path.display(),
                    width = preview.width(),
                    height = preview.height(),
                    "Using embedded preview for RAW file"
                );
                Ok(preview)
            }
            None => Err(ConversionError::Decode {
                path: path.to_path_buf(),
                reason,
            }),
        }
    }
}

/// Sensor values scaled to 0.0..=1.0 with black level removed
fn normalize_samples(
    data: &rawloader::RawImageData,
    blacklevels: &[u16; 4],
    whitelevels: &[u16; 4],
) -> Vec<f32> {
    match data {
        rawloader::RawImageData::Integer(values) => {
            let black = blacklevels[0] as f32;
            let white = (whitelevels[0] as f32).max(black + 1.0);
            let range = white - black;
            values
                .iter()
                .map(|&v| ((v as f32 - black) / range).clamp(0.0, 1.0))
                .collect()
        }
        rawloader::RawImageData::Float(values) => {
            values.iter().map(|&v| v.clamp(0.0, 1.0)).collect()
        }
    }
}

/// As-shot multipliers normalized to green; unusable coefficients become 1.0
fn white_balance(coeffs: &[f32; 4]) -> [f32; 3] {
    let usable = |v: f32| v.is_finite() && v > 0.0;
    let green = if usable(coeffs[1]) { coeffs[1] } else { 1.0 };
    let scale = |v: f32| if usable(v) { v / green } else { 1.0 };
    [scale(coeffs[0]), 1.0, scale(coeffs[2])]
}

fn to_display(linear: f32, multiplier: f32) -> u8 {
    let value = (linear * multiplier).clamp(0.0, 1.0).powf(GAMMA);
    (value * 255.0).round() as u8
}

/// Develop already-interpolated RGB sensor data
fn develop_rgb(width: usize, height: usize, samples: &[f32], wb: &[f32; 3]) -> Option<RgbImage> {
    if width == 0 || height == 0 || samples.len() < width * height * 3 {
        return None;
    }

    let mut out = RgbImage::new(width as u32, height as u32);
    for (i, pixel) in out.pixels_mut().enumerate() {
        let base = i * 3;
        for c in 0..3 {
            pixel[c] = to_display(samples[base + c], wb[c]);
        }
    }
    Some(out)
}

/// 2x2 superpixel demosaic of a Bayer mosaic.
///
/// `color_at(row, col)` returns the filter colour of a photosite:
/// 0 = red, 1 = green, 2 = blue, 3 = second green.
fn demosaic_superpixel<F>(
    width: usize,
    height: usize,
    samples: &[f32],
    wb: &[f32; 3],
    color_at: F,
) -> Option<RgbImage>
where
    F: Fn(usize, usize) -> usize,
{
    let out_w = width / 2;
    let out_h = height / 2;
    if out_w == 0 || out_h == 0 || samples.len() < width * height {
        return None;
    }

    let mut out = RgbImage::new(out_w as u32, out_h as u32);
    for y in 0..out_h {
        for x in 0..out_w {
            let mut sums = [0.0f32; 3];
            let mut counts = [0u32; 3];

            for (dy, dx) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                let row = y * 2 + dy;
                let col = x * 2 + dx;
                let channel = match color_at(row, col) {
                    0 => 0,
                    2 => 2,
                    _ => 1,
                };
                sums[channel] += samples[row * width + col];
                counts[channel] += 1;
            }

            let pixel = out.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                let linear = if counts[c] > 0 {
                    sums[c] / counts[c] as f32
                } else {
                    0.0
                };
                pixel[c] = to_display(linear, wb[c]);
            }
        }
    }
    Some(out)
}

/// Decode the largest JPEG stream found inside `buffer`
fn largest_embedded_jpeg(buffer: &[u8]) -> Option<DynamicImage> {
    let mut best: Option<DynamicImage> = None;
    let mut best_area = 0u64;

    let candidates = buffer
        .windows(JPEG_SOI.len())
        .enumerate()
        .filter(|(_, w)| *w == JPEG_SOI)
        .map(|(pos, _)| pos)
        .take(MAX_PREVIEW_CANDIDATES);

    for pos in candidates {
        let Ok(image) = image::load_from_memory_with_format(&buffer[pos..], ImageFormat::Jpeg)
        else {
            continue;
        };
        let area = image.width() as u64 * image.height() as u64;
        if area > best_area {
            best_area = area;
            best = Some(image);
        }
    }

    best
}
