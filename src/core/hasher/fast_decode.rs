//! Fast decoding of native images (JPEG, PNG) for fingerprinting.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than image crate),
//! falls back to image crate for everything else and for JPEGs zune rejects.

use crate::error::HashError;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Native image decoder that picks the fastest path per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image from a file path using the fastest available decoder.
    pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
        if Self::is_jpeg_path(path) {
            Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path))
        } else {
            Self::decode_fallback(path)
        }
    }

    fn is_jpeg_path(path: &Path) -> bool {
        matches!(
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .as_deref(),
            Some("jpg" | "jpeg")
        )
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(path: &Path) -> Result<DynamicImage, HashError> {
        let file_bytes = fs::read(path).map_err(|e| HashError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

        let pixels = decoder.decode().map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "Failed to get image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;
        let buffer_error = || HashError::DecodeError {
            path: path.to_path_buf(),
            reason: "Decoded buffer does not match image dimensions".to_string(),
        };

        match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => RgbImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(buffer_error),
            ColorSpace::RGBA => RgbaImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(buffer_error),
            ColorSpace::Luma => GrayImage::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(buffer_error),
            // Unusual colorspace, let the image crate handle it
            _ => Self::decode_fallback(path),
        }
    }

    /// Fallback to image crate, sniffing the real format from content
    fn decode_fallback(path: &Path) -> Result<DynamicImage, HashError> {
        let reader = image::ImageReader::open(path)
            .map_err(|e| HashError::IoError {
                path: path.to_path_buf(),
                source: e,
            })?
            .with_guessed_format()
            .map_err(|e| HashError::IoError {
                path: path.to_path_buf(),
                source: e,
            })?;

        let image = reader.decode().map_err(|e| HashError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if image.width() == 0 || image.height() == 0 {
            return Err(HashError::EmptyImage {
                path: Some(path.to_path_buf()),
            });
        }

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn jpeg_extension_detection_is_case_insensitive() {
        assert!(FastDecoder::is_jpeg_path(Path::new("photo.JPG")));
        assert!(FastDecoder::is_jpeg_path(Path::new("photo.jpeg")));
        assert!(!FastDecoder::is_jpeg_path(Path::new("photo.png")));
    }

    #[test]
    fn decodes_jpeg_and_png() {
        let temp = TempDir::new().unwrap();
        let img = RgbImage::from_fn(16, 12, |x, y| image::Rgb([x as u8 * 10, y as u8 * 10, 0]));
        let jpg = temp.path().join("a.jpg");
        let png = temp.path().join("a.png");
        img.save(&jpg).unwrap();
        img.save(&png).unwrap();

        let decoded_jpg = FastDecoder::decode(&jpg).unwrap();
        let decoded_png = FastDecoder::decode(&png).unwrap();

        assert_eq!((decoded_jpg.width(), decoded_jpg.height()), (16, 12));
        assert_eq!((decoded_png.width(), decoded_png.height()), (16, 12));
    }

    #[test]
    fn png_misnamed_as_jpeg_still_decodes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("really_a_png.jpg");
        RgbImage::new(8, 8)
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        assert!(FastDecoder::decode(&path).is_ok());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("corrupt.jpg");
        fs::write(&path, b"this is not a valid image file").unwrap();

        assert!(FastDecoder::decode(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = FastDecoder::decode(Path::new("/nonexistent/photo.png"));
        assert!(matches!(result, Err(HashError::IoError { .. })));
    }
}
