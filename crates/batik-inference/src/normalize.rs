//! Image bytes to classifier input tensor.
//!
//! Decodes any supported format, cover-crops to a square of
//! [`defaults::IMAGE_SIZE`], drops alpha, and scales channels to `[0, 1]`.

use image::imageops::FilterType;
use tracing::debug;

use batik_core::{defaults, Error, ImageTensor, Result};

const DECODE_FAILED: &str = "Failed to process image";

/// Decode and normalize `data` into a `size x size x 3` tensor.
pub fn normalize_image(data: &[u8], size: u32) -> Result<ImageTensor> {
    if data.is_empty() || size == 0 {
        return Err(Error::InvalidInput(DECODE_FAILED.to_string()));
    }

    let decoded = image::load_from_memory(data).map_err(|e| {
        debug!(subsystem = "inference", component = "normalize", error = %e, "Image decode failed");
        Error::InvalidInput(DECODE_FAILED.to_string())
    })?;

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(Error::InvalidInput(DECODE_FAILED.to_string()));
    }

    let rgb = decoded
        .resize_to_fill(size, size, FilterType::Triangle)
        .to_rgb8();

    let data: Vec<f32> = rgb
        .as_raw()
        .iter()
        .map(|&channel| f32::from(channel) / 255.0)
        .collect();

    Ok(ImageTensor {
        width: rgb.width(),
        height: rgb.height(),
        channels: defaults::IMAGE_CHANNELS,
        data,
    })
}

/// [`normalize_image`] on the blocking pool at the default input size.
pub async fn normalize(data: Vec<u8>) -> Result<ImageTensor> {
    tokio::task::spawn_blocking(move || normalize_image(&data, defaults::IMAGE_SIZE))
        .await
        .map_err(|e| Error::Internal(format!("normalize task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_normalize_shape_and_range() {
        let img = RgbaImage::from_pixel(640, 480, Rgba([255, 0, 128, 10]));
        let tensor = normalize_image(&encode_png(DynamicImage::ImageRgba8(img)), 224).unwrap();

        assert_eq!(tensor.width, 224);
        assert_eq!(tensor.height, 224);
        assert_eq!(tensor.channels, 3);
        assert_eq!(tensor.data.len(), 224 * 224 * 3);
        assert!(tensor.data.iter().all(|v| (0.0..=1.0).contains(v)));
        // Alpha dropped, solid colour preserved
        assert!((tensor.data[0] - 1.0).abs() < 1e-6);
        assert!(tensor.data[1].abs() < 1e-6);
    }

    #[test]
    fn test_normalize_grayscale_expands_to_rgb() {
        let img = DynamicImage::new_luma8(50, 80);
        let tensor = normalize_image(&encode_png(img), 32).unwrap();
        assert_eq!(tensor.data.len(), 32 * 32 * 3);
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let err = normalize_image(b"definitely not an image", 224).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m == DECODE_FAILED));
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(matches!(
            normalize_image(&[], 224),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_normalize_async_default_size() {
        let img = DynamicImage::new_rgb8(10, 10);
        let tensor = normalize(encode_png(img)).await.unwrap();
        assert_eq!(tensor.width, defaults::IMAGE_SIZE);
    }
}
