//! Thumbnail derivation pipeline.
//!
//! Turns an artwork location (remote URL or local path) into a small JPEG
//! thumbnail: fetch via the injected [`MediaFetcher`], decode, shrink into a
//! fixed bounding box preserving aspect ratio, re-encode at a fixed quality.
//!
//! The pipeline never surfaces an error to its caller: any fetch or decode
//! failure is logged and yields `None`, and an item without a thumbnail is a
//! perfectly valid item. Decoding and resizing run on the blocking thread
//! pool so workers and the caller's context stay responsive.

use bridge_traits::MediaFetcher;
use bytes::Bytes;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView};
use lru::LruCache;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Bounding box edge for derived thumbnails, in pixels.
pub const THUMBNAIL_MAX_EDGE: u32 = 76;

/// Default JPEG re-encode quality.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 80;

/// Thumbnail pipeline configuration.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailConfig {
    /// Longest edge of the derived thumbnail.
    pub max_edge: u32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Entries kept in the in-memory location cache.
    pub cache_entries: usize,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_edge: THUMBNAIL_MAX_EDGE,
            jpeg_quality: THUMBNAIL_JPEG_QUALITY,
            cache_entries: 64,
        }
    }
}

impl ThumbnailConfig {
    pub fn with_max_edge(mut self, max_edge: u32) -> Self {
        self.max_edge = max_edge.max(1);
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_cache_entries(mut self, entries: usize) -> Self {
        self.cache_entries = entries.max(1);
        self
    }
}

/// Artwork-to-thumbnail service with an LRU cache keyed by location.
pub struct ThumbnailService {
    fetcher: Arc<dyn MediaFetcher>,
    config: ThumbnailConfig,
    cache: Mutex<LruCache<String, Bytes>>,
}

impl ThumbnailService {
    pub fn new(fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self::with_config(fetcher, ThumbnailConfig::default())
    }

    pub fn with_config(fetcher: Arc<dyn MediaFetcher>, config: ThumbnailConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            fetcher,
            config,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Derive the thumbnail for `location`, or `None` on any failure.
    pub async fn resolve(&self, location: &str) -> Option<Bytes> {
        if let Some(hit) = self.cache.lock().await.get(location).cloned() {
            debug!(location, "thumbnail cache hit");
            return Some(hit);
        }

        let raw = match self.fetcher.fetch(location).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(location, error = %e, "artwork fetch failed");
                return None;
            }
        };

        let config = self.config;
        let owned_location = location.to_string();
        let derived = tokio::task::spawn_blocking(move || derive(&owned_location, &raw, config))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "thumbnail task panicked");
                None
            })?;

        self.cache
            .lock()
            .await
            .put(location.to_string(), derived.clone());
        Some(derived)
    }
}

fn derive(location: &str, raw: &[u8], config: ThumbnailConfig) -> Option<Bytes> {
    let decoded = match image::load_from_memory(raw) {
        Ok(img) => img,
        Err(e) => {
            warn!(location, error = %e, "artwork decode failed");
            return None;
        }
    };

    let (width, height) = decoded.dimensions();
    let resized = if width <= config.max_edge && height <= config.max_edge {
        decoded
    } else {
        decoded.resize(config.max_edge, config.max_edge, FilterType::Lanczos3)
    };

    // JPEG cannot carry alpha.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, config.jpeg_quality);
    if let Err(e) = rgb.write_with_encoder(encoder) {
        warn!(location, error = %e, "thumbnail encode failed");
        return None;
    }

    debug!(
        location,
        source_width = width,
        source_height = height,
        bytes = out.get_ref().len(),
        "thumbnail derived"
    );
    Some(Bytes::from(out.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([120, 40, 200, 255]),
        ));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        Bytes::from(cursor.into_inner())
    }

    #[test]
    fn test_derive_fits_bounding_box_preserving_aspect() {
        let raw = png_bytes(200, 100);
        let thumb = derive("mem", &raw, ThumbnailConfig::default()).unwrap();

        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (76, 38));
        assert_eq!(
            image::guess_format(&thumb).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_derive_keeps_small_images_unscaled() {
        let raw = png_bytes(40, 30);
        let thumb = derive("mem", &raw, ThumbnailConfig::default()).unwrap();
        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
    }

    #[test]
    fn test_derive_rejects_non_image_bytes() {
        assert!(derive("mem", b"definitely not an image", ThumbnailConfig::default()).is_none());
    }

    #[test]
    fn test_config_clamps() {
        let config = ThumbnailConfig::default()
            .with_jpeg_quality(0)
            .with_max_edge(0)
            .with_cache_entries(0);
        assert_eq!(config.jpeg_quality, 1);
        assert_eq!(config.max_edge, 1);
        assert_eq!(config.cache_entries, 1);
    }
}
