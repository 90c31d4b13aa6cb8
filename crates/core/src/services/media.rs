//! Media processing for uploaded images and videos.

use std::io::Cursor;

use bytes::Bytes;
use estate_common::config::UploadConfig;
use estate_common::{AppError, AppResult};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

/// Content type of every recompressed image.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client supplied file name.
    pub file_name: String,
    /// Client supplied MIME type.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl UploadFile {
    /// Whether the client declared this file as an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Whether the client declared this file as a video.
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.content_type.starts_with("video/")
    }
}

/// Image recompression settings.
#[derive(Debug, Clone, Copy)]
pub struct MediaConfig {
    /// Images wider than this are downscaled.
    pub max_width: u32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for MediaConfig {
    fn from(upload: &UploadConfig) -> Self {
        Self {
            max_width: upload.image_max_width.max(1),
            jpeg_quality: upload.jpeg_quality.clamp(1, 100),
        }
    }
}

/// Result of recompressing an image.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Media service for image recompression and upload checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaService {
    config: MediaConfig,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub const fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Decode an image, downscale it to the configured width (aspect ratio
    /// preserved) and re-encode it as JPEG.
    pub fn compress_image(&self, data: &[u8]) -> AppResult<ProcessedImage> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| AppError::Validation(format!("Unsupported or corrupt image: {e}")))?;

        let resized = if decoded.width() > self.config.max_width {
            let height = (u64::from(decoded.height()) * u64::from(self.config.max_width)
                / u64::from(decoded.width()))
            .max(1) as u32;
            decoded.resize_exact(self.config.max_width, height, FilterType::Lanczos3)
        } else {
            decoded
        };

        let rgb = resized.to_rgb8();
        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, self.config.jpeg_quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| AppError::Internal(format!("Failed to encode image: {e}")))?;

        Ok(ProcessedImage {
            data: out.into_inner(),
            width: rgb.width(),
            height: rgb.height(),
        })
    }

    /// Recompress on the blocking thread pool.
    pub async fn compress_image_blocking(&self, data: Bytes) -> AppResult<ProcessedImage> {
        let service = *self;
        tokio::task::spawn_blocking(move || service.compress_image(&data))
            .await
            .map_err(|e| AppError::Internal(format!("Image task failed: {e}")))?
    }

    /// Reject files that are not declared as images.
    pub fn ensure_image(file: &UploadFile) -> AppResult<()> {
        if file.is_image() {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "{} is not an image ({})",
                file.file_name, file.content_type
            )))
        }
    }

    /// Reject files that are not declared as videos.
    pub fn ensure_video(file: &UploadFile) -> AppResult<()> {
        if file.is_video() {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "{} is not a video ({})",
                file.file_name, file.content_type
            )))
        }
    }
}
