//! Multipart form parsing with upload limits.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use estate_common::config::UploadConfig;
use estate_common::{AppError, AppResult};
use estate_core::UploadFile;
use serde::de::DeserializeOwned;

const BYTES_PER_MB: usize = 1024 * 1024;

/// Per-request upload limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Largest accepted single file in bytes.
    pub max_file_size: usize,
    /// Gallery images per request.
    pub max_images: usize,
    /// Videos per request.
    pub max_videos: usize,
}

impl From<&UploadConfig> for UploadLimits {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size_bytes(),
            max_images: config.max_images,
            max_videos: config.max_videos,
        }
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl UploadLimits {
    fn max_count(&self, field: &str) -> Option<usize> {
        match field {
            "images" => Some(self.max_images),
            "videos" => Some(self.max_videos),
            _ => None,
        }
    }
}

fn multipart_error(e: &MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body is too large".to_string())
    } else {
        AppError::BadRequest(format!("Invalid multipart data: {}", e.body_text()))
    }
}

/// `images[]` and `images` name the same field.
fn base_name(name: &str) -> &str {
    name.strip_suffix("[]").unwrap_or(name)
}

/// Parsed multipart form: text fields and files by field name.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<UploadFile>>,
}

impl FormData {
    /// Read a whole multipart request, enforcing the file size and count limits.
    pub async fn from_multipart(mut multipart: Multipart, limits: &UploadLimits) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(mut field) = multipart.next_field().await.map_err(|e| multipart_error(&e))? {
            let name = base_name(field.name().unwrap_or_default()).to_string();

            let Some(file_name) = field.file_name().map(ToString::to_string) else {
                let text = field.text().await.map_err(|e| multipart_error(&e))?;
                form.fields.insert(name, text);
                continue;
            };
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();

            let mut data = BytesMut::new();
            while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e))? {
                if data.len() + chunk.len() > limits.max_file_size {
                    return Err(AppError::PayloadTooLarge(format!(
                        "File '{file_name}' exceeds the maximum size of {} MB",
                        limits.max_file_size / BYTES_PER_MB
                    )));
                }
                data.extend_from_slice(&chunk);
            }

            // Browsers send an empty part for an untouched file input.
            if data.is_empty() {
                continue;
            }

            let files = form.files.entry(name.clone()).or_default();
            if let Some(max) = limits.max_count(&name)
                && files.len() >= max
            {
                return Err(AppError::BadRequest(format!(
                    "Too many files in '{name}' (maximum {max})"
                )));
            }
            files.push(UploadFile {
                file_name,
                content_type,
                data: Bytes::from(data),
            });
        }

        Ok(form)
    }

    /// Build a form directly, for tests.
    #[cfg(test)]
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }

    /// Trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && *v != "null" && *v != "undefined")
    }

    /// Owned text field.
    pub fn string(&self, name: &str) -> Option<String> {
        self.text(name).map(ToString::to_string)
    }

    /// Text field that must be present.
    pub fn required(&self, name: &str) -> AppResult<String> {
        self.string(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    /// Field parsed with `FromStr`, e.g. numbers.
    pub fn parse<T: FromStr>(&self, name: &str) -> AppResult<Option<T>> {
        self.text(name)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|_| AppError::Validation(format!("{name} has an invalid value")))
            })
            .transpose()
    }

    /// Boolean field; accepts `true/false`, `1/0`, `on/off`, `yes/no`.
    pub fn bool(&self, name: &str) -> AppResult<Option<bool>> {
        self.text(name)
            .map(|v| match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Ok(true),
                "false" | "0" | "off" | "no" => Ok(false),
                _ => Err(AppError::Validation(format!("{name} must be a boolean"))),
            })
            .transpose()
    }

    /// Field holding the serialized name of an enum variant.
    pub fn enum_value<T: DeserializeOwned>(&self, name: &str) -> AppResult<Option<T>> {
        self.text(name)
            .map(|v| {
                serde_json::from_value(serde_json::Value::String(v.to_ascii_uppercase()))
                    .map_err(|_| AppError::Validation(format!("{name} has an invalid value: {v}")))
            })
            .transpose()
    }

    /// Remove and return the first file of a field.
    pub fn take_file(&mut self, name: &str) -> Option<UploadFile> {
        self.files
            .remove(name)
            .and_then(|files| files.into_iter().next())
    }

    /// Remove and return all files of a field.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadFile> {
        self.files.remove(name).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use estate_db::entities::property::PropertyType;

    #[test]
    fn test_text_fields() {
        let form = FormData::from_fields([("title", "  Sea View  "), ("pincode", ""), ("map", "null")]);

        assert_eq!(form.text("title"), Some("Sea View"));
        assert_eq!(form.text("pincode"), None);
        assert_eq!(form.text("map"), None);
        assert!(matches!(form.required("city"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_typed_fields() {
        let form = FormData::from_fields([
            ("price", "4500000"),
            ("bedrooms", "three"),
            ("parking", "on"),
            ("gym", "maybe"),
            ("propertyType", "villa"),
        ]);

        assert_eq!(form.parse::<f64>("price").unwrap(), Some(4_500_000.0));
        assert!(form.parse::<i32>("bedrooms").is_err());
        assert_eq!(form.bool("parking").unwrap(), Some(true));
        assert!(form.bool("gym").is_err());
        assert_eq!(
            form.enum_value::<PropertyType>("propertyType").unwrap(),
            Some(PropertyType::Villa)
        );
    }

    #[test]
    fn test_limits_from_config() {
        let limits = UploadLimits::from(&UploadConfig {
            max_file_size_mb: 10,
            max_images: 20,
            max_videos: 5,
            image_max_width: 1920,
            jpeg_quality: 80,
        });

        assert_eq!(limits.max_file_size, 10 * BYTES_PER_MB);
        assert_eq!(limits.max_count("images"), Some(20));
        assert_eq!(limits.max_count("mainImage"), None);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("images[]"), "images");
        assert_eq!(base_name("videos"), "videos");
    }
}
