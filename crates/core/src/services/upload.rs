//! Storage uploads for listing and sidebar media.

use estate_common::{AppResult, SharedStorage, UploadedFile, generate_storage_key};
use futures::future::join_all;

use super::media::{JPEG_CONTENT_TYPE, MediaService, UploadFile};

/// Uploads files to the storage backend, recompressing images on the way.
#[derive(Clone)]
pub struct Uploader {
    storage: SharedStorage,
    media: MediaService,
}

impl Uploader {
    /// Create a new uploader.
    #[must_use]
    pub const fn new(storage: SharedStorage, media: MediaService) -> Self {
        Self { storage, media }
    }

    /// Recompress an image to JPEG and store it under `folder`.
    pub async fn upload_image(&self, folder: &str, file: &UploadFile) -> AppResult<UploadedFile> {
        MediaService::ensure_image(file)?;
        let processed = self.media.compress_image_blocking(file.data.clone()).await?;
        let key = generate_storage_key(folder, "image.jpg");

        tracing::debug!(
            key = %key,
            original_size = file.data.len(),
            compressed_size = processed.data.len(),
            width = processed.width,
            height = processed.height,
            "Uploading image"
        );

        self.storage
            .upload(&key, &processed.data, JPEG_CONTENT_TYPE)
            .await
    }

    /// Store a video as-is under `folder`.
    pub async fn upload_video(&self, folder: &str, file: &UploadFile) -> AppResult<UploadedFile> {
        MediaService::ensure_video(file)?;
        let key = generate_storage_key(folder, &file.file_name);

        tracing::debug!(key = %key, size = file.data.len(), "Uploading video");

        self.storage
            .upload(&key, &file.data, &file.content_type)
            .await
    }

    /// Upload images concurrently. If any upload fails, the successful ones
    /// are deleted and the first error is returned.
    pub async fn upload_images(
        &self,
        folder: &str,
        files: &[UploadFile],
    ) -> AppResult<Vec<UploadedFile>> {
        let results = join_all(files.iter().map(|f| self.upload_image(folder, f))).await;
        self.collect_or_rollback(results).await
    }

    /// Upload videos concurrently, with the same rollback as images.
    pub async fn upload_videos(
        &self,
        folder: &str,
        files: &[UploadFile],
    ) -> AppResult<Vec<UploadedFile>> {
        let results = join_all(files.iter().map(|f| self.upload_video(folder, f))).await;
        self.collect_or_rollback(results).await
    }

    async fn collect_or_rollback(
        &self,
        results: Vec<AppResult<UploadedFile>>,
    ) -> AppResult<Vec<UploadedFile>> {
        let mut uploaded = Vec::with_capacity(results.len());
        let mut first_error = None;

        for result in results {
            match result {
                Ok(file) => uploaded.push(file),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => tracing::debug!(error = %e, "Additional upload failure"),
            }
        }

        match first_error {
            None => Ok(uploaded),
            Some(e) => {
                self.delete_keys(uploaded.into_iter().map(|f| f.key)).await;
                Err(e)
            }
        }
    }

    /// Delete objects by key. Failures are logged.
    pub async fn delete_keys<I>(&self, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        let keys: Vec<String> = keys.into_iter().collect();
        if keys.is_empty() {
            return;
        }

        let results = join_all(keys.iter().map(|key| self.storage.delete(key))).await;
        for (key, result) in keys.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(key = %key, error = %e, "Failed to delete object from storage");
            }
        }
    }

    /// Delete objects by their public URL. URLs this backend did not issue
    /// are skipped.
    pub async fn delete_urls<I, S>(&self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = urls
            .into_iter()
            .filter_map(|url| {
                let key = self.storage.key_for_url(url.as_ref());
                if key.is_none() {
                    tracing::debug!(url = %url.as_ref(), "Skipping delete of foreign URL");
                }
                key
            })
            .collect::<Vec<_>>();

        self.delete_keys(keys).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use estate_common::{AppError, AppResult, StorageBackend, UploadedFile};

    /// In-memory storage that records calls and can fail on demand.
    #[derive(Default)]
    pub struct RecordingStorage {
        pub uploaded: Mutex<Vec<String>>,
        pub deleted: Mutex<Vec<String>>,
        /// Uploads whose key contains this marker fail.
        pub fail_marker: Option<String>,
    }

    impl RecordingStorage {
        pub fn shared() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn deleted(&self) -> Vec<String> {
            let mut keys = self.deleted.lock().unwrap().clone();
            keys.sort();
            keys
        }
    }

    #[async_trait::async_trait]
    impl StorageBackend for RecordingStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<UploadedFile> {
            if self
                .fail_marker
                .as_deref()
                .is_some_and(|marker| key.contains(marker))
            {
                return Err(AppError::Storage(format!("upload of {key} refused")));
            }
            self.uploaded.lock().unwrap().push(key.to_string());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://cdn.test/{key}")
        }

        fn key_for_url(&self, url: &str) -> Option<String> {
            url.strip_prefix("https://cdn.test/").map(str::to_string)
        }
    }
}
