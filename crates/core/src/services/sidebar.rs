//! Sidebar content service.

use chrono::Utc;
use estate_common::{AppError, AppResult, IdGenerator, UploadedFile};
use estate_db::entities::sidebar_content;
use estate_db::repositories::SidebarRepository;
use sea_orm::Set;
use validator::Validate;

use super::media::{MediaService, UploadFile};
use super::upload::Uploader;
use super::validation::{non_empty, validate_phone};

/// Storage folder for sidebar images.
pub const IMAGE_FOLDER: &str = "sidebar/images";
/// Storage folder for sidebar videos.
pub const VIDEO_FOLDER: &str = "sidebar/videos";

/// Text fields of a sidebar create or update. On update `None` keeps the
/// current value.
#[derive(Debug, Clone, Default, Validate)]
pub struct SidebarInput {
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub whatsapp_number: Option<String>,
    pub is_active: Option<bool>,
}

impl SidebarInput {
    fn normalized(self) -> Self {
        Self {
            image_url: non_empty(self.image_url),
            video_url: non_empty(self.video_url),
            phone_number: non_empty(self.phone_number),
            whatsapp_number: non_empty(self.whatsapp_number),
            is_active: self.is_active,
        }
    }
}

/// Files sent with a sidebar create or update.
#[derive(Debug, Clone, Default)]
pub struct SidebarMedia {
    pub image: Option<UploadFile>,
    pub video: Option<UploadFile>,
}

#[derive(Default)]
struct Uploaded {
    image: Option<UploadedFile>,
    video: Option<UploadedFile>,
}

impl Uploaded {
    fn keys(&self) -> Vec<String> {
        self.image
            .iter()
            .chain(&self.video)
            .map(|f| f.key.clone())
            .collect()
    }
}

/// Service for the promotional sidebar.
#[derive(Clone)]
pub struct SidebarService {
    sidebar_repo: SidebarRepository,
    uploader: Uploader,
    id_gen: IdGenerator,
}

impl SidebarService {
    /// Create a new sidebar service.
    #[must_use]
    pub const fn new(sidebar_repo: SidebarRepository, uploader: Uploader) -> Self {
        Self {
            sidebar_repo,
            uploader,
            id_gen: IdGenerator::new(),
        }
    }

    /// The content currently shown on the site.
    pub async fn get_active(&self) -> AppResult<sidebar_content::Model> {
        self.sidebar_repo
            .find_active()
            .await?
            .ok_or_else(|| AppError::NotFound("No active sidebar content".to_string()))
    }

    /// All sidebar content, newest first.
    pub async fn list(&self) -> AppResult<Vec<sidebar_content::Model>> {
        self.sidebar_repo.find_all().await
    }

    /// Get sidebar content by ID.
    pub async fn get(&self, id: &str) -> AppResult<sidebar_content::Model> {
        self.sidebar_repo.get_by_id(id).await
    }

    async fn upload(&self, media: &SidebarMedia) -> AppResult<Uploaded> {
        if let Some(image) = &media.image {
            MediaService::ensure_image(image)?;
        }
        if let Some(video) = &media.video {
            MediaService::ensure_video(video)?;
        }

        let mut uploaded = Uploaded::default();
        if let Some(image) = &media.image {
            uploaded.image = Some(self.uploader.upload_image(IMAGE_FOLDER, image).await?);
        }
        if let Some(video) = &media.video {
            match self.uploader.upload_video(VIDEO_FOLDER, video).await {
                Ok(file) => uploaded.video = Some(file),
                Err(e) => {
                    self.uploader.delete_keys(uploaded.keys()).await;
                    return Err(e);
                }
            }
        }
        Ok(uploaded)
    }

    /// Create sidebar content. New content is active unless stated otherwise,
    /// which deactivates the previous active row.
    pub async fn create(
        &self,
        input: SidebarInput,
        media: SidebarMedia,
    ) -> AppResult<sidebar_content::Model> {
        input.validate()?;
        let input = input.normalized();

        let has_content = media.image.is_some()
            || media.video.is_some()
            || input.image_url.is_some()
            || input.video_url.is_some()
            || input.phone_number.is_some()
            || input.whatsapp_number.is_some();
        if !has_content {
            return Err(AppError::BadRequest(
                "Sidebar content needs an image, a video or a contact number".to_string(),
            ));
        }

        let uploaded = self.upload(&media).await?;
        let now = Utc::now();

        let model = sidebar_content::ActiveModel {
            id: Set(self.id_gen.generate()),
            image_url: Set(uploaded.image.as_ref().map(|f| f.url.clone()).or(input.image_url)),
            video_url: Set(uploaded.video.as_ref().map(|f| f.url.clone()).or(input.video_url)),
            phone_number: Set(input.phone_number),
            whatsapp_number: Set(input.whatsapp_number),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match self.sidebar_repo.create(model).await {
            Ok(created) => {
                tracing::info!(sidebar_id = %created.id, is_active = created.is_active, "Sidebar content created");
                Ok(created)
            }
            Err(e) => {
                self.uploader.delete_keys(uploaded.keys()).await;
                Err(e)
            }
        }
    }

    /// Update sidebar content. Replaced objects are deleted afterwards.
    pub async fn update(
        &self,
        id: &str,
        input: SidebarInput,
        media: SidebarMedia,
    ) -> AppResult<sidebar_content::Model> {
        input.validate()?;
        let input = input.normalized();
        let existing = self.sidebar_repo.get_by_id(id).await?;

        let uploaded = self.upload(&media).await?;

        let image_url = uploaded.image.as_ref().map(|f| f.url.clone()).or(input.image_url);
        let video_url = uploaded.video.as_ref().map(|f| f.url.clone()).or(input.video_url);

        let replaced: Vec<String> = [
            (existing.image_url.clone(), image_url.is_some()),
            (existing.video_url.clone(), video_url.is_some()),
        ]
        .into_iter()
        .filter_map(|(old, replacing)| old.filter(|_| replacing))
        .collect();

        let mut active: sidebar_content::ActiveModel = existing.into();
        if let Some(url) = image_url {
            active.image_url = Set(Some(url));
        }
        if let Some(url) = video_url {
            active.video_url = Set(Some(url));
        }
        if let Some(phone) = input.phone_number {
            active.phone_number = Set(Some(phone));
        }
        if let Some(whatsapp) = input.whatsapp_number {
            active.whatsapp_number = Set(Some(whatsapp));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = match self.sidebar_repo.update(active).await {
            Ok(updated) => updated,
            Err(e) => {
                self.uploader.delete_keys(uploaded.keys()).await;
                return Err(e);
            }
        };

        let stale: Vec<String> = replaced
            .into_iter()
            .filter(|old| Some(old) != updated.image_url.as_ref() && Some(old) != updated.video_url.as_ref())
            .collect();
        self.uploader.delete_urls(stale).await;

        tracing::info!(sidebar_id = %id, "Sidebar content updated");
        Ok(updated)
    }

    /// Flip the active flag. Activating deactivates every other row.
    pub async fn toggle(&self, id: &str) -> AppResult<sidebar_content::Model> {
        let existing = self.sidebar_repo.get_by_id(id).await?;
        let is_active = !existing.is_active;

        let mut active: sidebar_content::ActiveModel = existing.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());

        let updated = self.sidebar_repo.update(active).await?;
        tracing::info!(sidebar_id = %id, is_active, "Sidebar content toggled");
        Ok(updated)
    }

    /// Delete sidebar content and its stored objects.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let existing = self.sidebar_repo.get_by_id(id).await?;
        if self.sidebar_repo.delete(id).await? == 0 {
            return Err(AppError::NotFound(format!("Sidebar content not found: {id}")));
        }

        self.uploader
            .delete_urls(existing.image_url.into_iter().chain(existing.video_url))
            .await;
        Ok(())
    }
}
