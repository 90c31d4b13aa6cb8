//! Consultation ("expertise") request service.

use chrono::Utc;
use estate_common::{AppError, AppResult, IdGenerator};
use estate_db::entities::expertise_inquiry;
use estate_db::entities::inquiry::InquiryStatus;
use estate_db::repositories::{ExpertiseFilter, ExpertiseRepository};
use sea_orm::{ActiveEnum, Iterable, Set};
use serde::Deserialize;
use validator::Validate;

use super::email::EmailService;
use super::inquiry::{RespondInput, StatusStats, zero_filled_counts};
use super::pagination::{Page, PageRequest};
use super::validation::{non_empty, not_blank, validate_phone};

/// Public consultation request form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpertiseInput {
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub full_name: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub preferred_time_slot: Option<String>,
    #[validate(length(max = 50), custom(function = "not_blank"))]
    pub consultation_type: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub service_type: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub message: Option<String>,
}

/// Service for consultation requests.
#[derive(Clone)]
pub struct ExpertiseService {
    expertise_repo: ExpertiseRepository,
    email: EmailService,
    id_gen: IdGenerator,
}

impl ExpertiseService {
    /// Create a new expertise service.
    #[must_use]
    pub const fn new(expertise_repo: ExpertiseRepository, email: EmailService) -> Self {
        Self {
            expertise_repo,
            email,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a consultation request.
    pub async fn create(&self, input: CreateExpertiseInput) -> AppResult<expertise_inquiry::Model> {
        input.validate()?;

        let now = Utc::now();
        let model = expertise_inquiry::ActiveModel {
            id: Set(self.id_gen.generate()),
            full_name: Set(input.full_name.trim().to_string()),
            phone: Set(input.phone.trim().to_string()),
            email: Set(input.email.trim().to_lowercase()),
            preferred_time_slot: Set(non_empty(input.preferred_time_slot)),
            consultation_type: Set(input.consultation_type.trim().to_string()),
            service_type: Set(non_empty(input.service_type)),
            message: Set(non_empty(input.message)),
            status: Set(InquiryStatus::Pending),
            admin_response: Set(None),
            responded_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self.expertise_repo.create(model).await?;
        tracing::info!(
            request_id = %created.id,
            consultation_type = %created.consultation_type,
            "Consultation request received"
        );

        self.email.expertise_received(&created).await;

        Ok(created)
    }

    /// List requests, newest first.
    pub async fn list(
        &self,
        filter: &ExpertiseFilter,
        page: PageRequest,
    ) -> AppResult<Page<expertise_inquiry::Model>> {
        let (items, total) = self
            .expertise_repo
            .search(filter, page.offset(), page.limit)
            .await?;
        Ok(Page::new(items, total, page))
    }

    /// Get one request.
    pub async fn get(&self, id: &str) -> AppResult<expertise_inquiry::Model> {
        self.expertise_repo.get_by_id(id).await
    }

    /// Change the status and/or record an admin response.
    pub async fn update(
        &self,
        id: &str,
        input: RespondInput,
    ) -> AppResult<expertise_inquiry::Model> {
        input.validate()?;
        let (status, response) = input.resolve()?;

        let existing = self.expertise_repo.get_by_id(id).await?;
        let now = Utc::now();
        let was_responded = existing.status == InquiryStatus::Responded;
        let mut active: expertise_inquiry::ActiveModel = existing.into();

        if let Some(status) = status {
            active.status = Set(status);
            if status == InquiryStatus::Responded && !was_responded {
                active.responded_at = Set(Some(now));
            }
        }
        if let Some(response) = response {
            active.admin_response = Set(Some(response));
        }
        active.updated_at = Set(now);

        let updated = self.expertise_repo.update(active).await?;
        tracing::info!(request_id = %id, status = ?updated.status, "Consultation request updated");
        Ok(updated)
    }

    /// Delete a request.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if self.expertise_repo.delete(id).await? == 0 {
            return Err(AppError::NotFound(format!(
                "Consultation request not found: {id}"
            )));
        }
        Ok(())
    }

    /// Counts per status, total and today's count.
    pub async fn stats(&self) -> AppResult<StatusStats> {
        let start_of_day = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .ok_or_else(|| AppError::Internal("Invalid start of day".to_string()))?;

        let total = self.expertise_repo.count().await?;
        let today = self.expertise_repo.count_since(start_of_day).await?;
        let rows = self.expertise_repo.count_by_status().await?;

        Ok(StatusStats {
            total,
            today,
            by_status: zero_filled_counts(InquiryStatus::iter().map(|s| s.to_value()), rows),
        })
    }
}
