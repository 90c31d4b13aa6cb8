//! Inquiry service.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use estate_common::{AppError, AppResult, IdGenerator};
use estate_db::entities::inquiry::{self, InquiryStatus, InquiryType};
use estate_db::entities::property;
use estate_db::repositories::{InquiryFilter, InquiryRepository, PropertyRepository};
use sea_orm::{ActiveEnum, Iterable, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::analytics::AnalyticsService;
use super::email::EmailService;
use super::pagination::{Page, PageRequest};
use super::property::PropertySummary;
use super::validation::{non_empty, not_blank, validate_phone};

/// Public inquiry form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInquiryInput {
    #[serde(default)]
    pub property_id: Option<String>,
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(max = 5000), custom(function = "not_blank"))]
    pub message: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[serde(default)]
    pub inquiry_type: Option<InquiryType>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub source: Option<String>,
}

/// Admin update of an inquiry or consultation request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RespondInput {
    #[serde(default)]
    pub status: Option<InquiryStatus>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub admin_response: Option<String>,
}

impl RespondInput {
    /// Resolve the requested change. An admin response without an explicit
    /// status marks the request as responded.
    pub(crate) fn resolve(self) -> AppResult<(Option<InquiryStatus>, Option<String>)> {
        let response = non_empty(self.admin_response);
        let status = self
            .status
            .or_else(|| response.as_ref().map(|_| InquiryStatus::Responded));

        if status.is_none() && response.is_none() {
            return Err(AppError::BadRequest(
                "Either status or adminResponse is required".to_string(),
            ));
        }
        Ok((status, response))
    }
}

/// An inquiry with the listing it is about.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryView {
    #[serde(flatten)]
    pub inquiry: inquiry::Model,
    pub property: Option<PropertySummary>,
}

/// Counts per status plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusStats {
    pub total: u64,
    pub today: u64,
    pub by_status: BTreeMap<String, i64>,
}

/// Counts keyed by every status, missing statuses reported as zero.
pub(crate) fn zero_filled_counts<K>(keys: K, rows: Vec<(String, i64)>) -> BTreeMap<String, i64>
where
    K: IntoIterator<Item = String>,
{
    let mut counts: BTreeMap<String, i64> = keys.into_iter().map(|k| (k, 0)).collect();
    for (status, count) in rows {
        *counts.entry(status).or_default() += count;
    }
    counts
}

/// Service for customer inquiries.
#[derive(Clone)]
pub struct InquiryService {
    inquiry_repo: InquiryRepository,
    property_repo: PropertyRepository,
    analytics: AnalyticsService,
    email: EmailService,
    id_gen: IdGenerator,
}

impl InquiryService {
    /// Create a new inquiry service.
    #[must_use]
    pub const fn new(
        inquiry_repo: InquiryRepository,
        property_repo: PropertyRepository,
        analytics: AnalyticsService,
        email: EmailService,
    ) -> Self {
        Self {
            inquiry_repo,
            property_repo,
            analytics,
            email,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit an inquiry from the public site.
    pub async fn create(&self, input: CreateInquiryInput) -> AppResult<inquiry::Model> {
        input.validate()?;

        let property = match non_empty(input.property_id) {
            Some(property_id) => Some(self.property_repo.get_by_id(&property_id).await?),
            None => None,
        };

        let inquiry_type = input.inquiry_type.unwrap_or(if property.is_some() {
            InquiryType::Property
        } else {
            InquiryType::General
        });

        let now = Utc::now();
        let model = inquiry::ActiveModel {
            id: Set(self.id_gen.generate()),
            property_id: Set(property.as_ref().map(|p| p.id.clone())),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email.trim().to_lowercase()),
            phone: Set(input.phone.trim().to_string()),
            message: Set(input.message.trim().to_string()),
            subject: Set(non_empty(input.subject)),
            inquiry_type: Set(inquiry_type),
            source: Set(non_empty(input.source)),
            status: Set(InquiryStatus::Pending),
            admin_response: Set(None),
            responded_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self.inquiry_repo.create(model).await?;
        tracing::info!(
            inquiry_id = %created.id,
            property_id = ?created.property_id,
            "Inquiry received"
        );

        self.analytics
            .record_inquiry(property.as_ref().map(|p| p.property_type))
            .await;
        self.email
            .inquiry_received(&created, property.as_ref().map(|p| p.title.as_str()))
            .await;

        Ok(created)
    }

    async fn attach_properties(&self, inquiries: Vec<inquiry::Model>) -> AppResult<Vec<InquiryView>> {
        let mut ids: Vec<String> = inquiries
            .iter()
            .filter_map(|i| i.property_id.clone())
            .collect();
        ids.sort();
        ids.dedup();

        let properties: HashMap<String, property::Model> = self
            .property_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(inquiries
            .into_iter()
            .map(|inquiry| {
                let property = inquiry
                    .property_id
                    .as_ref()
                    .and_then(|id| properties.get(id))
                    .map(PropertySummary::from);
                InquiryView { inquiry, property }
            })
            .collect())
    }

    /// List inquiries, newest first.
    pub async fn list(&self, filter: &InquiryFilter, page: PageRequest) -> AppResult<Page<InquiryView>> {
        let (items, total) = self
            .inquiry_repo
            .search(filter, page.offset(), page.limit)
            .await?;
        let items = self.attach_properties(items).await?;
        Ok(Page::new(items, total, page))
    }

    /// Get one inquiry.
    pub async fn get(&self, id: &str) -> AppResult<InquiryView> {
        let inquiry = self.inquiry_repo.get_by_id(id).await?;
        self.attach_properties(vec![inquiry])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Inquiry not found: {id}")))
    }

    /// Change the status and/or record an admin response. A response is
    /// emailed to the customer.
    pub async fn update(&self, id: &str, input: RespondInput) -> AppResult<inquiry::Model> {
        input.validate()?;
        let (status, response) = input.resolve()?;

        let existing = self.inquiry_repo.get_by_id(id).await?;
        let now = Utc::now();
        let was_responded = existing.status == InquiryStatus::Responded;
        let mut active: inquiry::ActiveModel = existing.into();

        if let Some(status) = status {
            active.status = Set(status);
            if status == InquiryStatus::Responded && !was_responded {
                active.responded_at = Set(Some(now));
            }
        }
        if let Some(response) = &response {
            active.admin_response = Set(Some(response.clone()));
        }
        active.updated_at = Set(now);

        let updated = self.inquiry_repo.update(active).await?;
        tracing::info!(inquiry_id = %id, status = ?updated.status, "Inquiry updated");

        if response.is_some() {
            self.email.inquiry_responded(&updated).await;
        }

        Ok(updated)
    }

    /// Set the status of many inquiries. Returns the number of rows changed.
    pub async fn bulk_status(&self, ids: &[String], status: InquiryStatus) -> AppResult<u64> {
        if ids.is_empty() {
            return Err(AppError::BadRequest("inquiryIds must not be empty".to_string()));
        }
        let affected = self.inquiry_repo.update_status_many(ids, status).await?;
        tracing::info!(requested = ids.len(), affected, "Bulk inquiry status update");
        Ok(affected)
    }

    /// Delete an inquiry.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if self.inquiry_repo.delete(id).await? == 0 {
            return Err(AppError::NotFound(format!("Inquiry not found: {id}")));
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

        let total = self.inquiry_repo.count().await?;
        let today = self.inquiry_repo.count_since(start_of_day).await?;
        let rows = self.inquiry_repo.count_by_status().await?;

        Ok(StatusStats {
            total,
            today,
            by_status: zero_filled_counts(InquiryStatus::iter().map(|s| s.to_value()), rows),
        })
    }
}
