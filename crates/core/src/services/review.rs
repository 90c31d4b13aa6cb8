//! Property review service.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use estate_common::{AppError, AppResult, IdGenerator};
use estate_db::entities::property;
use estate_db::entities::property_review::{self, ReviewStatus};
use estate_db::repositories::{PropertyRepository, RatingSummary, ReviewFilter, ReviewRepository};
use sea_orm::{ActiveEnum, Iterable, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::email::EmailService;
use super::inquiry::zero_filled_counts;
use super::pagination::{Page, PageRequest};
use super::property::PropertySummary;
use super::validation::{non_empty, not_blank, validate_phone};

/// Public review form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    #[validate(custom(function = "not_blank"))]
    pub property_id: String,
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub reviewer_name: String,
    #[validate(email)]
    pub reviewer_email: String,
    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    pub reviewer_phone: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000), custom(function = "not_blank"))]
    pub comment: String,
}

/// Moderation decision on a review.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatusInput {
    pub status: ReviewStatus,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub admin_response: Option<String>,
}

/// A review with the listing it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: property_review::Model,
    pub property: Option<PropertySummary>,
}

/// A review as shown on the public site. Reviewer contact details stay private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicReview {
    pub id: String,
    pub reviewer_name: String,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: String,
    pub admin_response: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<property_review::Model> for PublicReview {
    fn from(review: property_review::Model) -> Self {
        Self {
            id: review.id,
            reviewer_name: review.reviewer_name,
            rating: review.rating,
            title: review.title,
            comment: review.comment,
            admin_response: review.admin_response,
            created_at: review.created_at,
        }
    }
}

/// Approved reviews of a listing with their rating summary.
#[derive(Debug, Clone)]
pub struct PropertyReviews {
    pub reviews: Page<PublicReview>,
    pub summary: RatingSummary,
}

/// Review counts per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
}

/// Service for property reviews.
#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    property_repo: PropertyRepository,
    email: EmailService,
    id_gen: IdGenerator,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub const fn new(
        review_repo: ReviewRepository,
        property_repo: PropertyRepository,
        email: EmailService,
    ) -> Self {
        Self {
            review_repo,
            property_repo,
            email,
            id_gen: IdGenerator::new(),
        }
    }

    async fn active_property(&self, property_id: &str) -> AppResult<property::Model> {
        self.property_repo
            .find_by_id(property_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Property not found: {property_id}")))
    }

    /// Submit a review. It stays hidden until approved.
    pub async fn create(&self, input: CreateReviewInput) -> AppResult<property_review::Model> {
        input.validate()?;
        let property = self.active_property(input.property_id.trim()).await?;

        let now = Utc::now();
        let model = property_review::ActiveModel {
            id: Set(self.id_gen.generate()),
            property_id: Set(property.id.clone()),
            reviewer_name: Set(input.reviewer_name.trim().to_string()),
            reviewer_email: Set(input.reviewer_email.trim().to_lowercase()),
            reviewer_phone: Set(non_empty(input.reviewer_phone)),
            rating: Set(input.rating),
            title: Set(non_empty(input.title)),
            comment: Set(input.comment.trim().to_string()),
            status: Set(ReviewStatus::Pending),
            admin_response: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self.review_repo.create(model).await?;
        tracing::info!(
            review_id = %created.id,
            property_id = %created.property_id,
            rating = created.rating,
            "Review submitted"
        );

        self.email.review_received(&created, &property.title).await;

        Ok(created)
    }

    /// Approved reviews of an active listing, newest first.
    pub async fn list_for_property(
        &self,
        property_id: &str,
        page: PageRequest,
    ) -> AppResult<PropertyReviews> {
        let property = self.active_property(property_id).await?;

        let filter = ReviewFilter {
            status: Some(ReviewStatus::Approved),
            property_id: Some(property.id.clone()),
        };
        let (items, total) = self
            .review_repo
            .search(&filter, page.offset(), page.limit)
            .await?;
        let summary = self.review_repo.rating_summary(&property.id).await?;

        Ok(PropertyReviews {
            reviews: Page::new(items, total, page).map(PublicReview::from),
            summary,
        })
    }

    /// All reviews for moderation.
    pub async fn list(&self, filter: &ReviewFilter, page: PageRequest) -> AppResult<Page<ReviewView>> {
        let (items, total) = self
            .review_repo
            .search(filter, page.offset(), page.limit)
            .await?;

        let mut ids: Vec<String> = items.iter().map(|r| r.property_id.clone()).collect();
        ids.sort();
        ids.dedup();
        let properties: HashMap<String, property::Model> = self
            .property_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let views = items
            .into_iter()
            .map(|review| {
                let property = properties.get(&review.property_id).map(PropertySummary::from);
                ReviewView { review, property }
            })
            .collect();

        Ok(Page::new(views, total, page))
    }

    /// Approve or reject a review, optionally with a public response.
    pub async fn update_status(
        &self,
        id: &str,
        input: ReviewStatusInput,
    ) -> AppResult<property_review::Model> {
        input.validate()?;

        let existing = self.review_repo.get_by_id(id).await?;
        let mut active: property_review::ActiveModel = existing.into();
        active.status = Set(input.status);
        if let Some(response) = non_empty(input.admin_response) {
            active.admin_response = Set(Some(response));
        }
        active.updated_at = Set(Utc::now());

        let updated = self.review_repo.update(active).await?;
        tracing::info!(review_id = %id, status = ?updated.status, "Review moderated");
        Ok(updated)
    }

    /// Set the status of many reviews. Returns the number of rows changed.
    pub async fn bulk_status(&self, ids: &[String], status: ReviewStatus) -> AppResult<u64> {
        if ids.is_empty() {
            return Err(AppError::BadRequest("reviewIds must not be empty".to_string()));
        }
        self.review_repo.update_status_many(ids, status).await
    }

    /// Delete a review.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if self.review_repo.delete(id).await? == 0 {
            return Err(AppError::NotFound(format!("Review not found: {id}")));
        }
        Ok(())
    }

    /// Counts per status.
    pub async fn stats(&self) -> AppResult<ReviewStats> {
        let rows = self.review_repo.count_by_status().await?;
        let by_status = zero_filled_counts(ReviewStatus::iter().map(|s| s.to_value()), rows);
        Ok(ReviewStats {
            total: by_status.values().sum(),
            by_status,
        })
    }
}
