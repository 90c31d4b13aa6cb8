//! Sidebar content repository.

use std::sync::Arc;

use chrono::Utc;
use estate_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    Order, QueryFilter, QueryOrder, TransactionTrait,
};

use crate::db_err;
use crate::entities::{SidebarContent, sidebar_content};

/// Repository for sidebar content.
///
/// Writes that make a row active deactivate every other row in the same
/// transaction, so at most one row is ever active.
#[derive(Clone)]
pub struct SidebarRepository {
    db: Arc<DatabaseConnection>,
}

impl SidebarRepository {
    /// Create a new sidebar repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the active sidebar content.
    pub async fn find_active(&self) -> AppResult<Option<sidebar_content::Model>> {
        SidebarContent::find()
            .filter(sidebar_content::Column::IsActive.eq(true))
            .order_by(sidebar_content::Column::UpdatedAt, Order::Desc)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find sidebar content by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<sidebar_content::Model>> {
        SidebarContent::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Get sidebar content by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<sidebar_content::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sidebar content not found: {id}")))
    }

    /// All sidebar content, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<sidebar_content::Model>> {
        SidebarContent::find()
            .order_by(sidebar_content::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Insert sidebar content.
    pub async fn create(
        &self,
        model: sidebar_content::ActiveModel,
    ) -> AppResult<sidebar_content::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        if let Some(id) = activating_id(&model) {
            deactivate_others(&txn, &id).await?;
        }
        let created = model.insert(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(created)
    }

    /// Update sidebar content.
    pub async fn update(
        &self,
        model: sidebar_content::ActiveModel,
    ) -> AppResult<sidebar_content::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        if let Some(id) = activating_id(&model) {
            deactivate_others(&txn, &id).await?;
        }
        let updated = model.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Delete sidebar content. Returns the number of deleted rows.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = SidebarContent::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}

/// The row ID when `model` turns `is_active` on.
fn activating_id(model: &sidebar_content::ActiveModel) -> Option<String> {
    if !matches!(model.is_active, ActiveValue::Set(true)) {
        return None;
    }
    match &model.id {
        ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Some(id.clone()),
        ActiveValue::NotSet => None,
    }
}

async fn deactivate_others<C: ConnectionTrait>(conn: &C, keep_id: &str) -> AppResult<()> {
    SidebarContent::update_many()
        .col_expr(sidebar_content::Column::IsActive, Expr::value(false))
        .col_expr(sidebar_content::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(sidebar_content::Column::IsActive.eq(true))
        .filter(sidebar_content::Column::Id.ne(keep_id))
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}
