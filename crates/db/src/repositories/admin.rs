//! Admin account repository.

use std::sync::Arc;

use chrono::Utc;
use estate_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

use crate::db_err;
use crate::entities::{Admin, admin};

/// Repository for admin accounts.
#[derive(Clone)]
pub struct AdminRepository {
    db: Arc<DatabaseConnection>,
}

impl AdminRepository {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an admin by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<admin::Model>> {
        Admin::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Get an admin by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<admin::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Admin not found: {id}")))
    }

    /// Find an admin by (lowercased) email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<admin::Model>> {
        Admin::find()
            .filter(admin::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Count admin accounts.
    pub async fn count(&self) -> AppResult<u64> {
        Admin::find().count(self.db.as_ref()).await.map_err(db_err)
    }

    /// Create a new admin.
    pub async fn create(&self, model: admin::ActiveModel) -> AppResult<admin::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Record a successful login.
    pub async fn touch_last_login(&self, id: &str) -> AppResult<()> {
        Admin::update_many()
            .col_expr(admin::Column::LastLoginAt, Expr::value(Utc::now()))
            .filter(admin::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Replace the password hash.
    pub async fn update_password(&self, id: &str, password_hash: String) -> AppResult<()> {
        Admin::update_many()
            .col_expr(admin::Column::Password, Expr::value(password_hash))
            .col_expr(admin::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(admin::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    #[tokio::test]
    async fn test_find_by_email() {
        let admin = admin::Model {
            id: "a1".to_string(),
            name: "Owner".to_string(),
            email: "owner@example.com".to_string(),
            password: "$argon2id$...".to_string(),
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[admin]])
                .into_connection(),
        );

        let repo = AdminRepository::new(db);
        let found = repo.find_by_email("Owner@Example.com").await.unwrap();

        assert_eq!(found.map(|a| a.id).as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = AdminRepository::new(db);
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
