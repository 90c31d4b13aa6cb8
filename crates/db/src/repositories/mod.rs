//! Repositories for database access.

pub mod admin;
pub mod analytics;
pub mod expertise;
pub mod inquiry;
pub mod property;
pub mod review;
pub mod sidebar;

pub use admin::AdminRepository;
pub use analytics::{AnalyticsRepository, AnalyticsTotals};
pub use expertise::{ExpertiseFilter, ExpertiseRepository};
pub use inquiry::{InquiryFilter, InquiryRepository};
pub use property::{
    Amenity, PropertyFilter, PropertyRepository, PropertySortField, PropertyTypeStats, SortOrder,
};
pub use review::{RatingSummary, ReviewFilter, ReviewRepository};
pub use sidebar::SidebarRepository;

use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};

/// Build a `LIKE` pattern matching `term` anywhere, with wildcards in the
/// term itself escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Case-insensitive "contains" match over several text columns.
pub(crate) fn search_any<C>(columns: &[C], term: &str) -> Condition
where
    C: ColumnTrait,
{
    let pattern = contains_pattern(term);
    columns.iter().fold(Condition::any(), |cond, col| {
        let lowered: SimpleExpr = Func::lower(Expr::col(*col)).into();
        cond.add(Expr::expr(lowered).like(pattern.clone()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(" Sea View "), "%sea view%");
        assert_eq!(contains_pattern("100%_off"), "%100\\%\\_off%");
    }
}
