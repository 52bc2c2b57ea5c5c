use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use moduvisor_core::catalog::{CatalogAccessor, CatalogError};
use moduvisor_core::domain::catalog::{
    normalize_category, normalize_key_features, CatalogItem, ItemId,
};
use moduvisor_core::domain::profile::IndustryLabel;

use super::RepositoryError;
use crate::DbPool;

/// Reads the module catalog from `catalog_module`. Inactive rows are never
/// offered for recommendation.
pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_active(&self) -> Result<Vec<CatalogItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, description, category, key_features, benefits
             FROM catalog_module
             WHERE active = 1
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(row_to_item).collect::<Result<Vec<_>, _>>()?;
        debug!(event_name = "db.catalog.listed", items = items.len(), "catalog rows loaded");
        Ok(items)
    }

    /// Inserts or replaces a module. `key_features` is stored newline-delimited.
    pub async fn upsert(&self, item: &CatalogItem, active: bool) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO catalog_module (id, name, description, category, key_features,
                                         benefits, active, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 category = excluded.category,
                 key_features = excluded.key_features,
                 benefits = excluded.benefits,
                 active = excluded.active,
                 updated_at = excluded.updated_at",
        )
        .bind(item.id.0)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(item.key_features.join("\n"))
        .bind(&item.benefits)
        .bind(i64::from(active))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM catalog_module WHERE active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn upsert_industry(&self, id: i64, label: IndustryLabel) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO industry (id, name, slug) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, slug = excluded.slug",
        )
        .bind(id)
        .bind(industry_display_name(label))
        .bind(label.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn list_industry_slugs(&self) -> Result<Vec<String>, RepositoryError> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM industry ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }
}

#[async_trait]
impl CatalogAccessor for SqlCatalogRepository {
    async fn list_all_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        self.list_active().await.map_err(CatalogError::from)
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<CatalogItem, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: String =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let key_features: String =
        row.try_get("key_features").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let benefits: String =
        row.try_get("benefits").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(CatalogItem {
        id: ItemId(id),
        name: name.trim().to_string(),
        description: description.trim().to_string(),
        category: normalize_category(&category),
        key_features: normalize_key_features(&key_features),
        benefits,
    })
}

fn industry_display_name(label: IndustryLabel) -> String {
    label
        .as_str()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use moduvisor_core::catalog::CatalogAccessor;
    use moduvisor_core::domain::catalog::{CatalogItem, ItemId};
    use moduvisor_core::domain::profile::IndustryLabel;

    use super::{industry_display_name, SqlCatalogRepository};
    use crate::{connect_with_settings, migrations::run_pending};

    async fn repository() -> SqlCatalogRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");
        SqlCatalogRepository::new(pool)
    }

    fn item(id: i64, name: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId(id),
            name: name.to_string(),
            description: "Scan to pay".to_string(),
            category: "payments".to_string(),
            key_features: vec!["All banks".to_string(), "Instant settlement".to_string()],
            benefits: "**Faster** checkout".to_string(),
        }
    }

    #[tokio::test]
    async fn lists_active_rows_with_normalized_fields() {
        let repo = repository().await;
        repo.upsert(&item(3, "QRIS Payment Gateway"), true).await.expect("upsert 3");
        repo.upsert(&item(4, "Retired Wallet"), false).await.expect("upsert 4");

        let items = repo.list_all_items().await.expect("list");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, ItemId(3));
        assert_eq!(items[0].category, "PAYMENTS");
        assert_eq!(items[0].key_features, vec!["All banks", "Instant settlement"]);
        assert_eq!(repo.count_active().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn delimited_key_features_are_split() {
        let repo = repository().await;
        sqlx::query(
            "INSERT INTO catalog_module (id, name, description, category, key_features, benefits, active, updated_at)
             VALUES (9, 'Customer CRM', '', 'crm', 'Contacts, Notes, Reminders', '', 1, '2024-01-01T00:00:00Z')",
        )
        .execute(&repo.pool)
        .await
        .expect("insert raw row");

        let items = repo.list_active().await.expect("list");
        assert_eq!(items[0].key_features, vec!["Contacts", "Notes", "Reminders"]);
    }

    #[tokio::test]
    async fn industries_round_trip_by_slug() {
        let repo = repository().await;
        repo.upsert_industry(1, IndustryLabel::RealEstate).await.expect("upsert industry");

        assert_eq!(repo.list_industry_slugs().await.expect("slugs"), vec!["real_estate"]);
        assert_eq!(industry_display_name(IndustryLabel::RealEstate), "Real Estate");
    }
}
