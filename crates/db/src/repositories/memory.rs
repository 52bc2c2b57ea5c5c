use async_trait::async_trait;

use moduvisor_core::catalog::{CatalogAccessor, CatalogError};
use moduvisor_core::domain::catalog::CatalogItem;

/// Read-only catalog held in memory, for tests and `recommend --demo-catalog`.
#[derive(Default)]
pub struct InMemoryCatalog {
    items: Vec<CatalogItem>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl CatalogAccessor for InMemoryCatalog {
    async fn list_all_items(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(self.items.clone())
    }
}
