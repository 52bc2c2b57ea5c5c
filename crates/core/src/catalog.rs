//! Read-only access to the module catalog.
//!
//! The catalog store is owned elsewhere; the recommendation pipeline only ever
//! takes a full snapshot per request and reads from it.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::{CatalogItem, ItemId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog store unavailable: {0}")]
    Unavailable(String),
    #[error("catalog record could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CatalogAccessor: Send + Sync {
    async fn list_all_items(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}

/// Id-indexed view over one `list_all_items` call.
#[derive(Clone, Debug, Default)]
pub struct CatalogSnapshot {
    items: Vec<CatalogItem>,
    index: HashMap<ItemId, usize>,
}

impl CatalogSnapshot {
    /// Builds the snapshot; when the store returns an id twice the first record wins.
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        let mut kept = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());

        for item in items {
            if index.contains_key(&item.id) {
                continue;
            }
            index.insert(item.id, kept.len());
            kept.push(item);
        }

        Self { items: kept, index }
    }

    pub fn get(&self, id: ItemId) -> Option<&CatalogItem> {
        self.index.get(&id).and_then(|position| self.items.get(*position))
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::CatalogSnapshot;
    use crate::domain::catalog::{CatalogItem, ItemId};

    fn item(id: i64, name: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId(id),
            name: name.to_string(),
            description: String::new(),
            category: "CRM".to_string(),
            key_features: Vec::new(),
            benefits: String::new(),
        }
    }

    #[test]
    fn first_record_wins_on_duplicate_ids() {
        let snapshot = CatalogSnapshot::from_items(vec![
            item(1, "Customer CRM"),
            item(2, "Lead Pipeline"),
            item(1, "Stale copy"),
        ]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(ItemId(1)).map(|item| item.name.as_str()), Some("Customer CRM"));
        assert!(snapshot.contains(ItemId(2)));
        assert!(!snapshot.contains(ItemId(3)));
        let ids = snapshot.items().iter().map(|item| item.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![ItemId(1), ItemId(2)]);
    }
}
