use thiserror::Error;

use moduvisor_core::catalog::CatalogError;

pub mod catalog;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use memory::InMemoryCatalog;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for CatalogError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(error) => CatalogError::Unavailable(error.to_string()),
            RepositoryError::Decode(message) => CatalogError::Decode(message),
        }
    }
}
