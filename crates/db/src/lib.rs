pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, ping, DbPool};
pub use fixtures::{demo_catalog, seed_demo_catalog, SeedResult};
pub use repositories::{InMemoryCatalog, RepositoryError, SqlCatalogRepository};
