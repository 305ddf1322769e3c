//! External collaborators consumed by the session core: the board catalog
//! and the session snapshot store.

pub mod catalog;
pub mod persistence;

pub use catalog::{BoardCatalog, CatalogError};
pub use persistence::{RepoError, SqliteSessionRepo};
