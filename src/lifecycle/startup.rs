//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The store is built before the listener binds

use crate::books::BookService;
use crate::config::ServiceConfig;
use crate::observability::metrics;
use crate::store::{default_books, load_seed, BookStore, StoreError};

/// Build the catalogue service from the configured seed.
pub fn build_service(config: &ServiceConfig) -> Result<BookService, StoreError> {
    let seed = match &config.store.seed_path {
        Some(path) => load_seed(path)?,
        None => default_books(),
    };
    let store = BookStore::new(seed)?;

    tracing::info!(
        books = store.len(),
        read_only = config.store.read_only,
        "Book store initialized"
    );
    metrics::record_catalogue_size(store.len());

    Ok(BookService::new(store, config.store.read_only))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_builds_default_catalogue() {
        let service = build_service(&ServiceConfig::default()).unwrap();
        assert_eq!(service.store().len(), 5);
        assert!(service.is_read_only());
    }

    #[test]
    fn test_missing_seed_file_fails() {
        let mut config = ServiceConfig::default();
        config.store.seed_path = Some(PathBuf::from("/nonexistent/books.json"));
        assert!(matches!(
            build_service(&config),
            Err(StoreError::SeedIo { .. })
        ));
    }
}
