//! Book catalogue service.
//!
//! # Data Flow
//! ```text
//! http::handlers → BookService (validate, resolve key) → BookStore
//! ```

pub mod error;
pub mod service;

pub use error::ServiceError;
pub use service::BookService;
