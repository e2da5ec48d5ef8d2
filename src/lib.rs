//! OData book catalogue service library.

pub mod books;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod odata;
pub mod store;

pub use books::BookService;
pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
