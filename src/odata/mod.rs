//! OData protocol subsystem.
//!
//! # Data Flow
//! ```text
//! request path   → path.rs   (ResourcePath: entity set, key, navigation, operation)
//! query string   → query.rs  (system query options, limits.rs budgets)
//!                  filter.rs (odata-params AST bound to entity properties)
//! handler result → apply.rs  (filter, order, page, select/expand shaping)
//! ```
//!
//! # Design Decisions
//! - Query options are validated against entity declarations (entity.rs)
//!   before the store is touched
//! - Parsing `$filter` is delegated to `odata-params`
//! - Every failure here is a client error (400), except unknown paths (404)

pub mod apply;
pub mod entity;
pub mod error;
pub mod filter;
pub mod limits;
pub mod path;
pub mod query;

pub use apply::{apply_collection, count_matching, shape_entity, CollectionPage, NextPage};
pub use entity::EdmEntity;
pub use error::QueryError;
pub use limits::QueryLimits;
pub use path::{PathError, ResourcePath};
pub use query::ODataQuery;
