//! Safety limits for query options.
//!
//! - `max_top`: largest accepted `$top` (unbounded when `None`)
//! - `page_size`: server-driven page size (no paging when `None`)
//! - `max_expansion_depth`: deepest accepted `$expand` nesting
//! - `max_filter_length` / `max_filter_nodes`: `$filter` size budget
//! - `max_orderby_fields`: number of `$orderby` keys

use crate::odata::error::QueryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLimits {
    pub max_top: Option<usize>,
    pub page_size: Option<usize>,
    pub max_expansion_depth: usize,
    pub max_filter_length: usize,
    pub max_filter_nodes: usize,
    pub max_orderby_fields: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_top: None,
            page_size: None,
            max_expansion_depth: 2,
            max_filter_length: 2000,
            max_filter_nodes: 100,
            max_orderby_fields: 5,
        }
    }
}

impl QueryLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_top(mut self, max_top: usize) -> Self {
        self.max_top = Some(max_top);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    pub fn with_max_filter_length(mut self, max: usize) -> Self {
        self.max_filter_length = max;
        self
    }

    pub fn with_max_orderby_fields(mut self, max: usize) -> Self {
        self.max_orderby_fields = max;
        self
    }

    pub fn validate_top(&self, top: usize) -> Result<(), QueryError> {
        match self.max_top {
            Some(max) if top > max => Err(QueryError::TopExceeded {
                requested: top,
                max,
            }),
            _ => Ok(()),
        }
    }

    pub fn validate_expansion_depth(&self, depth: usize) -> Result<(), QueryError> {
        if depth > self.max_expansion_depth {
            return Err(QueryError::ExpansionTooDeep {
                depth,
                max: self.max_expansion_depth,
            });
        }
        Ok(())
    }

    pub fn validate_filter(&self, filter: &str) -> Result<(), QueryError> {
        if filter.len() > self.max_filter_length {
            return Err(QueryError::InvalidFilter(format!(
                "expression exceeds maximum length of {} characters",
                self.max_filter_length
            )));
        }
        Ok(())
    }

    pub fn validate_filter_nodes(&self, nodes: usize) -> Result<(), QueryError> {
        if nodes > self.max_filter_nodes {
            return Err(QueryError::InvalidFilter(format!(
                "expression too complex (max {} nodes)",
                self.max_filter_nodes
            )));
        }
        Ok(())
    }

    pub fn validate_orderby_count(&self, count: usize) -> Result<(), QueryError> {
        if count > self.max_orderby_fields {
            return Err(QueryError::InvalidOrderBy(format!(
                "too many fields (max: {})",
                self.max_orderby_fields
            )));
        }
        Ok(())
    }
}
