use thiserror::Error;

/// Errors raised while parsing or binding system query options.
///
/// All of them are client errors and map to 400 Bad Request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid $filter: {0}")]
    InvalidFilter(String),

    #[error("invalid $orderby: {0}")]
    InvalidOrderBy(String),

    #[error("invalid $select: {0}")]
    InvalidSelect(String),

    #[error("invalid $expand: {0}")]
    InvalidExpand(String),

    #[error("invalid value '{value}' for query option {option}")]
    InvalidValue { option: String, value: String },

    #[error("the limit of {max} for $top was exceeded, requested {requested}")]
    TopExceeded { requested: usize, max: usize },

    #[error("the maximum expansion depth of {max} was exceeded, requested {depth}")]
    ExpansionTooDeep { depth: usize, max: usize },

    #[error("query option {0} is not supported")]
    UnsupportedOption(String),

    #[error("query option {0} is not supported on a single entity")]
    NotApplicable(String),

    #[error("query option {0} was specified more than once")]
    DuplicateOption(String),
}
