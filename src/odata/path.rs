//! Resource path parsing.
//!
//! # Responsibilities
//! - Split the path below the service root into segments
//! - Extract entity keys (`Books(1)`, `Books(ID=1)`)
//! - Resolve bound/unbound operations, with or without the `Default.` namespace
//!
//! # Design Decisions
//! - Names are case-sensitive
//! - Functions require parentheses (`MostRecent()`); navigation and actions do not
//! - Unknown segments are "not found"; a malformed key is a client error

use thiserror::Error;

/// Namespace of bound and unbound operations.
pub const NAMESPACE: &str = "Default";

pub const BOOKS: &str = "Books";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("no resource found for segment '{0}'")]
    UnknownSegment(String),

    #[error("invalid key '{0}'")]
    InvalidKey(String),
}

/// An addressable resource of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePath {
    ServiceDocument,
    Books,
    BooksCount,
    Book(i32),
    MainAuthor(i32),
    MostRecent,
    Rate(i32),
    ForKidsBooks,
    Authors(i32),
    Translators(i32),
}

impl ResourcePath {
    /// Parse a path relative to the service root, e.g. `Books(1)/Translators`.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Ok(ResourcePath::ServiceDocument);
        }

        let segments = path
            .split('/')
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;

        match segments.as_slice() {
            [set] if set.is(BOOKS) && set.args.is_none() => Ok(ResourcePath::Books),
            [set] if set.is_operation("ReturnAllForKidsBooks") && set.is_call() => {
                Ok(ResourcePath::ForKidsBooks)
            }
            [set] if set.is(BOOKS) => Ok(ResourcePath::Book(set.key()?)),

            [set, next] if set.is(BOOKS) && set.args.is_none() => {
                if next.is("$count") && next.args.is_none() {
                    Ok(ResourcePath::BooksCount)
                } else if next.is_operation("MostRecent") && next.is_call() {
                    Ok(ResourcePath::MostRecent)
                } else {
                    Err(PathError::UnknownSegment(next.raw.to_owned()))
                }
            }

            [set, next] if set.is(BOOKS) => {
                let key = set.key()?;
                match (next.name, next.args) {
                    ("MainAuthor", None) => Ok(ResourcePath::MainAuthor(key)),
                    ("Authors", None) => Ok(ResourcePath::Authors(key)),
                    ("Translators", None) => Ok(ResourcePath::Translators(key)),
                    (_, None) if next.is_operation("Rate") => Ok(ResourcePath::Rate(key)),
                    _ => Err(PathError::UnknownSegment(next.raw.to_owned())),
                }
            }

            [first, ..] if !first.is(BOOKS) => Err(PathError::UnknownSegment(first.raw.to_owned())),
            [.., last] => Err(PathError::UnknownSegment(last.raw.to_owned())),
            [] => Ok(ResourcePath::ServiceDocument),
        }
    }

    /// Low-cardinality name used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ResourcePath::ServiceDocument => "service_document",
            ResourcePath::Books => "books",
            ResourcePath::BooksCount => "books_count",
            ResourcePath::Book(_) => "book",
            ResourcePath::MainAuthor(_) => "main_author",
            ResourcePath::MostRecent => "most_recent",
            ResourcePath::Rate(_) => "rate",
            ResourcePath::ForKidsBooks => "for_kids_books",
            ResourcePath::Authors(_) => "authors",
            ResourcePath::Translators(_) => "translators",
        }
    }

    /// HTTP methods the resource answers to.
    pub fn allowed_methods(&self) -> &'static [&'static str] {
        match self {
            ResourcePath::Book(_) => &["GET", "PUT", "PATCH", "DELETE"],
            ResourcePath::Rate(_) => &["POST"],
            _ => &["GET"],
        }
    }

    pub fn allows(&self, method: &str) -> bool {
        self.allowed_methods().contains(&method)
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment<'a> {
    raw: &'a str,
    name: &'a str,
    args: Option<&'a str>,
}

impl<'a> Segment<'a> {
    fn parse(raw: &'a str) -> Result<Self, PathError> {
        match raw.find('(') {
            Some(open) if raw.ends_with(')') => Ok(Segment {
                raw,
                name: &raw[..open],
                args: Some(&raw[open + 1..raw.len() - 1]),
            }),
            Some(_) => Err(PathError::UnknownSegment(raw.to_owned())),
            None if raw.is_empty() => Err(PathError::UnknownSegment(raw.to_owned())),
            None => Ok(Segment {
                raw,
                name: raw,
                args: None,
            }),
        }
    }

    fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Matches `name` or `Default.name`.
    fn is_operation(&self, name: &str) -> bool {
        let unqualified = self
            .name
            .strip_prefix(NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(self.name);
        unqualified == name
    }

    fn is_call(&self) -> bool {
        matches!(self.args, Some(args) if args.trim().is_empty())
    }

    fn key(&self) -> Result<i32, PathError> {
        let args = self.args.unwrap_or_default().trim();
        let literal = match args.split_once('=') {
            Some((name, value)) if name.trim() == "ID" => value.trim(),
            Some(_) => return Err(PathError::InvalidKey(args.to_owned())),
            None => args,
        };
        literal
            .parse::<i32>()
            .map_err(|_| PathError::InvalidKey(args.to_owned()))
    }
}
