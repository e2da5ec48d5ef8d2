//! System query options.
//!
//! # Data Flow
//! ```text
//! raw query string
//!     → split into ($option, value) pairs (form-urlencoded)
//!     → per-option parsing + limit checks (limits.rs)
//!     → binding against the entity's declared properties
//!     → ODataQuery (validated, ready to apply)
//! ```
//!
//! Unknown `$` options and repeated options are rejected; parameters without
//! a `$` prefix are custom options and are ignored.

use std::collections::HashMap;

use crate::odata::entity::{EdmEntity, Navigation};
use crate::odata::error::QueryError;
use crate::odata::filter::Predicate;
use crate::odata::limits::QueryLimits;

const FILTER: &str = "$filter";
const ORDERBY: &str = "$orderby";
const TOP: &str = "$top";
const SKIP: &str = "$skip";
const COUNT: &str = "$count";
const SELECT: &str = "$select";
const EXPAND: &str = "$expand";

const COLLECTION_OPTIONS: &[&str] = &[FILTER, ORDERBY, TOP, SKIP, COUNT, SELECT, EXPAND];
const ENTITY_OPTIONS: &[&str] = &[SELECT, EXPAND];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub property: String,
    pub dir: SortDir,
}

/// One `$expand` item, e.g. `Authors` or `MainAuthor($expand=...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandItem {
    pub navigation: String,
    pub nested: Vec<ExpandItem>,
}

impl ExpandItem {
    pub fn new(navigation: impl Into<String>) -> Self {
        Self {
            navigation: navigation.into(),
            nested: Vec::new(),
        }
    }

    fn depth(&self) -> usize {
        1 + expand_depth(&self.nested)
    }
}

fn expand_depth(items: &[ExpandItem]) -> usize {
    items.iter().map(ExpandItem::depth).max().unwrap_or(0)
}

/// Validated query options for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ODataQuery {
    pub filter: Option<Predicate>,
    pub order: Vec<OrderKey>,
    pub top: Option<usize>,
    pub skip: Option<usize>,
    pub count: bool,
    pub select: Option<Vec<String>>,
    pub expand: Vec<ExpandItem>,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a collection of `E`.
    pub fn for_collection<E: EdmEntity>(
        raw: Option<&str>,
        limits: &QueryLimits,
    ) -> Result<Self, QueryError> {
        Self::parse::<E>(raw, limits, COLLECTION_OPTIONS)
    }

    /// Options for a single `E`: only `$select` and `$expand` apply.
    pub fn for_entity<E: EdmEntity>(
        raw: Option<&str>,
        limits: &QueryLimits,
    ) -> Result<Self, QueryError> {
        Self::parse::<E>(raw, limits, ENTITY_OPTIONS)
    }

    pub fn expansion_depth(&self) -> usize {
        expand_depth(&self.expand)
    }

    pub fn is_expanded(&self, navigation: &str) -> bool {
        self.expand.iter().any(|e| e.navigation == navigation)
    }

    fn parse<E: EdmEntity>(
        raw: Option<&str>,
        limits: &QueryLimits,
        applicable: &[&str],
    ) -> Result<Self, QueryError> {
        let options = split_options(raw.unwrap_or_default(), applicable)?;
        let mut query = ODataQuery::new();

        if let Some(raw_filter) = options.get(FILTER) {
            if !raw_filter.trim().is_empty() {
                query.filter = Some(Predicate::parse::<E>(raw_filter.trim(), limits)?);
            }
        }

        if let Some(raw_orderby) = options.get(ORDERBY) {
            query.order = parse_orderby::<E>(raw_orderby, limits)?;
        }

        if let Some(raw_top) = options.get(TOP) {
            let top = parse_count_value(TOP, raw_top)?;
            limits.validate_top(top)?;
            query.top = Some(top);
        }

        if let Some(raw_skip) = options.get(SKIP) {
            query.skip = Some(parse_count_value(SKIP, raw_skip)?);
        }

        if let Some(raw_count) = options.get(COUNT) {
            query.count = match raw_count.trim() {
                "true" => true,
                "false" => false,
                other => {
                    return Err(QueryError::InvalidValue {
                        option: COUNT.into(),
                        value: other.into(),
                    })
                }
            };
        }

        if let Some(raw_select) = options.get(SELECT) {
            query.select = parse_select::<E>(raw_select)?;
        }

        if let Some(raw_expand) = options.get(EXPAND) {
            query.expand = parse_expand(raw_expand, E::NAVIGATION)?;
            limits.validate_expansion_depth(query.expansion_depth())?;
        }

        if let Some(select) = &query.select {
            let unexpanded = select.iter().find(|field| {
                E::NAVIGATION.iter().any(|n| n.name == field.as_str())
                    && !query.expand.iter().any(|e| &e.navigation == *field)
            });
            if let Some(field) = unexpanded {
                return Err(QueryError::InvalidSelect(format!(
                    "navigation property '{field}' must also be listed in $expand"
                )));
            }
        }

        Ok(query)
    }
}

fn split_options(raw: &str, applicable: &[&str]) -> Result<HashMap<String, String>, QueryError> {
    let mut options = HashMap::new();
    for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        let name = name.into_owned();
        if !name.starts_with('$') {
            continue;
        }
        if !COLLECTION_OPTIONS.contains(&name.as_str()) {
            return Err(QueryError::UnsupportedOption(name));
        }
        if !applicable.contains(&name.as_str()) {
            return Err(QueryError::NotApplicable(name));
        }
        if options.contains_key(&name) {
            return Err(QueryError::DuplicateOption(name));
        }
        options.insert(name, value.into_owned());
    }
    Ok(options)
}

fn parse_count_value(option: &str, raw: &str) -> Result<usize, QueryError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| QueryError::InvalidValue {
            option: option.into(),
            value: raw.into(),
        })
}

/// `$orderby=Title desc, ID`: direction defaults to ascending.
fn parse_orderby<E: EdmEntity>(
    raw: &str,
    limits: &QueryLimits,
) -> Result<Vec<OrderKey>, QueryError> {
    let mut keys = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return Err(QueryError::InvalidOrderBy("empty clause".into()));
        }

        let tokens: Vec<&str> = part.split_whitespace().collect();
        let (property, dir) = match tokens.as_slice() {
            [property] | [property, "asc"] => (*property, SortDir::Asc),
            [property, "desc"] => (*property, SortDir::Desc),
            _ => {
                return Err(QueryError::InvalidOrderBy(format!(
                    "invalid clause '{part}'"
                )))
            }
        };

        if E::property_kind(property).is_none() {
            return Err(QueryError::InvalidOrderBy(format!(
                "could not find a property named '{property}' on type '{}'",
                E::TYPE_NAME
            )));
        }
        if keys.iter().any(|k: &OrderKey| k.property == property) {
            return Err(QueryError::InvalidOrderBy(format!(
                "duplicate property '{property}'"
            )));
        }

        keys.push(OrderKey {
            property: property.to_owned(),
            dir,
        });
    }
    limits.validate_orderby_count(keys.len())?;
    Ok(keys)
}

/// `$select=ID,Title`; `*` selects every structural property.
fn parse_select<E: EdmEntity>(raw: &str) -> Result<Option<Vec<String>>, QueryError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QueryError::InvalidSelect("must not be empty".into()));
    }

    let mut fields: Vec<String> = Vec::new();
    for field in raw.split(',').map(str::trim) {
        if field == "*" {
            return Ok(None);
        }
        let declared = E::property_kind(field).is_some()
            || E::NAVIGATION.iter().any(|n| n.name == field);
        if !declared {
            return Err(QueryError::InvalidSelect(format!(
                "could not find a property named '{field}' on type '{}'",
                E::TYPE_NAME
            )));
        }
        if fields.iter().any(|f| f == field) {
            return Err(QueryError::InvalidSelect(format!(
                "duplicate field '{field}'"
            )));
        }
        fields.push(field.to_owned());
    }
    Ok(Some(fields))
}

/// `$expand=MainAuthor,Authors($expand=...)`; `*` expands every navigation.
fn parse_expand(raw: &str, navigation: &[Navigation]) -> Result<Vec<ExpandItem>, QueryError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QueryError::InvalidExpand("must not be empty".into()));
    }

    let mut items: Vec<ExpandItem> = Vec::new();
    for part in split_top_level(raw, ',')? {
        let part = part.trim();
        if part == "*" {
            return Ok(navigation.iter().map(|n| ExpandItem::new(n.name)).collect());
        }

        let (name, options) = match part.find('(') {
            Some(open) if part.ends_with(')') => {
                (part[..open].trim(), Some(&part[open + 1..part.len() - 1]))
            }
            Some(_) => {
                return Err(QueryError::InvalidExpand(format!("unbalanced parentheses in '{part}'")))
            }
            None => (part, None),
        };

        let target = navigation.iter().find(|n| n.name == name).ok_or_else(|| {
            QueryError::InvalidExpand(format!("could not find a navigation property named '{name}'"))
        })?;

        let mut item = ExpandItem::new(target.name);
        if let Some(options) = options {
            item.nested = parse_nested_options(options, target.target)?;
        }

        if items.iter().any(|i| i.navigation == item.navigation) {
            return Err(QueryError::InvalidExpand(format!(
                "duplicate navigation property '{name}'"
            )));
        }
        items.push(item);
    }
    Ok(items)
}

fn parse_nested_options(
    raw: &str,
    navigation: &[Navigation],
) -> Result<Vec<ExpandItem>, QueryError> {
    let mut nested = Vec::new();
    for option in split_top_level(raw, ';')? {
        let option = option.trim();
        if option.is_empty() {
            continue;
        }
        match option.split_once('=') {
            Some((EXPAND, value)) => nested = parse_expand(value, navigation)?,
            Some((name, _)) => return Err(QueryError::NotApplicable(format!("{name} inside $expand"))),
            None => return Err(QueryError::InvalidExpand(format!("malformed option '{option}'"))),
        }
    }
    Ok(nested)
}

/// Split on `sep` outside of parentheses.
fn split_top_level(raw: &str, sep: char) -> Result<Vec<&str>, QueryError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    QueryError::InvalidExpand("unbalanced parentheses".into())
                })?;
            }
            c if c == sep && depth == 0 => {
                parts.push(&raw[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(QueryError::InvalidExpand("unbalanced parentheses".into()));
    }
    parts.push(&raw[start..]);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Author, Book};
    use crate::odata::entity::{Primitive, Property, PropertyKind};
    use serde::Serialize;

    fn list_limits() -> QueryLimits {
        QueryLimits::new()
            .with_max_top(1)
            .with_page_size(100)
            .with_max_expansion_depth(5)
    }

    fn parse(raw: &str) -> Result<ODataQuery, QueryError> {
        ODataQuery::for_collection::<Book>(Some(raw), &list_limits())
    }

    #[test]
    fn test_empty_query() {
        let query = ODataQuery::for_collection::<Book>(None, &list_limits()).unwrap();
        assert_eq!(query, ODataQuery::default());
    }

    #[test]
    fn test_top_and_skip() {
        let query = parse("$top=1&$skip=3").unwrap();
        assert_eq!(query.top, Some(1));
        assert_eq!(query.skip, Some(3));
    }

    #[test]
    fn test_top_above_limit_rejected() {
        assert_eq!(
            parse("$top=2"),
            Err(QueryError::TopExceeded {
                requested: 2,
                max: 1
            })
        );
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(matches!(parse("$top=-1"), Err(QueryError::InvalidValue { .. })));
        assert!(matches!(parse("$skip=abc"), Err(QueryError::InvalidValue { .. })));
        assert!(matches!(parse("$count=yes"), Err(QueryError::InvalidValue { .. })));
    }

    #[test]
    fn test_unknown_and_duplicate_options() {
        assert_eq!(
            parse("$search=foo"),
            Err(QueryError::UnsupportedOption("$search".into()))
        );
        assert_eq!(
            parse("$top=1&$top=1"),
            Err(QueryError::DuplicateOption("$top".into()))
        );
        // Custom options are ignored
        assert!(parse("debug=true").is_ok());
    }

    #[test]
    fn test_orderby() {
        let query = parse("$orderby=Title%20desc,ID").unwrap();
        assert_eq!(
            query.order,
            vec![
                OrderKey {
                    property: "Title".into(),
                    dir: SortDir::Desc
                },
                OrderKey {
                    property: "ID".into(),
                    dir: SortDir::Asc
                },
            ]
        );
        assert!(matches!(parse("$orderby=Price"), Err(QueryError::InvalidOrderBy(_))));
        assert!(matches!(parse("$orderby=ID%20up"), Err(QueryError::InvalidOrderBy(_))));
    }

    #[test]
    fn test_select() {
        let query = parse("$select=ID,Title").unwrap();
        assert_eq!(query.select, Some(vec!["ID".to_string(), "Title".to_string()]));
        assert_eq!(parse("$select=*").unwrap().select, None);
        assert!(matches!(parse("$select=Price"), Err(QueryError::InvalidSelect(_))));
        assert!(matches!(parse("$select=ID,ID"), Err(QueryError::InvalidSelect(_))));
    }

    #[test]
    fn test_select_navigation_requires_expand() {
        assert!(matches!(
            parse("$select=MainAuthor"),
            Err(QueryError::InvalidSelect(msg)) if msg.contains("MainAuthor")
        ));
        let query = parse("$select=Title,MainAuthor&$expand=MainAuthor").unwrap();
        assert_eq!(query.expand, vec![ExpandItem::new("MainAuthor")]);
    }

    #[test]
    fn test_expand() {
        let query = parse("$expand=MainAuthor,Translators").unwrap();
        assert_eq!(
            query.expand,
            vec![ExpandItem::new("MainAuthor"), ExpandItem::new("Translators")]
        );
        assert_eq!(query.expansion_depth(), 1);
        assert_eq!(parse("$expand=*").unwrap().expand.len(), 3);
        assert!(matches!(parse("$expand=Publisher"), Err(QueryError::InvalidExpand(_))));
        assert!(matches!(
            parse("$expand=Authors($select=Name)"),
            Err(QueryError::NotApplicable(_))
        ));
        // Author has no navigation properties
        assert!(matches!(
            parse("$expand=Authors($expand=Books)"),
            Err(QueryError::InvalidExpand(_))
        ));
    }

    #[test]
    fn test_entity_options_only_allow_select_and_expand() {
        let limits = QueryLimits::default();
        assert!(ODataQuery::for_entity::<Book>(Some("$select=ID&$expand=Authors"), &limits).is_ok());
        assert_eq!(
            ODataQuery::for_entity::<Book>(Some("$top=1"), &limits),
            Err(QueryError::NotApplicable("$top".into()))
        );
    }

    #[test]
    fn test_filter_bound_to_entity() {
        assert!(parse("$filter=ForKids%20eq%20true").unwrap().filter.is_some());
        assert!(ODataQuery::for_collection::<Author>(
            Some("$filter=ForKids eq true"),
            &QueryLimits::default()
        )
        .is_err());
    }

    // A three-level chain to exercise the depth limit.
    #[derive(Serialize)]
    struct Node;

    const LEAF: &[Navigation] = &[];
    const MIDDLE: &[Navigation] = &[Navigation::new("Child", LEAF)];
    const TOP_LEVEL: &[Navigation] = &[Navigation::new("Child", MIDDLE)];
    const ROOT: &[Navigation] = &[Navigation::new("Child", TOP_LEVEL)];

    impl EdmEntity for Node {
        const TYPE_NAME: &'static str = "Node";
        const PROPERTIES: &'static [Property] = &[Property::new("Id", PropertyKind::Int32)];
        const NAVIGATION: &'static [Navigation] = ROOT;

        fn property(&self, _name: &str) -> Option<Primitive> {
            None
        }
    }

    #[test]
    fn test_expansion_depth_limit() {
        let raw = "$expand=Child($expand=Child($expand=Child))";
        let deep = ODataQuery::for_collection::<Node>(Some(raw), &QueryLimits::default());
        assert_eq!(
            deep,
            Err(QueryError::ExpansionTooDeep { depth: 3, max: 2 })
        );

        let limits = QueryLimits::new().with_max_expansion_depth(5);
        let query = ODataQuery::for_collection::<Node>(Some(raw), &limits).unwrap();
        assert_eq!(query.expansion_depth(), 3);
    }
}
