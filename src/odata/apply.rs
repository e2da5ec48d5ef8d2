//! Applying validated query options to in-memory results.
//!
//! Order of application: `$filter` → `$count` → `$orderby` → `$skip` →
//! `$top` → server-driven page size → `$select`/`$expand` shaping.

use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::odata::entity::{EdmEntity, Navigation};
use crate::odata::limits::QueryLimits;
use crate::odata::query::{ExpandItem, ODataQuery, SortDir};

/// Continuation for a result cut short by the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextPage {
    pub skip: usize,
    pub top: Option<usize>,
}

/// A shaped page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPage {
    pub items: Vec<Value>,
    pub count: Option<usize>,
    pub next: Option<NextPage>,
}

/// Number of items left after `$filter`, as reported by `/$count`.
pub fn count_matching<E: EdmEntity>(items: &[E], query: &ODataQuery) -> usize {
    match &query.filter {
        Some(predicate) => items.iter().filter(|item| predicate.matches(*item)).count(),
        None => items.len(),
    }
}

pub fn apply_collection<E: EdmEntity>(
    items: Vec<E>,
    query: &ODataQuery,
    limits: &QueryLimits,
) -> Result<CollectionPage, serde_json::Error> {
    let mut items: Vec<E> = match &query.filter {
        Some(predicate) => items
            .into_iter()
            .filter(|item| predicate.matches(item))
            .collect(),
        None => items,
    };

    let count = query.count.then_some(items.len());

    if !query.order.is_empty() {
        items.sort_by(|a, b| {
            for key in &query.order {
                let ordering = match (a.property(&key.property), b.property(&key.property)) {
                    (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                };
                let ordering = match key.dir {
                    SortDir::Asc => ordering,
                    SortDir::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    let skip = query.skip.unwrap_or(0);
    let mut window: Vec<E> = items.into_iter().skip(skip).collect();
    if let Some(top) = query.top {
        window.truncate(top);
    }

    let mut next = None;
    if let Some(page_size) = limits.page_size {
        if window.len() > page_size {
            window.truncate(page_size);
            next = Some(NextPage {
                skip: skip + page_size,
                top: query.top.map(|top| top - page_size),
            });
        }
    }

    let items = window
        .iter()
        .map(|item| shape_entity(item, query))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CollectionPage { items, count, next })
}

/// Serialize one entity, keeping only the selected properties and the
/// expanded navigation properties.
pub fn shape_entity<E: EdmEntity>(entity: &E, query: &ODataQuery) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(entity)?;
    if let Value::Object(map) = &mut value {
        shape_object(map, E::NAVIGATION, query.select.as_deref(), &query.expand);
    }
    Ok(value)
}

fn shape_object(
    map: &mut Map<String, Value>,
    navigation: &[Navigation],
    select: Option<&[String]>,
    expand: &[ExpandItem],
) {
    for nav in navigation {
        match expand.iter().find(|e| e.navigation == nav.name) {
            Some(item) => {
                if let Some(target) = map.get_mut(nav.name) {
                    shape_value(target, nav.target, &item.nested);
                }
            }
            None => {
                map.remove(nav.name);
            }
        }
    }

    if let Some(select) = select {
        map.retain(|key, _| {
            select.iter().any(|s| s == key) || expand.iter().any(|e| &e.navigation == key)
        });
    }
}

fn shape_value(value: &mut Value, navigation: &[Navigation], expand: &[ExpandItem]) {
    match value {
        Value::Object(map) => shape_object(map, navigation, None, expand),
        Value::Array(items) => {
            for item in items {
                shape_value(item, navigation, expand);
            }
        }
        _ => {}
    }
}
