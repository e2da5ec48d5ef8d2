//! `$filter` binding and evaluation.
//!
//! Parsing is delegated to `odata-params`. The resulting AST is bound against
//! the declared properties of an [`EdmEntity`]:
//! - comparisons (`eq ne gt ge lt le`) between a property and a literal
//! - `and`, `or`, `not`
//! - `in` with a literal list
//! - `contains`, `startswith`, `endswith` on string properties
//! - a bare boolean property (`ForKids`) or boolean literal
//!
//! Anything else, an unknown property, or a literal of the wrong kind is
//! rejected before evaluation.

use bigdecimal::{BigDecimal, ToPrimitive};
use odata_params::filters as od;
use std::cmp::Ordering;

use crate::odata::entity::{EdmEntity, Primitive, PropertyKind};
use crate::odata::error::QueryError;
use crate::odata::limits::QueryLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// The operator with its operands swapped: `1 lt ID` is `ID gt 1`.
    fn flipped(self) -> Self {
        match self {
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            other => other,
        }
    }

    fn test(self, actual: &Primitive, expected: &Primitive) -> bool {
        match self {
            CompareOp::Eq => actual == expected,
            CompareOp::Ne => actual != expected,
            _ if *actual == Primitive::Null || *expected == Primitive::Null => false,
            CompareOp::Gt => actual.compare(expected) == Some(Ordering::Greater),
            CompareOp::Ge => matches!(
                actual.compare(expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CompareOp::Lt => actual.compare(expected) == Some(Ordering::Less),
            CompareOp::Le => matches!(
                actual.compare(expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

impl From<&od::CompareOperator> for CompareOp {
    fn from(op: &od::CompareOperator) -> Self {
        use od::CompareOperator::{
            Equal, GreaterOrEqual, GreaterThan, LessOrEqual, LessThan, NotEqual,
        };
        match op {
            Equal => CompareOp::Eq,
            NotEqual => CompareOp::Ne,
            GreaterThan => CompareOp::Gt,
            GreaterOrEqual => CompareOp::Ge,
            LessThan => CompareOp::Lt,
            LessOrEqual => CompareOp::Le,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFunction {
    Contains,
    StartsWith,
    EndsWith,
}

impl TextFunction {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "contains" => Some(TextFunction::Contains),
            "startswith" => Some(TextFunction::StartsWith),
            "endswith" => Some(TextFunction::EndsWith),
            _ => None,
        }
    }

    fn test(self, haystack: &str, needle: &str) -> bool {
        match self {
            TextFunction::Contains => haystack.contains(needle),
            TextFunction::StartsWith => haystack.starts_with(needle),
            TextFunction::EndsWith => haystack.ends_with(needle),
        }
    }
}

/// A `$filter` expression bound to entity properties.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    Compare {
        property: String,
        op: CompareOp,
        value: Primitive,
    },
    In {
        property: String,
        values: Vec<Primitive>,
    },
    Text {
        property: String,
        function: TextFunction,
        needle: String,
    },
    Flag(String),
    Literal(bool),
}

impl Predicate {
    /// Parse and bind a raw `$filter` value for entity type `E`.
    pub fn parse<E: EdmEntity>(raw: &str, limits: &QueryLimits) -> Result<Self, QueryError> {
        limits.validate_filter(raw)?;
        let ast = od::parse_str(raw).map_err(|e| QueryError::InvalidFilter(format!("{e:?}")))?;
        limits.validate_filter_nodes(count_nodes(&ast))?;
        bind::<E>(&ast)
    }

    pub fn matches<E: EdmEntity>(&self, entity: &E) -> bool {
        match self {
            Predicate::And(a, b) => a.matches(entity) && b.matches(entity),
            Predicate::Or(a, b) => a.matches(entity) || b.matches(entity),
            Predicate::Not(inner) => !inner.matches(entity),
            Predicate::Compare {
                property,
                op,
                value,
            } => entity
                .property(property)
                .is_some_and(|actual| op.test(&actual, value)),
            Predicate::In { property, values } => entity
                .property(property)
                .is_some_and(|actual| values.contains(&actual)),
            Predicate::Text {
                property,
                function,
                needle,
            } => match entity.property(property) {
                Some(Primitive::String(s)) => function.test(&s, needle),
                _ => false,
            },
            Predicate::Flag(property) => {
                matches!(entity.property(property), Some(Primitive::Bool(true)))
            }
            Predicate::Literal(b) => *b,
        }
    }
}

fn count_nodes(e: &od::Expr) -> usize {
    use od::Expr::{And, Compare, Function, Identifier, In, Not, Or, Value};
    match e {
        Value(_) | Identifier(_) => 1,
        Not(x) => 1 + count_nodes(x),
        And(a, b) | Or(a, b) | Compare(a, _, b) => 1 + count_nodes(a) + count_nodes(b),
        In(a, list) => 1 + count_nodes(a) + list.iter().map(count_nodes).sum::<usize>(),
        Function(_, args) => 1 + args.iter().map(count_nodes).sum::<usize>(),
    }
}

fn bind<E: EdmEntity>(expr: &od::Expr) -> Result<Predicate, QueryError> {
    use od::Expr as X;

    match expr {
        X::And(a, b) => Ok(Predicate::And(
            Box::new(bind::<E>(a)?),
            Box::new(bind::<E>(b)?),
        )),
        X::Or(a, b) => Ok(Predicate::Or(
            Box::new(bind::<E>(a)?),
            Box::new(bind::<E>(b)?),
        )),
        X::Not(inner) => Ok(Predicate::Not(Box::new(bind::<E>(inner)?))),

        X::Compare(left, op, right) => {
            let (name, op, value) = match (&**left, &**right) {
                (X::Identifier(name), X::Value(value)) => (name, CompareOp::from(op), value),
                (X::Value(value), X::Identifier(name)) => {
                    (name, CompareOp::from(op).flipped(), value)
                }
                (X::Identifier(_), X::Identifier(_)) => {
                    return Err(QueryError::InvalidFilter(
                        "comparing two properties is not supported".into(),
                    ))
                }
                _ => {
                    return Err(QueryError::InvalidFilter(
                        "comparison must be between a property and a literal".into(),
                    ))
                }
            };
            let kind = property_kind::<E>(name)?;
            let value = literal(name, kind, value)?;
            Ok(Predicate::Compare {
                property: name.clone(),
                op,
                value,
            })
        }

        X::In(left, list) => {
            let X::Identifier(name) = &**left else {
                return Err(QueryError::InvalidFilter(
                    "left side of 'in' must be a property".into(),
                ));
            };
            let kind = property_kind::<E>(name)?;
            let values = list
                .iter()
                .map(|item| match item {
                    X::Value(value) => literal(name, kind, value),
                    _ => Err(QueryError::InvalidFilter(
                        "'in' list must contain literals only".into(),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::In {
                property: name.clone(),
                values,
            })
        }

        X::Function(func, args) => {
            let function = TextFunction::from_name(func).ok_or_else(|| {
                QueryError::InvalidFilter(format!("unsupported function '{func}'"))
            })?;
            match args.as_slice() {
                [X::Identifier(name), X::Value(od::Value::String(needle))] => {
                    if property_kind::<E>(name)? != PropertyKind::String {
                        return Err(QueryError::InvalidFilter(format!(
                            "{func} requires a string property, '{name}' is not"
                        )));
                    }
                    Ok(Predicate::Text {
                        property: name.clone(),
                        function,
                        needle: needle.clone(),
                    })
                }
                _ => Err(QueryError::InvalidFilter(format!(
                    "{func} expects a property and a string literal"
                ))),
            }
        }

        X::Identifier(name) => match property_kind::<E>(name)? {
            PropertyKind::Boolean => Ok(Predicate::Flag(name.clone())),
            kind => Err(QueryError::InvalidFilter(format!(
                "property '{name}' of type {kind} is not a boolean expression"
            ))),
        },

        X::Value(od::Value::Bool(b)) => Ok(Predicate::Literal(*b)),
        X::Value(_) => Err(QueryError::InvalidFilter(
            "a literal is not a boolean expression".into(),
        )),
    }
}

fn property_kind<E: EdmEntity>(name: &str) -> Result<PropertyKind, QueryError> {
    E::property_kind(name).ok_or_else(|| {
        QueryError::InvalidFilter(format!(
            "could not find a property named '{name}' on type '{}'",
            E::TYPE_NAME
        ))
    })
}

fn literal(property: &str, kind: PropertyKind, value: &od::Value) -> Result<Primitive, QueryError> {
    let mismatch = || {
        QueryError::InvalidFilter(format!(
            "property '{property}' of type {kind} cannot be compared with the given literal"
        ))
    };
    match (kind, value) {
        (_, od::Value::Null) => Ok(Primitive::Null),
        (PropertyKind::Boolean, od::Value::Bool(b)) => Ok(Primitive::Bool(*b)),
        (PropertyKind::String, od::Value::String(s)) => Ok(Primitive::String(s.clone())),
        (PropertyKind::Int32, od::Value::Number(n)) => int32(n).ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

fn int32(n: &BigDecimal) -> Option<Primitive> {
    if !n.is_integer() {
        return None;
    }
    n.to_i32().map(|v| Primitive::Int(i64::from(v)))
}
