//! Filter predicate tree.
//!
//! Filters use the MongoDB-style JSON vocabulary: an object of field clauses
//! (implicit conjunction), `$and` / `$or` / `$nor` combinators, and per-field
//! operator objects. Parsing produces a typed tree so that field references
//! can be rewritten structurally without touching operator semantics.

use crate::core::{EntityError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// A filter over records, either a combinator or a single field clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub enum Filter {
    /// Every sub-filter must match. An empty conjunction matches everything.
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Field(FieldFilter),
}

/// A condition on one (possibly dotted) field path.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub path: String,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `{"field": value}`
    Equals(JsonValue),
    /// `{"field": {"$op": operand, ...}}`, all operators must hold.
    Operators(Vec<Operator>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Eq(JsonValue),
    Ne(JsonValue),
    Gt(JsonValue),
    Gte(JsonValue),
    Lt(JsonValue),
    Lte(JsonValue),
    In(Vec<JsonValue>),
    Nin(Vec<JsonValue>),
    Exists(bool),
    Regex(Pattern),
    Not(Vec<Operator>),
}

/// Compiled `$regex` operand with its `$options` flags.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    options: String,
}

impl Pattern {
    pub fn new(source: &str, options: &str) -> Result<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(options.contains('i'))
            .multi_line(options.contains('m'))
            .dot_matches_new_line(options.contains('s'))
            .ignore_whitespace(options.contains('x'))
            .build()
            .map_err(|e| EntityError::InvalidFilter(format!("bad $regex '{}': {}", source, e)))?;
        Ok(Self {
            regex,
            options: options.to_string(),
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn options(&self) -> &str {
        &self.options
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source() && self.options == other.options
    }
}

impl Filter {
    /// The filter that matches every record.
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    pub fn eq(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Field(FieldFilter {
            path: path.into(),
            predicate: Predicate::Equals(value.into()),
        })
    }

    pub fn field(path: impl Into<String>, operators: Vec<Operator>) -> Self {
        Filter::Field(FieldFilter {
            path: path.into(),
            predicate: Predicate::Operators(operators),
        })
    }

    pub fn is_in<I, V>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        Self::field(
            path,
            vec![Operator::In(values.into_iter().map(Into::into).collect())],
        )
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Parses a JSON filter document.
    pub fn parse(value: &JsonValue) -> Result<Self> {
        let JsonValue::Object(map) = value else {
            return Err(EntityError::InvalidFilter(format!(
                "filter must be an object, got {}",
                value
            )));
        };

        let mut clauses = Vec::with_capacity(map.len());
        for (key, operand) in map {
            let clause = match key.as_str() {
                "$and" => Filter::And(parse_list(key, operand)?),
                "$or" => Filter::Or(parse_list(key, operand)?),
                "$nor" => Filter::Nor(parse_list(key, operand)?),
                other if other.starts_with('$') => {
                    return Err(EntityError::InvalidFilter(format!(
                        "unsupported top-level operator '{}'",
                        other
                    )));
                }
                path => Filter::Field(FieldFilter {
                    path: path.to_string(),
                    predicate: Predicate::parse(path, operand)?,
                }),
            };
            clauses.push(clause);
        }

        Ok(match clauses.len() {
            1 => clauses.remove(0),
            _ => Filter::And(clauses),
        })
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        match self {
            Filter::And(filters) if filters.is_empty() => {}
            Filter::And(filters) => {
                map.insert("$and".into(), render_list(filters));
            }
            Filter::Or(filters) => {
                map.insert("$or".into(), render_list(filters));
            }
            Filter::Nor(filters) => {
                map.insert("$nor".into(), render_list(filters));
            }
            Filter::Field(field) => {
                map.insert(field.path.clone(), field.predicate.to_json());
            }
        }
        JsonValue::Object(map)
    }

    /// Rebuilds the tree, replacing every field path for which `rename`
    /// returns `Some`. Operators and combinators are left untouched.
    pub fn map_paths<F>(&self, rename: &F) -> Filter
    where
        F: Fn(&str) -> Option<String>,
    {
        let map_all = |filters: &[Filter]| -> Vec<Filter> {
            filters.iter().map(|f| f.map_paths(rename)).collect()
        };
        match self {
            Filter::And(filters) => Filter::And(map_all(filters)),
            Filter::Or(filters) => Filter::Or(map_all(filters)),
            Filter::Nor(filters) => Filter::Nor(map_all(filters)),
            Filter::Field(field) => Filter::Field(FieldFilter {
                path: rename(&field.path).unwrap_or_else(|| field.path.clone()),
                predicate: field.predicate.clone(),
            }),
        }
    }

    /// Renames every clause on exactly `from` to `to`. Nested paths such as
    /// `profile.id` are not affected.
    pub fn rename_field(&self, from: &str, to: &str) -> Filter {
        self.map_paths(&|path: &str| (path == from).then(|| to.to_string()))
    }
}

impl Predicate {
    fn parse(path: &str, operand: &JsonValue) -> Result<Self> {
        match operand {
            JsonValue::Object(map) if !map.is_empty() && map.keys().any(|k| k.starts_with('$')) => {
                if !map.keys().all(|k| k.starts_with('$')) {
                    return Err(EntityError::InvalidFilter(format!(
                        "field '{}' mixes operators and plain keys",
                        path
                    )));
                }
                Ok(Predicate::Operators(parse_operators(path, map)?))
            }
            other => Ok(Predicate::Equals(other.clone())),
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            Predicate::Equals(value) => value.clone(),
            Predicate::Operators(ops) => render_operators(ops),
        }
    }
}

fn parse_list(key: &str, operand: &JsonValue) -> Result<Vec<Filter>> {
    match operand {
        JsonValue::Array(items) if !items.is_empty() => items.iter().map(Filter::parse).collect(),
        _ => Err(EntityError::InvalidFilter(format!(
            "'{}' expects a non-empty array",
            key
        ))),
    }
}

fn parse_operators(path: &str, map: &Map<String, JsonValue>) -> Result<Vec<Operator>> {
    let mut ops = Vec::with_capacity(map.len());
    for (op, operand) in map {
        let parsed = match op.as_str() {
            "$eq" => Operator::Eq(operand.clone()),
            "$ne" => Operator::Ne(operand.clone()),
            "$gt" => Operator::Gt(operand.clone()),
            "$gte" => Operator::Gte(operand.clone()),
            "$lt" => Operator::Lt(operand.clone()),
            "$lte" => Operator::Lte(operand.clone()),
            "$in" => Operator::In(expect_array(path, op, operand)?),
            "$nin" => Operator::Nin(expect_array(path, op, operand)?),
            "$exists" => match operand {
                JsonValue::Bool(flag) => Operator::Exists(*flag),
                _ => return Err(bad_operand(path, op, "a boolean")),
            },
            "$regex" => {
                let JsonValue::String(source) = operand else {
                    return Err(bad_operand(path, op, "a string"));
                };
                let options = match map.get("$options") {
                    None => "",
                    Some(JsonValue::String(options)) => options.as_str(),
                    Some(_) => return Err(bad_operand(path, "$options", "a string")),
                };
                Operator::Regex(Pattern::new(source, options)?)
            }
            "$options" if map.contains_key("$regex") => continue,
            "$not" => match operand {
                JsonValue::Object(inner) if !inner.is_empty() => {
                    Operator::Not(parse_operators(path, inner)?)
                }
                _ => return Err(bad_operand(path, op, "an operator object")),
            },
            other => {
                return Err(EntityError::InvalidFilter(format!(
                    "unsupported operator '{}' on field '{}'",
                    other, path
                )));
            }
        };
        ops.push(parsed);
    }
    Ok(ops)
}

fn expect_array(path: &str, op: &str, operand: &JsonValue) -> Result<Vec<JsonValue>> {
    match operand {
        JsonValue::Array(items) => Ok(items.clone()),
        _ => Err(bad_operand(path, op, "an array")),
    }
}

fn bad_operand(path: &str, op: &str, expected: &str) -> EntityError {
    EntityError::InvalidFilter(format!(
        "'{}' on field '{}' expects {}",
        op, path, expected
    ))
}

fn render_list(filters: &[Filter]) -> JsonValue {
    JsonValue::Array(filters.iter().map(Filter::to_json).collect())
}

fn render_operators(ops: &[Operator]) -> JsonValue {
    let mut map = Map::new();
    for op in ops {
        let (key, operand) = match op {
            Operator::Eq(v) => ("$eq", v.clone()),
            Operator::Ne(v) => ("$ne", v.clone()),
            Operator::Gt(v) => ("$gt", v.clone()),
            Operator::Gte(v) => ("$gte", v.clone()),
            Operator::Lt(v) => ("$lt", v.clone()),
            Operator::Lte(v) => ("$lte", v.clone()),
            Operator::In(vs) => ("$in", JsonValue::Array(vs.clone())),
            Operator::Nin(vs) => ("$nin", JsonValue::Array(vs.clone())),
            Operator::Exists(flag) => ("$exists", JsonValue::Bool(*flag)),
            Operator::Regex(pattern) => {
                if !pattern.options().is_empty() {
                    map.insert("$options".into(), pattern.options().into());
                }
                ("$regex", JsonValue::String(pattern.source().to_string()))
            }
            Operator::Not(inner) => ("$not", render_operators(inner)),
        };
        map.insert(key.to_string(), operand);
    }
    JsonValue::Object(map)
}

impl TryFrom<JsonValue> for Filter {
    type Error = EntityError;

    fn try_from(value: JsonValue) -> Result<Self> {
        Filter::parse(&value)
    }
}

impl From<Filter> for JsonValue {
    fn from(filter: Filter) -> Self {
        filter.to_json()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
