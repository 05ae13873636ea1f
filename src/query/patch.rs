//! Update documents carried by update commands.
//!
//! A [`Patch`] is an opaque, serializable description of a change to one
//! record, written in the MongoDB update-operator style. The store adapter
//! only renames the identifier field before handing it over; [`Patch::apply`]
//! is the reference semantics used by the in-process store and by the pool
//! reducer.

use crate::core::{EntityError, PatchError, Record, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(Map<String, JsonValue>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(EntityError::Serialization(format!(
                "update document must be an object, got {}",
                other
            ))),
        }
    }

    pub fn set(self, path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.with_operator("$set", path.into(), value.into())
    }

    pub fn unset(self, path: impl Into<String>) -> Self {
        self.with_operator("$unset", path.into(), JsonValue::String(String::new()))
    }

    pub fn inc(self, path: impl Into<String>, by: impl Into<Number>) -> Self {
        self.with_operator("$inc", path.into(), JsonValue::Number(by.into()))
    }

    pub fn push(self, path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.with_operator("$push", path.into(), value.into())
    }

    pub fn rename(self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.with_operator("$rename", from.into(), JsonValue::String(to.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    /// Renames the top-level field `from` (and paths below it) to `to` in
    /// every operator, including `$rename` targets.
    pub fn rename_field(&self, from: &str, to: &str) -> Patch {
        let rewrite = |path: &str| -> String {
            if path == from {
                to.to_string()
            } else if let Some(rest) = path.strip_prefix(from).and_then(|r| r.strip_prefix('.')) {
                format!("{}.{}", to, rest)
            } else {
                path.to_string()
            }
        };

        let operators = self
            .0
            .iter()
            .map(|(op, operand)| {
                let operand = match operand {
                    JsonValue::Object(fields) => JsonValue::Object(
                        fields
                            .iter()
                            .map(|(path, value)| {
                                let value = match value {
                                    JsonValue::String(target) if op == "$rename" => {
                                        JsonValue::String(rewrite(target))
                                    }
                                    other => other.clone(),
                                };
                                (rewrite(path), value)
                            })
                            .collect(),
                    ),
                    other => other.clone(),
                };
                (op.clone(), operand)
            })
            .collect();
        Patch(operators)
    }

    fn with_operator(mut self, op: &str, path: String, operand: JsonValue) -> Self {
        let slot = self
            .0
            .entry(op.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if let JsonValue::Object(fields) = slot {
            fields.insert(path, operand);
        }
        self
    }

    /// Applies the patch to a copy of `record`. Any operator touching
    /// `id_field` is rejected so a patch can never re-key a record.
    pub fn apply(&self, record: &Record, id_field: &str) -> std::result::Result<Record, PatchError> {
        let mut next = record.clone();
        for (op, operand) in &self.0 {
            let JsonValue::Object(fields) = operand else {
                return Err(PatchError::InvalidOperand(op.clone()));
            };
            for (path, value) in fields {
                guard_identifier(path, id_field)?;
                match op.as_str() {
                    "$set" => set_path(&mut next, path, value.clone())?,
                    "$unset" => {
                        unset_path(&mut next, path);
                    }
                    "$inc" => increment(&mut next, path, value)?,
                    "$push" => push(&mut next, path, value)?,
                    "$rename" => {
                        let JsonValue::String(target) = value else {
                            return Err(PatchError::InvalidOperand(op.clone()));
                        };
                        guard_identifier(target, id_field)?;
                        if let Some(moved) = unset_path(&mut next, path) {
                            set_path(&mut next, target, moved)?;
                        }
                    }
                    other => return Err(PatchError::UnsupportedOperator(other.to_string())),
                }
            }
        }
        Ok(next)
    }
}

fn guard_identifier(path: &str, id_field: &str) -> std::result::Result<(), PatchError> {
    if path == id_field || path.starts_with(&format!("{}.", id_field)) {
        return Err(PatchError::IdentifierChange(path.to_string()));
    }
    Ok(())
}

fn split(path: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = path.split('.').collect();
    let leaf = parts.pop().unwrap_or(path);
    (parts, leaf)
}

/// Walks to the parent object of `path`, creating missing objects on the way.
fn parent_mut<'a>(
    record: &'a mut Record,
    path: &str,
    parents: &[&str],
) -> std::result::Result<&'a mut Record, PatchError> {
    let mut current = record;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        current = match slot {
            JsonValue::Object(map) => map,
            _ => return Err(PatchError::NotObject(path.to_string())),
        };
    }
    Ok(current)
}

fn set_path(record: &mut Record, path: &str, value: JsonValue) -> std::result::Result<(), PatchError> {
    let (parents, leaf) = split(path);
    parent_mut(record, path, &parents)?.insert(leaf.to_string(), value);
    Ok(())
}

fn unset_path(record: &mut Record, path: &str) -> Option<JsonValue> {
    let (parents, leaf) = split(path);
    let mut current = record;
    for segment in parents {
        current = current.get_mut(segment)?.as_object_mut()?;
    }
    current.remove(leaf)
}

fn increment(record: &mut Record, path: &str, by: &JsonValue) -> std::result::Result<(), PatchError> {
    let JsonValue::Number(by) = by else {
        return Err(PatchError::NotNumeric(path.to_string()));
    };
    let (parents, leaf) = split(path);
    let parent = parent_mut(record, path, &parents)?;
    let next = match parent.get(leaf) {
        None => JsonValue::Number(by.clone()),
        Some(JsonValue::Number(current)) => {
            add(current, by).ok_or_else(|| PatchError::NotNumeric(path.to_string()))?
        }
        Some(_) => return Err(PatchError::NotNumeric(path.to_string())),
    };
    parent.insert(leaf.to_string(), next);
    Ok(())
}

fn add(a: &Number, b: &Number) -> Option<JsonValue> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Some(JsonValue::from(sum));
        }
    }
    Number::from_f64(a.as_f64()? + b.as_f64()?).map(JsonValue::Number)
}

fn push(record: &mut Record, path: &str, value: &JsonValue) -> std::result::Result<(), PatchError> {
    let (parents, leaf) = split(path);
    let parent = parent_mut(record, path, &parents)?;
    match parent.get_mut(leaf) {
        None => {
            parent.insert(leaf.to_string(), JsonValue::Array(vec![value.clone()]));
        }
        Some(JsonValue::Array(items)) => items.push(value.clone()),
        Some(_) => return Err(PatchError::NotArray(path.to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_builder_produces_operator_document() {
        let patch = Patch::new().set("name", "Bob").inc("visits", 1).unset("tmp");
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"$set": {"name": "Bob"}, "$inc": {"visits": 1}, "$unset": {"tmp": ""}})
        );
    }

    #[test]
    fn test_apply_set_inc_push_unset() {
        let base = record(json!({"id": "u1", "visits": 2, "tags": ["a"], "tmp": true}));
        let patch = Patch::new()
            .set("profile.city", "Oslo")
            .inc("visits", 3)
            .push("tags", "b")
            .unset("tmp");

        let next = patch.apply(&base, "id").unwrap();
        assert_eq!(
            JsonValue::Object(next),
            json!({"id": "u1", "visits": 5, "tags": ["a", "b"], "profile": {"city": "Oslo"}})
        );
        // original untouched
        assert_eq!(base.get("visits"), Some(&json!(2)));
    }

    #[test]
    fn test_apply_rename_moves_value() {
        let base = record(json!({"id": "u1", "nick": "al"}));
        let next = Patch::new().rename("nick", "alias").apply(&base, "id").unwrap();
        assert_eq!(JsonValue::Object(next), json!({"id": "u1", "alias": "al"}));
    }

    #[test]
    fn test_apply_rejects_identifier_and_bad_targets() {
        let base = record(json!({"_id": "k", "name": "x", "n": "text"}));
        assert_eq!(
            Patch::new().set("_id", "z").apply(&base, "_id"),
            Err(PatchError::IdentifierChange("_id".into()))
        );
        assert_eq!(
            Patch::new().rename("name", "_id").apply(&base, "_id"),
            Err(PatchError::IdentifierChange("_id".into()))
        );
        assert_eq!(
            Patch::new().inc("n", 1).apply(&base, "_id"),
            Err(PatchError::NotNumeric("n".into()))
        );
        assert_eq!(
            Patch::new().push("name", 1).apply(&base, "_id"),
            Err(PatchError::NotArray("name".into()))
        );
        assert_eq!(
            Patch::new().set("name.first", "a").apply(&base, "_id"),
            Err(PatchError::NotObject("name.first".into()))
        );

        let unknown = Patch::from_value(json!({"$currentDate": {"at": true}})).unwrap();
        assert_eq!(
            unknown.apply(&base, "_id"),
            Err(PatchError::UnsupportedOperator("$currentDate".into()))
        );
    }
}
