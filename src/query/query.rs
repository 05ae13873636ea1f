use super::filter::Filter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter query with optional paging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereQuery {
    pub entity_type: String,
    #[serde(rename = "where", default = "Filter::all")]
    pub filter: Filter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl WhereQuery {
    pub fn new(entity_type: impl Into<String>, filter: Filter) -> Self {
        Self {
            entity_type: entity_type.into(),
            filter,
            skip: None,
            limit: None,
        }
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Caps the number of results. Zero means no limit on both backends.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for WhereQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} where {}", self.entity_type, self.filter)?;
        if let Some(skip) = self.skip {
            write!(f, " skip {}", skip)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {}", limit)?;
        }
        Ok(())
    }
}

/// Point lookup by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdQuery {
    pub entity_type: String,
    pub id: String,
}

impl IdQuery {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for IdQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.id)
    }
}

/// Lookup of a set of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdsQuery {
    pub entity_type: String,
    pub ids: Vec<String>,
}

impl IdsQuery {
    pub fn new<I, S>(entity_type: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity_type: entity_type.into(),
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for IdsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/[{}]", self.entity_type, self.ids.join(", "))
    }
}
