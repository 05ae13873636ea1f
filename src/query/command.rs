//! Write commands.
//!
//! Each command family has a single-target and a multi-target shape. On the
//! wire they are distinguished by which fields are present (`value` vs
//! `values`, `id` vs `where`); a payload carrying both is rejected.

use super::filter::Filter;
use super::patch::Patch;
use crate::core::{EntityError, Record, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SingleInsertCommand {
    pub entity_type: String,
    pub value: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MultiInsertCommand {
    pub entity_type: String,
    pub values: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertCommand {
    Single(SingleInsertCommand),
    Multi(MultiInsertCommand),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdUpdateCommand {
    pub entity_type: String,
    pub id: String,
    pub operation: Patch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MultiUpdateCommand {
    pub entity_type: String,
    #[serde(rename = "where")]
    pub filter: Filter,
    pub operation: Patch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateCommand {
    ById(IdUpdateCommand),
    Multi(MultiUpdateCommand),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdDeleteCommand {
    pub entity_type: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MultiDeleteCommand {
    pub entity_type: String,
    #[serde(rename = "where")]
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeleteCommand {
    ById(IdDeleteCommand),
    Multi(MultiDeleteCommand),
}

impl SingleInsertCommand {
    pub fn new(entity_type: impl Into<String>, value: Record) -> Self {
        Self {
            entity_type: entity_type.into(),
            value,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_entity_type(&self.entity_type)
    }
}

impl MultiInsertCommand {
    pub fn new(entity_type: impl Into<String>, values: Vec<Record>) -> Self {
        Self {
            entity_type: entity_type.into(),
            values,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_entity_type(&self.entity_type)?;
        if self.values.is_empty() {
            return Err(EntityError::InvalidCommand(format!(
                "multi insert into '{}' has no values",
                self.entity_type
            )));
        }
        Ok(())
    }
}

impl InsertCommand {
    pub fn entity_type(&self) -> &str {
        match self {
            InsertCommand::Single(cmd) => &cmd.entity_type,
            InsertCommand::Multi(cmd) => &cmd.entity_type,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            InsertCommand::Single(cmd) => cmd.validate(),
            InsertCommand::Multi(cmd) => cmd.validate(),
        }
    }
}

impl From<SingleInsertCommand> for InsertCommand {
    fn from(cmd: SingleInsertCommand) -> Self {
        InsertCommand::Single(cmd)
    }
}

impl From<MultiInsertCommand> for InsertCommand {
    fn from(cmd: MultiInsertCommand) -> Self {
        InsertCommand::Multi(cmd)
    }
}

impl IdUpdateCommand {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>, operation: Patch) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            operation,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_entity_type(&self.entity_type)?;
        check_id(&self.id)
    }
}

impl MultiUpdateCommand {
    pub fn new(entity_type: impl Into<String>, filter: Filter, operation: Patch) -> Self {
        Self {
            entity_type: entity_type.into(),
            filter,
            operation,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_entity_type(&self.entity_type)
    }
}

impl UpdateCommand {
    pub fn entity_type(&self) -> &str {
        match self {
            UpdateCommand::ById(cmd) => &cmd.entity_type,
            UpdateCommand::Multi(cmd) => &cmd.entity_type,
        }
    }

    pub fn operation(&self) -> &Patch {
        match self {
            UpdateCommand::ById(cmd) => &cmd.operation,
            UpdateCommand::Multi(cmd) => &cmd.operation,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            UpdateCommand::ById(cmd) => cmd.validate(),
            UpdateCommand::Multi(cmd) => cmd.validate(),
        }
    }
}

impl From<IdUpdateCommand> for UpdateCommand {
    fn from(cmd: IdUpdateCommand) -> Self {
        UpdateCommand::ById(cmd)
    }
}

impl From<MultiUpdateCommand> for UpdateCommand {
    fn from(cmd: MultiUpdateCommand) -> Self {
        UpdateCommand::Multi(cmd)
    }
}

impl DeleteCommand {
    pub fn by_id(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        DeleteCommand::ById(IdDeleteCommand {
            entity_type: entity_type.into(),
            id: id.into(),
        })
    }

    pub fn by_filter(entity_type: impl Into<String>, filter: Filter) -> Self {
        DeleteCommand::Multi(MultiDeleteCommand {
            entity_type: entity_type.into(),
            filter,
        })
    }

    pub fn entity_type(&self) -> &str {
        match self {
            DeleteCommand::ById(cmd) => &cmd.entity_type,
            DeleteCommand::Multi(cmd) => &cmd.entity_type,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_entity_type(self.entity_type())?;
        if let DeleteCommand::ById(cmd) = self {
            check_id(&cmd.id)?;
        }
        Ok(())
    }
}

fn check_entity_type(entity_type: &str) -> Result<()> {
    if entity_type.is_empty() {
        return Err(EntityError::InvalidCommand("entity type is empty".into()));
    }
    Ok(())
}

fn check_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(EntityError::InvalidCommand("id is empty".into()));
    }
    Ok(())
}

impl fmt::Display for UpdateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateCommand::ById(cmd) => write!(f, "{}/{}", cmd.entity_type, cmd.id),
            UpdateCommand::Multi(cmd) => write!(f, "{} where {}", cmd.entity_type, cmd.filter),
        }
    }
}

impl fmt::Display for DeleteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteCommand::ById(cmd) => write!(f, "{}/{}", cmd.entity_type, cmd.id),
            DeleteCommand::Multi(cmd) => write!(f, "{} where {}", cmd.entity_type, cmd.filter),
        }
    }
}
