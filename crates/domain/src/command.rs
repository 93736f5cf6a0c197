//! Commands — description and execution result.

use serde::{Deserialize, Serialize};

use crate::attribute::{DataType, DataValue, DispLevel};

/// Description of a command a device accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub in_type: DataType,
    pub out_type: DataType,
    pub in_type_desc: String,
    pub out_type_desc: String,
    pub level: DispLevel,
}

/// Outcome of executing a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub name: String,
    /// `None` for commands returning `DevVoid`.
    pub output: Option<DataValue>,
}
