//! Device properties — named lists of strings stored by the naming authority.

use serde::{Deserialize, Serialize};

/// A device property and its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub name: String,
    pub values: Vec<String>,
}
