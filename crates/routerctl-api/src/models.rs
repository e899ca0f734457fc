// ── Library row models ──
//
// Typed views over rows returned by the standard `print` commands.
// Every field is optional: the router omits properties that are unset
// or excluded by `.proplist`.

use serde::{Deserialize, Serialize};

use crate::sentence::{FromRow, Row};

/// A row of `/interface/print`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub disabled: Option<bool>,
}

impl FromRow for Interface {
    fn from_row(row: &Row) -> Self {
        Self {
            name: row.string("name"),
            kind: row.string("type"),
            disabled: row.boolean("disabled"),
        }
    }
}

/// A row of `/ip/address/print`. `address` is in `ip/prefix` form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: Option<String>,
    pub interface: Option<String>,
}

impl FromRow for Address {
    fn from_row(row: &Row) -> Self {
        Self {
            address: row.string("address"),
            interface: row.string("interface"),
        }
    }
}
