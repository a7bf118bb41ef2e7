use serde::{Deserialize, Serialize};

use super::{default_format_version, default_generation, ObjectId};

/// Read-only projection of a backend authorization principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "formatVersion", default = "default_format_version")]
    pub format_version: i64,
    #[serde(default = "default_generation")]
    pub generation: i64,
    pub id: ObjectId,
    pub name: String,
    #[serde(rename = "super", default)]
    pub is_super: bool,
    #[serde(default)]
    pub inherit: bool,
    #[serde(default)]
    pub createrole: bool,
    #[serde(default)]
    pub createdb: bool,
    #[serde(default)]
    pub canlogin: bool,
    #[serde(default)]
    pub replication: bool,
    #[serde(default)]
    pub bypassrls: bool,
    #[serde(default = "unlimited_connections")]
    pub connlimit: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validuntil: Option<String>,
}

fn unlimited_connections() -> i64 {
    -1
}
