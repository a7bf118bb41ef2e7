use serde::{Deserialize, Serialize};

use super::{default_format_version, default_generation, ObjectId, FORMAT_VERSION, GENERATION};

integer_enum!(AccessMethod {
    Default = 0,
    MassTree = 1,
});

integer_enum!(
    /// Per-key sort option. Bit 0 selects descending order and bit 1 puts
    /// nulls first; `Default` leaves both to the engine.
    IndexDirection {
        AscNullsLast = 0,
        AscNullsFirst = 1,
        DescNullsLast = 2,
        DescNullsFirst = 3,
        Default = 15,
    }
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    #[serde(default = "default_format_version")]
    pub format_version: i64,
    #[serde(default = "default_generation")]
    pub generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<ObjectId>,
    #[serde(default)]
    pub acl: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_method: Option<AccessMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_columns: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_key_columns: Option<i64>,
    #[serde(rename = "IsUnique", default)]
    pub is_unique: bool,
    #[serde(rename = "IsPrimary", default)]
    pub is_primary: bool,
    /// Ordinal positions of the indexed columns
    #[serde(rename = "columns", default)]
    pub keys: Vec<i64>,
    #[serde(rename = "columnsId", default)]
    pub keys_id: Vec<ObjectId>,
    #[serde(default)]
    pub options: Vec<IndexDirection>,
}

impl Default for Index {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: GENERATION,
            id: None,
            name: String::new(),
            namespace: None,
            owner_id: None,
            acl: vec![],
            table_id: None,
            access_method: None,
            number_of_columns: None,
            number_of_key_columns: None,
            is_unique: false,
            is_primary: false,
            keys: vec![],
            keys_id: vec![],
            options: vec![],
        }
    }
}
