use serde::{Deserialize, Serialize};

use super::{default_format_version, default_generation, ObjectId, FORMAT_VERSION, GENERATION};

integer_enum!(ConstraintType {
    PrimaryKey = 0,
    Unique = 1,
    Check = 2,
    ForeignKey = 3,
    Trigger = 4,
    Exclude = 5,
});

integer_enum!(
    /// How referencing rows are matched against the referenced key
    MatchType {
        Simple = 0,
        Full = 1,
        Partial = 2,
    }
);

integer_enum!(
    /// Referential action on delete/update of the referenced row
    ActionType {
        NoAction = 0,
        Restrict = 1,
        Cascade = 2,
        SetNull = 3,
        SetDefault = 4,
    }
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    #[serde(default = "default_format_version")]
    pub format_version: i64,
    #[serde(default = "default_generation")]
    pub generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<ObjectId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub constraint_type: Option<ConstraintType>,
    #[serde(default)]
    pub columns: Vec<i64>,
    #[serde(default)]
    pub columns_id: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_table: Option<String>,
    #[serde(default)]
    pub pk_columns: Vec<i64>,
    #[serde(default)]
    pub pk_columns_id: Vec<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk_match_type: Option<MatchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk_delete_action: Option<ActionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk_update_action: Option<ActionType>,
}

impl Default for Constraint {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: GENERATION,
            id: None,
            name: None,
            table_id: None,
            constraint_type: None,
            columns: vec![],
            columns_id: vec![],
            index_id: None,
            expression: None,
            pk_table: None,
            pk_columns: vec![],
            pk_columns_id: vec![],
            fk_match_type: None,
            fk_delete_action: None,
            fk_update_action: None,
        }
    }
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, columns: Vec<i64>) -> Self {
        Self {
            constraint_type: Some(constraint_type),
            columns,
            ..Default::default()
        }
    }
}
