use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    default_format_version, default_generation, Constraint, ObjectId, FORMAT_VERSION,
    GENERATION,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
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
    /// Ordinal positions of the primary key columns, in key order
    #[serde(default)]
    pub primary_key: Vec<i64>,
    /// Row count estimate, maintained by the statistics path only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuples: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_role_id: Option<ObjectId>,
    #[serde(default)]
    pub acl: Vec<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: GENERATION,
            id: None,
            name: String::new(),
            namespace: None,
            primary_key: vec![],
            tuples: None,
            owner_role_id: None,
            acl: vec![],
            columns: vec![],
            constraints: vec![],
        }
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Copy of the table row without its child collections.
    pub(crate) fn without_children(&self) -> Self {
        Self {
            columns: vec![],
            constraints: vec![],
            ..self.clone()
        }
    }
}

integer_enum!(
    /// Sort order of a column
    Direction {
        Default = 0,
        Ascendant = 1,
        Descendant = 2,
    }
);

/// Declared length of a column type: a single value, or one value per
/// dimension for multi-dimensional variable-length types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataLength {
    Scalar(i64),
    Dimensions(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(default = "default_format_version")]
    pub format_version: i64,
    #[serde(default = "default_generation")]
    pub generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal_position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_length: Option<DataLength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varying: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl Default for Column {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: GENERATION,
            id: None,
            name: String::new(),
            table_id: None,
            ordinal_position: None,
            data_type_id: None,
            data_length: None,
            varying: None,
            nullable: None,
            default_expr: None,
            direction: None,
        }
    }
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        ordinal_position: i64,
        data_type_id: ObjectId,
        nullable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            ordinal_position: Some(ordinal_position),
            data_type_id: Some(data_type_id),
            nullable: Some(nullable),
            ..Default::default()
        }
    }
}

/// Privileges held by a role, per table name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableAcls {
    pub tables: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Column, DataLength, Direction, Table};

    #[test]
    fn test_table_wire_format() {
        let mut table = Table::new("t1");
        table.id = Some(3);
        table.primary_key = vec![2, 1];
        table.acl = vec!["alice=arw/alice".to_string()];
        table.columns.push(Column {
            data_length: Some(DataLength::Dimensions(vec![8, 2])),
            varying: Some(true),
            direction: Some(Direction::Descendant),
            ..Column::new("c1", 1, 1043, false)
        });

        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(
            value,
            json!({
                "formatVersion": 1,
                "generation": 1,
                "id": 3,
                "name": "t1",
                "primaryKey": [2, 1],
                "acl": ["alice=arw/alice"],
                "columns": [{
                    "formatVersion": 1,
                    "generation": 1,
                    "name": "c1",
                    "ordinalPosition": 1,
                    "dataTypeId": 1043,
                    "dataLength": [8, 2],
                    "varying": true,
                    "nullable": false,
                    "direction": 2
                }],
                "constraints": []
            })
        );

        let parsed: Table = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_missing_versions_default_to_latest() {
        let table: Table =
            serde_json::from_value(json!({"name": "t1", "columns": [{"name": "c1"}]}))
                .unwrap();

        assert_eq!(table.format_version, 1);
        assert_eq!(table.generation, 1);
        assert_eq!(table.columns[0].generation, 1);
        assert_eq!(table.columns[0].data_type_id, None);
    }

    #[test]
    fn test_scalar_data_length() {
        let column: Column =
            serde_json::from_value(json!({"name": "c1", "dataLength": 32})).unwrap();
        assert_eq!(column.data_length, Some(DataLength::Scalar(32)));
    }

    #[test]
    fn test_unknown_direction_is_rejected() {
        let result =
            serde_json::from_value::<Column>(json!({"name": "c1", "direction": 7}));
        assert!(result.is_err());
    }
}
