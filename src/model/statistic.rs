use serde::{Deserialize, Serialize};

use super::{default_format_version, default_generation, ObjectId, FORMAT_VERSION, GENERATION};

/// Per-column statistic. Only the id, name, column id and the statistic body
/// are stored; the table id, column number and column name are filled in from
/// the owning column when the statistic is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStatistic {
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
    #[serde(
        rename = "columnNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ordinal_position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_statistic: Option<serde_json::Value>,
}

impl Default for ColumnStatistic {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: GENERATION,
            id: None,
            name: None,
            table_id: None,
            ordinal_position: None,
            column_id: None,
            column_name: None,
            column_statistic: None,
        }
    }
}

impl ColumnStatistic {
    /// The persisted part of the statistic.
    pub(crate) fn stored(&self) -> Self {
        Self {
            table_id: None,
            ordinal_position: None,
            column_name: None,
            ..self.clone()
        }
    }
}

/// Table-level statistic: the row count estimate of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatistic {
    #[serde(default = "default_format_version")]
    pub format_version: i64,
    #[serde(default = "default_generation")]
    pub generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuples: Option<f32>,
}

impl Default for TableStatistic {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: GENERATION,
            id: None,
            name: None,
            namespace: None,
            tuples: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ColumnStatistic;

    #[test]
    fn test_column_statistic_wire_names() {
        let statistic = ColumnStatistic {
            id: Some(4),
            table_id: Some(1),
            ordinal_position: Some(2),
            column_id: Some(7),
            column_name: Some("c2".to_string()),
            column_statistic: Some(json!({"histogram": [1, 2, 3]})),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&statistic).unwrap(),
            json!({
                "formatVersion": 1,
                "generation": 1,
                "id": 4,
                "tableId": 1,
                "columnNumber": 2,
                "columnId": 7,
                "columnName": "c2",
                "columnStatistic": {"histogram": [1, 2, 3]}
            })
        );

        let stored = serde_json::to_value(statistic.stored()).unwrap();
        assert_eq!(stored.get("tableId"), None);
        assert_eq!(stored.get("columnId"), Some(&json!(7)));
    }
}
