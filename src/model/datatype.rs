use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use super::{default_format_version, default_generation, ObjectId, FORMAT_VERSION, GENERATION};

/// Seeded, read-only reference data describing a column type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataType {
    #[serde(default = "default_format_version")]
    pub format_version: i64,
    #[serde(default = "default_generation")]
    pub generation: i64,
    pub id: ObjectId,
    pub name: String,
    #[serde(rename = "pg_dataType")]
    pub pg_data_type: i64,
    #[serde(rename = "pg_dataTypeName")]
    pub pg_data_type_name: String,
    #[serde(rename = "pg_dataTypeQualifiedName")]
    pub pg_data_type_qualified_name: String,
}

impl DataType {
    fn builtin(id: ObjectId, name: &str, pg_name: &str, qualified_name: &str) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: GENERATION,
            id,
            name: name.to_string(),
            pg_data_type: id,
            pg_data_type_name: pg_name.to_string(),
            pg_data_type_qualified_name: qualified_name.to_string(),
        }
    }
}

lazy_static! {
    // Ids are the PostgreSQL type OIDs.
    pub static ref BUILTIN_DATA_TYPES: Vec<DataType> = vec![
        DataType::builtin(23, "INT32", "integer", "int4"),
        DataType::builtin(20, "INT64", "bigint", "int8"),
        DataType::builtin(700, "FLOAT32", "real", "float4"),
        DataType::builtin(701, "FLOAT64", "double precision", "float8"),
        DataType::builtin(1042, "CHAR", "char", "bpchar"),
        DataType::builtin(1043, "VARCHAR", "varchar", "varchar"),
        DataType::builtin(1700, "NUMERIC", "numeric", "numeric"),
        DataType::builtin(1082, "DATE", "date", "date"),
        DataType::builtin(1083, "TIME", "time", "time"),
        DataType::builtin(1266, "TIMETZ", "timetz", "timetz"),
        DataType::builtin(1114, "TIMESTAMP", "timestamp", "timestamp"),
        DataType::builtin(1184, "TIMESTAMPTZ", "timestamptz", "timestamptz"),
        DataType::builtin(1186, "INTERVAL", "interval", "interval"),
    ];
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use serde_json::json;

    use super::BUILTIN_DATA_TYPES;

    #[test]
    fn test_builtin_data_types_are_unique() {
        assert!(BUILTIN_DATA_TYPES.iter().map(|t| t.id).all_unique());
        assert!(BUILTIN_DATA_TYPES.iter().map(|t| &t.name).all_unique());
    }

    #[test]
    fn test_data_type_wire_names() {
        let int4 = BUILTIN_DATA_TYPES.iter().find(|t| t.id == 23).unwrap();
        assert_eq!(
            serde_json::to_value(int4).unwrap(),
            json!({
                "formatVersion": 1,
                "generation": 1,
                "id": 23,
                "name": "INT32",
                "pg_dataType": 23,
                "pg_dataTypeName": "integer",
                "pg_dataTypeQualifiedName": "int4"
            })
        );
    }
}
