use async_trait::async_trait;

use super::{bind_key, interpret_error, prepare_statements, KeyedStatements, SharedConnection};
use crate::dao::{Dao, DataTypesDao, KeyKind, ObjectKey};
use crate::error::Result;
use crate::model::{DataType, ObjectId};

const COLUMNS: &str = "format_version, generation, id, name, pg_data_type, pg_data_type_name, \
                       pg_data_type_qualified_name";

#[derive(sqlx::FromRow, Debug)]
struct DataTypeRow {
    format_version: i64,
    generation: i64,
    id: ObjectId,
    name: String,
    pg_data_type: i64,
    pg_data_type_name: String,
    pg_data_type_qualified_name: String,
}

impl From<DataTypeRow> for DataType {
    fn from(row: DataTypeRow) -> Self {
        Self {
            format_version: row.format_version,
            generation: row.generation,
            id: row.id,
            name: row.name,
            pg_data_type: row.pg_data_type,
            pg_data_type_name: row.pg_data_type_name,
            pg_data_type_qualified_name: row.pg_data_type_qualified_name,
        }
    }
}

#[derive(Debug)]
pub struct PgDataTypesDao {
    conn: SharedConnection,
    select: KeyedStatements,
    select_all: String,
}

impl PgDataTypesDao {
    pub(crate) fn new(conn: SharedConnection, schema: &str) -> Self {
        Self {
            conn,
            select: KeyedStatements::new(
                &[
                    (KeyKind::Id, "id = $1"),
                    (KeyKind::Name, "name = $1"),
                    (KeyKind::QualifiedName, "pg_data_type_qualified_name = $1"),
                ],
                |predicate| format!("SELECT {COLUMNS} FROM {schema}.datatypes WHERE {predicate}"),
            ),
            select_all: format!("SELECT {COLUMNS} FROM {schema}.datatypes ORDER BY id"),
        }
    }
}

#[async_trait]
impl Dao for PgDataTypesDao {
    async fn prepare(&self) -> Result<()> {
        let mut statements = vec![self.select_all.as_str()];
        statements.extend(self.select.iter());
        prepare_statements(&self.conn, &statements).await
    }
}

#[async_trait]
impl DataTypesDao for PgDataTypesDao {
    async fn select_datatype(&self, key: ObjectKey<'_>) -> Result<DataType> {
        let sql = self.select.get(key)?;

        let mut conn = self.conn.lock().await;
        let row: Option<DataTypeRow> = bind_key(sqlx::query_as(sql), key)
            .fetch_optional(&mut *conn)
            .await
            .map_err(interpret_error)?;
        row.map(DataType::from).ok_or_else(|| key.not_found())
    }

    async fn select_all_datatypes(&self) -> Result<Vec<DataType>> {
        let mut conn = self.conn.lock().await;
        let rows: Vec<DataTypeRow> = sqlx::query_as(&self.select_all)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;
        Ok(rows.into_iter().map(DataType::from).collect())
    }
}
