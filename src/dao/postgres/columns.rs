use async_trait::async_trait;
use sqlx::types::Json;

use super::{
    bind_key, decode_code, interpret_error, prepare_statements, KeyedStatements,
    SharedConnection,
};
use crate::dao::{ColumnsDao, Dao, KeyKind, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{Column, DataLength, ObjectId};

const COLUMNS: &str = "format_version, generation, id, name, table_id, ordinal_position, \
                       data_type_id, data_length, varying, is_nullable, default_expr, direction";

#[derive(sqlx::FromRow, Debug)]
struct ColumnRow {
    format_version: i64,
    generation: i64,
    id: ObjectId,
    name: String,
    table_id: ObjectId,
    ordinal_position: i64,
    data_type_id: ObjectId,
    data_length: Option<Json<DataLength>>,
    varying: Option<bool>,
    is_nullable: bool,
    default_expr: Option<String>,
    direction: Option<i64>,
}

impl TryFrom<ColumnRow> for Column {
    type Error = ErrorCode;

    fn try_from(row: ColumnRow) -> Result<Self> {
        Ok(Self {
            format_version: row.format_version,
            generation: row.generation,
            id: Some(row.id),
            name: row.name,
            table_id: Some(row.table_id),
            ordinal_position: Some(row.ordinal_position),
            data_type_id: Some(row.data_type_id),
            data_length: row.data_length.map(|Json(length)| length),
            varying: row.varying,
            nullable: Some(row.is_nullable),
            default_expr: row.default_expr,
            direction: row.direction.map(decode_code).transpose()?,
        })
    }
}

const KEYS: &[(KeyKind, &str)] = &[
    (KeyKind::TableId, "table_id = $1"),
    (KeyKind::Id, "id = $1"),
];

#[derive(Debug)]
pub struct PgColumnsDao {
    conn: SharedConnection,
    insert: String,
    select: KeyedStatements,
    delete: KeyedStatements,
}

impl PgColumnsDao {
    pub(crate) fn new(conn: SharedConnection, schema: &str) -> Self {
        Self {
            conn,
            insert: format!(
                "INSERT INTO {schema}.columns ({COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id"
            ),
            select: KeyedStatements::new(KEYS, |predicate| {
                format!(
                    "SELECT {COLUMNS} FROM {schema}.columns WHERE {predicate} \
                     ORDER BY ordinal_position"
                )
            }),
            delete: KeyedStatements::new(KEYS, |predicate| {
                format!("DELETE FROM {schema}.columns WHERE {predicate} RETURNING id")
            }),
        }
    }
}

#[async_trait]
impl Dao for PgColumnsDao {
    async fn prepare(&self) -> Result<()> {
        let mut statements = vec![self.insert.as_str()];
        statements.extend(self.select.iter());
        statements.extend(self.delete.iter());
        prepare_statements(&self.conn, &statements).await
    }
}

#[async_trait]
impl ColumnsDao for PgColumnsDao {
    async fn insert_column(&self, column: &Column) -> Result<ObjectId> {
        let id = column.id.ok_or(ErrorCode::InvalidParameter)?;

        let mut conn = self.conn.lock().await;
        let (inserted,): (ObjectId,) = sqlx::query_as(&self.insert)
            .bind(column.format_version)
            .bind(column.generation)
            .bind(id)
            .bind(&column.name)
            .bind(column.table_id)
            .bind(column.ordinal_position)
            .bind(column.data_type_id)
            .bind(column.data_length.as_ref().map(Json))
            .bind(column.varying)
            .bind(column.nullable)
            .bind(&column.default_expr)
            .bind(column.direction.map(i64::from))
            .fetch_one(&mut *conn)
            .await
            .map_err(interpret_error)?;
        Ok(inserted)
    }

    async fn select_columns(&self, key: ObjectKey<'_>) -> Result<Vec<Column>> {
        let sql = self.select.get(key)?;

        let mut conn = self.conn.lock().await;
        let rows: Vec<ColumnRow> = bind_key(sqlx::query_as(sql), key)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;

        if rows.is_empty() && !matches!(key, ObjectKey::TableId(_)) {
            return Err(key.not_found());
        }
        rows.into_iter().map(Column::try_from).collect()
    }

    async fn delete_columns(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>> {
        let sql = self.delete.get(key)?;

        let mut conn = self.conn.lock().await;
        let deleted: Vec<(ObjectId,)> = bind_key(sqlx::query_as(sql), key)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;

        if deleted.is_empty() && !matches!(key, ObjectKey::TableId(_)) {
            return Err(key.not_found());
        }
        Ok(deleted.into_iter().map(|(id,)| id).collect())
    }
}
