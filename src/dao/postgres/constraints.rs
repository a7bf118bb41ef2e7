use async_trait::async_trait;

use super::{decode_code, interpret_error, prepare_statements, SharedConnection};
use crate::dao::{ConstraintsDao, Dao, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{Constraint, ObjectId};

const COLUMNS: &str = "format_version, generation, id, name, table_id, constraint_type, \
                       columns, columns_id, index_id, expression, pk_table, pk_columns, \
                       pk_columns_id, fk_match_type, fk_delete_action, fk_update_action";

#[derive(sqlx::FromRow, Debug)]
struct ConstraintRow {
    format_version: i64,
    generation: i64,
    id: ObjectId,
    name: Option<String>,
    table_id: ObjectId,
    constraint_type: i64,
    columns: Vec<i64>,
    columns_id: Vec<ObjectId>,
    index_id: Option<ObjectId>,
    expression: Option<String>,
    pk_table: Option<String>,
    pk_columns: Vec<i64>,
    pk_columns_id: Vec<ObjectId>,
    fk_match_type: Option<i64>,
    fk_delete_action: Option<i64>,
    fk_update_action: Option<i64>,
}

impl TryFrom<ConstraintRow> for Constraint {
    type Error = ErrorCode;

    fn try_from(row: ConstraintRow) -> Result<Self> {
        Ok(Self {
            format_version: row.format_version,
            generation: row.generation,
            id: Some(row.id),
            name: row.name,
            table_id: Some(row.table_id),
            constraint_type: Some(decode_code(row.constraint_type)?),
            columns: row.columns,
            columns_id: row.columns_id,
            index_id: row.index_id,
            expression: row.expression,
            pk_table: row.pk_table,
            pk_columns: row.pk_columns,
            pk_columns_id: row.pk_columns_id,
            fk_match_type: row.fk_match_type.map(decode_code).transpose()?,
            fk_delete_action: row.fk_delete_action.map(decode_code).transpose()?,
            fk_update_action: row.fk_update_action.map(decode_code).transpose()?,
        })
    }
}

#[derive(Debug)]
pub struct PgConstraintsDao {
    conn: SharedConnection,
    insert: String,
    select_by_id: String,
    select_by_table_id: String,
    select_all: String,
    delete_by_id: String,
    delete_by_table_id: String,
}

impl PgConstraintsDao {
    pub(crate) fn new(conn: SharedConnection, schema: &str) -> Self {
        Self {
            conn,
            insert: format!(
                "INSERT INTO {schema}.constraints ({COLUMNS}) VALUES \
                 ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
                 RETURNING id"
            ),
            select_by_id: format!("SELECT {COLUMNS} FROM {schema}.constraints WHERE id = $1"),
            select_by_table_id: format!(
                "SELECT {COLUMNS} FROM {schema}.constraints WHERE table_id = $1 ORDER BY id"
            ),
            select_all: format!("SELECT {COLUMNS} FROM {schema}.constraints ORDER BY id"),
            delete_by_id: format!("DELETE FROM {schema}.constraints WHERE id = $1 RETURNING id"),
            delete_by_table_id: format!(
                "DELETE FROM {schema}.constraints WHERE table_id = $1 RETURNING id"
            ),
        }
    }
}

#[async_trait]
impl Dao for PgConstraintsDao {
    async fn prepare(&self) -> Result<()> {
        prepare_statements(
            &self.conn,
            &[
                self.insert.as_str(),
                self.select_by_id.as_str(),
                self.select_by_table_id.as_str(),
                self.select_all.as_str(),
                self.delete_by_id.as_str(),
                self.delete_by_table_id.as_str(),
            ],
        )
        .await
    }
}

#[async_trait]
impl ConstraintsDao for PgConstraintsDao {
    async fn insert_constraint(&self, constraint: &Constraint) -> Result<ObjectId> {
        let id = constraint.id.ok_or(ErrorCode::InvalidParameter)?;

        let mut conn = self.conn.lock().await;
        let (inserted,): (ObjectId,) = sqlx::query_as(&self.insert)
            .bind(constraint.format_version)
            .bind(constraint.generation)
            .bind(id)
            .bind(&constraint.name)
            .bind(constraint.table_id)
            .bind(constraint.constraint_type.map(i64::from))
            .bind(&constraint.columns)
            .bind(&constraint.columns_id)
            .bind(constraint.index_id)
            .bind(&constraint.expression)
            .bind(&constraint.pk_table)
            .bind(&constraint.pk_columns)
            .bind(&constraint.pk_columns_id)
            .bind(constraint.fk_match_type.map(i64::from))
            .bind(constraint.fk_delete_action.map(i64::from))
            .bind(constraint.fk_update_action.map(i64::from))
            .fetch_one(&mut *conn)
            .await
            .map_err(interpret_error)?;
        Ok(inserted)
    }

    async fn select_constraint(&self, key: ObjectKey<'_>) -> Result<Constraint> {
        let ObjectKey::Id(id) = key else {
            return Err(ErrorCode::InvalidParameter);
        };

        let mut conn = self.conn.lock().await;
        let row: Option<ConstraintRow> = sqlx::query_as(&self.select_by_id)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(interpret_error)?;
        row.ok_or_else(|| key.not_found())?.try_into()
    }

    async fn select_constraints(&self, key: ObjectKey<'_>) -> Result<Vec<Constraint>> {
        let ObjectKey::TableId(table_id) = key else {
            return Err(ErrorCode::InvalidParameter);
        };

        let mut conn = self.conn.lock().await;
        let rows: Vec<ConstraintRow> = sqlx::query_as(&self.select_by_table_id)
            .bind(table_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;
        rows.into_iter().map(Constraint::try_from).collect()
    }

    async fn select_all_constraints(&self) -> Result<Vec<Constraint>> {
        let mut conn = self.conn.lock().await;
        let rows: Vec<ConstraintRow> = sqlx::query_as(&self.select_all)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;
        rows.into_iter().map(Constraint::try_from).collect()
    }

    async fn delete_constraints(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>> {
        let (sql, id) = match key {
            ObjectKey::Id(id) => (&self.delete_by_id, id),
            ObjectKey::TableId(table_id) => (&self.delete_by_table_id, table_id),
            _ => return Err(ErrorCode::InvalidParameter),
        };

        let mut conn = self.conn.lock().await;
        let deleted: Vec<(ObjectId,)> = sqlx::query_as(sql)
            .bind(id)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;

        if deleted.is_empty() && matches!(key, ObjectKey::Id(_)) {
            return Err(key.not_found());
        }
        Ok(deleted.into_iter().map(|(id,)| id).collect())
    }
}
