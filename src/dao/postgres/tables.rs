use async_trait::async_trait;

use super::{
    bind_key, interpret_error, prepare_statements, KeyedStatements, SharedConnection,
};
use crate::dao::{Dao, KeyKind, ObjectKey, TablesDao};
use crate::error::{ErrorCode, Result};
use crate::model::{ObjectId, Table};

const COLUMNS: &str =
    "format_version, generation, id, name, namespace, primary_key, reltuples, owner_role_id, acl";

#[derive(sqlx::FromRow, Debug)]
struct TableRow {
    format_version: i64,
    generation: i64,
    id: ObjectId,
    name: String,
    namespace: Option<String>,
    primary_key: Vec<i64>,
    reltuples: Option<f32>,
    owner_role_id: Option<ObjectId>,
    acl: Vec<String>,
}

impl From<TableRow> for Table {
    fn from(row: TableRow) -> Self {
        Self {
            format_version: row.format_version,
            generation: row.generation,
            id: Some(row.id),
            name: row.name,
            namespace: row.namespace,
            primary_key: row.primary_key,
            tuples: row.reltuples,
            owner_role_id: row.owner_role_id,
            acl: row.acl,
            ..Default::default()
        }
    }
}

const ID_OR_NAME: &[(KeyKind, &str)] = &[(KeyKind::Id, "id = $1"), (KeyKind::Name, "name = $1")];

#[derive(Debug)]
pub struct PgTablesDao {
    conn: SharedConnection,
    insert: String,
    select: KeyedStatements,
    select_all: String,
    update_reltuples: KeyedStatements,
    delete: KeyedStatements,
}

impl PgTablesDao {
    pub(crate) fn new(conn: SharedConnection, schema: &str) -> Self {
        Self {
            conn,
            insert: format!(
                "INSERT INTO {schema}.tables ({COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, NULL, $7, $8) RETURNING id"
            ),
            select: KeyedStatements::new(ID_OR_NAME, |predicate| {
                format!("SELECT {COLUMNS} FROM {schema}.tables WHERE {predicate}")
            }),
            select_all: format!("SELECT {COLUMNS} FROM {schema}.tables ORDER BY id"),
            update_reltuples: KeyedStatements::new(ID_OR_NAME, |predicate| {
                format!("UPDATE {schema}.tables SET reltuples = $2 WHERE {predicate} RETURNING id")
            }),
            delete: KeyedStatements::new(ID_OR_NAME, |predicate| {
                format!("DELETE FROM {schema}.tables WHERE {predicate} RETURNING id")
            }),
        }
    }
}

/// A unique violation on the name is reported separately from other
/// conflicts.
fn insert_error(error: sqlx::Error) -> ErrorCode {
    let duplicate_name = matches!(
        &error,
        sqlx::Error::Database(d) if d.constraint() == Some("tables_name_key")
    );

    match interpret_error(error) {
        ErrorCode::AlreadyExists if duplicate_name => ErrorCode::TableNameAlreadyExists,
        other => other,
    }
}

#[async_trait]
impl Dao for PgTablesDao {
    async fn prepare(&self) -> Result<()> {
        let mut statements = vec![self.insert.as_str(), self.select_all.as_str()];
        statements.extend(self.select.iter());
        statements.extend(self.update_reltuples.iter());
        statements.extend(self.delete.iter());
        prepare_statements(&self.conn, &statements).await
    }
}

#[async_trait]
impl TablesDao for PgTablesDao {
    async fn insert_table(&self, table: &Table) -> Result<ObjectId> {
        let id = table.id.ok_or(ErrorCode::InvalidParameter)?;

        let mut conn = self.conn.lock().await;
        let (inserted,): (ObjectId,) = sqlx::query_as(&self.insert)
            .bind(table.format_version)
            .bind(table.generation)
            .bind(id)
            .bind(&table.name)
            .bind(&table.namespace)
            .bind(&table.primary_key)
            .bind(table.owner_role_id)
            .bind(&table.acl)
            .fetch_one(&mut *conn)
            .await
            .map_err(insert_error)?;
        Ok(inserted)
    }

    async fn select_table(&self, key: ObjectKey<'_>) -> Result<Table> {
        let sql = self.select.get(key)?;

        let mut conn = self.conn.lock().await;
        let row: Option<TableRow> = bind_key(sqlx::query_as(sql), key)
            .fetch_optional(&mut *conn)
            .await
            .map_err(interpret_error)?;
        row.map(Table::from).ok_or_else(|| key.not_found())
    }

    async fn select_all_tables(&self) -> Result<Vec<Table>> {
        let mut conn = self.conn.lock().await;
        let rows: Vec<TableRow> = sqlx::query_as(&self.select_all)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;
        Ok(rows.into_iter().map(Table::from).collect())
    }

    async fn update_reltuples(&self, key: ObjectKey<'_>, tuples: f32) -> Result<ObjectId> {
        let sql = self.update_reltuples.get(key)?;

        let mut conn = self.conn.lock().await;
        let updated: Option<(ObjectId,)> = bind_key(sqlx::query_as(sql), key)
            .bind(tuples)
            .fetch_optional(&mut *conn)
            .await
            .map_err(interpret_error)?;
        updated.map(|(id,)| id).ok_or_else(|| key.not_found())
    }

    async fn delete_table(&self, key: ObjectKey<'_>) -> Result<ObjectId> {
        let sql = self.delete.get(key)?;

        let mut conn = self.conn.lock().await;
        let deleted: Option<(ObjectId,)> = bind_key(sqlx::query_as(sql), key)
            .fetch_optional(&mut *conn)
            .await
            .map_err(interpret_error)?;
        deleted.map(|(id,)| id).ok_or_else(|| key.not_found())
    }
}
