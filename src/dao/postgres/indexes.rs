use async_trait::async_trait;

use super::{
    bind_key, decode_code, interpret_error, prepare_statements, KeyedStatements,
    SharedConnection,
};
use crate::dao::{Dao, IndexesDao, KeyKind, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{Index, ObjectId};

const COLUMNS: &str = "format_version, generation, id, name, namespace, owner_id, acl, \
                       table_id, access_method, number_of_columns, number_of_key_columns, \
                       is_unique, is_primary, keys, keys_id, options";

#[derive(sqlx::FromRow, Debug)]
struct IndexRow {
    format_version: i64,
    generation: i64,
    id: ObjectId,
    name: String,
    namespace: Option<String>,
    owner_id: Option<ObjectId>,
    acl: Vec<String>,
    table_id: ObjectId,
    access_method: Option<i64>,
    number_of_columns: Option<i64>,
    number_of_key_columns: Option<i64>,
    is_unique: bool,
    is_primary: bool,
    keys: Vec<i64>,
    keys_id: Vec<ObjectId>,
    options: Vec<i64>,
}

impl TryFrom<IndexRow> for Index {
    type Error = ErrorCode;

    fn try_from(row: IndexRow) -> Result<Self> {
        Ok(Self {
            format_version: row.format_version,
            generation: row.generation,
            id: Some(row.id),
            name: row.name,
            namespace: row.namespace,
            owner_id: row.owner_id,
            acl: row.acl,
            table_id: Some(row.table_id),
            access_method: row.access_method.map(decode_code).transpose()?,
            number_of_columns: row.number_of_columns,
            number_of_key_columns: row.number_of_key_columns,
            is_unique: row.is_unique,
            is_primary: row.is_primary,
            keys: row.keys,
            keys_id: row.keys_id,
            options: row
                .options
                .into_iter()
                .map(decode_code)
                .collect::<Result<_>>()?,
        })
    }
}

const ID_OR_NAME: &[(KeyKind, &str)] = &[(KeyKind::Id, "id = $1"), (KeyKind::Name, "name = $1")];

#[derive(Debug)]
pub struct PgIndexesDao {
    conn: SharedConnection,
    insert: String,
    select: KeyedStatements,
    select_all: String,
    delete: KeyedStatements,
}

impl PgIndexesDao {
    pub(crate) fn new(conn: SharedConnection, schema: &str) -> Self {
        Self {
            conn,
            insert: format!(
                "INSERT INTO {schema}.indexes ({COLUMNS}) VALUES \
                 ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
                 RETURNING id"
            ),
            select: KeyedStatements::new(ID_OR_NAME, |predicate| {
                format!("SELECT {COLUMNS} FROM {schema}.indexes WHERE {predicate}")
            }),
            select_all: format!("SELECT {COLUMNS} FROM {schema}.indexes ORDER BY id"),
            delete: KeyedStatements::new(ID_OR_NAME, |predicate| {
                format!("DELETE FROM {schema}.indexes WHERE {predicate} RETURNING id")
            }),
        }
    }
}

#[async_trait]
impl Dao for PgIndexesDao {
    async fn prepare(&self) -> Result<()> {
        let mut statements = vec![self.insert.as_str(), self.select_all.as_str()];
        statements.extend(self.select.iter());
        statements.extend(self.delete.iter());
        prepare_statements(&self.conn, &statements).await
    }
}

#[async_trait]
impl IndexesDao for PgIndexesDao {
    async fn insert_index(&self, index: &Index) -> Result<ObjectId> {
        let id = index.id.ok_or(ErrorCode::InvalidParameter)?;
        let options: Vec<i64> = index.options.iter().copied().map(i64::from).collect();

        let mut conn = self.conn.lock().await;
        let (inserted,): (ObjectId,) = sqlx::query_as(&self.insert)
            .bind(index.format_version)
            .bind(index.generation)
            .bind(id)
            .bind(&index.name)
            .bind(&index.namespace)
            .bind(index.owner_id)
            .bind(&index.acl)
            .bind(index.table_id)
            .bind(index.access_method.map(i64::from))
            .bind(index.number_of_columns)
            .bind(index.number_of_key_columns)
            .bind(index.is_unique)
            .bind(index.is_primary)
            .bind(&index.keys)
            .bind(&index.keys_id)
            .bind(options)
            .fetch_one(&mut *conn)
            .await
            .map_err(interpret_error)?;
        Ok(inserted)
    }

    async fn select_index(&self, key: ObjectKey<'_>) -> Result<Index> {
        let sql = self.select.get(key)?;

        let mut conn = self.conn.lock().await;
        let row: Option<IndexRow> = bind_key(sqlx::query_as(sql), key)
            .fetch_optional(&mut *conn)
            .await
            .map_err(interpret_error)?;
        row.ok_or_else(|| key.not_found())?.try_into()
    }

    async fn select_all_indexes(&self) -> Result<Vec<Index>> {
        let mut conn = self.conn.lock().await;
        let rows: Vec<IndexRow> = sqlx::query_as(&self.select_all)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;
        rows.into_iter().map(Index::try_from).collect()
    }

    async fn delete_index(&self, key: ObjectKey<'_>) -> Result<ObjectId> {
        let sql = self.delete.get(key)?;

        let mut conn = self.conn.lock().await;
        let deleted: Option<(ObjectId,)> = bind_key(sqlx::query_as(sql), key)
            .fetch_optional(&mut *conn)
            .await
            .map_err(interpret_error)?;
        deleted.map(|(id,)| id).ok_or_else(|| key.not_found())
    }
}
