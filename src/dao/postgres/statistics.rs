use async_trait::async_trait;
use serde_json::Value;

use super::{bind_key, interpret_error, prepare_statements, KeyedStatements, SharedConnection};
use crate::dao::{Dao, KeyKind, ObjectKey, StatisticsDao};
use crate::error::{ErrorCode, Result};
use crate::model::{ColumnStatistic, ObjectId};

/// Statistic columns plus the ones joined in from the owning column.
const COLUMNS: &str = "s.format_version, s.generation, s.id, s.name, c.table_id, \
                       c.ordinal_position, s.column_id, c.name AS column_name, \
                       s.column_statistic";

const SINGLE_KEYS: &[(KeyKind, &str)] = &[
    (KeyKind::Id, "s.id = $1"),
    (KeyKind::Name, "s.name = $1"),
    (KeyKind::ColumnId, "s.column_id = $1"),
    (KeyKind::ColumnNumber, "c.table_id = $1 AND c.ordinal_position = $2"),
    (KeyKind::ColumnName, "c.table_id = $1 AND c.name = $2"),
];

const TABLE_KEY: &[(KeyKind, &str)] = &[(KeyKind::TableId, "c.table_id = $1")];

#[derive(sqlx::FromRow, Debug)]
struct StatisticRow {
    format_version: i64,
    generation: i64,
    id: ObjectId,
    name: Option<String>,
    table_id: ObjectId,
    ordinal_position: i64,
    column_id: ObjectId,
    column_name: String,
    column_statistic: Option<Value>,
}

impl From<StatisticRow> for ColumnStatistic {
    fn from(row: StatisticRow) -> Self {
        Self {
            format_version: row.format_version,
            generation: row.generation,
            id: Some(row.id),
            name: row.name,
            table_id: Some(row.table_id),
            ordinal_position: Some(row.ordinal_position),
            column_id: Some(row.column_id),
            column_name: Some(row.column_name),
            column_statistic: row.column_statistic,
        }
    }
}

#[derive(Debug)]
pub struct PgStatisticsDao {
    conn: SharedConnection,
    upsert: String,
    select: KeyedStatements,
    select_all: String,
    select_by_table: KeyedStatements,
    delete: KeyedStatements,
}

impl PgStatisticsDao {
    pub(crate) fn new(conn: SharedConnection, schema: &str) -> Self {
        let select = |predicate: &str| {
            format!(
                "SELECT {COLUMNS} FROM {schema}.column_statistics s \
                 JOIN {schema}.columns c ON c.id = s.column_id \
                 WHERE {predicate} ORDER BY c.table_id, c.ordinal_position"
            )
        };
        let delete_keys: Vec<(KeyKind, &str)> =
            SINGLE_KEYS.iter().chain(TABLE_KEY).copied().collect();

        Self {
            conn,
            upsert: format!(
                "INSERT INTO {schema}.column_statistics \
                 (format_version, generation, id, name, column_id, column_statistic) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (column_id) DO UPDATE \
                 SET name = EXCLUDED.name, column_statistic = EXCLUDED.column_statistic \
                 RETURNING id"
            ),
            select: KeyedStatements::new(SINGLE_KEYS, &select),
            select_all: select("TRUE"),
            select_by_table: KeyedStatements::new(TABLE_KEY, &select),
            delete: KeyedStatements::new(&delete_keys, |predicate| {
                format!(
                    "DELETE FROM {schema}.column_statistics s \
                     USING {schema}.columns c \
                     WHERE c.id = s.column_id AND {predicate} RETURNING s.id"
                )
            }),
        }
    }
}

#[async_trait]
impl Dao for PgStatisticsDao {
    async fn prepare(&self) -> Result<()> {
        let mut statements = vec![self.upsert.as_str(), self.select_all.as_str()];
        statements.extend(self.select.iter());
        statements.extend(self.select_by_table.iter());
        statements.extend(self.delete.iter());
        prepare_statements(&self.conn, &statements).await
    }
}

#[async_trait]
impl StatisticsDao for PgStatisticsDao {
    async fn upsert_column_statistic(&self, statistic: &ColumnStatistic) -> Result<ObjectId> {
        let id = statistic.id.ok_or(ErrorCode::InvalidParameter)?;
        let column_id = statistic.column_id.ok_or(ErrorCode::InvalidParameter)?;

        let mut conn = self.conn.lock().await;
        let (stored,): (ObjectId,) = sqlx::query_as(&self.upsert)
            .bind(statistic.format_version)
            .bind(statistic.generation)
            .bind(id)
            .bind(&statistic.name)
            .bind(column_id)
            .bind(&statistic.column_statistic)
            .fetch_one(&mut *conn)
            .await
            .map_err(interpret_error)?;
        Ok(stored)
    }

    async fn select_column_statistic(&self, key: ObjectKey<'_>) -> Result<ColumnStatistic> {
        let sql = self.select.get(key)?;

        let mut conn = self.conn.lock().await;
        let row: Option<StatisticRow> = bind_key(sqlx::query_as(sql), key)
            .fetch_optional(&mut *conn)
            .await
            .map_err(interpret_error)?;
        row.map(ColumnStatistic::from)
            .ok_or_else(|| key.not_found())
    }

    async fn select_all_column_statistics(&self) -> Result<Vec<ColumnStatistic>> {
        let mut conn = self.conn.lock().await;
        let rows: Vec<StatisticRow> = sqlx::query_as(&self.select_all)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;
        Ok(rows.into_iter().map(ColumnStatistic::from).collect())
    }

    async fn select_column_statistics(
        &self,
        key: ObjectKey<'_>,
    ) -> Result<Vec<ColumnStatistic>> {
        let sql = self.select_by_table.get(key)?;

        let mut conn = self.conn.lock().await;
        let rows: Vec<StatisticRow> = bind_key(sqlx::query_as(sql), key)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;
        Ok(rows.into_iter().map(ColumnStatistic::from).collect())
    }

    async fn delete_column_statistics(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>> {
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
