use std::sync::Arc;

use tracing::info;

use super::in_transaction;
use crate::dao::{ColumnsDao, DbSessionManager, ObjectClass, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{Column, ColumnStatistic, ObjectId, TableStatistic};

#[derive(Debug, Clone)]
pub struct StatisticsProvider {
    session: Arc<dyn DbSessionManager>,
}

/// Finds the column a statistic refers to, by column id or by its position
/// or name within a table.
async fn resolve_column(
    columns: &dyn ColumnsDao,
    statistic: &ColumnStatistic,
) -> Result<Column> {
    let not_found = |error: ErrorCode| {
        if error.is_not_found() {
            ErrorCode::NotFound
        } else {
            error
        }
    };

    if let Some(column_id) = statistic.column_id {
        return columns
            .select_columns(ObjectKey::Id(column_id))
            .await
            .map_err(not_found)?
            .into_iter()
            .next()
            .ok_or(ErrorCode::NotFound);
    }

    let table_id = statistic.table_id.ok_or(ErrorCode::InvalidParameter)?;
    let candidates = columns.select_columns(ObjectKey::TableId(table_id)).await?;
    let found = match (statistic.ordinal_position, &statistic.column_name) {
        (Some(ordinal_position), _) => candidates
            .into_iter()
            .find(|c| c.ordinal_position == Some(ordinal_position)),
        (None, Some(column_name)) => candidates.into_iter().find(|c| &c.name == column_name),
        (None, None) => return Err(ErrorCode::InvalidParameter),
    };
    found.ok_or(ErrorCode::NotFound)
}

impl StatisticsProvider {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self { session }
    }

    pub async fn init(&self) -> Result<()> {
        self.session.statistics_dao().await?;
        self.session.columns_dao().await?;
        self.session.tables_dao().await?;
        self.session.object_id_generator().await?;
        Ok(())
    }

    /// Stores the statistic for its column, replacing an earlier one. Returns
    /// the id of the stored statistic.
    pub async fn add_column_statistic(&self, statistic: &ColumnStatistic) -> Result<ObjectId> {
        let columns = self.session.columns_dao().await?;
        let statistics = self.session.statistics_dao().await?;
        let ids = self.session.object_id_generator().await?;

        let column = resolve_column(columns.as_ref(), statistic).await?;
        let column_id = column.id.ok_or(ErrorCode::InternalError)?;

        let statistic_id = in_transaction(self.session.as_ref(), || async {
            let stored = ColumnStatistic {
                id: Some(ids.generate(ObjectClass::ColumnStatistics).await?),
                column_id: Some(column_id),
                ..statistic.stored()
            };
            statistics.upsert_column_statistic(&stored).await
        })
        .await?;

        info!("Stored statistic {statistic_id} of column {column_id}");
        Ok(statistic_id)
    }

    pub async fn get_column_statistic(&self, key: ObjectKey<'_>) -> Result<ColumnStatistic> {
        self.session
            .statistics_dao()
            .await?
            .select_column_statistic(key)
            .await
    }

    pub async fn get_all_column_statistics(&self) -> Result<Vec<ColumnStatistic>> {
        self.session
            .statistics_dao()
            .await?
            .select_all_column_statistics()
            .await
    }

    /// Statistics of every column of one table, keyed by `TableId`.
    pub async fn get_column_statistics(
        &self,
        key: ObjectKey<'_>,
    ) -> Result<Vec<ColumnStatistic>> {
        self.session
            .statistics_dao()
            .await?
            .select_column_statistics(key)
            .await
    }

    pub async fn remove_column_statistics(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>> {
        let statistics = self.session.statistics_dao().await?;
        in_transaction(self.session.as_ref(), || {
            statistics.delete_column_statistics(key)
        })
        .await
    }

    /// Sets the row count estimate of a table. Returns the table id.
    pub async fn update_reltuples(&self, key: ObjectKey<'_>, tuples: f32) -> Result<ObjectId> {
        let tables = self.session.tables_dao().await?;
        in_transaction(self.session.as_ref(), || tables.update_reltuples(key, tuples)).await
    }

    pub async fn get_table_statistic(&self, key: ObjectKey<'_>) -> Result<TableStatistic> {
        let table = self.session.tables_dao().await?.select_table(key).await?;

        Ok(TableStatistic {
            format_version: table.format_version,
            generation: table.generation,
            id: table.id,
            name: Some(table.name),
            namespace: table.namespace,
            tuples: table.tuples,
        })
    }
}
