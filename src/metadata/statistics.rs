use std::sync::Arc;

use super::{id_key, name_key, positive};
use crate::dao::{DbSessionManager, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{ColumnStatistic, ObjectId};
use crate::provider::StatisticsProvider;

/// Per-column statistics. A statistic is addressed by its own id or name,
/// by column id, or by table id plus column position or column name.
#[derive(Debug, Clone)]
pub struct Statistics {
    provider: StatisticsProvider,
}

fn column_number(table_id: ObjectId, ordinal_position: i64) -> Result<ObjectKey<'static>> {
    Ok(ObjectKey::ColumnNumber {
        table_id: positive(Some(table_id))?,
        ordinal_position: positive(Some(ordinal_position))?,
    })
}

fn column_name(table_id: ObjectId, column_name: &str) -> Result<ObjectKey<'_>> {
    if column_name.is_empty() {
        return Err(ErrorCode::InvalidParameter);
    }
    Ok(ObjectKey::ColumnName {
        table_id: positive(Some(table_id))?,
        column_name,
    })
}

impl Statistics {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self {
            provider: StatisticsProvider::new(session),
        }
    }

    pub async fn init(&self) -> Result<()> {
        self.provider.init().await
    }

    /// Stores a statistic for the column named by `column_id`, or by
    /// `table_id` with `ordinal_position` or `column_name`. An existing
    /// statistic of that column is replaced and keeps its id.
    pub async fn add(&self, statistic: &ColumnStatistic) -> Result<ObjectId> {
        let by_column_id = statistic.column_id.is_some_and(|id| id > 0);
        let by_table = statistic.table_id.is_some_and(|id| id > 0)
            && (statistic.ordinal_position.is_some_and(|p| p > 0)
                || statistic.column_name.as_ref().is_some_and(|n| !n.is_empty()));
        if !by_column_id && !by_table {
            return Err(ErrorCode::InvalidParameter);
        }

        self.provider.add_column_statistic(statistic).await
    }

    pub async fn get(&self, id: ObjectId) -> Result<ColumnStatistic> {
        self.provider.get_column_statistic(id_key(id)?).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<ColumnStatistic> {
        self.provider.get_column_statistic(name_key(name)?).await
    }

    pub async fn get_by_column_id(&self, column_id: ObjectId) -> Result<ColumnStatistic> {
        let key = ObjectKey::ColumnId(positive(Some(column_id))?);
        self.provider.get_column_statistic(key).await
    }

    pub async fn get_by_column_number(
        &self,
        table_id: ObjectId,
        ordinal_position: i64,
    ) -> Result<ColumnStatistic> {
        let key = column_number(table_id, ordinal_position)?;
        self.provider.get_column_statistic(key).await
    }

    pub async fn get_by_column_name(
        &self,
        table_id: ObjectId,
        name: &str,
    ) -> Result<ColumnStatistic> {
        let key = column_name(table_id, name)?;
        self.provider.get_column_statistic(key).await
    }

    pub async fn get_all(&self) -> Result<Vec<ColumnStatistic>> {
        self.provider.get_all_column_statistics().await
    }

    /// Statistics of every column of the table; empty when it has none.
    pub async fn get_all_by_table_id(&self, table_id: ObjectId) -> Result<Vec<ColumnStatistic>> {
        let key = ObjectKey::TableId(positive(Some(table_id))?);
        self.provider.get_column_statistics(key).await
    }

    pub async fn remove(&self, id: ObjectId) -> Result<ObjectId> {
        self.remove_one(id_key(id)?).await
    }

    pub async fn remove_by_name(&self, name: &str) -> Result<ObjectId> {
        self.remove_one(name_key(name)?).await
    }

    /// Removes the statistics of every column of the table and returns
    /// their ids.
    pub async fn remove_by_table_id(&self, table_id: ObjectId) -> Result<Vec<ObjectId>> {
        let key = ObjectKey::TableId(positive(Some(table_id))?);
        self.provider.remove_column_statistics(key).await
    }

    pub async fn remove_by_column_id(&self, column_id: ObjectId) -> Result<ObjectId> {
        self.remove_one(ObjectKey::ColumnId(positive(Some(column_id))?))
            .await
    }

    pub async fn remove_by_column_number(
        &self,
        table_id: ObjectId,
        ordinal_position: i64,
    ) -> Result<ObjectId> {
        self.remove_one(column_number(table_id, ordinal_position)?)
            .await
    }

    pub async fn remove_by_column_name(&self, table_id: ObjectId, name: &str) -> Result<ObjectId> {
        self.remove_one(column_name(table_id, name)?).await
    }

    async fn remove_one(&self, key: ObjectKey<'_>) -> Result<ObjectId> {
        self.provider
            .remove_column_statistics(key)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| key.not_found())
    }
}
