use std::sync::Arc;

use async_trait::async_trait;

use super::store::{Catalog, JsonStore};
use crate::dao::{Dao, ObjectKey, StatisticsDao};
use crate::error::{ErrorCode, Result};
use crate::model::{Column, ColumnStatistic, ObjectId};

#[derive(Debug)]
pub struct JsonStatisticsDao {
    store: Arc<JsonStore>,
}

impl JsonStatisticsDao {
    pub(crate) fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }
}

fn find_column(catalog: &Catalog, column_id: ObjectId) -> Option<&Column> {
    catalog
        .tables
        .iter()
        .flat_map(|t| t.columns.iter())
        .find(|c| c.id == Some(column_id))
}

/// Fills in the column-derived fields; `None` if the column is gone.
fn resolve(catalog: &Catalog, stored: &ColumnStatistic) -> Option<ColumnStatistic> {
    let column = find_column(catalog, stored.column_id?)?;
    Some(ColumnStatistic {
        table_id: column.table_id,
        ordinal_position: column.ordinal_position,
        column_name: Some(column.name.clone()),
        ..stored.clone()
    })
}

fn key_matches(key: ObjectKey<'_>, statistic: &ColumnStatistic) -> bool {
    match key {
        ObjectKey::Id(id) => statistic.id == Some(id),
        ObjectKey::Name(name) => statistic.name.as_deref() == Some(name),
        ObjectKey::ColumnId(column_id) => statistic.column_id == Some(column_id),
        ObjectKey::TableId(table_id) => statistic.table_id == Some(table_id),
        ObjectKey::ColumnNumber {
            table_id,
            ordinal_position,
        } => {
            statistic.table_id == Some(table_id)
                && statistic.ordinal_position == Some(ordinal_position)
        }
        ObjectKey::ColumnName {
            table_id,
            column_name,
        } => {
            statistic.table_id == Some(table_id)
                && statistic.column_name.as_deref() == Some(column_name)
        }
        ObjectKey::QualifiedName(_) => false,
    }
}

/// All readable statistics matching `key`.
fn matching(catalog: &Catalog, key: ObjectKey<'_>) -> Result<Vec<ColumnStatistic>> {
    if let ObjectKey::QualifiedName(_) = key {
        return Err(ErrorCode::InvalidParameter);
    }

    Ok(catalog
        .statistics
        .iter()
        .filter_map(|s| resolve(catalog, s))
        .filter(|s| key_matches(key, s))
        .collect())
}

#[async_trait]
impl Dao for JsonStatisticsDao {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl StatisticsDao for JsonStatisticsDao {
    async fn upsert_column_statistic(&self, statistic: &ColumnStatistic) -> Result<ObjectId> {
        let column_id = statistic.column_id.ok_or(ErrorCode::InvalidParameter)?;

        self.store.write(|catalog| {
            if let Some(existing) = catalog
                .statistics
                .iter_mut()
                .find(|s| s.column_id == Some(column_id))
            {
                existing.name = statistic.name.clone();
                existing.column_statistic = statistic.column_statistic.clone();
                return existing.id.ok_or(ErrorCode::InternalError);
            }

            let id = statistic.id.ok_or(ErrorCode::InvalidParameter)?;
            catalog.statistics.push(statistic.stored());
            Ok(id)
        })
    }

    async fn select_column_statistic(&self, key: ObjectKey<'_>) -> Result<ColumnStatistic> {
        if let ObjectKey::TableId(_) = key {
            return Err(ErrorCode::InvalidParameter);
        }

        self.store.read(|catalog| {
            matching(catalog, key)?
                .into_iter()
                .next()
                .ok_or_else(|| key.not_found())
        })
    }

    async fn select_all_column_statistics(&self) -> Result<Vec<ColumnStatistic>> {
        Ok(self.store.read(|catalog| {
            catalog
                .statistics
                .iter()
                .filter_map(|s| resolve(catalog, s))
                .collect()
        }))
    }

    async fn select_column_statistics(
        &self,
        key: ObjectKey<'_>,
    ) -> Result<Vec<ColumnStatistic>> {
        match key {
            ObjectKey::TableId(_) => self.store.read(|catalog| matching(catalog, key)),
            _ => Err(ErrorCode::InvalidParameter),
        }
    }

    async fn delete_column_statistics(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>> {
        self.store.write(|catalog| {
            let ids: Vec<ObjectId> = matching(catalog, key)?
                .into_iter()
                .filter_map(|s| s.id)
                .collect();
            if ids.is_empty() && !matches!(key, ObjectKey::TableId(_)) {
                return Err(key.not_found());
            }

            catalog
                .statistics
                .retain(|s| s.id.map_or(true, |id| !ids.contains(&id)));
            Ok(ids)
        })
    }
}
