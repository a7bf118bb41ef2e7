use std::sync::Arc;

use async_trait::async_trait;
use itertools::Itertools;

use super::store::JsonStore;
use crate::dao::{ColumnsDao, Dao, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{Column, ObjectId};

/// Columns live nested in their owning table's `columns` array.
#[derive(Debug)]
pub struct JsonColumnsDao {
    store: Arc<JsonStore>,
}

impl JsonColumnsDao {
    pub(crate) fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Dao for JsonColumnsDao {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ColumnsDao for JsonColumnsDao {
    async fn insert_column(&self, column: &Column) -> Result<ObjectId> {
        let (id, table_id) = match (column.id, column.table_id) {
            (Some(id), Some(table_id)) => (id, table_id),
            _ => return Err(ErrorCode::InvalidParameter),
        };
        if column.ordinal_position.is_none()
            || column.data_type_id.is_none()
            || column.nullable.is_none()
        {
            return Err(ErrorCode::InvalidParameter);
        }

        self.store.write(|catalog| {
            let table = catalog
                .table_mut(table_id)
                .ok_or(ErrorCode::InvalidParameter)?;
            if table
                .columns
                .iter()
                .any(|c| c.ordinal_position == column.ordinal_position)
            {
                return Err(ErrorCode::AlreadyExists);
            }
            table.columns.push(column.clone());
            Ok(id)
        })
    }

    async fn select_columns(&self, key: ObjectKey<'_>) -> Result<Vec<Column>> {
        self.store.read(|catalog| match key {
            ObjectKey::TableId(table_id) => Ok(catalog
                .table(table_id)
                .map(|t| {
                    t.columns
                        .iter()
                        .sorted_by_key(|c| c.ordinal_position)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()),
            ObjectKey::Id(id) => catalog
                .tables
                .iter()
                .flat_map(|t| t.columns.iter())
                .find(|c| c.id == Some(id))
                .map(|c| vec![c.clone()])
                .ok_or_else(|| key.not_found()),
            _ => Err(ErrorCode::InvalidParameter),
        })
    }

    async fn delete_columns(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>> {
        self.store.write(|catalog| match key {
            ObjectKey::TableId(table_id) => Ok(catalog
                .table_mut(table_id)
                .map(|t| t.columns.drain(..).filter_map(|c| c.id).collect())
                .unwrap_or_default()),
            ObjectKey::Id(id) => catalog
                .tables
                .iter_mut()
                .find_map(|t| {
                    let index = t.columns.iter().position(|c| c.id == Some(id))?;
                    t.columns.remove(index);
                    Some(vec![id])
                })
                .ok_or_else(|| key.not_found()),
            _ => Err(ErrorCode::InvalidParameter),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::JsonColumnsDao;
    use crate::dao::json::store::JsonStore;
    use crate::dao::{ColumnsDao, ObjectKey};
    use crate::error::ErrorCode;
    use crate::model::{Column, Table};

    fn make_dao(dir: &TempDir) -> JsonColumnsDao {
        let store = JsonStore::open(dir.path()).unwrap();
        store.write(|c| {
            let mut table = Table::new("t");
            table.id = Some(1);
            c.tables.push(table);
        });
        JsonColumnsDao::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_insert_needs_the_required_fields() {
        let dir = TempDir::new().unwrap();
        let dao = make_dao(&dir);

        let column = Column {
            id: Some(1),
            table_id: Some(1),
            ..Column::new("c", 1, 23, false)
        };
        for incomplete in [
            Column {
                ordinal_position: None,
                ..column.clone()
            },
            Column {
                data_type_id: None,
                ..column.clone()
            },
            Column {
                nullable: None,
                ..column.clone()
            },
        ] {
            assert_eq!(
                dao.insert_column(&incomplete).await.unwrap_err(),
                ErrorCode::InvalidParameter
            );
        }
        assert!(dao
            .select_columns(ObjectKey::TableId(1))
            .await
            .unwrap()
            .is_empty());

        assert_eq!(dao.insert_column(&column).await.unwrap(), 1);
        assert_eq!(
            dao.insert_column(&Column {
                id: Some(2),
                ..column
            })
            .await
            .unwrap_err(),
            ErrorCode::AlreadyExists
        );
    }
}
