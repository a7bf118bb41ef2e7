use std::sync::Arc;

use async_trait::async_trait;

use super::store::JsonStore;
use crate::dao::{ConstraintsDao, Dao, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{Constraint, ObjectId};

/// Constraints live nested in their owning table's `constraints` array.
#[derive(Debug)]
pub struct JsonConstraintsDao {
    store: Arc<JsonStore>,
}

impl JsonConstraintsDao {
    pub(crate) fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Dao for JsonConstraintsDao {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ConstraintsDao for JsonConstraintsDao {
    async fn insert_constraint(&self, constraint: &Constraint) -> Result<ObjectId> {
        let (id, table_id) = match (constraint.id, constraint.table_id) {
            (Some(id), Some(table_id)) => (id, table_id),
            _ => return Err(ErrorCode::InvalidParameter),
        };

        self.store.write(|catalog| {
            let table = catalog
                .table_mut(table_id)
                .ok_or(ErrorCode::InvalidParameter)?;
            table.constraints.push(constraint.clone());
            Ok(id)
        })
    }

    async fn select_constraint(&self, key: ObjectKey<'_>) -> Result<Constraint> {
        let ObjectKey::Id(id) = key else {
            return Err(ErrorCode::InvalidParameter);
        };

        self.store.read(|catalog| {
            catalog
                .tables
                .iter()
                .flat_map(|t| t.constraints.iter())
                .find(|c| c.id == Some(id))
                .cloned()
                .ok_or_else(|| key.not_found())
        })
    }

    async fn select_constraints(&self, key: ObjectKey<'_>) -> Result<Vec<Constraint>> {
        let ObjectKey::TableId(table_id) = key else {
            return Err(ErrorCode::InvalidParameter);
        };

        Ok(self.store.read(|catalog| {
            catalog
                .table(table_id)
                .map(|t| t.constraints.clone())
                .unwrap_or_default()
        }))
    }

    async fn select_all_constraints(&self) -> Result<Vec<Constraint>> {
        Ok(self.store.read(|catalog| {
            catalog
                .tables
                .iter()
                .flat_map(|t| t.constraints.iter().cloned())
                .collect()
        }))
    }

    async fn delete_constraints(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>> {
        self.store.write(|catalog| match key {
            ObjectKey::TableId(table_id) => Ok(catalog
                .table_mut(table_id)
                .map(|t| t.constraints.drain(..).filter_map(|c| c.id).collect())
                .unwrap_or_default()),
            ObjectKey::Id(id) => catalog
                .tables
                .iter_mut()
                .find_map(|t| {
                    let index = t.constraints.iter().position(|c| c.id == Some(id))?;
                    t.constraints.remove(index);
                    Some(vec![id])
                })
                .ok_or_else(|| key.not_found()),
            _ => Err(ErrorCode::InvalidParameter),
        })
    }
}
