use std::sync::Arc;

use async_trait::async_trait;

use super::store::{Catalog, JsonStore};
use crate::dao::{Dao, IndexesDao, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{Index, ObjectId};

#[derive(Debug)]
pub struct JsonIndexesDao {
    store: Arc<JsonStore>,
}

impl JsonIndexesDao {
    pub(crate) fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }
}

fn position(catalog: &Catalog, key: ObjectKey<'_>) -> Result<usize> {
    let found = match key {
        ObjectKey::Id(id) => catalog.indexes.iter().position(|i| i.id == Some(id)),
        ObjectKey::Name(name) => catalog.indexes.iter().position(|i| i.name == name),
        _ => return Err(ErrorCode::InvalidParameter),
    };
    found.ok_or_else(|| key.not_found())
}

#[async_trait]
impl Dao for JsonIndexesDao {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl IndexesDao for JsonIndexesDao {
    async fn insert_index(&self, index: &Index) -> Result<ObjectId> {
        let id = index.id.ok_or(ErrorCode::InvalidParameter)?;

        self.store.write(|catalog| {
            if catalog.indexes.iter().any(|i| i.name == index.name) {
                return Err(ErrorCode::AlreadyExists);
            }
            catalog.indexes.push(index.clone());
            Ok(id)
        })
    }

    async fn select_index(&self, key: ObjectKey<'_>) -> Result<Index> {
        self.store.read(|catalog| {
            let index = position(catalog, key)?;
            Ok(catalog.indexes[index].clone())
        })
    }

    async fn select_all_indexes(&self) -> Result<Vec<Index>> {
        Ok(self.store.read(|catalog| catalog.indexes.clone()))
    }

    async fn delete_index(&self, key: ObjectKey<'_>) -> Result<ObjectId> {
        self.store.write(|catalog| {
            let index = position(catalog, key)?;
            catalog
                .indexes
                .remove(index)
                .id
                .ok_or(ErrorCode::InternalError)
        })
    }
}
