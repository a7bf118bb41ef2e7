use std::sync::Arc;

use async_trait::async_trait;

use super::store::{Catalog, JsonStore};
use crate::dao::{Dao, ObjectKey, TablesDao};
use crate::error::{ErrorCode, Result};
use crate::model::{ObjectId, Table};

#[derive(Debug)]
pub struct JsonTablesDao {
    store: Arc<JsonStore>,
}

impl JsonTablesDao {
    pub(crate) fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }
}

fn position(catalog: &Catalog, key: ObjectKey<'_>) -> Result<usize> {
    let found = match key {
        ObjectKey::Id(id) => catalog.tables.iter().position(|t| t.id == Some(id)),
        ObjectKey::Name(name) => catalog.tables.iter().position(|t| t.name == name),
        _ => return Err(ErrorCode::InvalidParameter),
    };
    found.ok_or_else(|| key.not_found())
}

fn stored_id(table: &Table) -> Result<ObjectId> {
    table.id.ok_or(ErrorCode::InternalError)
}

#[async_trait]
impl Dao for JsonTablesDao {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl TablesDao for JsonTablesDao {
    async fn insert_table(&self, table: &Table) -> Result<ObjectId> {
        let id = table.id.ok_or(ErrorCode::InvalidParameter)?;

        self.store.write(|catalog| {
            if catalog.tables.iter().any(|t| t.name == table.name) {
                return Err(ErrorCode::TableNameAlreadyExists);
            }
            catalog.tables.push(table.without_children());
            Ok(id)
        })
    }

    async fn select_table(&self, key: ObjectKey<'_>) -> Result<Table> {
        self.store.read(|catalog| {
            let index = position(catalog, key)?;
            Ok(catalog.tables[index].without_children())
        })
    }

    async fn select_all_tables(&self) -> Result<Vec<Table>> {
        Ok(self
            .store
            .read(|catalog| catalog.tables.iter().map(Table::without_children).collect()))
    }

    async fn update_reltuples(&self, key: ObjectKey<'_>, tuples: f32) -> Result<ObjectId> {
        self.store.write(|catalog| {
            let index = position(catalog, key)?;
            let table = &mut catalog.tables[index];
            table.tuples = Some(tuples);
            stored_id(table)
        })
    }

    async fn delete_table(&self, key: ObjectKey<'_>) -> Result<ObjectId> {
        self.store.write(|catalog| {
            let index = position(catalog, key)?;
            stored_id(&catalog.tables.remove(index))
        })
    }
}
