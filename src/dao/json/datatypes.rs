use std::sync::Arc;

use async_trait::async_trait;

use super::store::JsonStore;
use crate::dao::{DataTypesDao, Dao, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::DataType;

#[derive(Debug)]
pub struct JsonDataTypesDao {
    store: Arc<JsonStore>,
}

impl JsonDataTypesDao {
    pub(crate) fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Dao for JsonDataTypesDao {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl DataTypesDao for JsonDataTypesDao {
    async fn select_datatype(&self, key: ObjectKey<'_>) -> Result<DataType> {
        self.store.read(|catalog| {
            let mut datatypes = catalog.datatypes.iter();
            let found = match key {
                ObjectKey::Id(id) => datatypes.find(|t| t.id == id),
                ObjectKey::Name(name) => datatypes.find(|t| t.name == name),
                ObjectKey::QualifiedName(name) => {
                    datatypes.find(|t| t.pg_data_type_qualified_name == name)
                }
                _ => return Err(ErrorCode::InvalidParameter),
            };
            found.cloned().ok_or_else(|| key.not_found())
        })
    }

    async fn select_all_datatypes(&self) -> Result<Vec<DataType>> {
        Ok(self.store.read(|catalog| catalog.datatypes.clone()))
    }
}
