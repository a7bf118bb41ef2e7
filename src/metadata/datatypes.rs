use std::sync::Arc;

use super::{id_key, name_key};
use crate::dao::{DbSessionManager, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{DataType, ObjectId};
use crate::provider::DataTypesProvider;

/// Read-only access to the built-in data types.
#[derive(Debug, Clone)]
pub struct DataTypes {
    provider: DataTypesProvider,
}

impl DataTypes {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self {
            provider: DataTypesProvider::new(session),
        }
    }

    pub async fn init(&self) -> Result<()> {
        self.provider.init().await
    }

    pub async fn get(&self, id: ObjectId) -> Result<DataType> {
        self.provider.get_datatype(id_key(id)?).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<DataType> {
        self.provider.get_datatype(name_key(name)?).await
    }

    /// Looks a type up by its PostgreSQL qualified name, e.g. `int4`.
    pub async fn get_by_qualified_name(&self, qualified_name: &str) -> Result<DataType> {
        if qualified_name.is_empty() {
            return Err(ErrorCode::NameNotFound);
        }
        self.provider
            .get_datatype(ObjectKey::QualifiedName(qualified_name))
            .await
    }

    pub async fn get_all(&self) -> Result<Vec<DataType>> {
        self.provider.get_all_datatypes().await
    }
}
