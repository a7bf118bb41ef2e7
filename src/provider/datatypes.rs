use std::sync::Arc;

use crate::dao::{DbSessionManager, ObjectKey};
use crate::error::Result;
use crate::model::DataType;

#[derive(Debug, Clone)]
pub struct DataTypesProvider {
    session: Arc<dyn DbSessionManager>,
}

impl DataTypesProvider {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self { session }
    }

    pub async fn init(&self) -> Result<()> {
        self.session.datatypes_dao().await?;
        Ok(())
    }

    pub async fn get_datatype(&self, key: ObjectKey<'_>) -> Result<DataType> {
        self.session.datatypes_dao().await?.select_datatype(key).await
    }

    pub async fn get_all_datatypes(&self) -> Result<Vec<DataType>> {
        self.session.datatypes_dao().await?.select_all_datatypes().await
    }
}
