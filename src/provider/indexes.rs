use std::sync::Arc;

use tracing::info;

use super::in_transaction;
use crate::dao::{DbSessionManager, ObjectClass, ObjectKey};
use crate::error::Result;
use crate::model::{Index, ObjectId};

#[derive(Debug, Clone)]
pub struct IndexesProvider {
    session: Arc<dyn DbSessionManager>,
}

impl IndexesProvider {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self { session }
    }

    pub async fn init(&self) -> Result<()> {
        self.session.indexes_dao().await?;
        self.session.object_id_generator().await?;
        Ok(())
    }

    pub async fn add_index(&self, index: &Index) -> Result<ObjectId> {
        let indexes = self.session.indexes_dao().await?;
        let ids = self.session.object_id_generator().await?;

        let index_id = in_transaction(self.session.as_ref(), || async {
            let index_id = ids.generate(ObjectClass::Indexes).await?;
            indexes
                .insert_index(&Index {
                    id: Some(index_id),
                    ..index.clone()
                })
                .await
        })
        .await?;

        info!("Added index {} with id {index_id}", index.name);
        Ok(index_id)
    }

    pub async fn get_index(&self, key: ObjectKey<'_>) -> Result<Index> {
        self.session.indexes_dao().await?.select_index(key).await
    }

    pub async fn get_all_indexes(&self) -> Result<Vec<Index>> {
        self.session.indexes_dao().await?.select_all_indexes().await
    }

    pub async fn remove_index(&self, key: ObjectKey<'_>) -> Result<ObjectId> {
        let indexes = self.session.indexes_dao().await?;
        in_transaction(self.session.as_ref(), || indexes.delete_index(key)).await
    }
}
