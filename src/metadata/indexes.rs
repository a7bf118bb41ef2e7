use std::sync::Arc;

use super::{id_key, name_key, positive};
use crate::dao::DbSessionManager;
use crate::error::{ErrorCode, Result};
use crate::model::{Index, ObjectId};
use crate::provider::IndexesProvider;

#[derive(Debug, Clone)]
pub struct Indexes {
    provider: IndexesProvider,
}

impl Indexes {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self {
            provider: IndexesProvider::new(session),
        }
    }

    pub async fn init(&self) -> Result<()> {
        self.provider.init().await
    }

    /// Adds the index and returns its new id. Index names are unique.
    pub async fn add(&self, index: &Index) -> Result<ObjectId> {
        if index.name.is_empty() {
            return Err(ErrorCode::InvalidParameter);
        }
        positive(index.table_id)?;

        self.provider.add_index(index).await
    }

    pub async fn get(&self, id: ObjectId) -> Result<Index> {
        self.provider.get_index(id_key(id)?).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Index> {
        self.provider.get_index(name_key(name)?).await
    }

    pub async fn get_all(&self) -> Result<Vec<Index>> {
        self.provider.get_all_indexes().await
    }

    pub async fn remove(&self, id: ObjectId) -> Result<ObjectId> {
        self.provider.remove_index(id_key(id)?).await
    }

    pub async fn remove_by_name(&self, name: &str) -> Result<ObjectId> {
        self.provider.remove_index(name_key(name)?).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::Indexes;
    use crate::dao::json::JsonSessionManager;
    use crate::error::ErrorCode;
    use crate::model::{Index, IndexDirection};

    #[tokio::test]
    async fn test_index_lifecycle() {
        let dir = TempDir::new().unwrap();
        let indexes = Indexes::new(Arc::new(JsonSessionManager::new(dir.path())));
        indexes.init().await.unwrap();

        assert_eq!(
            indexes
                .add(&Index {
                    name: "orphan".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap_err(),
            ErrorCode::InvalidParameter
        );

        let index = Index {
            name: "i1".to_string(),
            table_id: Some(7),
            keys: vec![2, 1],
            options: vec![IndexDirection::DescNullsLast, IndexDirection::Default],
            ..Default::default()
        };
        let id = indexes.add(&index).await.unwrap();
        let stored = indexes.get(id).await.unwrap();
        assert_eq!(stored.keys, index.keys);
        assert_eq!(stored.options, index.options);
        assert_eq!(indexes.get_all().await.unwrap().len(), 1);

        assert_eq!(indexes.remove_by_name("i1").await.unwrap(), id);
        assert_eq!(
            indexes.get_by_name("i1").await.unwrap_err(),
            ErrorCode::NameNotFound
        );
        assert_eq!(indexes.remove(0).await.unwrap_err(), ErrorCode::IdNotFound);
    }
}
