//! File backend: one JSON document per object class in a storage directory.
//!
//! All documents are loaded into memory on `connect`. Mutations stay in
//! memory until `commit` writes them back; `rollback` reloads from disk. There
//! is no isolation between processes sharing a directory: the last commit
//! wins.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

mod columns;
mod constraints;
mod datatypes;
mod indexes;
pub mod object_id;
mod privileges;
mod roles;
mod statistics;
pub(crate) mod store;
mod tables;

pub use columns::JsonColumnsDao;
pub use constraints::JsonConstraintsDao;
pub use datatypes::JsonDataTypesDao;
pub use indexes::JsonIndexesDao;
pub use object_id::JsonObjectIdGenerator;
pub use privileges::JsonPrivilegesDao;
pub use roles::JsonRolesDao;
pub use statistics::JsonStatisticsDao;
pub use tables::JsonTablesDao;

use self::store::JsonStore;
use super::{
    get_or_prepare, ColumnsDao, ConstraintsDao, DataTypesDao, DbSessionManager, IndexesDao,
    ObjectIdGenerator, PrivilegesDao, RolesDao, StatisticsDao, TablesDao,
};
use crate::error::{ErrorCode, Result};

#[derive(Debug)]
pub struct JsonSessionManager {
    storage_dir: PathBuf,
    store: OnceCell<Arc<JsonStore>>,
    object_id_generator: OnceCell<Arc<dyn ObjectIdGenerator>>,
    tables: OnceCell<Arc<dyn TablesDao>>,
    columns: OnceCell<Arc<dyn ColumnsDao>>,
    constraints: OnceCell<Arc<dyn ConstraintsDao>>,
    indexes: OnceCell<Arc<dyn IndexesDao>>,
    datatypes: OnceCell<Arc<dyn DataTypesDao>>,
    roles: OnceCell<Arc<dyn RolesDao>>,
    statistics: OnceCell<Arc<dyn StatisticsDao>>,
    privileges: OnceCell<Arc<dyn PrivilegesDao>>,
}

impl JsonSessionManager {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            store: OnceCell::new(),
            object_id_generator: OnceCell::new(),
            tables: OnceCell::new(),
            columns: OnceCell::new(),
            constraints: OnceCell::new(),
            indexes: OnceCell::new(),
            datatypes: OnceCell::new(),
            roles: OnceCell::new(),
            statistics: OnceCell::new(),
            privileges: OnceCell::new(),
        }
    }

    fn connected_store(&self) -> Result<Arc<JsonStore>> {
        self.store.get().cloned().ok_or(ErrorCode::NotInitialized)
    }

    async fn store(&self) -> Result<Arc<JsonStore>> {
        self.connect().await?;
        self.connected_store()
    }
}

#[async_trait]
impl DbSessionManager for JsonSessionManager {
    async fn connect(&self) -> Result<()> {
        if self.storage_dir.as_os_str().is_empty() {
            return Err(ErrorCode::NotInitialized);
        }

        self.store
            .get_or_try_init(|| async {
                info!("Opening metadata storage at {}", self.storage_dir.display());
                JsonStore::open(&self.storage_dir).map(Arc::new)
            })
            .await?;
        Ok(())
    }

    async fn tables_dao(&self) -> Result<Arc<dyn TablesDao>> {
        let store = self.store().await?;
        get_or_prepare(&self.tables, || {
            let dao: Arc<dyn TablesDao> = Arc::new(JsonTablesDao::new(store));
            Ok(dao)
        })
        .await
    }

    async fn columns_dao(&self) -> Result<Arc<dyn ColumnsDao>> {
        let store = self.store().await?;
        get_or_prepare(&self.columns, || {
            let dao: Arc<dyn ColumnsDao> = Arc::new(JsonColumnsDao::new(store));
            Ok(dao)
        })
        .await
    }

    async fn constraints_dao(&self) -> Result<Arc<dyn ConstraintsDao>> {
        let store = self.store().await?;
        get_or_prepare(&self.constraints, || {
            let dao: Arc<dyn ConstraintsDao> = Arc::new(JsonConstraintsDao::new(store));
            Ok(dao)
        })
        .await
    }

    async fn indexes_dao(&self) -> Result<Arc<dyn IndexesDao>> {
        let store = self.store().await?;
        get_or_prepare(&self.indexes, || {
            let dao: Arc<dyn IndexesDao> = Arc::new(JsonIndexesDao::new(store));
            Ok(dao)
        })
        .await
    }

    async fn datatypes_dao(&self) -> Result<Arc<dyn DataTypesDao>> {
        let store = self.store().await?;
        get_or_prepare(&self.datatypes, || {
            let dao: Arc<dyn DataTypesDao> = Arc::new(JsonDataTypesDao::new(store));
            Ok(dao)
        })
        .await
    }

    async fn roles_dao(&self) -> Result<Arc<dyn RolesDao>> {
        let store = self.store().await?;
        get_or_prepare(&self.roles, || {
            let dao: Arc<dyn RolesDao> = Arc::new(JsonRolesDao::new(store));
            Ok(dao)
        })
        .await
    }

    async fn statistics_dao(&self) -> Result<Arc<dyn StatisticsDao>> {
        let store = self.store().await?;
        get_or_prepare(&self.statistics, || {
            let dao: Arc<dyn StatisticsDao> = Arc::new(JsonStatisticsDao::new(store));
            Ok(dao)
        })
        .await
    }

    async fn privileges_dao(&self) -> Result<Arc<dyn PrivilegesDao>> {
        self.connect().await?;
        get_or_prepare(&self.privileges, || {
            let dao: Arc<dyn PrivilegesDao> = Arc::new(JsonPrivilegesDao::default());
            Ok(dao)
        })
        .await
    }

    async fn object_id_generator(&self) -> Result<Arc<dyn ObjectIdGenerator>> {
        self.connect().await?;
        let generator = self
            .object_id_generator
            .get_or_init(|| async {
                let generator: Arc<dyn ObjectIdGenerator> =
                    Arc::new(JsonObjectIdGenerator::new(&self.storage_dir));
                generator
            })
            .await;
        Ok(generator.clone())
    }

    async fn start_transaction(&self) -> Result<()> {
        self.connected_store()?;
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        debug!("Writing metadata documents");
        self.connected_store()?.save()
    }

    async fn rollback(&self) -> Result<()> {
        debug!("Discarding uncommitted metadata changes");
        self.connected_store()?.reload()
    }
}
