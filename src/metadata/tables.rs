use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::{id_key, name_key};
use crate::acl::parse_permission;
use crate::dao::{DbSessionManager, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{ObjectId, Table, TableAcls, TableStatistic};
use crate::provider::{DataTypesProvider, StatisticsProvider, TablesProvider};

/// Tables, together with their columns and constraints.
#[derive(Debug, Clone)]
pub struct Tables {
    tables: TablesProvider,
    statistics: StatisticsProvider,
    datatypes: DataTypesProvider,
}

impl Tables {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self {
            tables: TablesProvider::new(session.clone()),
            statistics: StatisticsProvider::new(session.clone()),
            datatypes: DataTypesProvider::new(session),
        }
    }

    pub async fn init(&self) -> Result<()> {
        self.tables.init().await?;
        self.statistics.init().await?;
        self.datatypes.init().await
    }

    async fn validate(&self, table: &Table) -> Result<()> {
        if table.name.is_empty() {
            debug!("Rejected table without a name");
            return Err(ErrorCode::InvalidParameter);
        }

        let mut positions = HashSet::new();
        for column in &table.columns {
            let ordinal_position = column
                .ordinal_position
                .filter(|p| *p > 0)
                .ok_or(ErrorCode::InvalidParameter)?;
            if column.name.is_empty()
                || column.nullable.is_none()
                || !positions.insert(ordinal_position)
            {
                debug!("Rejected column {:?} of table {}", column.name, table.name);
                return Err(ErrorCode::InvalidParameter);
            }

            let data_type_id = column
                .data_type_id
                .filter(|id| *id >= 0)
                .ok_or(ErrorCode::InvalidParameter)?;
            self.datatypes
                .get_datatype(ObjectKey::Id(data_type_id))
                .await
                .map_err(|error| {
                    if error.is_not_found() {
                        ErrorCode::InvalidParameter
                    } else {
                        error
                    }
                })?;
        }
        Ok(())
    }

    /// Adds the table with its columns and constraints and returns the new
    /// table id. Any ids in the input are ignored.
    pub async fn add(&self, table: &Table) -> Result<ObjectId> {
        self.validate(table).await?;
        self.tables.add_table_metadata(table).await
    }

    pub async fn get(&self, id: ObjectId) -> Result<Table> {
        self.tables.get_table_metadata(id_key(id)?).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Table> {
        self.tables.get_table_metadata(name_key(name)?).await
    }

    pub async fn get_all(&self) -> Result<Vec<Table>> {
        self.tables.get_all_table_metadata().await
    }

    pub async fn remove(&self, id: ObjectId) -> Result<ObjectId> {
        self.tables.remove_table_metadata(id_key(id)?).await
    }

    pub async fn remove_by_name(&self, name: &str) -> Result<ObjectId> {
        self.tables.remove_table_metadata(name_key(name)?).await
    }

    pub async fn get_statistic(&self, id: ObjectId) -> Result<TableStatistic> {
        self.statistics.get_table_statistic(id_key(id)?).await
    }

    pub async fn get_statistic_by_name(&self, name: &str) -> Result<TableStatistic> {
        self.statistics.get_table_statistic(name_key(name)?).await
    }

    /// Updates the row count of the table named by `statistic.id`, or by
    /// `statistic.name` when the id is unset. Returns the table id.
    pub async fn set_statistic(&self, statistic: &TableStatistic) -> Result<ObjectId> {
        let tuples = statistic.tuples.ok_or(ErrorCode::InvalidParameter)?;
        let key = match (statistic.id, statistic.name.as_deref()) {
            (Some(id), _) => id_key(id)?,
            (None, Some(name)) => name_key(name)?,
            (None, None) => return Err(ErrorCode::InvalidParameter),
        };

        self.statistics.update_reltuples(key, tuples).await
    }

    /// Whether the role holds every privilege in `permission` on all tables.
    pub async fn confirm_permission_in_acls(
        &self,
        role_id: ObjectId,
        permission: &str,
    ) -> Result<bool> {
        let role = id_key(role_id)?;
        parse_permission(permission)?;
        self.tables.confirm_permission(role, permission).await
    }

    pub async fn confirm_permission_in_acls_by_name(
        &self,
        role_name: &str,
        permission: &str,
    ) -> Result<bool> {
        let role = name_key(role_name)?;
        parse_permission(permission)?;
        self.tables.confirm_permission(role, permission).await
    }

    /// Privileges of the role on every table, keyed by table name.
    pub async fn get_acls(&self, role_name: &str) -> Result<TableAcls> {
        name_key(role_name)?;
        self.tables.get_acls(role_name).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::Tables;
    use crate::dao::json::JsonSessionManager;
    use crate::error::ErrorCode;
    use crate::model::{Column, Table, TableStatistic};

    async fn make_tables() -> (TempDir, Tables) {
        let dir = TempDir::new().unwrap();
        let session = JsonSessionManager::new(dir.path());
        let tables = Tables::new(Arc::new(session));
        tables.init().await.unwrap();
        (dir, tables)
    }

    #[tokio::test]
    async fn test_add_validates_columns() {
        let (_dir, tables) = make_tables().await;

        let mut table = Table::new("t");
        table.columns = vec![Column::new("", 1, 23, false)];
        assert_eq!(
            tables.add(&table).await.unwrap_err(),
            ErrorCode::InvalidParameter
        );

        table.columns = vec![Column::new("c", 0, 23, false)];
        assert_eq!(
            tables.add(&table).await.unwrap_err(),
            ErrorCode::InvalidParameter
        );

        table.columns = vec![Column {
            nullable: None,
            ..Column::new("c", 1, 23, false)
        }];
        assert_eq!(
            tables.add(&table).await.unwrap_err(),
            ErrorCode::InvalidParameter
        );

        assert_eq!(
            tables.add(&Table::new("")).await.unwrap_err(),
            ErrorCode::InvalidParameter
        );
        assert!(tables.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_key_arguments() {
        let (_dir, tables) = make_tables().await;

        assert_eq!(tables.get(-1).await.unwrap_err(), ErrorCode::IdNotFound);
        assert_eq!(tables.get_by_name("").await.unwrap_err(), ErrorCode::NameNotFound);
        assert_eq!(tables.remove(0).await.unwrap_err(), ErrorCode::IdNotFound);
        assert_eq!(
            tables.remove_by_name("missing").await.unwrap_err(),
            ErrorCode::NameNotFound
        );
        assert_eq!(
            tables.get_statistic(0).await.unwrap_err(),
            ErrorCode::IdNotFound
        );
    }

    #[tokio::test]
    async fn test_set_statistic_needs_a_target_and_tuples() {
        let (_dir, tables) = make_tables().await;
        let id = tables.add(&Table::new("t")).await.unwrap();

        let mut statistic = TableStatistic {
            tuples: Some(10.0),
            ..Default::default()
        };
        assert_eq!(
            tables.set_statistic(&statistic).await.unwrap_err(),
            ErrorCode::InvalidParameter
        );

        statistic.name = Some("t".to_string());
        statistic.tuples = None;
        assert_eq!(
            tables.set_statistic(&statistic).await.unwrap_err(),
            ErrorCode::InvalidParameter
        );

        statistic.tuples = Some(10.0);
        assert_eq!(tables.set_statistic(&statistic).await.unwrap(), id);
        assert_eq!(tables.get_statistic(id).await.unwrap().tuples, Some(10.0));

        // An id takes precedence over the name
        statistic.id = Some(0);
        assert_eq!(
            tables.set_statistic(&statistic).await.unwrap_err(),
            ErrorCode::IdNotFound
        );
        statistic.id = Some(id);
        statistic.name = Some("missing".to_string());
        statistic.tuples = Some(20.0);
        assert_eq!(tables.set_statistic(&statistic).await.unwrap(), id);
        assert_eq!(
            tables.get_statistic_by_name("t").await.unwrap().tuples,
            Some(20.0)
        );

        statistic.id = None;
        statistic.name = Some(String::new());
        assert_eq!(
            tables.set_statistic(&statistic).await.unwrap_err(),
            ErrorCode::NameNotFound
        );
    }

    #[tokio::test]
    async fn test_permission_arguments() {
        let (_dir, tables) = make_tables().await;

        assert_eq!(
            tables
                .confirm_permission_in_acls(0, "r")
                .await
                .unwrap_err(),
            ErrorCode::IdNotFound
        );
        assert_eq!(
            tables
                .confirm_permission_in_acls_by_name("reader", "rq")
                .await
                .unwrap_err(),
            ErrorCode::InvalidParameter
        );
        assert_eq!(
            tables.get_acls("").await.unwrap_err(),
            ErrorCode::NameNotFound
        );
    }
}
