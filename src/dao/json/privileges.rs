use async_trait::async_trait;

use crate::dao::{Dao, ObjectKey, PrivilegesDao, TablePrivilege};
use crate::error::{ErrorCode, Result};

/// The file store has no privilege model; every check is `NotSupported`.
#[derive(Debug, Default)]
pub struct JsonPrivilegesDao {}

#[async_trait]
impl Dao for JsonPrivilegesDao {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl PrivilegesDao for JsonPrivilegesDao {
    async fn select_table_privileges(
        &self,
        _role: ObjectKey<'_>,
    ) -> Result<Vec<TablePrivilege>> {
        Err(ErrorCode::NotSupported)
    }

    async fn confirm_tables_permission(
        &self,
        _role: ObjectKey<'_>,
        _permission: &str,
    ) -> Result<bool> {
        Err(ErrorCode::NotSupported)
    }
}
