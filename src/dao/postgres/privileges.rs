use async_trait::async_trait;
use tracing::debug;

use super::roles::{fetch_role, role_statements};
use super::{interpret_error, prepare_statements, KeyedStatements, SharedConnection};
use crate::acl::{parse_permission, table_privileges};
use crate::dao::{all_tables_permit, Dao, ObjectKey, PrivilegesDao, TablePrivilege};
use crate::error::Result;

/// Table privileges computed from the `acl` column of each stored table.
#[derive(Debug)]
pub struct PgPrivilegesDao {
    conn: SharedConnection,
    select_role: KeyedStatements,
    select_acls: String,
}

impl PgPrivilegesDao {
    pub(crate) fn new(conn: SharedConnection, schema: &str) -> Self {
        Self {
            conn,
            select_role: role_statements(),
            select_acls: format!("SELECT name, acl FROM {schema}.tables ORDER BY id"),
        }
    }
}

#[async_trait]
impl Dao for PgPrivilegesDao {
    async fn prepare(&self) -> Result<()> {
        let mut statements = vec![self.select_acls.as_str()];
        statements.extend(self.select_role.iter());
        prepare_statements(&self.conn, &statements).await
    }
}

#[async_trait]
impl PrivilegesDao for PgPrivilegesDao {
    async fn select_table_privileges(
        &self,
        role: ObjectKey<'_>,
    ) -> Result<Vec<TablePrivilege>> {
        let role = fetch_role(&self.conn, &self.select_role, role).await?;

        let mut conn = self.conn.lock().await;
        let rows: Vec<(String, Vec<String>)> = sqlx::query_as(&self.select_acls)
            .fetch_all(&mut *conn)
            .await
            .map_err(interpret_error)?;

        Ok(rows
            .into_iter()
            .map(|(table_name, acl)| TablePrivilege {
                privileges: table_privileges(&role.name, &acl),
                table_name,
            })
            .collect())
    }

    async fn confirm_tables_permission(
        &self,
        role: ObjectKey<'_>,
        permission: &str,
    ) -> Result<bool> {
        let requested = parse_permission(permission)?;
        let privileges = self.select_table_privileges(role).await?;

        let permitted = all_tables_permit(&privileges, &requested);
        debug!(
            "Permission {requested} on {} tables: {permitted}",
            privileges.len()
        );
        Ok(permitted)
    }
}
