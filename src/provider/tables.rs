use std::sync::Arc;

use tracing::{debug, info};

use super::in_transaction;
use crate::dao::{DbSessionManager, ObjectClass, ObjectKey};
use crate::error::Result;
use crate::model::{Column, Constraint, ObjectId, Table, TableAcls};

/// Tables with their columns and constraints as one unit.
#[derive(Debug, Clone)]
pub struct TablesProvider {
    session: Arc<dyn DbSessionManager>,
}

impl TablesProvider {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self { session }
    }

    pub async fn init(&self) -> Result<()> {
        self.session.tables_dao().await?;
        self.session.columns_dao().await?;
        self.session.constraints_dao().await?;
        self.session.statistics_dao().await?;
        self.session.privileges_dao().await?;
        self.session.object_id_generator().await?;
        Ok(())
    }

    /// Stores the table and its children under freshly generated ids and
    /// returns the table id. `tuples` is never taken from the input.
    pub async fn add_table_metadata(&self, table: &Table) -> Result<ObjectId> {
        let tables = self.session.tables_dao().await?;
        let columns = self.session.columns_dao().await?;
        let constraints = self.session.constraints_dao().await?;
        let ids = self.session.object_id_generator().await?;

        let table_id = in_transaction(self.session.as_ref(), || async {
            let table_id = ids.generate(ObjectClass::Tables).await?;
            tables
                .insert_table(&Table {
                    id: Some(table_id),
                    tuples: None,
                    ..table.without_children()
                })
                .await?;

            for column in &table.columns {
                let column = Column {
                    id: Some(ids.generate(ObjectClass::Columns).await?),
                    table_id: Some(table_id),
                    ..column.clone()
                };
                columns.insert_column(&column).await?;
            }

            for constraint in &table.constraints {
                let constraint = Constraint {
                    id: Some(ids.generate(ObjectClass::Constraints).await?),
                    table_id: Some(table_id),
                    ..constraint.clone()
                };
                constraints.insert_constraint(&constraint).await?;
            }

            Ok(table_id)
        })
        .await?;

        info!("Added table {} with id {table_id}", table.name);
        Ok(table_id)
    }

    async fn attach_children(&self, mut table: Table) -> Result<Table> {
        let Some(table_id) = table.id else {
            return Ok(table);
        };

        table.columns = self
            .session
            .columns_dao()
            .await?
            .select_columns(ObjectKey::TableId(table_id))
            .await?;
        table.constraints = self
            .session
            .constraints_dao()
            .await?
            .select_constraints(ObjectKey::TableId(table_id))
            .await?;
        Ok(table)
    }

    pub async fn get_table_metadata(&self, key: ObjectKey<'_>) -> Result<Table> {
        let table = self.session.tables_dao().await?.select_table(key).await?;
        self.attach_children(table).await
    }

    pub async fn get_all_table_metadata(&self) -> Result<Vec<Table>> {
        let tables = self.session.tables_dao().await?.select_all_tables().await?;

        let mut complete = Vec::with_capacity(tables.len());
        for table in tables {
            complete.push(self.attach_children(table).await?);
        }
        Ok(complete)
    }

    /// Removes the table together with its columns, constraints and column
    /// statistics. Returns the table id.
    pub async fn remove_table_metadata(&self, key: ObjectKey<'_>) -> Result<ObjectId> {
        let tables = self.session.tables_dao().await?;
        let columns = self.session.columns_dao().await?;
        let constraints = self.session.constraints_dao().await?;
        let statistics = self.session.statistics_dao().await?;

        let table_id = in_transaction(self.session.as_ref(), || async {
            let table_id = tables
                .select_table(key)
                .await?
                .id
                .ok_or_else(|| key.not_found())?;
            let owner = ObjectKey::TableId(table_id);

            // Statistics resolve through their columns, so they go first.
            let removed = statistics.delete_column_statistics(owner).await?;
            debug!("Removed {} column statistics of table {table_id}", removed.len());
            columns.delete_columns(owner).await?;
            constraints.delete_constraints(owner).await?;
            tables.delete_table(ObjectKey::Id(table_id)).await
        })
        .await?;

        info!("Removed table with id {table_id}");
        Ok(table_id)
    }

    /// Whether `role` holds every privilege in `permission` on every table.
    pub async fn confirm_permission(
        &self,
        role: ObjectKey<'_>,
        permission: &str,
    ) -> Result<bool> {
        self.session
            .privileges_dao()
            .await?
            .confirm_tables_permission(role, permission)
            .await
    }

    pub async fn get_acls(&self, role_name: &str) -> Result<TableAcls> {
        let privileges = self
            .session
            .privileges_dao()
            .await?
            .select_table_privileges(ObjectKey::Name(role_name))
            .await?;

        Ok(TableAcls {
            tables: privileges
                .into_iter()
                .map(|p| (p.table_name, p.privileges))
                .collect(),
        })
    }
}
