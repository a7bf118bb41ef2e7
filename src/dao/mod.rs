//! Data access objects: one trait per object class, implemented once per
//! storage backend, plus the session manager that owns the backend handle.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use strum_macros::EnumDiscriminants;
use tokio::sync::OnceCell;

use crate::error::{ErrorCode, Result};
use crate::model::{
    Column, ColumnStatistic, Constraint, DataType, Index, ObjectId, Role, Table,
};

pub mod json;
pub mod object_id;
#[cfg(feature = "backend-postgres")]
pub mod postgres;
pub mod utils;

pub use object_id::{ObjectClass, ObjectIdGenerator};

/// Lookup key of a DAO operation. Each DAO accepts a fixed subset and rejects
/// the others with `InvalidParameter`.
#[derive(Debug, Clone, Copy, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(KeyKind))]
pub enum ObjectKey<'a> {
    Id(ObjectId),
    Name(&'a str),
    TableId(ObjectId),
    ColumnId(ObjectId),
    ColumnNumber {
        table_id: ObjectId,
        ordinal_position: i64,
    },
    ColumnName {
        table_id: ObjectId,
        column_name: &'a str,
    },
    QualifiedName(&'a str),
}

impl<'a> ObjectKey<'a> {
    /// The not-found code matching this key.
    pub fn not_found(&self) -> ErrorCode {
        match self {
            ObjectKey::Id(_) => ErrorCode::IdNotFound,
            ObjectKey::Name(_) => ErrorCode::NameNotFound,
            _ => ErrorCode::NotFound,
        }
    }
}

/// Common part of every DAO.
#[async_trait]
pub trait Dao: Send + Sync + Debug {
    /// Sets up whatever repeated calls need. Idempotent, and must succeed
    /// before any other method is called.
    async fn prepare(&self) -> Result<()>;
}

#[async_trait]
pub trait TablesDao: Dao {
    /// Persists the table row; child collections are ignored. `table.id`
    /// must already be assigned.
    async fn insert_table(&self, table: &Table) -> Result<ObjectId>;

    /// Keys: `Id`, `Name`. The returned table has no children attached.
    async fn select_table(&self, key: ObjectKey<'_>) -> Result<Table>;

    async fn select_all_tables(&self) -> Result<Vec<Table>>;

    /// Keys: `Id`, `Name`.
    async fn update_reltuples(&self, key: ObjectKey<'_>, tuples: f32) -> Result<ObjectId>;

    /// Keys: `Id`, `Name`.
    async fn delete_table(&self, key: ObjectKey<'_>) -> Result<ObjectId>;
}

#[async_trait]
pub trait ColumnsDao: Dao {
    /// `column.id` and `column.table_id` must already be assigned.
    async fn insert_column(&self, column: &Column) -> Result<ObjectId>;

    /// Keys: `TableId`, `Id`. Ordered by ordinal position. An empty result
    /// for `TableId` is not an error.
    async fn select_columns(&self, key: ObjectKey<'_>) -> Result<Vec<Column>>;

    /// Keys: `TableId`, `Id`. Same empty-result rule as `select_columns`.
    async fn delete_columns(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>>;
}

#[async_trait]
pub trait ConstraintsDao: Dao {
    async fn insert_constraint(&self, constraint: &Constraint) -> Result<ObjectId>;

    /// Keys: `Id`.
    async fn select_constraint(&self, key: ObjectKey<'_>) -> Result<Constraint>;

    /// Keys: `TableId`. An empty result is not an error.
    async fn select_constraints(&self, key: ObjectKey<'_>) -> Result<Vec<Constraint>>;

    async fn select_all_constraints(&self) -> Result<Vec<Constraint>>;

    /// Keys: `Id`, `TableId`. An empty result is an error for `Id` only.
    async fn delete_constraints(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>>;
}

#[async_trait]
pub trait IndexesDao: Dao {
    async fn insert_index(&self, index: &Index) -> Result<ObjectId>;

    /// Keys: `Id`, `Name`.
    async fn select_index(&self, key: ObjectKey<'_>) -> Result<Index>;

    async fn select_all_indexes(&self) -> Result<Vec<Index>>;

    /// Keys: `Id`, `Name`.
    async fn delete_index(&self, key: ObjectKey<'_>) -> Result<ObjectId>;
}

#[async_trait]
pub trait DataTypesDao: Dao {
    /// Keys: `Id`, `Name`, `QualifiedName`.
    async fn select_datatype(&self, key: ObjectKey<'_>) -> Result<DataType>;

    async fn select_all_datatypes(&self) -> Result<Vec<DataType>>;
}

#[async_trait]
pub trait RolesDao: Dao {
    /// Keys: `Id`, `Name`. More than one matching role is `InvalidParameter`.
    async fn select_role(&self, key: ObjectKey<'_>) -> Result<Role>;
}

#[async_trait]
pub trait StatisticsDao: Dao {
    /// Inserts, or replaces the statistic already stored for
    /// `statistic.column_id`. Returns the id of the stored statistic, which
    /// is the existing one on replacement.
    async fn upsert_column_statistic(&self, statistic: &ColumnStatistic) -> Result<ObjectId>;

    /// Keys: `Id`, `Name`, `ColumnId`, `ColumnNumber`, `ColumnName`.
    async fn select_column_statistic(&self, key: ObjectKey<'_>) -> Result<ColumnStatistic>;

    async fn select_all_column_statistics(&self) -> Result<Vec<ColumnStatistic>>;

    /// Keys: `TableId`. An empty result is not an error.
    async fn select_column_statistics(
        &self,
        key: ObjectKey<'_>,
    ) -> Result<Vec<ColumnStatistic>>;

    /// Keys: those of `select_column_statistic`, and `TableId` (for which an
    /// empty result is not an error).
    async fn delete_column_statistics(&self, key: ObjectKey<'_>) -> Result<Vec<ObjectId>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePrivilege {
    pub table_name: String,
    /// Granted privilege letters in canonical `arwdDxt` order
    pub privileges: String,
}

#[async_trait]
pub trait PrivilegesDao: Dao {
    /// Keys (the role): `Id`, `Name`.
    async fn select_table_privileges(
        &self,
        role: ObjectKey<'_>,
    ) -> Result<Vec<TablePrivilege>>;

    /// Whether the role holds every privilege in `permission` on every table.
    async fn confirm_tables_permission(
        &self,
        role: ObjectKey<'_>,
        permission: &str,
    ) -> Result<bool>;
}

/// Owns the backend connection or file store, hands out one cached and
/// prepared DAO per object class, and brackets multi-DAO work.
#[async_trait]
pub trait DbSessionManager: Send + Sync + Debug {
    /// Idempotent.
    async fn connect(&self) -> Result<()>;

    async fn tables_dao(&self) -> Result<Arc<dyn TablesDao>>;

    async fn columns_dao(&self) -> Result<Arc<dyn ColumnsDao>>;

    async fn constraints_dao(&self) -> Result<Arc<dyn ConstraintsDao>>;

    async fn indexes_dao(&self) -> Result<Arc<dyn IndexesDao>>;

    async fn datatypes_dao(&self) -> Result<Arc<dyn DataTypesDao>>;

    async fn roles_dao(&self) -> Result<Arc<dyn RolesDao>>;

    async fn statistics_dao(&self) -> Result<Arc<dyn StatisticsDao>>;

    async fn privileges_dao(&self) -> Result<Arc<dyn PrivilegesDao>>;

    async fn object_id_generator(&self) -> Result<Arc<dyn ObjectIdGenerator>>;

    async fn start_transaction(&self) -> Result<()>;

    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;
}

/// Returns the cached DAO, building and preparing it on first use.
pub(crate) async fn get_or_prepare<D>(
    cell: &OnceCell<Arc<D>>,
    build: impl FnOnce() -> Result<Arc<D>> + Send,
) -> Result<Arc<D>>
where
    D: Dao + ?Sized,
{
    cell.get_or_try_init(|| async move {
        let dao = build()?;
        dao.prepare().await?;
        Ok(dao)
    })
    .await
    .cloned()
}

/// Checks that the privileges of every table contain `permission`. False
/// when there are no tables.
pub(crate) fn all_tables_permit(privileges: &[TablePrivilege], permission: &str) -> bool {
    !privileges.is_empty()
        && privileges
            .iter()
            .all(|p| crate::acl::has_privileges(&p.privileges, permission))
}
