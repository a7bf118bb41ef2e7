use async_trait::async_trait;

use super::{bind_key, interpret_error, prepare_statements, KeyedStatements, SharedConnection};
use crate::dao::{Dao, KeyKind, ObjectKey, RolesDao};
use crate::error::{ErrorCode, Result};
use crate::model::{ObjectId, Role, FORMAT_VERSION, GENERATION};

const SELECT_ROLE: &str = "SELECT oid::bigint AS id, rolname::text AS name, \
                           rolsuper AS is_super, rolinherit AS inherit, \
                           rolcreaterole AS createrole, rolcreatedb AS createdb, \
                           rolcanlogin AS canlogin, rolreplication AS replication, \
                           rolbypassrls AS bypassrls, rolconnlimit::bigint AS connlimit, \
                           rolpassword AS password, rolvaliduntil::text AS validuntil \
                           FROM pg_catalog.pg_roles";

#[derive(sqlx::FromRow, Debug)]
pub(super) struct RoleRow {
    id: ObjectId,
    name: String,
    is_super: bool,
    inherit: bool,
    createrole: bool,
    createdb: bool,
    canlogin: bool,
    replication: bool,
    bypassrls: bool,
    connlimit: i64,
    password: Option<String>,
    validuntil: Option<String>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: GENERATION,
            id: row.id,
            name: row.name,
            is_super: row.is_super,
            inherit: row.inherit,
            createrole: row.createrole,
            createdb: row.createdb,
            canlogin: row.canlogin,
            replication: row.replication,
            bypassrls: row.bypassrls,
            connlimit: row.connlimit,
            password: row.password,
            validuntil: row.validuntil,
        }
    }
}

/// Statements looking a role up in the server catalog by oid or name.
pub(super) fn role_statements() -> KeyedStatements {
    KeyedStatements::new(
        &[
            (KeyKind::Id, "oid = $1::bigint::oid"),
            (KeyKind::Name, "rolname::text = $1"),
        ],
        |predicate| format!("{SELECT_ROLE} WHERE {predicate}"),
    )
}

/// Fetches the single role matching `key`.
pub(super) async fn fetch_role(
    conn: &SharedConnection,
    statements: &KeyedStatements,
    key: ObjectKey<'_>,
) -> Result<Role> {
    let sql = statements.get(key)?;

    let mut conn = conn.lock().await;
    let rows: Vec<RoleRow> = bind_key(sqlx::query_as(sql), key)
        .fetch_all(&mut *conn)
        .await
        .map_err(interpret_error)?;

    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (None, _) => Err(key.not_found()),
        (Some(row), None) => Ok(row.into()),
        (Some(_), Some(_)) => Err(ErrorCode::InvalidParameter),
    }
}

/// Roles are the server's own; this DAO only reads them.
#[derive(Debug)]
pub struct PgRolesDao {
    conn: SharedConnection,
    select: KeyedStatements,
}

impl PgRolesDao {
    pub(crate) fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            select: role_statements(),
        }
    }
}

#[async_trait]
impl Dao for PgRolesDao {
    async fn prepare(&self) -> Result<()> {
        let statements: Vec<&str> = self.select.iter().collect();
        prepare_statements(&self.conn, &statements).await
    }
}

#[async_trait]
impl RolesDao for PgRolesDao {
    async fn select_role(&self, key: ObjectKey<'_>) -> Result<Role> {
        fetch_role(&self.conn, &self.select, key).await
    }
}
