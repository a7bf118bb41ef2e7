//! Relational backend on a single PostgreSQL connection.
//!
//! Every object class lives in its own table inside one schema. The
//! connection runs with an empty `search_path`, so all statements are
//! schema-qualified when the DAO is built.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{Connection, Executor, PgConnection, Postgres};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

mod columns;
mod constraints;
mod datatypes;
mod indexes;
mod object_id;
mod privileges;
mod roles;
mod statistics;
mod tables;

pub use columns::PgColumnsDao;
pub use constraints::PgConstraintsDao;
pub use datatypes::PgDataTypesDao;
pub use indexes::PgIndexesDao;
pub use object_id::PgObjectIdGenerator;
pub use privileges::PgPrivilegesDao;
pub use roles::PgRolesDao;
pub use statistics::PgStatisticsDao;
pub use tables::PgTablesDao;

use super::{
    get_or_prepare, ColumnsDao, ConstraintsDao, DataTypesDao, DbSessionManager, IndexesDao,
    KeyKind, ObjectIdGenerator, ObjectKey, PrivilegesDao, RolesDao, StatisticsDao, TablesDao,
};
use crate::config::schema::is_valid_schema_name;
use crate::error::{ErrorCode, Result};
use crate::model::BUILTIN_DATA_TYPES;

pub(crate) type SharedConnection = Arc<Mutex<PgConnection>>;

const BOOTSTRAP_DDL: &str = include_str!("schema.sql");

pub(crate) fn interpret_error(error: sqlx::Error) -> ErrorCode {
    warn!("Metadata database error: {error}");

    match &error {
        sqlx::Error::Database(d) => {
            // Reference: https://www.postgresql.org/docs/current/errcodes-appendix.html
            match d.code().as_deref() {
                Some("23505") => ErrorCode::AlreadyExists,
                Some("23502") | Some("23503") | Some("22P02") => ErrorCode::InvalidParameter,
                Some("42704") => ErrorCode::NotFound,
                _ => ErrorCode::DatabaseAccessFailure,
            }
        }
        sqlx::Error::RowNotFound => ErrorCode::NotFound,
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => ErrorCode::InternalError,
        _ => ErrorCode::DatabaseAccessFailure,
    }
}

/// Converts an integer code read back from the database.
pub(crate) fn decode_code<T>(code: i64) -> Result<T>
where
    T: TryFrom<i64, Error = String>,
{
    T::try_from(code).map_err(|e| {
        warn!("Unexpected value in the metadata database: {e}");
        ErrorCode::InternalError
    })
}

/// One statement per accepted key kind, differing only in the predicate.
#[derive(Debug)]
pub(crate) struct KeyedStatements(Vec<(KeyKind, String)>);

impl KeyedStatements {
    pub fn new(predicates: &[(KeyKind, &str)], build: impl Fn(&str) -> String) -> Self {
        Self(
            predicates
                .iter()
                .map(|(kind, predicate)| (*kind, build(predicate)))
                .collect(),
        )
    }

    /// The statement for `key`, or `InvalidParameter` if the key kind is not
    /// accepted.
    pub fn get(&self, key: ObjectKey<'_>) -> Result<&str> {
        let kind = KeyKind::from(key);
        self.0
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, sql)| sql.as_str())
            .ok_or(ErrorCode::InvalidParameter)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, sql)| sql.as_str())
    }
}

/// Binds the key values in the order the keyed predicates expect them.
pub(crate) fn bind_key<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    key: ObjectKey<'q>,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match key {
        ObjectKey::Id(id) | ObjectKey::TableId(id) | ObjectKey::ColumnId(id) => query.bind(id),
        ObjectKey::Name(name) | ObjectKey::QualifiedName(name) => query.bind(name),
        ObjectKey::ColumnNumber {
            table_id,
            ordinal_position,
        } => query.bind(table_id).bind(ordinal_position),
        ObjectKey::ColumnName {
            table_id,
            column_name,
        } => query.bind(table_id).bind(column_name),
    }
}

/// Prepares each statement on the connection. Prepared statements are kept in
/// the connection's statement cache, so preparing twice is cheap.
pub(crate) async fn prepare_statements(
    conn: &SharedConnection,
    statements: &[&str],
) -> Result<()> {
    let mut conn = conn.lock().await;
    for sql in statements {
        (&mut *conn).prepare(sql).await.map_err(interpret_error)?;
    }
    debug!("Prepared {} statements", statements.len());
    Ok(())
}

async fn bootstrap(conn: &mut PgConnection, schema: &str) -> Result<()> {
    debug!("Creating metadata tables in schema {schema}");
    let ddl = BOOTSTRAP_DDL.replace("{schema}", schema);
    (&mut *conn)
        .execute(ddl.as_str())
        .await
        .map_err(interpret_error)?;

    let seed = format!(
        "INSERT INTO {schema}.datatypes (format_version, generation, id, name, \
         pg_data_type, pg_data_type_name, pg_data_type_qualified_name) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT DO NOTHING"
    );
    for data_type in BUILTIN_DATA_TYPES.iter() {
        sqlx::query(&seed)
            .bind(data_type.format_version)
            .bind(data_type.generation)
            .bind(data_type.id)
            .bind(&data_type.name)
            .bind(data_type.pg_data_type)
            .bind(&data_type.pg_data_type_name)
            .bind(&data_type.pg_data_type_qualified_name)
            .execute(&mut *conn)
            .await
            .map_err(interpret_error)?;
    }

    (&mut *conn)
        .execute("SELECT pg_catalog.set_config('search_path', '', false)")
        .await
        .map_err(interpret_error)?;
    Ok(())
}

#[derive(Debug)]
pub struct PgSessionManager {
    dsn: String,
    schema: String,
    conn: OnceCell<SharedConnection>,
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

impl PgSessionManager {
    pub fn new(dsn: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            schema: schema.into(),
            conn: OnceCell::new(),
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

    pub fn schema(&self) -> &str {
        &self.schema
    }

    async fn connection(&self) -> Result<SharedConnection> {
        self.connect().await?;
        self.conn.get().cloned().ok_or(ErrorCode::NotInitialized)
    }

    async fn run_control(&self, statement: &str) -> Result<()> {
        let conn = self.conn.get().ok_or(ErrorCode::NotInitialized)?;
        debug!("{statement}");

        let mut conn = conn.lock().await;
        (&mut *conn).execute(statement).await.map_err(|e| {
            warn!("{statement} failed: {e}");
            ErrorCode::DatabaseAccessFailure
        })?;
        Ok(())
    }
}

#[async_trait]
impl DbSessionManager for PgSessionManager {
    async fn connect(&self) -> Result<()> {
        self.conn
            .get_or_try_init(|| async {
                if !is_valid_schema_name(&self.schema) {
                    warn!("Invalid metadata schema name {:?}", self.schema);
                    return Err(ErrorCode::InvalidParameter);
                }

                info!("Connecting to the metadata database");
                let mut conn = PgConnection::connect(&self.dsn)
                    .await
                    .map_err(interpret_error)?;
                bootstrap(&mut conn, &self.schema).await?;

                Ok(Arc::new(Mutex::new(conn)))
            })
            .await?;
        Ok(())
    }

    async fn tables_dao(&self) -> Result<Arc<dyn TablesDao>> {
        let conn = self.connection().await?;
        get_or_prepare(&self.tables, || {
            let dao: Arc<dyn TablesDao> = Arc::new(PgTablesDao::new(conn, &self.schema));
            Ok(dao)
        })
        .await
    }

    async fn columns_dao(&self) -> Result<Arc<dyn ColumnsDao>> {
        let conn = self.connection().await?;
        get_or_prepare(&self.columns, || {
            let dao: Arc<dyn ColumnsDao> = Arc::new(PgColumnsDao::new(conn, &self.schema));
            Ok(dao)
        })
        .await
    }

    async fn constraints_dao(&self) -> Result<Arc<dyn ConstraintsDao>> {
        let conn = self.connection().await?;
        get_or_prepare(&self.constraints, || {
            let dao: Arc<dyn ConstraintsDao> =
                Arc::new(PgConstraintsDao::new(conn, &self.schema));
            Ok(dao)
        })
        .await
    }

    async fn indexes_dao(&self) -> Result<Arc<dyn IndexesDao>> {
        let conn = self.connection().await?;
        get_or_prepare(&self.indexes, || {
            let dao: Arc<dyn IndexesDao> = Arc::new(PgIndexesDao::new(conn, &self.schema));
            Ok(dao)
        })
        .await
    }

    async fn datatypes_dao(&self) -> Result<Arc<dyn DataTypesDao>> {
        let conn = self.connection().await?;
        get_or_prepare(&self.datatypes, || {
            let dao: Arc<dyn DataTypesDao> =
                Arc::new(PgDataTypesDao::new(conn, &self.schema));
            Ok(dao)
        })
        .await
    }

    async fn roles_dao(&self) -> Result<Arc<dyn RolesDao>> {
        let conn = self.connection().await?;
        get_or_prepare(&self.roles, || {
            let dao: Arc<dyn RolesDao> = Arc::new(PgRolesDao::new(conn));
            Ok(dao)
        })
        .await
    }

    async fn statistics_dao(&self) -> Result<Arc<dyn StatisticsDao>> {
        let conn = self.connection().await?;
        get_or_prepare(&self.statistics, || {
            let dao: Arc<dyn StatisticsDao> =
                Arc::new(PgStatisticsDao::new(conn, &self.schema));
            Ok(dao)
        })
        .await
    }

    async fn privileges_dao(&self) -> Result<Arc<dyn PrivilegesDao>> {
        let conn = self.connection().await?;
        get_or_prepare(&self.privileges, || {
            let dao: Arc<dyn PrivilegesDao> =
                Arc::new(PgPrivilegesDao::new(conn, &self.schema));
            Ok(dao)
        })
        .await
    }

    async fn object_id_generator(&self) -> Result<Arc<dyn ObjectIdGenerator>> {
        let conn = self.connection().await?;
        let generator = self
            .object_id_generator
            .get_or_init(|| async {
                let generator: Arc<dyn ObjectIdGenerator> =
                    Arc::new(PgObjectIdGenerator::new(conn, &self.schema));
                generator
            })
            .await;
        Ok(generator.clone())
    }

    async fn start_transaction(&self) -> Result<()> {
        self.run_control("BEGIN").await
    }

    async fn commit(&self) -> Result<()> {
        self.run_control("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        self.run_control("ROLLBACK").await
    }
}

pub mod testutils {
    use rand::Rng;

    use super::PgSessionManager;

    pub fn get_random_schema() -> String {
        let mut rng = rand::thread_rng();
        (&mut rng)
            .sample_iter(rand::distributions::Alphanumeric)
            .filter(|c| c.is_ascii_alphabetic())
            .take(20)
            .map(char::from)
            .collect::<String>()
    }

    /// A session over a fresh random schema, so tests never share rows.
    pub fn make_session(dsn: &str) -> PgSessionManager {
        PgSessionManager::new(dsn, get_random_schema())
    }
}
