use std::sync::Arc;

use tracing::info;

use super::schema::{self, MetadataConfig};
use crate::dao::json::JsonSessionManager;
#[cfg(feature = "backend-postgres")]
use crate::dao::postgres::PgSessionManager;
use crate::dao::DbSessionManager;

/// Creates the session manager of the configured backend. Nothing is opened
/// until `connect()` is called on it.
pub fn build_session(config: &MetadataConfig) -> Arc<dyn DbSessionManager> {
    match &config.backend {
        #[cfg(feature = "backend-postgres")]
        schema::Backend::Postgres(schema::Postgres { dsn, schema }) => {
            info!("Using the PostgreSQL backend in schema {schema}");
            Arc::new(PgSessionManager::new(dsn.clone(), schema.clone()))
        }
        schema::Backend::Json(schema::Json { storage_dir }) => {
            info!("Using the JSON backend in {storage_dir}");
            Arc::new(JsonSessionManager::new(storage_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::build_session;
    use crate::config::schema::load_config_from_string;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_build_json_session() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from_string(
            &format!(
                "[backend]\ntype = \"json\"\nstorage_dir = \"{}\"",
                dir.path().display()
            ),
            false,
        )
        .unwrap();

        let session = build_session(&config);
        assert_eq!(
            session.start_transaction().await.unwrap_err(),
            ErrorCode::NotInitialized
        );
        session.connect().await.unwrap();
        assert!(session.tables_dao().await.is_ok());
    }
}
