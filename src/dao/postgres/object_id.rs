use async_trait::async_trait;
use tracing::warn;

use super::SharedConnection;
use crate::dao::{ObjectClass, ObjectIdGenerator};
use crate::error::{ErrorCode, Result};
use crate::model::ObjectId;

/// Draws ids from the `BIGSERIAL` sequence of each class table.
#[derive(Debug)]
pub struct PgObjectIdGenerator {
    conn: SharedConnection,
    schema: String,
}

impl PgObjectIdGenerator {
    pub(crate) fn new(conn: SharedConnection, schema: &str) -> Self {
        Self {
            conn,
            schema: schema.to_string(),
        }
    }

    fn sequence(&self, class: ObjectClass) -> String {
        format!("{}.{class}_id_seq", self.schema)
    }
}

fn sequence_error(error: sqlx::Error) -> ErrorCode {
    warn!("Object id sequence failed: {error}");
    ErrorCode::InternalError
}

#[async_trait]
impl ObjectIdGenerator for PgObjectIdGenerator {
    async fn current(&self, class: ObjectClass) -> Result<ObjectId> {
        let sql = format!(
            "SELECT CASE WHEN is_called THEN last_value ELSE 0 END FROM {}",
            self.sequence(class)
        );

        let mut conn = self.conn.lock().await;
        let (current,): (ObjectId,) = sqlx::query_as(&sql)
            .fetch_one(&mut *conn)
            .await
            .map_err(sequence_error)?;
        Ok(current)
    }

    async fn generate(&self, class: ObjectClass) -> Result<ObjectId> {
        let mut conn = self.conn.lock().await;
        let (id,): (ObjectId,) = sqlx::query_as("SELECT pg_catalog.nextval($1::text::regclass)")
            .bind(self.sequence(class))
            .fetch_one(&mut *conn)
            .await
            .map_err(sequence_error)?;
        Ok(id)
    }
}
