use std::sync::Arc;

use super::{id_key, positive};
use crate::dao::{DbSessionManager, ObjectKey};
use crate::error::{ErrorCode, Result};
use crate::model::{Constraint, ObjectId};
use crate::provider::ConstraintsProvider;

/// Constraints added after their table was created.
#[derive(Debug, Clone)]
pub struct Constraints {
    provider: ConstraintsProvider,
}

impl Constraints {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self {
            provider: ConstraintsProvider::new(session),
        }
    }

    pub async fn init(&self) -> Result<()> {
        self.provider.init().await
    }

    pub async fn add(&self, constraint: &Constraint) -> Result<ObjectId> {
        positive(constraint.table_id)?;
        if constraint.constraint_type.is_none() {
            return Err(ErrorCode::InvalidParameter);
        }

        self.provider.add_constraint(constraint).await
    }

    pub async fn get(&self, id: ObjectId) -> Result<Constraint> {
        self.provider.get_constraint(id_key(id)?).await
    }

    pub async fn get_all(&self) -> Result<Vec<Constraint>> {
        self.provider.get_all_constraints().await
    }

    pub async fn get_all_by_table_id(&self, table_id: ObjectId) -> Result<Vec<Constraint>> {
        let key = ObjectKey::TableId(positive(Some(table_id))?);
        self.provider.get_constraints(key).await
    }

    pub async fn remove(&self, id: ObjectId) -> Result<ObjectId> {
        self.provider.remove_constraint(id_key(id)?).await
    }
}
