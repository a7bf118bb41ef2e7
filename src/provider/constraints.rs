use std::sync::Arc;

use super::in_transaction;
use crate::dao::{DbSessionManager, ObjectClass, ObjectKey};
use crate::error::Result;
use crate::model::{Constraint, ObjectId};

/// Constraints managed on their own, outside of a table definition.
#[derive(Debug, Clone)]
pub struct ConstraintsProvider {
    session: Arc<dyn DbSessionManager>,
}

impl ConstraintsProvider {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self { session }
    }

    pub async fn init(&self) -> Result<()> {
        self.session.constraints_dao().await?;
        self.session.object_id_generator().await?;
        Ok(())
    }

    pub async fn add_constraint(&self, constraint: &Constraint) -> Result<ObjectId> {
        let constraints = self.session.constraints_dao().await?;
        let ids = self.session.object_id_generator().await?;

        in_transaction(self.session.as_ref(), || async {
            let constraint_id = ids.generate(ObjectClass::Constraints).await?;
            constraints
                .insert_constraint(&Constraint {
                    id: Some(constraint_id),
                    ..constraint.clone()
                })
                .await
        })
        .await
    }

    pub async fn get_constraint(&self, key: ObjectKey<'_>) -> Result<Constraint> {
        self.session
            .constraints_dao()
            .await?
            .select_constraint(key)
            .await
    }

    /// Constraints of one table, keyed by `TableId`.
    pub async fn get_constraints(&self, key: ObjectKey<'_>) -> Result<Vec<Constraint>> {
        self.session
            .constraints_dao()
            .await?
            .select_constraints(key)
            .await
    }

    pub async fn get_all_constraints(&self) -> Result<Vec<Constraint>> {
        self.session
            .constraints_dao()
            .await?
            .select_all_constraints()
            .await
    }

    pub async fn remove_constraint(&self, key: ObjectKey<'_>) -> Result<ObjectId> {
        let constraints = self.session.constraints_dao().await?;

        let removed =
            in_transaction(self.session.as_ref(), || constraints.delete_constraints(key)).await?;
        removed.first().copied().ok_or_else(|| key.not_found())
    }
}
