use std::sync::Arc;

use crate::dao::{DbSessionManager, ObjectKey};
use crate::error::Result;
use crate::model::Role;

#[derive(Debug, Clone)]
pub struct RolesProvider {
    session: Arc<dyn DbSessionManager>,
}

impl RolesProvider {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self { session }
    }

    pub async fn init(&self) -> Result<()> {
        self.session.roles_dao().await?;
        Ok(())
    }

    pub async fn get_role(&self, key: ObjectKey<'_>) -> Result<Role> {
        self.session.roles_dao().await?.select_role(key).await
    }
}
