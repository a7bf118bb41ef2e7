use std::sync::Arc;

use super::{id_key, name_key};
use crate::dao::DbSessionManager;
use crate::error::Result;
use crate::model::{ObjectId, Role};
use crate::provider::RolesProvider;

#[derive(Debug, Clone)]
pub struct Roles {
    provider: RolesProvider,
}

impl Roles {
    pub fn new(session: Arc<dyn DbSessionManager>) -> Self {
        Self {
            provider: RolesProvider::new(session),
        }
    }

    pub async fn init(&self) -> Result<()> {
        self.provider.init().await
    }

    pub async fn get(&self, id: ObjectId) -> Result<Role> {
        self.provider.get_role(id_key(id)?).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Role> {
        self.provider.get_role(name_key(name)?).await
    }
}
