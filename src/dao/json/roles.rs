use std::sync::Arc;

use async_trait::async_trait;

use super::store::JsonStore;
use crate::dao::{Dao, ObjectKey, RolesDao};
use crate::error::{ErrorCode, Result};
use crate::model::Role;

/// Roles come from a `roles.json` maintained outside this library.
#[derive(Debug)]
pub struct JsonRolesDao {
    store: Arc<JsonStore>,
}

impl JsonRolesDao {
    pub(crate) fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Dao for JsonRolesDao {
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl RolesDao for JsonRolesDao {
    async fn select_role(&self, key: ObjectKey<'_>) -> Result<Role> {
        self.store.read(|catalog| {
            let matching: Vec<&Role> = match key {
                ObjectKey::Id(id) => catalog.roles.iter().filter(|r| r.id == id).collect(),
                ObjectKey::Name(name) => {
                    catalog.roles.iter().filter(|r| r.name == name).collect()
                }
                _ => return Err(ErrorCode::InvalidParameter),
            };

            match matching.as_slice() {
                [] => Err(key.not_found()),
                [role] => Ok((*role).clone()),
                _ => Err(ErrorCode::InvalidParameter),
            }
        })
    }
}
