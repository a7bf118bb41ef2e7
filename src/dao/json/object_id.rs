use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use tracing::warn;

use super::store::write_atomically;
use crate::dao::{ObjectClass, ObjectIdGenerator};
use crate::error::{ErrorCode, Result};
use crate::model::ObjectId;

pub const OID_FILE_NAME: &str = "oid.json";

lazy_static! {
    // One lock per counter file, shared by every generator in the process
    static ref COUNTER_LOCKS: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>> =
        Mutex::new(HashMap::new());
}

fn counter_lock(storage_dir: &Path) -> Arc<Mutex<()>> {
    let dir = fs::canonicalize(storage_dir).unwrap_or_else(|_| storage_dir.to_path_buf());
    COUNTER_LOCKS
        .lock()
        .entry(dir.join(OID_FILE_NAME))
        .or_default()
        .clone()
}

/// Counter side file with the last id issued per object class.
///
/// Generators over the same storage directory share a lock, so sessions in
/// one process never hand out the same id. Two processes sharing a storage
/// directory can.
#[derive(Debug)]
pub struct JsonObjectIdGenerator {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonObjectIdGenerator {
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            path: storage_dir.join(OID_FILE_NAME),
            lock: counter_lock(storage_dir),
        }
    }

    fn read_counters(&self) -> Result<BTreeMap<String, ObjectId>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                warn!("Corrupt id file {}: {e}", self.path.display());
                ErrorCode::InternalError
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => {
                warn!("Failed to read id file {}: {e}", self.path.display());
                Err(ErrorCode::InternalError)
            }
        }
    }

    fn next(&self, class: ObjectClass) -> Result<ObjectId> {
        let _guard = self.lock.lock();

        let mut counters = self.read_counters()?;
        let counter = counters.entry(class.to_string()).or_insert(0);
        *counter = counter.checked_add(1).ok_or(ErrorCode::InternalError)?;
        let id = *counter;

        let contents = serde_json::to_vec_pretty(&counters).map_err(|e| {
            warn!("Failed to serialize id counters: {e}");
            ErrorCode::InternalError
        })?;
        write_atomically(&self.path, &contents).map_err(|e| {
            warn!("Failed to write id file {}: {e}", self.path.display());
            ErrorCode::InternalError
        })?;

        Ok(id)
    }
}

#[async_trait]
impl ObjectIdGenerator for JsonObjectIdGenerator {
    async fn current(&self, class: ObjectClass) -> Result<ObjectId> {
        let _guard = self.lock.lock();
        Ok(self
            .read_counters()?
            .get(class.as_ref())
            .copied()
            .unwrap_or(0))
    }

    async fn generate(&self, class: ObjectClass) -> Result<ObjectId> {
        self.next(class)
    }
}
