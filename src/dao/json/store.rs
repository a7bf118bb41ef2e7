use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{ErrorCode, Result};
use crate::model::{
    ColumnStatistic, DataType, Index, Role, Table, BUILTIN_DATA_TYPES, FORMAT_VERSION,
    GENERATION,
};

/// Per-class description of one JSON document: where it lives, the name of
/// the array holding its objects and what a fresh document contains.
pub(crate) trait DocumentPolicy {
    const FILE_NAME: &'static str;
    const ROOT_NODE: &'static str;
    type Item: Serialize + DeserializeOwned;

    fn seed() -> Vec<Self::Item> {
        vec![]
    }
}

pub(crate) struct TablesDocument;
impl DocumentPolicy for TablesDocument {
    const FILE_NAME: &'static str = "tables.json";
    const ROOT_NODE: &'static str = "tables";
    type Item = Table;
}

pub(crate) struct DataTypesDocument;
impl DocumentPolicy for DataTypesDocument {
    const FILE_NAME: &'static str = "datatypes.json";
    const ROOT_NODE: &'static str = "datatypes";
    type Item = DataType;

    fn seed() -> Vec<DataType> {
        BUILTIN_DATA_TYPES.clone()
    }
}

pub(crate) struct RolesDocument;
impl DocumentPolicy for RolesDocument {
    const FILE_NAME: &'static str = "roles.json";
    const ROOT_NODE: &'static str = "roles";
    type Item = Role;
}

pub(crate) struct IndexesDocument;
impl DocumentPolicy for IndexesDocument {
    const FILE_NAME: &'static str = "indexes.json";
    const ROOT_NODE: &'static str = "indexes";
    type Item = Index;
}

pub(crate) struct StatisticsDocument;
impl DocumentPolicy for StatisticsDocument {
    const FILE_NAME: &'static str = "statistics.json";
    const ROOT_NODE: &'static str = "statistics";
    type Item = ColumnStatistic;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentHeader {
    #[serde(default = "crate::model::default_format_version")]
    format_version: i64,
}

/// Writes `contents` to a temporary file next to `path` and renames it over
/// `path`, so readers see either the old or the new document.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub(crate) fn load_document<P: DocumentPolicy>(dir: &Path) -> Result<Vec<P::Item>> {
    let path = dir.join(P::FILE_NAME);
    let contents = fs::read_to_string(&path).map_err(|e| {
        warn!("Failed to read {}: {e}", path.display());
        ErrorCode::Unknown
    })?;
    let mut root: Value = serde_json::from_str(&contents).map_err(|e| {
        warn!("Failed to parse {}: {e}", path.display());
        ErrorCode::Unknown
    })?;

    let header: DocumentHeader = serde_json::from_value(root.clone()).map_err(|e| {
        warn!("Invalid document header in {}: {e}", path.display());
        ErrorCode::Unknown
    })?;
    if header.format_version != FORMAT_VERSION {
        warn!(
            "{} has format version {}, expected {FORMAT_VERSION}",
            path.display(),
            header.format_version
        );
    }

    match root.get_mut(P::ROOT_NODE).map(Value::take) {
        Some(items) => serde_json::from_value(items).map_err(|e| {
            warn!("Invalid {} in {}: {e}", P::ROOT_NODE, path.display());
            ErrorCode::Unknown
        }),
        None => Ok(vec![]),
    }
}

pub(crate) fn save_document<P: DocumentPolicy>(dir: &Path, items: &[P::Item]) -> Result<()> {
    let path = dir.join(P::FILE_NAME);

    let mut root = Map::new();
    root.insert("formatVersion".to_string(), FORMAT_VERSION.into());
    root.insert("generation".to_string(), GENERATION.into());
    root.insert(
        P::ROOT_NODE.to_string(),
        serde_json::to_value(items).map_err(|e| {
            warn!("Failed to serialize {}: {e}", P::ROOT_NODE);
            ErrorCode::InternalError
        })?,
    );

    let contents = serde_json::to_vec_pretty(&Value::Object(root)).map_err(|e| {
        warn!("Failed to serialize {}: {e}", P::ROOT_NODE);
        ErrorCode::InternalError
    })?;
    write_atomically(&path, &contents).map_err(|e| {
        warn!("Failed to write {}: {e}", path.display());
        ErrorCode::InternalError
    })
}

fn ensure_document<P: DocumentPolicy>(dir: &Path) -> Result<()> {
    if dir.join(P::FILE_NAME).exists() {
        return Ok(());
    }
    debug!("Creating {} in {}", P::FILE_NAME, dir.display());
    save_document::<P>(dir, &P::seed())
}

/// In-memory copy of every document in the storage directory.
#[derive(Debug, Default, Clone)]
pub(crate) struct Catalog {
    pub tables: Vec<Table>,
    pub datatypes: Vec<DataType>,
    pub roles: Vec<Role>,
    pub indexes: Vec<Index>,
    pub statistics: Vec<ColumnStatistic>,
}

impl Catalog {
    fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            tables: load_document::<TablesDocument>(dir)?,
            datatypes: load_document::<DataTypesDocument>(dir)?,
            // Roles are owned by the deployment; an absent file means no roles.
            roles: if dir.join(RolesDocument::FILE_NAME).exists() {
                load_document::<RolesDocument>(dir)?
            } else {
                vec![]
            },
            indexes: load_document::<IndexesDocument>(dir)?,
            statistics: load_document::<StatisticsDocument>(dir)?,
        })
    }

    pub fn table(&self, table_id: i64) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == Some(table_id))
    }

    pub fn table_mut(&mut self, table_id: i64) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == Some(table_id))
    }
}

/// The JSON store: the loaded documents plus the directory they came from.
/// Mutations only reach the disk on [`JsonStore::save`].
#[derive(Debug)]
pub(crate) struct JsonStore {
    dir: PathBuf,
    catalog: Mutex<Catalog>,
    // Last state known to match the disk
    committed: Mutex<Catalog>,
}

impl JsonStore {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            warn!("Failed to create storage directory {}: {e}", dir.display());
            ErrorCode::Unknown
        })?;

        ensure_document::<TablesDocument>(dir)?;
        ensure_document::<DataTypesDocument>(dir)?;
        ensure_document::<IndexesDocument>(dir)?;
        ensure_document::<StatisticsDocument>(dir)?;
        let catalog = Catalog::load(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            catalog: Mutex::new(catalog.clone()),
            committed: Mutex::new(catalog),
        })
    }

    /// Discards in-memory changes by reloading the documents. If they can't be
    /// read, the last committed state is restored and the error returned.
    pub fn reload(&self) -> Result<()> {
        match Catalog::load(&self.dir) {
            Ok(catalog) => {
                *self.committed.lock() = catalog.clone();
                *self.catalog.lock() = catalog;
                Ok(())
            }
            Err(error) => {
                warn!("Restoring the last committed metadata after {error}");
                let committed = self.committed.lock().clone();
                *self.catalog.lock() = committed;
                Err(error)
            }
        }
    }

    /// Flushes the mutable documents. Data types and roles are never written
    /// back.
    pub fn save(&self) -> Result<()> {
        let catalog = self.catalog.lock();
        save_document::<TablesDocument>(&self.dir, &catalog.tables)?;
        save_document::<IndexesDocument>(&self.dir, &catalog.indexes)?;
        save_document::<StatisticsDocument>(&self.dir, &catalog.statistics)?;
        *self.committed.lock() = catalog.clone();
        Ok(())
    }

    pub fn read<R>(&self, f: impl FnOnce(&Catalog) -> R) -> R {
        f(&self.catalog.lock())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut Catalog) -> R) -> R {
        f(&mut self.catalog.lock())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::{load_document, JsonStore, TablesDocument};
    use crate::error::ErrorCode;
    use crate::model::Table;

    #[test]
    fn test_open_creates_seeded_documents() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        let tables: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("tables.json")).unwrap())
                .unwrap();
        assert_eq!(
            tables,
            json!({"formatVersion": 1, "generation": 1, "tables": []})
        );
        assert!(!dir.path().join("roles.json").exists());
        assert_eq!(store.read(|c| c.datatypes.len()), 13);
    }

    #[test]
    fn test_mutations_are_durable_only_after_save() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        store.write(|c| {
            let mut table = Table::new("t1");
            table.id = Some(1);
            c.tables.push(table);
        });
        assert!(load_document::<TablesDocument>(dir.path()).unwrap().is_empty());

        store.save().unwrap();
        let tables = load_document::<TablesDocument>(dir.path()).unwrap();
        assert_eq!(tables[0].name, "t1");

        store.write(|c| c.tables.clear());
        store.reload().unwrap();
        assert_eq!(store.read(|c| c.tables.len()), 1);
    }

    #[test]
    fn test_corrupt_document_is_unknown_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("tables.json"), "{not json").unwrap();

        assert_eq!(store.reload().unwrap_err(), ErrorCode::Unknown);
    }

    #[test]
    fn test_failed_reload_restores_the_committed_state() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        store.write(|c| c.tables.push(Table::new("pending")));

        fs::remove_file(dir.path().join("tables.json")).unwrap();
        fs::create_dir(dir.path().join("tables.json")).unwrap();

        assert_eq!(store.reload().unwrap_err(), ErrorCode::Unknown);
        assert!(store.read(|c| c.tables.is_empty()));
        assert_eq!(store.read(|c| c.datatypes.len()), 13);
    }
}
