//! Record store for exercises, routines, workouts and equipment.
//!
//! The session engine only needs keyed create/read/update/delete per record
//! kind. Two implementations are provided:
//! - `MemoryStore` for tests and embedding hosts
//! - `JsonFileStore`, one JSON document per kind with file locking

use crate::{
    BodyCompositionEntry, Error, ExerciseProfile, PlateInventoryEntry, Result, Routine,
    WorkoutSession, WorkoutSetRecord,
};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Kind of record held by a store
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Exercise,
    Routine,
    Workout,
    WorkoutSet,
    PlateInventory,
    BodyComposition,
}

impl RecordKind {
    /// File name used by `JsonFileStore`
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Exercise => "exercises.json",
            RecordKind::Routine => "routines.json",
            RecordKind::Workout => "workouts.json",
            RecordKind::WorkoutSet => "workout_sets.json",
            RecordKind::PlateInventory => "plate_inventory.json",
            RecordKind::BodyComposition => "body_composition.json",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Exercise => "exercise",
            RecordKind::Routine => "routine",
            RecordKind::Workout => "workout",
            RecordKind::WorkoutSet => "workout set",
            RecordKind::PlateInventory => "plate inventory entry",
            RecordKind::BodyComposition => "body composition entry",
        })
    }
}

/// A value that can be kept in a record store
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KIND: RecordKind;
    fn id(&self) -> Uuid;
}

macro_rules! impl_record {
    ($ty:ty, $kind:expr) => {
        impl Record for $ty {
            const KIND: RecordKind = $kind;
            fn id(&self) -> Uuid {
                self.id
            }
        }
    };
}

impl_record!(ExerciseProfile, RecordKind::Exercise);
impl_record!(Routine, RecordKind::Routine);
impl_record!(WorkoutSession, RecordKind::Workout);
impl_record!(WorkoutSetRecord, RecordKind::WorkoutSet);
impl_record!(PlateInventoryEntry, RecordKind::PlateInventory);
impl_record!(BodyCompositionEntry, RecordKind::BodyComposition);

/// Keyed persistence per record kind
///
/// Implementations report their own failures as `Error::StoreFailure`.
pub trait RecordStore {
    fn get<R: Record>(&self, id: Uuid) -> Result<Option<R>>;

    fn list<R: Record>(&self) -> Result<Vec<R>>;

    /// Fails if a record with the same id already exists
    fn insert<R: Record>(&mut self, record: &R) -> Result<()>;

    /// Fails with `NotFound` if the record does not exist
    fn update<R: Record>(&mut self, record: &R) -> Result<()>;

    /// Returns whether a record was removed
    fn delete<R: Record>(&mut self, id: Uuid) -> Result<bool>;

    /// Like `get`, but a missing record is an error
    fn require<R: Record>(&self, id: Uuid) -> Result<R> {
        self.get(id)?.ok_or(Error::NotFound { kind: R::KIND, id })
    }
}

type Table = BTreeMap<Uuid, Value>;

fn encode<R: Record>(record: &R) -> Result<Value> {
    serde_json::to_value(record)
        .map_err(|e| Error::StoreFailure(format!("failed to encode {}: {}", R::KIND, e)))
}

fn decode<R: Record>(value: &Value) -> Result<R> {
    R::deserialize(value)
        .map_err(|e| Error::StoreFailure(format!("failed to decode {}: {}", R::KIND, e)))
}

fn insert_into<R: Record>(table: &mut Table, record: &R) -> Result<()> {
    let id = record.id();
    if table.contains_key(&id) {
        return Err(Error::StoreFailure(format!("{} {} already exists", R::KIND, id)));
    }
    table.insert(id, encode(record)?);
    Ok(())
}

fn update_in<R: Record>(table: &mut Table, record: &R) -> Result<()> {
    let id = record.id();
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = encode(record)?;
            Ok(())
        }
        None => Err(Error::NotFound { kind: R::KIND, id }),
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-process store with switches for injecting write failures in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<RecordKind, Table>,
    fail_writes: bool,
    fail_once_after: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
        self.fail_once_after = None;
    }

    /// Let `n` writes through, fail the next one, then recover
    pub fn fail_once_after(&mut self, n: usize) {
        self.fail_writes = false;
        self.fail_once_after = Some(n);
    }

    /// Number of records of a kind
    pub fn count(&self, kind: RecordKind) -> usize {
        self.tables.get(&kind).map_or(0, BTreeMap::len)
    }

    fn check_write(&mut self, kind: RecordKind) -> Result<()> {
        if let Some(left) = self.fail_once_after {
            if left == 0 {
                self.fail_once_after = None;
                return Err(Error::StoreFailure(format!("write to {} rejected", kind)));
            }
            self.fail_once_after = Some(left - 1);
        }
        if self.fail_writes {
            return Err(Error::StoreFailure(format!("write to {} rejected", kind)));
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn get<R: Record>(&self, id: Uuid) -> Result<Option<R>> {
        self.tables
            .get(&R::KIND)
            .and_then(|t| t.get(&id))
            .map(decode)
            .transpose()
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        self.tables
            .get(&R::KIND)
            .map(|t| t.values().map(decode).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn insert<R: Record>(&mut self, record: &R) -> Result<()> {
        self.check_write(R::KIND)?;
        insert_into(self.tables.entry(R::KIND).or_default(), record)
    }

    fn update<R: Record>(&mut self, record: &R) -> Result<()> {
        self.check_write(R::KIND)?;
        update_in(self.tables.entry(R::KIND).or_default(), record)
    }

    fn delete<R: Record>(&mut self, id: Uuid) -> Result<bool> {
        self.check_write(R::KIND)?;
        Ok(self
            .tables
            .get_mut(&R::KIND)
            .is_some_and(|t| t.remove(&id).is_some()))
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Directory of JSON documents, one per record kind
///
/// Reads take a shared lock; writes go to a locked temp file that is synced
/// and renamed over the original.
pub struct JsonFileStore {
    dir: PathBuf,
}

fn io_failure(path: &Path, e: impl fmt::Display) -> Error {
    Error::StoreFailure(format!("{}: {}", path.display(), e))
}

impl JsonFileStore {
    /// Create a store rooted at `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, kind: RecordKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    fn load_table(&self, kind: RecordKind) -> Result<Table> {
        let path = self.path_for(kind);
        if !path.exists() {
            return Ok(Table::new());
        }

        let file = File::open(&path).map_err(|e| io_failure(&path, e))?;
        file.lock_shared().map_err(|e| io_failure(&path, e))?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        let _ = file.unlock();
        read.map_err(|e| io_failure(&path, e))?;

        if contents.trim().is_empty() {
            return Ok(Table::new());
        }

        let table: Table = serde_json::from_str(&contents).map_err(|e| io_failure(&path, e))?;
        tracing::debug!("Loaded {} {} records from {:?}", table.len(), kind, path);
        Ok(table)
    }

    fn save_table(&self, kind: RecordKind, table: &Table) -> Result<()> {
        let path = self.path_for(kind);
        std::fs::create_dir_all(&self.dir).map_err(|e| io_failure(&self.dir, e))?;

        let temp = NamedTempFile::new_in(&self.dir).map_err(|e| io_failure(&self.dir, e))?;
        temp.as_file()
            .lock_exclusive()
            .map_err(|e| io_failure(&path, e))?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(table).map_err(|e| io_failure(&path, e))?;
            writer
                .write_all(contents.as_bytes())
                .and_then(|_| writer.flush())
                .map_err(|e| io_failure(&path, e))?;
        }

        temp.as_file().sync_all().map_err(|e| io_failure(&path, e))?;
        let _ = temp.as_file().unlock();
        temp.persist(&path).map_err(|e| io_failure(&path, e.error))?;

        tracing::debug!("Saved {} {} records to {:?}", table.len(), kind, path);
        Ok(())
    }

    fn modify<F, T>(&mut self, kind: RecordKind, f: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T>,
    {
        let mut table = self.load_table(kind)?;
        let out = f(&mut table)?;
        self.save_table(kind, &table)?;
        Ok(out)
    }
}

impl RecordStore for JsonFileStore {
    fn get<R: Record>(&self, id: Uuid) -> Result<Option<R>> {
        self.load_table(R::KIND)?.get(&id).map(decode).transpose()
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        self.load_table(R::KIND)?.values().map(decode).collect()
    }

    fn insert<R: Record>(&mut self, record: &R) -> Result<()> {
        self.modify(R::KIND, |t| insert_into(t, record))
    }

    fn update<R: Record>(&mut self, record: &R) -> Result<()> {
        self.modify(R::KIND, |t| update_in(t, record))
    }

    fn delete<R: Record>(&mut self, id: Uuid) -> Result<bool> {
        self.modify(R::KIND, |t| Ok(t.remove(&id).is_some()))
    }
}
