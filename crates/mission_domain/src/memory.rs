use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Filter, Row, Store, StoreError, Table};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TableData {
    next_id: i64,
    rows: Vec<Row>,
}

impl TableData {
    fn assign_id(&mut self, mut row: Row) -> Row {
        self.next_id += 1;
        row.insert("id".to_string(), Value::from(self.next_id));
        row
    }
}

type Tables = BTreeMap<Table, TableData>;

/// Process-local store. Every table lives behind one lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    fn snapshot(&self) -> Tables {
        self.tables.read().clone()
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.tables
            .read()
            .get(&table)
            .map(|data| data.rows.len())
            .unwrap_or(0)
    }
}

fn row_id(row: &Row) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn merge(target: &mut Row, patch: Row) {
    for (key, value) in patch {
        if key != "id" {
            target.insert(key, value);
        }
    }
}

impl Store for InMemoryStore {
    fn get(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .get(&table)
            .map(|data| {
                data.rows
                    .iter()
                    .filter(|row| filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write();
        let data = tables.entry(table).or_default();
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let row = data.assign_id(row);
            data.rows.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    fn update(&self, table: Table, id: i64, patch: Row) -> Result<Row, StoreError> {
        let mut tables = self.tables.write();
        let row = tables
            .get_mut(&table)
            .and_then(|data| data.rows.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or(StoreError::MissingRow { table, id })?;
        merge(row, patch);
        Ok(row.clone())
    }

    fn delete(&self, table: Table, filter: &Filter) -> Result<usize, StoreError> {
        let mut tables = self.tables.write();
        let Some(data) = tables.get_mut(&table) else {
            return Ok(0);
        };
        let before = data.rows.len();
        data.rows.retain(|row| !filter.matches(row));
        Ok(before - data.rows.len())
    }

    fn upsert(&self, table: Table, row: Row, conflict_key: &[&str]) -> Result<Row, StoreError> {
        if conflict_key.is_empty() {
            return Err(StoreError::Malformed {
                table,
                reason: "upsert needs at least one conflict key field".to_string(),
            });
        }
        let mut key_filter = Filter::all();
        for field in conflict_key {
            let value = row.get(*field).cloned().ok_or_else(|| StoreError::Malformed {
                table,
                reason: format!("upsert row is missing conflict key `{field}`"),
            })?;
            key_filter = key_filter.equals(field, value);
        }

        let mut tables = self.tables.write();
        let data = tables.entry(table).or_default();
        if let Some(existing) = data.rows.iter_mut().find(|row| key_filter.matches(row)) {
            merge(existing, row);
            return Ok(existing.clone());
        }
        let row = data.assign_id(row);
        data.rows.push(row.clone());
        Ok(row)
    }
}

/// An [`InMemoryStore`] persisted as one JSON document, rewritten after every write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    /// Loads `path` if it exists; otherwise starts empty and creates it on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                InMemoryStore::new()
            } else {
                InMemoryStore::from_tables(serde_json::from_str(&raw)?)
            }
        } else {
            InMemoryStore::new()
        };
        tracing::debug!(path = %path.display(), "opened json store");
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot beside the target and renames it into place, so a
    /// crash leaves either the old or the new document.
    fn flush(&self) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("store.json");
        let tmp = parent.join(format!(".{file_name}.tmp.{}", std::process::id()));

        let payload = serde_json::to_vec_pretty(&self.inner.snapshot())?;
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }
}

impl Store for JsonFileStore {
    fn get(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        self.inner.get(table, filter)
    }

    fn insert(&self, table: Table, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let stored = self.inner.insert(table, rows)?;
        self.flush()?;
        Ok(stored)
    }

    fn update(&self, table: Table, id: i64, patch: Row) -> Result<Row, StoreError> {
        let row = self.inner.update(table, id, patch)?;
        self.flush()?;
        Ok(row)
    }

    fn delete(&self, table: Table, filter: &Filter) -> Result<usize, StoreError> {
        let removed = self.inner.delete(table, filter)?;
        if removed > 0 {
            self.flush()?;
        }
        Ok(removed)
    }

    fn upsert(&self, table: Table, row: Row, conflict_key: &[&str]) -> Result<Row, StoreError> {
        let row = self.inner.upsert(table, row, conflict_key)?;
        self.flush()?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let stored = store
            .insert(
                Table::Tasks,
                vec![row(json!({"title": "a"})), row(json!({"id": 99, "title": "b"}))],
            )
            .unwrap();
        assert_eq!(row_id(&stored[0]), Some(1));
        assert_eq!(row_id(&stored[1]), Some(2));
    }

    #[test]
    fn update_merges_and_keeps_id() {
        let store = InMemoryStore::new();
        store
            .insert(Table::Skills, vec![row(json!({"name": "Go", "level": 1}))])
            .unwrap();
        let updated = store
            .update(Table::Skills, 1, row(json!({"id": 50, "level": 2})))
            .unwrap();
        assert_eq!(updated, row(json!({"id": 1, "name": "Go", "level": 2})));

        let missing = store.update(Table::Skills, 7, Row::new());
        assert!(matches!(missing, Err(StoreError::MissingRow { id: 7, .. })));
    }

    #[test]
    fn upsert_resolves_on_conflict_key() {
        let store = InMemoryStore::new();
        store
            .upsert(
                Table::SleepLogs,
                row(json!({"date": "2026-10-18", "hours_slept": 6.0})),
                &["date"],
            )
            .unwrap();
        let second = store
            .upsert(
                Table::SleepLogs,
                row(json!({"date": "2026-10-18", "hours_slept": 8.0})),
                &["date"],
            )
            .unwrap();
        assert_eq!(store.row_count(Table::SleepLogs), 1);
        assert_eq!(second.get("hours_slept"), Some(&json!(8.0)));
        assert_eq!(row_id(&second), Some(1));
    }

    #[test]
    fn upsert_without_key_value_is_rejected() {
        let store = InMemoryStore::new();
        let result = store.upsert(Table::SleepLogs, row(json!({"hours_slept": 6.0})), &["date"]);
        assert!(matches!(result, Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn delete_reports_removed_rows() {
        let store = InMemoryStore::new();
        store
            .insert(
                Table::TaskLogs,
                vec![
                    row(json!({"task_id": 1, "date": "2026-10-18"})),
                    row(json!({"task_id": 1, "date": "2026-10-17"})),
                    row(json!({"task_id": 2, "date": "2026-10-18"})),
                ],
            )
            .unwrap();
        let removed = store
            .delete(
                Table::TaskLogs,
                &Filter::all().equals("task_id", 1).equals("date", "2026-10-18"),
            )
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.row_count(Table::TaskLogs), 2);
        assert_eq!(store.delete(Table::Goals, &Filter::all()).unwrap(), 0);
    }

    #[test]
    fn json_store_replaces_the_file_without_leftovers() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missions.json");
        let store = JsonFileStore::open(&path).unwrap();
        store
            .insert(Table::Goals, vec![row(json!({"title": "Ship"}))])
            .unwrap();
        store
            .insert(Table::Goals, vec![row(json!({"title": "Rest"}))])
            .unwrap();

        let entries: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("missions.json")]);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(Table::Goals, &Filter::all()).unwrap().len(), 2);
    }
}
