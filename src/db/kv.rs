//! Named persistent slots holding a single opaque string each.
//!
//! The order history lives in one slot as a JSON array that is rewritten
//! wholesale on every change. There is no versioning and no partial update.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;

/// Persistent key/value storage used by the order store.
pub trait KeyValueSlot {
    /// Current value of `key`, or `None` when nothing was ever written.
    fn read(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    /// Replace the value of `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<(), DatabaseError>;
}

/// Slots backed by the `kv_slots` table of the application database.
pub struct SqliteSlot {
    conn: Connection,
}

impl SqliteSlot {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_database(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_memory_database()?,
        })
    }
}

impl KeyValueSlot for SqliteSlot {
    fn read(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        self.conn.execute(
            "INSERT INTO kv_slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }
}

/// In-memory slots for tests. Clones share the same storage, so a test can
/// keep a handle after moving one into a store.
#[derive(Clone, Default)]
pub struct MemorySlot {
    values: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<RefCell<usize>>,
    fail_writes: bool,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `value` already stored under `key`.
    pub fn with_value(key: &str, value: &str) -> Self {
        let slot = Self::new();
        slot.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        slot
    }

    /// Every write fails with an I/O error.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl KeyValueSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), DatabaseError> {
        if self.fail_writes {
            return Err(DatabaseError::Io(std::io::Error::other(
                "memory slot configured to fail",
            )));
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_slot_empty_read_is_none() {
        let slot = SqliteSlot::open_in_memory().unwrap();
        assert_eq!(slot.read("merchant_orders").unwrap(), None);
    }

    #[test]
    fn sqlite_slot_overwrites_value() {
        let mut slot = SqliteSlot::open_in_memory().unwrap();
        slot.write("merchant_orders", "[1]").unwrap();
        slot.write("merchant_orders", "[2]").unwrap();
        assert_eq!(slot.read("merchant_orders").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn sqlite_slot_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.db");
        {
            let mut slot = SqliteSlot::open(&path).unwrap();
            slot.write("merchant_orders", "[]").unwrap();
        }
        let slot = SqliteSlot::open(&path).unwrap();
        assert_eq!(slot.read("merchant_orders").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn sqlite_slot_keys_are_independent() {
        let mut slot = SqliteSlot::open_in_memory().unwrap();
        slot.write("a", "1").unwrap();
        slot.write("b", "2").unwrap();
        assert_eq!(slot.read("a").unwrap().as_deref(), Some("1"));
        assert_eq!(slot.read("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn memory_slot_clones_share_storage() {
        let handle = MemorySlot::new();
        let mut owned = handle.clone();
        owned.write("k", "v").unwrap();
        assert_eq!(handle.get("k").as_deref(), Some("v"));
        assert_eq!(handle.write_count(), 1);
    }

    #[test]
    fn memory_slot_failing_writes() {
        let mut slot = MemorySlot::new().failing_writes();
        assert!(slot.write("k", "v").is_err());
        assert_eq!(slot.get("k"), None);
        assert_eq!(slot.write_count(), 0);
    }
}
