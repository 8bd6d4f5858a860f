use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use log::{error, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Prefix applied to every key written by this crate
pub const NAMESPACE: &str = "quizzer_";

pub mod keys {
    pub const QUIZ_HISTORY: &str = "quiz_history";
    pub const MISSED_QUESTIONS: &str = "missed_questions";
    pub const STATS: &str = "stats";
    pub const STREAK: &str = "streak";
    pub const LAST_QUIZ_DATE: &str = "last_quiz_date";
    pub const SAVED_QUIZZES: &str = "saved_quizzes";
    pub const TEMP_QUIZZES: &str = "temp_quizzes";
    pub const LEGACY_TEMP_QUIZ: &str = "temp_quiz";
}

const CREATE_KV_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
"#;

fn read_raw(conn: &Connection, key: &str) -> Result<Option<String>, StoreError> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

fn write_raw(conn: &Connection, key: &str, value: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)",
        params![key, value],
    )?;
    Ok(())
}

fn delete_raw(conn: &Connection, key: &str) -> Result<(), StoreError> {
    conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    Ok(())
}

/// JSON key/value contract shared by the store and its transactions.
///
/// `get` falls back to the supplied default on a missing or corrupt slot and
/// `save` reports failure as `false`; neither propagates an error.
pub trait KeyValue {
    fn namespace(&self) -> &str;
    fn connection(&self) -> &Connection;

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace(), key)
    }

    fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let full_key = self.full_key(key);
        match read_raw(self.connection(), &full_key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!("corrupt value under {full_key}, using default: {e}");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!("failed to read {full_key}, using default: {e}");
                default
            }
        }
    }

    /// Whether a slot exists at all, regardless of whether it parses.
    fn contains(&self, key: &str) -> bool {
        matches!(read_raw(self.connection(), &self.full_key(key)), Ok(Some(_)))
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let full_key = self.full_key(key);
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|raw| write_raw(self.connection(), &full_key, &raw));
        match result {
            Ok(()) => true,
            Err(e) => {
                error!("failed to save {full_key}: {e}");
                false
            }
        }
    }

    fn remove(&self, key: &str) -> bool {
        let full_key = self.full_key(key);
        match delete_raw(self.connection(), &full_key) {
            Ok(()) => true,
            Err(e) => {
                error!("failed to remove {full_key}: {e}");
                false
            }
        }
    }
}

/// Durable key/value store backed by a single sqlite table
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    namespace: String,
}

impl Store {
    /// Open the store at the default state location
    pub fn new() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("quizzer.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_KV_TABLE, [])?;
        Ok(Store {
            conn,
            namespace: NAMESPACE.to_string(),
        })
    }

    /// Run `f` inside an immediate transaction.
    ///
    /// Commits when `f` returns `Ok`. On `Err` the transaction is dropped
    /// and rusqlite rolls every write in it back.
    ///
    /// Ledger updates that read, modify and write back a slot go through
    /// here so that another process cannot interleave between the read and
    /// the write.
    pub fn transaction<R>(
        &mut self,
        f: impl FnOnce(&StoreTx<'_>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let handle = StoreTx {
            tx,
            namespace: &self.namespace,
        };
        let out = f(&handle)?;
        handle.tx.commit()?;
        Ok(out)
    }

    /// Remove every key in this store's namespace
    pub fn clear_all(&self) -> bool {
        // substr rather than LIKE: '_' in the namespace is a LIKE wildcard
        match self.conn.execute(
            "DELETE FROM kv WHERE substr(key, 1, ?2) = ?1",
            params![self.namespace, self.namespace.chars().count() as i64],
        ) {
            Ok(_) => true,
            Err(e) => {
                error!("failed to clear store: {e}");
                false
            }
        }
    }
}

impl KeyValue for Store {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Turn a ledger write outcome into an error that aborts the enclosing
/// transaction
pub fn ensure_written(saved: bool, ledger: &'static str) -> Result<(), StoreError> {
    if saved {
        Ok(())
    } else {
        Err(StoreError::WriteFailed(ledger))
    }
}

/// Handle passed to [`Store::transaction`] closures
pub struct StoreTx<'a> {
    tx: Transaction<'a>,
    namespace: &'a str,
}

impl KeyValue for StoreTx<'_> {
    fn namespace(&self) -> &str {
        self.namespace
    }

    fn connection(&self) -> &Connection {
        &self.tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        values: Vec<u32>,
        nested: Option<Box<Sample>>,
    }

    #[test]
    fn get_missing_key_returns_default() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.get("nothing", 42u32), 42);
        assert!(!store.contains("nothing"));
    }

    #[test]
    fn save_then_get_returns_equal_value() {
        let store = Store::open_in_memory().unwrap();
        let value = Sample {
            name: "outer".into(),
            values: vec![1, 2, 3],
            nested: Some(Box::new(Sample {
                name: "inner".into(),
                values: vec![],
                nested: None,
            })),
        };

        assert!(store.save("sample", &value));
        let loaded: Option<Sample> = store.get("sample", None);
        assert_eq!(loaded, Some(value));
    }

    #[test]
    fn arbitrary_json_survives_a_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let value = json!({
            "a": [1, 2.5, null, true, "x"],
            "b": {"c": {"d": []}},
            "unicode": "ñ漢字"
        });
        assert!(store.save("json", &value));
        assert_eq!(store.get("json", serde_json::Value::Null), value);
    }

    #[test]
    fn corrupt_slot_returns_default() {
        let store = Store::open_in_memory().unwrap();
        write_raw(&store.conn, &store.full_key("broken"), "{not json").unwrap();

        assert!(store.contains("broken"));
        let loaded: Vec<u32> = store.get("broken", vec![7]);
        assert_eq!(loaded, vec![7]);
    }

    #[test]
    fn wrong_shape_returns_default() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.save("count", &"not a number"));
        assert_eq!(store.get("count", 0u32), 0);
    }

    #[test]
    fn keys_are_namespaced() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.save("streak", &3));
        let raw = read_raw(&store.conn, "quizzer_streak").unwrap();
        assert_eq!(raw.as_deref(), Some("3"));
        assert_eq!(read_raw(&store.conn, "streak").unwrap(), None);
    }

    #[test]
    fn remove_deletes_slot() {
        let store = Store::open_in_memory().unwrap();
        store.save("gone", &1);
        assert!(store.remove("gone"));
        assert!(!store.contains("gone"));
    }

    #[test]
    fn transaction_commits_all_writes() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .transaction(|tx| {
                let current: u32 = tx.get("counter", 0);
                ensure_written(tx.save("counter", &(current + 1)), "counter")?;
                ensure_written(tx.save("other", &"x"), "other")
            })
            .unwrap();

        assert_eq!(store.get("counter", 0u32), 1);
        assert_eq!(store.get("other", String::new()), "x");
    }

    #[test]
    fn failed_write_rolls_back_the_whole_transaction() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER block_other BEFORE INSERT ON kv
                 WHEN NEW.key = 'quizzer_other'
                 BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
            )
            .unwrap();

        let outcome = store.transaction(|tx| {
            ensure_written(tx.save("counter", &1u32), "counter")?;
            ensure_written(tx.save("other", &"x"), "other")
        });

        assert!(matches!(outcome, Err(StoreError::WriteFailed("other"))));
        assert!(!store.contains("counter"));
        assert!(!store.contains("other"));
    }

    #[test]
    fn clear_all_only_touches_namespace() {
        let store = Store::open_in_memory().unwrap();
        store.save("a", &1);
        write_raw(&store.conn, "foreign_key", "1").unwrap();

        assert!(store.clear_all());
        assert!(!store.contains("a"));
        assert!(read_raw(&store.conn, "foreign_key").unwrap().is_some());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("quizzer.db");
        {
            let store = Store::open(&path).unwrap();
            assert!(store.save("streak", &5u32));
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.get("streak", 0u32), 5);
    }
}
