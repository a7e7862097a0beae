//! SQLite fixtures shaped like the bot's database.

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FixtureDb {
    // Held so the directory outlives the test.
    _dir: TempDir,
    pub path: PathBuf,
}

impl FixtureDb {
    /// Empty `interactions` and `alerts` tables.
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("news_memory.db");
        create_schema(&path);
        Self { _dir: dir, path }
    }

    /// Chat 1: LLMs x3, Robotics x1. Chat 2: Quantum x2. One alert.
    pub fn scenario() -> Self {
        let db = Self::empty();
        db.insert_interactions(&[
            (1, "LLMs", "LLM roundup", "2024-05-01 09:00:00"),
            (2, "Quantum", "Qubits news", "2024-05-01 09:30:00"),
            (1, "Robotics", "Robot arms", "2024-05-02 10:00:00"),
            (1, "LLMs", "Open weights", "2024-05-02 11:00:00"),
            (2, "Quantum", "Error correction", "2024-05-03 08:00:00"),
            (1, "LLMs", "Benchmarks", "2024-05-04 12:00:00"),
        ]);
        db.insert_alert(1, "LLMs", 1);
        db
    }

    pub fn connection(&self) -> Connection {
        Connection::open(&self.path).expect("open fixture db")
    }

    pub fn insert_interactions(&self, rows: &[(i64, &str, &str, &str)]) {
        let conn = self.connection();
        for (chat_id, topic, summary, ts) in rows {
            conn.execute(
                "INSERT INTO interactions (chat_id, input_topic, summary, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![chat_id, topic, summary, ts],
            )
            .expect("insert interaction");
        }
    }

    pub fn insert_alert(&self, chat_id: i64, topic: &str, active: i64) {
        self.connection()
            .execute(
                "INSERT INTO alerts (chat_id, topic, active) VALUES (?1, ?2, ?3)",
                params![chat_id, topic, active],
            )
            .expect("insert alert");
    }
}

fn create_schema(path: &Path) {
    let conn = Connection::open(path).expect("create fixture db");
    conn.execute_batch(
        "CREATE TABLE interactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chat_id INTEGER NOT NULL,
            input_topic TEXT,
            summary TEXT,
            timestamp TEXT
        );
        CREATE TABLE alerts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            chat_id INTEGER NOT NULL,
            topic TEXT NOT NULL,
            active INTEGER DEFAULT 1
        );",
    )
    .expect("create schema");
}
