//! In-memory representation of the bot database tables.

use rusqlite::types::ValueRef;
use serde::Serialize;
use std::fmt;

use crate::{Error, Result};

/// A single SQLite cell, one variant per storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text rendition of a non-null cell; `None` for NULL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Real(r) => write!(f, "{}", r),
            CellValue::Text(t) => f.write_str(t),
            CellValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Result set of a `SELECT *`: column names plus rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Telegram chat identifier.
///
/// Integer ids sort before text ids. Text in canonical integer form
/// (`"42"`, `"-100"`) is stored as `Int`, so a selection coming from a URL
/// compares equal to the value read from the database whatever column
/// affinity the bot used. Any other text, such as `"007"` or `" 7"`, is kept
/// verbatim and stays a distinct id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ChatId {
    Int(i64),
    Text(String),
}

impl ChatId {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) if id.to_string() == raw => ChatId::Int(id),
            _ => ChatId::Text(raw.to_string()),
        }
    }

    fn from_cell(cell: &CellValue) -> std::result::Result<Self, String> {
        match cell {
            CellValue::Integer(i) => Ok(ChatId::Int(*i)),
            CellValue::Real(r) if r.fract() == 0.0 && r.is_finite() => Ok(ChatId::Int(*r as i64)),
            CellValue::Real(r) => Ok(ChatId::Text(r.to_string())),
            CellValue::Text(t) => Ok(ChatId::parse(t)),
            CellValue::Null => Err("chat_id is NULL".to_string()),
            CellValue::Blob(_) => Err("chat_id is a BLOB".to_string()),
        }
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Int(id) => write!(f, "{}", id),
            ChatId::Text(id) => f.write_str(id),
        }
    }
}

/// One logged topic request handled by the bot.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub chat_id: ChatId,
    pub input_topic: Option<String>,
    pub summary: Option<String>,
    pub timestamp: Option<String>,
}

impl Interaction {
    pub const CHAT_ID: &'static str = "chat_id";
    pub const INPUT_TOPIC: &'static str = "input_topic";
    pub const SUMMARY: &'static str = "summary";
    pub const TIMESTAMP: &'static str = "timestamp";

    /// Convert a raw `interactions` result set. Columns beyond the four
    /// required ones are ignored.
    pub fn from_table(table_name: &str, table: &Table) -> Result<Vec<Self>> {
        let index = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| Error::MissingColumn {
                    table: table_name.to_string(),
                    column: column.to_string(),
                })
        };

        let chat_idx = index(Self::CHAT_ID)?;
        let topic_idx = index(Self::INPUT_TOPIC)?;
        let summary_idx = index(Self::SUMMARY)?;
        let ts_idx = index(Self::TIMESTAMP)?;

        table
            .rows
            .iter()
            .enumerate()
            .map(|(row_no, row)| {
                let chat_id = ChatId::from_cell(&row[chat_idx]).map_err(|reason| {
                    Error::InvalidRow {
                        table: table_name.to_string(),
                        row: row_no,
                        reason,
                    }
                })?;

                Ok(Interaction {
                    chat_id,
                    input_topic: row[topic_idx].as_text(),
                    summary: row[summary_idx].as_text(),
                    timestamp: row[ts_idx].as_text(),
                })
            })
            .collect()
    }
}

/// Both tables as loaded from one database read.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub interactions: Vec<Interaction>,
    pub alerts: Table,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interactions_table(rows: Vec<Vec<CellValue>>) -> Table {
        Table {
            columns: vec![
                "id".into(),
                "chat_id".into(),
                "input_topic".into(),
                "summary".into(),
                "timestamp".into(),
            ],
            rows,
        }
    }

    #[test]
    fn test_chat_id_parse() {
        assert_eq!(ChatId::parse("42"), ChatId::Int(42));
        assert_eq!(ChatId::parse("-1001"), ChatId::Int(-1001));
        assert_eq!(ChatId::parse("@news"), ChatId::Text("@news".into()));
    }

    #[test]
    fn test_chat_id_parse_keeps_non_canonical_text() {
        assert_eq!(ChatId::parse("007"), ChatId::Text("007".into()));
        assert_eq!(ChatId::parse(" 7"), ChatId::Text(" 7".into()));
        assert_eq!(ChatId::parse("+7"), ChatId::Text("+7".into()));
        assert_eq!(ChatId::parse("-0"), ChatId::Text("-0".into()));
    }

    #[test]
    fn test_near_duplicate_chat_ids_stay_distinct() {
        let cell = |chat: CellValue| {
            vec![
                CellValue::Integer(1),
                chat,
                CellValue::Text("LLMs".into()),
                CellValue::Null,
                CellValue::Null,
            ]
        };
        let table = interactions_table(vec![
            cell(CellValue::Text("7".into())),
            cell(CellValue::Text("007".into())),
            cell(CellValue::Integer(7)),
            cell(CellValue::Text(" 7".into())),
        ]);

        let rows = Interaction::from_table("interactions", &table).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.chat_id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                ChatId::Int(7),
                ChatId::Text("007".into()),
                ChatId::Int(7),
                ChatId::Text(" 7".into()),
            ]
        );
        assert_eq!(ChatId::Text("007".into()).to_string(), "007");
    }

    #[test]
    fn test_chat_id_ordering_puts_integers_first() {
        let mut ids = vec![
            ChatId::Text("b".into()),
            ChatId::Int(10),
            ChatId::Text("a".into()),
            ChatId::Int(-5),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ChatId::Int(-5),
                ChatId::Int(10),
                ChatId::Text("a".into()),
                ChatId::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_chat_id_from_numeric_text_normalizes() {
        assert_eq!(
            ChatId::from_cell(&CellValue::Text("123".into())),
            Ok(ChatId::Int(123))
        );
        assert_eq!(
            ChatId::from_cell(&CellValue::Real(7.0)),
            Ok(ChatId::Int(7))
        );
        assert!(ChatId::from_cell(&CellValue::Null).is_err());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Integer(5).to_string(), "5");
        assert_eq!(CellValue::Text("hi".into()).to_string(), "hi");
        assert_eq!(CellValue::Blob(vec![1, 2, 3]).to_string(), "<3 bytes>");
        assert_eq!(CellValue::Null.as_text(), None);
    }

    #[test]
    fn test_from_table_extracts_required_columns() {
        let table = interactions_table(vec![vec![
            CellValue::Integer(1),
            CellValue::Integer(555),
            CellValue::Text("LLMs".into()),
            CellValue::Null,
            CellValue::Text("2024-05-01 10:00:00".into()),
        ]]);

        let rows = Interaction::from_table("interactions", &table).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].chat_id, ChatId::Int(555));
        assert_eq!(rows[0].input_topic.as_deref(), Some("LLMs"));
        assert_eq!(rows[0].summary, None);
        assert_eq!(rows[0].timestamp.as_deref(), Some("2024-05-01 10:00:00"));
    }

    #[test]
    fn test_from_table_missing_column() {
        let table = Table::new(vec!["chat_id".into(), "input_topic".into()]);
        let err = Interaction::from_table("interactions", &table).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "summary"));
    }

    #[test]
    fn test_from_table_null_chat_id_is_invalid_row() {
        let table = interactions_table(vec![vec![
            CellValue::Integer(1),
            CellValue::Null,
            CellValue::Text("LLMs".into()),
            CellValue::Null,
            CellValue::Null,
        ]]);
        let err = Interaction::from_table("interactions", &table).unwrap_err();
        assert!(matches!(err, Error::InvalidRow { row: 0, .. }));
    }

    #[test]
    fn test_table_helpers() {
        let mut table = Table::new(vec!["id".into(), "topic".into()]);
        assert!(table.is_empty());
        table.rows.push(vec![CellValue::Integer(1), CellValue::Text("AI".into())]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.column_index("topic"), Some(1));
        assert_eq!(table.column_index("missing"), None);
    }
}
