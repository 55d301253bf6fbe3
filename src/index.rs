//! Command Index - read-only SQLite lookup of harvested editor commands
//!
//! The database is produced offline by the harvesting tools. The dispatcher
//! only ever reads it:
//! - exact lookup by `command_id` for macro steps
//! - conjunctive substring search over description/keywords for free text

use rusqlite::{params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SELECT_COLUMNS: &str = "command_id, keybinding, description, keywords";

/// One harvested command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command_id: String,
    /// Space-separated chords, `+`-joined keys. Empty when unassigned.
    pub keybinding: String,
    pub description: String,
    /// Space-separated search tokens.
    pub keywords: String,
}

impl CommandRecord {
    pub fn has_keybinding(&self) -> bool {
        !self.keybinding.trim().is_empty()
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            command_id: row.get(0)?,
            keybinding: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            keywords: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        })
    }
}

/// Index errors
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Command database not found at {0}")]
    NotFound(PathBuf),

    #[error("Command database at {0} has no `commands` table")]
    MissingTable(PathBuf),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Read-only view over the `commands` table.
pub struct CommandIndex {
    conn: Connection,
}

impl CommandIndex {
    /// Open an existing database. A missing file is an error, never created.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        if !path.exists() {
            return Err(IndexError::NotFound(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let has_table: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'commands')",
            [],
            |r| r.get(0),
        )?;
        if !has_table {
            return Err(IndexError::MissingTable(path.to_path_buf()));
        }

        tracing::debug!(path = %path.display(), "Command index opened");
        Ok(Self { conn })
    }

    /// Open an empty in-memory index (for testing)
    pub fn open_in_memory() -> Result<Self, IndexError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Create the `commands` table layout the harvesters write.
    pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS commands (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                command_id TEXT NOT NULL,
                keybinding TEXT DEFAULT '',
                description TEXT DEFAULT '',
                keywords TEXT DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_commands_id ON commands(command_id);
            "#,
        )
    }

    /// Seed a record. Only used by tests and fixtures; the dispatcher never writes.
    pub fn insert(&self, record: &CommandRecord) -> Result<(), IndexError> {
        self.conn.execute(
            "INSERT INTO commands (command_id, keybinding, description, keywords) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                record.command_id,
                record.keybinding,
                record.description,
                record.keywords
            ],
        )?;
        Ok(())
    }

    /// Exact lookup by command id. First row wins if the harvest duplicated it.
    pub fn find_by_id(&self, command_id: &str) -> Result<Option<CommandRecord>, IndexError> {
        let sql = format!(
            "SELECT {} FROM commands WHERE command_id = ?1 ORDER BY id LIMIT 1",
            SELECT_COLUMNS
        );
        let record = self
            .conn
            .query_row(&sql, [command_id], CommandRecord::from_row)
            .optional()?;
        Ok(record)
    }

    /// Free-text search.
    ///
    /// Every lowercase term must appear in the description or the keywords,
    /// and the command must have a keybinding. First match in index order.
    pub fn search(&self, query: &str) -> Result<Option<CommandRecord>, IndexError> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        if terms.is_empty() {
            return Ok(None);
        }

        let mut clauses = Vec::with_capacity(terms.len());
        let mut params = Vec::with_capacity(terms.len() * 2);
        for term in &terms {
            clauses.push(
                "(lower(keywords) LIKE ? ESCAPE '\\' OR lower(description) LIKE ? ESCAPE '\\')",
            );
            let wildcard = format!("%{}%", escape_like(term));
            params.push(wildcard.clone());
            params.push(wildcard);
        }

        let sql = format!(
            "SELECT {} FROM commands WHERE {} AND keybinding IS NOT NULL AND trim(keybinding) != '' ORDER BY id LIMIT 1",
            SELECT_COLUMNS,
            clauses.join(" AND ")
        );

        let record = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), CommandRecord::from_row)
            .optional()?;
        Ok(record)
    }

    /// Total number of rows, for the self-test banner.
    pub fn count(&self) -> Result<usize, IndexError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM commands", [], |r| r.get(0))?;
        Ok(n as usize)
    }
}

/// Make `%` and `_` in a term match literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, keys: &str, desc: &str, keywords: &str) -> CommandRecord {
        CommandRecord {
            command_id: id.into(),
            keybinding: keys.into(),
            description: desc.into(),
            keywords: keywords.into(),
        }
    }

    fn seeded() -> CommandIndex {
        let index = CommandIndex::open_in_memory().unwrap();
        index
            .insert(&record("editor.action.formatDocument", "shift+alt+f", "Format Document", "format document code"))
            .unwrap();
        index
            .insert(&record("workbench.action.files.save", "ctrl+s", "Save", "save file"))
            .unwrap();
        index
            .insert(&record("workbench.action.toggleZenMode", "", "Toggle Zen Mode", "zen mode"))
            .unwrap();
        index
    }

    #[test]
    fn test_find_by_id() {
        let index = seeded();
        let rec = index.find_by_id("workbench.action.files.save").unwrap().unwrap();
        assert_eq!(rec.keybinding, "ctrl+s");
        assert!(index.find_by_id("workbench.action.files").unwrap().is_none());
    }

    #[test]
    fn test_search_all_terms_required() {
        let index = seeded();
        let rec = index.search("Format Document").unwrap().unwrap();
        assert_eq!(rec.command_id, "editor.action.formatDocument");
        assert!(index.search("format spaceship").unwrap().is_none());
    }

    #[test]
    fn test_search_skips_unbound_commands() {
        let index = seeded();
        assert!(index.search("zen mode").unwrap().is_none());
        // Still reachable by id
        assert!(index.find_by_id("workbench.action.toggleZenMode").unwrap().is_some());
    }

    #[test]
    fn test_search_first_in_index_order() {
        let index = seeded();
        index
            .insert(&record("workbench.action.files.saveAll", "ctrl+k s", "Save All", "save all files"))
            .unwrap();
        let rec = index.search("save").unwrap().unwrap();
        assert_eq!(rec.command_id, "workbench.action.files.save");
    }

    #[test]
    fn test_search_empty_query() {
        let index = seeded();
        assert!(index.search("   ").unwrap().is_none());
    }

    #[test]
    fn test_like_wildcards_are_literal() {
        let index = seeded();
        assert!(index.search("%").unwrap().is_none());
        assert!(index.search("_").unwrap().is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let err = CommandIndex::open(Path::new("/nonexistent/ghost/commands.db"))
            .err()
            .unwrap();
        assert!(matches!(err, IndexError::NotFound(_)));
    }
}
