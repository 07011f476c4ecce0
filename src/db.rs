// 🗄️ Store - SQLite schema and typed record helpers
//
// Every function takes a plain `&Connection`; a `rusqlite::Transaction`
// derefs to one, so the pipeline can run all of this inside a single
// transaction and commit once at the end.

use crate::dataset::{FinancePoint, RawNode, Scalar};
use crate::error::ImportError;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Row id assigned by the store when an entity is created.
pub type EntityId = i64;

// ============================================================================
// SCHEMA
// ============================================================================

/// Open the store at `path`, creating the schema if needed.
///
/// With `fresh`, any existing database (and its WAL sidecar files) is
/// deleted first so the import starts from an empty store.
pub fn open_database(path: &Path, fresh: bool) -> crate::error::Result<Connection> {
    if fresh {
        for file in database_files(path) {
            match std::fs::remove_file(&file) {
                Ok(()) => tracing::info!(path = %file.display(), "removed existing database file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(ImportError::DatabaseReset { path: file, source }),
            }
        }
    }

    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    Ok(conn)
}

fn database_files(path: &Path) -> Vec<PathBuf> {
    let mut files = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        files.push(PathBuf::from(sidecar));
    }
    files
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery (no-op for in-memory stores)
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Entities
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS entities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            nickname TEXT,
            location TEXT,
            entity_type TEXT,
            influence TEXT,
            employees INTEGER,
            url TEXT,
            twitter_handle TEXT,
            followers INTEGER
        )",
        [],
    )?;

    // ==========================================================================
    // Canonical references (one row per distinct name) + ordered link tables
    // ==========================================================================
    for kind in ReferenceKind::ALL {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT UNIQUE NOT NULL
                )",
                table = kind.table()
            ),
            [],
        )?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {link} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    entity_id INTEGER NOT NULL REFERENCES entities(id),
                    {column} INTEGER NOT NULL REFERENCES {table}(id)
                )",
                link = kind.link_table(),
                column = kind.link_column(),
                table = kind.table()
            ),
            [],
        )?;
    }

    // ==========================================================================
    // Finance history owned by a single entity
    // ==========================================================================
    for kind in [FinanceKind::Revenue, FinanceKind::Expense] {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    entity_id INTEGER NOT NULL REFERENCES entities(id),
                    amount REAL,
                    year INTEGER
                )",
                table = kind.table()
            ),
            [],
        )?;
    }

    // ==========================================================================
    // Directed entity → entity connections
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS connections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL CHECK (kind IN ('collaboration', 'data')),
            source_id INTEGER NOT NULL REFERENCES entities(id),
            target_id INTEGER NOT NULL REFERENCES entities(id)
        )",
        [],
    )?;

    // ==========================================================================
    // Funding / investment records shared by a receiver and a giver
    // ==========================================================================
    for kind in [GrantKind::Funding, GrantKind::Investment] {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    amount REAL,
                    year INTEGER
                )",
                table = kind.table()
            ),
            [],
        )?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {link} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    record_id INTEGER NOT NULL REFERENCES {table}(id),
                    entity_id INTEGER NOT NULL REFERENCES entities(id),
                    role TEXT NOT NULL CHECK (role IN ('received', 'given'))
                )",
                link = kind.link_table(),
                table = kind.table()
            ),
            [],
        )?;
    }

    // ==========================================================================
    // Import runs (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS import_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            dataset_path TEXT NOT NULL,
            dataset_sha256 TEXT NOT NULL,
            report TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_connections_source ON connections(source_id, kind)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_funding_links_entity ON funding_links(entity_id, role)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_investment_links_entity ON investment_links(entity_id, role)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// RECORD KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Category,
    KeyPerson,
    Relation,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 3] = [
        ReferenceKind::Category,
        ReferenceKind::KeyPerson,
        ReferenceKind::Relation,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            ReferenceKind::Category => "categories",
            ReferenceKind::KeyPerson => "key_people",
            ReferenceKind::Relation => "relations",
        }
    }

    pub fn link_table(&self) -> &'static str {
        match self {
            ReferenceKind::Category => "entity_categories",
            ReferenceKind::KeyPerson => "entity_key_people",
            ReferenceKind::Relation => "entity_relations",
        }
    }

    fn link_column(&self) -> &'static str {
        match self {
            ReferenceKind::Category => "category_id",
            ReferenceKind::KeyPerson => "key_person_id",
            ReferenceKind::Relation => "relation_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinanceKind {
    Revenue,
    Expense,
}

impl FinanceKind {
    pub fn table(&self) -> &'static str {
        match self {
            FinanceKind::Revenue => "revenues",
            FinanceKind::Expense => "expenses",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Collaboration,
    Data,
}

impl ConnectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Collaboration => "collaboration",
            ConnectionKind::Data => "data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantKind {
    Funding,
    Investment,
}

impl GrantKind {
    pub fn table(&self) -> &'static str {
        match self {
            GrantKind::Funding => "fundings",
            GrantKind::Investment => "investments",
        }
    }

    pub fn link_table(&self) -> &'static str {
        match self {
            GrantKind::Funding => "funding_links",
            GrantKind::Investment => "investment_links",
        }
    }
}

/// Which side of a funding/investment record an entity sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantRole {
    Received,
    Given,
}

impl GrantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantRole::Received => "received",
            GrantRole::Given => "given",
        }
    }
}

// ============================================================================
// SCALAR COLUMNS
// ============================================================================

// Bound with its own storage class; column affinity keeps non-numeric text as-is.
impl ToSql for Scalar {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Scalar::Int(i) => ToSqlOutput::from(*i),
            Scalar::Real(f) => ToSqlOutput::from(*f),
            Scalar::Text(text) => ToSqlOutput::from(text.as_str()),
        })
    }
}

impl FromSql for Scalar {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(i) => Ok(Scalar::Int(i)),
            ValueRef::Real(f) => Ok(Scalar::Real(f)),
            ValueRef::Text(_) => value.as_str().map(|text| Scalar::Text(text.to_string())),
            ValueRef::Null | ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// Persisted entity with its scalar attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub location: Option<String>,
    pub entity_type: Option<String>,
    pub influence: Option<String>,
    pub employees: Option<Scalar>,
    pub url: Option<String>,
    pub twitter_handle: Option<String>,
    pub followers: Option<Scalar>,
}

pub fn insert_entity(conn: &Connection, node: &RawNode) -> rusqlite::Result<EntityId> {
    conn.execute(
        "INSERT INTO entities (
            name, nickname, location, entity_type, influence,
            employees, url, twitter_handle, followers
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            node.name,
            node.nickname,
            node.location,
            node.entity_type,
            node.influence,
            node.employees,
            node.url,
            node.twitter_handle,
            node.followers,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn find_entity(conn: &Connection, id: EntityId) -> rusqlite::Result<Option<EntityRecord>> {
    conn.query_row(
        "SELECT id, name, nickname, location, entity_type, influence,
                employees, url, twitter_handle, followers
         FROM entities
         WHERE id = ?1",
        [id],
        |row| {
            Ok(EntityRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                nickname: row.get(2)?,
                location: row.get(3)?,
                entity_type: row.get(4)?,
                influence: row.get(5)?,
                employees: row.get(6)?,
                url: row.get(7)?,
                twitter_handle: row.get(8)?,
                followers: row.get(9)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
pub(crate) fn find_entities_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Vec<EntityId>> {
    let mut stmt = conn.prepare("SELECT id FROM entities WHERE name = ?1 ORDER BY id")?;
    let ids = stmt
        .query_map([name], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

// ============================================================================
// REFERENCES
// ============================================================================

pub fn insert_reference(conn: &Connection, kind: ReferenceKind, name: &str) -> rusqlite::Result<i64> {
    conn.execute(
        &format!("INSERT INTO {} (name) VALUES (?1)", kind.table()),
        [name],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_reference(
    conn: &Connection,
    kind: ReferenceKind,
    name: &str,
) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        &format!("SELECT id FROM {} WHERE name = ?1", kind.table()),
        [name],
        |row| row.get(0),
    )
    .optional()
}

/// Append a canonical reference to an entity's ordered collection.
pub fn link_reference(
    conn: &Connection,
    kind: ReferenceKind,
    entity_id: EntityId,
    reference_id: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (entity_id, {}) VALUES (?1, ?2)",
            kind.link_table(),
            kind.link_column()
        ),
        params![entity_id, reference_id],
    )?;
    Ok(())
}

/// (reference id, name) pairs attached to an entity, in append order.
pub fn entity_references(
    conn: &Connection,
    kind: ReferenceKind,
    entity_id: EntityId,
) -> rusqlite::Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT r.id, r.name
         FROM {link} l
         JOIN {table} r ON r.id = l.{column}
         WHERE l.entity_id = ?1
         ORDER BY l.id",
        link = kind.link_table(),
        table = kind.table(),
        column = kind.link_column()
    ))?;

    let refs = stmt
        .query_map([entity_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(refs)
}

// ============================================================================
// FINANCE HISTORY
// ============================================================================

pub fn insert_finance(
    conn: &Connection,
    kind: FinanceKind,
    entity_id: EntityId,
    point: &FinancePoint,
) -> rusqlite::Result<i64> {
    conn.execute(
        &format!(
            "INSERT INTO {} (entity_id, amount, year) VALUES (?1, ?2, ?3)",
            kind.table()
        ),
        params![entity_id, point.amount, point.year],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn entity_finances(
    conn: &Connection,
    kind: FinanceKind,
    entity_id: EntityId,
) -> rusqlite::Result<Vec<FinancePoint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT amount, year FROM {} WHERE entity_id = ?1 ORDER BY id",
        kind.table()
    ))?;

    let points = stmt
        .query_map([entity_id], |row| {
            Ok(FinancePoint {
                amount: row.get(0)?,
                year: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(points)
}

// ============================================================================
// CONNECTIONS
// ============================================================================

pub fn insert_connection(
    conn: &Connection,
    kind: ConnectionKind,
    source_id: EntityId,
    target_id: EntityId,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO connections (kind, source_id, target_id) VALUES (?1, ?2, ?3)",
        params![kind.as_str(), source_id, target_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Targets of an entity's outgoing connections of one kind.
pub fn outgoing_connections(
    conn: &Connection,
    kind: ConnectionKind,
    source_id: EntityId,
) -> rusqlite::Result<Vec<EntityId>> {
    let mut stmt = conn.prepare(
        "SELECT target_id FROM connections WHERE source_id = ?1 AND kind = ?2 ORDER BY id",
    )?;
    let targets = stmt
        .query_map(params![source_id, kind.as_str()], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(targets)
}

// ============================================================================
// FUNDING / INVESTMENT
// ============================================================================

/// Create one funding/investment record and attach it to both parties.
pub fn insert_grant(
    conn: &Connection,
    kind: GrantKind,
    amount: Option<&Scalar>,
    year: Option<&Scalar>,
    receiver_id: EntityId,
    giver_id: EntityId,
) -> rusqlite::Result<i64> {
    conn.execute(
        &format!("INSERT INTO {} (amount, year) VALUES (?1, ?2)", kind.table()),
        params![amount, year],
    )?;
    let record_id = conn.last_insert_rowid();

    let link_sql = format!(
        "INSERT INTO {} (record_id, entity_id, role) VALUES (?1, ?2, ?3)",
        kind.link_table()
    );
    conn.execute(
        &link_sql,
        params![record_id, receiver_id, GrantRole::Received.as_str()],
    )?;
    conn.execute(
        &link_sql,
        params![record_id, giver_id, GrantRole::Given.as_str()],
    )?;

    Ok(record_id)
}

/// Record ids an entity holds in one role, in append order.
pub fn entity_grants(
    conn: &Connection,
    kind: GrantKind,
    role: GrantRole,
    entity_id: EntityId,
) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT record_id FROM {} WHERE entity_id = ?1 AND role = ?2 ORDER BY id",
        kind.link_table()
    ))?;
    let ids = stmt
        .query_map(params![entity_id, role.as_str()], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

// ============================================================================
// COUNTS
// ============================================================================

/// Row counts of every persisted record type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub entities: i64,
    pub categories: i64,
    pub key_people: i64,
    pub relations: i64,
    pub revenues: i64,
    pub expenses: i64,
    pub connections: i64,
    pub fundings: i64,
    pub investments: i64,
}

fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
}

pub fn table_counts(conn: &Connection) -> rusqlite::Result<TableCounts> {
    Ok(TableCounts {
        entities: count_rows(conn, "entities")?,
        categories: count_rows(conn, ReferenceKind::Category.table())?,
        key_people: count_rows(conn, ReferenceKind::KeyPerson.table())?,
        relations: count_rows(conn, ReferenceKind::Relation.table())?,
        revenues: count_rows(conn, FinanceKind::Revenue.table())?,
        expenses: count_rows(conn, FinanceKind::Expense.table())?,
        connections: count_rows(conn, "connections")?,
        fundings: count_rows(conn, GrantKind::Funding.table())?,
        investments: count_rows(conn, GrantKind::Investment.table())?,
    })
}

// ============================================================================
// IMPORT RUNS
// ============================================================================

/// Audit row written once per successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRun {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dataset_path: String,
    pub dataset_sha256: String,
    pub report: serde_json::Value,
}

pub fn insert_import_run(conn: &Connection, run: &ImportRun) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO import_runs (
            run_id, started_at, finished_at, dataset_path, dataset_sha256, report
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            run.run_id,
            run.started_at.to_rfc3339(),
            run.finished_at.to_rfc3339(),
            run.dataset_path,
            run.dataset_sha256,
            run.report.to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_import_runs(conn: &Connection) -> rusqlite::Result<Vec<ImportRun>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, started_at, finished_at, dataset_path, dataset_sha256, report
         FROM import_runs
         ORDER BY id",
    )?;

    let runs = stmt
        .query_map([], |row| {
            let started_at: String = row.get(1)?;
            let finished_at: String = row.get(2)?;
            let report: String = row.get(5)?;

            Ok(ImportRun {
                run_id: row.get(0)?,
                started_at: parse_timestamp(&started_at, 1)?,
                finished_at: parse_timestamp(&finished_at, 2)?,
                dataset_path: row.get(3)?,
                dataset_sha256: row.get(4)?,
                report: serde_json::from_str(&report).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(runs)
}

fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, name: &str) -> RawNode {
        RawNode {
            id,
            name: Some(name.to_string()),
            nickname: None,
            location: Some("Seattle, WA".to_string()),
            entity_type: Some("Non-Profit".to_string()),
            influence: Some("local".to_string()),
            employees: Some(Scalar::Int(12)),
            url: None,
            twitter_handle: Some("@org".to_string()),
            followers: Some(Scalar::Int(340)),
            categories: vec![],
            key_people: vec![],
            relations: vec![],
            revenue: vec![],
            expenses: vec![],
        }
    }

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_open_database_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("civic.db");

        {
            let conn = open_database(&path, false).unwrap();
            insert_entity(&conn, &node(1, "Old")).unwrap();
        }
        {
            let conn = open_database(&path, false).unwrap();
            assert_eq!(table_counts(&conn).unwrap().entities, 1);
        }

        let conn = open_database(&path, true).unwrap();
        assert_eq!(table_counts(&conn).unwrap().entities, 0);
    }

    #[test]
    fn test_setup_is_repeatable() {
        let conn = store();
        setup_database(&conn).unwrap();
        assert_eq!(table_counts(&conn).unwrap(), TableCounts::default());
    }

    #[test]
    fn test_entity_round_trip() {
        let conn = store();
        let id = insert_entity(&conn, &node(10, "Civic Org")).unwrap();

        let entity = find_entity(&conn, id).unwrap().unwrap();
        assert_eq!(entity.name.as_deref(), Some("Civic Org"));
        assert_eq!(entity.employees, Some(Scalar::Int(12)));
        assert_eq!(entity.twitter_handle.as_deref(), Some("@org"));
        assert!(find_entity(&conn, id + 100).unwrap().is_none());
        assert_eq!(find_entities_by_name(&conn, "Civic Org").unwrap(), vec![id]);
    }

    #[test]
    fn test_scalars_keep_their_storage_class() {
        let conn = store();
        let mut raw = node(11, "Loose Org");
        raw.employees = Some(Scalar::Text("10-50".to_string()));
        raw.followers = Some(Scalar::Real(12.7));
        let id = insert_entity(&conn, &raw).unwrap();

        let point = FinancePoint {
            amount: Some(Scalar::Text("$5,000".to_string())),
            year: Some(Scalar::Int(2014)),
        };
        insert_finance(&conn, FinanceKind::Revenue, id, &point).unwrap();

        let entity = find_entity(&conn, id).unwrap().unwrap();
        assert_eq!(entity.employees, Some(Scalar::Text("10-50".to_string())));
        assert_eq!(entity.followers, Some(Scalar::Real(12.7)));
        assert_eq!(entity_finances(&conn, FinanceKind::Revenue, id).unwrap(), vec![point]);

        let stored_type: String = conn
            .query_row("SELECT typeof(employees) FROM entities WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(stored_type, "text");
    }

    #[test]
    fn test_reference_name_is_unique() {
        let conn = store();
        insert_reference(&conn, ReferenceKind::Category, "Health").unwrap();
        let dup = insert_reference(&conn, ReferenceKind::Category, "Health");

        assert!(dup.is_err());
        // Same name in a different universe is fine
        insert_reference(&conn, ReferenceKind::Relation, "Health").unwrap();
    }

    #[test]
    fn test_grant_links_both_sides() {
        let conn = store();
        let receiver = insert_entity(&conn, &node(1, "Receiver")).unwrap();
        let giver = insert_entity(&conn, &node(2, "Giver")).unwrap();

        let record = insert_grant(
            &conn,
            GrantKind::Funding,
            Some(&Scalar::Real(10.0)),
            Some(&Scalar::Int(2015)),
            receiver,
            giver,
        )
        .unwrap();

        assert_eq!(
            entity_grants(&conn, GrantKind::Funding, GrantRole::Received, receiver).unwrap(),
            vec![record]
        );
        assert_eq!(
            entity_grants(&conn, GrantKind::Funding, GrantRole::Given, giver).unwrap(),
            vec![record]
        );
        assert!(entity_grants(&conn, GrantKind::Funding, GrantRole::Given, receiver)
            .unwrap()
            .is_empty());
        assert!(entity_grants(&conn, GrantKind::Investment, GrantRole::Received, receiver)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_import_run_log() {
        let conn = store();
        let now = Utc::now();
        let run = ImportRun {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: now,
            finished_at: now,
            dataset_path: "civic.json".to_string(),
            dataset_sha256: "ab".repeat(32),
            report: serde_json::json!({"nodes_read": 3}),
        };

        insert_import_run(&conn, &run).unwrap();
        let runs = get_import_runs(&conn).unwrap();

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, run.run_id);
        assert_eq!(runs[0].report["nodes_read"], 3);
    }
}
