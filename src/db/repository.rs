use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::DatabaseError;
use crate::models::*;

const SPEC_COLUMNS: &str = "id, title, status, authors, spec_type, team, google_doc_id,
    google_doc_name, google_doc_url, google_doc_created_at, google_doc_updated_at,
    created_at, updated_at, synced_at";

// ═══════════════════════════════════════════
// Writes
// ═══════════════════════════════════════════

/// Insert a spec, or replace every synced field of an existing row with the
/// same id. `created_at` of an existing row is kept.
pub fn upsert_spec(conn: &Connection, spec: &Spec) -> Result<(), DatabaseError> {
    if spec.id.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "spec from document {} has an empty id",
            spec.google_doc_id
        )));
    }

    let authors = serde_json::to_string(&spec.authors).map_err(|e| DatabaseError::CorruptColumn {
        column: "authors".into(),
        reason: e.to_string(),
    })?;

    conn.execute(
        "INSERT INTO specs (id, title, status, authors, spec_type, team, google_doc_id,
         google_doc_name, google_doc_url, google_doc_created_at, google_doc_updated_at,
         created_at, updated_at, synced_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            status = excluded.status,
            authors = excluded.authors,
            spec_type = excluded.spec_type,
            team = excluded.team,
            google_doc_id = excluded.google_doc_id,
            google_doc_name = excluded.google_doc_name,
            google_doc_url = excluded.google_doc_url,
            google_doc_created_at = excluded.google_doc_created_at,
            google_doc_updated_at = excluded.google_doc_updated_at,
            updated_at = excluded.updated_at,
            synced_at = excluded.synced_at",
        params![
            spec.id,
            spec.title,
            spec.status,
            authors,
            spec.spec_type,
            spec.team,
            spec.google_doc_id,
            spec.google_doc_name,
            spec.google_doc_url,
            spec.google_doc_created_at,
            spec.google_doc_updated_at,
            spec.created_at,
            spec.updated_at,
            spec.synced_at,
        ],
    )?;
    Ok(())
}

/// Refresh only the "last synchronized" timestamp. Returns rows touched.
pub fn touch_synced_at(
    conn: &Connection,
    id: &str,
    synced_at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE specs SET synced_at = ?2 WHERE id = ?1",
        params![id, synced_at],
    )?;
    Ok(changed)
}

/// Overwrite the status of a spec after a remote status change.
pub fn update_spec_status(
    conn: &Connection,
    id: &str,
    status: &str,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE specs SET status = ?2, updated_at = ?3, synced_at = ?3 WHERE id = ?1",
        params![id, status, now],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "spec".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Delete every spec not synchronized since `cutoff`. Returns rows deleted.
pub fn delete_specs_synced_before(
    conn: &Connection,
    cutoff: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let deleted = conn.execute("DELETE FROM specs WHERE synced_at < ?1", params![cutoff])?;
    Ok(deleted)
}

// ═══════════════════════════════════════════
// Reads
// ═══════════════════════════════════════════

pub fn get_spec(conn: &Connection, id: &str) -> Result<Option<Spec>, DatabaseError> {
    query_optional(conn, &format!("SELECT {SPEC_COLUMNS} FROM specs WHERE id = ?1"), id)
}

pub fn get_spec_by_doc_id(conn: &Connection, doc_id: &str) -> Result<Option<Spec>, DatabaseError> {
    query_optional(
        conn,
        &format!("SELECT {SPEC_COLUMNS} FROM specs WHERE google_doc_id = ?1 LIMIT 1"),
        doc_id,
    )
}

/// Stored source-document modification time, used for change detection.
pub fn get_doc_updated_at(
    conn: &Connection,
    id: &str,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    let result = conn.query_row(
        "SELECT google_doc_updated_at FROM specs WHERE id = ?1",
        params![id],
        |row| row.get::<_, DateTime<Utc>>(0),
    );
    match result {
        Ok(ts) => Ok(Some(ts)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Specs whose status is one of `statuses` (lowercase) and whose source
/// document was last modified before `modified_before`.
pub fn find_stale_specs(
    conn: &Connection,
    statuses: &[String],
    modified_before: DateTime<Utc>,
) -> Result<Vec<Spec>, DatabaseError> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }

    let mut filter = WhereBuilder::new();
    filter.in_lowercase("lower(trim(status))", statuses);
    filter.push("google_doc_updated_at < ?", Box::new(modified_before));

    let sql = format!(
        "SELECT {SPEC_COLUMNS} FROM specs{} ORDER BY google_doc_updated_at ASC",
        filter.sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(filter.param_refs().as_slice(), spec_from_row)?;
    collect_rows(rows)
}

/// Paged, filtered, sorted listing of specs.
pub fn list_specs(conn: &Connection, query: &SpecQuery) -> Result<SpecPage, DatabaseError> {
    let mut filter = WhereBuilder::new();

    if let Some(title) = non_empty(&query.title) {
        filter.push("title LIKE ? ESCAPE '\\'", Box::new(like_pattern(title)));
    }
    if let Some(team) = non_empty(&query.team) {
        filter.push("team LIKE ? ESCAPE '\\'", Box::new(like_pattern(team)));
    }
    if !query.spec_types.is_empty() {
        filter.in_exact("spec_type", &query.spec_types);
    }
    if !query.statuses.is_empty() {
        let lowered: Vec<String> = query.statuses.iter().map(|s| s.to_lowercase()).collect();
        filter.in_lowercase("lower(trim(status))", &lowered);
    }
    if let Some(author) = non_empty(&query.author) {
        filter.push("authors LIKE ? ESCAPE '\\'", Box::new(like_pattern(author)));
    }
    if let Some(search) = non_empty(&query.search) {
        filter.any_like(&["id", "title", "team", "google_doc_name"], search);
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM specs{}", filter.sql()),
        filter.param_refs().as_slice(),
        |row| row.get(0),
    )?;

    let limit = query.effective_limit();
    let sql = format!(
        "SELECT {SPEC_COLUMNS} FROM specs{} ORDER BY {} {}, id ASC LIMIT {} OFFSET {}",
        filter.sql(),
        query.order_by.column(),
        query.effective_direction().as_sql(),
        limit,
        query.offset,
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(filter.param_refs().as_slice(), spec_from_row)?;
    let specs = collect_rows(rows)?;

    Ok(SpecPage {
        total,
        specs,
        limit,
        offset: query.offset,
    })
}

/// Every distinct author name across all specs, sorted.
pub fn distinct_authors(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT authors FROM specs")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut authors = BTreeSet::new();
    for raw in rows {
        for author in decode_authors(&raw?)? {
            authors.insert(author);
        }
    }
    Ok(authors.into_iter().collect())
}

/// Every distinct team, sorted.
pub fn distinct_teams(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT DISTINCT team FROM specs ORDER BY team")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut teams = Vec::new();
    for team in rows {
        teams.push(team?);
    }
    Ok(teams)
}

// ═══════════════════════════════════════════
// Row mapping
// ═══════════════════════════════════════════

fn query_optional(conn: &Connection, sql: &str, key: &str) -> Result<Option<Spec>, DatabaseError> {
    let result = conn.query_row(sql, params![key], spec_from_row);
    match result {
        Ok(spec) => Ok(Some(spec)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn spec_from_row(row: &Row<'_>) -> rusqlite::Result<Spec> {
    let authors_json: String = row.get(3)?;
    let authors = serde_json::from_str(&authors_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Spec {
        id: row.get(0)?,
        title: row.get(1)?,
        status: row.get(2)?,
        authors,
        spec_type: row.get(4)?,
        team: row.get(5)?,
        google_doc_id: row.get(6)?,
        google_doc_name: row.get(7)?,
        google_doc_url: row.get(8)?,
        google_doc_created_at: row.get(9)?,
        google_doc_updated_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        synced_at: row.get(13)?,
    })
}

fn collect_rows<I>(rows: I) -> Result<Vec<Spec>, DatabaseError>
where
    I: Iterator<Item = rusqlite::Result<Spec>>,
{
    let mut specs = Vec::new();
    for spec in rows {
        specs.push(spec?);
    }
    Ok(specs)
}

fn decode_authors(raw: &str) -> Result<Vec<String>, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::CorruptColumn {
        column: "authors".into(),
        reason: e.to_string(),
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Helper: builds a dynamic WHERE clause with numbered parameters.
struct WhereBuilder {
    clauses: Vec<String>,
    params: Vec<Box<dyn rusqlite::types::ToSql>>,
}

impl WhereBuilder {
    fn new() -> Self {
        Self {
            clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Add a clause with a single `?` placeholder.
    fn push(&mut self, clause: &str, param: Box<dyn rusqlite::types::ToSql>) {
        self.params.push(param);
        self.clauses
            .push(clause.replacen('?', &format!("?{}", self.params.len()), 1));
    }

    fn in_exact(&mut self, column: &str, values: &[String]) {
        let placeholders = self.bind_all(values);
        self.clauses.push(format!("{column} IN ({placeholders})"));
    }

    fn in_lowercase(&mut self, expr: &str, values: &[String]) {
        let lowered: Vec<String> = values.iter().map(|v| v.trim().to_lowercase()).collect();
        let placeholders = self.bind_all(&lowered);
        self.clauses.push(format!("{expr} IN ({placeholders})"));
    }

    fn any_like(&mut self, columns: &[&str], needle: &str) {
        self.params.push(Box::new(like_pattern(needle)));
        let index = self.params.len();
        let alternatives: Vec<String> = columns
            .iter()
            .map(|c| format!("{c} LIKE ?{index} ESCAPE '\\'"))
            .collect();
        self.clauses.push(format!("({})", alternatives.join(" OR ")));
    }

    fn bind_all(&mut self, values: &[String]) -> String {
        values
            .iter()
            .map(|v| {
                self.params.push(Box::new(v.clone()));
                format!("?{}", self.params.len())
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    fn param_refs(&self) -> Vec<&dyn rusqlite::types::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}
