//! Document edits issued by the reject pipeline.

use chrono::NaiveDate;

use super::error::RejectError;
use super::locate::{cell_range, find_changelog_table, map_changelog_columns, table_cell};
use super::types::*;
use crate::google::{utf16_len, DocsApi, Request, Table, TableCell, TableRow};
use crate::pipeline::table::CellCoordinates;

/// Index distance from one cell's text to the next cell's text once the
/// first cell holds exactly the inserted text: its newline plus the next
/// cell's marker.
const CELL_BOUNDARY_OFFSET: i64 = 2;

/// Replace a cell's first paragraph with `text`.
pub fn replace_cell_requests(cell: &TableCell, text: &str) -> Result<Vec<Request>, RejectError> {
    let (start, end) = cell_range(cell)?;
    let mut requests = Vec::with_capacity(2);
    if end > start {
        requests.push(Request::delete_range(start, end));
    }
    requests.push(Request::insert_text(start, text));
    Ok(requests)
}

/// Overwrite a freshly inserted row, cell by cell.
///
/// Later requests in the batch see the effect of earlier ones, so the
/// cursor advances by the inserted text rather than the fetched layout.
pub fn fill_row_requests(row: &TableRow, contents: &[String]) -> Result<Vec<Request>, RejectError> {
    let first = row
        .table_cells
        .first()
        .ok_or_else(|| RejectError::MalformedCell("new changelog row has no cells".into()))?;
    let (mut cursor, _) = cell_range(first)?;

    let mut requests = Vec::new();
    for (column, text) in contents.iter().enumerate() {
        let cell = row.table_cells.get(column).ok_or(RejectError::OutOfBounds {
            row: 0,
            column,
        })?;
        let (start, end) = cell_range(cell)?;
        let existing = end - start;
        if existing > 0 {
            requests.push(Request::delete_range(cursor, cursor + existing));
        }
        if !text.is_empty() {
            requests.push(Request::insert_text(cursor, text.as_str()));
        }
        cursor += utf16_len(text) + CELL_BOUNDARY_OFFSET;
    }
    Ok(requests)
}

pub fn fallback_message(cleanup_id: &str, today: NaiveDate) -> String {
    format!(
        "This spec was rejected during the automated cleanup of stale documents on {}. Cleanup ID: {}",
        today.format(DATE_FORMAT),
        cleanup_id
    )
}

/// Bold red notice paragraph at the top of the body.
pub fn fallback_notice_requests(message: &str) -> Vec<Request> {
    vec![
        Request::insert_text(1, format!("{message}\n\n")),
        Request::bold_color(1, 1 + utf16_len(message), NOTICE_COLOR),
    ]
}

pub fn changelog_comment(cleanup_id: &str) -> String {
    format!(
        "This spec was rejected during the automated cleanup of stale documents (Cleanup ID: {cleanup_id})"
    )
}

fn changelog_contents(
    columns: &ChangelogColumns,
    width: usize,
    cleanup_id: &str,
    today: NaiveDate,
) -> Vec<String> {
    let mut contents = vec![String::new(); width];
    contents[columns.author] = AUTOMATION_AUTHOR.to_string();
    contents[columns.status] = REJECTED_STATUS.to_string();
    contents[columns.date] = today.format(DATE_FORMAT).to_string();
    contents[columns.comment] = changelog_comment(cleanup_id);
    contents
}

/// Rewrite the status cell at `at` in a single batch.
pub async fn update_status_cell(
    docs: &dyn DocsApi,
    doc_id: &str,
    table: &Table,
    at: CellCoordinates,
    new_status: &str,
) -> Result<(), RejectError> {
    let cell = table_cell(table, at)?;
    let requests = replace_cell_requests(cell, new_status)?;
    docs.batch_update(doc_id, requests).await?;
    Ok(())
}

/// Append a "Rejected" row to the document's changelog table.
///
/// Columns are mapped before anything is inserted, so a table without the
/// expected headers is left untouched.
pub async fn append_changelog_row(
    docs: &dyn DocsApi,
    doc_id: &str,
    cleanup_id: &str,
    today: NaiveDate,
) -> Result<(), RejectError> {
    let doc = docs.get_document(doc_id).await?;
    let (element_index, table) = find_changelog_table(&doc).ok_or(RejectError::NoChangelog)?;
    let columns = map_changelog_columns(table)?;

    let header = table
        .table_rows
        .first()
        .ok_or_else(|| RejectError::MalformedCell("changelog table has no rows".into()))?;
    let table_start = header.start_index - 1;
    let last_row = table.table_rows.len() as i64 - 1;

    docs.batch_update(doc_id, vec![Request::insert_row_below(table_start, last_row)])
        .await?;

    let doc = docs.get_document(doc_id).await?;
    let table = doc
        .table_at(element_index)
        .ok_or(RejectError::ChangelogMoved(element_index))?;
    let new_row = table
        .table_rows
        .last()
        .ok_or(RejectError::ChangelogMoved(element_index))?;

    let width = new_row.table_cells.len();
    if columns.max_index() >= width {
        return Err(RejectError::OutOfBounds {
            row: table.table_rows.len() - 1,
            column: columns.max_index(),
        });
    }

    let contents = changelog_contents(&columns, width, cleanup_id, today);
    let requests = fill_row_requests(new_row, &contents)?;
    docs.batch_update(doc_id, requests).await?;
    Ok(())
}

pub async fn insert_fallback_notice(
    docs: &dyn DocsApi,
    doc_id: &str,
    cleanup_id: &str,
    today: NaiveDate,
) -> Result<(), RejectError> {
    let message = fallback_message(cleanup_id, today);
    docs.batch_update(doc_id, fallback_notice_requests(&message))
        .await?;
    Ok(())
}
