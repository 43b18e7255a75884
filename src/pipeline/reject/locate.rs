//! Cell and table lookup against one fetched document.
//!
//! Everything here reads a single `Document` snapshot. Coordinates and
//! offsets go stale as soon as the document changes structurally.

use super::error::RejectError;
use super::types::ChangelogColumns;
use crate::google::{Document, Paragraph, Table, TableCell};
use crate::pipeline::table::{CellCoordinates, Field, MetadataTable, RawTable, TableError};

/// Text span of a paragraph, excluding its trailing newline.
///
/// Runs `[10,15)` and `[15,21)` give `(10, 20)`.
pub fn paragraph_range(paragraph: &Paragraph) -> Option<(i64, i64)> {
    let first = paragraph.elements.first()?;
    let last = paragraph.elements.last()?;
    Some((first.start_index, last.end_index - 1))
}

/// Editable span of a cell's first paragraph.
pub fn cell_range(cell: &TableCell) -> Result<(i64, i64), RejectError> {
    cell.first_paragraph()
        .and_then(paragraph_range)
        .ok_or_else(|| {
            RejectError::MalformedCell(format!("cell at {} has no paragraph", cell.start_index))
        })
}

pub fn table_cell(table: &Table, at: CellCoordinates) -> Result<&TableCell, RejectError> {
    table
        .table_rows
        .get(at.row)
        .and_then(|row| row.table_cells.get(at.column))
        .ok_or(RejectError::OutOfBounds {
            row: at.row,
            column: at.column,
        })
}

/// The metadata table and the coordinates of its status cell, if that
/// cell currently holds one of `draft_statuses`.
pub fn locate_status_cell<'d>(
    doc: &'d Document,
    draft_statuses: &[String],
) -> Result<Option<(&'d Table, CellCoordinates)>, RejectError> {
    let (_, table) = doc.first_table().ok_or(TableError::NotFound)?;
    let grid = RawTable::new(table.to_grid());
    if grid.is_empty() {
        return Err(TableError::Empty.into());
    }

    let coords = match MetadataTable::classify(&grid).locate(Field::Status) {
        Some(coords) => coords,
        None => return Ok(None),
    };
    let status = grid.cell(coords).unwrap_or_default().trim().to_lowercase();
    if draft_statuses.iter().any(|s| *s == status) {
        Ok(Some((table, coords)))
    } else {
        Ok(None)
    }
}

/// First table following a paragraph mentioning "changelog" or "history".
///
/// Returns the table's index among the body elements with the table.
pub fn find_changelog_table(doc: &Document) -> Option<(usize, &Table)> {
    let mut heading_seen = false;
    for (i, element) in doc.body.content.iter().enumerate() {
        if heading_seen {
            if let Some(table) = &element.table {
                return Some((i, table));
            }
        }
        if let Some(paragraph) = &element.paragraph {
            let mentions_changelog = paragraph
                .elements
                .iter()
                .filter_map(|el| el.text_run.as_ref())
                .map(|run| run.content.trim().to_lowercase())
                .any(|text| text.contains("changelog") || text.contains("history"));
            heading_seen |= mentions_changelog;
        }
    }
    None
}

fn header_text(cell: &TableCell) -> String {
    cell.first_run_text()
        .map(|t| t.trim().to_lowercase())
        .unwrap_or_default()
}

/// Map changelog headers by substring, first match per key.
pub fn map_changelog_columns(table: &Table) -> Result<ChangelogColumns, RejectError> {
    const KEYS: [&str; 4] = ["author", "status", "date", "comment"];

    let header_row = table
        .table_rows
        .first()
        .filter(|row| !row.table_cells.is_empty())
        .ok_or_else(|| RejectError::MalformedCell("changelog table has no header".into()))?;

    let mut found: [Option<usize>; 4] = [None; 4];
    for (i, cell) in header_row.table_cells.iter().enumerate() {
        let header = header_text(cell);
        if let Some(k) = (0..KEYS.len()).find(|&k| found[k].is_none() && header.contains(KEYS[k])) {
            found[k] = Some(i);
        }
    }

    let column = |k: usize| found[k].ok_or(RejectError::ChangelogColumnMissing(KEYS[k]));
    Ok(ChangelogColumns {
        author: column(0)?,
        status: column(1)?,
        date: column(2)?,
        comment: column(3)?,
    })
}
