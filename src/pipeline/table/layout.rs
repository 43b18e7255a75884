use super::RawTable;

/// Row of a column-format table holding the field headers.
pub const HEADER_ROW: usize = 2;
/// Row of a column-format table holding the field values.
pub const VALUE_ROW: usize = 3;

/// Position of a cell in one snapshot of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellCoordinates {
    pub row: usize,
    pub column: usize,
}

/// Metadata fields recognised in either layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Index,
    Title,
    Type,
    Authors,
    Status,
    Created,
}

impl Field {
    /// Case-insensitive match of a header or key cell.
    ///
    /// `Author(s)` is the canonical author header; `Authors` and `Author` are
    /// accepted as well, in both layouts.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "index" => Some(Self::Index),
            "title" => Some(Self::Title),
            "type" => Some(Self::Type),
            "author(s)" | "authors" | "author" => Some(Self::Authors),
            "status" => Some(Self::Status),
            "created" => Some(Self::Created),
            _ => None,
        }
    }
}

/// Headers that must all appear on the header row of a column-format table.
const COLUMN_FORMAT_HEADERS: [Field; 4] = [Field::Type, Field::Authors, Field::Status, Field::Created];

/// The two metadata table layouts.
///
/// Column-format:
///
/// ```text
/// Index  | PR001
/// Title  | Specifications - Purpose and Guidance
/// Type   | Author(s)       | Status   | Created
/// Process| a@x.com,b@x.com | Approved | Apr 22, 2021
/// ```
///
/// Row-format is one `key | value` pair per row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetadataTable<'a> {
    Column {
        preamble: &'a [Vec<String>],
        headers: &'a [String],
        values: &'a [String],
    },
    Row {
        rows: &'a [Vec<String>],
    },
}

impl<'a> MetadataTable<'a> {
    pub fn classify(table: &'a RawTable) -> Self {
        let rows = table.rows();
        if rows.len() > VALUE_ROW {
            let headers = &rows[HEADER_ROW];
            let found: Vec<Field> = headers.iter().filter_map(|h| Field::from_label(h)).collect();
            if COLUMN_FORMAT_HEADERS.iter().all(|f| found.contains(f)) {
                return Self::Column {
                    preamble: &rows[..HEADER_ROW],
                    headers,
                    values: &rows[VALUE_ROW],
                };
            }
        }
        Self::Row { rows }
    }

    pub fn is_column_format(&self) -> bool {
        matches!(self, Self::Column { .. })
    }

    /// Every recognised `(field, value)` pair, in table order.
    ///
    /// Column-format preamble rows contribute only `index` and `title`.
    /// Headers and values pair by position; a missing value cell is skipped.
    pub fn entries(&self) -> Vec<(Field, &'a str)> {
        match *self {
            Self::Column {
                preamble,
                headers,
                values,
            } => {
                let mut entries: Vec<(Field, &'a str)> = key_value_rows(preamble)
                    .filter(|(f, _)| matches!(f, Field::Index | Field::Title))
                    .collect();
                entries.extend(
                    headers
                        .iter()
                        .zip(values.iter())
                        .filter_map(|(h, v)| Field::from_label(h).map(|f| (f, v.as_str()))),
                );
                entries
            }
            Self::Row { rows } => key_value_rows(rows).collect(),
        }
    }

    /// Coordinates of the value cell for `field`, first match wins.
    pub fn locate(&self, field: Field) -> Option<CellCoordinates> {
        match *self {
            Self::Column { headers, values, .. } => headers
                .iter()
                .position(|h| Field::from_label(h) == Some(field))
                .filter(|&column| column < values.len())
                .map(|column| CellCoordinates {
                    row: VALUE_ROW,
                    column,
                }),
            Self::Row { rows } => rows
                .iter()
                .position(|row| {
                    row.len() >= 2 && row.first().and_then(|k| Field::from_label(k)) == Some(field)
                })
                .map(|row| CellCoordinates { row, column: 1 }),
        }
    }
}

fn key_value_rows<'a>(rows: &'a [Vec<String>]) -> impl Iterator<Item = (Field, &'a str)> + 'a {
    rows.iter()
        .filter(|row| row.len() >= 2)
        .filter_map(|row| Field::from_label(&row[0]).map(|f| (f, row[1].as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_table() -> RawTable {
        RawTable::from(vec![
            vec!["Index", "PR007"],
            vec!["Title", "Zero Trust Proposal"],
            vec!["Type", "Author(s)", "Status", "Created"],
            vec!["Standard", "a@x.com,b@x.com", "Drafting", "Jan 2, 2024"],
        ])
    }

    #[test]
    fn four_headers_any_case_is_column_format() {
        let table = RawTable::from(vec![
            vec!["x"],
            vec!["y"],
            vec!["TYPE", "author(s)", "Status", "created"],
            vec!["a", "b", "c", "d"],
        ]);
        assert!(MetadataTable::classify(&table).is_column_format());
    }

    #[test]
    fn author_header_variants_classify_alike() {
        for header in ["Author(s)", "Authors", "author"] {
            let table = RawTable::from(vec![
                vec!["x"],
                vec!["y"],
                vec!["Type", header, "Status", "Created"],
                vec!["a", "b", "c", "d"],
            ]);
            assert!(MetadataTable::classify(&table).is_column_format(), "{header}");
            assert_eq!(Field::from_label(header), Some(Field::Authors));
        }
        assert_eq!(Field::from_label("co-author"), None);
    }

    #[test]
    fn missing_header_is_row_format() {
        let table = RawTable::from(vec![
            vec!["x"],
            vec!["y"],
            vec!["Type", "Author(s)", "Status"],
            vec!["a", "b", "c"],
        ]);
        assert!(!MetadataTable::classify(&table).is_column_format());
    }

    #[test]
    fn short_table_is_row_format() {
        let table = RawTable::from(vec![
            vec!["x"],
            vec!["y"],
            vec!["Type", "Author(s)", "Status", "Created"],
        ]);
        assert!(!MetadataTable::classify(&table).is_column_format());
    }

    #[test]
    fn headers_on_other_row_are_row_format() {
        let table = RawTable::from(vec![
            vec!["Type", "Author(s)", "Status", "Created"],
            vec!["a", "b", "c", "d"],
            vec!["e", "f"],
            vec!["g", "h"],
        ]);
        assert!(!MetadataTable::classify(&table).is_column_format());
    }

    #[test]
    fn column_entries_include_preamble() {
        let table = column_table();
        let entries = MetadataTable::classify(&table).entries();
        assert!(entries.contains(&(Field::Index, "PR007")));
        assert!(entries.contains(&(Field::Title, "Zero Trust Proposal")));
        assert!(entries.contains(&(Field::Status, "Drafting")));
        assert!(entries.contains(&(Field::Authors, "a@x.com,b@x.com")));
    }

    #[test]
    fn short_values_row_pairs_what_it_can() {
        let table = RawTable::from(vec![
            vec!["", ""],
            vec!["", ""],
            vec!["Type", "Author(s)", "Status", "Created"],
            vec!["Process", "someone@x.com"],
        ]);
        let layout = MetadataTable::classify(&table);
        assert_eq!(layout.entries().len(), 2);
        assert_eq!(layout.locate(Field::Status), None);
    }

    #[test]
    fn locate_status_in_column_format() {
        let table = column_table();
        let at = MetadataTable::classify(&table).locate(Field::Status).unwrap();
        assert_eq!(at, CellCoordinates { row: 3, column: 2 });
        assert_eq!(table.cell(at), Some("Drafting"));
    }

    #[test]
    fn locate_status_in_row_format() {
        let table = RawTable::from(vec![
            vec!["authors", "someone@x.com"],
            vec!["Status", "Braindump"],
            vec!["index", "SN114"],
        ]);
        let at = MetadataTable::classify(&table).locate(Field::Status).unwrap();
        assert_eq!(at, CellCoordinates { row: 1, column: 1 });
    }

    #[test]
    fn row_format_skips_single_cell_rows() {
        let table = RawTable::from(vec![vec!["status"], vec!["status", "Approved"]]);
        let layout = MetadataTable::classify(&table);
        assert_eq!(layout.entries(), vec![(Field::Status, "Approved")]);
        assert_eq!(layout.locate(Field::Status), Some(CellCoordinates { row: 1, column: 1 }));
    }
}
