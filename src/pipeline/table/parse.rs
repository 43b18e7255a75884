use super::layout::{Field, MetadataTable};
use super::{RawTable, TableError};

/// Spec fields recovered from a document name and its metadata table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecMetadata {
    pub id: String,
    pub title: String,
    pub status: Option<String>,
    pub spec_type: Option<String>,
    pub authors: Vec<String>,
}

/// Split a `"<ID> - <Title>"` document name on its first `-`.
///
/// Names without a dash yield two empty strings.
pub fn split_doc_name(name: &str) -> (String, String) {
    match name.split_once('-') {
        Some((id, title)) => (id.trim().to_string(), title.trim().to_string()),
        None => (String::new(), String::new()),
    }
}

fn is_author_separator(c: char) -> bool {
    matches!(c, ',' | ';' | '/' | '|')
}

/// Author names from a raw table value.
///
/// Splits on `, ; / |`, keeps the text before any `<email>` marker, drops
/// parenthesized role tokens like `(PjM)` and anything shorter than
/// `min_length` characters.
pub fn parse_authors(raw: &str, min_length: usize) -> Vec<String> {
    raw.split(is_author_separator)
        .filter_map(|token| {
            let name = token.split('<').next().unwrap_or_default().trim();
            if name.starts_with('(') && name.ends_with(')') {
                return None;
            }
            (name.chars().count() >= min_length).then(|| name.to_string())
        })
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Combine the document name with the metadata table.
///
/// The name's id and title take precedence; table `index` and `title` only
/// fill them when the name yields nothing.
pub fn parse_metadata(
    doc_name: &str,
    table: &RawTable,
    author_min_length: usize,
) -> Result<SpecMetadata, TableError> {
    if table.is_empty() {
        return Err(TableError::Empty);
    }

    let (id, title) = split_doc_name(doc_name);
    let mut meta = SpecMetadata {
        id,
        title,
        ..Default::default()
    };

    for (field, value) in MetadataTable::classify(table).entries() {
        match field {
            Field::Index if meta.id.is_empty() => meta.id = value.trim().to_string(),
            Field::Title if meta.title.is_empty() => meta.title = value.trim().to_string(),
            Field::Status => meta.status = non_empty(value),
            Field::Type => meta.spec_type = non_empty(value),
            Field::Authors => meta.authors = parse_authors(value, author_min_length),
            _ => {}
        }
    }

    if meta.id.is_empty() {
        return Err(TableError::MissingIdentifier);
    }
    Ok(meta)
}
