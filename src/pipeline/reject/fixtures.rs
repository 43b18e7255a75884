//! Document builders laid out with Docs-style offsets.
//!
//! Every table, row and cell consumes one index for its marker; every
//! paragraph ends with `\n`.

use crate::google::*;

pub enum Part<'a> {
    Text(&'a str),
    Table(&'a [&'a [&'a str]]),
}

pub fn text_paragraph(start: i64, text: &str) -> StructuralElement {
    let content = format!("{text}\n");
    let end = start + utf16_len(&content);
    StructuralElement {
        start_index: start,
        end_index: end,
        paragraph: Some(Paragraph {
            elements: vec![ParagraphElement {
                start_index: start,
                end_index: end,
                text_run: Some(TextRun { content }),
            }],
        }),
        table: None,
    }
}

pub fn cell(start: i64, text: &str) -> TableCell {
    let paragraph = text_paragraph(start + 1, text);
    TableCell {
        start_index: start,
        end_index: paragraph.end_index,
        content: vec![paragraph],
    }
}

pub fn row(start: i64, texts: &[&str]) -> TableRow {
    let mut cursor = start + 1;
    let table_cells = texts
        .iter()
        .map(|text| {
            let c = cell(cursor, text);
            cursor = c.end_index;
            c
        })
        .collect();
    TableRow {
        start_index: start,
        end_index: cursor,
        table_cells,
    }
}

pub fn table(start: i64, rows: &[&[&str]]) -> StructuralElement {
    let mut cursor = start + 1;
    let table_rows: Vec<TableRow> = rows
        .iter()
        .map(|texts| {
            let r = row(cursor, texts);
            cursor = r.end_index;
            r
        })
        .collect();
    StructuralElement {
        start_index: start,
        end_index: cursor + 1,
        paragraph: None,
        table: Some(Table {
            rows: table_rows.len() as i64,
            columns: rows.first().map_or(0, |r| r.len() as i64),
            table_rows,
        }),
    }
}

/// Body starting with the section break at `[0, 1)`.
pub fn document(parts: &[Part<'_>]) -> Document {
    let mut content = vec![StructuralElement {
        start_index: 0,
        end_index: 1,
        ..Default::default()
    }];
    let mut cursor = 1;
    for part in parts {
        let element = match part {
            Part::Text(text) => text_paragraph(cursor, text),
            Part::Table(rows) => table(cursor, rows),
        };
        cursor = element.end_index;
        content.push(element);
    }
    Document {
        document_id: "doc".into(),
        title: String::new(),
        body: Body { content },
    }
}
