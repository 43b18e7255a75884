//! Google Docs document model and batch-update requests.
//!
//! Only the parts of the Docs v1 schema the reject pipeline reads are
//! modelled; unknown fields are ignored. Offsets are UTF-16 code units, as
//! reported by the API, and omitted indices default to zero.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GoogleError;

// ═══════════════════════════════════════════
// Document structure
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Body,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<Paragraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub rows: i64,
    #[serde(default)]
    pub columns: i64,
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

impl Document {
    /// First table in the body, with its index among the body elements.
    pub fn first_table(&self) -> Option<(usize, &Table)> {
        self.body
            .content
            .iter()
            .enumerate()
            .find_map(|(i, el)| el.table.as_ref().map(|t| (i, t)))
    }

    /// Table at a given body element index.
    pub fn table_at(&self, element_index: usize) -> Option<&Table> {
        self.body.content.get(element_index)?.table.as_ref()
    }
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|el| el.text_run.as_ref())
            .map(|run| run.content.as_str())
            .collect()
    }
}

impl TableCell {
    /// Concatenated text of every paragraph in the cell.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|el| el.paragraph.as_ref())
            .map(Paragraph::text)
            .collect()
    }

    /// Text of the first run of the first paragraph.
    pub fn first_run_text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter_map(|el| el.paragraph.as_ref())
            .flat_map(|p| p.elements.iter())
            .find_map(|el| el.text_run.as_ref())
            .map(|run| run.content.as_str())
    }

    pub fn first_paragraph(&self) -> Option<&Paragraph> {
        self.content.iter().find_map(|el| el.paragraph.as_ref())
    }
}

impl Table {
    /// Trimmed cell text, row by row.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        self.table_rows
            .iter()
            .map(|row| {
                row.table_cells
                    .iter()
                    .map(|cell| cell.text().trim().to_string())
                    .collect()
            })
            .collect()
    }
}

// ═══════════════════════════════════════════
// Batch update requests
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    DeleteContentRange(DeleteContentRange),
    InsertText(InsertText),
    InsertTableRow(InsertTableRow),
    UpdateTextStyle(UpdateTextStyle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: i64,
    pub end_index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellLocation {
    pub table_start_location: Location,
    pub row_index: i64,
    pub column_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteContentRange {
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertText {
    pub location: Location,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTableRow {
    pub table_cell_location: TableCellLocation,
    pub insert_below: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyle {
    pub range: Range,
    pub text_style: TextStyle,
    pub fields: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<OptionalColor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalColor {
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub rgb_color: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Request {
    pub fn delete_range(start_index: i64, end_index: i64) -> Self {
        Self::DeleteContentRange(DeleteContentRange {
            range: Range { start_index, end_index },
        })
    }

    pub fn insert_text(index: i64, text: impl Into<String>) -> Self {
        Self::InsertText(InsertText {
            location: Location { index },
            text: text.into(),
        })
    }

    pub fn insert_row_below(table_start_index: i64, row_index: i64) -> Self {
        Self::InsertTableRow(InsertTableRow {
            table_cell_location: TableCellLocation {
                table_start_location: Location { index: table_start_index },
                row_index,
                column_index: 0,
            },
            insert_below: true,
        })
    }

    pub fn bold_color(start_index: i64, end_index: i64, rgb: RgbColor) -> Self {
        Self::UpdateTextStyle(UpdateTextStyle {
            range: Range { start_index, end_index },
            text_style: TextStyle {
                bold: Some(true),
                foreground_color: Some(OptionalColor {
                    color: Color { rgb_color: rgb },
                }),
            },
            fields: "foregroundColor,bold".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchUpdateBody<'a> {
    pub requests: &'a [Request],
}

/// Docs operations used by the reject pipeline.
#[async_trait]
pub trait DocsApi: Send + Sync {
    async fn get_document(&self, document_id: &str) -> Result<Document, GoogleError>;

    /// Apply requests atomically, in order.
    async fn batch_update(
        &self,
        document_id: &str,
        requests: Vec<Request>,
    ) -> Result<(), GoogleError>;
}

/// Length of `s` in UTF-16 code units, the unit of every Docs offset.
pub fn utf16_len(s: &str) -> i64 {
    s.encode_utf16().count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC_JSON: &str = r#"{
        "documentId": "doc1",
        "title": "PR007 - Spec Sync",
        "body": {"content": [
            {"endIndex": 1, "sectionBreak": {}},
            {"startIndex": 1, "endIndex": 40, "table": {
                "rows": 1, "columns": 2,
                "tableRows": [{"startIndex": 2, "endIndex": 39, "tableCells": [
                    {"startIndex": 3, "endIndex": 10, "content": [
                        {"startIndex": 4, "endIndex": 10, "paragraph": {"elements": [
                            {"startIndex": 4, "endIndex": 10, "textRun": {"content": "Status\n"}}
                        ]}}
                    ]},
                    {"startIndex": 10, "endIndex": 20, "content": [
                        {"startIndex": 11, "endIndex": 20, "paragraph": {"elements": [
                            {"startIndex": 11, "endIndex": 16, "textRun": {"content": "Draf"}},
                            {"startIndex": 16, "endIndex": 20, "textRun": {"content": "ting\n"}}
                        ]}}
                    ]}
                ]}]
            }}
        ]}
    }"#;

    #[test]
    fn document_deserializes_with_missing_indices() {
        let doc: Document = serde_json::from_str(DOC_JSON).unwrap();
        assert_eq!(doc.body.content[0].start_index, 0);
        let (idx, table) = doc.first_table().unwrap();
        assert_eq!(idx, 1);
        assert_eq!(table.table_rows[0].table_cells.len(), 2);
    }

    #[test]
    fn grid_joins_runs_and_trims() {
        let doc: Document = serde_json::from_str(DOC_JSON).unwrap();
        let grid = doc.first_table().unwrap().1.to_grid();
        assert_eq!(grid, vec![vec!["Status".to_string(), "Drafting".to_string()]]);
    }

    #[test]
    fn first_run_text_is_first_fragment() {
        let doc: Document = serde_json::from_str(DOC_JSON).unwrap();
        let cell = &doc.first_table().unwrap().1.table_rows[0].table_cells[1];
        assert_eq!(cell.first_run_text(), Some("Draf"));
    }

    #[test]
    fn requests_serialize_to_docs_wire_format() {
        let requests = vec![
            Request::delete_range(10, 20),
            Request::insert_text(10, "Rejected"),
            Request::insert_row_below(4, 2),
        ];
        let body = serde_json::to_value(BatchUpdateBody { requests: &requests }).unwrap();
        assert_eq!(
            body,
            json!({"requests": [
                {"deleteContentRange": {"range": {"startIndex": 10, "endIndex": 20}}},
                {"insertText": {"location": {"index": 10}, "text": "Rejected"}},
                {"insertTableRow": {
                    "tableCellLocation": {
                        "tableStartLocation": {"index": 4},
                        "rowIndex": 2,
                        "columnIndex": 0
                    },
                    "insertBelow": true
                }}
            ]})
        );
    }

    #[test]
    fn text_style_request_names_fields() {
        let req = Request::bold_color(1, 5, RgbColor { red: 0.8, green: 0.2, blue: 0.2 });
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["updateTextStyle"]["fields"], "foregroundColor,bold");
        assert_eq!(value["updateTextStyle"]["textStyle"]["bold"], true);
        assert!(value["updateTextStyle"]["textStyle"]["foregroundColor"]["color"]["rgbColor"]["red"].is_number());
    }

    #[test]
    fn utf16_counts_surrogate_pairs() {
        assert_eq!(utf16_len("abc"), 3);
        assert_eq!(utf16_len("é"), 1);
        assert_eq!(utf16_len("😀"), 2);
    }

    #[test]
    fn docs_api_is_object_safe() {
        fn _assert(_: &dyn DocsApi) {}
    }
}
